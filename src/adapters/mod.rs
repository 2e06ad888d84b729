// Adapters layer: concrete serial backends and host-side sinks.

#[cfg(feature = "native")]
pub mod native;
pub mod replay;
pub mod scan_log;
pub mod sinks;
mod stream;

pub use stream::Chunking;
