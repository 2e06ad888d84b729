pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{DeviceSource, Settings, TomlConfig};

pub use crate::core::bridge::ScannerBridge;
pub use utils::error::{BridgeError, Result};
