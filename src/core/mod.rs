pub mod bridge;
pub mod decoder;
pub mod scan;

pub use crate::domain::model::{
    BridgePhase, ConnectionState, PortFilter, ReadOutcome, ScanFragment, ScanRecord,
    SerialOptions,
};
pub use crate::domain::ports::{
    ConfigProvider, PortRequester, SerialPort, SerialReader, StateSink,
};
pub use crate::utils::error::Result;
