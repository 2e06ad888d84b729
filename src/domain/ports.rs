use crate::domain::model::{PortFilter, ReadOutcome, SerialOptions};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Device selection: hands out a serial port the user (or configuration) picked.
#[async_trait]
pub trait PortRequester: Send + Sync {
    type Port: SerialPort;

    async fn request_port(&self, filters: &[PortFilter]) -> Result<Self::Port>;
}

#[async_trait]
pub trait SerialPort: Send {
    /// Human readable name used in logs and errors.
    fn name(&self) -> String;

    async fn open(&mut self, options: SerialOptions) -> Result<()>;

    /// Whether a reader can still be acquired. Turns false once the device is
    /// gone or the stream has ended.
    fn is_readable(&self) -> bool;

    /// Exclusive access to the incoming byte stream. Must be released before
    /// the next acquisition.
    fn reader(&mut self) -> Result<Box<dyn SerialReader + '_>>;
}

#[async_trait]
pub trait SerialReader: Send {
    async fn read(&mut self) -> Result<ReadOutcome>;

    fn release_lock(&mut self);
}

/// A host-owned state slot: stores a value and notifies its observers.
pub trait StateSink: Send + Sync {
    fn publish(&self, value: &str);
}

impl<S: StateSink + ?Sized> StateSink for &S {
    fn publish(&self, value: &str) {
        (**self).publish(value)
    }
}

impl<S: StateSink + ?Sized> StateSink for std::sync::Arc<S> {
    fn publish(&self, value: &str) {
        (**self).publish(value)
    }
}

/// One layer of configuration. `None` means "not set here"; layers are
/// consulted in priority order.
pub trait ConfigProvider: Send + Sync {
    fn device_path(&self) -> Option<&str>;
    fn replay_path(&self) -> Option<&str>;
    fn usb_vendor_id(&self) -> Option<u16>;
    fn usb_product_id(&self) -> Option<u16>;
    fn output_format(&self) -> Option<&str>;
    fn csv_log(&self) -> Option<&str>;
    fn registration_ids(&self) -> Option<bool>;
}
