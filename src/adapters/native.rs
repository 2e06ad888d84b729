use crate::adapters::stream::{Chunking, StreamReader};
use crate::domain::model::{PortFilter, SerialOptions};
use crate::domain::ports::{PortRequester, SerialPort, SerialReader};
use crate::utils::error::{BridgeError, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::io::BufReader;
use tokio_serial::{SerialPortBuilderExt, SerialPortType, SerialStream};

/// A serial port as seen during enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortDescriptor {
    pub path: String,
    pub usb: Option<UsbIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsbIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl PortDescriptor {
    /// Only USB ports are candidates. With no filters any USB port matches,
    /// otherwise at least one filter has to.
    pub fn is_candidate(&self, filters: &[PortFilter]) -> bool {
        let Some(usb) = &self.usb else {
            return false;
        };
        filters.is_empty()
            || filters
                .iter()
                .any(|f| f.matches(usb.vendor_id, usb.product_id))
    }
}

pub fn list_ports() -> Result<Vec<PortDescriptor>> {
    let ports = tokio_serial::available_ports().map_err(|e| BridgeError::IoError(e.into()))?;

    Ok(ports
        .into_iter()
        .map(|info| PortDescriptor {
            path: info.port_name,
            usb: match info.port_type {
                SerialPortType::UsbPort(usb) => Some(UsbIdentity {
                    vendor_id: usb.vid,
                    product_id: usb.pid,
                    serial_number: usb.serial_number,
                    manufacturer: usb.manufacturer,
                    product: usb.product,
                }),
                _ => None,
            },
        })
        .collect())
}

/// Picks a device by explicit path, or the first USB port passing the filters.
#[derive(Debug, Clone, Default)]
pub struct NativePortRequester {
    path: Option<String>,
}

impl NativePortRequester {
    pub fn new(path: Option<String>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl PortRequester for NativePortRequester {
    type Port = NativeSerialPort;

    async fn request_port(&self, filters: &[PortFilter]) -> Result<NativeSerialPort> {
        if let Some(path) = &self.path {
            tracing::debug!("Using configured serial device {}", path);
            return Ok(NativeSerialPort::new(path.clone()));
        }

        let ports = list_ports()?;
        tracing::debug!("Found {} serial ports", ports.len());

        ports
            .into_iter()
            .find(|p| p.is_candidate(filters))
            .map(|p| NativeSerialPort::new(p.path))
            .ok_or(BridgeError::NoDeviceSelected)
    }
}

pub struct NativeSerialPort {
    path: String,
    stream: Option<BufReader<SerialStream>>,
    readable: bool,
}

impl NativeSerialPort {
    pub fn new(path: String) -> Self {
        Self {
            path,
            stream: None,
            readable: false,
        }
    }
}

#[async_trait]
impl SerialPort for NativeSerialPort {
    fn name(&self) -> String {
        self.path.clone()
    }

    async fn open(&mut self, options: SerialOptions) -> Result<()> {
        let stream = tokio_serial::new(&self.path, options.baud_rate)
            .open_native_async()
            .map_err(|e| map_open_error(&self.path, e))?;

        self.stream = Some(BufReader::new(stream));
        self.readable = true;
        Ok(())
    }

    fn is_readable(&self) -> bool {
        self.stream.is_some() && self.readable
    }

    fn reader(&mut self) -> Result<Box<dyn SerialReader + '_>> {
        let Self {
            path,
            stream,
            readable,
        } = self;
        let stream = stream
            .as_mut()
            .ok_or_else(|| BridgeError::read(format!("{} is not open", path)))?;

        Ok(Box::new(StreamReader::new(
            stream,
            readable,
            Chunking::Raw,
            path.as_str(),
        )))
    }
}

fn map_open_error(path: &str, e: tokio_serial::Error) -> BridgeError {
    match e.kind() {
        tokio_serial::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
            BridgeError::PermissionDenied {
                message: format!("{}: {}", path, e),
            }
        }
        _ => BridgeError::device_open(path, e.to_string()),
    }
}
