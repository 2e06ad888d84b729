use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Baud rate every scanner is opened at.
pub const SCANNER_BAUD_RATE: u32 = 115_200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

impl ConnectionState {
    /// Value written into the `connected` slot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
        }
    }

    /// Hosts treat anything other than `"connected"` as disconnected.
    pub fn from_slot(value: &str) -> Self {
        match value {
            "connected" => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded chunk as produced by a single read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanFragment(pub String);

impl ScanFragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ScanFragment {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialOptions {
    pub baud_rate: u32,
}

impl Default for SerialOptions {
    fn default() -> Self {
        Self {
            baud_rate: SCANNER_BAUD_RATE,
        }
    }
}

/// Narrows device selection to USB devices with the given ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortFilter {
    pub usb_vendor_id: Option<u16>,
    pub usb_product_id: Option<u16>,
}

impl PortFilter {
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.usb_vendor_id.map_or(true, |v| v == vendor_id)
            && self.usb_product_id.map_or(true, |p| p == product_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Data(Vec<u8>),
    Done,
}

/// Where the bridge is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePhase {
    Idle,
    Requesting,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

impl ScanRecord {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_slot_values() {
        assert_eq!(ConnectionState::Connected.as_str(), "connected");
        assert_eq!(ConnectionState::from_slot("connected"), ConnectionState::Connected);
        assert_eq!(ConnectionState::from_slot(""), ConnectionState::Disconnected);
        assert_eq!(
            ConnectionState::from_slot("disconnected"),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn test_port_filter_matching() {
        let any = PortFilter::default();
        assert!(any.matches(0x1234, 0x5678));

        let vendor_only = PortFilter {
            usb_vendor_id: Some(0x05e0),
            usb_product_id: None,
        };
        assert!(vendor_only.matches(0x05e0, 0x1200));
        assert!(!vendor_only.matches(0x0c2e, 0x1200));

        let exact = PortFilter {
            usb_vendor_id: Some(0x05e0),
            usb_product_id: Some(0x1200),
        };
        assert!(!exact.matches(0x05e0, 0x1300));
    }

    #[test]
    fn test_scan_record_serializes_text() {
        let record = ScanRecord::now("A1234");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["text"], "A1234");
        assert!(json["timestamp"].is_string());
    }
}
