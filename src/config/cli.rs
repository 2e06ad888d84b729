use crate::core::ConfigProvider;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "scanner-bridge")]
#[command(about = "Bridge a serial barcode scanner to stdout")]
pub struct CliConfig {
    /// Serial device to open (defaults to the first USB serial port)
    #[arg(short, long, conflicts_with = "replay")]
    pub port: Option<String>,

    /// Replay scans from a file, one line per read
    #[arg(long)]
    pub replay: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Only consider USB devices with this vendor id (e.g. 0x05e0)
    #[arg(long, value_parser = parse_usb_id)]
    pub vendor_id: Option<u16>,

    /// Only consider USB devices with this product id
    #[arg(long, value_parser = parse_usb_id)]
    pub product_id: Option<u16>,

    /// Output format: plain or json
    #[arg(short, long)]
    pub format: Option<String>,

    /// Append every scan to this CSV file
    #[arg(long)]
    pub log_csv: Option<String>,

    /// Print registration ids parsed from scans instead of raw text
    #[arg(long)]
    pub registration: bool,

    /// List serial ports and exit
    #[arg(long)]
    pub list: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Accepts decimal or `0x`-prefixed hexadecimal.
pub fn parse_usb_id(value: &str) -> Result<u16, String> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid USB id '{}': {}", value, e))
}

impl ConfigProvider for CliConfig {
    fn device_path(&self) -> Option<&str> {
        self.port.as_deref()
    }

    fn replay_path(&self) -> Option<&str> {
        self.replay.as_deref()
    }

    fn usb_vendor_id(&self) -> Option<u16> {
        self.vendor_id
    }

    fn usb_product_id(&self) -> Option<u16> {
        self.product_id
    }

    fn output_format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    fn csv_log(&self) -> Option<&str> {
        self.log_csv.as_deref()
    }

    fn registration_ids(&self) -> Option<bool> {
        // An absent flag leaves the decision to the config file.
        self.registration.then_some(true)
    }
}
