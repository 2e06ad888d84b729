#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::sinks::OutputFormat;
use crate::core::{ConfigProvider, PortFilter};
use crate::utils::error::{BridgeError, Result};
use crate::utils::validation::{self, Validate};

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

/// Where scans come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSource {
    /// A real serial port; `None` means pick the first matching USB port.
    Serial { path: Option<String> },
    Replay { path: String },
}

/// Effective settings after layering command line over file configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source: DeviceSource,
    pub filter: PortFilter,
    pub format: OutputFormat,
    pub csv_log: Option<String>,
    pub registration_ids: bool,
}

impl Settings {
    /// Resolves each setting from the first layer that sets it.
    pub fn resolve(layers: &[&dyn ConfigProvider]) -> Result<Self> {
        fn first<'a, T>(
            layers: &[&'a dyn ConfigProvider],
            get: impl Fn(&'a dyn ConfigProvider) -> Option<T>,
        ) -> Option<T> {
            layers.iter().find_map(|layer| get(*layer))
        }

        let path = first(layers, |l| l.device_path());
        let replay = first(layers, |l| l.replay_path());
        validation::validate_exclusive("device.path", &path, "device.replay", &replay)?;

        let source = match replay {
            Some(replay) => DeviceSource::Replay {
                path: replay.to_string(),
            },
            None => DeviceSource::Serial {
                path: path.map(str::to_string),
            },
        };

        let format_name = first(layers, |l| l.output_format()).unwrap_or("plain");
        let format = OutputFormat::parse(format_name).ok_or_else(|| {
            BridgeError::InvalidConfigValueError {
                field: "output.format".to_string(),
                value: format_name.to_string(),
                reason: format!("Valid values: {}", OutputFormat::VALUES.join(", ")),
            }
        })?;

        Ok(Self {
            source,
            filter: PortFilter {
                usb_vendor_id: first(layers, |l| l.usb_vendor_id()),
                usb_product_id: first(layers, |l| l.usb_product_id()),
            },
            format,
            csv_log: first(layers, |l| l.csv_log()).map(str::to_string),
            registration_ids: first(layers, |l| l.registration_ids()).unwrap_or(false),
        })
    }

    pub fn filters(&self) -> Vec<PortFilter> {
        if self.filter == PortFilter::default() {
            Vec::new()
        } else {
            vec![self.filter]
        }
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        match &self.source {
            DeviceSource::Serial { path: Some(path) } => {
                validation::validate_path("device.path", path)?
            }
            DeviceSource::Serial { path: None } => {}
            DeviceSource::Replay { path } => validation::validate_path("device.replay", path)?,
        }

        // Device selection filters cannot name a product without its vendor.
        if self.filter.usb_product_id.is_some() {
            validation::validate_required_field(
                "device.usb_vendor_id",
                &self.filter.usb_vendor_id,
            )?;
        }

        if let Some(csv_log) = &self.csv_log {
            validation::validate_non_empty_string("output.csv_log", csv_log)?;
            validation::validate_path("output.csv_log", csv_log)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_layer_wins() {
        let high = TomlConfig::from_toml_str("[output]\nformat = \"json\"\n").unwrap();
        let low = TomlConfig::from_toml_str(
            "[device]\npath = \"/dev/ttyACM0\"\n[output]\nformat = \"plain\"\n",
        )
        .unwrap();

        let settings = Settings::resolve(&[&high, &low]).unwrap();
        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(
            settings.source,
            DeviceSource::Serial {
                path: Some("/dev/ttyACM0".to_string())
            }
        );
        assert!(settings.filters().is_empty());
    }

    #[test]
    fn test_replay_across_layers_conflicts_with_path() {
        let high = TomlConfig::from_toml_str("[device]\nreplay = \"scans.txt\"\n").unwrap();
        let low = TomlConfig::from_toml_str("[device]\npath = \"/dev/ttyACM0\"\n").unwrap();
        assert!(Settings::resolve(&[&high, &low]).is_err());
    }

    #[test]
    fn test_product_id_requires_vendor_id() {
        let config = TomlConfig::from_toml_str("[device]\nusb_product_id = 4608\n").unwrap();
        let settings = Settings::resolve(&[&config]).unwrap();
        assert!(matches!(
            settings.validate(),
            Err(BridgeError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_defaults_without_layers() {
        let settings = Settings::resolve(&[]).unwrap();
        assert_eq!(settings.source, DeviceSource::Serial { path: None });
        assert_eq!(settings.format, OutputFormat::Plain);
        assert!(!settings.registration_ids);
        assert!(settings.validate().is_ok());
    }
}
