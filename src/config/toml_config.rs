use crate::core::ConfigProvider;
use crate::utils::error::{BridgeError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub path: Option<String>,
    pub replay: Option<String>,
    pub usb_vendor_id: Option<u16>,
    pub usb_product_id: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: Option<String>,
    pub csv_log: Option<String>,
    pub registration_ids: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BridgeError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BridgeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SCANNER_PORT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BridgeError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("info")
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn device_path(&self) -> Option<&str> {
        self.device.path.as_deref()
    }

    fn replay_path(&self) -> Option<&str> {
        self.device.replay.as_deref()
    }

    fn usb_vendor_id(&self) -> Option<u16> {
        self.device.usb_vendor_id
    }

    fn usb_product_id(&self) -> Option<u16> {
        self.device.usb_product_id
    }

    fn output_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    fn csv_log(&self) -> Option<&str> {
        self.output.csv_log.as_deref()
    }

    fn registration_ids(&self) -> Option<bool> {
        self.output.registration_ids
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_exclusive(
            "device.path",
            &self.device.path,
            "device.replay",
            &self.device.replay,
        )?;
        if let Some(path) = &self.device.path {
            validation::validate_path("device.path", path)?;
        }
        if let Some(replay) = &self.device.replay {
            validation::validate_path("device.replay", replay)?;
        }
        if let Some(csv_log) = &self.output.csv_log {
            validation::validate_path("output.csv_log", csv_log)?;
        }
        if let Some(format) = &self.output.format {
            validation::validate_one_of(
                "output.format",
                format,
                &crate::adapters::sinks::OutputFormat::VALUES,
            )?;
        }
        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            validation::validate_one_of("logging.level", level, &LOG_LEVELS)?;
        }
        Ok(())
    }
}
