use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Permission to access the serial device was denied: {message}")]
    PermissionDenied { message: String },

    #[error("No serial device was selected")]
    NoDeviceSelected,

    #[error("Failed to open serial device {device}: {message}")]
    DeviceOpen { device: String, message: String },

    #[error("Serial read failed: {message}")]
    Read { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Device,
    Io,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BridgeError {
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
        }
    }

    pub fn device_open(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeviceOpen {
            device: device.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PermissionDenied { .. }
            | Self::NoDeviceSelected
            | Self::DeviceOpen { .. }
            | Self::Read { .. } => ErrorCategory::Device,
            Self::IoError(_) => ErrorCategory::Io,
            Self::SerializationError(_) | Self::CsvError(_) => ErrorCategory::Data,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // The user dismissed the picker; nothing went wrong.
            Self::NoDeviceSelected => ErrorSeverity::Low,
            Self::Read { .. } => ErrorSeverity::Medium,
            Self::PermissionDenied { .. } | Self::DeviceOpen { .. } => ErrorSeverity::High,
            Self::SerializationError(_) | Self::CsvError(_) => ErrorSeverity::High,
            Self::IoError(_) => ErrorSeverity::Critical,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::ConfigValidationError { .. } => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::PermissionDenied { .. } => {
                "Access to the scanner was denied by the operating system".to_string()
            }
            Self::NoDeviceSelected => "No scanner was selected".to_string(),
            Self::DeviceOpen { device, .. } => format!("Could not open scanner at {}", device),
            Self::Read { .. } => "Reading from the scanner failed".to_string(),
            Self::IoError(e) => format!("File or device I/O failed: {}", e),
            Self::SerializationError(_) => "Could not encode scan output".to_string(),
            Self::CsvError(_) => "Could not write the scan log".to_string(),
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            Self::MissingConfigError { field } => format!("Missing setting '{}'", field),
            Self::ConfigValidationError { field, message } => {
                format!("Invalid configuration in '{}': {}", field, message)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => {
                "Add your user to the group owning the device (e.g. 'dialout') or run with the required privileges"
            }
            Self::NoDeviceSelected => {
                "Plug in the scanner, pass --port explicitly, or check --vendor-id/--product-id filters"
            }
            Self::DeviceOpen { .. } => {
                "Make sure no other program holds the port and the scanner is in serial (CDC) mode"
            }
            Self::Read { .. } => "Reconnect the scanner and start the bridge again",
            Self::IoError(_) => "Check that the paths exist and are writable",
            Self::SerializationError(_) | Self::CsvError(_) => {
                "Check the output settings and the scan log path"
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::ConfigValidationError { .. } => {
                "Fix the configuration file or command line flags and try again"
            }
        }
    }

    /// Errors that end a `run` invocation before the connect step completes.
    pub fn is_terminal_connect_error(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::NoDeviceSelected | Self::DeviceOpen { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
