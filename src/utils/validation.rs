use crate::utils::error::{BridgeError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(BridgeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(BridgeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(BridgeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Unsupported value. Valid values: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

pub fn validate_exclusive<A, B>(
    first_field: &str,
    first: &Option<A>,
    second_field: &str,
    second: &Option<B>,
) -> Result<()> {
    if first.is_some() && second.is_some() {
        return Err(BridgeError::ConfigValidationError {
            field: first_field.to_string(),
            message: format!("cannot be combined with {}", second_field),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| BridgeError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BridgeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("device.path", "/dev/ttyACM0").is_ok());
        assert!(validate_path("device.path", "").is_err());
        assert!(validate_path("device.path", "/dev/tty\0").is_err());
    }

    #[test]
    fn test_validate_one_of() {
        assert!(validate_one_of("output.format", "json", &["plain", "json"]).is_ok());
        assert!(validate_one_of("output.format", "xml", &["plain", "json"]).is_err());
    }

    #[test]
    fn test_validate_exclusive() {
        let path = Some("/dev/ttyACM0".to_string());
        let replay = Some("scans.txt".to_string());
        let none: Option<String> = None;
        assert!(validate_exclusive("device.path", &path, "device.replay", &none).is_ok());
        assert!(validate_exclusive("device.path", &path, "device.replay", &replay).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let missing: Option<u16> = None;
        assert!(validate_required_field("device.usb_vendor_id", &missing).is_err());
        assert_eq!(
            *validate_required_field("device.usb_vendor_id", &Some(0x05e0u16)).unwrap(),
            0x05e0
        );
    }
}
