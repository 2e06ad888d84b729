use crate::domain::model::ScanFragment;
use uuid::Uuid;

/// Registration cards carry their registration id as the QR payload.
/// Scanners typically append CR/LF, so surrounding whitespace is ignored.
pub fn registration_id(fragment: &ScanFragment) -> Option<Uuid> {
    Uuid::parse_str(fragment.as_str().trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_id_with_line_terminator() {
        let fragment = ScanFragment::from("67e55044-10b1-426f-9247-bb680e5fe0c8\r\n".to_string());
        assert_eq!(
            registration_id(&fragment),
            Some(Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap())
        );
    }

    #[test]
    fn test_non_uuid_scan_is_none() {
        assert_eq!(registration_id(&ScanFragment::from("A1234\n".to_string())), None);
        assert_eq!(registration_id(&ScanFragment::from(String::new())), None);
    }

    #[test]
    fn test_partial_uuid_is_none() {
        let fragment = ScanFragment::from("67e55044-10b1-426f".to_string());
        assert_eq!(registration_id(&fragment), None);
    }
}
