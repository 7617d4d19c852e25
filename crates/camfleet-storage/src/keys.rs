//! Shared key generation for archive backends.
//!
//! Key format: `{prefix}{device address}/{YYYY-MM-DD}/{file name}`.

use chrono::NaiveDate;
use std::path::{Component, Path};

use crate::traits::{StorageError, StorageResult};

/// Generate the archive key for one file.
///
/// The prefix is used verbatim, so callers that want a folder include the
/// trailing `/` themselves (`"gopro/"`).
pub fn archive_key(prefix: &str, device_address: &str, date: NaiveDate, filename: &str) -> String {
    format!(
        "{}{}/{}/{}",
        prefix,
        device_address,
        date.format("%Y-%m-%d"),
        filename
    )
}

/// Reject keys that are empty, absolute, or step outside the archive root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') {
        return Err(StorageError::InvalidKey(format!("{:?}", key)));
    }
    let escapes = Path::new(key)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!("{:?} leaves the archive root", key)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_valid() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert!(validate_key(&archive_key("gopro/", "10.0.0.1", date, "GOPR0001.JPG")).is_ok());
    }

    #[test]
    fn traversal_and_absolute_keys_rejected() {
        for key in ["", "/etc/passwd", "../escape.JPG", "a/../../b", "./a.JPG"] {
            assert!(
                matches!(validate_key(key), Err(StorageError::InvalidKey(_))),
                "{key}"
            );
        }
    }

    #[test]
    fn key_is_namespaced_by_address_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            archive_key("", "192.168.1.10", date, "GX010001.MP4"),
            "192.168.1.10/2024-03-07/GX010001.MP4"
        );
        assert_eq!(
            archive_key("gopro/", "192.168.1.10", date, "GOPR0001.JPG"),
            "gopro/192.168.1.10/2024-03-07/GOPR0001.JPG"
        );
    }
}
