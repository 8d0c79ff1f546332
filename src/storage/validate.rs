//! Validation helpers for directories and request-supplied file names.

use sanitize_filename::{is_sanitized, sanitize};
use validator::ValidationError;

use crate::storage::error::{Error, Result};
use std::path::Path;

/// Rejects any name that could escape the directory it is joined onto.
///
/// A name passes only if sanitizing would leave it unchanged. This rules
/// out path separators, `..`, null bytes and reserved names.
pub fn safe_file_name(name: &str) -> Result<()> {
    if name.is_empty() || !is_sanitized(name) {
        tracing::warn!(
            "rejecting file name {:?}, sanitized form would be {:?}",
            name,
            sanitize(name)
        );
        return Err(Error::UnsafeFileName(name.to_string()));
    }

    Ok(())
}

pub fn validate_writable_dir<P: AsRef<Path>>(dir: P) -> std::result::Result<(), ValidationError> {
    let dir = dir.as_ref();
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ValidationError::new("InvalidDirectory")
                .with_message(format!("{:?} is not a directory", dir).into()));
        }
    } else {
        std::fs::create_dir_all(dir).map_err(|e| {
            ValidationError::new("InvalidDirectory")
                .with_message(format!("cannot create or access {:?}: {}", dir, e).into())
        })?;
    }

    let md = std::fs::metadata(dir).map_err(|e| {
        ValidationError::new("InvalidDirectory")
            .with_message(format!("cannot access metadata for {:?}: {}", dir, e).into())
    })?;
    if md.permissions().readonly() {
        Err(ValidationError::new("InvalidDirectory")
            .with_message(format!("cannot write to dir {:?}", dir).into()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_safe_file_name_accepts_plain_names() {
        assert!(safe_file_name("backup-2024-03-15T08-30-00.zip").is_ok());
        assert!(safe_file_name("tasks").is_ok());
        assert!(safe_file_name("photo_1.png").is_ok());
    }

    #[test]
    fn test_safe_file_name_rejects_traversal() {
        for name in ["../etc/passwd", "..", "a/b.zip", "a\\b.zip", "", "."] {
            match safe_file_name(name) {
                Err(Error::UnsafeFileName(rejected)) => assert_eq!(rejected, name),
                other => panic!("expected rejection for {name:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_validate_writable_dir_creates_missing() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("fresh");

        validate_writable_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_validate_writable_dir_rejects_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("not_a_dir");
        std::fs::write(&file, "x").unwrap();

        assert!(validate_writable_dir(&file).is_err());
    }
}
