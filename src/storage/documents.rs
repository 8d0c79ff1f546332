//! The JSON document store backing the dashboard: one pretty-printed
//! `.json` file per document under the data directory.

use crate::storage::error::{Error, Result};
use crate::storage::validate::safe_file_name;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn document_path(data_dir: &Path, name: &str) -> Result<PathBuf> {
    safe_file_name(name)?;
    Ok(data_dir.join(format!("{name}.json")))
}

/// Reads one document, or `None` when it does not exist yet.
pub fn read_document(data_dir: &Path, name: &str) -> Result<Option<Value>> {
    let path = document_path(data_dir, name)?;
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(Some(serde_json::from_str(&raw)?))
}

/// Writes one document, creating the data directory if needed.
pub fn write_document(data_dir: &Path, name: &str, data: &Value) -> Result<()> {
    let path = document_path(data_dir, name)?;
    fs::create_dir_all(data_dir).map_err(|source| Error::Directory {
        path: data_dir.to_path_buf(),
        source,
    })?;
    fs::write(&path, serde_json::to_string_pretty(data)?)?;
    debug!("saved document {name} to {:?}", path);

    Ok(())
}

/// Writes starter documents on first run so the dashboard has something to
/// render before anyone configures it. Existing documents are left alone.
pub fn seed_defaults(data_dir: &Path) -> Result<()> {
    let defaults = [
        (
            "tasks",
            json!([{
                "id": 1,
                "name": "Make Bed",
                "points": 1,
                "assignedTo": "",
                "completed": false,
                "recurrence": ["Mon", "Tue", "Wed", "Thu", "Fri"],
                "period": "Morning"
            }]),
        ),
        (
            "rewards",
            json!([
                { "id": 1, "name": "Ice Cream", "cost": 5 },
                { "id": 2, "name": "Movie Night", "cost": 10 }
            ]),
        ),
        ("users", json!({ "users": [] })),
    ];

    for (name, value) in defaults {
        if document_path(data_dir, name)?.exists() {
            continue;
        }
        write_document(data_dir, name, &value)?;
        info!("initialized {name}.json");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_document() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(read_document(tmp.path(), "tasks").unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let tmp = TempDir::new().unwrap();
        let data = json!({ "themeMode": "auto", "accentColor": "blue" });

        write_document(tmp.path(), "theme", &data).unwrap();
        assert_eq!(read_document(tmp.path(), "theme").unwrap(), Some(data));
    }

    #[test]
    fn test_document_name_traversal_rejected() {
        let tmp = TempDir::new().unwrap();

        let err = read_document(tmp.path(), "../secrets").unwrap_err();
        assert!(matches!(err, Error::UnsafeFileName(_)));

        let err = write_document(tmp.path(), "a/b", &json!({})).unwrap_err();
        assert!(matches!(err, Error::UnsafeFileName(_)));
    }

    #[test]
    fn test_seed_defaults_does_not_overwrite() {
        let tmp = TempDir::new().unwrap();
        let mine = json!([{ "id": 9, "name": "Feed Cat", "points": 2 }]);
        write_document(tmp.path(), "tasks", &mine).unwrap();

        seed_defaults(tmp.path()).unwrap();

        assert_eq!(read_document(tmp.path(), "tasks").unwrap(), Some(mine));
        assert!(read_document(tmp.path(), "rewards").unwrap().is_some());
        assert!(read_document(tmp.path(), "users").unwrap().is_some());
    }
}
