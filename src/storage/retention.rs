//! Retention management for the backup output directory.
//!
//! Archive file names embed a zero-padded timestamp, so a plain descending
//! string sort orders them newest first; the pruner keeps the first
//! `max_backups` of that order and deletes the rest.

use crate::storage::archive::{ARCHIVE_EXT, ARCHIVE_PREFIX};
use crate::storage::error::{Error, Result};
use chrono::{DateTime, Utc};
use getset::{CopyGetters, Getters};
use itertools::Itertools;
use serde::Serialize;
use std::cmp::Reverse;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// One archive as reported by the backup listing.
#[derive(Clone, Debug, PartialEq, Serialize, Getters, CopyGetters)]
pub struct BackupEntry {
    #[getset(get = "pub")]
    filename: String,
    #[getset(get_copy = "pub")]
    size: u64,
    #[getset(get_copy = "pub")]
    created: DateTime<Utc>,
    /// The instant encoded in the file name, as written there.
    #[getset(get = "pub")]
    timestamp: String,
}

pub fn is_archive_name(name: &str) -> bool {
    name.starts_with(ARCHIVE_PREFIX) && name.ends_with(ARCHIVE_EXT)
}

/// Archive file names in `output_dir`, newest first.
fn archive_names(output_dir: &Path) -> Result<Vec<String>> {
    let names = fs::read_dir(output_dir)
        .map_err(|source| Error::Directory {
            path: output_dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_archive_name(name))
        .sorted_unstable_by_key(|name| Reverse(name.clone()))
        .collect_vec();

    Ok(names)
}

/// Lists all archives in `output_dir`, newest first.
///
/// The directory is created when missing so a fresh install reports an
/// empty list instead of an error. Entries that cannot be stat'ed are
/// logged and skipped.
pub fn list_backups(output_dir: &Path) -> Result<Vec<BackupEntry>> {
    fs::create_dir_all(output_dir).map_err(|source| Error::Directory {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for name in archive_names(output_dir)? {
        let path = output_dir.join(&name);
        let stat = fs::metadata(&path).and_then(|md| md.modified().map(|m| (md.len(), m)));
        let (size, modified) = match stat {
            Ok(stat) => stat,
            Err(e) => {
                warn!("cannot stat backup {:?}: {e}", path);
                continue;
            }
        };
        let timestamp = name[ARCHIVE_PREFIX.len()..name.len() - ARCHIVE_EXT.len()].to_string();
        entries.push(BackupEntry {
            filename: name,
            size,
            created: modified.into(),
            timestamp,
        });
    }

    Ok(entries)
}

/// Deletes every archive beyond the `max_backups` newest ones.
///
/// Individual delete failures are logged and do not abort the remaining
/// deletions; the backup that triggered the prune has already succeeded.
/// Returns the names actually removed.
pub fn prune_old_archives(output_dir: &Path, max_backups: usize) -> Result<Vec<String>> {
    let names = archive_names(output_dir)?;

    let mut deleted = Vec::new();
    for name in names.into_iter().skip(max_backups) {
        match fs::remove_file(output_dir.join(&name)) {
            Ok(()) => {
                info!("deleted old backup {name}");
                deleted.push(name);
            }
            Err(e) => warn!("could not delete old backup {name}: {e}"),
        }
    }

    Ok(deleted)
}
