//! Builds one compressed snapshot of the data directory.
//!
//! Archives are zip files named after the instant they were taken, written
//! to a temp name first and renamed into place only once the stream has
//! been finalized, so a crash mid-write never leaves something the pruner
//! or the listing would mistake for a real backup.

use crate::storage::error::{Error, Result};
use chrono::{DateTime, Utc};
use getset::{CopyGetters, Getters};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufWriter, IntoInnerError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ARCHIVE_PREFIX: &str = "backup-";
pub const ARCHIVE_EXT: &str = ".zip";

/// Top-level folder inside every archive; the source tree is mirrored
/// underneath it.
pub const ARCHIVE_ROOT: &str = "data";

/// ISO-8601 with `:` and `.` replaced and sub-second precision dropped, so
/// names are filesystem-safe and sort lexicographically in creation order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Metadata for one archive produced by a backup cycle.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct ArchiveInfo {
    #[getset(get = "pub")]
    filename: String,
    #[getset(get = "pub")]
    path: PathBuf,
    #[getset(get_copy = "pub")]
    size_bytes: u64,
    #[getset(get_copy = "pub")]
    created: DateTime<Utc>,
}

/// Derives the archive file name for a given instant. Pure: the same
/// instant always yields the same name.
pub fn archive_file_name(at: DateTime<Utc>) -> String {
    format!("{ARCHIVE_PREFIX}{}{ARCHIVE_EXT}", at.format(TIMESTAMP_FORMAT))
}

/// Snapshots `source_root` into a zip under `output_dir`.
///
/// A direct child of `source_root` named `exclude_dir_name` is skipped
/// entirely; directories of the same name deeper in the tree are archived
/// as usual. Any traversal or write error aborts the whole operation and
/// removes the partial temp file.
pub fn create_archive(
    source_root: &Path,
    output_dir: &Path,
    exclude_dir_name: &str,
    at: DateTime<Utc>,
) -> Result<ArchiveInfo> {
    fs::create_dir_all(output_dir).map_err(|source| Error::Directory {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let filename = archive_file_name(at);
    let path = output_dir.join(&filename);
    let tmp_path = output_dir.join(format!("{filename}.tmp"));

    if let Err(e) = write_archive(source_root, exclude_dir_name, &tmp_path) {
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            warn!("could not remove partial archive {:?}: {cleanup}", tmp_path);
        }
        return Err(e);
    }
    fs::rename(&tmp_path, &path)?;

    let size_bytes = fs::metadata(&path)?.len();
    info!("created backup {filename} ({size_bytes} bytes)");

    Ok(ArchiveInfo {
        filename,
        path,
        size_bytes,
        created: at,
    })
}

fn write_archive(source_root: &Path, exclude_dir_name: &str, dest: &Path) -> Result<()> {
    let mut writer = ZipWriter::new(BufWriter::new(File::create(dest)?));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    // The backup output directory is a direct child of the source root;
    // skipping it by name at depth 1 keeps an archive from swallowing the
    // archives that came before it.
    let exclude: &OsStr = exclude_dir_name.as_ref();
    let entries = WalkDir::new(source_root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && e.file_type().is_dir() && e.file_name() == exclude));

    let mut entry_count = 0;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(source_root)
            .map_err(io::Error::other)?;
        let dst = Path::new(ARCHIVE_ROOT).join(rel);
        debug!("adding {:?} as {:?}", entry.path(), dst);
        writer.start_file(dst.to_string_lossy(), options)?;
        io::copy(&mut File::open(entry.path())?, &mut writer)?;
        entry_count += 1;
    }
    debug!("wrote {entry_count} archive entries");

    writer
        .finish()?
        .into_inner()
        .map_err(IntoInnerError::into_error)?
        .sync_all()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn fixed_instant(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, secs).unwrap()
    }

    fn create_source_tree(dir: &Path) {
        std::fs::write(dir.join("a.json"), "{\"a\":1}").unwrap();
        std::fs::write(dir.join("b.json"), "{\"b\":2}").unwrap();
        std::fs::create_dir_all(dir.join("photos")).unwrap();
        std::fs::write(dir.join("photos/pic.png"), [0u8; 16]).unwrap();
        std::fs::create_dir_all(dir.join("backups")).unwrap();
        std::fs::write(dir.join("backups/old.zip"), "stale").unwrap();
    }

    fn archive_names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_file_name_derivation() {
        // Timestamp 2024-03-15T08:30:00.000Z from the backup naming contract.
        assert_eq!(
            archive_file_name(fixed_instant(0)),
            "backup-2024-03-15T08-30-00.zip"
        );
    }

    #[test]
    fn test_file_name_is_deterministic_and_collision_free() {
        let a = archive_file_name(fixed_instant(1));
        let b = archive_file_name(fixed_instant(1));
        let c = archive_file_name(fixed_instant(2));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(c > a, "later instants must sort after earlier ones");
    }

    #[test]
    fn test_archive_excludes_backup_directory() {
        let tmp = TempDir::new().unwrap();
        create_source_tree(tmp.path());

        let info = create_archive(
            tmp.path(),
            &tmp.path().join("backups"),
            "backups",
            fixed_instant(0),
        )
        .unwrap();

        let names = archive_names(info.path());
        assert!(names.contains(&"data/a.json".to_string()));
        assert!(names.contains(&"data/b.json".to_string()));
        assert!(names.contains(&"data/photos/pic.png".to_string()));
        assert!(
            !names.iter().any(|n| n.starts_with("data/backups/")),
            "archive must never contain the backup output directory: {names:?}"
        );
    }

    #[test]
    fn test_nested_directory_with_excluded_name_is_archived() {
        let tmp = TempDir::new().unwrap();
        create_source_tree(tmp.path());
        std::fs::create_dir_all(tmp.path().join("nested/backups")).unwrap();
        std::fs::write(tmp.path().join("nested/backups/keep.txt"), "keep").unwrap();

        let info = create_archive(
            tmp.path(),
            &tmp.path().join("backups"),
            "backups",
            fixed_instant(0),
        )
        .unwrap();

        // Only the top-level directory is excluded; same-named directories
        // deeper in the tree are backed up.
        let names = archive_names(info.path());
        assert!(names.contains(&"data/nested/backups/keep.txt".to_string()));
    }

    #[test]
    fn test_archive_round_trips_content() {
        let tmp = TempDir::new().unwrap();
        create_source_tree(tmp.path());

        let info = create_archive(
            tmp.path(),
            &tmp.path().join("backups"),
            "backups",
            fixed_instant(0),
        )
        .unwrap();
        assert!(info.size_bytes() > 0);
        assert_eq!(info.path(), &tmp.path().join("backups").join(info.filename()));

        let mut archive = ZipArchive::new(File::open(info.path()).unwrap()).unwrap();
        let mut contents = String::new();
        archive
            .by_name("data/a.json")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "{\"a\":1}");
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let tmp = TempDir::new().unwrap();
        create_source_tree(tmp.path());
        let out = tmp.path().join("backups");

        create_archive(tmp.path(), &out, "backups", fixed_instant(0)).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(&out)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_output_directory_created_when_missing() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.json"), "{}").unwrap();
        let out = tmp.path().join("backups");
        assert!(!out.exists());

        create_archive(tmp.path(), &out, "backups", fixed_instant(0)).unwrap();
        assert!(out.is_dir());
    }
}
