//! The on-demand backup trigger and the recurring daily schedule.
//!
//! The schedule is an explicit loop in a dedicated task: compute the next
//! fire time from the configured time of day, sleep until then, run a
//! backup, repeat. A failed cycle is logged and the next one is still
//! armed, so a transient I/O failure never silently disables backups.

use crate::storage::archive::{self, ArchiveInfo};
use crate::storage::error::{Error, Result};
use crate::storage::retention;
use crate::storage::settings::BackupSettings;
use chrono::{Duration, Local, NaiveDateTime, NaiveTime, Utc};
use getset::Getters;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Name of the directory that receives archives, as a direct child of the
/// data directory. Excluded from archive traversal so archives never nest.
pub const BACKUP_DIR_NAME: &str = "backups";

/// Runs backups against one data directory.
///
/// Both the schedule loop and the HTTP trigger go through [`run_backup`],
/// which serializes runs behind a single lock; at most one archive is ever
/// being written at a time.
///
/// [`run_backup`]: BackupService::run_backup
#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct BackupService {
    source_root: PathBuf,
    output_dir: PathBuf,
    #[getset(skip)]
    run_lock: Mutex<()>,
}

/// What one backup cycle produced.
#[derive(Debug)]
pub struct BackupOutcome {
    pub archive: ArchiveInfo,
    pub pruned: Vec<String>,
}

impl BackupService {
    pub fn new<P: Into<PathBuf>>(source_root: P) -> Self {
        let source_root = source_root.into();
        let output_dir = source_root.join(BACKUP_DIR_NAME);
        Self {
            source_root,
            output_dir,
            run_lock: Mutex::new(()),
        }
    }

    /// Creates an archive now, then prunes down to `max_backups`.
    ///
    /// `max_backups` is clamped to at least 1 so a prune can never delete
    /// the archive it just created.
    pub async fn run_backup(&self, max_backups: usize) -> Result<BackupOutcome> {
        let _guard = self.run_lock.lock().await;

        let source_root = self.source_root.clone();
        let output_dir = self.output_dir.clone();
        let max_backups = max_backups.max(1);

        tokio::task::spawn_blocking(move || {
            let archive =
                archive::create_archive(&source_root, &output_dir, BACKUP_DIR_NAME, Utc::now())?;
            let pruned = retention::prune_old_archives(&output_dir, max_backups)?;
            Ok(BackupOutcome { archive, pruned })
        })
        .await
        .map_err(|e| Error::Io(io::Error::other(e)))?
    }
}

/// Next wall-clock instant the daily backup should fire: today at `at`, or
/// tomorrow if that moment has already passed.
pub fn next_fire_time(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let mut next = now.date().and_time(at);
    if next < now {
        next += Duration::days(1);
    }
    next
}

/// Daily backup loop; runs for the lifetime of the process.
///
/// When the settings disable backups this logs once and returns, and no
/// scheduled backup will ever run.
pub async fn run_schedule(service: Arc<BackupService>, settings: BackupSettings) {
    if !settings.enabled() {
        info!("backup schedule is disabled");
        return;
    }

    loop {
        let now = Local::now().naive_local();
        let next = next_fire_time(now, *settings.backup_time());
        let wait = (next - now).to_std().unwrap_or_default();
        info!("next backup scheduled at {next}");
        tokio::time::sleep(wait).await;

        info!("starting scheduled backup");
        match service.run_backup(settings.max_backups()).await {
            Ok(outcome) => info!(
                "scheduled backup completed: {} ({} pruned)",
                outcome.archive.filename(),
                outcome.pruned.len()
            ),
            Err(e) => error!("scheduled backup failed: {e}"),
        }
    }
}
