//! # homeboard-storage
//!
//! Storage backend for a household task/rewards dashboard, with automatic
//! daily backups.
//!
//! ## Features
//!
//! - **JSON document store**: tasks, rewards, users and settings persisted
//!   as pretty-printed JSON files
//! - **Photo assets**: upload, listing and static serving
//! - **Scheduled backups**: a daily zip snapshot of the data directory at a
//!   configured time of day
//! - **Retention management**: keeps only the newest `maxBackups` archives
//! - **On-demand trigger**: `POST /api/backup` runs a backup immediately
//!
//! ## Quick Start
//!
//! ```no_run
//! use homeboard_storage::storage::scheduler::{self, BackupService};
//! use homeboard_storage::storage::settings::BackupSettings;
//! use std::sync::Arc;
//!
//! # async fn start() {
//! // Read backup settings from the dashboard's settings document
//! let settings = BackupSettings::load("data/experience.json");
//!
//! // Start the daily backup loop
//! let service = Arc::new(BackupService::new("data"));
//! tokio::spawn(scheduler::run_schedule(service.clone(), settings));
//! # }
//! ```

pub mod http;
pub mod storage;
