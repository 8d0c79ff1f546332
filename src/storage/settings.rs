//! Backup configuration, read once at startup from the experience settings
//! document.
//!
//! The document is owned by the dashboard UI; the backup subsystem only
//! cares about its `backup` object. A missing, unreadable or malformed
//! document is never fatal: the defaults apply and a note is logged.

use chrono::NaiveTime;
use derive_more::{Deref, Display, From};
use getset::CopyGetters;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Formatter;
use std::path::Path;
use std::result;
use tracing::{info, warn};
use validator::Validate;

/// A wall-clock time of day in `"HH:MM"` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deref, Display, From)]
#[display("{}", _0.format("%H:%M"))]
pub struct TimeOfDay(NaiveTime);

impl Default for TimeOfDay {
    fn default() -> Self {
        NaiveTime::MIN.into()
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct TimeOfDayVisitor;

impl Visitor<'_> for TimeOfDayVisitor {
    type Value = TimeOfDay;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a time of day in HH:MM form")
    }

    fn visit_str<E>(self, v: &str) -> result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        NaiveTime::parse_from_str(v, "%H:%M")
            .map(TimeOfDay::from)
            .map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> result::Result<Self, D::Error> {
        deserializer.deserialize_str(TimeOfDayVisitor)
    }
}

/// Backup schedule and retention settings.
///
/// Missing fields fall back to the defaults individually, matching how the
/// dashboard merges partial settings objects.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, CopyGetters)]
#[serde(default, rename_all = "camelCase")]
#[getset(get_copy = "pub")]
pub struct BackupSettings {
    enabled: bool,
    backup_time: TimeOfDay,
    #[validate(range(min = 1))]
    max_backups: usize,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            backup_time: TimeOfDay::default(),
            max_backups: 2,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ExperienceDoc {
    #[serde(default)]
    backup: BackupSettings,
}

impl BackupSettings {
    /// Reads the `backup` object out of the experience settings document.
    ///
    /// Falls back to the defaults when the document is absent, unreadable,
    /// malformed, or fails validation. Settings are immutable for the life
    /// of the schedule loop; edits take effect on the next restart.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                serde_json::from_str::<ExperienceDoc>(&raw).map_err(|e| e.to_string())
            });

        let settings = match parsed {
            Ok(doc) => doc.backup,
            Err(e) => {
                info!("using default backup settings ({e})");
                return Self::default();
            }
        };

        if let Err(e) = settings.validate() {
            warn!("invalid backup settings in {:?}, using defaults: {e}", path);
            return Self::default();
        }

        settings
    }
}
