use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppResult;

#[derive(Serialize, Deserialize)]
struct WatermarkFile {
    last_run: String,
}

/// Timestamp of the last successful run, persisted as `{"last_run": "<ISO-8601>"}`.
pub struct WatermarkStore {
    file_path: PathBuf,
}

impl WatermarkStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Returns the stored watermark, or `now - 24h` when the file is absent or unreadable.
    pub fn load(&self, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let fallback = now - TimeDelta::days(1);
        let contents = match fs::read_to_string(&self.file_path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %self.file_path.display(), error = %err, "no previous run recorded");
                return fallback;
            }
        };

        let parsed = serde_json::from_str::<WatermarkFile>(&contents)
            .ok()
            .and_then(|file| parse_timestamp(&file.last_run, *now.offset()));
        match parsed {
            Some(timestamp) => timestamp,
            None => {
                warn!(path = %self.file_path.display(), "ignoring unreadable watermark file");
                fallback
            }
        }
    }

    pub fn save(&self, timestamp: DateTime<FixedOffset>) -> AppResult<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string(&WatermarkFile {
            last_run: timestamp.to_rfc3339(),
        })?;
        fs::write(&self.file_path, data)?;
        Ok(())
    }
}

// Timestamps without an offset are read in the zone of the current run.
fn parse_timestamp(raw: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| naive.and_local_timezone(offset).single())
}
