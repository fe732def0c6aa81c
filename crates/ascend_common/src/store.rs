//! Local durable storage.
//!
//! One JSON file per storage key, written synchronously on every change.
//! A missing file means first run. A corrupt file is moved aside to
//! `<key>.json.corrupt` and then treated the same way, so the app can always
//! start and the next save does not destroy the unreadable copy.

use crate::error::AscendError;
use crate::persistence::{parse_blob, SavedBlob};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Storage key used by the current schema
pub const DEFAULT_STORAGE_KEY: &str = "daily_ascensions_v3";

pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(data_dir: impl AsRef<Path>, storage_key: &str) -> Self {
        let path = data_dir.as_ref().join(format!("{storage_key}.json"));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable save is kept after a failed load
    pub fn corrupt_path(&self) -> PathBuf {
        self.path.with_extension("json.corrupt")
    }

    /// Read the saved blob, if there is a readable one.
    pub fn load(&self) -> Option<SavedBlob> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no local save");
                return None;
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                warn!(path = %self.path.display(), error = %e, "local save is not text");
                self.move_aside();
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read local save");
                return None;
            }
        };

        match parse_blob(&raw) {
            Ok(blob) => Some(blob),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to load save data, using defaults");
                self.move_aside();
                None
            }
        }
    }

    fn move_aside(&self) {
        let target = self.corrupt_path();
        match fs::rename(&self.path, &target) {
            Ok(()) => warn!(kept = %target.display(), "unreadable save moved aside"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "could not move unreadable save aside"),
        }
    }

    /// Write the blob atomically (temp file + rename).
    pub fn save(&self, blob: &SavedBlob) -> Result<(), AscendError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(blob)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
