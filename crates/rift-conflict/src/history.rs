//! Conflict history
//!
//! An append-only list of [`ConflictRecord`]s with query helpers and JSON
//! persistence. Snapshots are versioned:
//!
//! ```json
//! {"version": 1, "records": [ ... ]}
//! ```
//!
//! Writes go to a sibling temporary file that is then renamed over the
//! target, so a crash never leaves a truncated snapshot behind.

use std::fs;
use std::path::{Path, PathBuf};

use rift_core::domain::{ConflictId, ConflictRecord, ConflictType};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConflictError;

/// Schema version written by this build
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    records: &'a [ConflictRecord],
}

#[derive(Deserialize)]
struct SnapshotIn {
    version: u32,
    records: serde_json::Value,
}

/// Ordered log of detected conflicts and their outcomes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConflictHistory {
    records: Vec<ConflictRecord>,
}

impl ConflictHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record
    pub fn add(&mut self, record: ConflictRecord) {
        debug!(
            conflict_id = %record.conflict().id(),
            resolved = record.is_resolved(),
            "History record added"
        );
        self.records.push(record);
    }

    /// Records whose `resolved` flag equals `resolved`, in insertion order
    pub fn filter(&self, resolved: bool) -> Vec<&ConflictRecord> {
        self.records
            .iter()
            .filter(|r| r.is_resolved() == resolved)
            .collect()
    }

    /// Records whose conflict has type `conflict_type`, in insertion order
    pub fn search_by_type(&self, conflict_type: ConflictType) -> Vec<&ConflictRecord> {
        self.records
            .iter()
            .filter(|r| r.conflict().conflict_type() == conflict_type)
            .collect()
    }

    /// Most recent record for conflict `id`
    pub fn find(&self, id: &ConflictId) -> Option<&ConflictRecord> {
        self.records.iter().rev().find(|r| r.conflict().id() == id)
    }

    pub(crate) fn find_mut(&mut self, id: &ConflictId) -> Option<&mut ConflictRecord> {
        self.records
            .iter_mut()
            .rev()
            .find(|r| r.conflict().id() == id)
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut ConflictRecord> {
        self.records.last_mut()
    }

    pub fn records(&self) -> &[ConflictRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Writes the full history to `path` as pretty-printed JSON
    ///
    /// Parent directories are created as needed.
    pub fn save_history(&self, path: &Path) -> Result<(), ConflictError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let snapshot = SnapshotOut {
            version: SNAPSHOT_VERSION,
            records: &self.records,
        };
        let json = serde_json::to_vec_pretty(&snapshot)?;

        let tmp_path = temp_path(path);
        debug!(path = %tmp_path.display(), "Writing history to temporary file");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;

        info!(path = %path.display(), records = self.records.len(), "History saved");
        Ok(())
    }

    /// Replaces the in-memory history with the snapshot at `path`
    ///
    /// # Errors
    /// [`ConflictError::Persistence`] if the snapshot has an unsupported
    /// version; I/O and JSON errors otherwise. On error the current history
    /// is left untouched.
    pub fn load_history(&mut self, path: &Path) -> Result<(), ConflictError> {
        let data = fs::read(path)?;
        let snapshot: SnapshotIn = serde_json::from_slice(&data)?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ConflictError::Persistence(format!(
                "{}: unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                path.display(),
                snapshot.version
            )));
        }

        self.records = serde_json::from_value(snapshot.records)?;
        info!(path = %path.display(), records = self.records.len(), "History loaded");
        Ok(())
    }

    /// Same as [`save_history`](Self::save_history)
    pub fn export_history(&self, path: &Path) -> Result<(), ConflictError> {
        self.save_history(path)
    }

    /// Same as [`load_history`](Self::load_history)
    pub fn import_history(&mut self, path: &Path) -> Result<(), ConflictError> {
        self.load_history(path)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
