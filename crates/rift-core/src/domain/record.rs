//! History records
//!
//! A [`ConflictRecord`] is one entry of the conflict history: the conflict,
//! whether it is currently resolved, and the resolution that resolved it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{conflict::Conflict, resolution::Resolution};

/// Metadata key holding the strategy chain failure for unresolved records
pub const ERROR_KEY: &str = "error";

/// A single entry of the conflict history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    conflict: Conflict,
    resolved: bool,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    resolution: Option<Resolution>,
}

impl ConflictRecord {
    /// Records a conflict resolved by a successful strategy execution
    ///
    /// This is the only way to obtain a record with `resolved == true`.
    pub fn resolved_by(conflict: Conflict, resolution: Resolution) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("strategy".to_string(), resolution.strategy().to_string());
        metadata.insert("status".to_string(), resolution.status().to_string());

        Self {
            conflict,
            resolved: true,
            timestamp: Utc::now(),
            metadata,
            resolution: Some(resolution),
        }
    }

    /// Records a conflict no strategy could resolve
    pub fn unresolved(conflict: Conflict, error: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(ERROR_KEY.to_string(), error.into());

        Self {
            conflict,
            resolved: false,
            timestamp: Utc::now(),
            metadata,
            resolution: None,
        }
    }

    /// Adds a free-form metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn conflict(&self) -> &Conflict {
        &self.conflict
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// Flags this record as no longer resolved
    ///
    /// The stored resolution, if any, is kept and marked as rolled back.
    /// Returns `false` if the record was already unresolved.
    pub fn revert(&mut self) -> bool {
        if !self.resolved {
            return false;
        }

        self.resolved = false;
        self.resolution = self.resolution.take().map(Resolution::rolled_back);
        self.metadata
            .insert("rolled_back_at".to_string(), Utc::now().to_rfc3339());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conflict::ConflictType;

    fn sample_conflict() -> Conflict {
        Conflict::new(ConflictType::Path, 1)
            .with_participant("/tmp/a")
            .with_reason("duplicate")
    }

    #[test]
    fn test_resolved_record() {
        let resolution = Resolution::new("auto_merge", "merged").unwrap();
        let record = ConflictRecord::resolved_by(sample_conflict(), resolution);

        assert!(record.is_resolved());
        assert_eq!(record.metadata()["strategy"], "auto_merge");
        assert_eq!(record.metadata()["status"], "merged");
        assert_eq!(record.resolution().unwrap().status(), "merged");
    }

    #[test]
    fn test_unresolved_record() {
        let record = ConflictRecord::unresolved(sample_conflict(), "all strategies failed");

        assert!(!record.is_resolved());
        assert!(record.resolution().is_none());
        assert_eq!(record.metadata()[ERROR_KEY], "all strategies failed");
    }

    #[test]
    fn test_revert_flips_resolved_once() {
        let resolution = Resolution::new("auto_merge", "merged").unwrap();
        let mut record = ConflictRecord::resolved_by(sample_conflict(), resolution);

        assert!(record.revert());
        assert!(!record.is_resolved());
        assert!(record.resolution().unwrap().is_rolled_back());
        assert!(record.metadata().contains_key("rolled_back_at"));

        assert!(!record.revert());
    }

    #[test]
    fn test_record_deserializes_without_optional_fields() {
        let conflict = sample_conflict();
        let json = serde_json::json!({
            "conflict": conflict,
            "resolved": true,
            "timestamp": "2024-05-01T10:00:00Z",
        });

        let record: ConflictRecord = serde_json::from_value(json).unwrap();
        assert!(record.is_resolved());
        assert!(record.metadata().is_empty());
        assert!(record.resolution().is_none());
    }
}
