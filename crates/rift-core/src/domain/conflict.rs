//! Conflict domain entities
//!
//! A [`Conflict`] is a typed record of a divergence between resources
//! (paths, content, versions, permissions). Detectors and the real-time
//! monitor build conflicts; scorers and strategies only read them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::ConflictId;

/// Metadata key holding the human-readable cause of a conflict
pub const REASON_KEY: &str = "reason";

/// The kind of divergence a conflict describes
///
/// The set is closed. Snapshots written by a newer engine may carry a kind
/// this build does not know; those decode as [`ConflictType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConflictType {
    /// Two paths collide, or a path points nowhere
    Path,
    /// Concurrent modification of a resource's bytes
    Content,
    /// A module version incompatible with the baseline
    Version,
    /// A resource the engine is not allowed to read
    Permission,
    /// Any kind outside the four above
    #[serde(other)]
    Unknown,
}

impl ConflictType {
    /// The four kinds detectors produce
    pub const ALL: [ConflictType; 4] = [
        ConflictType::Path,
        ConflictType::Content,
        ConflictType::Version,
        ConflictType::Permission,
    ];
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictType::Path => "Path",
            ConflictType::Content => "Content",
            ConflictType::Version => "Version",
            ConflictType::Permission => "Permission",
            ConflictType::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ConflictType {
    type Err = super::errors::DomainError;

    /// Parses a kind name case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConflictType::ALL
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                super::errors::DomainError::ValidationFailed(format!(
                    "unknown conflict type '{s}'; valid: path, content, version, permission"
                ))
            })
    }
}

/// A detector-defined metadata value
///
/// Numbers feed the scorer (`impact`, `urgency`, `complexity`); text carries
/// descriptive context such as `reason`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Number(f64),
    Text(String),
}

impl MetadataValue {
    /// Returns the numeric value, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Number(n) => Some(*n),
            MetadataValue::Text(_) => None,
        }
    }

    /// Returns the text value, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            MetadataValue::Number(_) => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Number(n) => write!(f, "{}", n),
            MetadataValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Number(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

/// A detected divergence between resources
///
/// Conflicts are value data: build one with [`Conflict::new`] and the
/// `with_*` methods, then hand it off. There are no mutating accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Unique identifier for this conflict
    id: ConflictId,
    /// What kind of divergence this is
    #[serde(rename = "type")]
    conflict_type: ConflictType,
    /// Higher is more severe
    severity: u32,
    /// Implicated resources, in the order the detector saw them
    participants: Vec<String>,
    /// Detector-specific context
    metadata: BTreeMap<String, MetadataValue>,
    /// When the conflict was detected
    detected_at: DateTime<Utc>,
}

impl Conflict {
    /// Creates a conflict with no participants or metadata
    ///
    /// # Example
    ///
    /// ```
    /// use rift_core::domain::conflict::{Conflict, ConflictType};
    ///
    /// let conflict = Conflict::new(ConflictType::Version, 3)
    ///     .with_participant("modB")
    ///     .with_reason("incompatible version");
    ///
    /// assert_eq!(conflict.participants(), ["modB".to_string()]);
    /// assert_eq!(conflict.reason(), Some("incompatible version"));
    /// ```
    pub fn new(conflict_type: ConflictType, severity: u32) -> Self {
        Self {
            id: ConflictId::new(),
            conflict_type,
            severity,
            participants: Vec::new(),
            metadata: BTreeMap::new(),
            detected_at: Utc::now(),
        }
    }

    /// Appends one participant
    pub fn with_participant(mut self, participant: impl Into<String>) -> Self {
        self.participants.push(participant.into());
        self
    }

    /// Appends several participants, keeping their order
    pub fn with_participants<I, S>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participants
            .extend(participants.into_iter().map(Into::into));
        self
    }

    /// Sets a metadata entry, replacing any previous value for `key`
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Shorthand for `with_metadata("reason", reason)`
    pub fn with_reason(self, reason: impl Into<String>) -> Self {
        self.with_metadata(REASON_KEY, MetadataValue::Text(reason.into()))
    }

    pub fn id(&self) -> &ConflictId {
        &self.id
    }

    pub fn conflict_type(&self) -> ConflictType {
        self.conflict_type
    }

    pub fn severity(&self) -> u32 {
        self.severity
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn metadata(&self) -> &BTreeMap<String, MetadataValue> {
        &self.metadata
    }

    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    /// Returns a numeric metadata entry, ignoring text values
    pub fn metadata_number(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(MetadataValue::as_f64)
    }

    /// Returns the `reason` metadata entry
    pub fn reason(&self) -> Option<&str> {
        self.metadata.get(REASON_KEY).and_then(MetadataValue::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_type_display() {
        assert_eq!(ConflictType::Path.to_string(), "Path");
        assert_eq!(ConflictType::Content.to_string(), "Content");
        assert_eq!(ConflictType::Version.to_string(), "Version");
        assert_eq!(ConflictType::Permission.to_string(), "Permission");
        assert_eq!(ConflictType::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_conflict_type_only_unknown_outside_defined_set() {
        for t in ConflictType::ALL {
            assert_ne!(t.to_string(), "Unknown");
        }
    }

    #[test]
    fn test_conflict_type_unknown_on_decode() {
        let t: ConflictType = serde_json::from_str("\"Locking\"").unwrap();
        assert_eq!(t, ConflictType::Unknown);

        let t: ConflictType = serde_json::from_str("\"Version\"").unwrap();
        assert_eq!(t, ConflictType::Version);
    }

    #[test]
    fn test_conflict_type_from_str() {
        assert_eq!("path".parse::<ConflictType>().unwrap(), ConflictType::Path);
        assert_eq!(
            "PERMISSION".parse::<ConflictType>().unwrap(),
            ConflictType::Permission
        );
        assert!("unknown".parse::<ConflictType>().is_err());
    }

    #[test]
    fn test_conflict_builder() {
        let conflict = Conflict::new(ConflictType::Path, 1)
            .with_participants(["/a", "/b"])
            .with_reason("duplicate")
            .with_metadata("impact", 2.0);

        assert_eq!(conflict.conflict_type(), ConflictType::Path);
        assert_eq!(conflict.severity(), 1);
        assert_eq!(conflict.participants(), ["/a".to_string(), "/b".to_string()]);
        assert_eq!(conflict.reason(), Some("duplicate"));
        assert_eq!(conflict.metadata_number("impact"), Some(2.0));
        assert_eq!(conflict.metadata_number("reason"), None);
    }

    #[test]
    fn test_participants_keep_insertion_order() {
        let conflict = Conflict::new(ConflictType::Content, 2)
            .with_participant("z")
            .with_participant("a");
        assert_eq!(conflict.participants(), ["z".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_conflict_serialization() {
        let conflict = Conflict::new(ConflictType::Version, 3)
            .with_participant("modB")
            .with_reason("incompatible version")
            .with_metadata("urgency", 0.5);

        let json = serde_json::to_value(&conflict).unwrap();
        assert_eq!(json["type"], "Version");
        assert_eq!(json["metadata"]["reason"], "incompatible version");
        assert_eq!(json["metadata"]["urgency"], 0.5);

        let back: Conflict = serde_json::from_value(json).unwrap();
        assert_eq!(back, conflict);
    }
}
