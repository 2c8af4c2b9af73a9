//! Module version conflict detection

use std::collections::BTreeMap;

use rift_core::domain::{Conflict, ConflictType};
use tracing::debug;

use super::{unsupported, ConflictDetector, DetectionScope};
use crate::error::ConflictError;

/// Version string treated as incompatible when none is configured
pub const DEFAULT_BASELINE: &str = "0.0.0";
pub const INCOMPATIBLE_VERSION: &str = "incompatible version";

/// Flags modules pinned at the incompatible baseline version
#[derive(Debug, Clone)]
pub struct VersionDetector {
    baseline: String,
}

impl Default for VersionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE)
    }
}

impl VersionDetector {
    pub fn new(baseline: impl Into<String>) -> Self {
        Self {
            baseline: baseline.into(),
        }
    }

    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    /// Returns one conflict per module whose version equals the baseline,
    /// in module-name order
    pub fn scan(&self, modules: &BTreeMap<String, String>) -> Vec<Conflict> {
        modules
            .iter()
            .filter(|(_, version)| **version == self.baseline)
            .map(|(module, version)| {
                debug!(module = %module, version = %version, "Incompatible module version");
                Conflict::new(ConflictType::Version, 3)
                    .with_participant(module.as_str())
                    .with_reason(INCOMPATIBLE_VERSION)
            })
            .collect()
    }
}

impl ConflictDetector for VersionDetector {
    fn name(&self) -> &'static str {
        "version"
    }

    fn detect(&self, scope: &DetectionScope) -> Result<Vec<Conflict>, ConflictError> {
        match scope {
            DetectionScope::Modules(modules) => Ok(self.scan(modules)),
            other => Err(unsupported(self.name(), other)),
        }
    }

    fn accepts(&self, scope: &DetectionScope) -> bool {
        matches!(scope, DetectionScope::Modules(_))
    }
}
