//! Per-resource detectors: content and permission

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use rift_core::domain::{Conflict, ConflictType};
use tracing::{debug, warn};

use super::{unsupported, ConflictDetector, DetectionScope};
use crate::error::ConflictError;

pub const CONCURRENT_MODIFICATION: &str = "simulated concurrent modification";
pub const UNREADABLE_FILE: &str = "unreadable file";

/// Rule deciding whether a resource's size signals concurrent modification
///
/// There is no real change tracking behind this yet; `EvenLength` is a
/// deterministic stand-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentHeuristic {
    /// Flags every resource whose byte length is even (zero included)
    #[default]
    EvenLength,
}

impl ContentHeuristic {
    fn is_conflicting(self, len: u64) -> bool {
        match self {
            ContentHeuristic::EvenLength => len % 2 == 0,
        }
    }
}

/// Flags resources whose content looks concurrently modified
#[derive(Debug, Clone, Default)]
pub struct ContentDetector {
    heuristic: ContentHeuristic,
}

impl ContentDetector {
    pub fn new(heuristic: ContentHeuristic) -> Self {
        Self { heuristic }
    }

    /// Checks each resource in order; resources that cannot be stat'd are
    /// skipped
    pub fn scan(&self, resources: &[PathBuf]) -> Vec<Conflict> {
        resources
            .iter()
            .filter_map(|path| {
                let len = match fs::metadata(path) {
                    Ok(m) => m.len(),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping resource that cannot be stat'd");
                        return None;
                    }
                };

                if !self.heuristic.is_conflicting(len) {
                    return None;
                }

                debug!(path = %path.display(), len, "Content conflict");
                Some(
                    Conflict::new(ConflictType::Content, 2)
                        .with_participant(path.display().to_string())
                        .with_reason(CONCURRENT_MODIFICATION),
                )
            })
            .collect()
    }
}

impl ConflictDetector for ContentDetector {
    fn name(&self) -> &'static str {
        "content"
    }

    fn detect(&self, scope: &DetectionScope) -> Result<Vec<Conflict>, ConflictError> {
        match scope {
            DetectionScope::Resources(resources) => Ok(self.scan(resources)),
            other => Err(unsupported(self.name(), other)),
        }
    }

    fn accepts(&self, scope: &DetectionScope) -> bool {
        matches!(scope, DetectionScope::Resources(_))
    }
}

/// Flags resources that cannot be opened for reading
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionDetector;

impl PermissionDetector {
    /// Tries to open each resource; never fails
    pub fn scan(&self, resources: &[PathBuf]) -> Vec<Conflict> {
        resources
            .iter()
            .filter_map(|path| match File::open(path) {
                Ok(_) => None,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Resource not readable");
                    Some(unreadable(path))
                }
            })
            .collect()
    }
}

fn unreadable(path: &Path) -> Conflict {
    Conflict::new(ConflictType::Permission, 2)
        .with_participant(path.display().to_string())
        .with_reason(UNREADABLE_FILE)
}

impl ConflictDetector for PermissionDetector {
    fn name(&self) -> &'static str {
        "permission"
    }

    fn detect(&self, scope: &DetectionScope) -> Result<Vec<Conflict>, ConflictError> {
        match scope {
            DetectionScope::Resources(resources) => Ok(self.scan(resources)),
            other => Err(unsupported(self.name(), other)),
        }
    }

    fn accepts(&self, scope: &DetectionScope) -> bool {
        matches!(scope, DetectionScope::Resources(_))
    }
}
