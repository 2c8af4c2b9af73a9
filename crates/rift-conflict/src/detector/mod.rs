//! Conflict detectors
//!
//! Every detector is a stateless, read-only pass over one kind of input:
//!
//! | Detector                | Scope                    | Conflict type |
//! |-------------------------|--------------------------|---------------|
//! | [`PathDetector`]        | [`DetectionScope::Tree`]      | `Path`        |
//! | [`ContentDetector`]     | [`DetectionScope::Resources`] | `Content`     |
//! | [`VersionDetector`]     | [`DetectionScope::Modules`]   | `Version`     |
//! | [`PermissionDetector`]  | [`DetectionScope::Resources`] | `Permission`  |
//!
//! The set is closed; [`Detector`] dispatches over it.

mod path;
mod resource;
mod version;

use std::collections::BTreeMap;
use std::path::PathBuf;

use rift_core::config::DetectionConfig;
use rift_core::domain::Conflict;

use crate::error::ConflictError;

pub use path::PathDetector;
pub use resource::{ContentDetector, ContentHeuristic, PermissionDetector};
pub use version::{VersionDetector, DEFAULT_BASELINE};

/// The input a detector inspects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionScope {
    /// Root of a directory tree to walk
    Tree(PathBuf),
    /// Individual files to inspect
    Resources(Vec<PathBuf>),
    /// Module name to version string
    Modules(BTreeMap<String, String>),
}

impl DetectionScope {
    /// Short name used in logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            DetectionScope::Tree(_) => "tree",
            DetectionScope::Resources(_) => "resources",
            DetectionScope::Modules(_) => "modules",
        }
    }
}

/// A read-only pass that turns a scope into conflicts
pub trait ConflictDetector {
    /// Stable detector name
    fn name(&self) -> &'static str;

    /// Inspects `scope` and returns the conflicts found, in discovery order
    ///
    /// # Errors
    /// Returns [`ConflictError::UnsupportedScope`] for a scope of the wrong
    /// kind; the path detector also fails with [`ConflictError::Scan`] when
    /// the tree cannot be traversed.
    fn detect(&self, scope: &DetectionScope) -> Result<Vec<Conflict>, ConflictError>;

    /// Whether `scope` is the kind this detector reads
    fn accepts(&self, scope: &DetectionScope) -> bool;
}

/// One of the built-in detectors
#[derive(Debug, Clone)]
pub enum Detector {
    Path(PathDetector),
    Content(ContentDetector),
    Version(VersionDetector),
    Permission(PermissionDetector),
}

impl Detector {
    /// Builds all four detectors from configuration, in table order
    pub fn all(config: &DetectionConfig) -> Vec<Detector> {
        vec![
            Detector::Path(PathDetector::new(config.case_insensitive_paths)),
            Detector::Content(ContentDetector::default()),
            Detector::Version(VersionDetector::new(config.version_baseline.clone())),
            Detector::Permission(PermissionDetector),
        ]
    }

    fn inner(&self) -> &dyn ConflictDetector {
        match self {
            Detector::Path(d) => d,
            Detector::Content(d) => d,
            Detector::Version(d) => d,
            Detector::Permission(d) => d,
        }
    }
}

impl ConflictDetector for Detector {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn detect(&self, scope: &DetectionScope) -> Result<Vec<Conflict>, ConflictError> {
        self.inner().detect(scope)
    }

    fn accepts(&self, scope: &DetectionScope) -> bool {
        self.inner().accepts(scope)
    }
}

pub(crate) fn unsupported(detector: &'static str, scope: &DetectionScope) -> ConflictError {
    ConflictError::UnsupportedScope {
        detector,
        scope: scope.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_detectors_from_config() {
        let config = DetectionConfig::default();
        let names: Vec<_> = Detector::all(&config).iter().map(|d| d.name()).collect();
        assert_eq!(names, ["path", "content", "version", "permission"]);
    }

    #[test]
    fn test_wrong_scope_rejected() {
        let detector = Detector::Version(VersionDetector::default());
        let scope = DetectionScope::Tree(PathBuf::from("/"));

        assert!(!detector.accepts(&scope));
        assert!(matches!(
            detector.detect(&scope),
            Err(ConflictError::UnsupportedScope {
                detector: "version",
                scope: "tree"
            })
        ));
    }

    #[test]
    fn test_resource_scope_accepted_by_two_detectors() {
        let config = DetectionConfig::default();
        let scope = DetectionScope::Resources(vec![]);
        let accepting: Vec<_> = Detector::all(&config)
            .into_iter()
            .filter(|d| d.accepts(&scope))
            .map(|d| d.name())
            .collect();
        assert_eq!(accepting, ["content", "permission"]);
    }
}
