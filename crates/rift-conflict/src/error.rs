//! Error types for the conflict engine

use rift_core::domain::DomainError;
use thiserror::Error;

/// Errors that can occur during conflict detection and resolution
#[derive(Debug, Error)]
pub enum ConflictError {
    /// Traversal of a directory tree failed; the whole scan is aborted
    #[error("scan failed: {0}")]
    Scan(String),

    /// A detector was handed a scope it cannot interpret
    #[error("detector '{detector}' does not accept a {scope} scope")]
    UnsupportedScope {
        detector: &'static str,
        scope: &'static str,
    },

    /// A resolution did not carry the label its strategy expects
    #[error("validation failed: {0}")]
    Validation(String),

    /// A single strategy could not resolve a conflict
    #[error("strategy '{strategy}' failed: {reason}")]
    StrategyFailed { strategy: String, reason: String },

    /// Every member of a chain failed; one entry per member, in chain order
    #[error("all strategies failed: [{}]", .0.join("; "))]
    AllStrategiesFailed(Vec<String>),

    /// A strategy name that is not registered
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    /// No history record for the given conflict
    #[error("conflict not found: {0}")]
    NotFound(String),

    /// A history snapshot could not be interpreted
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Domain invariant violated while building an entity
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Committing to the versioning repository failed
    #[error("versioning error: {0}")]
    Versioning(#[from] git2::Error),
}
