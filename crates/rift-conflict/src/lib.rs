//! Rift Conflict - Conflict detection and resolution
//!
//! Provides:
//! - Path, content, version and permission detectors
//! - Multi-criteria scoring and a max-priority queue
//! - Pluggable resolution strategies composed into chains
//! - Persistent history with rollback and optional git versioning
//! - [`ConflictEngine`], which ties the above into one detect/resolve run

pub mod detector;
pub mod engine;
pub mod error;
pub mod history;
pub mod queue;
pub mod rollback;
pub mod scorer;
pub mod strategy;
pub mod versioning;

pub use detector::{ConflictDetector, DetectionScope, Detector};
pub use engine::{ConflictEngine, RunSummary};
pub use error::ConflictError;
pub use history::ConflictHistory;
pub use queue::{ConflictWithScore, PriorityQueue};
pub use rollback::RollbackManager;
pub use scorer::{ConflictScorer, MultiCriteriaScorer, ScoreHistory, ScoringMetrics};
pub use strategy::{ResolutionStrategy, RollbackReport, StrategyChain, StrategyRegistry};
pub use versioning::GitVersioning;
