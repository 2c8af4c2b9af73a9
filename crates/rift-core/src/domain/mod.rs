//! Domain entities
//!
//! - Conflict identifiers
//! - Conflicts and their metadata
//! - Resolutions produced by strategies
//! - History records
//! - Domain-specific error types

pub mod conflict;
pub mod errors;
pub mod newtypes;
pub mod record;
pub mod resolution;

// Re-export commonly used types
pub use conflict::{Conflict, ConflictType, MetadataValue};
pub use errors::DomainError;
pub use newtypes::ConflictId;
pub use record::ConflictRecord;
pub use resolution::Resolution;
