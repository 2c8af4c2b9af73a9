//! Resolution entities
//!
//! A [`Resolution`] is the outcome of applying one strategy to one conflict.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// The outcome of a strategy resolving a conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Strategy-specific terminal label, e.g. `merged`
    status: String,
    /// Name of the strategy that produced this resolution
    strategy: String,
    /// When the resolution was applied
    applied_at: DateTime<Utc>,
    /// Set once the history entry holding this resolution was rolled back
    rollback: bool,
}

impl Resolution {
    /// Creates a resolution stamped with the current time
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyStatus`] if `status` is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use rift_core::domain::resolution::Resolution;
    ///
    /// let resolution = Resolution::new("auto_merge", "merged").unwrap();
    /// assert_eq!(resolution.status(), "merged");
    /// assert!(!resolution.is_rolled_back());
    ///
    /// assert!(Resolution::new("auto_merge", "").is_err());
    /// ```
    pub fn new(strategy: impl Into<String>, status: impl Into<String>) -> Result<Self, DomainError> {
        let strategy = strategy.into();
        let status = status.into();
        if status.is_empty() {
            return Err(DomainError::EmptyStatus(strategy));
        }

        Ok(Self {
            status,
            strategy,
            applied_at: Utc::now(),
            rollback: false,
        })
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn applied_at(&self) -> DateTime<Utc> {
        self.applied_at
    }

    pub fn is_rolled_back(&self) -> bool {
        self.rollback
    }

    /// Returns a copy flagged as rolled back
    pub fn rolled_back(mut self) -> Self {
        self.rollback = true;
        self
    }
}
