//! History rollback
//!
//! Rolling back flips a resolved record to unresolved and marks its stored
//! resolution as rolled back. Records are never removed.

use std::sync::Arc;

use rift_core::domain::{ConflictId, ConflictRecord};
use rift_telemetry::PerfMetrics;
use tracing::{debug, info};

use crate::{error::ConflictError, history::ConflictHistory};

/// Reverts resolutions recorded in a [`ConflictHistory`]
pub struct RollbackManager<'a> {
    history: &'a mut ConflictHistory,
    metrics: Option<Arc<PerfMetrics>>,
}

impl<'a> RollbackManager<'a> {
    pub fn new(history: &'a mut ConflictHistory) -> Self {
        Self {
            history,
            metrics: None,
        }
    }

    /// Counts successful rollbacks in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<PerfMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Reverts the most recent record
    ///
    /// Returns the reverted conflict's id, or `None` when the history is
    /// empty or its last record is already unresolved.
    pub fn rollback_last(&mut self) -> Result<Option<ConflictId>, ConflictError> {
        let Some(record) = self.history.last_mut() else {
            debug!("Rollback requested on empty history");
            return Ok(None);
        };

        Ok(revert(record, self.metrics.as_deref()))
    }

    /// Reverts the most recent record of conflict `id`
    ///
    /// Returns whether a record changed; a record that is already unresolved
    /// is left alone.
    ///
    /// # Errors
    /// [`ConflictError::NotFound`] if the history has no record for `id`
    pub fn rollback_by_id(&mut self, id: &ConflictId) -> Result<bool, ConflictError> {
        let record = self
            .history
            .find_mut(id)
            .ok_or_else(|| ConflictError::NotFound(id.to_string()))?;

        Ok(revert(record, self.metrics.as_deref()).is_some())
    }
}

fn revert(record: &mut ConflictRecord, metrics: Option<&PerfMetrics>) -> Option<ConflictId> {
    let id = *record.conflict().id();
    if !record.revert() {
        debug!(conflict_id = %id, "Record already unresolved, nothing to roll back");
        return None;
    }

    if let Some(metrics) = metrics {
        metrics.record_rollback();
    }
    info!(conflict_id = %id, "Resolution rolled back");
    Some(id)
}
