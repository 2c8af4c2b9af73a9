//! Detect/resolve workflow
//!
//! [`ConflictEngine`] runs the configured detectors over a set of scopes,
//! scores the resulting conflicts into a [`PriorityQueue`], and resolves them
//! highest score first through a [`StrategyChain`]. Every outcome lands in
//! the shared [`ConflictHistory`].
//!
//! ```text
//! scopes ──→ detectors (spawn_blocking) ──→ scorer ──→ PriorityQueue
//!                                                          │
//!                     ConflictHistory ←── validate ←── StrategyChain
//! ```

use std::sync::Arc;
use std::time::Instant;

use rift_core::config::Config;
use rift_core::domain::{Conflict, ConflictRecord};
use rift_telemetry::PerfMetrics;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    detector::{ConflictDetector, DetectionScope, Detector},
    error::ConflictError,
    history::ConflictHistory,
    queue::PriorityQueue,
    scorer::{ConflictScorer, MultiCriteriaScorer, ScoreHistory},
    strategy::{ResolutionStrategy, StrategyChain, StrategyRegistry},
};

/// Outcome counts of one resolve pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub detected: usize,
    pub resolved: usize,
    pub failed: usize,
    /// Scores in the order conflicts were resolved
    pub scores: ScoreHistory,
}

/// Orchestrates detection, prioritisation and resolution
pub struct ConflictEngine {
    detectors: Vec<Detector>,
    scorer: Arc<dyn ConflictScorer>,
    chain: StrategyChain,
    history: Arc<Mutex<ConflictHistory>>,
    metrics: Arc<PerfMetrics>,
}

impl ConflictEngine {
    pub fn new(
        detectors: Vec<Detector>,
        scorer: Arc<dyn ConflictScorer>,
        chain: StrategyChain,
        metrics: Arc<PerfMetrics>,
    ) -> Self {
        Self {
            detectors,
            scorer,
            chain,
            history: Arc::new(Mutex::new(ConflictHistory::new())),
            metrics,
        }
    }

    /// Builds an engine with all four detectors, the multi-criteria scorer
    /// and the configured strategy chain
    ///
    /// # Errors
    /// [`ConflictError::UnknownStrategy`] if the configuration names a
    /// strategy `registry` does not hold
    pub fn from_config(
        config: &Config,
        registry: &StrategyRegistry,
        metrics: Arc<PerfMetrics>,
    ) -> Result<Self, ConflictError> {
        let chain = registry.chain(&config.resolution.strategies)?;
        info!(strategies = ?chain.names(), "Conflict engine configured");

        Ok(Self::new(
            Detector::all(&config.detection),
            Arc::new(MultiCriteriaScorer::new(config.scoring)),
            chain,
            metrics,
        ))
    }

    /// Starts from an existing history instead of an empty one
    pub fn with_history(mut self, history: ConflictHistory) -> Self {
        self.history = Arc::new(Mutex::new(history));
        self
    }

    /// Shared handle to the history this engine appends to
    pub fn history(&self) -> Arc<Mutex<ConflictHistory>> {
        Arc::clone(&self.history)
    }

    pub fn metrics(&self) -> &Arc<PerfMetrics> {
        &self.metrics
    }

    /// Runs every detector that accepts each scope
    ///
    /// Detectors run concurrently on the blocking pool; results are
    /// concatenated in scope order, then detector order.
    ///
    /// # Errors
    /// The first detector error, in that same order, aborts detection once
    /// every spawned detector has finished. Nothing is counted.
    pub async fn detect(&self, scopes: &[DetectionScope]) -> Result<Vec<Conflict>, ConflictError> {
        let started = Instant::now();

        let mut tasks = Vec::new();
        for scope in scopes {
            for detector in self.detectors.iter().filter(|d| d.accepts(scope)) {
                let detector = detector.clone();
                let scope = scope.clone();
                debug!(detector = detector.name(), scope = scope.kind(), "Spawning detector");
                tasks.push(tokio::task::spawn_blocking(move || detector.detect(&scope)));
            }
        }

        // Every task is joined before returning, so no detector outlives
        // the call even when an earlier one failed.
        let mut conflicts = Vec::new();
        let mut first_error = None;
        for task in tasks {
            let outcome = task
                .await
                .map_err(|e| ConflictError::Scan(format!("detector task failed: {e}")))
                .and_then(|found| found);
            match outcome {
                Ok(found) if first_error.is_none() => conflicts.extend(found),
                Ok(_) => {}
                Err(e) if first_error.is_none() => {
                    warn!(error = %e, "Detection aborted");
                    first_error = Some(e);
                }
                Err(e) => debug!(error = %e, "Further detector error after abort"),
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.metrics.inc_conflicts_detected(conflicts.len() as u64);
        self.metrics.inc_detection_duration(elapsed_ms);

        info!(
            scopes = scopes.len(),
            conflicts = conflicts.len(),
            elapsed_ms,
            "Detection complete"
        );
        Ok(conflicts)
    }

    /// Resolves `conflicts` highest score first and records every outcome
    ///
    /// A conflict the chain cannot resolve, or whose resolution fails
    /// validation, is recorded as unresolved. Nothing is rolled back
    /// automatically.
    pub async fn resolve(&self, conflicts: Vec<Conflict>) -> RunSummary {
        let mut summary = RunSummary {
            detected: conflicts.len(),
            ..Default::default()
        };

        let mut queue = PriorityQueue::new();
        for conflict in conflicts {
            let score = self.scorer.calculate(&conflict);
            queue.push(conflict, score);
        }

        let mut history = self.history.lock().await;
        while let Some(item) = queue.pop() {
            summary.scores.record(item.score);
            let conflict = item.conflict;

            let outcome = self
                .chain
                .execute(&conflict)
                .and_then(|resolution| {
                    self.chain.validate(&resolution)?;
                    Ok(resolution)
                });

            match outcome {
                Ok(resolution) => {
                    self.metrics.record_resolution(resolution.strategy());
                    history.add(ConflictRecord::resolved_by(conflict, resolution));
                    summary.resolved += 1;
                }
                Err(e) => {
                    warn!(
                        conflict_id = %conflict.id(),
                        conflict_type = %conflict.conflict_type(),
                        score = item.score,
                        error = %e,
                        "Conflict left unresolved"
                    );
                    history.add(ConflictRecord::unresolved(conflict, e.to_string()));
                    summary.failed += 1;
                }
            }
        }

        info!(
            detected = summary.detected,
            resolved = summary.resolved,
            failed = summary.failed,
            "Resolution pass complete"
        );
        summary
    }

    /// [`detect`](Self::detect) followed by [`resolve`](Self::resolve)
    pub async fn run(&self, scopes: &[DetectionScope]) -> Result<RunSummary, ConflictError> {
        let conflicts = self.detect(scopes).await?;
        Ok(self.resolve(conflicts).await)
    }
}
