//! Conflict scoring
//!
//! [`MultiCriteriaScorer`] combines three numeric metadata entries of a
//! conflict into one priority score:
//!
//! ```text
//! score = impact_weight * impact + urgency_weight * urgency + complexity_weight * complexity
//! ```
//!
//! A missing (or non-numeric) entry counts as `1.0`.

use std::cmp::Ordering;
use std::sync::RwLock;

use rift_core::config::ScoringConfig;
use rift_core::domain::Conflict;
use tracing::debug;

pub const IMPACT_KEY: &str = "impact";
pub const URGENCY_KEY: &str = "urgency";
pub const COMPLEXITY_KEY: &str = "complexity";

const DEFAULT_CRITERION: f64 = 1.0;

/// Assigns a priority score to conflicts
pub trait ConflictScorer: Send + Sync {
    /// Higher means more urgent to resolve
    fn calculate(&self, conflict: &Conflict) -> f64;

    /// Orders two conflicts by score; equal scores compare `Equal`
    fn compare(&self, a: &Conflict, b: &Conflict) -> Ordering {
        let diff = self.calculate(a) - self.calculate(b);
        if diff > 0.0 {
            Ordering::Greater
        } else if diff < 0.0 {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }
}

/// Weighted sum of impact, urgency and complexity
///
/// Weights can be replaced at runtime with [`update_config`](Self::update_config);
/// scoring in flight sees either the old or the new set, never a mix.
pub struct MultiCriteriaScorer {
    config: RwLock<ScoringConfig>,
}

impl MultiCriteriaScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Current weights
    pub fn config(&self) -> ScoringConfig {
        *self
            .config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the weights used by subsequent scores
    pub fn update_config(&self, config: ScoringConfig) {
        debug!(?config, "Updating scoring weights");
        *self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
    }
}

impl Default for MultiCriteriaScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl ConflictScorer for MultiCriteriaScorer {
    fn calculate(&self, conflict: &Conflict) -> f64 {
        let weights = self.config();
        let criterion = |key: &str| conflict.metadata_number(key).unwrap_or(DEFAULT_CRITERION);

        weights.impact_weight * criterion(IMPACT_KEY)
            + weights.urgency_weight * criterion(URGENCY_KEY)
            + weights.complexity_weight * criterion(COMPLEXITY_KEY)
    }
}

/// Confusion-matrix counters for judging detector accuracy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringMetrics {
    pub true_positives: u64,
    pub false_positives: u64,
    pub true_negatives: u64,
    pub false_negatives: u64,
}

impl ScoringMetrics {
    /// Records one prediction against the ground truth
    pub fn record(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (false, true) => self.false_negatives += 1,
        }
    }

    /// TP / (TP + FP), or 0 when nothing was predicted positive
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN), or 0 when nothing was actually positive
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Every score produced during a run, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreHistory {
    scores: Vec<f64>,
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, score: f64) {
        self.scores.push(score);
    }

    /// Most recent score, or 0 when empty
    pub fn last(&self) -> f64 {
        self.scores.last().copied().unwrap_or(0.0)
    }

    /// Mean of all scores, or 0 when empty
    pub fn average(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().sum::<f64>() / self.scores.len() as f64
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
