//! Prometheus metrics for the conflict engine
//!
//! [`PerfMetrics`] owns its own registry, so each engine instance carries an
//! independent set of counters. Components receive it as an `Arc` at
//! construction time.

use std::collections::BTreeMap;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Exported name of the detected-conflicts counter
pub const CONFLICTS_DETECTED: &str = "conflicts_detected";
/// Exported name of the cumulative detection time counter
pub const DETECTION_DURATION_MS: &str = "detection_duration_ms";

/// Engine counters.
pub struct PerfMetrics {
    registry: Registry,
    /// Counter: conflicts produced by detectors and monitors
    pub conflicts_detected: IntCounter,
    /// Counter: cumulative wall time spent in detection, in milliseconds
    pub detection_duration_ms: IntCounter,
    /// Counter: successful resolutions by strategy
    pub resolutions_total: IntCounterVec,
    /// Counter: history records rolled back
    pub rollbacks_total: IntCounter,
    /// Counter: threshold alerts emitted
    pub alerts_total: IntCounter,
}

impl PerfMetrics {
    /// Creates a new `PerfMetrics` with all counters registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new_custom(Some("rift".to_string()), None)?;

        let conflicts_detected = IntCounter::with_opts(Opts::new(
            CONFLICTS_DETECTED,
            "Total conflicts detected",
        ))?;
        registry.register(Box::new(conflicts_detected.clone()))?;

        let detection_duration_ms = IntCounter::with_opts(Opts::new(
            DETECTION_DURATION_MS,
            "Cumulative detection duration in milliseconds",
        ))?;
        registry.register(Box::new(detection_duration_ms.clone()))?;

        let resolutions_total = IntCounterVec::new(
            Opts::new("resolutions_total", "Successful resolutions by strategy"),
            &["strategy"],
        )?;
        registry.register(Box::new(resolutions_total.clone()))?;

        let rollbacks_total = IntCounter::with_opts(Opts::new(
            "rollbacks_total",
            "History records rolled back",
        ))?;
        registry.register(Box::new(rollbacks_total.clone()))?;

        let alerts_total = IntCounter::with_opts(Opts::new(
            "alerts_total",
            "Threshold alerts emitted",
        ))?;
        registry.register(Box::new(alerts_total.clone()))?;

        Ok(Self {
            registry,
            conflicts_detected,
            detection_duration_ms,
            resolutions_total,
            rollbacks_total,
            alerts_total,
        })
    }

    // ========================================================================
    // Recording helpers
    // ========================================================================

    /// Add `count` detected conflicts.
    pub fn inc_conflicts_detected(&self, count: u64) {
        self.conflicts_detected.inc_by(count);
    }

    /// Add `ms` milliseconds of detection time.
    pub fn inc_detection_duration(&self, ms: u64) {
        self.detection_duration_ms.inc_by(ms);
    }

    /// Record a successful resolution by `strategy`.
    pub fn record_resolution(&self, strategy: &str) {
        self.resolutions_total.with_label_values(&[strategy]).inc();
    }

    /// Record one rolled-back history record.
    pub fn record_rollback(&self) {
        self.rollbacks_total.inc();
    }

    /// Record one emitted alert.
    pub fn record_alert(&self) {
        self.alerts_total.inc();
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Plain-integer view of the unlabeled counters, keyed by exported name.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        let mut vars = BTreeMap::new();
        vars.insert(CONFLICTS_DETECTED.to_string(), self.conflicts_detected.get());
        vars.insert(
            DETECTION_DURATION_MS.to_string(),
            self.detection_duration_ms.get(),
        );
        vars.insert("rollbacks_total".to_string(), self.rollbacks_total.get());
        vars.insert("alerts_total".to_string(), self.alerts_total.get());
        vars
    }

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
