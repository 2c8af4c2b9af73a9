//! Threshold alerting
//!
//! [`AlertingSystem::check`] enqueues [`THRESHOLD_EXCEEDED`] whenever the
//! observed value is strictly above the configured threshold. The alert
//! channel holds ten messages; a full channel makes `check` wait until the
//! consumer drains it.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock,
};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::metrics::PerfMetrics;

/// The message every alert carries
pub const THRESHOLD_EXCEEDED: &str = "Threshold exceeded";

/// Capacity of the alert channel
pub const ALERT_CHANNEL_CAPACITY: usize = 10;

/// Emits alerts when a value crosses a threshold.
pub struct AlertingSystem {
    threshold: RwLock<f64>,
    alerts_tx: mpsc::Sender<String>,
    sent: AtomicU64,
    metrics: Arc<PerfMetrics>,
}

impl AlertingSystem {
    /// Creates an alerting system and the receiver its alerts arrive on.
    pub fn new(threshold: f64, metrics: Arc<PerfMetrics>) -> (Self, mpsc::Receiver<String>) {
        let (alerts_tx, alerts_rx) = mpsc::channel(ALERT_CHANNEL_CAPACITY);
        let system = Self {
            threshold: RwLock::new(threshold),
            alerts_tx,
            sent: AtomicU64::new(0),
            metrics,
        };
        (system, alerts_rx)
    }

    /// Current threshold.
    pub fn threshold(&self) -> f64 {
        *self
            .threshold
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the threshold for subsequent checks.
    pub fn set_threshold(&self, threshold: f64) {
        *self
            .threshold
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = threshold;
    }

    /// Enqueues one alert if `value` is above the threshold.
    ///
    /// Returns whether an alert was enqueued. Waits while the alert channel
    /// is full.
    pub async fn check(&self, value: f64) -> bool {
        let threshold = self.threshold();
        if value <= threshold {
            return false;
        }

        debug!(value, threshold, "Threshold exceeded");
        if self
            .alerts_tx
            .send(THRESHOLD_EXCEEDED.to_string())
            .await
            .is_err()
        {
            warn!("Alert receiver dropped, alert discarded");
            return false;
        }

        self.sent.fetch_add(1, Ordering::Relaxed);
        self.metrics.record_alert();
        true
    }

    /// Number of alerts enqueued so far.
    pub fn alerts_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(threshold: f64) -> (AlertingSystem, mpsc::Receiver<String>) {
        AlertingSystem::new(threshold, Arc::new(PerfMetrics::new().unwrap()))
    }

    #[tokio::test]
    async fn test_value_at_or_below_threshold_enqueues_nothing() {
        let (alerting, mut rx) = system(5.0);

        assert!(!alerting.check(5.0).await);
        assert!(!alerting.check(1.0).await);

        assert!(rx.try_recv().is_err());
        assert_eq!(alerting.alerts_sent(), 0);
    }

    #[tokio::test]
    async fn test_value_above_threshold_enqueues_one_message() {
        let (alerting, mut rx) = system(5.0);

        assert!(alerting.check(5.5).await);

        assert_eq!(rx.try_recv().unwrap(), THRESHOLD_EXCEEDED);
        assert!(rx.try_recv().is_err());
        assert_eq!(alerting.alerts_sent(), 1);
    }

    #[tokio::test]
    async fn test_alerts_recorded_in_metrics() {
        let metrics = Arc::new(PerfMetrics::new().unwrap());
        let (alerting, _rx) = AlertingSystem::new(0.0, Arc::clone(&metrics));

        alerting.check(1.0).await;
        alerting.check(2.0).await;

        assert_eq!(metrics.snapshot()["alerts_total"], 2);
    }

    #[tokio::test]
    async fn test_set_threshold() {
        let (alerting, mut rx) = system(100.0);
        assert!(!alerting.check(50.0).await);

        alerting.set_threshold(10.0);
        assert_eq!(alerting.threshold(), 10.0);
        assert!(alerting.check(50.0).await);
        assert_eq!(rx.recv().await.as_deref(), Some(THRESHOLD_EXCEEDED));
    }

    #[tokio::test]
    async fn test_full_channel_blocks_until_drained() {
        let (alerting, mut rx) = system(0.0);
        let alerting = Arc::new(alerting);

        for _ in 0..ALERT_CHANNEL_CAPACITY {
            assert!(alerting.check(1.0).await);
        }

        let blocked = {
            let alerting = Arc::clone(&alerting);
            tokio::spawn(async move { alerting.check(1.0).await })
        };
        tokio::task::yield_now().await;
        assert!(!blocked.is_finished());

        rx.recv().await.unwrap();
        assert!(blocked.await.unwrap());
        assert_eq!(alerting.alerts_sent(), ALERT_CHANNEL_CAPACITY as u64 + 1);
    }
}
