//! Conflict monitor
//!
//! [`ConflictMonitor`] owns the receiving end of a bounded conflict channel
//! and one background task. The task counts every conflict it receives and
//! asks the [`AlertingSystem`] whether the number seen in the current window
//! crossed the threshold. A ticker closes each window.
//!
//! ```text
//! producers ──→ Sender<Conflict> ──→ ConflictMonitor task ──→ AlertingSystem
//!                                         │
//!                                     ticker (window reset)
//! ```

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use rift_core::domain::Conflict;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{alerting::AlertingSystem, metrics::PerfMetrics};

/// Capacity of the monitored conflict channel
pub const CONFLICT_CHANNEL_CAPACITY: usize = 10;

/// Counts conflicts and raises window-based alerts
pub struct ConflictMonitor {
    conflicts_rx: Option<mpsc::Receiver<Conflict>>,
    window: Duration,
    alerting: Arc<AlertingSystem>,
    metrics: Arc<PerfMetrics>,
    observed: Arc<AtomicU64>,
    stop: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConflictMonitor {
    /// Creates a monitor and the sender producers push conflicts into
    ///
    /// # Arguments
    /// * `window` - Length of one counting window
    /// * `alerting` - Alert sink checked with the per-window count
    /// * `metrics` - Counters updated for every conflict received
    pub fn new(
        window: Duration,
        alerting: Arc<AlertingSystem>,
        metrics: Arc<PerfMetrics>,
    ) -> (Self, mpsc::Sender<Conflict>) {
        let (conflicts_tx, conflicts_rx) = mpsc::channel(CONFLICT_CHANNEL_CAPACITY);
        let monitor = Self {
            conflicts_rx: Some(conflicts_rx),
            window,
            alerting,
            metrics,
            observed: Arc::new(AtomicU64::new(0)),
            stop: CancellationToken::new(),
            task: None,
        };
        (monitor, conflicts_tx)
    }

    /// Spawns the background loop
    ///
    /// Calling `start` on a monitor that is already running does nothing.
    pub fn start(&mut self) {
        let Some(mut conflicts_rx) = self.conflicts_rx.take() else {
            debug!("Conflict monitor already started");
            return;
        };

        let window = self.window;
        let alerting = Arc::clone(&self.alerting);
        let metrics = Arc::clone(&self.metrics);
        let observed = Arc::clone(&self.observed);
        let stop = self.stop.clone();

        info!(window_secs = window.as_secs_f64(), "Conflict monitor starting");

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(window);
            // The first tick completes immediately.
            ticker.tick().await;

            let mut in_window: u64 = 0;
            let mut alerted = false;
            let mut channel_open = true;

            loop {
                tokio::select! {
                    biased;

                    _ = stop.cancelled() => break,

                    received = conflicts_rx.recv(), if channel_open => {
                        let Some(conflict) = received else {
                            debug!("All conflict senders dropped");
                            channel_open = false;
                            continue;
                        };

                        observed.fetch_add(1, Ordering::Relaxed);
                        metrics.inc_conflicts_detected(1);
                        in_window += 1;
                        debug!(
                            conflict_id = %conflict.id(),
                            conflict_type = %conflict.conflict_type(),
                            in_window,
                            "Conflict observed"
                        );

                        // A full alert channel must not hold off shutdown.
                        if !alerted {
                            tokio::select! {
                                biased;
                                _ = stop.cancelled() => break,
                                sent = alerting.check(in_window as f64) => alerted = sent,
                            }
                        }
                    }

                    _ = ticker.tick() => {
                        if in_window > 0 {
                            debug!(in_window, "Conflict window closed");
                        }
                        in_window = 0;
                        alerted = false;
                    }
                }
            }

            info!("Conflict monitor stopped");
        }));
    }

    /// Signals the loop to exit and waits until it has
    pub async fn stop(mut self) {
        self.stop.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Conflict monitor task failed");
            }
        }
    }

    /// Total conflicts received since creation
    pub fn conflicts_observed(&self) -> u64 {
        self.observed.load(Ordering::Relaxed)
    }

    /// Shared handle to the observed counter, for read-only status views
    pub fn observed_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.observed)
    }

    /// Whether the background loop is running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rift_core::domain::ConflictType;

    fn setup(
        threshold: f64,
        window: Duration,
    ) -> (
        ConflictMonitor,
        mpsc::Sender<Conflict>,
        mpsc::Receiver<String>,
        Arc<PerfMetrics>,
    ) {
        let metrics = Arc::new(PerfMetrics::new().unwrap());
        let (alerting, alerts_rx) = AlertingSystem::new(threshold, Arc::clone(&metrics));
        let (monitor, tx) = ConflictMonitor::new(window, Arc::new(alerting), Arc::clone(&metrics));
        (monitor, tx, alerts_rx, metrics)
    }

    fn conflict() -> Conflict {
        Conflict::new(ConflictType::Path, 1).with_participant("/tmp/x")
    }

    async fn wait_for_count(monitor: &ConflictMonitor, expected: u64) {
        for _ in 0..200 {
            if monitor.conflicts_observed() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("monitor never observed {expected} conflicts");
    }

    #[tokio::test]
    async fn test_start_stop() {
        let (mut monitor, _tx, _alerts, _metrics) = setup(10.0, Duration::from_secs(60));
        assert!(!monitor.is_running());

        monitor.start();
        assert!(monitor.is_running());

        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_counts_conflicts() {
        let (mut monitor, tx, _alerts, metrics) = setup(10.0, Duration::from_secs(60));
        monitor.start();

        for _ in 0..3 {
            tx.send(conflict()).await.unwrap();
        }
        wait_for_count(&monitor, 3).await;

        assert_eq!(metrics.snapshot()["conflicts_detected"], 3);
        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_alerts_once_per_window() {
        let (mut monitor, tx, mut alerts, _metrics) = setup(2.0, Duration::from_secs(60));
        monitor.start();

        for _ in 0..5 {
            tx.send(conflict()).await.unwrap();
        }
        wait_for_count(&monitor, 5).await;

        assert_eq!(alerts.recv().await.as_deref(), Some("Threshold exceeded"));
        assert!(alerts.try_recv().is_err());
        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_keeps_running_after_senders_dropped() {
        let (mut monitor, tx, _alerts, _metrics) = setup(10.0, Duration::from_secs(60));
        monitor.start();
        tx.send(conflict()).await.unwrap();
        drop(tx);

        wait_for_count(&monitor, 1).await;
        assert!(monitor.is_running());
        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let (mut monitor, _tx, _alerts, _metrics) = setup(10.0, Duration::from_secs(60));
        monitor.start();
        monitor.start();
        assert!(monitor.is_running());
        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_stop_with_undrained_alerts() {
        let (mut monitor, tx, _alerts, metrics) = setup(0.0, Duration::from_millis(5));
        monitor.start();

        // One conflict per window until the alert channel is full, then one
        // more so the loop is parked on the next alert.
        for _ in 0..200 {
            if metrics.alerts_total.get() >= 10 {
                break;
            }
            let _ = tx.try_send(conflict());
            tokio::time::sleep(Duration::from_millis(15)).await;
        }
        assert_eq!(metrics.alerts_total.get(), 10);
        let _ = tx.try_send(conflict());
        tokio::time::sleep(Duration::from_millis(15)).await;

        tokio::time::timeout(Duration::from_secs(2), monitor.stop())
            .await
            .expect("stop must return while alerts are undrained");
    }
}
