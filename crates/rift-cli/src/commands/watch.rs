//! Watch command - Report removals in real time
//!
//! Provides the `rift watch` CLI command which:
//! 1. Watches a directory tree recursively for removals
//! 2. Prints each resulting path conflict as it arrives
//! 3. Feeds conflicts into the conflict monitor, which raises threshold alerts
//! 4. Optionally serves status and metrics while watching

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use rift_core::config::Config;
use rift_telemetry::{AlertingSystem, ConflictMonitor, PerfMetrics, StatusServer};
use rift_watch::RealTimeMonitor;
use tracing::{error, info};

use crate::output::{conflict_row, get_formatter, to_json, OutputFormat};
use crate::signal;

#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Directory to watch recursively
    pub path: PathBuf,

    /// Also serve /status and /metrics on the configured monitor address
    #[arg(long)]
    pub serve: bool,
}

impl WatchCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let metrics = Arc::new(PerfMetrics::new().context("Failed to create metrics")?);
        let (alerting, mut alerts) =
            AlertingSystem::new(config.alerting.threshold, Arc::clone(&metrics));
        let (mut conflict_monitor, monitor_tx) = ConflictMonitor::new(
            Duration::from_secs(config.alerting.window_secs),
            Arc::new(alerting),
            Arc::clone(&metrics),
        );

        let (mut watcher, mut events, mut errors) =
            RealTimeMonitor::new().context("Failed to create file watcher")?;
        watcher
            .watch(&self.path)
            .with_context(|| format!("Failed to watch {}", self.path.display()))?;
        conflict_monitor.start();

        let shutdown = signal::install();

        let server = if self.serve {
            let server = StatusServer::new(Arc::clone(&metrics), &config.monitor.addr)
                .with_context(|| format!("Invalid monitor address {}", config.monitor.addr))?;
            let token = shutdown.clone();
            Some(tokio::spawn(async move { server.run(token).await }))
        } else {
            None
        };

        info!(path = %self.path.display(), "Watching for removals");
        if !format.is_json() {
            formatter.success(&format!(
                "Watching {} (Ctrl+C to stop)",
                self.path.display()
            ));
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,

                Some(conflict) = events.recv() => {
                    if format.is_json() {
                        formatter.print_json(&to_json(&conflict));
                    } else {
                        formatter.info(&conflict_row(&conflict));
                    }
                    // Keep draining alerts while the monitor channel is full,
                    // the monitor may itself be waiting on the alert channel.
                    let forward = monitor_tx.send(conflict);
                    tokio::pin!(forward);
                    let forwarded = loop {
                        tokio::select! {
                            biased;
                            _ = shutdown.cancelled() => break true,
                            sent = &mut forward => break sent.is_ok(),
                            Some(alert) = alerts.recv() => formatter.warn(&alert),
                        }
                    };
                    if !forwarded {
                        error!("Conflict monitor stopped unexpectedly");
                        break;
                    }
                }

                Some(alert) = alerts.recv() => {
                    formatter.warn(&alert);
                }

                Some(err) = errors.recv() => {
                    formatter.error(&format!("Watcher error: {err}"));
                }

                else => break,
            }
        }

        shutdown.cancel();
        watcher.close().await;
        drop(monitor_tx);
        let observed = conflict_monitor.conflicts_observed();
        conflict_monitor.stop().await;

        if let Some(server) = server {
            match server.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => formatter.error(&format!("Status server failed: {e}")),
                Err(e) => formatter.error(&format!("Status server task failed: {e}")),
            }
        }

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "observed": observed,
                "alerts": metrics.alerts_total.get(),
            }));
        } else {
            formatter.success(&format!("Stopped; {observed} removal(s) observed"));
        }

        Ok(())
    }
}
