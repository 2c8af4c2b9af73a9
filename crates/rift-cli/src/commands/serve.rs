//! Serve command - Expose status and metrics over HTTP
//!
//! Provides the `rift serve` CLI command, which publishes the persisted
//! history's counts on `GET /status` and `GET /metrics` until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use rift_core::config::Config;
use rift_telemetry::{PerfMetrics, StatusServer};
use tracing::info;

use super::load_history;
use crate::output::{get_formatter, OutputFormat};
use crate::signal;

#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to bind instead of `monitor.addr`
    #[arg(long)]
    pub addr: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let addr = self.addr.as_deref().unwrap_or(&config.monitor.addr);

        let metrics = Arc::new(PerfMetrics::new().context("Failed to create metrics")?);
        let history = load_history(&config.history.path)?;
        metrics.inc_conflicts_detected(history.len() as u64);
        for record in history.filter(true) {
            if let Some(resolution) = record.resolution() {
                metrics.record_resolution(resolution.strategy());
            }
        }

        let server = StatusServer::new(Arc::clone(&metrics), addr)
            .with_context(|| format!("Invalid listen address {addr}"))?;

        info!(addr, records = history.len(), "Starting status server");
        if format.is_json() {
            formatter.print_json(&serde_json::json!({ "listening": addr }));
        } else {
            formatter.success(&format!("Serving status on http://{addr} (Ctrl+C to stop)"));
        }

        let shutdown = signal::install();
        server.run(shutdown).await?;

        if !format.is_json() {
            formatter.success("Status server stopped");
        }
        Ok(())
    }
}
