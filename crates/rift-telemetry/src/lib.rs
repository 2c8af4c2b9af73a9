//! Rift Telemetry - Counters, alerts and the read-only status surface
//!
//! Provides:
//! - `PerfMetrics`: Prometheus counters injected into engine components
//! - `AlertingSystem`: threshold alerts on a bounded channel
//! - `ConflictMonitor`: background loop counting conflicts per window
//! - `StatusServer`: HTTP `/status` and `/metrics` endpoints

pub mod alerting;
pub mod metrics;
pub mod monitor;
pub mod server;

pub use alerting::{AlertingSystem, THRESHOLD_EXCEEDED};
pub use metrics::PerfMetrics;
pub use monitor::ConflictMonitor;
pub use server::{StatusServer, StatusSnapshot};
