//! Rift Watch - Real-time conflict monitoring
//!
//! Turns live file-system events into [`Conflict`](rift_core::domain::Conflict)
//! values on a bounded channel.
//!
//! ## Modules
//!
//! - [`watcher`] - `notify`-backed monitor with one background task

pub mod watcher;

pub use watcher::{RealTimeMonitor, WatchError};
