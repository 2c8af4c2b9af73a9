//! Real-time conflict monitor
//!
//! [`RealTimeMonitor`] wraps the `notify` crate. The OS watcher's callback
//! forwards raw events into an internal channel; a single tokio task turns
//! *remove* events into path conflicts and forwards watcher errors.
//!
//! ## Architecture
//!
//! ```text
//! inotify / kqueue
//!       │
//!       ▼
//!  notify callback ──→ raw channel ──→ monitor task ──→ events (cap 10)
//!                                           │
//!                                           └──────────→ errors (cap 1)
//! ```
//!
//! Both outbound channels are bounded and the task waits on a full channel
//! instead of dropping conflicts; consumers must drain `events` promptly.
//! Events are not debounced here.

use std::path::Path;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rift_core::domain::{Conflict, ConflictType};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Capacity of the outbound conflict channel
pub const EVENTS_CAPACITY: usize = 10;
/// Capacity of the outbound error channel
pub const ERRORS_CAPACITY: usize = 1;
/// Capacity of the channel between the OS callback and the monitor task
const RAW_CAPACITY: usize = 64;

/// Reason attached to conflicts raised for removed files
pub const FILE_REMOVED: &str = "file removed";

/// Errors from setting up or driving the monitor
#[derive(Debug, Error)]
pub enum WatchError {
    /// The OS watcher could not be created or could not watch a path
    #[error("watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// `watch` was called on a monitor that is shutting down
    #[error("monitor is closed")]
    Closed,
}

type RawEvent = notify::Result<notify::Event>;

/// Watches directory trees and reports removals as conflicts
///
/// ## Usage
///
/// ```ignore
/// let (mut monitor, mut events, mut errors) = RealTimeMonitor::new()?;
/// monitor.watch(Path::new("/srv/tree"))?;
/// while let Some(conflict) = events.recv().await { /* ... */ }
/// monitor.close().await;
/// ```
pub struct RealTimeMonitor {
    /// The underlying notify watcher; dropped after the task exits
    watcher: Option<RecommendedWatcher>,
    /// Raw event receiver, moved into the task on the first `watch`
    raw_rx: Option<mpsc::Receiver<RawEvent>>,
    events_tx: mpsc::Sender<Conflict>,
    errors_tx: mpsc::Sender<notify::Error>,
    stop: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RealTimeMonitor {
    /// Creates the OS watcher and the channels conflicts and errors arrive on
    ///
    /// Nothing is watched until [`watch`](Self::watch) is called.
    ///
    /// # Errors
    /// Returns an error if the underlying OS watcher cannot be created
    pub fn new() -> Result<
        (
            Self,
            mpsc::Receiver<Conflict>,
            mpsc::Receiver<notify::Error>,
        ),
        WatchError,
    > {
        let (raw_tx, raw_rx) = mpsc::channel::<RawEvent>(RAW_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel(EVENTS_CAPACITY);
        let (errors_tx, errors_rx) = mpsc::channel(ERRORS_CAPACITY);

        info!("Initializing real-time monitor");

        let watcher = RecommendedWatcher::new(
            move |res: RawEvent| {
                if let Err(e) = raw_tx.blocking_send(res) {
                    debug!(error = %e, "Dropping raw event (monitor task gone)");
                }
            },
            notify::Config::default(),
        )?;

        let monitor = Self {
            watcher: Some(watcher),
            raw_rx: Some(raw_rx),
            events_tx,
            errors_tx,
            stop: CancellationToken::new(),
            task: None,
        };

        Ok((monitor, events_rx, errors_rx))
    }

    /// Starts watching `path` recursively
    ///
    /// The first successful call spawns the background task; later calls only
    /// add watches. Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the path cannot be watched (missing path,
    /// insufficient permissions, inotify watch limit reached)
    pub fn watch(&mut self, path: &Path) -> Result<(), WatchError> {
        let watcher = self.watcher.as_mut().ok_or(WatchError::Closed)?;

        info!(path = %path.display(), "Starting recursive watch");
        watcher.watch(path, RecursiveMode::Recursive)?;

        if let Some(raw_rx) = self.raw_rx.take() {
            self.task = Some(tokio::spawn(run_loop(
                raw_rx,
                self.events_tx.clone(),
                self.errors_tx.clone(),
                self.stop.clone(),
            )));
        }

        Ok(())
    }

    /// Stops watching `path`
    pub fn unwatch(&mut self, path: &Path) -> Result<(), WatchError> {
        let watcher = self.watcher.as_mut().ok_or(WatchError::Closed)?;

        info!(path = %path.display(), "Stopping watch");
        watcher.unwatch(path)?;
        Ok(())
    }

    /// Stops the background task, waits for it to exit, then releases the
    /// OS watch handle
    pub async fn close(mut self) {
        self.stop.cancel();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Real-time monitor task failed");
            }
        }

        drop(self.watcher.take());
        info!("Real-time monitor closed");
    }

    /// Whether the background task is running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

/// Body of the monitor task
async fn run_loop(
    mut raw_rx: mpsc::Receiver<RawEvent>,
    events_tx: mpsc::Sender<Conflict>,
    errors_tx: mpsc::Sender<notify::Error>,
    stop: CancellationToken,
) {
    debug!("Real-time monitor loop started");

    loop {
        let raw = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            raw = raw_rx.recv() => raw,
        };

        match raw {
            Some(Ok(event)) => {
                let Some(conflict) = map_removal(&event) else {
                    continue;
                };
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    sent = events_tx.send(conflict) => {
                        if sent.is_err() {
                            warn!("Conflict receiver dropped, stopping monitor loop");
                            break;
                        }
                    }
                }
            }
            Some(Err(err)) => {
                warn!(error = %err, "File watcher error");
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    sent = errors_tx.send(err) => {
                        if sent.is_err() {
                            debug!("Error receiver dropped");
                        }
                    }
                }
            }
            None => {
                debug!("Raw event channel closed");
                break;
            }
        }
    }

    debug!("Real-time monitor loop exited");
}

/// Converts a *remove* event into a path conflict
///
/// Returns `None` for every other event kind and for events without paths.
fn map_removal(event: &notify::Event) -> Option<Conflict> {
    if !matches!(event.kind, EventKind::Remove(_)) {
        return None;
    }

    let path = event.paths.first()?;
    debug!(path = %path.display(), "Mapped Remove event to conflict");

    Some(
        Conflict::new(ConflictType::Path, 1)
            .with_participant(path.display().to_string())
            .with_reason(FILE_REMOVED),
    )
}
