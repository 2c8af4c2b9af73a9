//! CLI subcommands

pub mod config;
pub mod history;
pub mod rollback;
pub mod scan;
pub mod serve;
pub mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use rift_conflict::ConflictHistory;

/// Loads the persisted history, or an empty one if none was saved yet
pub(crate) fn load_history(path: &Path) -> Result<ConflictHistory> {
    let mut history = ConflictHistory::new();
    if path.exists() {
        history
            .load_history(path)
            .with_context(|| format!("Failed to load history from {}", path.display()))?;
    }
    Ok(history)
}
