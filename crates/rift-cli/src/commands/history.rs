//! History command - Show recorded conflicts
//!
//! Provides the `rift history` CLI command, which lists history records with
//! optional filters on resolution state and conflict type.

use anyhow::Result;
use clap::Args;
use rift_conflict::ConflictHistory;
use rift_core::config::Config;
use rift_core::domain::{ConflictRecord, ConflictType};
use tracing::info;

use super::load_history;
use crate::output::{get_formatter, record_row, to_json, OutputFormat, CONFLICT_HEADER};

#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Only resolved records
    #[arg(long, conflicts_with = "unresolved")]
    pub resolved: bool,

    /// Only unresolved records
    #[arg(long)]
    pub unresolved: bool,

    /// Only records of this conflict type (path, content, version, permission)
    #[arg(long = "type")]
    pub conflict_type: Option<ConflictType>,
}

impl HistoryCommand {
    fn select<'a>(&self, history: &'a ConflictHistory) -> Vec<&'a ConflictRecord> {
        let mut records = match (self.resolved, self.unresolved) {
            (true, _) => history.filter(true),
            (_, true) => history.filter(false),
            _ => history.records().iter().collect(),
        };
        if let Some(conflict_type) = self.conflict_type {
            records.retain(|r| r.conflict().conflict_type() == conflict_type);
        }
        records
    }

    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let history = load_history(&config.history.path)?;
        let records = self.select(&history);
        info!(total = history.len(), selected = records.len(), "Listing history");

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "count": records.len(),
                "records": records.iter().map(|r| to_json(r)).collect::<Vec<_>>(),
            }));
            return Ok(());
        }

        if records.is_empty() {
            formatter.success("No matching history records");
            return Ok(());
        }

        formatter.success(&format!(
            "{} record{}",
            records.len(),
            if records.len() == 1 { "" } else { "s" }
        ));
        formatter.info("");
        formatter.info(&format!("{:<15} {}", "State", CONFLICT_HEADER));
        for record in &records {
            formatter.info(&record_row(record));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rift_core::domain::{Conflict, Resolution};

    fn history() -> ConflictHistory {
        let mut history = ConflictHistory::new();
        history.add(ConflictRecord::resolved_by(
            Conflict::new(ConflictType::Path, 1),
            Resolution::new("auto_merge", "merged").unwrap(),
        ));
        history.add(ConflictRecord::unresolved(
            Conflict::new(ConflictType::Path, 1),
            "failed",
        ));
        history.add(ConflictRecord::unresolved(
            Conflict::new(ConflictType::Version, 3),
            "failed",
        ));
        history
    }

    fn cmd(resolved: bool, unresolved: bool, conflict_type: Option<ConflictType>) -> HistoryCommand {
        HistoryCommand {
            resolved,
            unresolved,
            conflict_type,
        }
    }

    #[test]
    fn test_select_all() {
        assert_eq!(cmd(false, false, None).select(&history()).len(), 3);
    }

    #[test]
    fn test_select_by_state() {
        let history = history();
        assert_eq!(cmd(true, false, None).select(&history).len(), 1);
        assert_eq!(cmd(false, true, None).select(&history).len(), 2);
    }

    #[test]
    fn test_select_by_state_and_type() {
        let history = history();
        let selected = cmd(false, true, Some(ConflictType::Version)).select(&history);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].conflict().severity(), 3);
    }
}
