//! Rollback command - Revert a recorded resolution
//!
//! Provides the `rift rollback` CLI command which marks the latest record,
//! or the latest record of a given conflict, as unresolved and saves the
//! history.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use rift_conflict::{ConflictError, RollbackManager};
use rift_core::config::Config;
use rift_core::domain::ConflictId;
use rift_telemetry::PerfMetrics;

use super::load_history;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct RollbackCommand {
    /// Conflict ID to roll back instead of the latest record
    #[arg(long)]
    pub id: Option<ConflictId>,
}

impl RollbackCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let path = &config.history.path;

        let mut history = load_history(path)?;
        let metrics = Arc::new(PerfMetrics::new().context("Failed to create metrics")?);
        let mut manager = RollbackManager::new(&mut history).with_metrics(metrics);

        let outcome = match &self.id {
            Some(id) => manager.rollback_by_id(id).map(|changed| changed.then_some(*id)),
            None => manager.rollback_last(),
        };

        let rolled_back = match outcome {
            Ok(rolled_back) => rolled_back,
            Err(ConflictError::NotFound(id)) => {
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "success": false,
                        "error": format!("No history record for conflict {id}"),
                    }));
                }
                anyhow::bail!("No history record for conflict {id}");
            }
            Err(e) => return Err(e).context("Rollback failed"),
        };

        if rolled_back.is_some() {
            history
                .save_history(path)
                .with_context(|| format!("Failed to save history to {}", path.display()))?;
        }

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "rolled_back": rolled_back.map(|id| id.to_string()),
            }));
        } else {
            match rolled_back {
                Some(id) => formatter.success(&format!("Rolled back resolution of {id}")),
                None => formatter.info("Nothing to roll back"),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rift_conflict::ConflictHistory;
    use rift_core::domain::{Conflict, ConflictRecord, ConflictType, Resolution};

    fn config_with_history(dir: &std::path::Path) -> (Config, ConflictId) {
        let mut config = Config::default();
        config.history.path = dir.join("history.json");

        let conflict = Conflict::new(ConflictType::Content, 2);
        let id = *conflict.id();
        let mut history = ConflictHistory::new();
        history.add(ConflictRecord::resolved_by(
            conflict,
            Resolution::new("auto_merge", "merged").unwrap(),
        ));
        history.save_history(&config.history.path).unwrap();

        (config, id)
    }

    #[tokio::test]
    async fn test_rollback_last_saves_history() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = config_with_history(dir.path());

        RollbackCommand { id: None }
            .execute(&config, OutputFormat::Json)
            .await
            .unwrap();

        let history = load_history(&config.history.path).unwrap();
        assert!(!history.records()[0].is_resolved());
    }

    #[tokio::test]
    async fn test_rollback_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let (config, id) = config_with_history(dir.path());

        RollbackCommand { id: Some(id) }
            .execute(&config, OutputFormat::Json)
            .await
            .unwrap();

        let history = load_history(&config.history.path).unwrap();
        assert!(history.find(&id).unwrap().resolution().unwrap().is_rolled_back());
    }

    #[tokio::test]
    async fn test_rollback_unknown_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = config_with_history(dir.path());

        let missing = ConflictId::new();
        let err = RollbackCommand { id: Some(missing) }
            .execute(&config, OutputFormat::Json)
            .await
            .unwrap_err();
        assert!(err.to_string().contains(&missing.to_string()));

        let history = load_history(&config.history.path).unwrap();
        assert!(history.records()[0].is_resolved());
    }
}
