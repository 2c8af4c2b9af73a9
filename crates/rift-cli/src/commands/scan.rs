//! Scan command - Detect and resolve conflicts
//!
//! Provides the `rift scan` CLI command which:
//! 1. Runs every detector over a tree, a resource list and module versions
//! 2. Resolves the findings through the configured strategy chain
//! 3. Appends the outcomes to the persisted history
//! 4. Optionally commits the resolved tree to git

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use rift_conflict::{ConflictEngine, DetectionScope, GitVersioning, StrategyRegistry};
use rift_core::config::Config;
use rift_telemetry::PerfMetrics;
use tracing::info;

use super::load_history;
use crate::output::{conflict_row, get_formatter, OutputFormat, CONFLICT_HEADER};

#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Root of the directory tree to scan for path conflicts
    pub root: PathBuf,

    /// Files to check for content and permission conflicts
    #[arg(long, num_args = 1..)]
    pub resources: Vec<PathBuf>,

    /// Module version as NAME=VERSION (repeatable)
    #[arg(long = "module", value_parser = parse_module)]
    pub modules: Vec<(String, String)>,

    /// Strategy chain override, e.g. `auto_merge,user_prompt`
    #[arg(long, value_delimiter = ',')]
    pub strategies: Option<Vec<String>>,

    /// Commit the tree to its git repository with this message afterwards
    #[arg(long)]
    pub commit: Option<String>,
}

fn parse_module(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, version)) if !name.is_empty() && !version.is_empty() => {
            Ok((name.to_string(), version.to_string()))
        }
        _ => Err(format!("expected NAME=VERSION, got '{s}'")),
    }
}

impl ScanCommand {
    fn scopes(&self) -> Vec<DetectionScope> {
        let mut scopes = vec![DetectionScope::Tree(self.root.clone())];
        if !self.resources.is_empty() {
            scopes.push(DetectionScope::Resources(self.resources.clone()));
        }
        if !self.modules.is_empty() {
            let modules: BTreeMap<String, String> = self.modules.iter().cloned().collect();
            scopes.push(DetectionScope::Modules(modules));
        }
        scopes
    }

    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        if !self.root.is_dir() {
            bail!("Scan root is not a directory: {}", self.root.display());
        }

        let mut config = config.clone();
        if let Some(strategies) = &self.strategies {
            config.resolution.strategies = strategies.clone();
        }

        let metrics = Arc::new(PerfMetrics::new().context("Failed to create metrics")?);
        let history = load_history(&config.history.path)?;
        let engine = ConflictEngine::from_config(&config, &StrategyRegistry::new(), metrics)
            .context("Failed to build conflict engine")?
            .with_history(history);

        let conflicts = engine
            .detect(&self.scopes())
            .await
            .with_context(|| format!("Failed to scan {}", self.root.display()))?;
        info!(count = conflicts.len(), "Detection finished");

        if !format.is_json() && !conflicts.is_empty() {
            formatter.info(CONFLICT_HEADER);
            for conflict in &conflicts {
                formatter.info(&conflict_row(conflict));
            }
            formatter.info("");
        }

        let summary = engine.resolve(conflicts).await;

        let history = engine.history();
        history
            .lock()
            .await
            .save_history(&config.history.path)
            .with_context(|| {
                format!("Failed to save history to {}", config.history.path.display())
            })?;

        let commit = match &self.commit {
            Some(message) => {
                let versioning = GitVersioning::open(&self.root).with_context(|| {
                    format!("{} is not a git repository", self.root.display())
                })?;
                Some(
                    versioning
                        .commit_resolution(message)
                        .context("Failed to commit resolution")?
                        .to_string(),
                )
            }
            None => None,
        };

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "detected": summary.detected,
                "resolved": summary.resolved,
                "failed": summary.failed,
                "average_score": summary.scores.average(),
                "history_path": config.history.path.display().to_string(),
                "commit": commit,
            }));
            return Ok(());
        }

        if summary.detected == 0 {
            formatter.success("No conflicts detected");
        } else {
            formatter.success(&format!(
                "{} conflict{} detected, {} resolved, {} unresolved",
                summary.detected,
                if summary.detected == 1 { "" } else { "s" },
                summary.resolved,
                summary.failed
            ));
        }
        if summary.failed > 0 {
            formatter.warn("Some conflicts could not be resolved; see 'rift history --unresolved'");
        }
        formatter.info(&format!("History saved to {}", config.history.path.display()));
        if let Some(sha) = commit {
            formatter.info(&format!("Committed {sha}"));
        }

        Ok(())
    }
}
