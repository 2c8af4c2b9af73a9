//! Rift CLI - Command-line interface for the conflict engine
//!
//! Provides commands for:
//! - Scanning trees, files and module manifests for conflicts
//! - Inspecting and rolling back the conflict history
//! - Watching a tree for removals in real time
//! - Serving status and metrics over HTTP
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rift_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod signal;

use commands::{
    config::ConfigCommand, history::HistoryCommand, rollback::RollbackCommand,
    scan::ScanCommand, serve::ServeCommand, watch::WatchCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "rift", version, about = "Conflict detection and resolution engine")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect and resolve conflicts
    Scan(ScanCommand),
    /// Show the conflict history
    History(HistoryCommand),
    /// Roll back a recorded resolution
    Rollback(RollbackCommand),
    /// Report removals under a directory as they happen
    Watch(WatchCommand),
    /// Serve status and metrics over HTTP
    Serve(ServeCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Loads `--config` strictly, or the default path leniently
fn load_config(path: Option<&PathBuf>) -> Result<(Config, PathBuf)> {
    match path {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            Ok((config, path.clone()))
        }
        None => {
            let path = Config::default_path();
            Ok((Config::load_or_default(&path), path))
        }
    }
}

fn init_tracing(config: &Config, verbose: u8) {
    let level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_path) = load_config(cli.config.as_ref())?;
    init_tracing(&config, cli.verbose);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Scan(cmd) => cmd.execute(&config, format).await,
        Commands::History(cmd) => cmd.execute(&config, format).await,
        Commands::Rollback(cmd) => cmd.execute(&config, format).await,
        Commands::Watch(cmd) => cmd.execute(&config, format).await,
        Commands::Serve(cmd) => cmd.execute(&config, format).await,
        Commands::Config(cmd) => cmd.execute(&config, &config_path, format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["rift", "history", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::History(_)));
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let path = PathBuf::from("/definitely/not/here.yaml");
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "detection:\n  version_baseline: \"1.0.0\"\n  case_insensitive_paths: false\n").unwrap();

        let (config, loaded_from) = load_config(Some(&path)).unwrap();
        assert_eq!(loaded_from, path);
        assert_eq!(config.detection.version_baseline, "1.0.0");
        assert_eq!(config.resolution.strategies, ["auto_merge", "user_prompt"]);
    }
}
