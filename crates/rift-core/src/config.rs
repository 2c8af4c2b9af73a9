//! Configuration module for Rift.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Rift.
///
/// Every section is optional in the YAML file; missing sections take their
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scoring: ScoringConfig,
    pub detection: DetectionConfig,
    pub resolution: ResolutionConfig,
    pub history: HistoryConfig,
    pub alerting: AlertingConfig,
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
}

/// Weights of the multi-criteria scorer.
///
/// `score = impact_weight * impact + urgency_weight * urgency + complexity_weight * complexity`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub impact_weight: f64,
    pub urgency_weight: f64,
    pub complexity_weight: f64,
}

/// Detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Module version treated as incompatible by the version detector.
    pub version_baseline: String,
    /// Treat paths differing only by case as duplicates.
    pub case_insensitive_paths: bool,
}

/// Resolution strategy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Strategy names tried in order: `auto_merge`, `user_prompt`,
    /// `backup_and_replace`, `priority_based`.
    pub strategies: Vec<String>,
}

/// Conflict history persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Path of the JSON history snapshot.
    pub path: PathBuf,
}

/// Threshold alerting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertingConfig {
    /// Alert when more conflicts than this arrive within one window.
    pub threshold: f64,
    /// Length of the counting window in seconds.
    pub window_secs: u64,
}

/// Status server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Address the read-only status server binds to.
    pub addr: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Using default configuration");
                Self::default()
            }
        }
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/rift/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("rift")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            impact_weight: 1.0,
            urgency_weight: 1.0,
            complexity_weight: 1.0,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            version_baseline: "0.0.0".to_string(),
            case_insensitive_paths: true,
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            strategies: vec!["auto_merge".to_string(), "user_prompt".to_string()],
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("rift")
                .join("history.json"),
        }
    }
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            threshold: 10.0,
            window_secs: 60,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9190".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"alerting.window_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Names of the built-in resolution strategies.
pub const BUILTIN_STRATEGIES: &[&str] = &[
    "auto_merge",
    "user_prompt",
    "backup_and_replace",
    "priority_based",
];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- scoring ---
        for (field, weight) in [
            ("scoring.impact_weight", self.scoring.impact_weight),
            ("scoring.urgency_weight", self.scoring.urgency_weight),
            ("scoring.complexity_weight", self.scoring.complexity_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                errors.push(ValidationError {
                    field: field.into(),
                    message: format!("must be a finite, non-negative number (got {weight})"),
                });
            }
        }

        // --- detection ---
        if self.detection.version_baseline.trim().is_empty() {
            errors.push(ValidationError {
                field: "detection.version_baseline".into(),
                message: "must not be empty".into(),
            });
        }

        // --- resolution ---
        if self.resolution.strategies.is_empty() {
            errors.push(ValidationError {
                field: "resolution.strategies".into(),
                message: "at least one strategy is required".into(),
            });
        }
        for name in &self.resolution.strategies {
            if !BUILTIN_STRATEGIES.contains(&name.as_str()) {
                errors.push(ValidationError {
                    field: "resolution.strategies".into(),
                    message: format!(
                        "unknown strategy '{}'; valid options: {}",
                        name,
                        BUILTIN_STRATEGIES.join(", ")
                    ),
                });
            }
        }

        // --- alerting ---
        if !self.alerting.threshold.is_finite() {
            errors.push(ValidationError {
                field: "alerting.threshold".into(),
                message: "must be a finite number".into(),
            });
        }
        if self.alerting.window_secs == 0 {
            errors.push(ValidationError {
                field: "alerting.window_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- monitor ---
        if self.monitor.addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError {
                field: "monitor.addr".into(),
                message: format!("not a socket address: {}", self.monitor.addr),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use rift_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .scoring_weights(1.0, 2.0, 3.0)
///     .alerting_threshold(5.0)
///     .logging_level("debug")
///     .build();
/// assert_eq!(config.scoring.urgency_weight, 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- scoring ---

    pub fn scoring_weights(mut self, impact: f64, urgency: f64, complexity: f64) -> Self {
        self.config.scoring = ScoringConfig {
            impact_weight: impact,
            urgency_weight: urgency,
            complexity_weight: complexity,
        };
        self
    }

    // --- detection ---

    pub fn version_baseline(mut self, baseline: impl Into<String>) -> Self {
        self.config.detection.version_baseline = baseline.into();
        self
    }

    pub fn case_insensitive_paths(mut self, enabled: bool) -> Self {
        self.config.detection.case_insensitive_paths = enabled;
        self
    }

    // --- resolution ---

    pub fn strategies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.resolution.strategies = names.into_iter().map(Into::into).collect();
        self
    }

    // --- history ---

    pub fn history_path(mut self, path: PathBuf) -> Self {
        self.config.history.path = path;
        self
    }

    // --- alerting ---

    pub fn alerting_threshold(mut self, threshold: f64) -> Self {
        self.config.alerting.threshold = threshold;
        self
    }

    pub fn alerting_window_secs(mut self, secs: u64) -> Self {
        self.config.alerting.window_secs = secs;
        self
    }

    // --- monitor ---

    pub fn monitor_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.monitor.addr = addr.into();
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.scoring, ScoringConfig::default());
        assert_eq!(cfg.scoring.impact_weight, 1.0);
        assert_eq!(cfg.detection.version_baseline, "0.0.0");
        assert!(cfg.detection.case_insensitive_paths);
        assert_eq!(cfg.resolution.strategies, vec!["auto_merge", "user_prompt"]);
        assert!(cfg.history.path.ends_with("rift/history.json"));
        assert_eq!(cfg.alerting.threshold, 10.0);
        assert_eq!(cfg.alerting.window_secs, 60);
        assert_eq!(cfg.monitor.addr, "127.0.0.1:9190");
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.logging.json);
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
scoring:
  impact_weight: 1.0
  urgency_weight: 2.0
  complexity_weight: 3.0
detection:
  version_baseline: "0.0.1"
  case_insensitive_paths: false
resolution:
  strategies: [backup_and_replace, priority_based]
history:
  path: /tmp/rift-history.json
alerting:
  threshold: 3
  window_secs: 10
monitor:
  addr: "0.0.0.0:8080"
logging:
  level: debug
  json: true
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.scoring.urgency_weight, 2.0);
        assert_eq!(cfg.scoring.complexity_weight, 3.0);
        assert_eq!(cfg.detection.version_baseline, "0.0.1");
        assert!(!cfg.detection.case_insensitive_paths);
        assert_eq!(
            cfg.resolution.strategies,
            vec!["backup_and_replace", "priority_based"]
        );
        assert_eq!(cfg.history.path, PathBuf::from("/tmp/rift-history.json"));
        assert_eq!(cfg.alerting.threshold, 3.0);
        assert_eq!(cfg.alerting.window_secs, 10);
        assert_eq!(cfg.monitor.addr, "0.0.0.0:8080");
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.json);
    }

    #[test]
    fn load_partial_yaml_keeps_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"alerting:\n  threshold: 2\n  window_secs: 5\n")
            .unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.alerting.threshold, 2.0);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.detection.version_baseline, "0.0.0");
    }

    #[test]
    fn load_partial_section_keeps_field_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"scoring:\n  urgency_weight: 2.0\ndetection:\n  case_insensitive_paths: false\n")
            .unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.scoring.urgency_weight, 2.0);
        assert_eq!(cfg.scoring.impact_weight, 1.0);
        assert_eq!(cfg.scoring.complexity_weight, 1.0);
        assert!(!cfg.detection.case_insensitive_paths);
        assert_eq!(cfg.detection.version_baseline, "0.0.0");

        let cfg = Config::load_or_default(tmp.path());
        assert_eq!(cfg.scoring.urgency_weight, 2.0);
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg.alerting.window_secs, 60);
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"scoring: [not, a, map").unwrap();
        tmp.flush().unwrap();

        assert!(Config::load(tmp.path()).is_err());
    }

    // -- Validation --

    #[test]
    fn validate_catches_negative_weight() {
        let cfg = ConfigBuilder::new().scoring_weights(-1.0, 1.0, 1.0).build();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "scoring.impact_weight"));
    }

    #[test]
    fn validate_catches_unknown_strategy() {
        let cfg = ConfigBuilder::new().strategies(["auto_merge", "coin_flip"]).build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("coin_flip"));
    }

    #[test]
    fn validate_catches_empty_strategy_list() {
        let cfg = ConfigBuilder::new().strategies(Vec::<String>::new()).build();
        assert!(cfg
            .validate()
            .iter()
            .any(|e| e.field == "resolution.strategies"));
    }

    #[test]
    fn validate_catches_zero_window() {
        let cfg = ConfigBuilder::new().alerting_window_secs(0).build();
        assert!(cfg.validate().iter().any(|e| e.field == "alerting.window_secs"));
    }

    #[test]
    fn validate_catches_bad_monitor_addr() {
        let cfg = ConfigBuilder::new().monitor_addr("localhost").build();
        assert!(cfg.validate().iter().any(|e| e.field == "monitor.addr"));
    }

    #[test]
    fn validate_catches_invalid_log_level() {
        let cfg = ConfigBuilder::new().logging_level("verbose").build();
        assert!(cfg.validate().iter().any(|e| e.field == "logging.level"));
    }

    #[test]
    fn validate_accepts_all_builtin_strategies() {
        let cfg = ConfigBuilder::new()
            .strategies(BUILTIN_STRATEGIES.iter().copied())
            .build();
        assert!(cfg.validate().is_empty());
    }

    // -- Builder --

    #[test]
    fn builder_build_validated_fails_for_invalid_config() {
        let result = ConfigBuilder::new()
            .version_baseline("  ")
            .alerting_window_secs(0)
            .build_validated();
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .case_insensitive_paths(false)
            .history_path(PathBuf::from("/tmp/h.json"))
            .logging_json(true)
            .build();
        assert!(!cfg.detection.case_insensitive_paths);
        assert_eq!(cfg.history.path, PathBuf::from("/tmp/h.json"));
        assert!(cfg.logging.json);
    }

    #[test]
    fn default_path_ends_with_config_yaml() {
        let path = Config::default_path();
        assert!(path.ends_with("rift/config.yaml"));
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "alerting.window_secs".into(),
            message: "must be greater than 0".into(),
        };
        assert_eq!(err.to_string(), "alerting.window_secs: must be greater than 0");
    }
}
