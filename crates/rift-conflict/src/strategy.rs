//! Resolution strategies
//!
//! A [`ResolutionStrategy`] turns a conflict into a [`Resolution`] carrying a
//! strategy-specific status label. Strategies compose into a
//! [`StrategyChain`], which tries each member in order and stops at the first
//! success. The [`StrategyRegistry`] maps configured names to strategies.
//!
//! | Name                 | Status label        |
//! |----------------------|---------------------|
//! | `auto_merge`         | `merged`            |
//! | `user_prompt`        | `user_resolved`     |
//! | `backup_and_replace` | `backup_replaced`   |
//! | `priority_based`     | `priority_resolved` |

use std::collections::BTreeMap;
use std::sync::Arc;

use rift_core::domain::{Conflict, Resolution};
use tracing::{debug, info, warn};

use crate::error::ConflictError;

/// A way of resolving a conflict
pub trait ResolutionStrategy: Send + Sync {
    /// Registry name, also stamped on every resolution produced
    fn name(&self) -> &str;

    /// Resolves `conflict`
    fn execute(&self, conflict: &Conflict) -> Result<Resolution, ConflictError>;

    /// Checks that `resolution` is one this strategy would produce
    fn validate(&self, resolution: &Resolution) -> Result<(), ConflictError>;

    /// Undoes whatever `execute` applied for `resolution`
    fn rollback(&self, resolution: &Resolution) -> Result<(), ConflictError>;
}

fn check_label(strategy: &str, expected: &str, resolution: &Resolution) -> Result<(), ConflictError> {
    if resolution.status() == expected {
        Ok(())
    } else {
        Err(ConflictError::Validation(format!(
            "{strategy} expects status '{expected}', got '{}'",
            resolution.status()
        )))
    }
}

macro_rules! labelled_strategy {
    ($(#[$doc:meta])* $ty:ident, $name:literal, $status:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $ty;

        impl $ty {
            pub const NAME: &'static str = $name;
            pub const STATUS: &'static str = $status;
        }

        impl ResolutionStrategy for $ty {
            fn name(&self) -> &str {
                Self::NAME
            }

            fn execute(&self, conflict: &Conflict) -> Result<Resolution, ConflictError> {
                debug!(conflict_id = %conflict.id(), strategy = Self::NAME, "Executing strategy");
                Ok(Resolution::new(Self::NAME, Self::STATUS)?)
            }

            fn validate(&self, resolution: &Resolution) -> Result<(), ConflictError> {
                check_label(Self::NAME, Self::STATUS, resolution)
            }

            fn rollback(&self, _resolution: &Resolution) -> Result<(), ConflictError> {
                Ok(())
            }
        }
    };
}

labelled_strategy!(
    /// Merges both sides automatically
    AutoMerge,
    "auto_merge",
    "merged"
);
labelled_strategy!(
    /// Defers to the user
    UserPrompt,
    "user_prompt",
    "user_resolved"
);
labelled_strategy!(
    /// Backs up the current state, then replaces it
    BackupAndReplace,
    "backup_and_replace",
    "backup_replaced"
);
labelled_strategy!(
    /// Keeps the higher-priority side
    PriorityBased,
    "priority_based",
    "priority_resolved"
);

/// Outcome of rolling back one chain member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackOutcome {
    pub strategy: String,
    /// `None` when the member rolled back cleanly
    pub error: Option<String>,
}

/// Per-member results of [`StrategyChain::rollback_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    pub outcomes: Vec<RollbackOutcome>,
}

impl RollbackReport {
    /// Whether every member rolled back without error
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|o| o.error.is_none())
    }

    pub fn failures(&self) -> impl Iterator<Item = &RollbackOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }
}

/// Ordered fallback list of strategies
#[derive(Clone, Default)]
pub struct StrategyChain {
    strategies: Vec<Arc<dyn ResolutionStrategy>>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Arc<dyn ResolutionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Appends a strategy to the end of the chain
    pub fn push(&mut self, strategy: Arc<dyn ResolutionStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Invokes `rollback` on every member and collects the outcomes
    ///
    /// Never fails; member errors are reported, not propagated.
    pub fn rollback_all(&self, resolution: &Resolution) -> RollbackReport {
        let outcomes = self
            .strategies
            .iter()
            .map(|strategy| {
                let error = match strategy.rollback(resolution) {
                    Ok(()) => None,
                    Err(e) => {
                        warn!(strategy = strategy.name(), error = %e, "Strategy rollback failed");
                        Some(e.to_string())
                    }
                };
                RollbackOutcome {
                    strategy: strategy.name().to_string(),
                    error,
                }
            })
            .collect();

        RollbackReport { outcomes }
    }
}

impl std::fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyChain")
            .field("strategies", &self.names())
            .finish()
    }
}

impl ResolutionStrategy for StrategyChain {
    fn name(&self) -> &str {
        "chain"
    }

    /// Returns the first member's success
    ///
    /// # Errors
    /// [`ConflictError::AllStrategiesFailed`] with one entry per member when
    /// none succeeds (an empty chain fails with an empty list).
    fn execute(&self, conflict: &Conflict) -> Result<Resolution, ConflictError> {
        let mut failures = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            match strategy.execute(conflict) {
                Ok(resolution) => {
                    info!(
                        conflict_id = %conflict.id(),
                        strategy = strategy.name(),
                        status = resolution.status(),
                        "Conflict resolved"
                    );
                    return Ok(resolution);
                }
                Err(e) => {
                    warn!(
                        conflict_id = %conflict.id(),
                        strategy = strategy.name(),
                        error = %e,
                        "Strategy failed, trying next"
                    );
                    failures.push(format!("{}: {e}", strategy.name()));
                }
            }
        }

        Err(ConflictError::AllStrategiesFailed(failures))
    }

    /// Succeeds if any member accepts `resolution`
    fn validate(&self, resolution: &Resolution) -> Result<(), ConflictError> {
        let mut rejections = Vec::new();
        for strategy in &self.strategies {
            match strategy.validate(resolution) {
                Ok(()) => return Ok(()),
                Err(e) => rejections.push(e.to_string()),
            }
        }

        Err(ConflictError::Validation(format!(
            "no strategy in chain accepts status '{}': [{}]",
            resolution.status(),
            rejections.join("; ")
        )))
    }

    fn rollback(&self, resolution: &Resolution) -> Result<(), ConflictError> {
        let report = self.rollback_all(resolution);
        if !report.is_clean() {
            debug!(failures = report.failures().count(), "Chain rollback had member failures");
        }
        Ok(())
    }
}

/// Name-to-strategy map used to build chains from configuration
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Arc<dyn ResolutionStrategy>>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyRegistry {
    /// Creates a registry holding the four built-in strategies
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: BTreeMap::new(),
        };
        registry.register(Arc::new(AutoMerge));
        registry.register(Arc::new(UserPrompt));
        registry.register(Arc::new(BackupAndReplace));
        registry.register(Arc::new(PriorityBased));
        registry
    }

    /// Adds `strategy` under its own name, replacing any previous entry
    pub fn register(&mut self, strategy: Arc<dyn ResolutionStrategy>) {
        self.strategies
            .insert(strategy.name().to_string(), strategy);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ResolutionStrategy>> {
        self.strategies.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }

    /// Builds a chain from `names`, in the given order
    ///
    /// # Errors
    /// [`ConflictError::UnknownStrategy`] for the first unregistered name
    pub fn chain<S: AsRef<str>>(&self, names: &[S]) -> Result<StrategyChain, ConflictError> {
        let strategies = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name)
                    .ok_or_else(|| ConflictError::UnknownStrategy(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StrategyChain::new(strategies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rift_core::domain::ConflictType;

    struct Failing;

    impl ResolutionStrategy for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn execute(&self, _conflict: &Conflict) -> Result<Resolution, ConflictError> {
            Err(ConflictError::StrategyFailed {
                strategy: "failing".to_string(),
                reason: "always fails".to_string(),
            })
        }

        fn validate(&self, _resolution: &Resolution) -> Result<(), ConflictError> {
            Err(ConflictError::Validation("never valid".to_string()))
        }

        fn rollback(&self, _resolution: &Resolution) -> Result<(), ConflictError> {
            Err(ConflictError::StrategyFailed {
                strategy: "failing".to_string(),
                reason: "cannot undo".to_string(),
            })
        }
    }

    /// Delegates to `UserPrompt` and counts how often it runs
    #[derive(Default)]
    struct Counting {
        calls: std::sync::atomic::AtomicUsize,
    }

    impl Counting {
        fn calls(&self) -> usize {
            self.calls.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    impl ResolutionStrategy for Counting {
        fn name(&self) -> &str {
            UserPrompt::NAME
        }

        fn execute(&self, conflict: &Conflict) -> Result<Resolution, ConflictError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            UserPrompt.execute(conflict)
        }

        fn validate(&self, resolution: &Resolution) -> Result<(), ConflictError> {
            UserPrompt.validate(resolution)
        }

        fn rollback(&self, resolution: &Resolution) -> Result<(), ConflictError> {
            UserPrompt.rollback(resolution)
        }
    }

    fn conflict() -> Conflict {
        Conflict::new(ConflictType::Content, 2).with_participant("/tmp/a")
    }

    #[test]
    fn test_builtin_labels() {
        let cases: [(&dyn ResolutionStrategy, &str); 4] = [
            (&AutoMerge, "merged"),
            (&UserPrompt, "user_resolved"),
            (&BackupAndReplace, "backup_replaced"),
            (&PriorityBased, "priority_resolved"),
        ];

        for (strategy, label) in cases {
            let resolution = strategy.execute(&conflict()).unwrap();
            assert_eq!(resolution.status(), label);
            assert_eq!(resolution.strategy(), strategy.name());
            assert!(strategy.validate(&resolution).is_ok());
            assert!(strategy.rollback(&resolution).is_ok());
        }
    }

    #[test]
    fn test_validate_rejects_other_label() {
        let merged = AutoMerge.execute(&conflict()).unwrap();
        assert!(matches!(
            UserPrompt.validate(&merged),
            Err(ConflictError::Validation(_))
        ));
    }

    #[test]
    fn test_chain_returns_first_success() {
        let prompt = Arc::new(Counting::default());
        let chain = StrategyChain::new(vec![Arc::new(AutoMerge), prompt.clone() as Arc<dyn ResolutionStrategy>]);
        let resolution = chain.execute(&conflict()).unwrap();
        assert_eq!(resolution.status(), "merged");
        assert_eq!(prompt.calls(), 0);
    }

    #[test]
    fn test_chain_falls_through_failures() {
        let prompt = Arc::new(Counting::default());
        let chain = StrategyChain::new(vec![Arc::new(Failing), prompt.clone() as Arc<dyn ResolutionStrategy>]);
        let resolution = chain.execute(&conflict()).unwrap();
        assert_eq!(resolution.status(), "user_resolved");
        assert_eq!(prompt.calls(), 1);
    }

    #[test]
    fn test_chain_all_failed() {
        let chain = StrategyChain::new(vec![Arc::new(Failing), Arc::new(Failing)]);
        match chain.execute(&conflict()) {
            Err(ConflictError::AllStrategiesFailed(failures)) => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].starts_with("failing:"));
            }
            other => panic!("expected AllStrategiesFailed, got {other:?}"),
        }

        assert!(matches!(
            StrategyChain::default().execute(&conflict()),
            Err(ConflictError::AllStrategiesFailed(f)) if f.is_empty()
        ));
    }

    #[test]
    fn test_chain_validate_any_member() {
        let chain = StrategyChain::new(vec![Arc::new(Failing), Arc::new(PriorityBased)]);
        let resolution = PriorityBased.execute(&conflict()).unwrap();
        assert!(chain.validate(&resolution).is_ok());

        let merged = AutoMerge.execute(&conflict()).unwrap();
        assert!(chain.validate(&merged).is_err());
    }

    #[test]
    fn test_rollback_all_reports_each_member() {
        let chain = StrategyChain::new(vec![Arc::new(AutoMerge), Arc::new(Failing)]);
        let resolution = AutoMerge.execute(&conflict()).unwrap();

        let report = chain.rollback_all(&resolution);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes[0].error.is_none());
        assert!(report.outcomes[1].error.as_deref().unwrap().contains("cannot undo"));
        assert!(!report.is_clean());

        assert!(chain.rollback(&resolution).is_ok());
    }

    #[test]
    fn test_chains_nest() {
        let inner = StrategyChain::new(vec![Arc::new(Failing)]);
        let outer = StrategyChain::new(vec![Arc::new(inner), Arc::new(BackupAndReplace)]);
        assert_eq!(outer.execute(&conflict()).unwrap().status(), "backup_replaced");
    }

    #[test]
    fn test_registry_builds_chain_in_order() {
        let registry = StrategyRegistry::new();
        let chain = registry.chain(&["priority_based", "auto_merge"]).unwrap();
        assert_eq!(chain.names(), ["priority_based", "auto_merge"]);
        assert_eq!(chain.execute(&conflict()).unwrap().status(), "priority_resolved");
    }

    #[test]
    fn test_registry_unknown_strategy() {
        let registry = StrategyRegistry::new();
        assert!(matches!(
            registry.chain(&["auto_merge", "coin_flip"]),
            Err(ConflictError::UnknownStrategy(name)) if name == "coin_flip"
        ));
    }

    #[test]
    fn test_registry_custom_strategy() {
        let mut registry = StrategyRegistry::new();
        registry.register(Arc::new(Failing));
        assert_eq!(registry.names().count(), 5);

        let chain = registry.chain(&["failing", "user_prompt"]).unwrap();
        assert_eq!(chain.execute(&conflict()).unwrap().status(), "user_resolved");
    }
}
