//! Helmsman configuration
//!
//! Everything that shapes policy behaviour lives here: learning rate,
//! discount, exploration schedule, reward weights, bucket thresholds and
//! the per-environment safety tables. Values are layered as
//! defaults < config file < `HELMSMAN__*` environment variables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::action::Action;
use crate::types::environment::Environment;

/// Default config file looked up when `HELMSMAN_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "helmsman.toml";

/// Environment variable prefix for overrides (`HELMSMAN__LEARNING__ALPHA=0.2`)
pub const ENV_PREFIX: &str = "HELMSMAN";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelmsmanConfig {
    /// Learning parameters for the policy engine
    pub learning: LearningConfig,
    /// Reward weights used by outcome observers
    pub rewards: RewardWeights,
    /// Discretization thresholds
    pub buckets: BucketConfig,
    /// Per-environment action whitelists
    pub safety: SafetyTable,
    /// Snapshot persistence
    pub persistence: PersistenceConfig,
    /// Decision journal
    pub journal: JournalConfig,
}

impl HelmsmanConfig {
    /// Load configuration from `.env`, the config file and the environment
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let path = std::env::var("HELMSMAN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        Self::load_from(&path)
    }

    /// Load configuration from a specific file (missing file = defaults)
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let cfg: Self = settings
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Check ranges and orderings
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.learning.validate()?;
        self.buckets.validate()?;
        self.safety.validate()?;
        Ok(())
    }
}

/// Exploration schedule, stated explicitly at construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EpsilonSchedule {
    /// ε never changes
    #[default]
    Constant,
    /// ε ← max(ε · factor, floor) after every learning update
    Decay { factor: f64, floor: f64 },
}

impl EpsilonSchedule {
    /// ε after one more learning update
    pub fn next(&self, epsilon: f64) -> f64 {
        match *self {
            EpsilonSchedule::Constant => epsilon,
            EpsilonSchedule::Decay { factor, floor } => (epsilon * factor).max(floor),
        }
    }
}

/// Learning parameters for the tabular agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Learning rate α
    pub alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
    /// Initial exploration rate ε
    pub epsilon: f64,
    /// How ε evolves
    pub epsilon_schedule: EpsilonSchedule,
    /// Seed for the exploration RNG
    pub seed: u64,
    /// Confidence reported for states with no learned values
    pub unseen_confidence: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            alpha: crate::DEFAULT_ALPHA,
            gamma: crate::DEFAULT_GAMMA,
            epsilon: crate::DEFAULT_EPSILON,
            epsilon_schedule: EpsilonSchedule::Constant,
            seed: crate::DEFAULT_SEED,
            unseen_confidence: crate::DEFAULT_UNSEEN_CONFIDENCE,
        }
    }
}

impl LearningConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        check_range("learning.alpha", "(0, 1]", self.alpha, |v| v > 0.0 && v <= 1.0)?;
        check_range("learning.gamma", "[0, 1]", self.gamma, |v| (0.0..=1.0).contains(&v))?;
        check_range("learning.epsilon", "[0, 1]", self.epsilon, |v| (0.0..=1.0).contains(&v))?;
        check_range(
            "learning.unseen_confidence",
            "[0, 1]",
            self.unseen_confidence,
            |v| (0.0..=1.0).contains(&v),
        )?;

        if let EpsilonSchedule::Decay { factor, floor } = self.epsilon_schedule {
            check_range("learning.epsilon_schedule.factor", "(0, 1]", factor, |v| {
                v > 0.0 && v <= 1.0
            })?;
            check_range("learning.epsilon_schedule.floor", "[0, 1]", floor, |v| {
                (0.0..=1.0).contains(&v)
            })?;
        }
        Ok(())
    }
}

/// Reward weights, stated as `{name: weight}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Latency bucket went down after the action
    pub latency_improvement: f64,
    /// Failure bucket went down after the action
    pub error_reduction: f64,
    /// Action matched the health band's expected remedy
    pub successful_action: f64,
    /// Action turned out to be inappropriate
    pub failed_action: f64,
    /// Action had to be blocked or downgraded by the safety guard
    pub unsafe_action: f64,
    /// NOOP chosen while already healthy
    pub no_change_needed: f64,
    /// Applied to every non-NOOP action
    pub time_penalty: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            latency_improvement: 10.0,
            error_reduction: 15.0,
            successful_action: 5.0,
            failed_action: -20.0,
            unsafe_action: -50.0,
            no_change_needed: 2.0,
            time_penalty: -1.0,
        }
    }
}

impl RewardWeights {
    /// Weights keyed by name
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("latency_improvement", self.latency_improvement),
            ("error_reduction", self.error_reduction),
            ("successful_action", self.successful_action),
            ("failed_action", self.failed_action),
            ("unsafe_action", self.unsafe_action),
            ("no_change_needed", self.no_change_needed),
            ("time_penalty", self.time_penalty),
        ])
    }
}

/// Discretization thresholds
///
/// Latency: `< latency_low_ms` → low, `< latency_high_ms` → medium, else high.
/// Failures: `< failures_some_min` → bucket 0, `< failures_many_min` → bucket 1,
/// else bucket 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    pub latency_low_ms: f64,
    pub latency_high_ms: f64,
    pub failures_some_min: u64,
    pub failures_many_min: u64,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            latency_low_ms: crate::DEFAULT_LATENCY_LOW_MS,
            latency_high_ms: crate::DEFAULT_LATENCY_HIGH_MS,
            failures_some_min: crate::DEFAULT_FAILURES_SOME_MIN,
            failures_many_min: crate::DEFAULT_FAILURES_MANY_MIN,
        }
    }
}

impl BucketConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(self.latency_low_ms.is_finite() && self.latency_high_ms.is_finite())
            || self.latency_low_ms <= 0.0
            || self.latency_low_ms >= self.latency_high_ms
        {
            return Err(ConfigError::InvalidThresholds {
                field: "buckets.latency",
                reason: format!(
                    "need 0 < low < high, got low={} high={}",
                    self.latency_low_ms, self.latency_high_ms
                ),
            });
        }

        if self.failures_some_min == 0 || self.failures_some_min >= self.failures_many_min {
            return Err(ConfigError::InvalidThresholds {
                field: "buckets.failures",
                reason: format!(
                    "need 0 < some_min < many_min, got some_min={} many_min={}",
                    self.failures_some_min, self.failures_many_min
                ),
            });
        }
        Ok(())
    }
}

/// Per-environment action whitelists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyTable {
    pub dev: Vec<Action>,
    pub stage: Vec<Action>,
    pub prod: Vec<Action>,
}

impl Default for SafetyTable {
    fn default() -> Self {
        Self {
            dev: Action::ALL.to_vec(),
            stage: vec![Action::Noop, Action::ScaleUp, Action::ScaleDown],
            prod: vec![Action::Noop, Action::ScaleUp],
        }
    }
}

impl SafetyTable {
    /// Actions permitted in `env`
    pub fn permitted(&self, env: Environment) -> &[Action] {
        match env {
            Environment::Dev => &self.dev,
            Environment::Stage => &self.stage,
            Environment::Prod => &self.prod,
        }
    }

    /// Downgrades always land on NOOP, so every table must permit it
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for env in Environment::ALL {
            if !self.permitted(env).contains(&Action::Noop) {
                return Err(ConfigError::NoopNotPermitted {
                    env: env.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Snapshot persistence settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Where the policy snapshot lives (None = in-memory only)
    pub snapshot_path: Option<PathBuf>,
    /// Save after this many learning updates (0 = only on explicit persist)
    pub autosave_every: u64,
}

/// Decision journal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Entries retained in memory per kind
    pub capacity: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            capacity: crate::DEFAULT_JOURNAL_CAPACITY,
        }
    }
}

fn check_range(
    field: &'static str,
    range: &'static str,
    value: f64,
    ok: impl Fn(f64) -> bool,
) -> std::result::Result<(), ConfigError> {
    if value.is_finite() && ok(value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            range,
            value,
        })
    }
}
