//! # Helmsman Common
//!
//! Shared types, errors, configuration and journaling for the Helmsman
//! decision layer.
//!
//! ## Core Types
//!
//! - [`Action`]: closed set of remediation actions
//! - [`Environment`] / [`HealthBand`]: validated telemetry vocabularies
//! - [`InternalState`]: discretized policy lookup key
//! - [`Decision`]: explainable record handed to the orchestrator
//!
//! ## Support
//!
//! - [`config`]: layered configuration (file + `HELMSMAN__*` env vars)
//! - [`journal`]: bounded record of blocked events and safety downgrades
//! - [`error`]: unified error type

pub mod config;
pub mod error;
pub mod journal;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{
    BucketConfig, EpsilonSchedule, HelmsmanConfig, JournalConfig, LearningConfig,
    PersistenceConfig, RewardWeights, SafetyTable,
};
pub use error::{ConfigError, HelmsmanError, PersistenceError, PolicyError, Result};
pub use journal::{DecisionJournal, JournalEntry, JournalKind, JournalSink};
pub use types::{
    action::Action,
    decision::Decision,
    environment::{Environment, HealthBand},
    state::{FailureBucket, InternalState, LatencyBucket},
};

/// Helmsman version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default learning rate α
pub const DEFAULT_ALPHA: f64 = 0.1;

/// Default discount factor γ
pub const DEFAULT_GAMMA: f64 = 0.9;

/// Default exploration rate ε
pub const DEFAULT_EPSILON: f64 = 0.1;

/// Default exploration seed
pub const DEFAULT_SEED: u64 = 42;

/// Confidence reported for states the policy has never seen
pub const DEFAULT_UNSEEN_CONFIDENCE: f64 = 0.1;

/// Latency below this is `low` (milliseconds)
pub const DEFAULT_LATENCY_LOW_MS: f64 = 100.0;

/// Latency at or above this is `high` (milliseconds)
pub const DEFAULT_LATENCY_HIGH_MS: f64 = 500.0;

/// Failure counts at or above this land in bucket 1
pub const DEFAULT_FAILURES_SOME_MIN: u64 = 1;

/// Failure counts at or above this land in bucket 2
pub const DEFAULT_FAILURES_MANY_MIN: u64 = 3;

/// Journal entries retained per kind
pub const DEFAULT_JOURNAL_CAPACITY: usize = 256;
