//! Epsilon-greedy tabular agent
//!
//! The value table is the only shared mutable resource in the pipeline.
//! Selection takes a read lock; a learning update holds the write lock for
//! its whole read-modify-write (including the `max Q(s', ·)` read and the
//! ε step), so concurrent feedback never loses an update. Lock order is
//! always table → ε.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use helmsman_common::{
    Action, HelmsmanConfig, InternalState, LearningConfig, PersistenceConfig, PersistenceError,
    PolicyError,
};
use parking_lot::{Mutex, RwLock};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::snapshot::PolicySnapshot;
use super::table::{ActionValues, ValueTable};
use super::{ActionPolicy, Selection, SelectionMode};

/// Learning progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    /// States with learned values
    pub total_states: usize,
    /// `(state, action)` entries
    pub total_entries: usize,
    /// Learning updates applied (survives reloads)
    pub updates: u64,
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
}

/// Tabular reinforcement-learning agent
pub struct PolicyEngine {
    config: LearningConfig,
    persistence: PersistenceConfig,
    table: RwLock<ValueTable>,
    epsilon: Mutex<f64>,
    rng: Mutex<ChaCha8Rng>,
    updates: AtomicU64,
    /// Serializes snapshot writes so a stale snapshot never lands last
    persist_lock: Mutex<()>,
}

impl PolicyEngine {
    /// Create an engine with an empty table
    pub fn new(config: LearningConfig) -> Self {
        Self {
            epsilon: Mutex::new(config.epsilon),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(config.seed)),
            table: RwLock::new(ValueTable::new()),
            updates: AtomicU64::new(0),
            persistence: PersistenceConfig::default(),
            persist_lock: Mutex::new(()),
            config,
        }
    }

    /// Attach persistence settings
    pub fn with_persistence(mut self, persistence: PersistenceConfig) -> Self {
        self.persistence = persistence;
        self
    }

    /// Create an engine and resume from the configured snapshot, if any
    pub fn open(config: LearningConfig, persistence: PersistenceConfig) -> Self {
        let engine = Self::new(config).with_persistence(persistence);
        if let Some(path) = engine.persistence.snapshot_path.clone() {
            engine.restore(&path);
        }
        engine
    }

    pub fn from_config(cfg: &HelmsmanConfig) -> Self {
        Self::open(cfg.learning.clone(), cfg.persistence.clone())
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f64 {
        *self.epsilon.lock()
    }

    /// Learning updates applied so far
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }

    /// Restart the exploration stream from `seed`
    pub fn reseed(&self, seed: u64) {
        *self.rng.lock() = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Epsilon-greedy selection
    pub fn select(&self, state: &InternalState) -> Selection {
        let epsilon = self.epsilon();

        let explored = {
            let mut rng = self.rng.lock();
            if rng.gen::<f64>() < epsilon {
                Some(Action::ALL[rng.gen_range(0..Action::COUNT)])
            } else {
                None
            }
        };

        let learned = self.table.read().get(state).copied();

        let (action, mode) = match explored {
            Some(action) => (action, SelectionMode::Explore),
            None => (learned.unwrap_or_default().best(), SelectionMode::Exploit),
        };

        let confidence = match &learned {
            Some(values) => values.confidence(action),
            None => self.config.unseen_confidence,
        };

        debug!(
            state = %state,
            action = %action,
            mode = mode.as_str(),
            confidence,
            "Policy selection"
        );

        Selection {
            action,
            confidence,
            mode,
            seen: learned.is_some(),
        }
    }

    /// Single-step tabular update; returns the new value
    pub fn update(
        &self,
        state: &InternalState,
        action: Action,
        reward: f64,
        next_state: Option<&InternalState>,
    ) -> Result<f64, PolicyError> {
        if !reward.is_finite() {
            return Err(PolicyError::InvalidReward(reward));
        }

        let (current, updated, updates) = {
            let mut table = self.table.write();

            let max_next = next_state.map(|s| table.values(s).max()).unwrap_or(0.0);
            let current = table.values(state).get(action);
            let updated = current
                + self.config.alpha * (reward + self.config.gamma * max_next - current);

            if !updated.is_finite() {
                return Err(PolicyError::CorruptValue {
                    state: state.to_string(),
                    action: action.to_string(),
                });
            }

            table.entry_mut(state.clone()).set(action, updated);

            let mut epsilon = self.epsilon.lock();
            *epsilon = self.config.epsilon_schedule.next(*epsilon);

            (current, updated, self.updates.fetch_add(1, Ordering::SeqCst) + 1)
        };

        debug!(
            state = %state,
            action = %action,
            reward,
            "Updated Q: {:.3} -> {:.3}",
            current,
            updated
        );

        let every = self.persistence.autosave_every;
        if every > 0 && updates % every == 0 {
            self.persist();
        }

        Ok(updated)
    }

    /// Values for every action in `state` (zeros if unseen)
    pub fn action_values(&self, state: &InternalState) -> ActionValues {
        self.table.read().values(state)
    }

    pub fn summary(&self) -> PolicySummary {
        let table = self.table.read();
        PolicySummary {
            total_states: table.len(),
            total_entries: table.entry_count(),
            updates: self.updates(),
            alpha: self.config.alpha,
            gamma: self.config.gamma,
            epsilon: *self.epsilon.lock(),
        }
    }

    /// Consistent snapshot of table, ε and update count
    pub fn save(&self) -> PolicySnapshot {
        let table = self.table.read();
        let epsilon = *self.epsilon.lock();
        PolicySnapshot::capture(&table, epsilon, self.updates())
    }

    /// Replace table and ε with a snapshot; on error nothing changes
    pub fn load(&self, snapshot: &PolicySnapshot) -> Result<(), PersistenceError> {
        let restored = snapshot.to_table()?;

        let mut table = self.table.write();
        *table = restored;
        *self.epsilon.lock() = snapshot.epsilon;
        self.updates.store(snapshot.updates, Ordering::SeqCst);
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), PersistenceError> {
        let _guard = self.persist_lock.lock();
        self.save().write_to(path)
    }

    /// Save to the configured snapshot path
    pub fn save_configured(&self) -> Result<(), PersistenceError> {
        let path = self
            .persistence
            .snapshot_path
            .as_deref()
            .ok_or(PersistenceError::NoPath)?;
        self.save_to(path)
    }

    pub fn load_from(&self, path: &Path) -> Result<(), PersistenceError> {
        let snapshot = PolicySnapshot::read_from(path)?;
        self.load(&snapshot)
    }

    /// Load from `path`, falling back to a cold start on any failure
    pub fn restore(&self, path: &Path) -> bool {
        match self.load_from(path) {
            Ok(()) => {
                let summary = self.summary();
                info!(
                    path = %path.display(),
                    states = summary.total_states,
                    epsilon = summary.epsilon,
                    "Policy snapshot loaded"
                );
                true
            }
            Err(PersistenceError::NotFound(_)) => {
                info!(path = %path.display(), "No existing policy snapshot, starting fresh");
                self.reset();
                false
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to load policy snapshot, cold start");
                self.reset();
                false
            }
        }
    }

    /// Save to the configured snapshot path; failures are logged, never raised
    pub fn persist(&self) -> bool {
        match self.save_configured() {
            Ok(()) => true,
            Err(PersistenceError::NoPath) => {
                debug!("No snapshot path configured, skipping persist");
                false
            }
            Err(err) => {
                warn!(error = %err, "Failed to persist policy snapshot");
                false
            }
        }
    }

    /// Empty table, initial ε
    pub fn reset(&self) {
        let mut table = self.table.write();
        *table = ValueTable::new();
        *self.epsilon.lock() = self.config.epsilon;
        self.updates.store(0, Ordering::SeqCst);
    }
}

impl ActionPolicy for PolicyEngine {
    fn select(&self, state: &InternalState) -> Result<Selection, PolicyError> {
        Ok(PolicyEngine::select(self, state))
    }

    fn update(
        &self,
        state: &InternalState,
        action: Action,
        reward: f64,
        next_state: Option<&InternalState>,
    ) -> Result<f64, PolicyError> {
        PolicyEngine::update(self, state, action, reward, next_state)
    }

    fn persist(&self) -> bool {
        PolicyEngine::persist(self)
    }
}
