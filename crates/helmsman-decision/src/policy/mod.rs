//! Tabular policy engine
//!
//! ```text
//! select:  state ──► ε-greedy over Q(state, ·) ──► (action, confidence)
//! update:  Q(s,a) ← Q(s,a) + α · (r + γ · max_a' Q(s',a') − Q(s,a))
//! persist: table + ε ──► flat JSON snapshot
//! ```

pub mod engine;
pub mod reward;
pub mod snapshot;
pub mod table;

use helmsman_common::{Action, InternalState, PolicyError};
use serde::{Deserialize, Serialize};

pub use engine::{PolicyEngine, PolicySummary};
pub use reward::{OutcomeObservation, RewardBreakdown, RewardModel};
pub use snapshot::{PolicySnapshot, SnapshotEntry, SNAPSHOT_VERSION};
pub use table::{ActionValues, ValueTable};

/// How an action was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Highest stored value
    Exploit,
    /// Uniform random draw
    Explore,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Exploit => "exploitation",
            SelectionMode::Explore => "exploration",
        }
    }
}

/// Result of action selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub action: Action,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    pub mode: SelectionMode,
    /// Whether the state had learned values
    pub seen: bool,
}

/// Policy seam used by the decision bridge
pub trait ActionPolicy: Send + Sync {
    /// Choose an action for a state
    fn select(&self, state: &InternalState) -> Result<Selection, PolicyError>;

    /// Apply one learning update; returns the new value of `(state, action)`
    ///
    /// `next_state = None` marks a terminal transition.
    fn update(
        &self,
        state: &InternalState,
        action: Action,
        reward: f64,
        next_state: Option<&InternalState>,
    ) -> Result<f64, PolicyError>;

    /// Save to the configured location; fail-soft
    fn persist(&self) -> bool {
        false
    }
}
