//! Value table keyed by `(InternalState, Action)`

use std::collections::HashMap;

use helmsman_common::{Action, InternalState};

/// Value estimates for every action in one state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActionValues([f64; Action::COUNT]);

impl ActionValues {
    #[inline]
    pub fn get(&self, action: Action) -> f64 {
        self.0[action.priority()]
    }

    #[inline]
    pub fn set(&mut self, action: Action, value: f64) {
        self.0[action.priority()] = value;
    }

    /// Highest value in the state
    pub fn max(&self) -> f64 {
        self.0.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Highest-valued action; ties go to the lowest priority index
    pub fn best(&self) -> Action {
        let mut best = Action::Noop;
        for action in Action::ALL {
            if self.get(action) > self.get(best) {
                best = action;
            }
        }
        best
    }

    /// `(action, value)` pairs in priority order
    pub fn iter(&self) -> impl Iterator<Item = (Action, f64)> + '_ {
        Action::ALL.into_iter().map(move |a| (a, self.get(a)))
    }

    /// Confidence in `action` relative to its siblings
    ///
    /// `0.5 + 0.5 * (v - mean(others)) / max|v|`, clamped to `[0, 1]`.
    /// Returns 0.5 when every value is zero.
    pub fn confidence(&self, action: Action) -> f64 {
        let scale = self.0.iter().map(|v| v.abs()).fold(0.0, f64::max);
        if scale <= f64::EPSILON {
            return 0.5;
        }

        let chosen = self.get(action);
        let others = (self.0.iter().sum::<f64>() - chosen) / (Action::COUNT - 1) as f64;
        (0.5 + 0.5 * (chosen - others) / scale).clamp(0.0, 1.0)
    }
}

/// Tabular value store
///
/// Not synchronized on its own; the policy engine owns it behind a lock.
#[derive(Debug, Clone, Default)]
pub struct ValueTable {
    states: HashMap<InternalState, ActionValues>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learned values, or `None` for a state never updated
    pub fn get(&self, state: &InternalState) -> Option<&ActionValues> {
        self.states.get(state)
    }

    /// Learned values, defaulting every action to 0 for unseen states
    pub fn values(&self, state: &InternalState) -> ActionValues {
        self.states.get(state).copied().unwrap_or_default()
    }

    pub fn entry_mut(&mut self, state: InternalState) -> &mut ActionValues {
        self.states.entry(state).or_default()
    }

    pub fn contains(&self, state: &InternalState) -> bool {
        self.states.contains_key(state)
    }

    /// Number of states with learned values
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of `(state, action)` entries
    pub fn entry_count(&self) -> usize {
        self.states.len() * Action::COUNT
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InternalState, &ActionValues)> {
        self.states.iter()
    }
}
