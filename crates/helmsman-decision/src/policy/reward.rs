//! Reward model for outcome observers
//!
//! Rewards are computed by whoever observes the real outcome of an action
//! and handed to the policy through feedback. This module gives those
//! observers one weighted scheme driven entirely by [`RewardWeights`].

use helmsman_common::{Action, HealthBand, InternalState, RewardWeights};
use serde::{Deserialize, Serialize};

/// What the observer saw after the action ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeObservation {
    /// The action achieved what it was meant to
    pub succeeded: bool,
    /// The safety guard had to downgrade the recommended action
    pub downgraded: bool,
}

impl Default for OutcomeObservation {
    fn default() -> Self {
        Self {
            succeeded: true,
            downgraded: false,
        }
    }
}

/// Reward split into named components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub components: Vec<(String, f64)>,
    pub total: f64,
}

impl RewardBreakdown {
    fn push(&mut self, name: &str, weight: f64) {
        self.components.push((name.to_string(), weight));
        self.total += weight;
    }
}

/// Weighted reward scheme
#[derive(Debug, Clone, Default)]
pub struct RewardModel {
    weights: RewardWeights,
}

impl RewardModel {
    pub fn new(weights: RewardWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    /// Remedies that count as correct for a health band
    pub fn expected_remedies(band: HealthBand) -> &'static [Action] {
        match band {
            HealthBand::Healthy => &[Action::ScaleDown],
            HealthBand::Degraded => &[Action::ScaleUp],
            HealthBand::Failing => &[Action::Restart, Action::ScaleUp],
        }
    }

    /// Total reward for an observed transition
    pub fn reward(
        &self,
        state: &InternalState,
        action: Action,
        next_state: Option<&InternalState>,
        outcome: &OutcomeObservation,
    ) -> f64 {
        self.breakdown(state, action, next_state, outcome).total
    }

    /// Reward with every contributing weight named
    pub fn breakdown(
        &self,
        state: &InternalState,
        action: Action,
        next_state: Option<&InternalState>,
        outcome: &OutcomeObservation,
    ) -> RewardBreakdown {
        let w = &self.weights;
        let mut out = RewardBreakdown {
            components: Vec::new(),
            total: 0.0,
        };

        if action == Action::Noop && state.health_band == HealthBand::Healthy {
            out.push("no_change_needed", w.no_change_needed);
        } else if Self::expected_remedies(state.health_band).contains(&action) {
            out.push("successful_action", w.successful_action);
        } else if action.is_intervention() {
            out.push("failed_action", w.failed_action);
        }

        if !outcome.succeeded {
            out.push("failed_action", w.failed_action);
        }

        if outcome.downgraded {
            out.push("unsafe_action", w.unsafe_action);
        }

        if let Some(next) = next_state {
            if let (Some(before), Some(after)) =
                (state.latency_bucket.rank(), next.latency_bucket.rank())
            {
                if after < before {
                    out.push("latency_improvement", w.latency_improvement);
                }
            }
            if next.recent_failures_bucket < state.recent_failures_bucket {
                out.push("error_reduction", w.error_reduction);
            }
        }

        if action.is_intervention() {
            out.push("time_penalty", w.time_penalty);
        }

        out
    }
}
