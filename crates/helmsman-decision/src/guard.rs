//! Safety guard
//!
//! Final word on what may execute. Each environment has a whitelist of
//! actions; anything outside it is downgraded to NOOP regardless of how
//! confident the policy was.

use helmsman_common::{Action, Environment, SafetyTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Outcome of enforcing the whitelist on a candidate action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enforcement {
    /// Action allowed to execute
    pub action: Action,
    /// What the policy recommended
    pub candidate: Action,
    pub env: Environment,
    pub downgraded: bool,
}

impl Enforcement {
    /// Human-readable downgrade note, if any
    pub fn reason(&self) -> Option<String> {
        self.downgraded.then(|| {
            format!(
                "{} is not permitted in {}, downgraded to {}",
                self.candidate, self.env, self.action
            )
        })
    }
}

/// Per-environment action whitelist enforcer
#[derive(Debug, Clone, Default)]
pub struct SafetyGuard {
    table: SafetyTable,
}

impl SafetyGuard {
    pub fn new(table: SafetyTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SafetyTable {
        &self.table
    }

    /// Actions permitted in `env`
    pub fn permitted(&self, env: Environment) -> &[Action] {
        self.table.permitted(env)
    }

    pub fn permits(&self, env: Environment, action: Action) -> bool {
        // NOOP can never be refused, even by a misconfigured table
        action == Action::Noop || self.permitted(env).contains(&action)
    }

    /// Pass `candidate` through or downgrade it to NOOP
    pub fn enforce(&self, env: Environment, candidate: Action) -> Enforcement {
        if self.permits(env, candidate) {
            debug!(env = %env, action = %candidate, "Action permitted");
            return Enforcement {
                action: candidate,
                candidate,
                env,
                downgraded: false,
            };
        }

        warn!(
            env = %env,
            candidate = %candidate,
            "Action not permitted, downgrading to NOOP"
        );

        Enforcement {
            action: Action::Noop,
            candidate,
            env,
            downgraded: true,
        }
    }
}
