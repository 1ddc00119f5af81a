//! Remediation actions the orchestrator can execute
//!
//! The action space is closed and small on purpose: the policy table is
//! keyed by `(InternalState, Action)` and must stay fully enumerable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Remediation action
///
/// Variants are declared in priority order. Tie-breaking during greedy
/// selection prefers the earliest variant, so `Noop` wins every tie.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Leave the service as it is
    Noop,
    /// Add capacity
    ScaleUp,
    /// Remove capacity
    ScaleDown,
    /// Restart the service
    Restart,
}

impl Action {
    /// Every action, in tie-break priority order
    pub const ALL: [Action; 4] = [
        Action::Noop,
        Action::ScaleUp,
        Action::ScaleDown,
        Action::Restart,
    ];

    /// Number of actions in the space
    pub const COUNT: usize = Self::ALL.len();

    /// Tie-break priority (lower wins)
    #[inline]
    pub fn priority(&self) -> usize {
        *self as usize
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Noop => "NOOP",
            Action::ScaleUp => "SCALE_UP",
            Action::ScaleDown => "SCALE_DOWN",
            Action::Restart => "RESTART",
        }
    }

    /// Whether this action changes the running service
    #[inline]
    pub fn is_intervention(&self) -> bool {
        !matches!(self, Action::Noop)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown action name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let priorities: Vec<usize> = Action::ALL.iter().map(Action::priority).collect();
        assert_eq!(priorities, vec![0, 1, 2, 3]);
        assert!(Action::Noop < Action::Restart);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Action::ScaleUp).unwrap(), "\"SCALE_UP\"");
        assert_eq!("SCALE_DOWN".parse::<Action>().unwrap(), Action::ScaleDown);
        assert!("scale_down".parse::<Action>().is_err());
        assert!("ROLLBACK".parse::<Action>().is_err());
    }

    #[test]
    fn test_intervention() {
        assert!(!Action::Noop.is_intervention());
        assert!(Action::Restart.is_intervention());
    }
}
