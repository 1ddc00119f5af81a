//! # Helmsman Decision
//!
//! Decision layer between runtime telemetry and an orchestrator that
//! executes remediation actions.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     DecisionBridge                       │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────────────┐  │
//! │  │ Validator  │─►│  Adapter   │─►│  ActionPolicy      │  │
//! │  │ (contract) │  │ (buckets)  │  │  (ε-greedy Q-table)│  │
//! │  └─────┬──────┘  └────────────┘  └─────────┬──────────┘  │
//! │        │ NOOP                              │ candidate   │
//! │        ▼                                   ▼             │
//! │  ┌────────────┐                   ┌────────────────────┐ │
//! │  │  Journal   │◄──── downgrade ───│    SafetyGuard     │ │
//! │  └────────────┘                   └─────────┬──────────┘ │
//! └─────────────────────────────────────────────┼────────────┘
//!                                               ▼
//!                                            Decision
//! ```
//!
//! Learning happens only through [`DecisionBridge::feedback`].

pub mod adapter;
pub mod bridge;
pub mod guard;
pub mod policy;
pub mod reasoning;
pub mod validator;

pub use adapter::StateAdapter;
pub use bridge::{DecisionBridge, FeedbackError, FeedbackReceipt};
pub use guard::{Enforcement, SafetyGuard};
pub use policy::{
    ActionPolicy, ActionValues, OutcomeObservation, PolicyEngine, PolicySnapshot, PolicySummary,
    RewardBreakdown, RewardModel, Selection, SelectionMode, SnapshotEntry, ValueTable,
};
pub use validator::{validate, ValidatedEvent, ValidationFailure, REQUIRED_FIELDS};

pub use helmsman_common::{Action, Decision, Environment, HealthBand, InternalState};
