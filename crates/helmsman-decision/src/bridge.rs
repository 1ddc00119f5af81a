//! Decision bridge
//!
//! Single entry point for the orchestrator:
//!
//! ```text
//! raw event ──► validate ──► adapt ──► select ──► enforce ──► Decision
//!                  │                      │
//!                  └── NOOP (contract)    └── NOOP (internal fault)
//! ```
//!
//! `process` never fails and never mutates learned values. `feedback` is
//! the only way the policy learns.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use helmsman_common::{
    Action, Decision, DecisionJournal, Environment, HelmsmanConfig, InternalState, JournalEntry,
    JournalKind, PolicyError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::adapter::StateAdapter;
use crate::guard::SafetyGuard;
use crate::policy::{ActionPolicy, OutcomeObservation, PolicyEngine, RewardModel};
use crate::reasoning;
use crate::validator::{self, ValidationFailure};

/// Factor applied to the candidate's confidence when the guard downgrades it
pub const DOWNGRADE_CONFIDENCE_SCALE: f64 = 0.5;

/// Feedback that could not be applied
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Previous event rejected: {0}")]
    InvalidPrevious(ValidationFailure),

    #[error("Next event rejected: {0}")]
    InvalidNext(ValidationFailure),

    #[error("Next event belongs to {found}, expected {expected}")]
    MismatchedService { expected: String, found: String },

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("Policy update failed: {0}")]
    Fault(String),
}

/// Applied learning update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReceipt {
    pub state: InternalState,
    pub action: Action,
    pub reward: f64,
    pub next_state: Option<InternalState>,
    /// Value of `(state, action)` after the update
    pub value: f64,
}

/// Validate → adapt → select → enforce, with safe fallbacks
pub struct DecisionBridge {
    adapter: StateAdapter,
    policy: Arc<dyn ActionPolicy>,
    guard: SafetyGuard,
    journal: Arc<DecisionJournal>,
    rewards: RewardModel,
}

impl DecisionBridge {
    /// Bridge over `policy` with default buckets, safety tables and rewards
    pub fn new(policy: Arc<dyn ActionPolicy>) -> Self {
        Self {
            adapter: StateAdapter::default(),
            policy,
            guard: SafetyGuard::default(),
            journal: Arc::new(DecisionJournal::default()),
            rewards: RewardModel::default(),
        }
    }

    /// Fully configured bridge over a [`PolicyEngine`] resumed from its snapshot
    pub fn from_config(cfg: &HelmsmanConfig) -> helmsman_common::Result<Self> {
        cfg.validate()?;

        let engine = PolicyEngine::from_config(cfg);
        info!(
            states = engine.summary().total_states,
            epsilon = engine.epsilon(),
            "Decision bridge initialized"
        );

        Ok(Self::new(Arc::new(engine))
            .with_adapter(StateAdapter::new(cfg.buckets.clone()))
            .with_guard(SafetyGuard::new(cfg.safety.clone()))
            .with_journal(Arc::new(DecisionJournal::new(cfg.journal.capacity)))
            .with_rewards(RewardModel::new(cfg.rewards.clone())))
    }

    pub fn with_adapter(mut self, adapter: StateAdapter) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn with_guard(mut self, guard: SafetyGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_journal(mut self, journal: Arc<DecisionJournal>) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_rewards(mut self, rewards: RewardModel) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn policy(&self) -> &Arc<dyn ActionPolicy> {
        &self.policy
    }

    pub fn journal(&self) -> &Arc<DecisionJournal> {
        &self.journal
    }

    pub fn guard(&self) -> &SafetyGuard {
        &self.guard
    }

    pub fn adapter(&self) -> &StateAdapter {
        &self.adapter
    }

    pub fn rewards(&self) -> &RewardModel {
        &self.rewards
    }

    /// Internal state a raw event maps to
    pub fn state_for(&self, raw: &Value) -> Result<InternalState, ValidationFailure> {
        validator::validate(raw).map(|event| self.adapter.adapt(&event))
    }

    /// Turn a raw runtime event into a decision; never fails
    #[instrument(skip(self, raw))]
    pub fn process(&self, raw: &Value) -> Decision {
        match panic::catch_unwind(AssertUnwindSafe(|| self.decide(raw))) {
            Ok(Ok(decision)) => decision,
            Ok(Err(err)) => self.fallback(raw, &err.to_string()),
            Err(payload) => self.fallback(raw, &panic_message(payload.as_ref())),
        }
    }

    fn decide(&self, raw: &Value) -> Result<Decision, PolicyError> {
        let event = match validator::validate(raw) {
            Ok(event) => event,
            Err(failure) => return Ok(self.reject(raw, &failure)),
        };

        let state = self.adapter.adapt(&event);
        let selection = self.policy.select(&state)?;
        let enforcement = self.guard.enforce(state.env, selection.action);

        if enforcement.downgraded {
            let entry = JournalEntry::new(
                JournalKind::SafetyDowngrade,
                enforcement.reason().unwrap_or_default(),
            )
            .with_app(&state.app_id)
            .with_env(state.env)
            .with_code("unsafe_action")
            .with_original_action(enforcement.candidate);
            self.journal.record(entry);
        }

        let reasoning = reasoning::explain(&state, &selection, &enforcement);

        debug!(
            app = %state.app_id,
            env = %state.env,
            action = %enforcement.action,
            downgraded = enforcement.downgraded,
            "Decision made"
        );

        let confidence = if enforcement.downgraded {
            selection.confidence * DOWNGRADE_CONFIDENCE_SCALE
        } else {
            selection.confidence
        };

        Ok(Decision::new(
            enforcement.action,
            state.app_id,
            state.env,
            confidence,
            reasoning,
        ))
    }

    fn reject(&self, raw: &Value, failure: &ValidationFailure) -> Decision {
        let (app_id, env) = partial_identity(raw);

        let mut entry = JournalEntry::new(JournalKind::ContractViolation, failure.to_string())
            .with_code(failure.code());
        if let Some(app) = &app_id {
            entry = entry.with_app(app);
        }
        if let Some(env) = env {
            entry = entry.with_env(env);
        }
        self.journal.record(entry);

        Decision::safe_noop(app_id, env, reasoning::contract_violation(failure))
    }

    fn fallback(&self, raw: &Value, detail: &str) -> Decision {
        let (app_id, env) = partial_identity(raw);

        error!(error = %detail, "Decision pipeline failed, applying safe fallback");

        let mut entry = JournalEntry::new(JournalKind::InternalFault, detail)
            .with_code("internal_error");
        if let Some(app) = &app_id {
            entry = entry.with_app(app);
        }
        if let Some(env) = env {
            entry = entry.with_env(env);
        }
        self.journal.record(entry);

        Decision::safe_noop(app_id, env, reasoning::internal_fault(detail))
    }

    /// Apply an observed reward for `action` taken in `previous`
    ///
    /// `next = None` marks a terminal transition.
    #[instrument(skip(self, previous, next))]
    pub fn feedback(
        &self,
        previous: &Value,
        action: Action,
        reward: f64,
        next: Option<&Value>,
    ) -> Result<FeedbackReceipt, FeedbackError> {
        let (state, next_state) = self.transition(previous, next)?;
        self.apply(state, action, reward, next_state)
    }

    /// Like [`feedback`](Self::feedback), with the reward computed by the reward model
    #[instrument(skip(self, previous, outcome, next))]
    pub fn feedback_with_outcome(
        &self,
        previous: &Value,
        action: Action,
        outcome: &OutcomeObservation,
        next: Option<&Value>,
    ) -> Result<FeedbackReceipt, FeedbackError> {
        let (state, next_state) = self.transition(previous, next)?;
        let reward = self
            .rewards
            .reward(&state, action, next_state.as_ref(), outcome);
        self.apply(state, action, reward, next_state)
    }

    /// Save the policy to its configured location; fail-soft
    pub fn persist(&self) -> bool {
        self.policy.persist()
    }

    fn transition(
        &self,
        previous: &Value,
        next: Option<&Value>,
    ) -> Result<(InternalState, Option<InternalState>), FeedbackError> {
        let state = self
            .state_for(previous)
            .map_err(FeedbackError::InvalidPrevious)?;

        let next_state = match next {
            Some(raw) => {
                let next_state = self.state_for(raw).map_err(FeedbackError::InvalidNext)?;
                if next_state.app_id != state.app_id || next_state.env != state.env {
                    return Err(FeedbackError::MismatchedService {
                        expected: format!("{}/{}", state.app_id, state.env),
                        found: format!("{}/{}", next_state.app_id, next_state.env),
                    });
                }
                Some(next_state)
            }
            None => None,
        };

        Ok((state, next_state))
    }

    fn apply(
        &self,
        state: InternalState,
        action: Action,
        reward: f64,
        next_state: Option<InternalState>,
    ) -> Result<FeedbackReceipt, FeedbackError> {
        let value = panic::catch_unwind(AssertUnwindSafe(|| {
            self.policy.update(&state, action, reward, next_state.as_ref())
        }))
        .map_err(|payload| FeedbackError::Fault(panic_message(payload.as_ref())))??;

        info!(
            app = %state.app_id,
            env = %state.env,
            action = %action,
            reward,
            value,
            "Feedback applied"
        );

        Ok(FeedbackReceipt {
            state,
            action,
            reward,
            next_state,
            value,
        })
    }
}

/// Best-effort app and env from a payload that may be invalid
fn partial_identity(raw: &Value) -> (Option<String>, Option<Environment>) {
    let app = raw
        .get("app")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|app| !app.is_empty())
        .map(str::to_string);
    let env = raw
        .get("env")
        .and_then(Value::as_str)
        .and_then(|env| Environment::parse(env.trim()));
    (app, env)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("policy panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("policy panicked: {}", msg)
    } else {
        "policy panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Selection, SelectionMode};
    use helmsman_common::{ConfigError, HelmsmanError, JournalSink, LearningConfig};
    use serde_json::json;

    struct Always(Action);

    impl ActionPolicy for Always {
        fn select(&self, _state: &InternalState) -> Result<Selection, PolicyError> {
            Ok(Selection {
                action: self.0,
                confidence: 0.9,
                mode: SelectionMode::Exploit,
                seen: true,
            })
        }

        fn update(
            &self,
            _state: &InternalState,
            _action: Action,
            _reward: f64,
            _next_state: Option<&InternalState>,
        ) -> Result<f64, PolicyError> {
            Ok(0.0)
        }
    }

    struct Broken;

    impl ActionPolicy for Broken {
        fn select(&self, _state: &InternalState) -> Result<Selection, PolicyError> {
            Err(PolicyError::Collaborator("table unavailable".to_string()))
        }

        fn update(
            &self,
            _state: &InternalState,
            _action: Action,
            _reward: f64,
            _next_state: Option<&InternalState>,
        ) -> Result<f64, PolicyError> {
            Err(PolicyError::Collaborator("table unavailable".to_string()))
        }
    }

    struct Panicking;

    impl ActionPolicy for Panicking {
        fn select(&self, _state: &InternalState) -> Result<Selection, PolicyError> {
            panic!("boom")
        }

        fn update(
            &self,
            _state: &InternalState,
            _action: Action,
            _reward: f64,
            _next_state: Option<&InternalState>,
        ) -> Result<f64, PolicyError> {
            panic!("boom")
        }
    }

    fn scenario() -> Value {
        json!({
            "app": "api-service",
            "env": "prod",
            "state": "degraded",
            "latency_ms": 450,
            "errors_last_min": 5
        })
    }

    #[test]
    fn test_restart_downgraded_in_prod() {
        let bridge = DecisionBridge::new(Arc::new(Always(Action::Restart)));
        let decision = bridge.process(&scenario());

        assert_eq!(decision.action, Action::Noop);
        assert!(decision.safe_for_execution);
        assert_eq!(decision.app_id.as_deref(), Some("api-service"));
        assert_eq!(decision.env, Some(Environment::Prod));
        assert_eq!(decision.confidence, 0.9 * DOWNGRADE_CONFIDENCE_SCALE);
        assert!(decision.reasoning.contains("Policy chose RESTART"));
        assert!(decision.reasoning.contains("confidence 0.90"));
        assert!(decision.reasoning.contains("RESTART is not permitted in prod"));

        let downgrades = bridge.journal().downgrades();
        assert_eq!(downgrades.len(), 1);
        assert_eq!(downgrades[0].original_action, Some(Action::Restart));
        assert_eq!(downgrades[0].final_action, Action::Noop);
    }

    #[test]
    fn test_permitted_action_passes() {
        let bridge = DecisionBridge::new(Arc::new(Always(Action::ScaleUp)));
        let decision = bridge.process(&scenario());
        assert_eq!(decision.action, Action::ScaleUp);
        assert!(bridge.journal().downgrades().is_empty());
    }

    #[test]
    fn test_contract_violation_skips_policy() {
        let bridge = DecisionBridge::new(Arc::new(Panicking));
        let decision = bridge.process(&json!({"app": "x", "env": "Prod", "state": "healthy"}));

        assert_eq!(decision.action, Action::Noop);
        assert_eq!(decision.app_id.as_deref(), Some("x"));
        assert_eq!(decision.env, None);
        assert!(decision.reasoning.contains("invalid_env"));

        let blocked = bridge.journal().blocked_actions();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].kind, JournalKind::ContractViolation);
        assert_eq!(blocked[0].code.as_deref(), Some("invalid_env"));
    }

    #[test]
    fn test_policy_error_falls_back() {
        let bridge = DecisionBridge::new(Arc::new(Broken));
        let decision = bridge.process(&scenario());

        assert_eq!(decision.action, Action::Noop);
        assert!(decision
            .reasoning
            .starts_with("internal error, safe fallback applied: "));
        assert!(decision.reasoning.contains("table unavailable"));
        assert_eq!(decision.env, Some(Environment::Prod));
        assert_eq!(
            bridge.journal().blocked_actions()[0].kind,
            JournalKind::InternalFault
        );
    }

    #[test]
    fn test_policy_panic_falls_back() {
        let bridge = DecisionBridge::new(Arc::new(Panicking));
        let decision = bridge.process(&scenario());

        assert_eq!(decision.action, Action::Noop);
        assert!(decision.reasoning.contains("policy panicked: boom"));

        let err = bridge
            .feedback(&scenario(), Action::ScaleUp, 1.0, None)
            .unwrap_err();
        assert!(matches!(err, FeedbackError::Fault(_)));
    }

    #[test]
    fn test_feedback_errors() {
        let bridge = DecisionBridge::new(Arc::new(Broken));

        assert!(matches!(
            bridge.feedback(&json!([]), Action::Noop, 1.0, None),
            Err(FeedbackError::InvalidPrevious(ValidationFailure::NotAMapping))
        ));

        let other = json!({"app": "other", "env": "prod", "state": "healthy"});
        assert!(matches!(
            bridge.feedback(&scenario(), Action::Noop, 1.0, Some(&other)),
            Err(FeedbackError::MismatchedService { .. })
        ));

        assert!(matches!(
            bridge.feedback(&scenario(), Action::Noop, 1.0, None),
            Err(FeedbackError::Policy(PolicyError::Collaborator(_)))
        ));
    }

    #[test]
    fn test_feedback_with_outcome_uses_reward_model() {
        let engine = Arc::new(PolicyEngine::new(LearningConfig {
            epsilon: 0.0,
            ..LearningConfig::default()
        }));
        let bridge = DecisionBridge::new(engine.clone());

        let previous = json!({"app": "svc", "env": "dev", "state": "failing", "errors_last_min": 10});
        let next = json!({"app": "svc", "env": "dev", "state": "healthy", "errors_last_min": 0});

        let receipt = bridge
            .feedback_with_outcome(
                &previous,
                Action::Restart,
                &OutcomeObservation::default(),
                Some(&next),
            )
            .unwrap();

        // successful_action + error_reduction + time_penalty
        assert_eq!(receipt.reward, 5.0 + 15.0 - 1.0);
        assert!(receipt.value > 0.0);
        assert_eq!(engine.updates(), 1);
    }

    #[test]
    fn test_permitted_action_keeps_confidence() {
        let bridge = DecisionBridge::new(Arc::new(Always(Action::ScaleUp)));
        assert_eq!(bridge.process(&scenario()).confidence, 0.9);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut cfg = HelmsmanConfig::default();
        cfg.safety.prod = vec![Action::ScaleUp];
        assert!(matches!(
            DecisionBridge::from_config(&cfg),
            Err(HelmsmanError::Config(ConfigError::NoopNotPermitted { .. }))
        ));
    }

    struct PanickingSink;

    impl JournalSink for PanickingSink {
        fn write(&self, _entry: &JournalEntry) {
            panic!("sink unavailable")
        }
    }

    fn bridge_with_panicking_sink(policy: Arc<dyn ActionPolicy>) -> DecisionBridge {
        let mut journal = DecisionJournal::new(8);
        journal.add_sink(Box::new(PanickingSink));
        DecisionBridge::new(policy).with_journal(Arc::new(journal))
    }

    #[test]
    fn test_panicking_sink_never_escapes_process() {
        let bridge = bridge_with_panicking_sink(Arc::new(Always(Action::Restart)));

        let rejected = panic::catch_unwind(AssertUnwindSafe(|| {
            bridge.process(&json!({"app": "", "env": "stage", "state": "healthy"}))
        }));
        let rejected = rejected.expect("process must return a decision");
        assert_eq!(rejected.action, Action::Noop);
        assert!(rejected.reasoning.contains("invalid_app"));

        let downgraded = panic::catch_unwind(AssertUnwindSafe(|| bridge.process(&scenario())))
            .expect("process must return a decision");
        assert_eq!(downgraded.action, Action::Noop);
        assert!(downgraded.reasoning.contains("downgraded to NOOP"));

        assert_eq!(bridge.journal().blocked_actions().len(), 1);
        assert_eq!(bridge.journal().downgrades().len(), 1);
    }

    #[test]
    fn test_panicking_sink_with_faulty_policy() {
        let bridge = bridge_with_panicking_sink(Arc::new(Panicking));
        let decision = panic::catch_unwind(AssertUnwindSafe(|| bridge.process(&scenario())))
            .expect("process must return a decision");
        assert!(decision
            .reasoning
            .starts_with("internal error, safe fallback applied: "));
    }
}
