//! Decision record handed to the orchestrator
//!
//! The serialized form has exactly the fields `action`, `app_id`, `env`,
//! `confidence`, `reasoning`, `safe_for_execution` and `timestamp`
//! (RFC 3339). Every constructor sets `safe_for_execution = true`: unsafe
//! candidates are downgraded before a decision is built, never flagged.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::action::Action;
use super::environment::Environment;

/// Confidence attached to fallback decisions
pub const FALLBACK_CONFIDENCE: f64 = 0.0;

/// Explainable remediation decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Action the orchestrator should execute
    pub action: Action,
    /// Application the decision applies to (`None` if the event was unusable)
    pub app_id: Option<String>,
    /// Environment the decision applies to (`None` if the event was unusable)
    pub env: Option<Environment>,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Human-readable explanation
    pub reasoning: String,
    /// Always true for decisions produced by the core
    pub safe_for_execution: bool,
    /// When the decision was made
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    /// Decision produced by the full pipeline
    pub fn new(
        action: Action,
        app_id: impl Into<String>,
        env: Environment,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            action,
            app_id: Some(app_id.into()),
            env: Some(env),
            confidence: clamp_confidence(confidence),
            reasoning: reasoning.into(),
            safe_for_execution: true,
            timestamp: Utc::now(),
        }
    }

    /// Conservative NOOP used whenever the pipeline cannot decide
    pub fn safe_noop(
        app_id: Option<String>,
        env: Option<Environment>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            action: Action::Noop,
            app_id,
            env,
            confidence: FALLBACK_CONFIDENCE,
            reasoning: reasoning.into(),
            safe_for_execution: true,
            timestamp: Utc::now(),
        }
    }

    /// ISO-8601 rendering of the timestamp
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        FALLBACK_CONFIDENCE
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
