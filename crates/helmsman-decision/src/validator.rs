//! Runtime contract validator
//!
//! The trust boundary between telemetry sources and the decision logic.
//! Only the three required fields can fail validation; optional numeric
//! telemetry that is malformed is dropped rather than rejecting the event.

use helmsman_common::{Environment, HealthBand};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Required payload fields, in the order they are checked
pub const REQUIRED_FIELDS: [&str; 3] = ["app", "env", "state"];

/// Contract violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("Payload must be a JSON object")]
    NotAMapping,

    #[error("Payload is empty")]
    EmptyPayload,

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Field {field} must be a string")]
    WrongType { field: &'static str },

    #[error("App name cannot be empty")]
    EmptyApp,

    #[error("Invalid env '{value}'. Must be one of: dev, stage, prod")]
    InvalidEnv { value: String },

    #[error("Invalid state '{value}'. Must be one of: healthy, degraded, failing")]
    InvalidState { value: String },
}

impl ValidationFailure {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationFailure::NotAMapping
            | ValidationFailure::EmptyPayload
            | ValidationFailure::MissingField { .. } => "incomplete_data",
            ValidationFailure::EmptyApp | ValidationFailure::WrongType { field: "app" } => {
                "invalid_app"
            }
            ValidationFailure::InvalidEnv { .. } | ValidationFailure::WrongType { field: "env" } => {
                "invalid_env"
            }
            ValidationFailure::InvalidState { .. } | ValidationFailure::WrongType { .. } => {
                "unknown_state"
            }
        }
    }
}

/// Runtime event that satisfied the contract
///
/// Only [`validate`] can build one.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEvent {
    app: String,
    env: Environment,
    health: HealthBand,
    latency_ms: Option<f64>,
    workers: Option<u64>,
    errors_last_min: Option<u64>,
}

impl ValidatedEvent {
    /// Trimmed, non-empty application name
    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn env(&self) -> Environment {
        self.env
    }

    pub fn health(&self) -> HealthBand {
        self.health
    }

    /// Reported latency, if it was a non-negative number
    pub fn latency_ms(&self) -> Option<f64> {
        self.latency_ms
    }

    /// Reported worker count, if it was a non-negative number
    pub fn workers(&self) -> Option<u64> {
        self.workers
    }

    /// Reported error count (negative values clamp to 0)
    pub fn errors_last_min(&self) -> Option<u64> {
        self.errors_last_min
    }
}

/// Validate a raw runtime payload
pub fn validate(raw: &Value) -> Result<ValidatedEvent, ValidationFailure> {
    let result = check(raw);
    match &result {
        Ok(event) => debug!(app = %event.app, env = %event.env, "Contract validation passed"),
        Err(failure) => warn!(code = failure.code(), "Contract validation failed: {}", failure),
    }
    result
}

fn check(raw: &Value) -> Result<ValidatedEvent, ValidationFailure> {
    let obj = raw.as_object().ok_or(ValidationFailure::NotAMapping)?;
    if obj.is_empty() {
        return Err(ValidationFailure::EmptyPayload);
    }

    let app = required_str(obj, "app")?.trim();
    if app.is_empty() {
        return Err(ValidationFailure::EmptyApp);
    }

    let env_raw = required_str(obj, "env")?;
    let env = Environment::parse(env_raw.trim()).ok_or_else(|| ValidationFailure::InvalidEnv {
        value: env_raw.to_string(),
    })?;

    let state_raw = required_str(obj, "state")?;
    let health =
        HealthBand::parse(state_raw.trim()).ok_or_else(|| ValidationFailure::InvalidState {
            value: state_raw.to_string(),
        })?;

    Ok(ValidatedEvent {
        app: app.to_string(),
        env,
        health,
        latency_ms: optional_number(obj, "latency_ms").filter(|v| *v >= 0.0),
        workers: optional_number(obj, "workers")
            .filter(|v| *v >= 0.0)
            .map(|v| v as u64),
        errors_last_min: optional_number(obj, "errors_last_min").map(|v| v.max(0.0) as u64),
    })
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationFailure> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationFailure::MissingField { field }),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationFailure::WrongType { field }),
    }
}

/// Numeric telemetry: anything that is not a finite JSON number is absent
fn optional_number(obj: &Map<String, Value>, field: &str) -> Option<f64> {
    obj.get(field)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
}
