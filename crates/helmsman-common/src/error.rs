//! Error types for the Helmsman decision layer
//!
//! Provides a unified error type and domain-specific error variants.
//! None of these ever reach the orchestrator as a failure: the decision
//! bridge turns every one of them into a safe NOOP decision.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using HelmsmanError
pub type Result<T> = std::result::Result<T, HelmsmanError>;

/// Unified error type for Helmsman operations
#[derive(Debug, Error)]
pub enum HelmsmanError {
    // Policy engine errors
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    // Snapshot persistence errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Policy engine errors
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Reward must be finite, got {0}")]
    InvalidReward(f64),

    #[error("Stored value for {state} / {action} is not finite")]
    CorruptValue { state: String, action: String },

    #[error("Policy collaborator failed: {0}")]
    Collaborator(String),
}

/// Snapshot persistence errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Snapshot not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Snapshot I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot is corrupt: {0}")]
    Corrupt(String),

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("No snapshot path configured")]
    NoPath,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be within {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        range: &'static str,
        value: f64,
    },

    #[error("Invalid thresholds for {field}: {reason}")]
    InvalidThresholds { field: &'static str, reason: String },

    #[error("Safety table for {env} must permit NOOP")]
    NoopNotPermitted { env: String },

    #[error("Failed to load configuration: {0}")]
    Load(String),
}

// Implement From for common external error types
impl From<serde_json::Error> for HelmsmanError {
    fn from(err: serde_json::Error) -> Self {
        HelmsmanError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Corrupt(err.to_string())
    }
}

impl From<anyhow::Error> for HelmsmanError {
    fn from(err: anyhow::Error) -> Self {
        HelmsmanError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HelmsmanError::Policy(PolicyError::InvalidReward(f64::NAN));
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn test_persistence_error() {
        let err = PersistenceError::UnsupportedVersion {
            found: 9,
            expected: 1,
        };
        assert!(err.to_string().contains("version 9"));

        let err = PersistenceError::NotFound(PathBuf::from("/tmp/policy.json"));
        assert!(err.to_string().contains("/tmp/policy.json"));
    }

    #[test]
    fn test_config_error() {
        let err = ConfigError::NoopNotPermitted {
            env: "prod".to_string(),
        };
        assert!(err.to_string().contains("prod"));
    }
}
