//! Runtime state adapter
//!
//! Discretizes a validated event into the [`InternalState`] key. Raw
//! numbers never leak into the key beyond their bucket, which keeps the
//! policy table finite.

use helmsman_common::{BucketConfig, FailureBucket, InternalState, LatencyBucket};

use crate::validator::ValidatedEvent;

/// Deterministic event → state conversion
#[derive(Debug, Clone, Default)]
pub struct StateAdapter {
    buckets: BucketConfig,
}

impl StateAdapter {
    pub fn new(buckets: BucketConfig) -> Self {
        Self { buckets }
    }

    pub fn buckets(&self) -> &BucketConfig {
        &self.buckets
    }

    /// Pure, total and deterministic
    pub fn adapt(&self, event: &ValidatedEvent) -> InternalState {
        InternalState {
            app_id: event.app().to_string(),
            env: event.env(),
            health_band: event.health(),
            latency_bucket: self.latency_bucket(event.latency_ms()),
            recent_failures_bucket: self.failure_bucket(event.errors_last_min()),
        }
    }

    pub fn latency_bucket(&self, latency_ms: Option<f64>) -> LatencyBucket {
        match latency_ms {
            None => LatencyBucket::Unknown,
            Some(ms) if ms < self.buckets.latency_low_ms => LatencyBucket::Low,
            Some(ms) if ms < self.buckets.latency_high_ms => LatencyBucket::Medium,
            Some(_) => LatencyBucket::High,
        }
    }

    pub fn failure_bucket(&self, errors: Option<u64>) -> FailureBucket {
        match errors.unwrap_or(0) {
            n if n < self.buckets.failures_some_min => FailureBucket::NONE,
            n if n < self.buckets.failures_many_min => FailureBucket::SOME,
            _ => FailureBucket::MANY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;
    use helmsman_common::{Environment, HealthBand};
    use serde_json::json;

    #[test]
    fn test_latency_thresholds() {
        let adapter = StateAdapter::default();
        assert_eq!(adapter.latency_bucket(None), LatencyBucket::Unknown);
        assert_eq!(adapter.latency_bucket(Some(0.0)), LatencyBucket::Low);
        assert_eq!(adapter.latency_bucket(Some(99.9)), LatencyBucket::Low);
        assert_eq!(adapter.latency_bucket(Some(100.0)), LatencyBucket::Medium);
        assert_eq!(adapter.latency_bucket(Some(499.0)), LatencyBucket::Medium);
        assert_eq!(adapter.latency_bucket(Some(500.0)), LatencyBucket::High);
        assert_eq!(adapter.latency_bucket(Some(2000.0)), LatencyBucket::High);
    }

    #[test]
    fn test_failure_buckets() {
        let adapter = StateAdapter::default();
        assert_eq!(adapter.failure_bucket(None), FailureBucket::NONE);
        assert_eq!(adapter.failure_bucket(Some(0)), FailureBucket::NONE);
        assert_eq!(adapter.failure_bucket(Some(1)), FailureBucket::SOME);
        assert_eq!(adapter.failure_bucket(Some(2)), FailureBucket::SOME);
        assert_eq!(adapter.failure_bucket(Some(3)), FailureBucket::MANY);
        assert_eq!(adapter.failure_bucket(Some(10_000)), FailureBucket::MANY);
    }

    #[test]
    fn test_custom_thresholds() {
        let adapter = StateAdapter::new(BucketConfig {
            latency_low_ms: 200.0,
            latency_high_ms: 800.0,
            failures_some_min: 5,
            failures_many_min: 10,
        });
        assert_eq!(adapter.latency_bucket(Some(150.0)), LatencyBucket::Low);
        assert_eq!(adapter.latency_bucket(Some(600.0)), LatencyBucket::Medium);
        assert_eq!(adapter.failure_bucket(Some(4)), FailureBucket::NONE);
        assert_eq!(adapter.failure_bucket(Some(9)), FailureBucket::SOME);
    }

    #[test]
    fn test_degraded_prod_event() {
        let event = validate(&json!({
            "app": "api-service",
            "env": "prod",
            "state": "degraded",
            "latency_ms": 450,
            "errors_last_min": 5
        }))
        .unwrap();

        let state = StateAdapter::default().adapt(&event);
        assert_eq!(
            state,
            InternalState::new(
                "api-service",
                Environment::Prod,
                HealthBand::Degraded,
                LatencyBucket::Medium,
                FailureBucket::MANY,
            )
        );
    }

    #[test]
    fn test_missing_telemetry_is_not_an_error() {
        let event = validate(&json!({"app": "x", "env": "dev", "state": "healthy"})).unwrap();
        let state = StateAdapter::default().adapt(&event);
        assert_eq!(state.latency_bucket, LatencyBucket::Unknown);
        assert_eq!(state.recent_failures_bucket, FailureBucket::NONE);
    }

    #[test]
    fn test_adapt_is_deterministic() {
        let event = validate(&json!({
            "app": "x",
            "env": "stage",
            "state": "failing",
            "latency_ms": 730.5,
            "errors_last_min": 2
        }))
        .unwrap();

        let adapter = StateAdapter::default();
        assert_eq!(adapter.adapt(&event), adapter.adapt(&event));
    }
}
