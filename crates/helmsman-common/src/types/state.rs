//! Discretized internal state used as the policy lookup key
//!
//! Every field is drawn from a small finite set (apart from the app id,
//! which is bounded by the size of the fleet), so the policy table stays
//! enumerable no matter what raw telemetry arrives.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::environment::{Environment, HealthBand};

/// Latency bucket derived from `latency_ms`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LatencyBucket {
    Low,
    Medium,
    High,
    /// No usable latency was reported
    Unknown,
}

impl LatencyBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            LatencyBucket::Low => "low",
            LatencyBucket::Medium => "medium",
            LatencyBucket::High => "high",
            LatencyBucket::Unknown => "unknown",
        }
    }

    /// Rank used to compare two observations; `Unknown` has no rank
    pub fn rank(&self) -> Option<u8> {
        match self {
            LatencyBucket::Low => Some(0),
            LatencyBucket::Medium => Some(1),
            LatencyBucket::High => Some(2),
            LatencyBucket::Unknown => None,
        }
    }
}

impl fmt::Display for LatencyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucketed count of recent failures (0, 1 or 2)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "u8", into = "u8")]
pub struct FailureBucket(u8);

impl FailureBucket {
    /// No or unreported failures
    pub const NONE: FailureBucket = FailureBucket(0);
    /// A few failures
    pub const SOME: FailureBucket = FailureBucket(1);
    /// Many failures
    pub const MANY: FailureBucket = FailureBucket(2);

    /// Highest bucket index
    pub const MAX: u8 = 2;

    /// Build a bucket, saturating at [`FailureBucket::MAX`]
    pub fn new(index: u8) -> Self {
        Self(index.min(Self::MAX))
    }

    #[inline]
    pub fn index(&self) -> u8 {
        self.0
    }
}

impl From<u8> for FailureBucket {
    fn from(index: u8) -> Self {
        Self::new(index)
    }
}

impl From<FailureBucket> for u8 {
    fn from(bucket: FailureBucket) -> Self {
        bucket.0
    }
}

impl fmt::Display for FailureBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bucket{}", self.0)
    }
}

/// Internal state key: `(app_id, env, health_band, latency_bucket, recent_failures_bucket)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InternalState {
    pub app_id: String,
    pub env: Environment,
    pub health_band: HealthBand,
    pub latency_bucket: LatencyBucket,
    pub recent_failures_bucket: FailureBucket,
}

impl InternalState {
    pub fn new(
        app_id: impl Into<String>,
        env: Environment,
        health_band: HealthBand,
        latency_bucket: LatencyBucket,
        recent_failures_bucket: FailureBucket,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            env,
            health_band,
            latency_bucket,
            recent_failures_bucket,
        }
    }
}

impl fmt::Display for InternalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {})",
            self.app_id, self.env, self.health_band, self.latency_bucket, self.recent_failures_bucket
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_bucket_saturates() {
        assert_eq!(FailureBucket::new(7), FailureBucket::MANY);
        assert_eq!(FailureBucket::new(1).index(), 1);
        assert_eq!(FailureBucket::default(), FailureBucket::NONE);
    }

    #[test]
    fn test_state_display() {
        let state = InternalState::new(
            "api-service",
            Environment::Prod,
            HealthBand::Degraded,
            LatencyBucket::Medium,
            FailureBucket::MANY,
        );
        assert_eq!(state.to_string(), "(api-service, prod, degraded, medium, bucket2)");
    }

    #[test]
    fn test_state_serializes_flat() {
        let state = InternalState::new(
            "x",
            Environment::Dev,
            HealthBand::Failing,
            LatencyBucket::Unknown,
            FailureBucket::SOME,
        );
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["env"], "dev");
        assert_eq!(json["latency_bucket"], "unknown");
        assert_eq!(json["recent_failures_bucket"], 1);
    }

    #[test]
    fn test_latency_rank() {
        assert!(LatencyBucket::Low.rank() < LatencyBucket::High.rank());
        assert_eq!(LatencyBucket::Unknown.rank(), None);
    }
}
