//! Deployment environments and health bands reported by telemetry

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deployment environment
///
/// Parsing is case-sensitive: `"Prod"` is not an environment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Stage,
    Prod,
}

impl Environment {
    pub const ALL: [Environment; 3] = [Environment::Dev, Environment::Stage, Environment::Prod];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Stage => "stage",
            Environment::Prod => "prod",
        }
    }

    /// Exact, case-sensitive lookup
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == s)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health band reported by the service's health checker
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HealthBand {
    Healthy,
    Degraded,
    Failing,
}

impl HealthBand {
    pub const ALL: [HealthBand; 3] = [HealthBand::Healthy, HealthBand::Degraded, HealthBand::Failing];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthBand::Healthy => "healthy",
            HealthBand::Degraded => "degraded",
            HealthBand::Failing => "failing",
        }
    }

    /// Exact, case-sensitive lookup
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.as_str() == s)
    }
}

impl fmt::Display for HealthBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_is_case_sensitive() {
        assert_eq!(Environment::parse("stage"), Some(Environment::Stage));
        assert_eq!(Environment::parse("Stage"), None);
        assert_eq!(Environment::parse("PROD"), None);
        assert_eq!(Environment::parse("production"), None);
    }

    #[test]
    fn test_health_band_parse() {
        assert_eq!(HealthBand::parse("failing"), Some(HealthBand::Failing));
        assert_eq!(HealthBand::parse("HEALTHY"), None);
        assert_eq!(HealthBand::parse("unknown"), None);
    }
}
