//! Configuration for solve attempts and the HTTP server.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
/// One day.
pub const MAX_TIMEOUT_SECS: u64 = 86_400;
const DEFAULT_GRACE_SECS: u64 = 5;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Objective weights.
///
/// A present key builds its component even at weight 0; an absent key
/// leaves the component out of the model entirely.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Weights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<f64>,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            gaps: Some(1.0),
            workload: None,
            distribution: None,
        }
    }
}

impl Weights {
    /// All three components enabled.
    pub fn all(gaps: f64, workload: f64, distribution: f64) -> Self {
        Self {
            gaps: Some(gaps),
            workload: Some(workload),
            distribution: Some(distribution),
        }
    }

    /// No soft objective at all: any feasible assignment is optimal.
    pub fn none() -> Self {
        Self {
            gaps: None,
            workload: None,
            distribution: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, weight) in [
            ("gaps", self.gaps),
            ("workload", self.workload),
            ("distribution", self.distribution),
        ] {
            if let Some(value) = weight {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::InvalidWeight { key, value });
                }
            }
        }
        Ok(())
    }
}

/// Optional constraint families layered on top of the four mandatory ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintExtensions {
    /// Only teachers listing the class subject may teach it.
    pub subject_qualification: bool,
    /// Upper bound on a teacher's periods per day.
    pub max_periods_per_day: Option<u32>,
}

/// Settings for one solve attempt.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolveConfig {
    pub weights: Weights,
    pub timeout_secs: u64,
    /// Forward HiGHS output to the console.
    pub solver_log: bool,
    pub extensions: ConstraintExtensions,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            solver_log: false,
            extensions: ConstraintExtensions::default(),
        }
    }
}

impl SolveConfig {
    pub fn with_weights(weights: Weights) -> Self {
        Self {
            weights,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::TimeoutTooLong {
                secs: self.timeout_secs,
                max: MAX_TIMEOUT_SECS,
            });
        }
        if self.extensions.max_periods_per_day == Some(0) {
            return Err(ConfigError::ZeroDailyCap);
        }
        Ok(())
    }
}

/// HTTP server settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Timeout applied when a request does not set one.
    pub default_timeout_secs: u64,
    /// Extra time granted to the solver thread past its own time limit.
    pub solve_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080))),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            solve_grace_secs: DEFAULT_GRACE_SECS,
        }
    }
}

impl ServerConfig {
    /// Reads `TIMETABLE_ADDR`, `TIMETABLE_TIMEOUT_SECS` and
    /// `TIMETABLE_GRACE_SECS`, falling back to defaults for unset or
    /// unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: parse_or("TIMETABLE_ADDR", &lookup, defaults.bind_addr),
            default_timeout_secs: parse_or(
                "TIMETABLE_TIMEOUT_SECS",
                &lookup,
                defaults.default_timeout_secs,
            ),
            solve_grace_secs: parse_or("TIMETABLE_GRACE_SECS", &lookup, defaults.solve_grace_secs),
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Ignoring unparsable {key}={raw}");
                default
            }
        },
        None => default,
    }
}
