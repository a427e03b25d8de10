//!
//! Severity classification of health codes and utilization percentages.
//!

use serde::Serialize;

/// Utilization above this is critical
const CRITICAL_ABOVE: f64 = 90.0;
/// Utilization above this is a warning
const WARNING_ABOVE: f64 = 60.0;

/// Three level severity of a utilization percentage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UtilizationClass {
    /// At most 60%
    Normal,
    /// Above 60% and at most 90%
    Warning,
    /// Above 90%
    Critical,
}

/// Overall health of a host as reported by the monitoring service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthState {
    /// Health code 1
    Ok,
    /// Health code 0
    Warning,
    /// Any other health code
    Error,
}

/// Classify a utilization percentage.
///
/// Boundaries belong to the lower class, so 60 is [`UtilizationClass::Normal`]
/// and 90 is [`UtilizationClass::Warning`]. Values above 100 are critical.
#[must_use]
pub fn classify(percent: f64) -> UtilizationClass {
    if percent > CRITICAL_ABOVE {
        UtilizationClass::Critical
    } else if percent > WARNING_ABOVE {
        UtilizationClass::Warning
    } else {
        UtilizationClass::Normal
    }
}

/// Map a monitoring health code to a [`HealthState`]
#[must_use]
pub const fn classify_health(code: i64) -> HealthState {
    match code {
        1 => HealthState::Ok,
        0 => HealthState::Warning,
        _ => HealthState::Error,
    }
}

impl std::fmt::Display for UtilizationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        })
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}
