//! Risk-only banding used to present a whole plan.
//!
//! Neither banding here affects which rules fire or their severities.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::Severity;

/// Thresholds choosing the container a plan is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayBands {
    /// Risk above which the plan is shown as critical.
    pub critical_above: f64,
    /// Risk above which the plan is shown as a warning.
    pub warning_above: f64,
}

impl Default for DisplayBands {
    fn default() -> Self {
        Self {
            critical_above: 0.4,
            warning_above: 0.2,
        }
    }
}

impl DisplayBands {
    /// Whether the bands are probabilities with `warning_above` not above
    /// `critical_above`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.warning_above)
            && (0.0..=1.0).contains(&self.critical_above)
            && self.warning_above <= self.critical_above
    }

    /// Display severity for risk `r`.
    #[must_use]
    pub fn severity(&self, r: f64) -> Severity {
        if r > self.critical_above {
            Severity::Critical
        } else if r > self.warning_above {
            Severity::Warning
        } else {
            Severity::Info
        }
    }
}

/// Coarse risk badge shown next to the probability.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// `r <= 0.3`.
    Low,
    /// `0.3 < r <= 0.6`.
    Moderate,
    /// `r > 0.6`.
    High,
}

impl RiskLevel {
    /// Badge for risk `r`.
    #[must_use]
    pub fn from_probability(r: f64) -> Self {
        if r > 0.6 {
            Self::High
        } else if r > 0.3 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bands() {
        let bands = DisplayBands::default();
        assert!(bands.is_valid());
        assert_eq!(bands.severity(0.61), Severity::Critical);
        assert_eq!(bands.severity(0.6), Severity::Critical);
        assert_eq!(bands.severity(0.5), Severity::Critical);
        assert_eq!(bands.severity(0.41), Severity::Critical);
        assert_eq!(bands.severity(0.4), Severity::Warning);
        assert_eq!(bands.severity(0.21), Severity::Warning);
        assert_eq!(bands.severity(0.2), Severity::Info);
        assert_eq!(bands.severity(0.0), Severity::Info);
    }

    #[test]
    fn custom_bands() {
        let bands = DisplayBands {
            critical_above: 0.7,
            warning_above: 0.1,
        };
        assert_eq!(bands.severity(0.75), Severity::Critical);
        assert_eq!(bands.severity(0.65), Severity::Warning);
        assert_eq!(bands.severity(0.15), Severity::Warning);
        assert_eq!(bands.severity(0.1), Severity::Info);
    }

    #[test]
    fn inverted_bands_are_invalid() {
        let bands = DisplayBands {
            critical_above: 0.2,
            warning_above: 0.5,
        };
        assert!(!bands.is_valid());
    }

    #[test]
    fn partial_bands_fill_defaults() {
        let bands: DisplayBands = serde_json::from_str(r#"{"critical_above": 0.5}"#).unwrap();
        assert!((bands.critical_above - 0.5).abs() < f64::EPSILON);
        assert!((bands.warning_above - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn risk_level_badges() {
        assert_eq!(RiskLevel::from_probability(0.75), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(0.6), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_probability(0.31), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_probability(0.3), RiskLevel::Low);
        assert_eq!(RiskLevel::High.to_string(), "HIGH");
    }
}
