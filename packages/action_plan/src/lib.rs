#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Mitigation action plans.
//!
//! Turns an accident probability and the conditions behind it into an
//! ordered list of recommendations. Every matching rule of the
//! [`rules::RULES`] ladder contributes one recommendation; when none
//! match, the plan holds the single optimal-conditions entry. Plans are
//! ordered by descending [`Severity`] and keep ladder order within a tier.

pub mod display;
pub mod rules;

use std::fmt;

use road_risk_incident_models::{Lighting, RoadConditions, RoadCurvature, Weather};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use display::{DisplayBands, RiskLevel};
pub use rules::{OPTIMAL_CONDITIONS, RULES, Rule};

/// Errors from building a plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The risk is not a probability.
    #[error("Risk {risk} is not a probability in [0, 1]")]
    InvalidArgument {
        /// The rejected value.
        risk: f64,
    },
}

/// Severity tier of a recommendation.
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
pub enum Severity {
    /// Advisory.
    Info,
    /// Needs attention.
    Warning,
    /// Needs immediate action.
    Critical,
}

/// The condition a recommendation reacts to.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trigger {
    /// Risk in the critical band.
    CriticalRisk,
    /// Risk in the elevated band.
    ElevatedRisk,
    /// Heavy rain or fog.
    AdverseWeather,
    /// Unlit road at night.
    UnlitRoad,
    /// Dense traffic with a high heavy vehicle share.
    HeavyVehicleCongestion,
    /// Dense traffic.
    Congestion,
    /// Sharp curve.
    SharpCurve,
    /// Nothing else fired.
    OptimalConditions,
}

/// Conditions the rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributingFactors {
    /// Current weather.
    pub weather: Weather,
    /// Current lighting.
    pub lighting: Lighting,
    /// Vehicles per km.
    pub traffic_density: u32,
    /// Heavy commercial vehicle ratio.
    pub hcv_ratio: f64,
    /// Road geometry.
    pub road_curvature: RoadCurvature,
}

impl From<&RoadConditions> for ContributingFactors {
    fn from(conditions: &RoadConditions) -> Self {
        Self {
            weather: conditions.weather,
            lighting: conditions.lighting,
            traffic_density: conditions.traffic_density,
            hcv_ratio: conditions.hcv_ratio,
            road_curvature: conditions.road_curvature,
        }
    }
}

/// One instruction in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecommendation {
    /// Severity tier.
    pub severity: Severity,
    /// What fired it.
    pub trigger: Trigger,
    /// Short heading, e.g. `WEATHER ALERT`.
    pub headline: String,
    /// Instruction text.
    pub message: String,
}

impl ActionRecommendation {
    fn from_rule(rule: &Rule, factors: &ContributingFactors) -> Self {
        Self {
            severity: rule.severity,
            trigger: rule.trigger,
            headline: rule.headline.to_string(),
            message: rule.message(factors),
        }
    }
}

impl fmt::Display for ActionRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.headline, self.message)
    }
}

/// An ordered, never empty list of recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlan {
    /// Risk the plan was built for.
    pub risk: f64,
    /// Container severity derived from the risk alone.
    pub display_severity: Severity,
    /// Recommendations, most severe first.
    pub recommendations: Vec<ActionRecommendation>,
}

impl ActionPlan {
    /// Number of recommendations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recommendations.len()
    }

    /// Always `false` for plans built by [`build_plan`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    /// Triggers in plan order.
    #[must_use]
    pub fn triggers(&self) -> Vec<Trigger> {
        self.recommendations.iter().map(|r| r.trigger).collect()
    }
}

/// Builds the plan for risk `r` using the default [`DisplayBands`].
///
/// # Errors
///
/// * If `r` is NaN or outside `[0, 1]`
pub fn build_plan(r: f64, factors: &ContributingFactors) -> Result<ActionPlan, PlanError> {
    build_plan_with_bands(r, factors, &DisplayBands::default())
}

/// Builds the plan for risk `r`, choosing the display severity with `bands`.
///
/// # Errors
///
/// * If `r` is NaN or outside `[0, 1]`
pub fn build_plan_with_bands(
    r: f64,
    factors: &ContributingFactors,
    bands: &DisplayBands,
) -> Result<ActionPlan, PlanError> {
    if !(0.0..=1.0).contains(&r) {
        return Err(PlanError::InvalidArgument { risk: r });
    }

    let mut recommendations: Vec<ActionRecommendation> = RULES
        .iter()
        .filter(|rule| rule.applies(r, factors))
        .map(|rule| ActionRecommendation::from_rule(rule, factors))
        .collect();

    if recommendations.is_empty() {
        recommendations.push(ActionRecommendation::from_rule(
            &OPTIMAL_CONDITIONS,
            factors,
        ));
    }

    // Stable, so ladder order survives within a tier.
    recommendations.sort_by(|a, b| b.severity.cmp(&a.severity));

    log::debug!(
        "Action plan for r={r:.3}: {} recommendation(s)",
        recommendations.len()
    );

    Ok(ActionPlan {
        risk: r,
        display_severity: bands.severity(r),
        recommendations,
    })
}
