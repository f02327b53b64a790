//! The mitigation rule ladder.
//!
//! Each rule is evaluated on its own against the risk probability and the
//! contributing factors. Rules are listed in ladder order, which is also
//! the order recommendations of equal severity appear in a plan.

use road_risk_incident_models::{Lighting, RoadCurvature};

use crate::{ContributingFactors, Severity, Trigger};

/// Risk above which emergency response is pre-positioned.
pub const CRITICAL_RISK_ABOVE: f64 = 0.60;
/// Risk above which patrols are increased.
pub const ELEVATED_RISK_ABOVE: f64 = 0.30;
/// Traffic density (vehicles/km) above which heavy vehicle share matters.
pub const HEAVY_VEHICLE_TRAFFIC_ABOVE: u32 = 350;
/// Heavy commercial vehicle ratio above which they are diverted.
pub const HEAVY_VEHICLE_RATIO_ABOVE: f64 = 0.4;
/// Traffic density (vehicles/km) above which toll collection is suspended.
pub const CONGESTION_TRAFFIC_ABOVE: u32 = 400;

/// A single entry of the ladder.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// What the rule reacts to.
    pub trigger: Trigger,
    /// Severity of the recommendation it emits.
    pub severity: Severity,
    /// Short heading shown before the instruction.
    pub headline: &'static str,
    applies: fn(f64, &ContributingFactors) -> bool,
    message: fn(&ContributingFactors) -> String,
}

impl Rule {
    /// Whether the rule fires for risk `r` under `factors`.
    #[must_use]
    pub fn applies(&self, r: f64, factors: &ContributingFactors) -> bool {
        (self.applies)(r, factors)
    }

    /// Instruction text for `factors`.
    #[must_use]
    pub fn message(&self, factors: &ContributingFactors) -> String {
        (self.message)(factors)
    }
}

/// Substantive rules, in ladder order.
pub static RULES: &[Rule] = &[
    Rule {
        trigger: Trigger::CriticalRisk,
        severity: Severity::Critical,
        headline: "CRITICAL",
        applies: |r, _| r > CRITICAL_RISK_ABOVE,
        message: |_| {
            "Pre-position emergency response vehicles (ambulances and cranes) within a 5 km \
             radius of this zone immediately."
                .to_string()
        },
    },
    Rule {
        trigger: Trigger::ElevatedRisk,
        severity: Severity::Warning,
        headline: "WARNING",
        applies: |r, _| r > ELEVATED_RISK_ABOVE && r <= CRITICAL_RISK_ABOVE,
        message: |_| {
            "Increase highway patrol frequency in this sector for the next 4 hours.".to_string()
        },
    },
    Rule {
        trigger: Trigger::AdverseWeather,
        severity: Severity::Warning,
        headline: "WEATHER ALERT",
        applies: |_, f| f.weather.is_adverse(),
        message: |f| {
            format!(
                "Activate Variable Message Signs warning drivers of '{}'. Mandate a temporary \
                 speed limit reduction of 20 km/h.",
                f.weather
            )
        },
    },
    Rule {
        trigger: Trigger::UnlitRoad,
        severity: Severity::Warning,
        headline: "INFRASTRUCTURE",
        applies: |_, f| f.lighting == Lighting::NightUnlit,
        message: |_| {
            "Visibility is near zero. Dispatch temporary mobile floodlights and flag this \
             sector for priority street lamp installation."
                .to_string()
        },
    },
    Rule {
        trigger: Trigger::HeavyVehicleCongestion,
        severity: Severity::Warning,
        headline: "TRAFFIC CONTROL",
        applies: |_, f| heavy_vehicle_congestion(f),
        message: |f| {
            format!(
                "Severe congestion ({} vehicles/km) with {:.0}% heavy vehicles. Divert heavy \
                 commercial vehicles to alternative corridors or enforce lane discipline.",
                f.traffic_density,
                f.hcv_ratio * 100.0
            )
        },
    },
    Rule {
        trigger: Trigger::Congestion,
        severity: Severity::Warning,
        headline: "CONGESTION",
        applies: |_, f| {
            f.traffic_density > CONGESTION_TRAFFIC_ABOVE && !heavy_vehicle_congestion(f)
        },
        message: |_| {
            "Suspend toll plaza collection temporarily if tailbacks exceed 2 km to prevent \
             rear-end collisions."
                .to_string()
        },
    },
    Rule {
        trigger: Trigger::SharpCurve,
        severity: Severity::Info,
        headline: "GEOMETRY",
        applies: |_, f| f.road_curvature == RoadCurvature::SharpCurve,
        message: |_| {
            "Ensure chevron alignment signs are highly reflective. Consider transverse rumble \
             strips 500 m before the curve."
                .to_string()
        },
    },
];

/// Emitted alone when no substantive rule fires.
pub static OPTIMAL_CONDITIONS: Rule = Rule {
    trigger: Trigger::OptimalConditions,
    severity: Severity::Info,
    headline: "OPTIMAL",
    applies: |_, _| true,
    message: |_| "Conditions are optimal. Maintain standard highway monitoring.".to_string(),
};

fn heavy_vehicle_congestion(factors: &ContributingFactors) -> bool {
    factors.traffic_density > HEAVY_VEHICLE_TRAFFIC_ABOVE
        && factors.hcv_ratio > HEAVY_VEHICLE_RATIO_ABOVE
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use road_risk_incident_models::Weather;

    use super::*;

    fn calm() -> ContributingFactors {
        ContributingFactors {
            weather: Weather::Fine,
            lighting: Lighting::Daylight,
            traffic_density: 100,
            hcv_ratio: 0.1,
            road_curvature: RoadCurvature::Straight,
        }
    }

    fn rule(trigger: Trigger) -> &'static Rule {
        RULES.iter().find(|r| r.trigger == trigger).unwrap()
    }

    #[test]
    fn triggers_are_unique_and_ladder_is_ordered_by_severity() {
        let triggers: BTreeSet<Trigger> = RULES.iter().map(|r| r.trigger).collect();
        assert_eq!(triggers.len(), RULES.len());
        assert!(!triggers.contains(&Trigger::OptimalConditions));
        assert!(RULES.windows(2).all(|w| w[0].severity >= w[1].severity));
    }

    #[test]
    fn calm_conditions_fire_nothing() {
        assert!(RULES.iter().all(|r| !r.applies(0.1, &calm())));
    }

    #[test]
    fn risk_bands_are_exclusive() {
        let critical = rule(Trigger::CriticalRisk);
        let elevated = rule(Trigger::ElevatedRisk);
        let f = calm();

        assert!(critical.applies(0.61, &f));
        assert!(!elevated.applies(0.61, &f));
        assert!(!critical.applies(0.60, &f));
        assert!(elevated.applies(0.60, &f));
        assert!(elevated.applies(0.31, &f));
        assert!(!elevated.applies(0.30, &f));
    }

    #[test]
    fn adverse_weather_names_the_weather() {
        let weather = rule(Trigger::AdverseWeather);
        for (w, fires) in [
            (Weather::HeavyRain, true),
            (Weather::MistFog, true),
            (Weather::DustStorm, false),
            (Weather::Fine, false),
        ] {
            let f = ContributingFactors { weather: w, ..calm() };
            assert_eq!(weather.applies(0.0, &f), fires, "{w}");
            if fires {
                assert!(weather.message(&f).contains(&format!("'{w}'")));
            }
        }
    }

    #[test]
    fn only_unlit_nights_need_lighting() {
        let unlit = rule(Trigger::UnlitRoad);
        for lighting in [Lighting::Daylight, Lighting::Dusk, Lighting::NightLit] {
            assert!(!unlit.applies(0.0, &ContributingFactors { lighting, ..calm() }));
        }
        let f = ContributingFactors {
            lighting: Lighting::NightUnlit,
            ..calm()
        };
        assert!(unlit.applies(0.0, &f));
    }

    #[test]
    fn heavy_vehicle_rule_needs_both_thresholds() {
        let joint = rule(Trigger::HeavyVehicleCongestion);
        let f = |traffic_density, hcv_ratio| ContributingFactors {
            traffic_density,
            hcv_ratio,
            ..calm()
        };
        assert!(joint.applies(0.0, &f(351, 0.41)));
        assert!(!joint.applies(0.0, &f(350, 0.9)));
        assert!(!joint.applies(0.0, &f(900, 0.4)));
        assert!(joint.message(&f(420, 0.5)).contains("420 vehicles/km"));
    }

    #[test]
    fn congestion_rule_defers_to_joint_rule() {
        let congestion = rule(Trigger::Congestion);
        let f = |traffic_density, hcv_ratio| ContributingFactors {
            traffic_density,
            hcv_ratio,
            ..calm()
        };
        assert!(congestion.applies(0.0, &f(401, 0.2)));
        assert!(!congestion.applies(0.0, &f(400, 0.2)));
        assert!(!congestion.applies(0.0, &f(450, 0.5)));
    }

    #[test]
    fn sharp_curve_is_informational() {
        let curve = rule(Trigger::SharpCurve);
        assert_eq!(curve.severity, Severity::Info);
        let f = ContributingFactors {
            road_curvature: RoadCurvature::SharpCurve,
            ..calm()
        };
        assert!(curve.applies(0.0, &f));
        let f = ContributingFactors {
            road_curvature: RoadCurvature::SlightCurve,
            ..calm()
        };
        assert!(!curve.applies(0.0, &f));
    }
}
