//! Untyped condition readings keyed by dataset column name.
//!
//! Both the serving path ([`RoadConditions`]) and the training path
//! ([`HistoricalIncidentRecord`]) are lowered into [`RawConditions`] before
//! encoding, so one encoder handles both.

use std::collections::BTreeMap;

use road_risk_incident_models::{
    ConditionLevel, HistoricalIncidentRecord, RoadConditions, fields,
};

/// Numeric values and categorical level text, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawConditions {
    numeric: BTreeMap<String, f64>,
    categorical: BTreeMap<String, String>,
}

impl RawConditions {
    /// Creates an empty reading.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a numeric field.
    #[must_use]
    pub fn with_numeric(mut self, field: impl Into<String>, value: f64) -> Self {
        self.numeric.insert(field.into(), value);
        self
    }

    /// Sets a categorical field to `level`.
    #[must_use]
    pub fn with_level(mut self, field: impl Into<String>, level: impl Into<String>) -> Self {
        self.categorical.insert(field.into(), level.into());
        self
    }

    /// Sets the categorical field `level` belongs to.
    #[must_use]
    pub fn with_condition<L: ConditionLevel>(self, level: L) -> Self {
        self.with_level(L::FIELD, level.as_ref())
    }

    /// Numeric value of `field`, if supplied.
    #[must_use]
    pub fn numeric(&self, field: &str) -> Option<f64> {
        self.numeric.get(field).copied()
    }

    /// Level of categorical `field`, if supplied.
    #[must_use]
    pub fn level(&self, field: &str) -> Option<&str> {
        self.categorical.get(field).map(String::as_str)
    }

    /// Iterates supplied categorical `(field, level)` pairs.
    pub fn levels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categorical
            .iter()
            .map(|(f, l)| (f.as_str(), l.as_str()))
    }
}

impl From<&RoadConditions> for RawConditions {
    fn from(c: &RoadConditions) -> Self {
        let mut raw = Self::new()
            .with_numeric(fields::TRAFFIC_DENSITY, f64::from(c.traffic_density))
            .with_numeric(fields::HCV_RATIO, c.hcv_ratio)
            .with_numeric(fields::HOUR, f64::from(c.hour))
            .with_numeric(
                fields::ROAD_SURFACE_FRICTION,
                c.road_surface_friction_or_default(),
            )
            .with_condition(c.weather)
            .with_condition(c.road_curvature)
            .with_condition(c.lighting);

        if let Some(surface) = c.surface_condition {
            raw = raw.with_condition(surface);
        }
        if let Some(cause) = c.historical_accident_cause {
            raw = raw.with_condition(cause);
        }
        if let Some(sentiment) = c.news_sentiment {
            raw = raw.with_condition(sentiment);
        }
        if let Some(breaches) = c.speed_limit_breaches {
            raw = raw.with_numeric(fields::SPEED_LIMIT_BREACHES, f64::from(breaches));
        }
        if let Some(rash) = c.rash_driving_incidents {
            raw = raw.with_numeric(fields::RASH_DRIVING_INCIDENTS, f64::from(rash));
        }

        raw
    }
}

impl From<&HistoricalIncidentRecord> for RawConditions {
    fn from(r: &HistoricalIncidentRecord) -> Self {
        let a = &r.attributes;
        Self::new()
            .with_numeric(fields::ROAD_SURFACE_FRICTION, a.road_surface_friction)
            .with_numeric(fields::TRAFFIC_DENSITY, a.traffic_density)
            .with_numeric(fields::HCV_RATIO, a.hcv_ratio)
            .with_numeric(fields::HOUR, f64::from(r.hour()))
            .with_numeric(fields::SPEED_LIMIT_BREACHES, a.speed_limit_breaches)
            .with_numeric(fields::RASH_DRIVING_INCIDENTS, a.rash_driving_incidents)
            .with_level(fields::WEATHER, a.weather.as_str())
            .with_level(fields::ROAD_CURVATURE, a.road_curvature.as_str())
            .with_level(fields::LIGHTING, a.lighting.as_str())
            .with_level(fields::SURFACE_CONDITION, a.surface_condition.as_str())
            .with_level(
                fields::HISTORICAL_ACCIDENT_CAUSE,
                a.historical_accident_cause.as_str(),
            )
            .with_level(fields::NEWS_SENTIMENT, a.news_sentiment.as_str())
    }
}
