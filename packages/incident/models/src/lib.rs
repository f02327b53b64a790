#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Road incident and condition types.
//!
//! Defines the coordinate and historical incident record types consumed by
//! hotspot clustering, plus the categorical condition levels (weather,
//! lighting, road geometry, ...) shared by feature encoding, the action
//! plan rules and the live condition providers.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Canonical column names as they appear in the historical dataset and
/// in the classifier's feature schema.
pub mod fields {
    /// Incident latitude.
    pub const LATITUDE: &str = "Latitude";
    /// Incident longitude.
    pub const LONGITUDE: &str = "Longitude";
    /// Incident timestamp.
    pub const TIMESTAMP: &str = "Timestamp";
    /// Binary accident outcome label.
    pub const ACCIDENT_LABEL: &str = "Accident_Risk_Label";

    /// Road surface friction coefficient.
    pub const ROAD_SURFACE_FRICTION: &str = "Road_Surface_Friction";
    /// Vehicles per km.
    pub const TRAFFIC_DENSITY: &str = "Traffic_Density";
    /// Heavy commercial vehicle share of traffic.
    pub const HCV_RATIO: &str = "HCV_Ratio";
    /// Hour of day (0-23).
    pub const HOUR: &str = "Hour";
    /// Speed limit breaches recorded on the segment.
    pub const SPEED_LIMIT_BREACHES: &str = "Speed_Limit_Breaches";
    /// Rash driving incidents recorded on the segment.
    pub const RASH_DRIVING_INCIDENTS: &str = "Rash_Driving_Incidents";

    /// Weather category.
    pub const WEATHER: &str = "Weather";
    /// Road geometry category.
    pub const ROAD_CURVATURE: &str = "Road_Curvature";
    /// Lighting category.
    pub const LIGHTING: &str = "Lighting";
    /// Surface condition category.
    pub const SURFACE_CONDITION: &str = "Surface_Condition";
    /// Dominant historical accident cause.
    pub const HISTORICAL_ACCIDENT_CAUSE: &str = "Historical_Accident_Cause";
    /// Local news sentiment about the segment.
    pub const NEWS_SENTIMENT: &str = "News_Sentiment";

    /// Numeric model inputs, in training column order.
    pub const NUMERIC: &[&str] = &[
        ROAD_SURFACE_FRICTION,
        TRAFFIC_DENSITY,
        HCV_RATIO,
        HOUR,
        SPEED_LIMIT_BREACHES,
        RASH_DRIVING_INCIDENTS,
    ];

    /// Categorical model inputs, in training column order.
    pub const CATEGORICAL: &[&str] = &[
        WEATHER,
        ROAD_CURVATURE,
        LIGHTING,
        SURFACE_CONDITION,
        HISTORICAL_ACCIDENT_CAUSE,
        NEWS_SENTIMENT,
    ];

    /// Columns that are never model inputs.
    pub const NON_FEATURE: &[&str] = &[ACCIDENT_LABEL, LATITUDE, LONGITUDE, TIMESTAMP];
}

/// Road surface friction assumed when a live reading does not supply one.
pub const DEFAULT_ROAD_SURFACE_FRICTION: f64 = 0.6;

/// A latitude/longitude pair in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and within the valid degree
    /// ranges (latitude in -90..=90, longitude in -180..=180).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Planar Euclidean distance to `other`, in degrees.
    ///
    /// This is the single distance convention used for hotspot clustering
    /// and for matching live locations against hotspots.
    #[must_use]
    pub fn planar_distance(&self, other: &Self) -> f64 {
        (self.latitude - other.latitude).hypot(self.longitude - other.longitude)
    }

    /// The coordinate as a `[latitude, longitude]` point.
    #[must_use]
    pub const fn to_point(self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

/// A categorical condition whose levels become one-hot indicator columns.
pub trait ConditionLevel: AsRef<str> + Copy {
    /// Dataset column name for this category.
    const FIELD: &'static str;

    /// All levels, in declaration order.
    fn levels() -> &'static [Self];
}

/// Weather at the time of the reading.
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
pub enum Weather {
    /// Clear, dry conditions.
    #[serde(rename = "Fine")]
    #[strum(serialize = "Fine")]
    Fine,
    /// Reduced visibility from mist or fog.
    #[serde(rename = "Mist/Fog")]
    #[strum(serialize = "Mist/Fog")]
    MistFog,
    /// Heavy rainfall.
    #[serde(rename = "Heavy Rain")]
    #[strum(serialize = "Heavy Rain")]
    HeavyRain,
    /// Dust storm.
    #[serde(rename = "Dust Storm")]
    #[strum(serialize = "Dust Storm")]
    DustStorm,
}

impl Weather {
    /// Whether this weather reduces visibility or grip enough to warrant
    /// roadside alerts.
    #[must_use]
    pub const fn is_adverse(self) -> bool {
        matches!(self, Self::HeavyRain | Self::MistFog)
    }
}

impl ConditionLevel for Weather {
    const FIELD: &'static str = fields::WEATHER;

    fn levels() -> &'static [Self] {
        &[Self::Fine, Self::MistFog, Self::HeavyRain, Self::DustStorm]
    }
}

/// Ambient lighting on the road segment.
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
pub enum Lighting {
    /// Natural daylight.
    #[serde(rename = "Daylight")]
    #[strum(serialize = "Daylight")]
    Daylight,
    /// Dawn or dusk twilight.
    #[serde(rename = "Dusk")]
    #[strum(serialize = "Dusk")]
    Dusk,
    /// Night with street lighting.
    #[serde(rename = "Night-Lit")]
    #[strum(serialize = "Night-Lit")]
    NightLit,
    /// Night without street lighting.
    #[serde(rename = "Night-Unlit")]
    #[strum(serialize = "Night-Unlit")]
    NightUnlit,
}

impl ConditionLevel for Lighting {
    const FIELD: &'static str = fields::LIGHTING;

    fn levels() -> &'static [Self] {
        &[Self::Daylight, Self::Dusk, Self::NightLit, Self::NightUnlit]
    }
}

/// Road geometry of the segment.
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
pub enum RoadCurvature {
    /// Straight section.
    #[serde(rename = "Straight")]
    #[strum(serialize = "Straight")]
    Straight,
    /// Gentle bend.
    #[serde(rename = "Slight Curve")]
    #[strum(serialize = "Slight Curve")]
    SlightCurve,
    /// Sharp bend.
    #[serde(rename = "Sharp Curve")]
    #[strum(serialize = "Sharp Curve")]
    SharpCurve,
}

impl ConditionLevel for RoadCurvature {
    const FIELD: &'static str = fields::ROAD_CURVATURE;

    fn levels() -> &'static [Self] {
        &[Self::Straight, Self::SlightCurve, Self::SharpCurve]
    }
}

/// Pavement condition of the segment.
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
pub enum SurfaceCondition {
    /// Intact pavement.
    #[serde(rename = "Smooth")]
    #[strum(serialize = "Smooth")]
    Smooth,
    /// Scattered small potholes.
    #[serde(rename = "Minor Potholes")]
    #[strum(serialize = "Minor Potholes")]
    MinorPotholes,
    /// Deep or widespread potholes.
    #[serde(rename = "Severe Potholes")]
    #[strum(serialize = "Severe Potholes")]
    SeverePotholes,
}

impl ConditionLevel for SurfaceCondition {
    const FIELD: &'static str = fields::SURFACE_CONDITION;

    fn levels() -> &'static [Self] {
        &[Self::Smooth, Self::MinorPotholes, Self::SeverePotholes]
    }
}

/// Dominant cause recorded for past accidents on the segment.
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
pub enum AccidentCause {
    /// No recorded cause.
    #[serde(rename = "None")]
    #[strum(serialize = "None")]
    None,
    /// Excess speed.
    #[serde(rename = "Speeding")]
    #[strum(serialize = "Speeding")]
    Speeding,
    /// Pothole-related loss of control.
    #[serde(rename = "Potholes")]
    #[strum(serialize = "Potholes")]
    Potholes,
    /// Collision in a blind spot.
    #[serde(rename = "Blind Spot Collision")]
    #[strum(serialize = "Blind Spot Collision")]
    BlindSpotCollision,
}

impl ConditionLevel for AccidentCause {
    const FIELD: &'static str = fields::HISTORICAL_ACCIDENT_CAUSE;

    fn levels() -> &'static [Self] {
        &[
            Self::None,
            Self::Speeding,
            Self::Potholes,
            Self::BlindSpotCollision,
        ]
    }
}

/// Tone of local news coverage about the segment.
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
pub enum NewsSentiment {
    /// Coverage describes the segment as safe.
    #[serde(rename = "Positive (Safe)")]
    #[strum(serialize = "Positive (Safe)")]
    Positive,
    /// No notable coverage.
    #[serde(rename = "Neutral")]
    #[strum(serialize = "Neutral")]
    Neutral,
    /// Coverage describes the segment as accident prone.
    #[serde(rename = "Negative (Accident Prone)")]
    #[strum(serialize = "Negative (Accident Prone)")]
    Negative,
}

impl ConditionLevel for NewsSentiment {
    const FIELD: &'static str = fields::NEWS_SENTIMENT;

    fn levels() -> &'static [Self] {
        &[Self::Positive, Self::Neutral, Self::Negative]
    }
}

/// Per-incident attributes used only for feature encoding at training time.
///
/// Categorical values are kept as the raw dataset text so levels the
/// current taxonomy does not know about still reach the encoder (which
/// absorbs them into the baseline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentAttributes {
    /// Raw weather text.
    pub weather: String,
    /// Raw road curvature text.
    pub road_curvature: String,
    /// Raw lighting text.
    pub lighting: String,
    /// Raw surface condition text.
    pub surface_condition: String,
    /// Raw historical accident cause text.
    pub historical_accident_cause: String,
    /// Raw news sentiment text.
    pub news_sentiment: String,
    /// Road surface friction coefficient.
    pub road_surface_friction: f64,
    /// Vehicles per km.
    pub traffic_density: f64,
    /// Heavy commercial vehicle ratio.
    pub hcv_ratio: f64,
    /// Speed limit breaches.
    pub speed_limit_breaches: f64,
    /// Rash driving incidents.
    pub rash_driving_incidents: f64,
}

/// One past incident from the historical dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalIncidentRecord {
    /// Where the incident happened.
    pub location: Coordinate,
    /// Whether the incident was a qualifying accident.
    pub accident: bool,
    /// When the incident happened, if recorded.
    pub timestamp: Option<NaiveDateTime>,
    /// Conditions at the time of the incident.
    pub attributes: IncidentAttributes,
}

impl HistoricalIncidentRecord {
    /// Hour of day the incident happened, `0` when no timestamp was
    /// recorded.
    #[must_use]
    pub fn hour(&self) -> u32 {
        self.timestamp.map_or(0, |ts| ts.hour())
    }
}

/// Conditions on a road segment at the moment of a risk query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadConditions {
    /// Current weather.
    pub weather: Weather,
    /// Road geometry.
    pub road_curvature: RoadCurvature,
    /// Current lighting.
    pub lighting: Lighting,
    /// Vehicles per km.
    pub traffic_density: u32,
    /// Heavy commercial vehicle ratio (0.0-1.0).
    pub hcv_ratio: f64,
    /// Hour of day (0-23).
    pub hour: u32,
    /// Measured surface friction, if known.
    #[serde(default)]
    pub road_surface_friction: Option<f64>,
    /// Surface condition, if known.
    #[serde(default)]
    pub surface_condition: Option<SurfaceCondition>,
    /// Dominant historical accident cause, if known.
    #[serde(default)]
    pub historical_accident_cause: Option<AccidentCause>,
    /// News sentiment, if known.
    #[serde(default)]
    pub news_sentiment: Option<NewsSentiment>,
    /// Speed limit breaches, if known.
    #[serde(default)]
    pub speed_limit_breaches: Option<u32>,
    /// Rash driving incidents, if known.
    #[serde(default)]
    pub rash_driving_incidents: Option<u32>,
}

impl RoadConditions {
    /// Creates conditions from the core live readings, leaving the
    /// optional segment attributes unset.
    #[must_use]
    pub const fn new(
        weather: Weather,
        road_curvature: RoadCurvature,
        lighting: Lighting,
        traffic_density: u32,
        hcv_ratio: f64,
        hour: u32,
    ) -> Self {
        Self {
            weather,
            road_curvature,
            lighting,
            traffic_density,
            hcv_ratio,
            hour,
            road_surface_friction: None,
            surface_condition: None,
            historical_accident_cause: None,
            news_sentiment: None,
            speed_limit_breaches: None,
            rash_driving_incidents: None,
        }
    }

    /// Surface friction, falling back to [`DEFAULT_ROAD_SURFACE_FRICTION`].
    #[must_use]
    pub fn road_surface_friction_or_default(&self) -> f64 {
        self.road_surface_friction
            .unwrap_or(DEFAULT_ROAD_SURFACE_FRICTION)
    }
}
