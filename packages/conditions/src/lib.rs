#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Live road condition providers.
//!
//! A [`ConditionProvider`] answers "what are conditions like here, now?"
//! with typed [`LiveReadings`]. Two implementations ship:
//!
//! - [`FixedProvider`] returns configured readings. Used for manual
//!   overrides, offline runs and tests.
//! - [`HttpProvider`] queries an OpenWeatherMap-style weather endpoint and
//!   an optional traffic endpoint.
//!
//! Lighting and the heavy vehicle share are not fetched; they are derived
//! from the hour with [`lighting_for_hour`] and
//! [`heavy_vehicle_ratio_for_hour`].

pub mod fixed;
pub mod http;

use async_trait::async_trait;
use road_risk_incident_models::{Coordinate, Lighting, RoadConditions, RoadCurvature, Weather};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fixed::FixedProvider;
pub use http::{HttpProvider, HttpSettings};

/// Errors from fetching live conditions.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The upstream service refused or is not configured.
    #[error("Provider unavailable: {message}")]
    Unavailable {
        /// Why the provider could not answer.
        message: String,
    },
}

/// Readings a provider reports for one location and hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveReadings {
    /// Current weather.
    pub weather: Weather,
    /// Vehicles per km.
    pub traffic_density: u32,
    /// Heavy commercial vehicle ratio (0.0-1.0).
    pub hcv_ratio: f64,
}

impl LiveReadings {
    /// Road conditions for a segment with `road_curvature` at `hour`,
    /// deriving lighting from the hour.
    #[must_use]
    pub const fn into_conditions(self, road_curvature: RoadCurvature, hour: u32) -> RoadConditions {
        RoadConditions::new(
            self.weather,
            road_curvature,
            lighting_for_hour(hour),
            self.traffic_density,
            self.hcv_ratio,
            hour,
        )
    }
}

/// A source of live readings.
#[async_trait]
pub trait ConditionProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Current readings at `location` for hour of day `hour`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the readings cannot be obtained.
    async fn current_conditions(
        &self,
        location: Coordinate,
        hour: u32,
    ) -> Result<LiveReadings, ProviderError>;
}

/// Lighting expected at `hour`: daylight 06-17, dusk at 05 and 18-19,
/// lit night otherwise. Unlit roads are a property of the segment and are
/// never inferred.
#[must_use]
pub const fn lighting_for_hour(hour: u32) -> Lighting {
    match hour {
        6..=17 => Lighting::Daylight,
        5 | 18 | 19 => Lighting::Dusk,
        _ => Lighting::NightLit,
    }
}

/// Typical heavy commercial vehicle share at `hour`. Trucks dominate
/// highway traffic between 22:00 and 06:00.
#[must_use]
pub const fn heavy_vehicle_ratio_for_hour(hour: u32) -> f64 {
    if hour >= 22 || hour <= 6 { 0.65 } else { 0.2 }
}
