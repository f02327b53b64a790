//! Provider returning configured readings.

use async_trait::async_trait;
use road_risk_incident_models::{Coordinate, Weather};
use serde::{Deserialize, Serialize};

use crate::{ConditionProvider, LiveReadings, ProviderError, heavy_vehicle_ratio_for_hour};

/// Reports the same readings for every location. When `hcv_ratio` is
/// unset the hourly heuristic is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FixedProvider {
    /// Weather to report.
    #[serde(default = "default_weather")]
    pub weather: Weather,
    /// Vehicles per km to report.
    #[serde(default = "default_traffic_density")]
    pub traffic_density: u32,
    /// Heavy vehicle ratio to report.
    #[serde(default)]
    pub hcv_ratio: Option<f64>,
}

const fn default_weather() -> Weather {
    Weather::Fine
}

const fn default_traffic_density() -> u32 {
    150
}

impl Default for FixedProvider {
    fn default() -> Self {
        Self {
            weather: default_weather(),
            traffic_density: default_traffic_density(),
            hcv_ratio: None,
        }
    }
}

impl FixedProvider {
    /// Readings at `hour`, without any I/O.
    #[must_use]
    pub fn readings(&self, hour: u32) -> LiveReadings {
        LiveReadings {
            weather: self.weather,
            traffic_density: self.traffic_density,
            hcv_ratio: self
                .hcv_ratio
                .unwrap_or_else(|| heavy_vehicle_ratio_for_hour(hour)),
        }
    }
}

#[async_trait]
impl ConditionProvider for FixedProvider {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn current_conditions(
        &self,
        location: Coordinate,
        hour: u32,
    ) -> Result<LiveReadings, ProviderError> {
        if !location.is_valid() {
            return Err(ProviderError::Unavailable {
                message: format!(
                    "invalid location ({}, {})",
                    location.latitude, location.longitude
                ),
            });
        }
        Ok(self.readings(hour))
    }
}
