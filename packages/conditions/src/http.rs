//! OpenWeatherMap-style weather plus an optional traffic endpoint.
//!
//! The weather endpoint is called as `GET {weather_url}?lat=..&lon=..&appid=..`
//! and only `weather[0].main` is read. The traffic endpoint, if configured,
//! is called as `GET {traffic_url}?lat=..&lon=..` and must answer with
//! `{"vehicles_per_km": <number>}`. Traffic failures fall back to the
//! configured default density; weather failures are errors.
//!
//! See <https://openweathermap.org/current>

use std::time::Duration;

use async_trait::async_trait;
use road_risk_incident_models::{Coordinate, Weather};
use serde::{Deserialize, Serialize};

use crate::{ConditionProvider, LiveReadings, ProviderError, heavy_vehicle_ratio_for_hour};

/// Endpoint configuration for [`HttpProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpSettings {
    /// Current weather endpoint.
    pub weather_url: String,
    /// Environment variable holding the weather API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Traffic density endpoint.
    #[serde(default)]
    pub traffic_url: Option<String>,
    /// Density reported when traffic is unknown.
    #[serde(default = "default_traffic_density")]
    pub default_traffic_density: u32,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_traffic_density() -> u32 {
    250
}

const fn default_timeout_secs() -> u64 {
    10
}

/// Provider backed by HTTP services.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    settings: HttpSettings,
    api_key: Option<String>,
}

impl HttpProvider {
    /// Builds a provider, reading the API key from the environment.
    ///
    /// # Errors
    ///
    /// * [`ProviderError::Unavailable`] if `api_key_env` names an unset
    ///   variable
    /// * [`ProviderError::Http`] if the HTTP client cannot be built
    pub fn new(settings: HttpSettings) -> Result<Self, ProviderError> {
        let api_key = match &settings.api_key_env {
            Some(var) => Some(std::env::var(var).map_err(|_| ProviderError::Unavailable {
                message: format!("environment variable {var} is not set"),
            })?),
            None => None,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            settings,
            api_key,
        })
    }

    async fn fetch_weather(&self, location: Coordinate) -> Result<Weather, ProviderError> {
        let lat = location.latitude.to_string();
        let lon = location.longitude.to_string();
        let mut query = vec![("lat", lat.as_str()), ("lon", lon.as_str())];
        if let Some(key) = &self.api_key {
            query.push(("appid", key.as_str()));
        }

        let resp = self
            .client
            .get(&self.settings.weather_url)
            .query(&query)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ProviderError::Unavailable {
                message: format!("weather endpoint returned {}", resp.status()),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_weather(&body)
    }

    async fn fetch_traffic(&self, url: &str, location: Coordinate) -> Result<u32, ProviderError> {
        let resp = self
            .client
            .get(url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ProviderError::Unavailable {
                message: format!("traffic endpoint returned {}", resp.status()),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_traffic(&body)
    }
}

#[async_trait]
impl ConditionProvider for HttpProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn current_conditions(
        &self,
        location: Coordinate,
        hour: u32,
    ) -> Result<LiveReadings, ProviderError> {
        let weather = self.fetch_weather(location).await?;

        let traffic_density = match &self.settings.traffic_url {
            Some(url) => match self.fetch_traffic(url, location).await {
                Ok(density) => density,
                Err(e) => {
                    log::warn!(
                        "Traffic lookup failed, using default {}: {e}",
                        self.settings.default_traffic_density
                    );
                    self.settings.default_traffic_density
                }
            },
            None => self.settings.default_traffic_density,
        };

        log::debug!(
            "Live conditions at ({}, {}): {weather}, {traffic_density} vehicles/km",
            location.latitude,
            location.longitude
        );

        Ok(LiveReadings {
            weather,
            traffic_density,
            hcv_ratio: heavy_vehicle_ratio_for_hour(hour),
        })
    }
}

/// Maps an OpenWeatherMap `main` group to a weather level.
#[must_use]
pub fn weather_from_main(main: &str) -> Weather {
    match main {
        "Rain" | "Drizzle" | "Thunderstorm" => Weather::HeavyRain,
        "Mist" | "Fog" | "Haze" | "Smoke" => Weather::MistFog,
        "Dust" | "Sand" | "Ash" => Weather::DustStorm,
        _ => Weather::Fine,
    }
}

/// Parses a current weather response.
fn parse_weather(body: &serde_json::Value) -> Result<Weather, ProviderError> {
    let main = body["weather"][0]["main"]
        .as_str()
        .ok_or_else(|| ProviderError::Parse {
            message: "Missing weather[0].main in weather response".to_string(),
        })?;
    Ok(weather_from_main(main))
}

/// Parses a traffic response.
fn parse_traffic(body: &serde_json::Value) -> Result<u32, ProviderError> {
    let density = body["vehicles_per_km"]
        .as_f64()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| ProviderError::Parse {
            message: "Missing or negative vehicles_per_km in traffic response".to_string(),
        })?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let density = density.round().min(f64::from(u32::MAX)) as u32;
    Ok(density)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_openweathermap_response() {
        let body = serde_json::json!({
            "coord": {"lon": 72.87, "lat": 19.07},
            "weather": [{"id": 501, "main": "Rain", "description": "moderate rain"}],
            "main": {"temp": 301.2}
        });
        assert_eq!(parse_weather(&body).unwrap(), Weather::HeavyRain);
    }

    #[test]
    fn maps_weather_groups() {
        assert_eq!(weather_from_main("Drizzle"), Weather::HeavyRain);
        assert_eq!(weather_from_main("Thunderstorm"), Weather::HeavyRain);
        assert_eq!(weather_from_main("Haze"), Weather::MistFog);
        assert_eq!(weather_from_main("Fog"), Weather::MistFog);
        assert_eq!(weather_from_main("Sand"), Weather::DustStorm);
        assert_eq!(weather_from_main("Clear"), Weather::Fine);
        assert_eq!(weather_from_main("Clouds"), Weather::Fine);
    }

    #[test]
    fn weather_response_without_main_is_a_parse_error() {
        let body = serde_json::json!({"weather": []});
        assert!(matches!(
            parse_weather(&body),
            Err(ProviderError::Parse { .. })
        ));
    }

    #[test]
    fn parses_traffic_density() {
        let body = serde_json::json!({"vehicles_per_km": 372.6});
        assert_eq!(parse_traffic(&body).unwrap(), 373);

        let body = serde_json::json!({"vehicles_per_km": 120});
        assert_eq!(parse_traffic(&body).unwrap(), 120);
    }

    #[test]
    fn rejects_bad_traffic_density() {
        for body in [
            serde_json::json!({}),
            serde_json::json!({"vehicles_per_km": -4}),
            serde_json::json!({"vehicles_per_km": "busy"}),
        ] {
            assert!(parse_traffic(&body).is_err(), "{body}");
        }
    }

    #[test]
    fn settings_defaults() {
        let settings: HttpSettings =
            serde_json::from_str(r#"{"weather_url": "https://example.test/weather"}"#).unwrap();
        assert_eq!(settings.default_traffic_density, 250);
        assert_eq!(settings.timeout_secs, 10);
        assert!(settings.traffic_url.is_none());
    }

    #[test]
    fn missing_api_key_variable_is_unavailable() {
        let settings = HttpSettings {
            weather_url: "https://example.test/weather".to_string(),
            api_key_env: Some("ROAD_RISK_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            traffic_url: None,
            default_traffic_density: 250,
            timeout_secs: 5,
        };
        assert!(matches!(
            HttpProvider::new(settings),
            Err(ProviderError::Unavailable { .. })
        ));
    }
}
