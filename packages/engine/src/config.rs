//! Engine configuration loaded from TOML.
//!
//! A default configuration is embedded at compile time (see
//! `config/default.toml`) and used when no file is given. Every section
//! and key is optional; missing values take the defaults below.
//!
//! ```toml
//! [clustering]
//! eps = 0.01
//! min_samples = 5
//!
//! [display]
//! critical_above = 0.4
//! warning_above = 0.2
//!
//! [resources]
//! model = "data/model.json"
//! dataset = "data/sample_incidents.csv"
//!
//! [provider]
//! type = "http"
//! weather_url = "https://api.openweathermap.org/data/2.5/weather"
//! api_key_env = "OPENWEATHER_API_KEY"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use road_risk_action_plan::DisplayBands;
use road_risk_conditions::{ConditionProvider, FixedProvider, HttpProvider, HttpSettings};
use road_risk_hotspot::ClusteringParams;
use serde::{Deserialize, Serialize};

use crate::EngineError;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Paths of the model artifact and historical dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ResourcesConfig {
    /// Logistic model JSON artifact.
    pub model: Option<PathBuf>,
    /// Historical incident CSV used for hotspot detection.
    pub dataset: Option<PathBuf>,
}

/// Live condition provider, tagged by `type` in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Configured readings.
    Fixed(FixedProvider),
    /// Weather and traffic over HTTP.
    Http(HttpSettings),
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::Fixed(FixedProvider::default())
    }
}

impl ProviderConfig {
    /// Builds the configured provider.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Provider`] if an HTTP provider cannot be built.
    pub fn build(&self) -> Result<Arc<dyn ConditionProvider>, EngineError> {
        Ok(match self {
            Self::Fixed(provider) => Arc::new(*provider),
            Self::Http(settings) => Arc::new(HttpProvider::new(settings.clone())?),
        })
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Hotspot clustering parameters.
    pub clustering: ClusteringParams,
    /// Plan display bands.
    pub display: DisplayBands,
    /// Resource paths.
    pub resources: ResourcesConfig,
    /// Live condition provider.
    pub provider: ProviderConfig,
}

impl EngineConfig {
    /// The configuration embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the embedded file is invalid.
    pub fn embedded() -> Result<Self, EngineError> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// * [`EngineError::Toml`] for malformed TOML or unknown provider types
    /// * [`EngineError::Hotspot`] for invalid clustering parameters
    /// * [`EngineError::Config`] for invalid display bands
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration at `path`, or the embedded one when `path`
    /// is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the file cannot be read or is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        match path {
            Some(path) => {
                log::debug!("Loading config from {}", path.display());
                Self::from_toml_str(&std::fs::read_to_string(path)?)
            }
            None => Self::embedded(),
        }
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.clustering.validate()?;
        if !self.display.is_valid() {
            return Err(EngineError::Config {
                message: format!(
                    "display bands must satisfy 0 <= warning_above ({}) <= critical_above ({}) <= 1",
                    self.display.warning_above, self.display.critical_above
                ),
            });
        }
        Ok(())
    }
}
