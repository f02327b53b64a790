#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end road risk assessment.
//!
//! Ties the pipeline together: conditions are encoded with the model's
//! [`FeatureSchema`](road_risk_schema::FeatureSchema), scored, turned into
//! an action plan and matched against the hotspot snapshot.
//!
//! The model and hotspots are loaded once into a [`RiskResources`] bundle
//! that is cheap to clone and shared read-only between callers. A new
//! clustering run produces a new bundle through
//! [`RiskResources::with_hotspots`]; existing bundles are never mutated.

pub mod config;
pub mod dataset;
pub mod resources;

use road_risk_action_plan::PlanError;
use road_risk_conditions::ProviderError;
use road_risk_hotspot::HotspotError;
use road_risk_schema::SchemaError;
use road_risk_scoring::ScoreError;
use thiserror::Error;

pub use config::{EngineConfig, ProviderConfig, ResourcesConfig};
pub use dataset::{load_dataset, read_dataset};
pub use resources::{Assessment, HotspotProximity, RiskResources};

/// Errors from configuring or running the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Feature schema error.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Hotspot clustering error.
    #[error(transparent)]
    Hotspot(#[from] HotspotError),

    /// Scoring or model loading error.
    #[error(transparent)]
    Score(#[from] ScoreError),

    /// Action plan error.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Live condition provider error.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be parsed.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration parsed but is unusable.
    #[error("Invalid config: {message}")]
    Config {
        /// What is wrong.
        message: String,
    },

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A dataset row is malformed.
    #[error("Dataset line {line}: {message}")]
    Dataset {
        /// One-based line number in the file.
        line: u64,
        /// What is wrong with the row.
        message: String,
    },
}
