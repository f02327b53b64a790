//! The shared, read-only serving bundle.

use std::sync::Arc;

use road_risk_action_plan::{
    ActionPlan, ContributingFactors, DisplayBands, RiskLevel, build_plan_with_bands,
};
use road_risk_conditions::ConditionProvider;
use road_risk_hotspot::{HotspotSnapshot, detect};
use road_risk_incident_models::{Coordinate, RoadConditions, RoadCurvature};
use road_risk_schema::{FeatureSchema, RawConditions, SchemaMismatch};
use road_risk_scoring::{LogisticModel, RiskAssessment, RiskClassifier, ScoreError, score};
use serde::Serialize;

use crate::{EngineConfig, EngineError, load_dataset};

/// How a queried location relates to its nearest hotspot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotProximity {
    /// Hotspot id.
    pub id: u32,
    /// Display name, e.g. `Black Spot 1`.
    pub name: String,
    /// Planar distance to the hotspot centroid, in degrees.
    pub distance: f64,
    /// Whether the location lies inside the hotspot zone.
    pub inside: bool,
}

/// Everything known about one road segment at one moment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Conditions that were assessed.
    pub conditions: RoadConditions,
    /// Probability and the vector that produced it.
    pub risk: RiskAssessment,
    /// Badge for the probability.
    pub level: RiskLevel,
    /// Prioritized recommendations.
    pub plan: ActionPlan,
    /// Nearest hotspot, when a location was given and hotspots exist.
    pub nearest_hotspot: Option<HotspotProximity>,
}

/// Classifier, schema and hotspots loaded once and shared by every
/// assessment. Cloning shares the underlying data.
#[derive(Clone)]
pub struct RiskResources {
    schema: Arc<FeatureSchema>,
    classifier: Arc<dyn RiskClassifier>,
    hotspots: Arc<HotspotSnapshot>,
    bands: DisplayBands,
}

impl std::fmt::Debug for RiskResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskResources")
            .field("schema_columns", &self.schema.len())
            .field("hotspots", &self.hotspots)
            .field("bands", &self.bands)
            .finish_non_exhaustive()
    }
}

impl RiskResources {
    /// Bundles a classifier with the schema used to encode its input.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Score`] if `schema` does not produce the
    /// columns `classifier` expects.
    pub fn new(
        schema: FeatureSchema,
        classifier: Arc<dyn RiskClassifier>,
        hotspots: HotspotSnapshot,
        bands: DisplayBands,
    ) -> Result<Self, EngineError> {
        SchemaMismatch::check(classifier.expected_fields(), schema.canonical_fields())
            .map_err(ScoreError::from)?;
        Ok(Self {
            schema: Arc::new(schema),
            classifier,
            hotspots: Arc::new(hotspots),
            bands,
        })
    }

    /// Bundles a logistic model, which carries its own schema.
    #[must_use]
    pub fn from_model(model: LogisticModel, hotspots: HotspotSnapshot, bands: DisplayBands) -> Self {
        Self {
            schema: Arc::new(model.schema().clone()),
            classifier: Arc::new(model),
            hotspots: Arc::new(hotspots),
            bands,
        }
    }

    /// Loads the model and, if configured, clusters the historical dataset.
    ///
    /// # Errors
    ///
    /// * [`EngineError::Config`] if no model path is configured
    /// * any error reading the model, reading the dataset or clustering it
    pub fn load(config: &EngineConfig) -> Result<Self, EngineError> {
        let model_path = config
            .resources
            .model
            .as_deref()
            .ok_or_else(|| EngineError::Config {
                message: "no model configured ([resources] model)".to_string(),
            })?;
        let model = LogisticModel::from_json(&std::fs::read_to_string(model_path)?)?;
        log::info!(
            "Loaded model from {} ({} features)",
            model_path.display(),
            model.schema().len()
        );

        let hotspots = match config.resources.dataset.as_deref() {
            Some(path) => {
                let records = load_dataset(path)?;
                HotspotSnapshot::from(detect(&records, config.clustering)?)
            }
            None => {
                log::info!("No dataset configured, serving without hotspots");
                HotspotSnapshot::empty()
            }
        };

        Ok(Self::from_model(model, hotspots, config.display))
    }

    /// A bundle sharing this classifier with a replacement hotspot set.
    #[must_use]
    pub fn with_hotspots(&self, hotspots: HotspotSnapshot) -> Self {
        Self {
            hotspots: Arc::new(hotspots),
            ..self.clone()
        }
    }

    /// Encoding schema.
    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Current hotspots.
    #[must_use]
    pub fn hotspots(&self) -> &HotspotSnapshot {
        &self.hotspots
    }

    /// Plan display bands.
    #[must_use]
    pub const fn bands(&self) -> DisplayBands {
        self.bands
    }

    /// Scores `conditions`, builds the action plan and, when `location` is
    /// given, finds the nearest hotspot.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Score`] if the classifier misbehaves.
    pub fn assess(
        &self,
        conditions: &RoadConditions,
        location: Option<Coordinate>,
    ) -> Result<Assessment, EngineError> {
        let vector = self.schema.encode(&RawConditions::from(conditions));
        let risk = score(vector, self.classifier.as_ref())?;
        let plan = build_plan_with_bands(
            risk.probability,
            &ContributingFactors::from(conditions),
            &self.bands,
        )?;

        let nearest_hotspot = location
            .and_then(|c| self.hotspots.nearest(&c))
            .map(|m| HotspotProximity {
                id: m.hotspot.id,
                name: m.hotspot.name.clone(),
                distance: m.distance,
                inside: m.inside,
            });

        log::info!(
            "Assessed risk {:.3} ({}), {} recommendation(s)",
            risk.probability,
            RiskLevel::from_probability(risk.probability),
            plan.len()
        );

        Ok(Assessment {
            conditions: conditions.clone(),
            level: RiskLevel::from_probability(risk.probability),
            risk,
            plan,
            nearest_hotspot,
        })
    }

    /// Fetches live readings at `location` and assesses them.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Provider`] if the provider fails, otherwise
    /// as [`Self::assess`].
    pub async fn assess_live(
        &self,
        provider: &dyn ConditionProvider,
        location: Coordinate,
        hour: u32,
        road_curvature: RoadCurvature,
    ) -> Result<Assessment, EngineError> {
        let readings = provider.current_conditions(location, hour).await?;
        let conditions = readings.into_conditions(road_curvature, hour);
        self.assess(&conditions, Some(location))
    }
}
