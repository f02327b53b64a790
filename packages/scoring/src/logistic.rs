//! Logistic regression model artifact.
//!
//! The artifact is a JSON document carrying the [`FeatureSchema`] the model
//! was fit with alongside its weights, so the encoder used at inference is
//! always the one used at training:
//!
//! ```json
//! {
//!   "schema": { "columns": [ { "kind": "numeric", "name": "Traffic_Density" } ] },
//!   "intercept": -2.1,
//!   "coefficients": [0.004]
//! }
//! ```

use road_risk_schema::{FeatureSchema, FeatureVector};
use serde::{Deserialize, Serialize};

use crate::{RiskClassifier, ScoreError};

/// `sigmoid(intercept + coefficients · x)` over a fixed schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelDef", into = "ModelDef")]
pub struct LogisticModel {
    schema: FeatureSchema,
    intercept: f64,
    coefficients: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct ModelDef {
    schema: FeatureSchema,
    intercept: f64,
    coefficients: Vec<f64>,
}

impl TryFrom<ModelDef> for LogisticModel {
    type Error = ScoreError;

    fn try_from(def: ModelDef) -> Result<Self, Self::Error> {
        Self::new(def.schema, def.intercept, def.coefficients)
    }
}

impl From<LogisticModel> for ModelDef {
    fn from(model: LogisticModel) -> Self {
        Self {
            schema: model.schema,
            intercept: model.intercept,
            coefficients: model.coefficients,
        }
    }
}

impl LogisticModel {
    /// Creates a model with one coefficient per schema column.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::InvalidModel`] if the coefficient count differs
    /// from the schema width or any weight is non-finite.
    pub fn new(
        schema: FeatureSchema,
        intercept: f64,
        coefficients: Vec<f64>,
    ) -> Result<Self, ScoreError> {
        if coefficients.len() != schema.len() {
            return Err(ScoreError::InvalidModel {
                message: format!(
                    "{} coefficients for {} schema columns",
                    coefficients.len(),
                    schema.len()
                ),
            });
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ScoreError::InvalidModel {
                message: "non-finite weight".to_string(),
            });
        }
        Ok(Self {
            schema,
            intercept,
            coefficients,
        })
    }

    /// Parses a model artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::Json`] for malformed JSON and for schemas or
    /// weights that fail validation.
    pub fn from_json(json: &str) -> Result<Self, ScoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Schema the model was fit on.
    #[must_use]
    pub const fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Intercept term.
    #[must_use]
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Weights, aligned with the schema columns.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl RiskClassifier for LogisticModel {
    fn expected_fields(&self) -> &[String] {
        self.schema.canonical_fields()
    }

    fn predict_probability(&self, features: &FeatureVector) -> f64 {
        let logit = features
            .values()
            .iter()
            .zip(&self.coefficients)
            .fold(self.intercept, |acc, (x, w)| x.mul_add(*w, acc));
        sigmoid(logit)
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use road_risk_schema::FeatureColumn;

    use super::*;
    use crate::score;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec![
            FeatureColumn::numeric("Traffic_Density"),
            FeatureColumn::indicator("Weather", "Heavy Rain"),
        ])
        .unwrap()
    }

    #[test]
    fn predicts_sigmoid_of_linear_score() {
        let model = LogisticModel::new(schema(), -2.0, vec![0.005, 1.5]).unwrap();
        let vector =
            FeatureVector::from_pairs([("Traffic_Density", 400.0), ("Weather_Heavy Rain", 1.0)]);

        let p = model.predict_probability(&vector);
        let expected = 1.0 / (1.0 + (-1.5_f64).exp());
        assert!((p - expected).abs() < 1e-12);
    }

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert!((sigmoid(0.0) - 0.5).abs() < f64::EPSILON);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(1000.0) <= 1.0);
        assert!(sigmoid(-1000.0).is_finite());
    }

    #[test]
    fn rejects_width_mismatch_and_non_finite_weights() {
        assert!(matches!(
            LogisticModel::new(schema(), 0.0, vec![1.0]),
            Err(ScoreError::InvalidModel { .. })
        ));
        assert!(matches!(
            LogisticModel::new(schema(), f64::NAN, vec![1.0, 1.0]),
            Err(ScoreError::InvalidModel { .. })
        ));
    }

    #[test]
    fn json_artifact_roundtrips() {
        let model = LogisticModel::new(schema(), -1.0, vec![0.01, 2.0]).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let back = LogisticModel::from_json(&json).unwrap();
        assert_eq!(back, model);
        assert_eq!(back.expected_fields(), &["Traffic_Density", "Weather_Heavy Rain"]);
    }

    #[test]
    fn json_artifact_with_bad_width_is_rejected() {
        let json = r#"{
            "schema": {"columns": [{"kind": "numeric", "name": "Hour"}]},
            "intercept": 0.0,
            "coefficients": [1.0, 2.0]
        }"#;
        assert!(LogisticModel::from_json(json).is_err());
    }

    #[test]
    fn scores_through_the_shared_contract() {
        let model = LogisticModel::new(schema(), 0.0, vec![0.0, 0.0]).unwrap();
        let raw = road_risk_schema::RawConditions::new().with_numeric("Traffic_Density", 100.0);
        let vector = model.schema().encode(&raw);
        let assessment = score(vector, &model).unwrap();
        assert!((assessment.probability - 0.5).abs() < f64::EPSILON);
    }
}
