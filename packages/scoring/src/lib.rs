#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Accident risk scoring.
//!
//! Wraps any trained classifier implementing [`RiskClassifier`]. The scorer
//! neither trains nor calibrates: it checks that a [`FeatureVector`] has
//! exactly the columns the classifier was fit on, asks for a probability
//! and checks the answer is a probability.

pub mod logistic;

use road_risk_schema::{FeatureVector, SchemaMismatch};
use serde::Serialize;

pub use logistic::LogisticModel;

/// Errors from scoring or loading a classifier.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// The vector's columns differ from the classifier's.
    #[error(transparent)]
    SchemaMismatch(#[from] SchemaMismatch),

    /// The classifier returned something outside `[0, 1]`.
    #[error("Classifier returned {0}, expected a probability in [0, 1]")]
    InvalidProbability(f64),

    /// A model artifact is inconsistent.
    #[error("Invalid model: {message}")]
    InvalidModel {
        /// What is inconsistent.
        message: String,
    },

    /// A model artifact could not be parsed.
    #[error("Model parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A trained classifier producing the probability of an accident.
///
/// Implementations are loaded once and shared read-only, so they must be
/// `Send + Sync` and must not mutate state while predicting.
pub trait RiskClassifier: Send + Sync {
    /// Columns the classifier was fit on, in training order.
    fn expected_fields(&self) -> &[String];

    /// Probability in `[0, 1]` that an accident occurs. Only called with
    /// vectors whose columns equal [`Self::expected_fields`].
    fn predict_probability(&self, features: &FeatureVector) -> f64;
}

/// Outcome of one scoring call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Accident probability in `[0, 1]`.
    pub probability: f64,
    /// The vector that produced it.
    pub features: FeatureVector,
}

/// Scores `features` with `classifier`.
///
/// # Errors
///
/// * [`ScoreError::SchemaMismatch`] if the columns differ in membership or
///   order; the classifier is not called.
/// * [`ScoreError::InvalidProbability`] if the classifier breaks its
///   contract.
pub fn score<C>(features: FeatureVector, classifier: &C) -> Result<RiskAssessment, ScoreError>
where
    C: RiskClassifier + ?Sized,
{
    SchemaMismatch::check(classifier.expected_fields(), features.fields())?;

    let probability = classifier.predict_probability(&features);
    if !(0.0..=1.0).contains(&probability) {
        return Err(ScoreError::InvalidProbability(probability));
    }

    log::debug!("Scored {} features: p={probability:.4}", features.len());

    Ok(RiskAssessment {
        probability,
        features,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use road_risk_incident_models::{Lighting, RoadConditions, RoadCurvature, Weather, fields};
    use road_risk_schema::{FeatureSchema, RawConditions};

    use super::*;

    struct CountingClassifier {
        fields: Vec<String>,
        output: f64,
        calls: AtomicUsize,
    }

    impl CountingClassifier {
        fn new(schema: &FeatureSchema, output: f64) -> Self {
            Self {
                fields: schema.canonical_fields().to_vec(),
                output,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RiskClassifier for CountingClassifier {
        fn expected_fields(&self) -> &[String] {
            &self.fields
        }

        fn predict_probability(&self, _features: &FeatureVector) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output
        }
    }

    fn schema() -> FeatureSchema {
        FeatureSchema::from_columns(
            &[
                "Road_Surface_Friction",
                "Traffic_Density",
                "HCV_Ratio",
                "Hour",
                "Weather_Heavy Rain",
                "Weather_Mist/Fog",
                "Lighting_Night-Unlit",
            ],
            fields::CATEGORICAL,
        )
        .unwrap()
    }

    fn conditions(weather: Weather) -> RawConditions {
        RawConditions::from(&RoadConditions::new(
            weather,
            RoadCurvature::Straight,
            Lighting::Daylight,
            150,
            0.3,
            14,
        ))
    }

    #[test]
    fn scores_matching_vector() {
        let schema = schema();
        let classifier = CountingClassifier::new(&schema, 0.42);
        let vector = schema.encode(&conditions(Weather::HeavyRain));

        let assessment = score(vector.clone(), &classifier).unwrap();
        assert!((assessment.probability - 0.42).abs() < f64::EPSILON);
        assert_eq!(assessment.features, vector);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn baseline_level_still_scores() {
        let schema = schema();
        let classifier = CountingClassifier::new(&schema, 0.1);
        let vector = schema.encode(&conditions(Weather::DustStorm));

        assert_eq!(vector.get("Weather_Heavy Rain"), Some(0.0));
        assert_eq!(vector.get("Weather_Mist/Fog"), Some(0.0));
        assert!(score(vector, &classifier).is_ok());
    }

    #[test]
    fn missing_field_is_rejected_without_calling_classifier() {
        let schema = schema();
        let classifier = CountingClassifier::new(&schema, 0.5);
        let vector = schema.encode(&conditions(Weather::Fine)).without("HCV_Ratio");

        let err = score(vector, &classifier).unwrap_err();
        let ScoreError::SchemaMismatch(mismatch) = err else {
            panic!("expected a schema mismatch");
        };
        assert_eq!(mismatch.missing, vec!["HCV_Ratio".to_string()]);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn extra_and_reordered_fields_are_rejected() {
        let schema = schema();
        let classifier = CountingClassifier::new(&schema, 0.5);
        let vector = schema.encode(&conditions(Weather::Fine));

        let extra = FeatureVector::from_pairs(
            vector
                .iter()
                .map(|(f, v)| (f.to_string(), v))
                .chain([("Speed_Limit_Breaches".to_string(), 0.0)]),
        );
        assert!(matches!(
            score(extra, &classifier),
            Err(ScoreError::SchemaMismatch(_))
        ));

        let mut pairs: Vec<(String, f64)> =
            vector.iter().map(|(f, v)| (f.to_string(), v)).collect();
        pairs.swap(0, 1);
        let Err(ScoreError::SchemaMismatch(mismatch)) =
            score(FeatureVector::from_pairs(pairs), &classifier)
        else {
            panic!("reordered vector should not score");
        };
        assert!(mismatch.reordered);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn out_of_range_probability_is_a_contract_violation() {
        let schema = schema();
        for output in [1.5, -0.1, f64::NAN] {
            let classifier = CountingClassifier::new(&schema, output);
            let vector = schema.encode(&conditions(Weather::Fine));
            assert!(matches!(
                score(vector, &classifier),
                Err(ScoreError::InvalidProbability(_))
            ));
        }
    }

    #[test]
    fn works_through_trait_objects() {
        let schema = schema();
        let classifier: Box<dyn RiskClassifier> = Box::new(CountingClassifier::new(&schema, 0.7));
        let vector = schema.encode(&conditions(Weather::MistFog));
        assert!(score(vector, classifier.as_ref()).is_ok());
    }
}
