//! Ordered column definitions and the condition encoder.

use std::collections::BTreeSet;

use road_risk_incident_models::{HistoricalIncidentRecord, fields};
use serde::{Deserialize, Serialize};

use crate::{FeatureVector, RawConditions, SchemaError};

/// Standard score parameters fitted on the training data for one numeric
/// column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standardization {
    /// Training mean.
    pub mean: f64,
    /// Training population standard deviation.
    pub std_dev: f64,
}

impl Standardization {
    /// Fits mean and population standard deviation over `values`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }

    /// Standardizes `value`. A zero-variance column is only centered.
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        if self.std_dev > 0.0 {
            (value - self.mean) / self.std_dev
        } else {
            value - self.mean
        }
    }
}

/// One model input column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureColumn {
    /// A numeric field, copied (or standardized) into the vector.
    Numeric {
        /// Column name, identical to the dataset field name.
        name: String,
        /// Scaling fitted at training time, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scaling: Option<Standardization>,
    },
    /// One-hot indicator for a single categorical level.
    Indicator {
        /// Categorical field name (e.g. `Weather`).
        field: String,
        /// Level this column indicates (e.g. `Heavy Rain`).
        level: String,
    },
}

impl FeatureColumn {
    /// An unscaled numeric column.
    #[must_use]
    pub fn numeric(name: impl Into<String>) -> Self {
        Self::Numeric {
            name: name.into(),
            scaling: None,
        }
    }

    /// An indicator column for `field == level`.
    #[must_use]
    pub fn indicator(field: impl Into<String>, level: impl Into<String>) -> Self {
        Self::Indicator {
            field: field.into(),
            level: level.into(),
        }
    }

    /// Column name as the classifier sees it: the field name for numeric
    /// columns, `<Field>_<Level>` for indicators.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Numeric { name, .. } => name.clone(),
            Self::Indicator { field, level } => format!("{field}_{level}"),
        }
    }
}

/// Options for [`FeatureSchema::derive`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeriveOptions {
    /// Fit and record standard-score scaling for every numeric column.
    pub standardize: bool,
}

/// The canonical, ordered set of classifier input columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDef", into = "SchemaDef")]
pub struct FeatureSchema {
    columns: Vec<FeatureColumn>,
    names: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct SchemaDef {
    columns: Vec<FeatureColumn>,
}

impl TryFrom<SchemaDef> for FeatureSchema {
    type Error = SchemaError;

    fn try_from(def: SchemaDef) -> Result<Self, Self::Error> {
        Self::new(def.columns)
    }
}

impl From<FeatureSchema> for SchemaDef {
    fn from(schema: FeatureSchema) -> Self {
        Self {
            columns: schema.columns,
        }
    }
}

impl FeatureSchema {
    /// Creates a schema from explicit columns.
    ///
    /// # Errors
    ///
    /// * [`SchemaError::Undetermined`] if `columns` is empty.
    /// * [`SchemaError::DuplicateField`] if two columns share a name.
    pub fn new(columns: Vec<FeatureColumn>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Undetermined {
                message: "no feature columns".to_string(),
            });
        }

        let names: Vec<String> = columns.iter().map(FeatureColumn::name).collect();
        let mut seen = BTreeSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateField { name: name.clone() });
            }
        }

        Ok(Self { columns, names })
    }

    /// Builds the schema from a processed dataset's header.
    ///
    /// Label and coordinate columns are skipped. A column named
    /// `<Field>_<Level>` for one of `categorical_fields` becomes an
    /// indicator; everything else is numeric.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if no feature columns remain or a name repeats.
    pub fn from_columns<S: AsRef<str>>(
        header: &[S],
        categorical_fields: &[&str],
    ) -> Result<Self, SchemaError> {
        let columns = header
            .iter()
            .map(AsRef::as_ref)
            .filter(|c| !fields::NON_FEATURE.contains(c))
            .map(|column| {
                categorical_fields
                    .iter()
                    .filter_map(|field| {
                        column
                            .strip_prefix(field)
                            .and_then(|rest| rest.strip_prefix('_'))
                            .filter(|level| !level.is_empty())
                            .map(|level| (*field, level))
                    })
                    .max_by_key(|(field, _)| field.len())
                    .map_or_else(
                        || FeatureColumn::numeric(column),
                        |(field, level)| FeatureColumn::indicator(field, level),
                    )
            })
            .collect();

        Self::new(columns)
    }

    /// Derives the training schema from historical records.
    ///
    /// Numeric fields come first in [`fields::NUMERIC`] order, followed by
    /// the indicators of each field in [`fields::CATEGORICAL`]. Observed
    /// levels are sorted and the first one is dropped as the baseline.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Undetermined`] if `records` is empty.
    pub fn derive(
        records: &[HistoricalIncidentRecord],
        options: DeriveOptions,
    ) -> Result<Self, SchemaError> {
        if records.is_empty() {
            return Err(SchemaError::Undetermined {
                message: "no reference records to derive columns from".to_string(),
            });
        }

        let raws: Vec<RawConditions> = records.iter().map(RawConditions::from).collect();
        let mut columns = Vec::new();

        for &name in fields::NUMERIC {
            let scaling = options.standardize.then(|| {
                let values: Vec<f64> = raws
                    .iter()
                    .map(|r| r.numeric(name).unwrap_or(0.0))
                    .collect();
                Standardization::fit(&values)
            });
            columns.push(FeatureColumn::Numeric {
                name: name.to_string(),
                scaling,
            });
        }

        for &field in fields::CATEGORICAL {
            // blank cells are missing values, not a level
            let levels: BTreeSet<&str> = raws
                .iter()
                .filter_map(|r| r.level(field))
                .filter(|level| !level.is_empty())
                .collect();
            columns.extend(
                levels
                    .into_iter()
                    .skip(1)
                    .map(|level| FeatureColumn::indicator(field, level)),
            );
        }

        log::info!(
            "Derived feature schema with {} columns from {} records",
            columns.len(),
            records.len()
        );

        Self::new(columns)
    }

    /// Column names in canonical order.
    #[must_use]
    pub fn canonical_fields(&self) -> &[String] {
        &self.names
    }

    /// Column definitions in canonical order.
    #[must_use]
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always `false`; a schema has at least one column.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Levels of `field` that have their own indicator column.
    #[must_use]
    pub fn indicator_levels(&self, field: &str) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match c {
                FeatureColumn::Indicator { field: f, level } if f == field => {
                    Some(level.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Encodes `conditions` into a vector with exactly this schema's
    /// columns.
    ///
    /// Numeric columns take the supplied value (standardized when the
    /// column carries scaling) or `0.0` when absent. An indicator is `1.0`
    /// only when its field was supplied with its level; a level without an
    /// indicator column (the baseline, or one never seen in training)
    /// leaves every indicator of that field at `0.0`.
    #[must_use]
    pub fn encode(&self, conditions: &RawConditions) -> FeatureVector {
        for (field, level) in conditions.levels() {
            if !self.indicator_levels(field).contains(&level) {
                log::debug!("{field}={level:?} has no indicator column, encoding as baseline");
            }
        }

        FeatureVector::from_pairs(self.columns.iter().zip(&self.names).map(|(column, name)| {
            let value = match column {
                FeatureColumn::Numeric {
                    name: field,
                    scaling,
                } => conditions
                    .numeric(field)
                    .map_or(0.0, |raw| scaling.map_or(raw, |s| s.apply(raw))),
                FeatureColumn::Indicator { field, level } => {
                    if conditions.level(field) == Some(level.as_str()) {
                        1.0
                    } else {
                        0.0
                    }
                }
            };
            (name.clone(), value)
        }))
    }
}

#[cfg(test)]
mod tests {
    use road_risk_incident_models::{
        Coordinate, IncidentAttributes, Lighting, RoadConditions, RoadCurvature, Weather,
    };

    use super::*;

    fn record(weather: &str, lighting: &str, traffic: f64) -> HistoricalIncidentRecord {
        HistoricalIncidentRecord {
            location: Coordinate::new(19.0, 72.9),
            accident: true,
            timestamp: None,
            attributes: IncidentAttributes {
                weather: weather.to_string(),
                road_curvature: "Straight".to_string(),
                lighting: lighting.to_string(),
                surface_condition: "Smooth".to_string(),
                historical_accident_cause: "None".to_string(),
                news_sentiment: "Neutral".to_string(),
                road_surface_friction: 0.5,
                traffic_density: traffic,
                hcv_ratio: 0.2,
                speed_limit_breaches: 0.0,
                rash_driving_incidents: 0.0,
            },
        }
    }

    fn training_schema() -> FeatureSchema {
        FeatureSchema::from_columns(
            &[
                "Latitude",
                "Longitude",
                "Road_Surface_Friction",
                "Traffic_Density",
                "HCV_Ratio",
                "Hour",
                "Accident_Risk_Label",
                "Weather_Heavy Rain",
                "Weather_Mist/Fog",
                "Road_Curvature_Sharp Curve",
                "Road_Curvature_Straight",
                "Lighting_Night-Lit",
                "Lighting_Night-Unlit",
            ],
            fields::CATEGORICAL,
        )
        .unwrap()
    }

    fn conditions() -> RoadConditions {
        RoadConditions::new(
            Weather::HeavyRain,
            RoadCurvature::SharpCurve,
            Lighting::NightUnlit,
            420,
            0.5,
            23,
        )
    }

    #[test]
    fn header_columns_become_numeric_and_indicators() {
        let schema = training_schema();
        assert_eq!(schema.len(), 10);
        assert_eq!(schema.canonical_fields()[0], "Road_Surface_Friction");
        assert_eq!(
            schema.columns()[4],
            FeatureColumn::indicator("Weather", "Heavy Rain")
        );
        assert_eq!(
            schema.indicator_levels("Road_Curvature"),
            vec!["Sharp Curve", "Straight"]
        );
        assert!(
            !schema
                .canonical_fields()
                .iter()
                .any(|f| f == "Latitude" || f == "Accident_Risk_Label")
        );
    }

    #[test]
    fn encode_sets_matching_indicators() {
        let vector = training_schema().encode(&RawConditions::from(&conditions()));

        assert_eq!(vector.fields(), training_schema().canonical_fields());
        assert_eq!(vector.get("Traffic_Density"), Some(420.0));
        assert_eq!(vector.get("HCV_Ratio"), Some(0.5));
        assert_eq!(vector.get("Hour"), Some(23.0));
        assert_eq!(vector.get("Road_Surface_Friction"), Some(0.6));
        assert_eq!(vector.get("Weather_Heavy Rain"), Some(1.0));
        assert_eq!(vector.get("Weather_Mist/Fog"), Some(0.0));
        assert_eq!(vector.get("Road_Curvature_Sharp Curve"), Some(1.0));
        assert_eq!(vector.get("Road_Curvature_Straight"), Some(0.0));
        assert_eq!(vector.get("Lighting_Night-Unlit"), Some(1.0));
        assert_eq!(vector.get("Lighting_Night-Lit"), Some(0.0));
    }

    #[test]
    fn encode_is_deterministic_across_calls() {
        let schema = training_schema();
        let raw = RawConditions::from(&conditions());
        let first = schema.encode(&raw);
        let _other = schema.encode(&RawConditions::new().with_level("Weather", "Fine"));
        let second = schema.encode(&raw);
        assert_eq!(first, second);
    }

    #[test]
    fn unrecognized_level_falls_back_to_baseline() {
        let schema = training_schema();
        let raw = RawConditions::new()
            .with_level("Weather", "Dust Storm")
            .with_level("Lighting", "Eclipse");
        let vector = schema.encode(&raw);

        for field in ["Weather", "Lighting"] {
            for level in schema.indicator_levels(field) {
                assert_eq!(
                    vector.get(&format!("{field}_{level}")),
                    Some(0.0),
                    "{field}_{level} should stay at baseline"
                );
            }
        }
        assert_eq!(vector.len(), schema.len());
    }

    #[test]
    fn missing_numeric_fields_encode_as_zero() {
        let vector = training_schema().encode(&RawConditions::new());
        assert!(vector.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn derive_drops_first_sorted_level() {
        let records = vec![
            record("Fine", "Daylight", 100.0),
            record("Heavy Rain", "Night-Unlit", 300.0),
            record("Mist/Fog", "Dusk", 200.0),
        ];
        let schema = FeatureSchema::derive(&records, DeriveOptions::default()).unwrap();

        assert_eq!(&schema.canonical_fields()[..6], fields::NUMERIC);
        assert_eq!(
            schema.indicator_levels("Weather"),
            vec!["Heavy Rain", "Mist/Fog"]
        );
        assert_eq!(
            schema.indicator_levels("Lighting"),
            vec!["Dusk", "Night-Unlit"]
        );
        // single observed level means only the baseline, no columns
        assert!(schema.indicator_levels("Road_Curvature").is_empty());
    }

    #[test]
    fn derive_ignores_blank_levels() {
        let records = vec![
            record("Fine", "Daylight", 100.0),
            record("Fine", "", 120.0),
            record("Fine", "Dusk", 140.0),
            record("", "Night-Unlit", 160.0),
        ];
        let schema = FeatureSchema::derive(&records, DeriveOptions::default()).unwrap();

        assert_eq!(
            schema.indicator_levels("Lighting"),
            vec!["Dusk", "Night-Unlit"]
        );
        assert!(schema.indicator_levels("Weather").is_empty());
        assert!(!schema.canonical_fields().iter().any(|f| f.ends_with('_')));
    }

    #[test]
    fn derive_without_records_is_undetermined() {
        let err = FeatureSchema::derive(&[], DeriveOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::Undetermined { .. }));
    }

    #[test]
    fn derive_standardizes_numeric_columns() {
        let records = vec![
            record("Fine", "Daylight", 100.0),
            record("Fine", "Daylight", 300.0),
        ];
        let schema = FeatureSchema::derive(&records, DeriveOptions { standardize: true }).unwrap();

        let Some(FeatureColumn::Numeric {
            scaling: Some(scaling),
            ..
        }) = schema
            .columns()
            .iter()
            .find(|c| c.name() == "Traffic_Density")
        else {
            panic!("Traffic_Density should carry scaling");
        };
        assert!((scaling.mean - 200.0).abs() < 1e-9);
        assert!((scaling.std_dev - 100.0).abs() < 1e-9);

        let vector = schema.encode(&RawConditions::new().with_numeric("Traffic_Density", 300.0));
        assert!((vector.get("Traffic_Density").unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_variance_column_is_only_centered() {
        let scaling = Standardization::fit(&[5.0, 5.0]);
        assert!((scaling.apply(7.0) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_and_duplicate_columns_are_rejected() {
        assert!(matches!(
            FeatureSchema::new(vec![]),
            Err(SchemaError::Undetermined { .. })
        ));
        assert!(matches!(
            FeatureSchema::new(vec![
                FeatureColumn::numeric("Hour"),
                FeatureColumn::numeric("Hour"),
            ]),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn serde_roundtrip_revalidates() {
        let schema = training_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let back: FeatureSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back.canonical_fields(), schema.canonical_fields());

        let bad = r#"{"columns":[]}"#;
        assert!(serde_json::from_str::<FeatureSchema>(bad).is_err());
    }
}
