//! Historical incident CSV loading.
//!
//! Expected header (column order does not matter; optional columns may be
//! absent):
//!
//! ```text
//! Latitude,Longitude,Timestamp,Weather,Road_Surface_Friction,Traffic_Density,
//! HCV_Ratio,Road_Curvature,Lighting,Surface_Condition,Historical_Accident_Cause,
//! News_Sentiment,Speed_Limit_Breaches,Rash_Driving_Incidents,Accident_Risk_Label
//! ```
//!
//! Categorical columns are kept as raw text. Timestamps may be
//! `YYYY-MM-DD HH:MM:SS` or RFC 3339.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use road_risk_incident_models::{
    Coordinate, DEFAULT_ROAD_SURFACE_FRICTION, HistoricalIncidentRecord, IncidentAttributes,
};
use serde::Deserialize;

use crate::EngineError;

#[derive(Debug, Deserialize)]
struct DatasetRow {
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
    #[serde(rename = "Timestamp", default)]
    timestamp: Option<String>,
    #[serde(rename = "Weather", default)]
    weather: String,
    #[serde(rename = "Road_Curvature", default)]
    road_curvature: String,
    #[serde(rename = "Lighting", default)]
    lighting: String,
    #[serde(rename = "Surface_Condition", default)]
    surface_condition: String,
    #[serde(rename = "Historical_Accident_Cause", default)]
    historical_accident_cause: String,
    #[serde(rename = "News_Sentiment", default)]
    news_sentiment: String,
    #[serde(rename = "Road_Surface_Friction", default)]
    road_surface_friction: Option<f64>,
    #[serde(rename = "Traffic_Density", default)]
    traffic_density: Option<f64>,
    #[serde(rename = "HCV_Ratio", default)]
    hcv_ratio: Option<f64>,
    #[serde(rename = "Speed_Limit_Breaches", default)]
    speed_limit_breaches: Option<f64>,
    #[serde(rename = "Rash_Driving_Incidents", default)]
    rash_driving_incidents: Option<f64>,
    #[serde(rename = "Accident_Risk_Label")]
    accident: String,
}

/// Parses a dataset timestamp.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

fn parse_label(s: &str) -> Option<bool> {
    match s {
        "1" | "1.0" | "true" | "True" => Some(true),
        "0" | "0.0" | "false" | "False" => Some(false),
        _ => None,
    }
}

impl DatasetRow {
    fn into_record(self, line: u64) -> Result<HistoricalIncidentRecord, EngineError> {
        let accident = parse_label(&self.accident).ok_or_else(|| EngineError::Dataset {
            line,
            message: format!("Accident_Risk_Label must be 0 or 1, got '{}'", self.accident),
        })?;

        let timestamp = match self.timestamp.as_deref() {
            None | Some("") => None,
            Some(s) => Some(parse_timestamp(s).ok_or_else(|| EngineError::Dataset {
                line,
                message: format!("unrecognized timestamp '{s}'"),
            })?),
        };

        Ok(HistoricalIncidentRecord {
            location: Coordinate::new(self.latitude, self.longitude),
            accident,
            timestamp,
            attributes: IncidentAttributes {
                weather: self.weather,
                road_curvature: self.road_curvature,
                lighting: self.lighting,
                surface_condition: self.surface_condition,
                historical_accident_cause: self.historical_accident_cause,
                news_sentiment: self.news_sentiment,
                road_surface_friction: self
                    .road_surface_friction
                    .unwrap_or(DEFAULT_ROAD_SURFACE_FRICTION),
                traffic_density: self.traffic_density.unwrap_or(0.0),
                hcv_ratio: self.hcv_ratio.unwrap_or(0.0),
                speed_limit_breaches: self.speed_limit_breaches.unwrap_or(0.0),
                rash_driving_incidents: self.rash_driving_incidents.unwrap_or(0.0),
            },
        })
    }
}

/// Reads every record from CSV `reader`.
///
/// # Errors
///
/// * [`EngineError::Csv`] for malformed CSV or non-numeric numeric cells
/// * [`EngineError::Dataset`] for an invalid label or timestamp
pub fn read_dataset<R: Read>(reader: R) -> Result<Vec<HistoricalIncidentRecord>, EngineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    let mut raw = csv::StringRecord::new();
    while rdr.read_record(&mut raw)? {
        let line = raw.position().map_or(0, csv::Position::line);
        let row: DatasetRow = raw.deserialize(Some(&headers))?;
        records.push(row.into_record(line)?);
    }

    log::debug!("Read {} historical records", records.len());
    Ok(records)
}

/// Reads the dataset at `path`.
///
/// # Errors
///
/// Returns [`EngineError`] if the file cannot be opened or parsed.
pub fn load_dataset(path: &Path) -> Result<Vec<HistoricalIncidentRecord>, EngineError> {
    let file = std::fs::File::open(path)?;
    let records = read_dataset(file)?;
    log::info!(
        "Loaded {} historical records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}
