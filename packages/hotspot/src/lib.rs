#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Accident hotspot ("black spot") detection.
//!
//! [`detect`] keeps only qualifying accidents from the historical records,
//! clusters their coordinates with [`dbscan`] and summarizes every cluster
//! as a named [`Hotspot`]. Each run produces a complete [`HotspotReport`];
//! a [`HotspotSnapshot`] built from it is the read-only reference data the
//! serving path matches live locations against.

pub mod dbscan;
pub mod snapshot;

use geo::{Centroid, MultiPoint, Point};
use road_risk_incident_models::{Coordinate, HistoricalIncidentRecord};
use serde::{Deserialize, Serialize};

pub use dbscan::ClusterLabel;
pub use snapshot::{HotspotMatch, HotspotSnapshot};

/// Errors from a clustering run. All of them are input validation
/// failures; a run never fails part way through.
#[derive(Debug, thiserror::Error)]
pub enum HotspotError {
    /// A record has a non-finite or out-of-range coordinate.
    #[error("Invalid coordinate ({latitude}, {longitude}) in record {index}")]
    InvalidGeometry {
        /// Index of the offending record in the input.
        index: usize,
        /// Offending latitude.
        latitude: f64,
        /// Offending longitude.
        longitude: f64,
    },

    /// `eps` or `min_samples` is unusable.
    #[error("Invalid clustering parameters: {message}")]
    InvalidParameters {
        /// What is wrong with the parameters.
        message: String,
    },
}

/// DBSCAN parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClusteringParams {
    /// Neighborhood radius in degrees (planar). `0.01` is roughly 1 km.
    #[serde(default = "default_eps")]
    pub eps: f64,
    /// Minimum neighborhood size, the point itself included, for a core
    /// point.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

const fn default_eps() -> f64 {
    0.01
}

const fn default_min_samples() -> usize {
    5
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            eps: default_eps(),
            min_samples: default_min_samples(),
        }
    }
}

impl ClusteringParams {
    /// Creates parameters from `eps` (degrees) and `min_samples`.
    #[must_use]
    pub const fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Checks that `eps` is finite and positive and `min_samples` is at
    /// least one.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::InvalidParameters`] otherwise.
    pub fn validate(&self) -> Result<(), HotspotError> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(HotspotError::InvalidParameters {
                message: format!("eps must be a positive finite number, got {}", self.eps),
            });
        }
        if self.min_samples == 0 {
            return Err(HotspotError::InvalidParameters {
                message: "min_samples must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// A dense cluster of historical accidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Cluster id from the run that produced this hotspot.
    pub id: u32,
    /// Display name (e.g. "Black Spot 1").
    pub name: String,
    /// Mean position of the members.
    pub centroid: Coordinate,
    /// Largest member distance from the centroid, in degrees.
    pub radius: f64,
    /// Number of member incidents.
    pub member_count: usize,
    /// Input record indices of the members, ascending.
    pub members: Vec<usize>,
}

impl Hotspot {
    fn from_members(id: u32, members: Vec<usize>, records: &[HistoricalIncidentRecord]) -> Self {
        let points: MultiPoint<f64> = members
            .iter()
            .map(|&i| {
                let c = records[i].location;
                Point::new(c.longitude, c.latitude)
            })
            .collect();
        let centroid = points.centroid().map_or_else(
            || records[members[0]].location,
            |p| Coordinate::new(p.y(), p.x()),
        );
        let radius = members
            .iter()
            .map(|&i| centroid.planar_distance(&records[i].location))
            .fold(0.0, f64::max);

        Self {
            id,
            name: format!("Black Spot {}", id + 1),
            centroid,
            radius,
            member_count: members.len(),
            members,
        }
    }
}

/// Cluster assignment of one qualifying accident record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Index of the record in the input.
    pub record_index: usize,
    /// Cluster it landed in, or noise.
    pub label: ClusterLabel,
}

/// Complete output of one clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotReport {
    /// Parameters the run used.
    pub params: ClusteringParams,
    /// Detected hotspots, ordered by id.
    pub hotspots: Vec<Hotspot>,
    /// Label of every qualifying accident, in input order.
    pub assignments: Vec<Assignment>,
}

impl HotspotReport {
    fn empty(params: ClusteringParams) -> Self {
        Self {
            params,
            hotspots: Vec::new(),
            assignments: Vec::new(),
        }
    }

    /// Number of detected hotspots.
    #[must_use]
    pub fn hotspot_count(&self) -> usize {
        self.hotspots.len()
    }

    /// Whether the run found no hotspot at all (empty history or every
    /// accident isolated).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }

    /// Number of qualifying accidents that were clustered.
    #[must_use]
    pub fn qualifying_count(&self) -> usize {
        self.assignments.len()
    }

    /// Record indices of isolated accidents.
    #[must_use]
    pub fn noise(&self) -> Vec<usize> {
        self.assignments
            .iter()
            .filter(|a| a.label.is_noise())
            .map(|a| a.record_index)
            .collect()
    }

    /// Label of `record_index`, or `None` if that record was not a
    /// qualifying accident.
    #[must_use]
    pub fn label_of(&self, record_index: usize) -> Option<ClusterLabel> {
        self.assignments
            .iter()
            .find(|a| a.record_index == record_index)
            .map(|a| a.label)
    }
}

/// Clusters the qualifying accidents in `records` into hotspots.
///
/// Only records with `accident == true` take part. Empty history, or
/// history with no qualifying accident, yields an empty report.
///
/// # Errors
///
/// * [`HotspotError::InvalidParameters`] for a non-positive `eps` or zero
///   `min_samples`.
/// * [`HotspotError::InvalidGeometry`] for the first record (qualifying or
///   not) with a non-finite or out-of-range coordinate.
pub fn detect(
    records: &[HistoricalIncidentRecord],
    params: ClusteringParams,
) -> Result<HotspotReport, HotspotError> {
    params.validate()?;

    if let Some((index, record)) = records
        .iter()
        .enumerate()
        .find(|(_, r)| !r.location.is_valid())
    {
        return Err(HotspotError::InvalidGeometry {
            index,
            latitude: record.location.latitude,
            longitude: record.location.longitude,
        });
    }

    let qualifying: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.accident)
        .map(|(i, _)| i)
        .collect();

    if qualifying.is_empty() {
        log::warn!(
            "No qualifying accidents among {} records, skipping hotspot detection",
            records.len()
        );
        return Ok(HotspotReport::empty(params));
    }

    let points: Vec<[f64; 2]> = qualifying
        .iter()
        .map(|&i| records[i].location.to_point())
        .collect();
    let labels = dbscan::cluster(&points, params.eps, params.min_samples);

    let cluster_count = labels
        .iter()
        .filter_map(|l| l.cluster_id())
        .max()
        .map_or(0, |max| max + 1);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); cluster_count as usize];
    for (&record_index, label) in qualifying.iter().zip(&labels) {
        if let Some(id) = label.cluster_id() {
            members[id as usize].push(record_index);
        }
    }

    let hotspots: Vec<Hotspot> = members
        .into_iter()
        .zip(0_u32..)
        .map(|(m, id)| Hotspot::from_members(id, m, records))
        .collect();

    let assignments: Vec<Assignment> = qualifying
        .iter()
        .zip(labels)
        .map(|(&record_index, label)| Assignment {
            record_index,
            label,
        })
        .collect();

    let report = HotspotReport {
        params,
        hotspots,
        assignments,
    };

    if report.is_empty() {
        log::warn!(
            "All {} qualifying accidents are isolated, no hotspots detected",
            report.qualifying_count()
        );
    } else {
        log::info!(
            "Detected {} hotspots from {} qualifying accidents ({} isolated)",
            report.hotspot_count(),
            report.qualifying_count(),
            report.noise().len()
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use road_risk_incident_models::IncidentAttributes;

    use super::*;

    fn incident(lat: f64, lon: f64, accident: bool) -> HistoricalIncidentRecord {
        HistoricalIncidentRecord {
            location: Coordinate::new(lat, lon),
            accident,
            timestamp: None,
            attributes: IncidentAttributes {
                weather: "Fine".to_string(),
                road_curvature: "Straight".to_string(),
                lighting: "Daylight".to_string(),
                surface_condition: "Smooth".to_string(),
                historical_accident_cause: "None".to_string(),
                news_sentiment: "Neutral".to_string(),
                road_surface_friction: 0.6,
                traffic_density: 200.0,
                hcv_ratio: 0.2,
                speed_limit_breaches: 0.0,
                rash_driving_incidents: 0.0,
            },
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn junction(lat: f64, lon: f64, n: usize) -> Vec<HistoricalIncidentRecord> {
        (0..n)
            .map(|i| incident(lat + 0.0005 * i as f64, lon - 0.0003 * i as f64, true))
            .collect()
    }

    fn member_sets(
        report: &HotspotReport,
        records: &[HistoricalIncidentRecord],
    ) -> BTreeSet<Vec<(u64, u64)>> {
        report
            .hotspots
            .iter()
            .map(|h| {
                let mut coords: Vec<(u64, u64)> = h
                    .members
                    .iter()
                    .map(|&i| {
                        let c = records[i].location;
                        (c.latitude.to_bits(), c.longitude.to_bits())
                    })
                    .collect();
                coords.sort_unstable();
                coords
            })
            .collect()
    }

    #[test]
    fn empty_history_yields_empty_report() {
        let report = detect(&[], ClusteringParams::new(0.01, 5)).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.hotspot_count(), 0);
        assert_eq!(report.qualifying_count(), 0);
    }

    #[test]
    fn isolated_accidents_report_zero_hotspots() {
        let records = vec![
            incident(19.0, 72.8, true),
            incident(19.1, 72.9, true),
            incident(19.2, 73.0, true),
        ];
        let report = detect(&records, ClusteringParams::default()).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.hotspot_count(), 0);
        assert_eq!(report.noise(), vec![0, 1, 2]);
    }

    #[test]
    fn only_qualifying_accidents_are_clustered() {
        let mut records = junction(19.05, 72.85, 6);
        records.extend(
            (0..10).map(|i| incident(0.0001_f64.mul_add(f64::from(i), 19.20), 72.95, false)),
        );

        let report = detect(&records, ClusteringParams::default()).unwrap();
        assert_eq!(report.hotspot_count(), 1);
        assert_eq!(report.qualifying_count(), 6);
        assert_eq!(report.hotspots[0].members, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(report.label_of(8), None);
    }

    #[test]
    fn hotspots_are_named_and_summarized() {
        let records = junction(19.05, 72.85, 5);
        let report = detect(&records, ClusteringParams::default()).unwrap();
        let hotspot = &report.hotspots[0];

        assert_eq!(hotspot.name, "Black Spot 1");
        assert_eq!(hotspot.member_count, 5);
        assert!((hotspot.centroid.latitude - 19.051).abs() < 1e-9);
        assert!((hotspot.centroid.longitude - 72.8494).abs() < 1e-9);
        let expected_radius = 0.0005_f64.hypot(0.0003) * 2.0;
        assert!((hotspot.radius - expected_radius).abs() < 1e-9);
    }

    #[test]
    fn membership_partitions_non_noise_accidents() {
        let mut records = junction(19.05, 72.85, 7);
        records.extend(junction(19.15, 72.95, 5));
        records.push(incident(18.90, 72.80, true));

        let report = detect(&records, ClusteringParams::default()).unwrap();
        assert_eq!(report.hotspot_count(), 2);

        let mut seen = BTreeSet::new();
        for hotspot in &report.hotspots {
            for &member in &hotspot.members {
                assert!(seen.insert(member), "record {member} in two hotspots");
            }
        }
        let clustered: BTreeSet<usize> = report
            .assignments
            .iter()
            .filter(|a| !a.label.is_noise())
            .map(|a| a.record_index)
            .collect();
        assert_eq!(seen, clustered);
        assert_eq!(report.noise(), vec![12]);
    }

    #[test]
    fn permuted_input_gives_same_partition() {
        let mut records = junction(19.05, 72.85, 7);
        records.extend(junction(19.15, 72.95, 5));
        records.push(incident(18.90, 72.80, true));
        let mut permuted = records.clone();
        permuted.reverse();

        let params = ClusteringParams::default();
        let first = detect(&records, params).unwrap();
        let again = detect(&records, params).unwrap();
        let shuffled = detect(&permuted, params).unwrap();

        assert_eq!(member_sets(&first, &records), member_sets(&again, &records));
        assert_eq!(
            member_sets(&first, &records),
            member_sets(&shuffled, &permuted)
        );
        assert_eq!(first.hotspot_count(), shuffled.hotspot_count());
    }

    #[test]
    fn invalid_geometry_reports_record_index() {
        let mut records = junction(19.05, 72.85, 3);
        records.push(incident(f64::NAN, 72.85, false));

        let err = detect(&records, ClusteringParams::default()).unwrap_err();
        assert!(matches!(err, HotspotError::InvalidGeometry { index: 3, .. }));

        let records = vec![incident(95.0, 72.0, true)];
        assert!(matches!(
            detect(&records, ClusteringParams::default()),
            Err(HotspotError::InvalidGeometry { index: 0, .. })
        ));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let records = junction(19.05, 72.85, 3);
        for params in [
            ClusteringParams::new(0.0, 5),
            ClusteringParams::new(-0.01, 5),
            ClusteringParams::new(f64::NAN, 5),
            ClusteringParams::new(0.01, 0),
        ] {
            assert!(
                matches!(
                    detect(&records, params),
                    Err(HotspotError::InvalidParameters { .. })
                ),
                "{params:?} should be rejected"
            );
        }
    }
}
