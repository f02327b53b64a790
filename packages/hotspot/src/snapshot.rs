//! Read-only hotspot reference data for the serving path.
//!
//! A snapshot is built once from a finished [`HotspotReport`] and never
//! mutated; a new clustering run produces a new snapshot that replaces the
//! old one wholesale. Matching uses the same planar degree distance and the
//! same `eps` as the run that produced the hotspots.

use rstar::RTree;
use rstar::primitives::GeomWithData;
use road_risk_incident_models::Coordinate;
use serde::Serialize;

use crate::{ClusteringParams, Hotspot, HotspotReport};

/// A hotspot matched against a queried location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotMatch<'a> {
    /// The matched hotspot.
    pub hotspot: &'a Hotspot,
    /// Planar distance from the query to the hotspot centroid, in degrees.
    pub distance: f64,
    /// Whether the query lies inside the hotspot's zone (radius plus `eps`).
    pub inside: bool,
}

/// Immutable set of hotspots with a centroid index.
pub struct HotspotSnapshot {
    params: ClusteringParams,
    hotspots: Vec<Hotspot>,
    centroids: RTree<GeomWithData<[f64; 2], usize>>,
}

impl std::fmt::Debug for HotspotSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotspotSnapshot")
            .field("params", &self.params)
            .field("hotspots", &self.hotspots.len())
            .finish_non_exhaustive()
    }
}

impl From<HotspotReport> for HotspotSnapshot {
    fn from(report: HotspotReport) -> Self {
        Self::new(report.params, report.hotspots)
    }
}

impl HotspotSnapshot {
    /// Indexes `hotspots` produced with `params`.
    #[must_use]
    pub fn new(params: ClusteringParams, hotspots: Vec<Hotspot>) -> Self {
        let centroids = RTree::bulk_load(
            hotspots
                .iter()
                .enumerate()
                .map(|(i, h)| GeomWithData::new(h.centroid.to_point(), i))
                .collect(),
        );
        Self {
            params,
            hotspots,
            centroids,
        }
    }

    /// A snapshot with no hotspots.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(ClusteringParams::default(), Vec::new())
    }

    /// Parameters of the run the hotspots came from.
    #[must_use]
    pub const fn params(&self) -> ClusteringParams {
        self.params
    }

    /// All hotspots, ordered by id.
    #[must_use]
    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    /// Number of hotspots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    /// Whether the snapshot holds no hotspots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }

    fn matched(&self, index: usize, location: &Coordinate) -> HotspotMatch<'_> {
        let hotspot = &self.hotspots[index];
        let distance = hotspot.centroid.planar_distance(location);
        HotspotMatch {
            hotspot,
            distance,
            inside: distance <= hotspot.radius + self.params.eps,
        }
    }

    /// The hotspot whose centroid is closest to `location`.
    #[must_use]
    pub fn nearest(&self, location: &Coordinate) -> Option<HotspotMatch<'_>> {
        self.centroids
            .nearest_neighbor(&location.to_point())
            .map(|entry| self.matched(entry.data, location))
    }

    /// Hotspots whose zone covers `location`, nearest first.
    #[must_use]
    pub fn containing(&self, location: &Coordinate) -> Vec<HotspotMatch<'_>> {
        let mut matches: Vec<HotspotMatch<'_>> = (0..self.hotspots.len())
            .map(|i| self.matched(i, location))
            .filter(|m| m.inside)
            .collect();
        matches.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.hotspot.id.cmp(&b.hotspot.id))
        });
        matches
    }
}
