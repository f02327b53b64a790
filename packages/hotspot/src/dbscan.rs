//! DBSCAN over `[latitude, longitude]` points with an R-tree neighbor index.
//!
//! Distances are planar Euclidean in degrees (see
//! [`Coordinate::planar_distance`](road_risk_incident_models::Coordinate::planar_distance)).
//! A point is *core* when at least `min_samples` points, itself included,
//! lie within `eps`. Clusters are the connected components of core points;
//! a non-core point within `eps` of some core point joins the cluster of
//! its nearest core neighbor, everything else is noise.
//!
//! Points are visited in coordinate order rather than input order, so the
//! partition and the label numbering are the same for any permutation of
//! the same input.

use std::collections::VecDeque;

use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Cluster assignment of a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum ClusterLabel {
    /// Member of the cluster with this id.
    Cluster(u32),
    /// Too sparse to belong to any cluster.
    Noise,
}

impl ClusterLabel {
    /// Cluster id, or `None` for noise.
    #[must_use]
    pub const fn cluster_id(self) -> Option<u32> {
        match self {
            Self::Cluster(id) => Some(id),
            Self::Noise => None,
        }
    }

    /// Whether this point is noise.
    #[must_use]
    pub const fn is_noise(self) -> bool {
        matches!(self, Self::Noise)
    }
}

/// Labels every point in `points`. The result is aligned with `points`.
///
/// Callers are expected to have validated `eps > 0`, `min_samples >= 1`
/// and finite coordinates.
#[must_use]
pub fn cluster(points: &[[f64; 2]], eps: f64, min_samples: usize) -> Vec<ClusterLabel> {
    if points.is_empty() {
        return Vec::new();
    }

    let tree: RTree<IndexedPoint> = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new(*p, i))
            .collect(),
    );

    let eps_squared = eps * eps;
    let neighbors: Vec<Vec<usize>> = points
        .iter()
        .map(|p| {
            tree.locate_within_distance(*p, eps_squared)
                .map(|n| n.data)
                .collect()
        })
        .collect();
    let is_core: Vec<bool> = neighbors.iter().map(|n| n.len() >= min_samples).collect();

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        points[a][0]
            .total_cmp(&points[b][0])
            .then(points[a][1].total_cmp(&points[b][1]))
    });

    let mut core_labels: Vec<Option<u32>> = vec![None; points.len()];
    let mut next_id = 0_u32;
    let mut queue = VecDeque::new();

    for &seed in &order {
        if !is_core[seed] || core_labels[seed].is_some() {
            continue;
        }

        core_labels[seed] = Some(next_id);
        queue.push_back(seed);

        while let Some(current) = queue.pop_front() {
            for &n in &neighbors[current] {
                if is_core[n] && core_labels[n].is_none() {
                    core_labels[n] = Some(next_id);
                    queue.push_back(n);
                }
            }
        }

        next_id += 1;
    }

    (0..points.len())
        .map(|i| {
            if let Some(id) = core_labels[i] {
                return ClusterLabel::Cluster(id);
            }
            nearest_core_label(points, &neighbors[i], &core_labels, i)
                .map_or(ClusterLabel::Noise, ClusterLabel::Cluster)
        })
        .collect()
}

/// Cluster of the nearest core neighbor of border point `i`; ties go to the
/// lower cluster id.
fn nearest_core_label(
    points: &[[f64; 2]],
    neighbors: &[usize],
    core_labels: &[Option<u32>],
    i: usize,
) -> Option<u32> {
    neighbors
        .iter()
        .filter_map(|&n| core_labels[n].map(|id| (squared_distance(points[i], points[n]), id)))
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, id)| id)
}

fn squared_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}
