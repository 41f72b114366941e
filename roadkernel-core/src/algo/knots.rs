//! Knot selection: a reduced set of network vertices supporting the
//! low-rank kernel basis.
//!
//! A regular grid is laid over the network extent, every grid point is
//! snapped to its nearest vertices and only vertices inside the convex hull
//! of the observation sites are kept.

use geo::{ConvexHull, Intersects, MultiPoint, Point, Polygon, Rect};
use itertools::Itertools;
use log::{info, warn};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use crate::Error;
use crate::loading::KnotConfig;
use crate::model::RoadNetwork;

/// Selected knots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnotSet {
    /// Knot vertices, sorted and unique
    pub knot_ids: Vec<NodeIndex>,
    /// Distinct snapped grid vertices before hull filtering
    pub candidate_count: usize,
}

impl KnotSet {
    pub fn len(&self) -> usize {
        self.knot_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knot_ids.is_empty()
    }

    /// True when there are at least as many knots as observations, which
    /// defeats the purpose of a reduced basis
    pub fn exceeds_observations(&self, observations: usize) -> bool {
        self.knot_ids.len() >= observations
    }
}

/// Regular `s × s` grid over `bbox` with `s = round(√target_count)`.
///
/// A single grid point sits at the centre of the box.
pub fn candidate_grid(bbox: &Rect<f64>, target_count: usize) -> Vec<Point<f64>> {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let side = ((target_count as f64).sqrt().round() as usize).max(1);

    let min = bbox.min();
    let max = bbox.max();
    let axis = |lo: f64, hi: f64, i: usize| {
        if side == 1 {
            0.5 * (lo + hi)
        } else {
            #[allow(clippy::cast_precision_loss)]
            let frac = i as f64 / (side - 1) as f64;
            frac.mul_add(hi - lo, lo)
        }
    };

    (0..side)
        .cartesian_product(0..side)
        .map(|(i, j)| Point::new(axis(min.x, max.x, i), axis(min.y, max.y, j)))
        .collect()
}

/// Distinct vertices reached by snapping every grid point to its
/// `neighbours` nearest vertices, sorted by index
pub fn candidate_knots(
    network: &RoadNetwork,
    bbox: &Rect<f64>,
    target_count: usize,
    neighbours: usize,
) -> Vec<NodeIndex> {
    candidate_grid(bbox, target_count)
        .par_iter()
        .flat_map_iter(|point| network.k_nearest_nodes(point, neighbours))
        .collect::<Vec<_>>()
        .into_iter()
        .sorted_unstable()
        .dedup()
        .collect()
}

/// Convex hull of the distinct observation vertex coordinates
///
/// # Errors
///
/// Returns [`Error::InvalidNodeIndex`] for unknown vertices and
/// [`Error::NoPointsFound`] if there are no observations
pub fn observation_hull(network: &RoadNetwork, observations: &[NodeIndex]) -> Result<Polygon<f64>, Error> {
    network.validate_nodes(observations)?;

    let sites: MultiPoint = observations
        .iter()
        .copied()
        .sorted_unstable()
        .dedup()
        .filter_map(|node| network.node_geometry(node))
        .collect();
    if sites.0.is_empty() {
        return Err(Error::NoPointsFound);
    }

    Ok(sites.convex_hull())
}

/// Selects knots inside the convex hull of the snapped observations.
///
/// Having at least as many knots as observations is logged as a warning and
/// can be checked with [`KnotSet::exceeds_observations`]; it is not an error.
///
/// # Errors
///
/// Returns [`Error::DegenerateKnotSet`] if no candidate survives the hull
/// filter (including when there are no observations), and
/// [`Error::InvalidNodeIndex`] for unknown observation vertices
pub fn select_knots(
    network: &RoadNetwork,
    bbox: &Rect<f64>,
    config: &KnotConfig,
    observations: &[NodeIndex],
) -> Result<KnotSet, Error> {
    config.validate()?;
    network.validate_nodes(observations)?;

    let sites = observations.iter().copied().sorted_unstable().dedup().count();
    let target_count = config.resolve_target_count(sites);
    let candidates = candidate_knots(network, bbox, target_count, config.neighbours);
    let candidate_count = candidates.len();

    let hull = match observation_hull(network, observations) {
        Ok(hull) => hull,
        Err(Error::NoPointsFound) => {
            return Err(Error::DegenerateKnotSet {
                candidates: candidate_count,
            });
        }
        Err(e) => return Err(e),
    };

    let knot_ids: Vec<NodeIndex> = candidates
        .into_iter()
        .filter(|&node| {
            network
                .node_geometry(node)
                .is_some_and(|point| inside_hull(&hull, point))
        })
        .collect();

    info!(
        "Selected {} knots from {candidate_count} grid candidates ({target_count} grid points, {sites} observation sites)",
        knot_ids.len()
    );

    if knot_ids.is_empty() {
        return Err(Error::DegenerateKnotSet {
            candidates: candidate_count,
        });
    }

    let knots = KnotSet {
        knot_ids,
        candidate_count,
    };
    if knots.exceeds_observations(observations.len()) {
        warn!(
            "{} knots for {} observations: the basis is not reduced, consider a coarser grid",
            knots.len(),
            observations.len()
        );
    }
    Ok(knots)
}

/// Inside or on the boundary; degenerate hulls (collinear sites) reduce to
/// their boundary segment
fn inside_hull(hull: &Polygon<f64>, point: Point<f64>) -> bool {
    point.intersects(hull)
}
