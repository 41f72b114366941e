use hashbrown::HashMap;
use itertools::Itertools;
use log::{info, warn};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use super::dijkstra::shortest_path_tree;
use super::weighting::PathWeighting;
use crate::loading::PathConfig;
use crate::model::{DenseMatrix, RoadNetwork};
use crate::{Error, Length};

/// Observation × knot shortest path distances and path weights
#[derive(Debug, Clone, PartialEq)]
pub struct PathMatrices {
    /// Path distances, `+∞` where the knot is unreachable
    pub distances: DenseMatrix,
    /// Path weights, NaN where the knot is unreachable
    pub weights: DenseMatrix,
}

impl PathMatrices {
    pub fn shape(&self) -> (usize, usize) {
        self.distances.shape()
    }

    /// Number of observation-knot pairs without a path
    pub fn disconnected_pairs(&self) -> usize {
        self.distances
            .as_slice()
            .iter()
            .filter(|d| d.is_infinite())
            .count()
    }
}

/// Computes distance and weight matrices using the configured weighting
///
/// # Errors
///
/// Returns an error for unknown vertices, an empty knot set or invalid
/// settings
pub fn compute_distances_and_weights(
    network: &RoadNetwork,
    observations: &[NodeIndex],
    knots: &[NodeIndex],
    config: &PathConfig,
) -> Result<PathMatrices, Error> {
    config.validate()?;
    compute_distances_and_weights_with(
        network,
        observations,
        knots,
        &config.weighting,
        config.max_distance,
    )
}

/// Computes distance and weight matrices with a custom weighting strategy.
///
/// One shortest path search runs per distinct observation vertex, in
/// parallel; observations sharing a vertex share the resulting row.
///
/// # Errors
///
/// Returns [`Error::InvalidNodeIndex`] for unknown vertices and
/// [`Error::DegenerateKnotSet`] if `knots` is empty
pub fn compute_distances_and_weights_with<W>(
    network: &RoadNetwork,
    observations: &[NodeIndex],
    knots: &[NodeIndex],
    weighting: &W,
    max_distance: Option<Length>,
) -> Result<PathMatrices, Error>
where
    W: PathWeighting + ?Sized,
{
    network.validate_nodes(observations)?;
    network.validate_nodes(knots)?;
    if knots.is_empty() {
        return Err(Error::DegenerateKnotSet { candidates: 0 });
    }

    let sources: Vec<NodeIndex> = observations.iter().copied().sorted_unstable().dedup().collect();
    info!(
        "Computing network distances: {} observations ({} distinct sites) x {} knots",
        observations.len(),
        sources.len(),
        knots.len()
    );

    let source_rows: Vec<(Vec<Length>, Vec<f64>)> = sources
        .par_iter()
        .map(|&source| source_row(network, source, knots, weighting, max_distance))
        .collect();
    let row_of: HashMap<NodeIndex, usize> = sources
        .iter()
        .enumerate()
        .map(|(row, &source)| (source, row))
        .collect();

    let mut distances = DenseMatrix::filled(observations.len(), knots.len(), Length::INFINITY);
    let mut weights = DenseMatrix::filled(observations.len(), knots.len(), f64::NAN);
    for (i, observation) in observations.iter().enumerate() {
        let (d_row, w_row) = &source_rows[row_of[observation]];
        distances.row_mut(i).copy_from_slice(d_row);
        weights.row_mut(i).copy_from_slice(w_row);
    }

    let matrices = PathMatrices { distances, weights };
    let disconnected = matrices.disconnected_pairs();
    if disconnected > 0 {
        warn!(
            "{disconnected} of {} observation-knot pairs have no connecting path",
            observations.len() * knots.len()
        );
    }
    Ok(matrices)
}

/// Distances and weights from one source vertex to every knot
fn source_row<W>(
    network: &RoadNetwork,
    source: NodeIndex,
    knots: &[NodeIndex],
    weighting: &W,
    max_distance: Option<Length>,
) -> (Vec<Length>, Vec<f64>)
where
    W: PathWeighting + ?Sized,
{
    let tree = shortest_path_tree(network, source, max_distance);

    knots
        .iter()
        .map(|&knot| match tree.path(knot) {
            Some(path) => (path.length(network), weighting.path_weight(network, &path)),
            None => (Length::INFINITY, f64::NAN),
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Point};

    use super::*;
    use crate::loading::{NetworkConfig, build_graph};
    use crate::routing::PathWeightingKind;

    fn node_at(network: &RoadNetwork, x: f64, y: f64) -> NodeIndex {
        network.k_nearest_nodes(&Point::new(x, y), 1)[0]
    }

    fn grid_network() -> RoadNetwork {
        let mut lines = Vec::new();
        for i in 0..4 {
            let c = f64::from(i) * 100.0;
            lines.push(LineString::from(vec![(0.0, c), (100.0, c), (200.0, c), (300.0, c)]));
            lines.push(LineString::from(vec![(c, 0.0), (c, 100.0), (c, 200.0), (c, 300.0)]));
        }
        build_graph(&lines, &NetworkConfig::default()).expect("valid network")
    }

    #[test]
    fn shape_and_self_distance() {
        let net = grid_network();
        let a = node_at(&net, 0.0, 0.0);
        let b = node_at(&net, 300.0, 300.0);
        let m = compute_distances_and_weights(&net, &[a, b], &[a, b], &PathConfig::default())
            .expect("valid input");

        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.distances.get(0, 0), Some(0.0));
        assert_eq!(m.distances.get(1, 1), Some(0.0));
        assert_eq!(m.weights.get(0, 0), Some(1.0));
        assert!((m.distances.get(0, 1).unwrap_or_default() - 600.0).abs() < 1e-9);
        assert_eq!(m.distances.get(0, 1), m.distances.get(1, 0));
    }

    #[test]
    fn observation_order_does_not_change_rows() {
        let net = grid_network();
        let obs = [
            node_at(&net, 100.0, 0.0),
            node_at(&net, 200.0, 300.0),
            node_at(&net, 0.0, 100.0),
        ];
        let knots = [node_at(&net, 100.0, 100.0), node_at(&net, 300.0, 0.0)];
        let config = PathConfig::default();

        let forward = compute_distances_and_weights(&net, &obs, &knots, &config).expect("valid");
        let reversed: Vec<_> = obs.iter().rev().copied().collect();
        let backward = compute_distances_and_weights(&net, &reversed, &knots, &config).expect("valid");

        for i in 0..obs.len() {
            let j = obs.len() - 1 - i;
            assert_eq!(forward.distances.row(i), backward.distances.row(j));
            assert_eq!(forward.weights.row(i), backward.weights.row(j));
        }
    }

    #[test]
    fn shared_vertex_observations_share_rows() {
        let net = grid_network();
        let a = node_at(&net, 100.0, 200.0);
        let knots = [node_at(&net, 0.0, 0.0), node_at(&net, 300.0, 300.0)];
        let m = compute_distances_and_weights(&net, &[a, a], &knots, &PathConfig::default())
            .expect("valid");

        assert_eq!(m.distances.row(0), m.distances.row(1));
        assert_eq!(m.weights.row(0), m.weights.row(1));
    }

    #[test]
    fn unreachable_knots_are_infinite() {
        let lines = vec![
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]),
            LineString::from(vec![(100.0, 0.0), (110.0, 0.0)]),
        ];
        let net = build_graph(&lines, &NetworkConfig::default()).expect("valid network");
        let a = node_at(&net, 0.0, 0.0);
        let far = node_at(&net, 110.0, 0.0);
        let m = compute_distances_and_weights(&net, &[a], &[far], &PathConfig::default())
            .expect("disconnection is not an error");

        assert_eq!(m.distances.get(0, 0), Some(f64::INFINITY));
        assert!(m.weights.get(0, 0).is_some_and(f64::is_nan));
        assert_eq!(m.disconnected_pairs(), 1);
    }

    #[test]
    fn budget_marks_distant_knots_unreachable() {
        let net = grid_network();
        let a = node_at(&net, 0.0, 0.0);
        let near = node_at(&net, 100.0, 0.0);
        let far = node_at(&net, 300.0, 300.0);
        let config = PathConfig {
            max_distance: Some(250.0),
            ..PathConfig::default()
        };
        let m = compute_distances_and_weights(&net, &[a], &[near, far], &config).expect("valid");

        assert_eq!(m.distances.get(0, 0), Some(100.0));
        assert_eq!(m.distances.get(0, 1), Some(f64::INFINITY));
    }

    #[test]
    fn custom_strategy_is_used() {
        struct Half;
        impl PathWeighting for Half {
            fn path_weight(&self, _: &RoadNetwork, _: &crate::routing::NetworkPath) -> f64 {
                0.5
            }
        }

        let net = grid_network();
        let a = node_at(&net, 0.0, 0.0);
        let m = compute_distances_and_weights_with(&net, &[a], &[a], &Half, None).expect("valid");
        assert_eq!(m.weights.get(0, 0), Some(0.5));

        let dynamic: &dyn PathWeighting = &PathWeightingKind::Uniform;
        let m = compute_distances_and_weights_with(&net, &[a], &[a], dynamic, None).expect("valid");
        assert_eq!(m.weights.get(0, 0), Some(1.0));
    }

    #[test]
    fn empty_knots_and_bad_indices_fail() {
        let net = grid_network();
        let a = node_at(&net, 0.0, 0.0);
        assert!(matches!(
            compute_distances_and_weights(&net, &[a], &[], &PathConfig::default()),
            Err(Error::DegenerateKnotSet { .. })
        ));
        assert!(matches!(
            compute_distances_and_weights(&net, &[NodeIndex::new(10_000)], &[a], &PathConfig::default()),
            Err(Error::InvalidNodeIndex(10_000))
        ));
    }
}
