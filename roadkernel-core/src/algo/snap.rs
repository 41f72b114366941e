use geo::Point;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use crate::Error;
use crate::model::RoadNetwork;

/// Indices of the `k` nearest network vertices for every query point.
///
/// Neighbours are ordered by distance with ties broken by lowest vertex
/// index. If the network has fewer than `k` vertices all of them are
/// returned.
pub fn snap(network: &RoadNetwork, points: &[Point<f64>], k: usize) -> Vec<Vec<NodeIndex>> {
    points
        .par_iter()
        .map(|point| network.k_nearest_nodes(point, k))
        .collect()
}

/// Like [`snap`] but only link (segment midpoint) vertices are candidates
///
/// # Errors
///
/// Returns [`Error::NoPointsFound`] if the network has no link vertices
pub fn snap_to_links(
    network: &RoadNetwork,
    points: &[Point<f64>],
    k: usize,
) -> Result<Vec<Vec<NodeIndex>>, Error> {
    if !network.has_link_nodes() {
        return Err(Error::NoPointsFound);
    }

    Ok(points
        .par_iter()
        .map(|point| network.k_nearest_links(point, k))
        .collect())
}

/// The single nearest vertex for every query point
///
/// # Errors
///
/// Returns [`Error::NoPointsFound`] if a point has no nearest vertex
pub fn snap_nearest(network: &RoadNetwork, points: &[Point<f64>]) -> Result<Vec<NodeIndex>, Error> {
    points
        .par_iter()
        .map(|point| {
            network
                .nearest_node(point)
                .map(|(node, _)| node)
                .ok_or(Error::NoPointsFound)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use geo::LineString;

    use super::*;
    use crate::loading::{NetworkConfig, build_graph};

    /// Deterministic pseudo-random coordinates in `[0, 1000)`
    fn scatter(count: usize, mut seed: u64) -> Vec<(f64, f64)> {
        let mut next = move || {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            #[allow(clippy::cast_precision_loss)]
            let value = (seed >> 11) as f64 / (1_u64 << 53) as f64;
            value * 1000.0
        };
        (0..count).map(|_| (next(), next())).collect()
    }

    fn brute_force(network: &RoadNetwork, point: &Point<f64>, k: usize) -> Vec<NodeIndex> {
        let mut all: Vec<(f64, NodeIndex)> = network
            .graph()
            .node_indices()
            .filter_map(|node| {
                network.node_geometry(node).map(|g| {
                    let dx = g.x() - point.x();
                    let dy = g.y() - point.y();
                    (dx * dx + dy * dy, node)
                })
            })
            .collect();
        all.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        all.into_iter().take(k).map(|(_, node)| node).collect()
    }

    fn random_network() -> RoadNetwork {
        let lines: Vec<LineString<f64>> = scatter(120, 7)
            .chunks_exact(3)
            .map(|chunk| LineString::from(chunk.to_vec()))
            .collect();
        build_graph(&lines, &NetworkConfig::default()).expect("valid network")
    }

    #[test]
    fn matches_brute_force() {
        let network = random_network();
        let queries: Vec<Point<f64>> = scatter(200, 99)
            .into_iter()
            .map(|(x, y)| Point::new(x, y))
            .collect();

        for k in [1, 3, 5] {
            let snapped = snap(&network, &queries, k);
            for (query, result) in queries.iter().zip(&snapped) {
                assert_eq!(result, &brute_force(&network, query, k));
            }
        }
    }

    #[test]
    fn matches_brute_force_on_ties() {
        // Integer lattice, queries on cell centres and edges are tied
        let mut lines = Vec::new();
        for i in 0..5 {
            let c = f64::from(i) * 10.0;
            lines.push(LineString::from(vec![(0.0, c), (10.0, c), (20.0, c), (30.0, c), (40.0, c)]));
        }
        let network = build_graph(&lines, &NetworkConfig::default()).expect("valid network");

        let queries = [Point::new(5.0, 5.0), Point::new(15.0, 20.0), Point::new(20.0, 25.0)];
        for k in [1, 2, 4] {
            for (query, result) in queries.iter().zip(snap(&network, &queries, k)) {
                assert_eq!(result, brute_force(&network, query, k));
            }
        }
    }

    #[test]
    fn k_exceeding_vertices_returns_all() {
        let network = build_graph(
            &[LineString::from(vec![(0.0, 0.0), (1.0, 0.0)])],
            &NetworkConfig::default(),
        )
        .expect("valid network");
        let snapped = snap(&network, &[Point::new(0.2, 0.0)], 5);
        assert_eq!(snapped, vec![vec![NodeIndex::new(0), NodeIndex::new(1)]]);
    }

    #[test]
    fn links_only_snap_to_midpoints() {
        let config = NetworkConfig {
            split_at_midpoints: true,
            ..NetworkConfig::default()
        };
        let network = build_graph(
            &[LineString::from(vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)])],
            &config,
        )
        .expect("valid network");

        // Right next to the corner vertex, but only midpoints are candidates
        let snapped = snap_to_links(&network, &[Point::new(98.0, -1.0)], 1).expect("has links");
        let geometry = network.node_geometry(snapped[0][0]).expect("valid node");
        assert_eq!(geometry, Point::new(50.0, 0.0));
        assert!(network.link_nodes().contains(&snapped[0][0]));
    }

    #[test]
    fn links_require_midpoint_split() {
        let network = build_graph(
            &[LineString::from(vec![(0.0, 0.0), (1.0, 0.0)])],
            &NetworkConfig::default(),
        )
        .expect("valid network");
        assert!(matches!(
            snap_to_links(&network, &[Point::new(0.0, 0.0)], 1),
            Err(Error::NoPointsFound)
        ));
    }

    #[test]
    fn nearest_snapping() {
        let network = build_graph(
            &[LineString::from(vec![(0.0, 0.0), (10.0, 0.0)])],
            &NetworkConfig::default(),
        )
        .expect("valid network");
        let nodes = snap_nearest(&network, &[Point::new(9.0, 3.0), Point::new(-4.0, 0.0)])
            .expect("non-empty network");
        assert_eq!(nodes, vec![NodeIndex::new(1), NodeIndex::new(0)]);
    }
}
