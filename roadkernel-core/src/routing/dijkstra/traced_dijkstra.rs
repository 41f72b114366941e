use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use super::state::State;
use crate::model::RoadNetwork;
use crate::{Error, Length};

#[derive(Debug, Clone, Copy)]
struct Predecessor {
    node: NodeIndex,
    edge: EdgeIndex,
}

/// Single-source shortest path distances with predecessor links to every
/// reached vertex
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    source: NodeIndex,
    distances: Vec<Length>,
    predecessors: Vec<Option<Predecessor>>,
}

impl ShortestPathTree {
    pub fn source(&self) -> NodeIndex {
        self.source
    }

    /// Distance to `target`, `None` if unreachable or outside the search budget
    pub fn distance(&self, target: NodeIndex) -> Option<Length> {
        self.distances
            .get(target.index())
            .copied()
            .filter(|d| d.is_finite())
    }

    pub fn is_reachable(&self, target: NodeIndex) -> bool {
        self.distance(target).is_some()
    }

    /// Reconstructs the realized path from the source to `target`
    pub fn path(&self, target: NodeIndex) -> Option<NetworkPath> {
        if !self.is_reachable(target) {
            return None;
        }

        let mut nodes = vec![target];
        let mut edges = Vec::new();
        let mut current = target;
        while current != self.source {
            let prev = self.predecessors.get(current.index()).copied().flatten()?;
            edges.push(prev.edge);
            nodes.push(prev.node);
            current = prev.node;
        }
        nodes.reverse();
        edges.reverse();

        Some(NetworkPath { nodes, edges })
    }
}

/// Vertex and edge sequence of one shortest path, source first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPath {
    nodes: Vec<NodeIndex>,
    edges: Vec<EdgeIndex>,
}

impl NetworkPath {
    pub fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Vertices strictly between the two ends
    pub fn interior(&self) -> &[NodeIndex] {
        if self.nodes.len() > 2 {
            &self.nodes[1..self.nodes.len() - 1]
        } else {
            &[]
        }
    }

    /// Accumulated length of the path edges
    pub fn length(&self, network: &RoadNetwork) -> Length {
        self.edges
            .iter()
            .filter_map(|&edge| network.graph.edge_weight(edge))
            .fold(0.0, |total, edge| total + edge.weight)
    }
}

/// Dijkstra's algorithm over the road network from a single source.
///
/// Equal-cost alternatives resolve to the predecessor with the lowest
/// vertex index, so repeated runs always realize the same paths. Vertices
/// beyond `max_cost` are reported as unreachable.
pub fn shortest_path_tree(
    network: &RoadNetwork,
    source: NodeIndex,
    max_cost: Option<Length>,
) -> ShortestPathTree {
    let node_count = network.node_count();
    let mut distances = vec![Length::INFINITY; node_count];
    let mut predecessors: Vec<Option<Predecessor>> = vec![None; node_count];
    let mut settled = FixedBitSet::with_capacity(node_count);
    let mut heap = BinaryHeap::new();

    if source.index() >= node_count {
        return ShortestPathTree {
            source,
            distances,
            predecessors,
        };
    }

    // Start node has distance 0
    distances[source.index()] = 0.0;
    heap.push(State {
        cost: 0.0,
        node: source,
    });

    while let Some(State { cost, node }) = heap.pop() {
        // Stale heap entry
        if settled.contains(node.index()) {
            continue;
        }

        // Check max cost constraint
        if let Some(max) = max_cost {
            if cost > max {
                break;
            }
        }
        settled.insert(node.index());

        // Examine neighbors
        for edge in network.edges(node) {
            let next = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            if settled.contains(next.index()) {
                continue;
            }

            let next_cost = cost + edge.weight().weight;
            let best = distances[next.index()];
            let via = Predecessor {
                node,
                edge: edge.id(),
            };

            if next_cost < best {
                distances[next.index()] = next_cost;
                predecessors[next.index()] = Some(via);
                heap.push(State {
                    cost: next_cost,
                    node: next,
                });
            } else if next_cost == best
                && predecessors[next.index()].is_some_and(|p| node < p.node)
            {
                predecessors[next.index()] = Some(via);
            }
        }
    }

    // Tentative labels left behind by the budget cut-off are not final
    for index in 0..node_count {
        if !settled.contains(index) {
            distances[index] = Length::INFINITY;
            predecessors[index] = None;
        }
    }

    ShortestPathTree {
        source,
        distances,
        predecessors,
    }
}

/// Shortest path distance between two vertices
///
/// # Errors
///
/// Returns [`Error::DisconnectedPair`] if no path exists and
/// [`Error::InvalidNodeIndex`] for unknown vertices
pub fn path_distance(network: &RoadNetwork, from: NodeIndex, to: NodeIndex) -> Result<Length, Error> {
    network.validate_node(from)?;
    network.validate_node(to)?;

    shortest_path_tree(network, from, None)
        .path(to)
        .map(|path| path.length(network))
        .ok_or(Error::DisconnectedPair {
            from: from.index(),
            to: to.index(),
        })
}

#[cfg(test)]
mod tests {
    use geo::LineString;

    use super::*;
    use crate::loading::{NetworkConfig, build_graph};

    fn network(polylines: &[&[(f64, f64)]]) -> RoadNetwork {
        let lines: Vec<LineString<f64>> = polylines
            .iter()
            .map(|points| LineString::from(points.to_vec()))
            .collect();
        build_graph(&lines, &NetworkConfig::default()).expect("valid network")
    }

    fn node_at(network: &RoadNetwork, x: f64, y: f64) -> NodeIndex {
        network
            .nearest_node(&geo::Point::new(x, y))
            .map(|(node, _)| node)
            .expect("network is not empty")
    }

    #[test]
    fn distance_to_self_is_zero() {
        let net = network(&[&[(0.0, 0.0), (10.0, 0.0)]]);
        let a = node_at(&net, 0.0, 0.0);
        let tree = shortest_path_tree(&net, a, None);

        assert_eq!(tree.distance(a), Some(0.0));
        let path = tree.path(a).expect("source reaches itself");
        assert_eq!(path.nodes(), &[a]);
        assert_eq!(path.edge_count(), 0);
        assert!(path.interior().is_empty());
    }

    #[test]
    fn prefers_shorter_route() {
        // Direct diagonal is shorter than going around the corner
        let net = network(&[
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)],
            &[(0.0, 0.0), (10.0, 10.0)],
        ]);
        let a = node_at(&net, 0.0, 0.0);
        let c = node_at(&net, 10.0, 10.0);

        let tree = shortest_path_tree(&net, a, None);
        let path = tree.path(c).expect("connected");
        assert_eq!(path.nodes(), &[a, c]);
        let expected = 200.0_f64.sqrt();
        assert!((path.length(&net) - expected).abs() < 1e-12);
        assert_eq!(tree.distance(c), Some(path.length(&net)));
    }

    #[test]
    fn equal_routes_resolve_to_lowest_index() {
        // Two equally long routes around a square from (0,0) to (10,10)
        let net = network(&[
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)],
            &[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0)],
        ]);
        let a = node_at(&net, 0.0, 0.0);
        let b = node_at(&net, 10.0, 0.0);
        let d = node_at(&net, 0.0, 10.0);
        let c = node_at(&net, 10.0, 10.0);
        assert!(b < d);

        for _ in 0..3 {
            let path = shortest_path_tree(&net, a, None).path(c).expect("connected");
            assert_eq!(path.nodes(), &[a, b, c]);
            assert_eq!(path.interior(), &[b]);
        }
    }

    #[test]
    fn disconnected_components_are_unreachable() {
        let net = network(&[&[(0.0, 0.0), (10.0, 0.0)], &[(50.0, 0.0), (60.0, 0.0)]]);
        let a = node_at(&net, 0.0, 0.0);
        let far = node_at(&net, 60.0, 0.0);

        let tree = shortest_path_tree(&net, a, None);
        assert_eq!(tree.distance(far), None);
        assert!(tree.path(far).is_none());
        assert!(matches!(
            path_distance(&net, a, far),
            Err(Error::DisconnectedPair { .. })
        ));
    }

    #[test]
    fn budget_limits_the_search() {
        let net = network(&[&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)]]);
        let a = node_at(&net, 0.0, 0.0);
        let tree = shortest_path_tree(&net, a, Some(15.0));

        assert_eq!(tree.distance(node_at(&net, 10.0, 0.0)), Some(10.0));
        assert_eq!(tree.distance(node_at(&net, 20.0, 0.0)), None);
        assert_eq!(tree.distance(node_at(&net, 30.0, 0.0)), None);
    }

    #[test]
    fn path_distance_sums_edges() {
        let net = network(&[&[(0.0, 0.0), (400.0, 0.0), (1000.0, 0.0)]]);
        let a = node_at(&net, 0.0, 0.0);
        let b = node_at(&net, 1000.0, 0.0);
        let distance = path_distance(&net, a, b).expect("connected");
        assert!((distance - 1000.0).abs() < 1e-9);
    }
}
