use geo::{LineString, Point};
use log::{debug, info, warn};
use petgraph::graph::{NodeIndex, UnGraph};
use rstar::{PointDistance, RTree};

use super::config::NetworkConfig;
use super::splitter::{SplitGeometry, split_polylines};
use crate::model::{IndexedPoint, NetworkEdge, NetworkNode, RoadNetwork};
use crate::{Error, Length};

/// Creates a road network from polylines
///
/// # Errors
///
/// Returns [`Error::EmptyNetwork`] if no usable segment remains after
/// splitting, or [`Error::InvalidConfig`] for invalid settings
pub fn build_graph(polylines: &[LineString<f64>], config: &NetworkConfig) -> Result<RoadNetwork, Error> {
    config.validate()?;

    info!("Splitting {} road polylines", polylines.len());
    let split = split_polylines(polylines, config.max_segment_length);
    if !split.skipped.is_empty() {
        warn!(
            "{} of {} polylines were malformed and skipped",
            split.skipped.len(),
            polylines.len()
        );
    }

    build_graph_from_segments(&split, config)
}

/// Creates a road network from already split segments.
///
/// Endpoints within the coincidence tolerance share a vertex. When the same
/// pair of vertices is joined more than once only the shortest edge is kept.
///
/// # Errors
///
/// Returns [`Error::EmptyNetwork`] if the segments produce no edge
pub fn build_graph_from_segments(
    split: &SplitGeometry,
    config: &NetworkConfig,
) -> Result<RoadNetwork, Error> {
    config.validate()?;
    if split.is_empty() {
        return Err(Error::EmptyNetwork);
    }

    let mut graph: UnGraph<NetworkNode, NetworkEdge> =
        UnGraph::with_capacity(split.len() + 1, split.len());
    let mut registry = VertexRegistry::new(config.coincidence_tolerance);
    let mut link_nodes = Vec::new();
    let mut collapsed = 0_usize;

    for (segment, midpoint) in split.segments.iter().zip(&split.midpoints) {
        let a = registry.node_for(&mut graph, segment.start);
        let b = registry.node_for(&mut graph, segment.end);
        if a == b {
            collapsed += 1;
            continue;
        }

        let length = segment.length();
        if config.split_at_midpoints {
            let (m, created) = registry.insert(&mut graph, *midpoint);
            if m == a || m == b {
                add_or_shorten(&mut graph, a, b, length);
            } else {
                // A midpoint landing on an existing vertex (e.g. the foot of a
                // T junction) still splits the segment but is not a link node
                if created {
                    link_nodes.push(m);
                }
                add_or_shorten(&mut graph, a, m, 0.5 * length);
                add_or_shorten(&mut graph, m, b, 0.5 * length);
            }
        } else {
            add_or_shorten(&mut graph, a, b, length);
        }
    }

    if collapsed > 0 {
        debug!("{collapsed} segments collapsed into a single vertex and were dropped");
    }
    if graph.edge_count() == 0 {
        return Err(Error::EmptyNetwork);
    }

    link_nodes.sort_unstable();
    link_nodes.dedup();

    let network = RoadNetwork::new(graph, link_nodes);
    info!(
        "Road network built: {} vertices, {} edges, {} connected components",
        network.node_count(),
        network.edge_count(),
        network.component_count()
    );
    if network.component_count() > 1 {
        warn!(
            "Road network has {} disconnected components, some observation-knot pairs may be unreachable",
            network.component_count()
        );
    }
    Ok(network)
}

/// Adds an edge or, if the pair is already connected, keeps the shorter one
fn add_or_shorten(
    graph: &mut UnGraph<NetworkNode, NetworkEdge>,
    a: NodeIndex,
    b: NodeIndex,
    weight: Length,
) {
    match graph.find_edge(a, b) {
        Some(edge) => {
            if let Some(existing) = graph.edge_weight_mut(edge) {
                if weight < existing.weight {
                    existing.weight = weight;
                }
            }
        }
        None => {
            graph.add_edge(a, b, NetworkEdge { weight });
        }
    }
}

/// Assigns vertex indices to points, merging points within the tolerance
struct VertexRegistry {
    tree: RTree<IndexedPoint>,
    tolerance_2: f64,
}

impl VertexRegistry {
    fn new(tolerance: Length) -> Self {
        Self {
            tree: RTree::new(),
            tolerance_2: tolerance * tolerance,
        }
    }

    fn node_for(&mut self, graph: &mut UnGraph<NetworkNode, NetworkEdge>, point: Point<f64>) -> NodeIndex {
        self.insert(graph, point).0
    }

    /// Vertex for `point` and whether it was newly added
    fn insert(&mut self, graph: &mut UnGraph<NetworkNode, NetworkEdge>, point: Point<f64>) -> (NodeIndex, bool) {
        let query = [point.x(), point.y()];
        if let Some(existing) = self.tree.nearest_neighbor(&query) {
            if existing.distance_2(&query) <= self.tolerance_2 {
                return (existing.data, false);
            }
        }

        let node = graph.add_node(NetworkNode { geometry: point });
        self.tree.insert(IndexedPoint::new(query, node));
        (node, true)
    }
}
