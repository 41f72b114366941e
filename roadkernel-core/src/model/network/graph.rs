//! Immutable road network graph with its spatial indices

use std::fmt;

use geo::{BoundingRect, MultiPoint, Point, Rect};
use petgraph::Undirected;
use petgraph::graph::{Edges, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::GeomWithData;

use super::components::{NetworkEdge, NetworkNode};
use crate::{Error, Length};

/// Network vertex stored in the R-tree together with its graph index
pub type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;

/// Plain tables describing the network, for collaborators that do not
/// work with `petgraph` directly
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkTables {
    /// Vertex coordinates, position is the vertex index
    pub vertices: Vec<(f64, f64)>,
    /// Undirected edges as `(vertex, vertex, length)`
    pub edges: Vec<(usize, usize, Length)>,
    /// Edge count per vertex
    pub degrees: Vec<usize>,
}

/// Undirected road network.
///
/// Built once by [`crate::build_graph`] and read-only afterwards, so it can be
/// shared between threads without locking.
pub struct RoadNetwork {
    pub(crate) graph: UnGraph<NetworkNode, NetworkEdge>,
    rtree: RTree<IndexedPoint>,
    link_rtree: RTree<IndexedPoint>,
    link_nodes: Vec<NodeIndex>,
    degrees: Vec<usize>,
    component_count: usize,
}

impl RoadNetwork {
    pub(crate) fn new(graph: UnGraph<NetworkNode, NetworkEdge>, link_nodes: Vec<NodeIndex>) -> Self {
        let rtree = build_rtree(&graph, graph.node_indices());
        let link_rtree = build_rtree(&graph, link_nodes.iter().copied());

        let degrees = graph
            .node_indices()
            .map(|node| {
                graph
                    .edges(node)
                    .filter(|edge| edge.source() != edge.target())
                    .count()
            })
            .collect();
        let component_count = petgraph::algo::connected_components(&graph);

        Self {
            graph,
            rtree,
            link_rtree,
            link_nodes,
            degrees,
            component_count,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Underlying `petgraph` graph
    pub fn graph(&self) -> &UnGraph<NetworkNode, NetworkEdge> {
        &self.graph
    }

    /// All edges incident to `node`
    pub fn edges(&self, node: NodeIndex) -> Edges<'_, NetworkEdge, Undirected> {
        self.graph.edges(node)
    }

    pub fn rtree_ref(&self) -> &RTree<IndexedPoint> {
        &self.rtree
    }

    pub fn node_geometry(&self, node: NodeIndex) -> Option<Point<f64>> {
        self.graph.node_weight(node).map(|n| n.geometry)
    }

    /// Number of edges incident to `node` (0 for unknown nodes)
    pub fn degree(&self, node: NodeIndex) -> usize {
        self.degrees.get(node.index()).copied().unwrap_or(0)
    }

    pub fn degrees(&self) -> &[usize] {
        &self.degrees
    }

    /// Vertex coordinates in index order
    pub fn vertices(&self) -> Vec<Point<f64>> {
        self.graph.node_weights().map(|n| n.geometry).collect()
    }

    /// Vertices inserted at segment midpoints, empty unless the network was
    /// built with midpoint splitting
    pub fn link_nodes(&self) -> &[NodeIndex] {
        &self.link_nodes
    }

    pub fn has_link_nodes(&self) -> bool {
        !self.link_nodes.is_empty()
    }

    pub fn component_count(&self) -> usize {
        self.component_count
    }

    /// Axis-aligned extent of all vertices
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        let vertices: MultiPoint = self.vertices().into_iter().collect();
        vertices.bounding_rect()
    }

    pub fn tables(&self) -> NetworkTables {
        let vertices = self
            .graph
            .node_weights()
            .map(|n| (n.geometry.x(), n.geometry.y()))
            .collect();
        let edges = self
            .graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index(), edge.weight().weight))
            .collect();

        NetworkTables {
            vertices,
            edges,
            degrees: self.degrees.clone(),
        }
    }

    /// Nearest vertex to `point` and its Euclidean distance
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeIndex, Length)> {
        k_nearest_in(&self.rtree, point, 1)
            .into_iter()
            .next()
            .map(|(node, distance_2)| (node, distance_2.sqrt()))
    }

    /// The `k` nearest vertices to `point`, closest first, ties broken by
    /// lowest index
    pub fn k_nearest_nodes(&self, point: &Point<f64>, k: usize) -> Vec<NodeIndex> {
        k_nearest_in(&self.rtree, point, k)
            .into_iter()
            .map(|(node, _)| node)
            .collect()
    }

    /// Like [`Self::k_nearest_nodes`] but restricted to link (midpoint) vertices
    pub fn k_nearest_links(&self, point: &Point<f64>, k: usize) -> Vec<NodeIndex> {
        k_nearest_in(&self.link_rtree, point, k)
            .into_iter()
            .map(|(node, _)| node)
            .collect()
    }

    /// Check that such node exists
    pub fn validate_node(&self, node: NodeIndex) -> Result<(), Error> {
        if node.index() < self.graph.node_count() {
            Ok(())
        } else {
            Err(Error::InvalidNodeIndex(node.index()))
        }
    }

    pub fn validate_nodes(&self, nodes: &[NodeIndex]) -> Result<(), Error> {
        nodes.iter().try_for_each(|&node| self.validate_node(node))
    }
}

impl fmt::Debug for RoadNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoadNetwork")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .field("link_nodes", &self.link_nodes.len())
            .field("components", &self.component_count)
            .finish_non_exhaustive()
    }
}

fn build_rtree(
    graph: &UnGraph<NetworkNode, NetworkEdge>,
    nodes: impl Iterator<Item = NodeIndex>,
) -> RTree<IndexedPoint> {
    let points = nodes
        .filter_map(|node| {
            graph
                .node_weight(node)
                .map(|n| IndexedPoint::new([n.geometry.x(), n.geometry.y()], node))
        })
        .collect();
    RTree::bulk_load(points)
}

/// R-tree neighbour search with deterministic tie-breaking.
///
/// Keeps pulling candidates past the k-th one while they are tied with it,
/// then orders by `(squared distance, index)`.
fn k_nearest_in(tree: &RTree<IndexedPoint>, point: &Point<f64>, k: usize) -> Vec<(NodeIndex, f64)> {
    if k == 0 {
        return Vec::new();
    }

    let query = [point.x(), point.y()];
    let mut found: Vec<(NodeIndex, f64)> = Vec::with_capacity(k);
    for (item, distance_2) in tree.nearest_neighbor_iter_with_distance_2(&query) {
        if found.len() >= k && found.last().is_some_and(|&(_, last)| distance_2 > last) {
            break;
        }
        found.push((item.data, distance_2));
    }

    found.sort_unstable_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    found.truncate(k);
    found
}
