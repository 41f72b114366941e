//! Shortest paths over the road network and the observation × knot
//! distance and path weight matrices derived from them.

pub mod dijkstra;
mod path_matrix;
mod weighting;

pub use dijkstra::{NetworkPath, ShortestPathTree, path_distance, shortest_path_tree};
pub use path_matrix::{PathMatrices, compute_distances_and_weights, compute_distances_and_weights_with};
pub use weighting::{PathWeighting, PathWeightingKind};
