mod state;
pub mod traced_dijkstra;

pub use traced_dijkstra::{NetworkPath, ShortestPathTree, path_distance, shortest_path_tree};
