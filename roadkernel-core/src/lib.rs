//! Network-constrained kernel bases for spatial regression.
//!
//! Road geometry is turned into an undirected street graph, observations are
//! snapped onto it, a reduced set of knots is chosen inside the observation
//! hull and shortest-path distances between observations and knots are
//! mapped through a distance kernel into a dense design matrix.

pub mod algo;
mod error;
pub mod loading;
pub mod model;
pub mod pipeline;
pub mod prelude;
pub mod routing;

pub use error::Error;

pub use algo::kernel::{KernelType, Normalization, evaluate_kernel, evaluate_kernel_with};
pub use algo::knots::{KnotSet, select_knots};
pub use algo::snap::{snap, snap_nearest, snap_to_links};
pub use loading::{KernelConfig, KnotConfig, NetworkConfig, PathConfig, PipelineConfig, SnapTarget};
pub use loading::{build_graph, build_graph_from_segments, split_polylines};
pub use model::{DenseMatrix, NetworkTables, RoadNetwork};
pub use pipeline::{KernelBasis, prepare_kernel_basis};
pub use routing::{PathMatrices, PathWeighting, PathWeightingKind, compute_distances_and_weights};

/// Index of a vertex in the road network graph
pub type NetworkNodeId = petgraph::graph::NodeIndex;
/// Planar length in network units (meters preferred)
pub type Length = f64;

/// Default distance below which two input points are merged into one vertex
pub const DEFAULT_COINCIDENCE_TOLERANCE: Length = 1e-6;
/// Candidate grid size relative to the number of distinct observation sites
pub const DEFAULT_KNOT_OVERSAMPLING: f64 = 1.5;
/// Default kernel bandwidth in network units
pub const DEFAULT_BANDWIDTH: Length = 1000.0;
