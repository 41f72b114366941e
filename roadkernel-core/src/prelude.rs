pub use crate::{DEFAULT_BANDWIDTH, DEFAULT_COINCIDENCE_TOLERANCE, DEFAULT_KNOT_OVERSAMPLING};

// Re-export key components
pub use crate::Error;
pub use crate::algo::kernel::{KernelType, Normalization, evaluate_kernel, evaluate_kernel_with};
pub use crate::algo::knots::{KnotSet, select_knots};
pub use crate::algo::snap::{snap, snap_nearest, snap_to_links};
pub use crate::loading::{
    KernelConfig, KnotConfig, NetworkConfig, PathConfig, PipelineConfig, SnapTarget, build_graph,
};
pub use crate::model::{DenseMatrix, NetworkTables, RoadNetwork};
pub use crate::pipeline::{KernelBasis, prepare_kernel_basis};
pub use crate::routing::{
    PathMatrices, PathWeighting, PathWeightingKind, compute_distances_and_weights,
};

// Core types for the road network
pub use crate::Length;
pub use crate::NetworkNodeId;
