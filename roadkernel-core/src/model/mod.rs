//! Data model for network-constrained kernel construction
//!
//! Contains the road network graph and the dense matrices produced from it.

pub mod matrix;
pub mod network;

pub use matrix::DenseMatrix;
pub use network::{IndexedPoint, NetworkEdge, NetworkNode, NetworkTables, RoadNetwork};
