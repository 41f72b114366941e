//! Road network model

pub mod components;
pub mod graph;

pub use components::{NetworkEdge, NetworkNode};
pub use graph::{IndexedPoint, NetworkTables, RoadNetwork};
