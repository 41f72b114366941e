//! This module is responsible for turning parsed road geometry into a
//! road network graph, and holds the pipeline configuration.

mod builder;
mod config;
mod splitter;

pub use builder::{build_graph, build_graph_from_segments};
pub use config::{KernelConfig, KnotConfig, NetworkConfig, PathConfig, PipelineConfig, SnapTarget};
pub use splitter::{Segment, SplitGeometry, split_polylines, validate_polyline};
