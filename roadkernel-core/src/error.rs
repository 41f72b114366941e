use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No segments to build a road network from")]
    EmptyNetwork,
    #[error("No path between network nodes {from} and {to}")]
    DisconnectedPair { from: usize, to: usize },
    #[error("Invalid bandwidth {0}: must be finite and greater than zero")]
    InvalidBandwidth(f64),
    #[error("Unsupported kernel type: {0}")]
    UnsupportedKernel(String),
    #[error("Knot selection produced no knots ({candidates} candidates before hull filtering)")]
    DegenerateKnotSet { candidates: usize },
    #[error("Malformed geometry in polyline {index}: {reason}")]
    MalformedGeometry { index: usize, reason: String },
    #[error("No nearby points found for snapping")]
    NoPointsFound,
    #[error("Invalid node index: {0}")]
    InvalidNodeIndex(usize),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Matrix shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
