//! Road network components - vertices and atomic segments

use geo::Point;

use crate::Length;

/// Road network vertex
#[derive(Debug, Clone)]
pub struct NetworkNode {
    /// Vertex coordinates
    pub geometry: Point<f64>,
}

/// Road network edge (atomic road segment)
#[derive(Debug, Clone)]
pub struct NetworkEdge {
    /// Euclidean segment length
    pub weight: Length,
}

impl NetworkEdge {
    pub fn length(&self) -> Length {
        self.weight
    }
}
