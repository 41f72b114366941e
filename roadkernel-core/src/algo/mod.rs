//! Snapping, knot selection and kernel evaluation on top of the road network

pub mod kernel;
pub mod knots;
pub mod snap;
