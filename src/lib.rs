//! Python bindings for `roadkernel_core`, enabled with the `python` feature

pub mod convert;

#[cfg(feature = "python")]
pub mod knots;
#[cfg(feature = "python")]
pub mod matrix;
#[cfg(feature = "python")]
pub mod network;

#[cfg(feature = "python")]
pub use python::to_py_err;

#[cfg(feature = "python")]
mod python {
    use pyo3::exceptions::{PyRuntimeError, PyValueError};
    use pyo3::prelude::*;
    use roadkernel_core::Error;

    use crate::knots::py_select_knots;
    use crate::matrix::{
        PyKernelBasis, py_compute_distances_and_weights, py_evaluate_kernel, py_prepare_kernel_basis,
    };
    use crate::network::{PyRoadNetwork, py_build_graph, py_snap, py_snap_to_links};

    /// Input problems raise ValueError, failures on valid input RuntimeError
    pub fn to_py_err(err: Error) -> PyErr {
        match err {
            Error::InvalidBandwidth(_)
            | Error::UnsupportedKernel(_)
            | Error::MalformedGeometry { .. }
            | Error::InvalidNodeIndex(_)
            | Error::InvalidConfig(_)
            | Error::ShapeMismatch(_)
            | Error::ConfigParse(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }

    /// A Python module implemented in Rust.
    #[pymodule]
    fn roadkernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
        pyo3_log::init();

        m.add_class::<PyRoadNetwork>()?;
        m.add_function(wrap_pyfunction!(py_build_graph, m)?)?;
        m.add_function(wrap_pyfunction!(py_snap, m)?)?;
        m.add_function(wrap_pyfunction!(py_snap_to_links, m)?)?;

        m.add_function(wrap_pyfunction!(py_select_knots, m)?)?;

        m.add_function(wrap_pyfunction!(py_compute_distances_and_weights, m)?)?;
        m.add_function(wrap_pyfunction!(py_evaluate_kernel, m)?)?;

        m.add_class::<PyKernelBasis>()?;
        m.add_function(wrap_pyfunction!(py_prepare_kernel_basis, m)?)?;
        Ok(())
    }
}
