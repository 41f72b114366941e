use pyo3::prelude::*;
use roadkernel_core::prelude::*;

use crate::convert;
use crate::network::PyRoadNetwork;
use crate::to_py_err;

type Rows = Vec<Vec<f64>>;

/// Shortest path distance and path weight matrices
///
/// Unreachable pairs get an infinite distance and a NaN weight.
///
/// Parameters
/// ----------
/// network : RoadNetwork
/// data_nodes : list[int]
/// knots : list[int]
/// weighting : str, default="equal_split"
///     One of ``equal_split``, ``uniform`` or ``hop_decay``
/// hop_decay_rate : float, default=0.0
/// max_distance : float, optional
///     Search budget; farther knots count as unreachable
///
/// Returns
/// -------
/// tuple[list[list[float]], list[list[float]]]
#[pyfunction(name = "compute_distances_and_weights")]
#[pyo3(signature = (network, data_nodes, knots, weighting = "equal_split", hop_decay_rate = 0.0, max_distance = None))]
pub fn py_compute_distances_and_weights(
    network: &PyRoadNetwork,
    data_nodes: Vec<usize>,
    knots: Vec<usize>,
    weighting: &str,
    hop_decay_rate: f64,
    max_distance: Option<f64>,
) -> PyResult<(Rows, Rows)> {
    let config = PathConfig {
        weighting: convert::weighting(weighting, hop_decay_rate).map_err(to_py_err)?,
        max_distance,
    };
    let paths = compute_distances_and_weights(
        &network.network,
        &convert::node_ids(&data_nodes),
        &convert::node_ids(&knots),
        &config,
    )
    .map_err(to_py_err)?;

    Ok((paths.distances.to_rows(), paths.weights.to_rows()))
}

/// Kernel matrix from distances and path weights
///
/// Parameters
/// ----------
/// distances : list[list[float]]
/// weights : list[list[float]]
/// kernel : str, default="gaussian"
///     One of ``gaussian``, ``exponential`` or ``epanechnikov``
/// bandwidth : float, default=1000.0
/// normalization : str, default="none"
///     One of ``none``, ``row_sum`` or ``global_max``
#[pyfunction(name = "evaluate_kernel")]
#[pyo3(signature = (distances, weights, kernel = "gaussian", bandwidth = DEFAULT_BANDWIDTH, normalization = "none"))]
pub fn py_evaluate_kernel(
    distances: Rows,
    weights: Rows,
    kernel: &str,
    bandwidth: f64,
    normalization: &str,
) -> PyResult<Rows> {
    let config = KernelConfig {
        kernel: kernel.parse().map_err(to_py_err)?,
        bandwidth,
        normalization: convert::normalization(normalization).map_err(to_py_err)?,
    };
    let distances = DenseMatrix::from_rows(distances).map_err(to_py_err)?;
    let weights = DenseMatrix::from_rows(weights).map_err(to_py_err)?;

    let kernel = evaluate_kernel_with(&config, &distances, &weights).map_err(to_py_err)?;
    Ok(kernel.to_rows())
}

/// Result of :func:`prepare_kernel_basis`
#[pyclass(name = "KernelBasis")]
pub struct PyKernelBasis {
    basis: KernelBasis,
}

#[pymethods]
impl PyKernelBasis {
    #[getter]
    fn data_nodes(&self) -> Vec<usize> {
        convert::node_indices(&self.basis.data_nodes)
    }

    #[getter]
    fn knots(&self) -> Vec<usize> {
        convert::node_indices(&self.basis.knots.knot_ids)
    }

    #[getter]
    fn distances(&self) -> Rows {
        self.basis.distances().to_rows()
    }

    #[getter]
    fn weights(&self) -> Rows {
        self.basis.weights().to_rows()
    }

    #[getter]
    fn kernel(&self) -> Rows {
        self.basis.kernel.to_rows()
    }

    /// Kernel matrix for another kernel or bandwidth, reusing the distances
    #[pyo3(signature = (kernel = "gaussian", bandwidth = DEFAULT_BANDWIDTH, normalization = "none"))]
    fn with_kernel(&self, kernel: &str, bandwidth: f64, normalization: &str) -> PyResult<Rows> {
        let config = KernelConfig {
            kernel: kernel.parse().map_err(to_py_err)?,
            bandwidth,
            normalization: convert::normalization(normalization).map_err(to_py_err)?,
        };
        let kernel = self.basis.with_kernel(&config).map_err(to_py_err)?;
        Ok(kernel.to_rows())
    }

    fn __repr__(&self) -> String {
        format!(
            "KernelBasis with {} observations and {} knots",
            self.basis.data_nodes.len(),
            self.basis.knots.len()
        )
    }
}

/// Snap observations, select knots and evaluate the kernel in one call
///
/// Parameters
/// ----------
/// network : RoadNetwork
/// points : list[tuple[float, float]]
///     Observation coordinates
/// config : str, optional
///     JSON pipeline settings; defaults are used for missing keys
///
/// Returns
/// -------
/// KernelBasis
#[pyfunction(name = "prepare_kernel_basis")]
#[pyo3(signature = (network, points, config = None))]
pub fn py_prepare_kernel_basis(
    network: &PyRoadNetwork,
    points: Vec<(f64, f64)>,
    config: Option<&str>,
) -> PyResult<PyKernelBasis> {
    let config = match config {
        Some(json) => PipelineConfig::from_json(json).map_err(to_py_err)?,
        None => PipelineConfig::default(),
    };
    let basis = prepare_kernel_basis(&network.network, &convert::points(&points), &config)
        .map_err(to_py_err)?;
    Ok(PyKernelBasis { basis })
}
