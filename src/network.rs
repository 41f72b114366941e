use pyo3::prelude::*;
use roadkernel_core::prelude::*;

use crate::convert;
use crate::to_py_err;

/// RoadNetwork
///
/// Undirected street graph built from road centrelines. Vertices are the
/// polyline vertices (coincident points merged), edges carry their planar
/// length.
///
/// Example:
///
/// .. code-block:: python
///
///     network = build_graph([[(0, 0), (400, 0), (1000, 0)]])
///     nodes = snap(network, [(390, 5)])
#[pyclass(name = "RoadNetwork")]
pub struct PyRoadNetwork {
    pub(crate) network: RoadNetwork,
}

#[pymethods]
impl PyRoadNetwork {
    pub fn node_count(&self) -> usize {
        self.network.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.network.edge_count()
    }

    pub fn component_count(&self) -> usize {
        self.network.component_count()
    }

    /// Vertex coordinates, indexed by node id
    pub fn vertices(&self) -> Vec<(f64, f64)> {
        self.network.tables().vertices
    }

    /// Edges as `(u, v, length)` triples
    pub fn edges(&self) -> Vec<(usize, usize, f64)> {
        self.network.tables().edges
    }

    pub fn degrees(&self) -> Vec<usize> {
        self.network.degrees().to_vec()
    }

    /// Node ids of the segment midpoints, empty unless the network was built
    /// with `split_at_midpoints`
    pub fn link_nodes(&self) -> Vec<usize> {
        convert::node_indices(self.network.link_nodes())
    }

    /// Nearest vertex to `(x, y)` and its distance, None for an empty network
    pub fn nearest_node(&self, x: f64, y: f64) -> Option<(usize, f64)> {
        self.network
            .nearest_node(&geo::Point::new(x, y))
            .map(|(node, distance)| (node.index(), distance))
    }

    fn __repr__(&self) -> String {
        format!(
            "RoadNetwork with {} vertices, {} edges and {} components",
            self.network.node_count(),
            self.network.edge_count(),
            self.network.component_count()
        )
    }

    fn __str__(&self) -> String {
        self.__repr__()
    }
}

/// Build a road network from polylines
///
/// Parameters
/// ----------
/// lines : list[list[tuple[float, float]]]
///     Road centrelines as coordinate lists in a projected CRS
/// coincidence_tolerance : float, default=1e-6
///     Points closer than this are merged into one vertex
/// max_segment_length : float, optional
///     Longer segments are divided into equal pieces
/// split_at_midpoints : bool, default=False
///     Insert a link vertex in the middle of every segment
///
/// Returns
/// -------
/// RoadNetwork
///
/// Raises
/// ------
/// ValueError
///     If the settings are invalid; malformed polylines are skipped with a warning
/// RuntimeError
///     If no edge survives construction
#[pyfunction(name = "build_graph")]
#[pyo3(signature = (lines, coincidence_tolerance = DEFAULT_COINCIDENCE_TOLERANCE, max_segment_length = None, split_at_midpoints = false))]
pub fn py_build_graph(
    lines: Vec<Vec<(f64, f64)>>,
    coincidence_tolerance: f64,
    max_segment_length: Option<f64>,
    split_at_midpoints: bool,
) -> PyResult<PyRoadNetwork> {
    let config = NetworkConfig {
        coincidence_tolerance,
        max_segment_length,
        split_at_midpoints,
    };
    let network = build_graph(&convert::linestrings(lines), &config).map_err(to_py_err)?;
    Ok(PyRoadNetwork { network })
}

/// Ids of the `k` nearest vertices of every point, ties to the lower id
#[pyfunction(name = "snap")]
#[pyo3(signature = (network, points, k = 1))]
pub fn py_snap(network: &PyRoadNetwork, points: Vec<(f64, f64)>, k: usize) -> Vec<Vec<usize>> {
    convert::nested_node_indices(snap(&network.network, &convert::points(&points), k))
}

/// Ids of the `k` nearest segment midpoints of every point
#[pyfunction(name = "snap_to_links")]
#[pyo3(signature = (network, points, k = 1))]
pub fn py_snap_to_links(
    network: &PyRoadNetwork,
    points: Vec<(f64, f64)>,
    k: usize,
) -> PyResult<Vec<Vec<usize>>> {
    let nearest = snap_to_links(&network.network, &convert::points(&points), k).map_err(to_py_err)?;
    Ok(convert::nested_node_indices(nearest))
}
