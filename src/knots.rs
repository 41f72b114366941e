use pyo3::prelude::*;
use roadkernel_core::prelude::*;

use crate::convert;
use crate::network::PyRoadNetwork;
use crate::to_py_err;

/// Select knot vertices inside the convex hull of the observation vertices
///
/// Parameters
/// ----------
/// network : RoadNetwork
/// data_nodes : list[int]
///     Snapped observation vertices
/// target_count : int, optional
///     Grid candidates, ``ceil(1.5 * distinct sites)`` when omitted
/// neighbours : int, default=1
///     Vertices each grid point is snapped to
///
/// Returns
/// -------
/// list[int]
///     Sorted knot vertex ids
///
/// Raises
/// ------
/// RuntimeError
///     If no candidate lies inside the hull
#[pyfunction(name = "select_knots")]
#[pyo3(signature = (network, data_nodes, target_count = None, neighbours = 1))]
pub fn py_select_knots(
    network: &PyRoadNetwork,
    data_nodes: Vec<usize>,
    target_count: Option<usize>,
    neighbours: usize,
) -> PyResult<Vec<usize>> {
    let bbox = network
        .network
        .bounding_rect()
        .ok_or_else(|| to_py_err(Error::EmptyNetwork))?;
    let config = KnotConfig {
        target_count,
        neighbours,
        ..KnotConfig::default()
    };

    let knots = select_knots(&network.network, &bbox, &config, &convert::node_ids(&data_nodes))
        .map_err(to_py_err)?;
    Ok(convert::node_indices(&knots.knot_ids))
}
