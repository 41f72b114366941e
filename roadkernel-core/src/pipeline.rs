//! End-to-end construction of the kernel basis for a set of observations

use geo::Point;
use log::{debug, info};
use petgraph::graph::NodeIndex;

use crate::algo::kernel::evaluate_kernel_with;
use crate::algo::knots::{KnotSet, select_knots};
use crate::algo::snap::{snap_nearest, snap_to_links};
use crate::loading::{KernelConfig, PipelineConfig, SnapTarget};
use crate::model::{DenseMatrix, RoadNetwork};
use crate::routing::{PathMatrices, compute_distances_and_weights};
use crate::{Error, Length};

/// Everything derived for one analysis run
#[derive(Debug, Clone)]
pub struct KernelBasis {
    /// Snapped vertex of every observation, in input order
    pub data_nodes: Vec<NodeIndex>,
    pub knots: KnotSet,
    /// Observation × knot distances and path weights
    pub paths: PathMatrices,
    /// Observation × knot kernel matrix
    pub kernel: DenseMatrix,
}

impl KernelBasis {
    pub fn distances(&self) -> &DenseMatrix {
        &self.paths.distances
    }

    pub fn weights(&self) -> &DenseMatrix {
        &self.paths.weights
    }

    /// Re-evaluates the kernel with other settings, reusing the distances
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBandwidth`] for an invalid bandwidth
    pub fn with_kernel(&self, config: &KernelConfig) -> Result<DenseMatrix, Error> {
        evaluate_kernel_with(config, &self.paths.distances, &self.paths.weights)
    }
}

/// Snaps observations, selects knots, computes path matrices and evaluates
/// the kernel.
///
/// # Errors
///
/// Returns an error for invalid settings, when no knot survives selection,
/// or when observations cannot be snapped
pub fn prepare_kernel_basis(
    network: &RoadNetwork,
    observations: &[Point<f64>],
    config: &PipelineConfig,
) -> Result<KernelBasis, Error> {
    config.validate()?;

    let data_nodes = match config.snap_target {
        SnapTarget::Vertices => snap_nearest(network, observations)?,
        SnapTarget::Links => snap_to_links(network, observations, 1)?
            .into_iter()
            .map(|nearest| nearest.first().copied().ok_or(Error::NoPointsFound))
            .collect::<Result<Vec<_>, _>>()?,
    };
    log_snap_distances(network, observations, &data_nodes);

    let bbox = network.bounding_rect().ok_or(Error::EmptyNetwork)?;
    let knots = select_knots(network, &bbox, &config.knots, &data_nodes)?;
    let paths = compute_distances_and_weights(network, &data_nodes, &knots.knot_ids, &config.paths)?;
    let kernel = evaluate_kernel_with(&config.kernel, &paths.distances, &paths.weights)?;

    info!(
        "Kernel basis ready: {} observations x {} knots ({} kernel, h = {})",
        data_nodes.len(),
        knots.len(),
        config.kernel.kernel,
        config.kernel.bandwidth
    );

    Ok(KernelBasis {
        data_nodes,
        knots,
        paths,
        kernel,
    })
}

fn log_snap_distances(network: &RoadNetwork, observations: &[Point<f64>], nodes: &[NodeIndex]) {
    let max_offset = observations
        .iter()
        .zip(nodes)
        .filter_map(|(point, &node)| {
            network.node_geometry(node).map(|g| {
                let dx = g.x() - point.x();
                let dy = g.y() - point.y();
                dx.hypot(dy)
            })
        })
        .fold(0.0, Length::max);
    debug!(
        "Snapped {} observations, largest snapping offset {max_offset:.2}",
        observations.len()
    );
}

#[cfg(test)]
mod tests {
    use geo::LineString;

    use super::*;
    use crate::algo::kernel::KernelType;
    use crate::loading::{KnotConfig, NetworkConfig, build_graph};

    fn ladder() -> RoadNetwork {
        let lines = vec![
            LineString::from(vec![(0.0, 0.0), (100.0, 0.0), (150.0, 0.0), (200.0, 0.0), (300.0, 0.0)]),
            LineString::from(vec![(0.0, 100.0), (100.0, 100.0), (150.0, 100.0), (200.0, 100.0), (300.0, 100.0)]),
            LineString::from(vec![(0.0, 0.0), (0.0, 100.0)]),
            LineString::from(vec![(150.0, 0.0), (150.0, 100.0)]),
            LineString::from(vec![(300.0, 0.0), (300.0, 100.0)]),
        ];
        build_graph(&lines, &NetworkConfig::default()).expect("valid network")
    }

    #[test]
    fn basis_has_consistent_shapes() {
        let network = ladder();
        let observations: Vec<Point<f64>> = [(5.0, 3.0), (290.0, 97.0), (120.0, 2.0), (210.0, 101.0), (0.0, 95.0)]
            .iter()
            .map(|&(x, y)| Point::new(x, y))
            .collect();
        let config = PipelineConfig {
            knots: KnotConfig::with_target_count(9, 1),
            ..PipelineConfig::default()
        };

        let basis = prepare_kernel_basis(&network, &observations, &config).expect("basis");
        assert_eq!(basis.data_nodes.len(), observations.len());
        assert_eq!(basis.kernel.shape(), (observations.len(), basis.knots.len()));
        assert_eq!(basis.distances().shape(), basis.kernel.shape());
        assert!(basis.kernel.as_slice().iter().all(|&k| (0.0..=1.0).contains(&k)));
    }

    #[test]
    fn rebandwidth_produces_fresh_matrix() {
        let network = ladder();
        let observations = [Point::new(0.0, 0.0), Point::new(300.0, 100.0), Point::new(300.0, 0.0)];
        let config = PipelineConfig {
            knots: KnotConfig::with_target_count(4, 1),
            ..PipelineConfig::default()
        };
        let basis = prepare_kernel_basis(&network, &observations, &config).expect("basis");

        let narrow = basis
            .with_kernel(&KernelConfig::new(KernelType::Gaussian, 10.0))
            .expect("valid bandwidth");
        assert_eq!(narrow.shape(), basis.kernel.shape());
        assert_ne!(narrow, basis.kernel);
        assert!(matches!(
            basis.with_kernel(&KernelConfig::new(KernelType::Gaussian, -1.0)),
            Err(Error::InvalidBandwidth(_))
        ));
    }

    #[test]
    fn link_snapping_uses_midpoints() {
        let config = PipelineConfig {
            network: NetworkConfig {
                split_at_midpoints: true,
                ..NetworkConfig::default()
            },
            snap_target: SnapTarget::Links,
            knots: KnotConfig::with_target_count(9, 1),
            ..PipelineConfig::default()
        };
        let lines = vec![LineString::from(vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0), (0.0, 0.0)])];
        let network = build_graph(&lines, &config.network).expect("valid network");

        let observations = [Point::new(1.0, 1.0), Point::new(99.0, 99.0), Point::new(10.0, 90.0)];
        let basis = prepare_kernel_basis(&network, &observations, &config).expect("basis");
        for node in &basis.data_nodes {
            assert!(network.link_nodes().contains(node));
        }
    }
}
