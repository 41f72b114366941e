//! Path weights correcting kernel mass for local network density.
//!
//! A kernel spreading outward from a knot along the network has to share
//! its mass between the branches at every intersection, otherwise dense
//! parts of the network would accumulate more variance than sparse ones.
//! The weight of an observation-knot pair is derived from the path that was
//! actually realized between them.

use serde::{Deserialize, Serialize};

use super::dijkstra::NetworkPath;
use crate::Error;
use crate::model::RoadNetwork;

/// Strategy turning a realized shortest path into a weight in `[0, 1]`
pub trait PathWeighting: Send + Sync {
    fn path_weight(&self, network: &RoadNetwork, path: &NetworkPath) -> f64;
}

/// Built-in weighting strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathWeightingKind {
    /// Equal split at intersections: product of `1 / (degree - 1)` over the
    /// interior vertices of the path
    #[default]
    EqualSplit,
    /// No density correction
    Uniform,
    /// `exp(-rate * (edges - 1))`, 1 for paths of at most one edge
    HopDecay { rate: f64 },
}

impl PathWeightingKind {
    pub fn validate(&self) -> Result<(), Error> {
        match *self {
            Self::HopDecay { rate } if !rate.is_finite() || rate < 0.0 => Err(Error::InvalidConfig(
                format!("hop decay rate must be finite and non-negative, got {rate}"),
            )),
            _ => Ok(()),
        }
    }
}

impl PathWeighting for PathWeightingKind {
    fn path_weight(&self, network: &RoadNetwork, path: &NetworkPath) -> f64 {
        match *self {
            Self::EqualSplit => path
                .interior()
                .iter()
                .map(|&node| network.degree(node).saturating_sub(1).max(1))
                .fold(1.0, |weight, branches| {
                    #[allow(clippy::cast_precision_loss)]
                    let branches = branches as f64;
                    weight / branches
                }),
            Self::Uniform => 1.0,
            Self::HopDecay { rate } => {
                #[allow(clippy::cast_precision_loss)]
                let extra_hops = path.edge_count().saturating_sub(1) as f64;
                (-rate * extra_hops).exp()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Point};

    use super::*;
    use crate::loading::{NetworkConfig, build_graph};
    use crate::routing::shortest_path_tree;

    /// Plus-shaped junction at the origin plus a tail hanging off the east arm
    fn junction() -> RoadNetwork {
        let lines = vec![
            LineString::from(vec![(-10.0, 0.0), (0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]),
            LineString::from(vec![(0.0, -10.0), (0.0, 0.0), (0.0, 10.0)]),
        ];
        build_graph(&lines, &NetworkConfig::default()).expect("valid network")
    }

    fn path_between(network: &RoadNetwork, from: (f64, f64), to: (f64, f64)) -> NetworkPath {
        let a = network.k_nearest_nodes(&Point::new(from.0, from.1), 1)[0];
        let b = network.k_nearest_nodes(&Point::new(to.0, to.1), 1)[0];
        shortest_path_tree(network, a, None)
            .path(b)
            .expect("connected")
    }

    #[test]
    fn equal_split_divides_at_intersections() {
        let network = junction();
        // Through the degree 4 junction: 1 / 3
        let path = path_between(&network, (-10.0, 0.0), (0.0, 10.0));
        let weight = PathWeightingKind::EqualSplit.path_weight(&network, &path);
        assert!((weight - 1.0 / 3.0).abs() < 1e-12);

        // Through the junction and then a degree 2 vertex: still 1 / 3
        let path = path_between(&network, (-10.0, 0.0), (20.0, 0.0));
        let weight = PathWeightingKind::EqualSplit.path_weight(&network, &path);
        assert!((weight - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn equal_split_is_one_without_branching() {
        let network = junction();
        let path = path_between(&network, (0.0, 0.0), (20.0, 0.0));
        assert_eq!(path.edge_count(), 2);
        let weight = PathWeightingKind::EqualSplit.path_weight(&network, &path);
        assert!((weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trivial_path_has_unit_weight() {
        let network = junction();
        let path = path_between(&network, (0.0, 0.0), (0.0, 0.0));
        for kind in [
            PathWeightingKind::EqualSplit,
            PathWeightingKind::Uniform,
            PathWeightingKind::HopDecay { rate: 2.0 },
        ] {
            assert!((kind.path_weight(&network, &path) - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn hop_decay_shrinks_with_path_length() {
        let network = junction();
        let kind = PathWeightingKind::HopDecay { rate: 0.5 };
        let short = path_between(&network, (-10.0, 0.0), (0.0, 0.0));
        let long = path_between(&network, (-10.0, 0.0), (20.0, 0.0));

        assert!((kind.path_weight(&network, &short) - 1.0).abs() < f64::EPSILON);
        assert!((kind.path_weight(&network, &long) - (-1.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn negative_decay_rate_is_invalid() {
        assert!(PathWeightingKind::HopDecay { rate: -1.0 }.validate().is_err());
        assert!(PathWeightingKind::EqualSplit.validate().is_ok());
    }
}
