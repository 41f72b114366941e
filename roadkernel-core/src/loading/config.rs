use serde::{Deserialize, Serialize};

use crate::algo::kernel::{KernelType, Normalization, validate_bandwidth};
use crate::routing::PathWeightingKind;
use crate::{DEFAULT_BANDWIDTH, DEFAULT_COINCIDENCE_TOLERANCE, DEFAULT_KNOT_OVERSAMPLING};
use crate::{Error, Length};

/// Road network construction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Points closer than this are merged into one vertex
    pub coincidence_tolerance: Length,
    /// Split longer segments into equal pieces no longer than this
    pub max_segment_length: Option<Length>,
    /// Insert every segment midpoint as a vertex (link nodes)
    pub split_at_midpoints: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            coincidence_tolerance: DEFAULT_COINCIDENCE_TOLERANCE,
            max_segment_length: None,
            split_at_midpoints: false,
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.coincidence_tolerance.is_finite() || self.coincidence_tolerance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "coincidence tolerance must be a finite non-negative number, got {}",
                self.coincidence_tolerance
            )));
        }
        if let Some(limit) = self.max_segment_length {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "max segment length must be positive, got {limit}"
                )));
            }
        }
        Ok(())
    }
}

/// Knot selection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnotConfig {
    /// Number of grid candidates; derived from the observation count when unset
    pub target_count: Option<usize>,
    /// Grid candidates per distinct observation site when `target_count` is unset
    pub oversampling: f64,
    /// Vertices each grid point is snapped to
    pub neighbours: usize,
}

impl Default for KnotConfig {
    fn default() -> Self {
        Self {
            target_count: None,
            oversampling: DEFAULT_KNOT_OVERSAMPLING,
            neighbours: 1,
        }
    }
}

impl KnotConfig {
    pub fn with_target_count(target_count: usize, neighbours: usize) -> Self {
        Self {
            target_count: Some(target_count),
            neighbours,
            ..Self::default()
        }
    }

    /// Grid candidate count for `observation_sites` distinct observation vertices
    pub fn resolve_target_count(&self, observation_sites: usize) -> usize {
        self.target_count.unwrap_or_else(|| {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss
            )]
            let derived = (observation_sites as f64 * self.oversampling).ceil() as usize;
            derived.max(1)
        })
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.target_count == Some(0) {
            return Err(Error::InvalidConfig(
                "knot target count must be at least 1".to_string(),
            ));
        }
        if !self.oversampling.is_finite() || self.oversampling <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "knot oversampling must be positive, got {}",
                self.oversampling
            )));
        }
        if self.neighbours == 0 {
            return Err(Error::InvalidConfig(
                "knot neighbours must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Shortest path search and path weighting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathConfig {
    pub weighting: PathWeightingKind,
    /// Search budget; vertices further away are treated as unreachable
    pub max_distance: Option<Length>,
}

impl PathConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(max) = self.max_distance {
            if max.is_nan() || max < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "max distance must be non-negative, got {max}"
                )));
            }
        }
        self.weighting.validate()
    }
}

/// Kernel family and bandwidth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub kernel: KernelType,
    pub bandwidth: Length,
    pub normalization: Normalization,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            kernel: KernelType::default(),
            bandwidth: DEFAULT_BANDWIDTH,
            normalization: Normalization::default(),
        }
    }
}

impl KernelConfig {
    pub fn new(kernel: KernelType, bandwidth: Length) -> Self {
        Self {
            kernel,
            bandwidth,
            normalization: Normalization::None,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        validate_bandwidth(self.bandwidth)
    }
}

/// Which vertices observations are snapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SnapTarget {
    /// Any network vertex
    #[default]
    Vertices,
    /// Link (segment midpoint) vertices only; requires `split_at_midpoints`
    Links,
}

/// Settings for the whole observation-to-kernel pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub network: NetworkConfig,
    pub snap_target: SnapTarget,
    pub knots: KnotConfig,
    pub paths: PathConfig,
    pub kernel: KernelConfig,
}

impl PipelineConfig {
    /// Parses a configuration from JSON, missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are invalid
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.network.validate()?;
        self.knots.validate()?;
        self.paths.validate()?;
        self.kernel.validate()?;

        if self.snap_target == SnapTarget::Links && !self.network.split_at_midpoints {
            return Err(Error::InvalidConfig(
                "snapping to links requires split_at_midpoints".to_string(),
            ));
        }
        Ok(())
    }
}
