//! Distance kernels mapping path distances and weights to a design matrix

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::loading::KernelConfig;
use crate::model::DenseMatrix;
use crate::{Error, Length};

/// Kernel family, each a function of `u = distance / bandwidth` with
/// maximum value 1 at `u = 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KernelType {
    /// `exp(-u² / 2)`
    #[default]
    Gaussian,
    /// `exp(-u)`
    Exponential,
    /// `1 - u²` for `u <= 1`, else 0
    Epanechnikov,
}

impl KernelType {
    pub const ALL: [Self; 3] = [Self::Gaussian, Self::Exponential, Self::Epanechnikov];

    /// Unweighted kernel profile at normalized distance `u >= 0`
    pub fn profile(self, u: f64) -> f64 {
        match self {
            Self::Gaussian => (-0.5 * u * u).exp(),
            Self::Exponential => (-u).exp(),
            Self::Epanechnikov => {
                if u <= 1.0 {
                    u.mul_add(-u, 1.0)
                } else {
                    0.0
                }
            }
        }
    }

    pub fn has_compact_support(self) -> bool {
        matches!(self, Self::Epanechnikov)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::Exponential => "exponential",
            Self::Epanechnikov => "epanechnikov",
        }
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gaussian" | "normal" => Ok(Self::Gaussian),
            "exponential" | "exp" => Ok(Self::Exponential),
            "epanechnikov" => Ok(Self::Epanechnikov),
            _ => Err(Error::UnsupportedKernel(s.to_string())),
        }
    }
}

/// Rescaling applied after the kernel values are weighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    #[default]
    None,
    /// Each row with positive mass sums to 1
    RowSum,
    /// Divide by the largest entry of the matrix
    GlobalMax,
}

pub(crate) fn validate_bandwidth(bandwidth: Length) -> Result<(), Error> {
    if bandwidth.is_finite() && bandwidth > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidBandwidth(bandwidth))
    }
}

/// Kernel value for one observation-knot pair.
///
/// Infinite distances (no connecting path) give 0 whatever the weight.
/// Weights are clamped to `[0, 1]` so the value never exceeds 1.
pub fn kernel_value(kernel: KernelType, bandwidth: Length, distance: Length, weight: f64) -> f64 {
    if !distance.is_finite() || !weight.is_finite() {
        return 0.0;
    }
    kernel.profile(distance.max(0.0) / bandwidth) * weight.clamp(0.0, 1.0)
}

/// Maps distances and path weights into an unnormalized kernel matrix
///
/// # Errors
///
/// Returns [`Error::InvalidBandwidth`] unless the bandwidth is finite and
/// positive, and [`Error::ShapeMismatch`] if the matrices differ in shape
pub fn evaluate_kernel(
    kernel: KernelType,
    bandwidth: Length,
    distances: &DenseMatrix,
    weights: &DenseMatrix,
) -> Result<DenseMatrix, Error> {
    evaluate_kernel_with(&KernelConfig::new(kernel, bandwidth), distances, weights)
}

/// Maps distances and path weights into a kernel matrix, applying the
/// configured normalization
///
/// # Errors
///
/// Same as [`evaluate_kernel`]
pub fn evaluate_kernel_with(
    config: &KernelConfig,
    distances: &DenseMatrix,
    weights: &DenseMatrix,
) -> Result<DenseMatrix, Error> {
    validate_bandwidth(config.bandwidth)?;
    distances.ensure_same_shape(weights)?;

    let (rows, cols) = distances.shape();
    let mut kernel = DenseMatrix::zeros(rows, cols);
    for r in 0..rows {
        let out = kernel.row_mut(r);
        for ((value, &d), &w) in out.iter_mut().zip(distances.row(r)).zip(weights.row(r)) {
            *value = kernel_value(config.kernel, config.bandwidth, d, w);
        }
    }

    match config.normalization {
        Normalization::None => {}
        Normalization::RowSum => {
            for r in 0..rows {
                let row = kernel.row_mut(r);
                let total: f64 = row.iter().sum();
                if total > 0.0 {
                    row.iter_mut().for_each(|v| *v /= total);
                }
            }
        }
        Normalization::GlobalMax => {
            let max = kernel.as_slice().iter().copied().fold(0.0, f64::max);
            if max > 0.0 {
                for r in 0..rows {
                    kernel.row_mut(r).iter_mut().for_each(|v| *v /= max);
                }
            }
        }
    }

    debug!(
        "Evaluated {} kernel (h = {}) over {rows}x{cols} pairs",
        config.kernel, config.bandwidth
    );
    Ok(kernel)
}
