//! Conversions between plain coordinate lists and the core geometry types

use geo::{LineString, Point};
use roadkernel_core::{Error, Normalization, NetworkNodeId, PathWeightingKind};

pub fn linestrings(lines: Vec<Vec<(f64, f64)>>) -> Vec<LineString<f64>> {
    lines.into_iter().map(LineString::from).collect()
}

pub fn points(coords: &[(f64, f64)]) -> Vec<Point<f64>> {
    coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

pub fn node_ids(raw: &[usize]) -> Vec<NetworkNodeId> {
    raw.iter().copied().map(NetworkNodeId::new).collect()
}

pub fn node_indices(ids: &[NetworkNodeId]) -> Vec<usize> {
    ids.iter().map(|id| id.index()).collect()
}

pub fn nested_node_indices(ids: Vec<Vec<NetworkNodeId>>) -> Vec<Vec<usize>> {
    ids.iter().map(|row| node_indices(row)).collect()
}

/// Weighting strategy by name; `rate` only applies to `hop_decay`
pub fn weighting(name: &str, rate: f64) -> Result<PathWeightingKind, Error> {
    let kind = match name.trim().to_ascii_lowercase().as_str() {
        "equal_split" => PathWeightingKind::EqualSplit,
        "uniform" => PathWeightingKind::Uniform,
        "hop_decay" => PathWeightingKind::HopDecay { rate },
        other => {
            return Err(Error::InvalidConfig(format!(
                "unknown path weighting '{other}'"
            )));
        }
    };
    kind.validate()?;
    Ok(kind)
}

pub fn normalization(name: &str) -> Result<Normalization, Error> {
    let value = serde_json::Value::String(name.trim().to_ascii_lowercase());
    Ok(serde_json::from_value(value)?)
}
