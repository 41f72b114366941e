//! Decomposition of road polylines into atomic segments

use geo::{Distance, Euclidean, LineString, Point};
use itertools::Itertools;
use log::{debug, warn};

use crate::{Error, Length};

/// One atomic edge of the road network
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point<f64>,
    pub end: Point<f64>,
}

impl Segment {
    pub fn new(start: Point<f64>, end: Point<f64>) -> Self {
        Self { start, end }
    }

    /// Euclidean length
    pub fn length(&self) -> Length {
        Euclidean.distance(self.start, self.end)
    }

    pub fn midpoint(&self) -> Point<f64> {
        Point::new(
            0.5 * (self.start.x() + self.end.x()),
            0.5 * (self.start.y() + self.end.y()),
        )
    }
}

/// Output of [`split_polylines`]
#[derive(Debug, Clone, Default)]
pub struct SplitGeometry {
    pub segments: Vec<Segment>,
    /// Midpoint of each segment, same order as `segments`
    pub midpoints: Vec<Point<f64>>,
    /// Indices of input polylines that were skipped as malformed
    pub skipped: Vec<usize>,
}

impl SplitGeometry {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Check that a polyline can be split into segments
///
/// # Errors
///
/// Returns [`Error::MalformedGeometry`] for polylines with fewer than two
/// points or with non-finite coordinates
pub fn validate_polyline(index: usize, polyline: &LineString<f64>) -> Result<(), Error> {
    let points = polyline.0.len();
    if points < 2 {
        return Err(Error::MalformedGeometry {
            index,
            reason: format!("{points} point(s), at least 2 required"),
        });
    }
    if polyline.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(Error::MalformedGeometry {
            index,
            reason: "non-finite coordinate".to_string(),
        });
    }
    Ok(())
}

/// Splits every polyline into consecutive point pairs.
///
/// Malformed polylines are skipped with a warning and recorded in
/// [`SplitGeometry::skipped`]. Repeated consecutive points produce no
/// segment. With `max_segment_length` set, longer segments are divided into
/// equal pieces no longer than the limit.
pub fn split_polylines(
    polylines: &[LineString<f64>],
    max_segment_length: Option<Length>,
) -> SplitGeometry {
    let mut split = SplitGeometry::default();

    for (index, polyline) in polylines.iter().enumerate() {
        if let Err(e) = validate_polyline(index, polyline) {
            warn!("Skipping polyline: {e}");
            split.skipped.push(index);
            continue;
        }

        for (a, b) in polyline.coords().tuple_windows() {
            let segment = Segment::new(Point::from(*a), Point::from(*b));
            let length = segment.length();
            if length == 0.0 {
                debug!("Dropping zero-length segment in polyline {index} at {:?}", segment.start);
                continue;
            }

            match max_segment_length {
                Some(limit) if length > limit => densify(&segment, length, limit, &mut split),
                _ => push_segment(&mut split, segment),
            }
        }
    }

    debug!(
        "Split {} polylines into {} segments ({} skipped)",
        polylines.len(),
        split.segments.len(),
        split.skipped.len()
    );
    split
}

fn push_segment(split: &mut SplitGeometry, segment: Segment) {
    split.midpoints.push(segment.midpoint());
    split.segments.push(segment);
}

fn densify(segment: &Segment, length: Length, limit: Length, split: &mut SplitGeometry) {
    let dx = segment.end.x() - segment.start.x();
    let dy = segment.end.y() - segment.start.y();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pieces = (length / limit).ceil() as usize;

    let mut previous = segment.start;
    for k in 1..=pieces {
        let next = if k == pieces {
            segment.end
        } else {
            #[allow(clippy::cast_precision_loss)]
            let frac = k as f64 / pieces as f64;
            Point::new(
                frac.mul_add(dx, segment.start.x()),
                frac.mul_add(dy, segment.start.y()),
            )
        };
        push_segment(split, Segment::new(previous, next));
        previous = next;
    }
}
