//! Cumulative arc length along a path and segment lookup by distance.

use crate::geodesy::{planar_distance, Coordinate};
use gridmap_core::Meters;
use serde::Serialize;

/// Running arc length along `positions`, starting at 0.
///
/// `None` when fewer than two positions are given. Each segment is measured
/// with [`planar_distance`], the same projection used to walk along the path.
pub fn line_distances(positions: &[Coordinate]) -> Option<Vec<f64>> {
    if positions.len() < 2 {
        return None;
    }
    let mut cumulative = Vec::with_capacity(positions.len());
    let mut total = 0.0;
    cumulative.push(total);
    for pair in positions.windows(2) {
        total += planar_distance(pair[0], pair[1]).value();
        cumulative.push(total);
    }
    Some(cumulative)
}

/// Segment of a path located by [`find_segment`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    /// Index of the segment's first point in the path
    pub index: usize,
    pub start: Coordinate,
    pub end: Coordinate,
    /// Distance from `start` to the wanted point
    pub remaining: Meters,
}

impl Segment {
    /// Length of the segment according to the cumulative table.
    pub fn length(&self, cumulative: &[f64]) -> Meters {
        Meters(cumulative[self.index + 1] - cumulative[self.index])
    }
}

/// Locate the segment holding the point `wanted` meters along the path.
///
/// The caller clamps `wanted` to `[0, total]`. A distance falling exactly on an
/// interior vertex resolves to the segment that ends there, and `0` resolves
/// to the first segment. Returns `None` if the tables are too short or do not
/// match in length.
pub fn find_segment(positions: &[Coordinate], cumulative: &[f64], wanted: f64) -> Option<Segment> {
    let n = cumulative.len();
    if n < 2 || positions.len() != n {
        return None;
    }
    // first vertex at or beyond the wanted distance; the segment ends there
    let upper = cumulative.partition_point(|&d| d < wanted);
    let index = upper.saturating_sub(1).min(n - 2);
    Some(Segment {
        index,
        start: positions[index],
        end: positions[index + 1],
        remaining: Meters(wanted - cumulative[index]),
    })
}
