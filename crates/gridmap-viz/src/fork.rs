//! Fork geometry near substations.
//!
//! A line leaves its substation through a short fork segment that takes it
//! from the marker to its parallel offset. The quantities here size and orient
//! those forks: the entry and exit angles of the path, the proximity factor of
//! each end and the voltage rank of each end within its substation.

use gridmap_core::{Kilovolts, Radians, Substation};
use serde::Serialize;

use crate::geodesy::{geodesic_distance, map_angle, Coordinate};
use crate::grouping::Cluster;

/// Fork spread, in multiples of the spacing between lines, at which the
/// proximity factor saturates.
const PROXIMITY_SPREAD: f64 = 3.0;

/// How short the segment `first -> second` is relative to the fork spread,
/// clamped to `[0, 1]`.
pub fn proximity_factor(first: Coordinate, second: Coordinate, distance_between_lines: f64) -> f64 {
    let factor = geodesic_distance(first, second).value() / (PROXIMITY_SPREAD * distance_between_lines);
    if factor.is_nan() {
        0.0
    } else {
        factor.clamp(0.0, 1.0)
    }
}

/// Proximity factors at side 1 and side 2 of a path.
pub fn end_proximity_factors(positions: &[Coordinate], distance_between_lines: f64) -> Option<[f64; 2]> {
    let n = positions.len();
    if n < 2 {
        return None;
    }
    Some([
        proximity_factor(positions[0], positions[1], distance_between_lines),
        proximity_factor(positions[n - 1], positions[n - 2], distance_between_lines),
    ])
}

/// Angles of a path, as map bearings in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EndAngles {
    /// First segment, leaving side 1.
    pub entry: Radians,
    /// Last segment, arriving at side 2.
    pub exit: Radians,
    /// Straight first-to-last point.
    pub line: Radians,
}

pub fn end_angles(positions: &[Coordinate]) -> Option<EndAngles> {
    let n = positions.len();
    if n < 2 {
        return None;
    }
    Some(EndAngles {
        entry: map_angle(positions[0], positions[1]).to_radians(),
        exit: map_angle(positions[n - 2], positions[n - 1]).to_radians(),
        line: map_angle(positions[0], positions[n - 1]).to_radians(),
    })
}

/// 1-based rank of `nominal_v` among the distinct nominal voltages of
/// `substation`, ascending. Defaults to 1 when the voltage is not present.
pub fn substation_index(substation: &Substation, nominal_v: Kilovolts) -> usize {
    substation
        .nominal_voltages()
        .iter()
        .position(|&v| v == nominal_v)
        .map_or(1, |rank| rank + 1)
}

/// Minimum proximity factors of a cluster, in the cluster frame
/// (`[origin end, far end]`).
///
/// `factors` yields, per drawable member, its reversal flag and its own
/// `[side 1, side 2]` factors. `None` when no member is drawable.
pub fn cluster_minimum<I>(factors: I) -> Option<[f64; 2]>
where
    I: IntoIterator<Item = (bool, [f64; 2])>,
{
    factors
        .into_iter()
        .map(|(reversed, f)| orient(f, reversed))
        .fold(None, |acc, f| match acc {
            None => Some(f),
            Some([a, b]) => Some([a.min(f[0]), b.min(f[1])]),
        })
}

/// Swap a `[side 1, side 2]` pair into or out of a cluster frame.
pub fn orient(pair: [f64; 2], reversed: bool) -> [f64; 2] {
    if reversed {
        [pair[1], pair[0]]
    } else {
        pair
    }
}

/// Apply the cluster minimum to every member `lookup` knows about.
///
/// `lookup` returns the member's current factors when it is drawable; the
/// returned pairs are in each member's own frame.
pub fn broadcast_cluster_minimum<F>(cluster: &Cluster, mut lookup: F) -> Vec<(String, [f64; 2])>
where
    F: FnMut(&str) -> Option<[f64; 2]>,
{
    let known: Vec<(&str, bool, [f64; 2])> = cluster
        .members
        .iter()
        .filter_map(|m| lookup(&m.line_id).map(|f| (m.line_id.as_str(), m.reversed, f)))
        .collect();
    let Some(minimum) = cluster_minimum(known.iter().map(|&(_, reversed, f)| (reversed, f))) else {
        return Vec::new();
    };
    known
        .into_iter()
        .map(|(id, reversed, _)| (id.to_string(), orient(minimum, reversed)))
        .collect()
}
