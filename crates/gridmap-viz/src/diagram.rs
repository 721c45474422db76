//! Edge geometry helpers for the schematic network area diagram.
//!
//! Everything here works in SVG user space: x grows to the right, y grows
//! downwards, and angles come from `atan2(dy, dx)` in that frame, so a
//! positive angle turns clockwise on screen.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Point at `length` from `self` in direction `angle`.
    pub fn shifted(self, angle: f64, length: f64) -> Point {
        Point::new(self.x + length * angle.cos(), self.y + length * angle.sin())
    }
}

/// Angle of the vector `from -> to`, in radians.
pub fn angle(from: Point, to: Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

pub fn mid_position(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Point at `distance` from `from` towards `to`. Returns `from` when both
/// points coincide.
pub fn point_at_distance(from: Point, to: Point, distance: f64) -> Point {
    let length = from.distance(to);
    if length == 0.0 {
        return from;
    }
    let t = distance / length;
    Point::new(from.x + t * (to.x - from.x), from.y + t * (to.y - from.y))
}

/// End of a fork of `length` leaving `node` at `angle`.
pub fn edge_fork(node: Point, angle: f64, length: f64) -> Point {
    node.shifted(angle, length)
}

/// Angle of fork `index` among `count` parallel edges leaving a node in
/// direction `base`, spread over `aperture` radians.
pub fn parallel_fork_angle(base: f64, index: usize, count: usize, aperture: f64) -> f64 {
    if count < 2 {
        return base;
    }
    let step = aperture / (count - 1) as f64;
    base - aperture / 2.0 + step * index as f64
}

/// Rotation in degrees of an edge label, flipped so text never reads upside
/// down. The result is in `(-90, 90]`.
pub fn edge_name_angle(edge_angle: f64) -> f64 {
    let mut degrees = edge_angle.to_degrees() % 360.0;
    if degrees > 90.0 {
        degrees -= 180.0;
    } else if degrees <= -90.0 {
        degrees += 180.0;
    }
    if degrees > 90.0 {
        degrees -= 180.0;
    } else if degrees <= -90.0 {
        degrees += 180.0;
    }
    degrees
}

/// Rotation in degrees of an arrow drawn pointing up, so that it points along
/// `edge_angle`.
pub fn arrow_rotation(edge_angle: f64) -> f64 {
    (edge_angle + FRAC_PI_2).to_degrees()
}

/// SVG path of a bus node annulus, split into fragments between the
/// `edge_angles` where edges attach. Each gap spans `2 * gap_half_angle`.
///
/// With no edge angles the full annulus is returned as two closed circles
/// (even-odd fill leaves the hole).
pub fn fragmented_annulus_path(
    center: Point,
    inner_radius: f64,
    outer_radius: f64,
    edge_angles: &[f64],
    gap_half_angle: f64,
) -> String {
    if edge_angles.is_empty() {
        let mut path = circle_path(center, outer_radius);
        path.push(' ');
        path.push_str(&circle_path(center, inner_radius));
        return path;
    }

    let mut angles: Vec<f64> = edge_angles.iter().map(|a| a.rem_euclid(TAU)).collect();
    angles.sort_by(f64::total_cmp);

    let mut path = String::new();
    for (i, &current) in angles.iter().enumerate() {
        let next = if i + 1 < angles.len() {
            angles[i + 1]
        } else {
            angles[0] + TAU
        };
        let start = current + gap_half_angle;
        let end = next - gap_half_angle;
        if end <= start {
            continue;
        }
        let large_arc = u8::from(end - start > PI);
        let outer_start = center.shifted(start, outer_radius);
        let outer_end = center.shifted(end, outer_radius);
        let inner_end = center.shifted(end, inner_radius);
        let inner_start = center.shifted(start, inner_radius);
        if !path.is_empty() {
            path.push(' ');
        }
        let _ = write!(
            path,
            "M{:.2},{:.2} A{:.2},{:.2} 0 {} 1 {:.2},{:.2} L{:.2},{:.2} A{:.2},{:.2} 0 {} 0 {:.2},{:.2} Z",
            outer_start.x,
            outer_start.y,
            outer_radius,
            outer_radius,
            large_arc,
            outer_end.x,
            outer_end.y,
            inner_end.x,
            inner_end.y,
            inner_radius,
            inner_radius,
            large_arc,
            inner_start.x,
            inner_start.y,
        );
    }
    path
}

fn circle_path(center: Point, radius: f64) -> String {
    format!(
        "M{:.2},{:.2} A{r:.2},{r:.2} 0 1 1 {:.2},{:.2} A{r:.2},{r:.2} 0 1 1 {:.2},{:.2} Z",
        center.x + radius,
        center.y,
        center.x - radius,
        center.y,
        center.x + radius,
        center.y,
        r = radius,
    )
}

/// Affine matrix `[a, b, c, d, e, f]` placing a transformer arrow drawn along
/// +x at the middle of `start -> end`, rotated to follow that segment.
pub fn transformer_arrow_matrix(start: Point, end: Point) -> [f64; 6] {
    let theta = angle(start, end);
    let (sin, cos) = theta.sin_cos();
    let at = mid_position(start, end);
    [cos, sin, -sin, cos, at.x, at.y]
}

/// `transform` attribute value for an affine matrix.
pub fn svg_matrix(m: &[f64; 6]) -> String {
    format!(
        "matrix({:.2},{:.2},{:.2},{:.2},{:.2},{:.2})",
        m[0], m[1], m[2], m[3], m[4], m[5]
    )
}

/// Ends of the converter station symbol drawn between the two half-lines of
/// an HVDC link: `width` long, centred between `side1_end` and `side2_end`
/// and aligned with them.
pub fn converter_station_polyline(side1_end: Point, side2_end: Point, width: f64) -> [Point; 2] {
    let middle = mid_position(side1_end, side2_end);
    if side1_end == side2_end {
        return [middle, middle];
    }
    let theta = angle(side1_end, side2_end);
    [
        middle.shifted(theta, -width / 2.0),
        middle.shifted(theta, width / 2.0),
    ]
}
