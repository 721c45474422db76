//! Placement of labels, arrows and icons along a line.

use gridmap_core::{Degrees, Meters, Radians};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::flow::ArrowDirection;
use crate::geodesy::{destination, map_angle, planar_bearing, Coordinate};
use crate::segment::find_segment;

/// Derived geometry of one line needed to place something on it.
#[derive(Debug, Clone, Copy)]
pub struct PlacementInput<'a> {
    pub positions: &'a [Coordinate],
    pub cumulative_distances: &'a [f64],
    pub parallel_index: f64,
    /// Overall first-to-last bearing of the line.
    pub line_angle: Radians,
    /// Fork direction at the end nearest to the placed item.
    pub proximity_angle: Radians,
    pub distance_between_lines: f64,
    pub proximity_factor: f64,
}

/// Where to draw a label or icon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelPosition {
    pub world: Coordinate,
    /// Map bearing of the segment holding the point, used as rotation.
    pub bearing: Degrees,
    /// Screen offset in pixels, y pointing down.
    pub pixel_offset: [f64; 2],
}

/// Position of the point at `fraction` of the line length.
///
/// Returns `Ok(None)` for degenerate paths (fewer than two points or zero
/// length) and an error when `fraction` is outside `[0, 1]`.
pub fn label_display_position(
    input: &PlacementInput<'_>,
    fraction: f64,
    direction: ArrowDirection,
    label_offset_px: f64,
) -> Result<Option<LabelPosition>> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(Error::InvalidFraction(fraction));
    }
    let cumulative = input.cumulative_distances;
    let n = cumulative.len();
    if n < 2 || input.positions.len() != n {
        return Ok(None);
    }
    let total = cumulative[n - 1];
    if !(total > 0.0) {
        return Ok(None);
    }

    let dbl = input.distance_between_lines;
    let single_segment = n == 2;

    let mut wanted = total * fraction;
    if single_segment {
        // fork lines are not part of the percentage along the line
        wanted -= 2.0 * dbl * fraction * input.proximity_factor;
    }
    let wanted = wanted.clamp(0.0, total);

    let Some(segment) = find_segment(input.positions, cumulative, wanted) else {
        return Ok(None);
    };
    let segment_length = segment.length(cumulative).value();
    let remaining = segment.remaining.value() * direction.distance_multiplier();

    let on_line = destination(
        segment.start,
        Meters(remaining),
        planar_bearing(segment.start, segment.end),
    );
    let line_angle = input.line_angle.to_degrees();
    let mut world = destination(
        on_line,
        Meters(dbl * input.parallel_index),
        line_angle + Degrees(90.0),
    );

    if single_segment {
        world = destination(world, Meters(-dbl * input.proximity_factor), line_angle);
    } else if segment.index == 0 || segment.index == n - 2 {
        let t = if segment_length > 0.0 {
            (segment.remaining.value() / segment_length).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let progress = if segment.index == 0 { t } else { 1.0 - t };
        world = destination(
            world,
            Meters(dbl * input.proximity_factor * progress),
            input.proximity_angle.to_degrees(),
        );
    }

    let bearing = map_angle(segment.start, segment.end);
    Ok(Some(LabelPosition {
        world,
        bearing,
        pixel_offset: pixel_offset(bearing, direction, label_offset_px),
    }))
}

/// Screen offset of `distance_px` to the right of a segment with `bearing`
/// for side 1 to side 2 flows, to the left for the opposite direction.
pub fn pixel_offset(bearing: Degrees, direction: ArrowDirection, distance_px: f64) -> [f64; 2] {
    let r = (Degrees(90.0) - bearing).to_radians();
    let d = distance_px * direction.offset_sign();
    [d * r.sin(), d * r.cos()]
}
