//! Render primitives produced by a layout pass.
//!
//! Every geometry kind the renderer draws is one variant of
//! [`RenderPrimitive`]. Renderers implement [`PrimitiveVisitor`] and get a
//! single dispatch point per primitive; the layout engine never depends on a
//! concrete backend.

use gridmap_core::{Kilovolts, Megawatts, OperatingStatus, Radians, Side};
use serde::Serialize;

use crate::flow::{ArrowDirection, LoadZone};
use crate::geodesy::Coordinate;
use crate::placement::LabelPosition;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderPrimitive {
    /// The main polyline of a line, offset laterally by its parallel index.
    ParallelPath {
        line_id: String,
        nominal_v: Kilovolts,
        positions: Vec<Coordinate>,
        cumulative_distances: Vec<f64>,
        parallel_index: f64,
        load_zone: LoadZone,
        /// Both terminals connected.
        connected: bool,
    },
    /// Short segment between a substation marker and the line's offset start.
    ForkLine {
        line_id: String,
        side: Side,
        substation_position: Coordinate,
        /// Direction the line leaves the substation in.
        angle: Radians,
        parallel_index: f64,
        proximity_factor: f64,
        substation_index: usize,
    },
    Arrow {
        line_id: String,
        fraction: f64,
        direction: ArrowDirection,
        load_zone: LoadZone,
        placement: LabelPosition,
    },
    FlowLabel {
        line_id: String,
        side: Side,
        /// Absolute active power at that side.
        value: Megawatts,
        placement: LabelPosition,
    },
    StatusIcon {
        line_id: String,
        status: OperatingStatus,
        placement: LabelPosition,
    },
}

impl RenderPrimitive {
    pub fn line_id(&self) -> &str {
        match self {
            RenderPrimitive::ParallelPath { line_id, .. }
            | RenderPrimitive::ForkLine { line_id, .. }
            | RenderPrimitive::Arrow { line_id, .. }
            | RenderPrimitive::FlowLabel { line_id, .. }
            | RenderPrimitive::StatusIcon { line_id, .. } => line_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RenderPrimitive::ParallelPath { .. } => "parallel_path",
            RenderPrimitive::ForkLine { .. } => "fork_line",
            RenderPrimitive::Arrow { .. } => "arrow",
            RenderPrimitive::FlowLabel { .. } => "flow_label",
            RenderPrimitive::StatusIcon { .. } => "status_icon",
        }
    }

    /// Hand this primitive to the matching visitor method.
    pub fn accept<V: PrimitiveVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            RenderPrimitive::ParallelPath {
                line_id,
                positions,
                parallel_index,
                load_zone,
                ..
            } => visitor.parallel_path(line_id, positions, *parallel_index, *load_zone),
            RenderPrimitive::ForkLine {
                line_id,
                side,
                substation_position,
                angle,
                parallel_index,
                proximity_factor,
                substation_index,
            } => visitor.fork_line(
                line_id,
                *side,
                *substation_position,
                *angle,
                *parallel_index,
                *proximity_factor,
                *substation_index,
            ),
            RenderPrimitive::Arrow {
                line_id,
                direction,
                load_zone,
                placement,
                ..
            } => visitor.arrow(line_id, *direction, *load_zone, placement),
            RenderPrimitive::FlowLabel {
                line_id,
                side,
                value,
                placement,
            } => visitor.flow_label(line_id, *side, *value, placement),
            RenderPrimitive::StatusIcon {
                line_id,
                status,
                placement,
            } => visitor.status_icon(line_id, *status, placement),
        }
    }
}

/// Renderer side of the primitive dispatch. Every method defaults to a no-op
/// so a backend only implements what it draws.
#[allow(unused_variables)]
pub trait PrimitiveVisitor {
    fn parallel_path(
        &mut self,
        line_id: &str,
        positions: &[Coordinate],
        parallel_index: f64,
        load_zone: LoadZone,
    ) {
    }

    #[allow(clippy::too_many_arguments)]
    fn fork_line(
        &mut self,
        line_id: &str,
        side: Side,
        substation_position: Coordinate,
        angle: Radians,
        parallel_index: f64,
        proximity_factor: f64,
        substation_index: usize,
    ) {
    }

    fn arrow(
        &mut self,
        line_id: &str,
        direction: ArrowDirection,
        load_zone: LoadZone,
        placement: &LabelPosition,
    ) {
    }

    fn flow_label(&mut self, line_id: &str, side: Side, value: Megawatts, placement: &LabelPosition) {}

    fn status_icon(&mut self, line_id: &str, status: OperatingStatus, placement: &LabelPosition) {}
}

/// Visit every primitive in order.
pub fn dispatch<'a, V, I>(primitives: I, visitor: &mut V)
where
    V: PrimitiveVisitor + ?Sized,
    I: IntoIterator<Item = &'a RenderPrimitive>,
{
    for primitive in primitives {
        primitive.accept(visitor);
    }
}

/// Counts primitives per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrimitiveCounts {
    pub parallel_paths: usize,
    pub fork_lines: usize,
    pub arrows: usize,
    pub flow_labels: usize,
    pub status_icons: usize,
}

impl PrimitiveCounts {
    pub fn total(&self) -> usize {
        self.parallel_paths + self.fork_lines + self.arrows + self.flow_labels + self.status_icons
    }
}

impl PrimitiveVisitor for PrimitiveCounts {
    fn parallel_path(&mut self, _: &str, _: &[Coordinate], _: f64, _: LoadZone) {
        self.parallel_paths += 1;
    }

    fn fork_line(&mut self, _: &str, _: Side, _: Coordinate, _: Radians, _: f64, _: f64, _: usize) {
        self.fork_lines += 1;
    }

    fn arrow(&mut self, _: &str, _: ArrowDirection, _: LoadZone, _: &LabelPosition) {
        self.arrows += 1;
    }

    fn flow_label(&mut self, _: &str, _: Side, _: Megawatts, _: &LabelPosition) {
        self.flow_labels += 1;
    }

    fn status_icon(&mut self, _: &str, _: OperatingStatus, _: &LabelPosition) {
        self.status_icons += 1;
    }
}
