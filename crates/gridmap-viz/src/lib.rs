//! # gridmap-viz
//!
//! Geographic layout of an electrical network for map rendering.
//!
//! Given substation positions, optional detailed line paths and a
//! [`NetworkIndex`](gridmap_core::NetworkIndex), the engine computes
//! everything a map renderer needs to draw lines: parallel offsets for lines
//! sharing a pair of substations, fork geometry near substations, arc-length
//! tables and the placement of arrows, flow labels and status icons.
//!
//! ## Pipeline
//!
//! ```text
//! network + GeoData ──► grouping ──► fork / proximity ──► placement ──► RenderPrimitive
//!                       (voltage,     (angles, factors,    (labels,
//!                        pair,         substation rank)     arrows, icons)
//!                        index)
//! ```
//!
//! ## Core Components
//!
//! - [`GeoLayoutEngine`]: incremental engine owning positions and derived geometry
//! - [`GeoData`]: substation positions and detailed line paths
//! - [`group_lines`]: voltage groups and parallel index assignment
//! - [`label_display_position`]: point, rotation and pixel offset along a line
//! - [`RenderPrimitive`] / [`PrimitiveVisitor`]: renderer-facing output
//! - [`diagram`]: SVG geometry helpers for the schematic diagram
//!
//! ## Usage
//!
//! ```
//! use gridmap_core::{Line, Network, Substation};
//! use gridmap_viz::{GeoLayoutEngine, LayoutParams, SubstationPosition};
//!
//! let mut network = Network::new();
//! network
//!     .add_substation(Substation::new("S1").with_voltage_level("VL1", 400.0))
//!     .unwrap();
//! network
//!     .add_substation(Substation::new("S2").with_voltage_level("VL2", 400.0))
//!     .unwrap();
//! network.add_line(Line::new("L1", "VL1", "VL2")).unwrap();
//! network.add_line(Line::new("L2", "VL1", "VL2")).unwrap();
//!
//! let mut engine = GeoLayoutEngine::new(LayoutParams::default()).unwrap();
//! engine.set_substation_positions(vec![
//!     SubstationPosition::new("S1", 9.49322, 45.31267),
//!     SubstationPosition::new("S2", 9.15484, 45.18608),
//! ]);
//!
//! engine.layout(&network).unwrap();
//! assert_eq!(engine.line_geometry("L1").unwrap().parallel_index, -0.5);
//! assert_eq!(engine.line_geometry("L2").unwrap().parallel_index, 0.5);
//! ```

pub mod config;
pub mod diagram;
pub mod engine;
pub mod error;
pub mod flow;
pub mod fork;
pub mod geo_data;
pub mod geodesy;
pub mod grouping;
pub mod placement;
pub mod primitives;
pub mod segment;
pub mod selection;

// Re-exports for convenience
pub use config::{GridmapConfig, LayoutParams, LineFlowMode, ViewState};
pub use engine::{
    DirtyFlags, GeoLayoutEngine, GroupLayout, LayoutOutput, LayoutStats, LineGeometry, RenderScale,
};
pub use error::{Error, Result};
pub use flow::{ArrowDirection, LoadZone};
pub use geo_data::{GeoData, GeoDataSet, LinePosition, SubstationPosition};
pub use geodesy::Coordinate;
pub use grouping::{group_lines, Grouping};
pub use placement::{label_display_position, LabelPosition, PlacementInput};
pub use primitives::{PrimitiveCounts, PrimitiveVisitor, RenderPrimitive};
pub use segment::{find_segment, Segment};
pub use selection::{select_in_polygon, Selection, SelectionHandle};
