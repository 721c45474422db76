//! Incremental geo-layout engine.
//!
//! [`GeoLayoutEngine`] owns the geographic data and every quantity derived
//! from it. Callers push changes (positions, parameters, flows, view) and then
//! ask for a layout pass; the pass re-runs only the stages whose inputs
//! changed since the previous one:
//!
//! | stage      | re-run on                                  |
//! |------------|--------------------------------------------|
//! | grouping   | network, parallel toggle                   |
//! | geometry   | network, positions, path mode, spacing     |
//! | placement  | any of the above, flow mode, flows         |
//! | visibility | any change, including zoom                 |
//!
//! A partial position update recomputes the geometry of the affected
//! clusters only. Derived geometry lives in a side table keyed by line id;
//! the network's own records are never touched.

use std::collections::{HashMap, HashSet};

use gridmap_core::{Diagnostics, Kilovolts, Line, Megawatts, Meters, NetworkIndex, Radians, Side};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{LayoutParams, ViewState};
use crate::error::Result;
use crate::flow::{line_arrows, ArrowDirection, LoadZone};
use crate::fork::{broadcast_cluster_minimum, end_angles, end_proximity_factors, substation_index};
use crate::geo_data::{GeoData, LinePosition, SubstationPosition};
use crate::geodesy::{meters_per_pixel, Coordinate};
use crate::grouping::{group_lines, Grouping, VoltageGroup};
use crate::placement::{label_display_position, LabelPosition, PlacementInput};
use crate::primitives::RenderPrimitive;

/// Fraction of the side 1 flow label; the side 2 label mirrors it.
const FLOW_LABEL_FRACTION: f64 = 0.1;
const STATUS_ICON_FRACTION: f64 = 0.5;

bitflags::bitflags! {
    /// Inputs changed since the last layout pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct DirtyFlags: u16 {
        const NETWORK     = 1 << 0;
        /// Bulk position replacement.
        const GEO         = 1 << 1;
        /// Incremental position update of some substations or lines.
        const GEO_PARTIAL = 1 << 2;
        const PATH_MODE   = 1 << 3;
        const PARALLEL    = 1 << 4;
        const SPACING     = 1 << 5;
        const FLOW_MODE   = 1 << 6;
        const FLOWS       = 1 << 7;
        const VIEW        = 1 << 8;
    }
}

impl DirtyFlags {
    const GROUPING: Self = Self::NETWORK.union(Self::PARALLEL);
    const GEOMETRY: Self = Self::NETWORK
        .union(Self::GEO)
        .union(Self::PATH_MODE)
        .union(Self::SPACING);
    const PLACEMENT: Self = Self::VIEW.complement();
}

/// Derived geometry of one line for the current pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineGeometry {
    pub line_id: String,
    pub nominal_v: Kilovolts,
    /// Side 1 and side 2 substations.
    pub substation_ids: [String; 2],
    /// Path from side 1 to side 2.
    pub positions: Vec<Coordinate>,
    pub cumulative_distances: Vec<f64>,
    /// Offset slot in this line's own side 1 to side 2 frame. A member running
    /// against its cluster carries the negated cluster slot, so two reversed
    /// siblings can both read -0.5 here; see [`ClusterMember::slot`] for the
    /// cluster-frame spread.
    ///
    /// [`ClusterMember::slot`]: crate::grouping::ClusterMember::slot
    pub parallel_index: f64,
    pub line_angle: Radians,
    /// Entry angle at side 1, exit angle at side 2.
    pub angles: [Radians; 2],
    pub proximity_factors: [f64; 2],
    pub substation_indices: [usize; 2],
    /// Both endpoints have a known position.
    pub drawable: bool,
}

impl LineGeometry {
    pub fn total_length(&self) -> Meters {
        Meters(self.cumulative_distances.last().copied().unwrap_or(0.0))
    }

    /// Placement input for an item at `fraction`, using the fork of the
    /// nearest end.
    pub fn placement_input(&self, fraction: f64, distance_between_lines: f64) -> PlacementInput<'_> {
        let (proximity_angle, proximity_factor) = if fraction <= 0.5 {
            (self.angles[0], self.proximity_factors[0])
        } else {
            (self.angles[1] + Radians::PI, self.proximity_factors[1])
        };
        PlacementInput {
            positions: &self.positions,
            cumulative_distances: &self.cumulative_distances,
            parallel_index: self.parallel_index,
            line_angle: self.line_angle,
            proximity_angle,
            distance_between_lines,
            proximity_factor,
        }
    }
}

/// Zoom-dependent sizes, resolved in the visibility stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderScale {
    pub meters_per_pixel: f64,
    pub parallel_offset_px: f64,
    pub substation_radius_px: f64,
    pub labels_visible: bool,
    pub arrows_visible: bool,
}

impl RenderScale {
    pub fn resolve(params: &LayoutParams, view: &ViewState) -> Self {
        let mpp = meters_per_pixel(view.zoom, view.center_latitude);
        let to_px = |meters: f64, min: f64, max: f64| {
            if mpp > 0.0 {
                (meters / mpp).clamp(min, max)
            } else {
                max
            }
        };
        Self {
            meters_per_pixel: mpp,
            parallel_offset_px: to_px(
                params.distance_between_lines,
                params.min_parallel_offset_px,
                params.max_parallel_offset_px,
            ),
            substation_radius_px: to_px(
                params.substation_radius,
                params.min_substation_radius_px,
                params.max_substation_radius_px,
            ),
            labels_visible: view.zoom >= params.label_zoom_threshold,
            arrows_visible: view.zoom >= params.arrow_zoom_threshold,
        }
    }
}

/// Lines of one voltage level, highest voltage first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupLayout {
    pub nominal_v: Kilovolts,
    pub lines: Vec<LineGeometry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutOutput {
    pub groups: Vec<GroupLayout>,
    pub primitives: Vec<RenderPrimitive>,
    pub render_scale: RenderScale,
    pub diagnostics: Diagnostics,
}

/// How many times each stage ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayoutStats {
    pub passes: usize,
    pub grouping_runs: usize,
    pub geometry_runs: usize,
    pub partial_geometry_runs: usize,
    pub lines_recomputed: usize,
    pub placement_runs: usize,
    pub visibility_runs: usize,
}

pub struct GeoLayoutEngine {
    params: LayoutParams,
    view: ViewState,
    geo: GeoData,
    dirty: DirtyFlags,
    touched_substations: HashSet<String>,
    touched_lines: HashSet<String>,
    grouping: Grouping,
    grouping_diagnostics: Diagnostics,
    geometry: HashMap<String, LineGeometry>,
    geometry_diagnostics: Diagnostics,
    output: LayoutOutput,
    stats: LayoutStats,
}

impl GeoLayoutEngine {
    /// Engine with validated parameters and the default view.
    pub fn new(params: LayoutParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::with_valid_params(params))
    }

    fn with_valid_params(params: LayoutParams) -> Self {
        let view = ViewState::default();
        let render_scale = RenderScale::resolve(&params, &view);
        Self {
            params,
            view,
            geo: GeoData::new(),
            dirty: DirtyFlags::all(),
            touched_substations: HashSet::new(),
            touched_lines: HashSet::new(),
            grouping: Grouping::default(),
            grouping_diagnostics: Diagnostics::new(),
            geometry: HashMap::new(),
            geometry_diagnostics: Diagnostics::new(),
            output: LayoutOutput {
                groups: Vec::new(),
                primitives: Vec::new(),
                render_scale,
                diagnostics: Diagnostics::new(),
            },
            stats: LayoutStats::default(),
        }
    }

    pub fn with_geo_data(mut self, geo: GeoData) -> Self {
        self.geo = geo;
        self.dirty |= DirtyFlags::GEO;
        self
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn geo_data(&self) -> &GeoData {
        &self.geo
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn stats(&self) -> LayoutStats {
        self.stats
    }

    pub fn line_geometry(&self, line_id: &str) -> Option<&LineGeometry> {
        self.geometry.get(line_id)
    }

    pub fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    /// Output of the last pass.
    pub fn output(&self) -> &LayoutOutput {
        &self.output
    }

    pub fn set_substation_positions(&mut self, positions: Vec<SubstationPosition>) {
        self.geo.set_substation_positions(positions);
        self.dirty |= DirtyFlags::GEO;
    }

    pub fn update_substation_positions(&mut self, requested: &[String], fetched: Vec<SubstationPosition>) {
        self.touched_substations.extend(requested.iter().cloned());
        self.touched_substations
            .extend(fetched.iter().map(|p| p.id.clone()));
        self.geo.update_substation_positions(requested, fetched);
        self.dirty |= DirtyFlags::GEO_PARTIAL;
    }

    pub fn set_line_positions(&mut self, positions: Vec<LinePosition>) {
        self.geo.set_line_positions(positions);
        self.dirty |= DirtyFlags::GEO;
    }

    pub fn update_line_positions(&mut self, requested: &[String], fetched: Vec<LinePosition>) {
        self.touched_lines.extend(requested.iter().cloned());
        self.touched_lines.extend(fetched.iter().map(|p| p.id.clone()));
        self.geo.update_line_positions(requested, fetched);
        self.dirty |= DirtyFlags::GEO_PARTIAL;
    }

    /// Equipment was added, removed or reconnected.
    pub fn network_changed(&mut self) {
        self.dirty |= DirtyFlags::NETWORK;
    }

    /// Flow values or operating statuses changed.
    pub fn flows_changed(&mut self) {
        self.dirty |= DirtyFlags::FLOWS;
    }

    /// Replace the layout parameters, marking only what differs as dirty.
    pub fn set_params(&mut self, params: LayoutParams) -> Result<()> {
        params.validate()?;
        let old = &self.params;
        let mut changed = DirtyFlags::empty();
        if old.distance_between_lines != params.distance_between_lines {
            changed |= DirtyFlags::SPACING;
        }
        if old.full_path != params.full_path {
            changed |= DirtyFlags::PATH_MODE;
        }
        if old.parallel_path != params.parallel_path {
            changed |= DirtyFlags::PARALLEL;
        }
        if old.line_flow_mode != params.line_flow_mode
            || old.arrow_spacing != params.arrow_spacing
            || old.label_offset_px != params.label_offset_px
        {
            changed |= DirtyFlags::FLOW_MODE;
        }
        if old.line_flow_alert_threshold != params.line_flow_alert_threshold {
            changed |= DirtyFlags::FLOWS;
        }
        if old.min_parallel_offset_px != params.min_parallel_offset_px
            || old.max_parallel_offset_px != params.max_parallel_offset_px
            || old.substation_radius != params.substation_radius
            || old.min_substation_radius_px != params.min_substation_radius_px
            || old.max_substation_radius_px != params.max_substation_radius_px
            || old.label_zoom_threshold != params.label_zoom_threshold
            || old.arrow_zoom_threshold != params.arrow_zoom_threshold
        {
            changed |= DirtyFlags::VIEW;
        }
        self.params = params;
        self.dirty |= changed;
        Ok(())
    }

    pub fn set_view(&mut self, view: ViewState) {
        if view != self.view {
            self.view = view;
            self.dirty |= DirtyFlags::VIEW;
        }
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.set_view(ViewState { zoom, ..self.view });
    }

    /// Run the stages made necessary by the changes since the last pass.
    pub fn layout<N: NetworkIndex>(&mut self, network: &N) -> Result<&LayoutOutput> {
        self.stats.passes += 1;
        let dirty = self.dirty;
        if dirty.is_empty() {
            return Ok(&self.output);
        }
        debug!(?dirty, "layout pass");

        let regrouped = dirty.intersects(DirtyFlags::GROUPING);
        if regrouped {
            self.run_grouping(network);
        }

        if dirty.intersects(DirtyFlags::GEOMETRY) {
            self.run_geometry(network);
        } else {
            if regrouped {
                self.sync_parallel_indices();
            }
            if dirty.contains(DirtyFlags::GEO_PARTIAL) {
                self.run_partial_geometry(network);
            }
        }

        if dirty.intersects(DirtyFlags::PLACEMENT) {
            self.run_placement(network)?;
        }

        self.output.render_scale = RenderScale::resolve(&self.params, &self.view);
        self.stats.visibility_runs += 1;

        self.dirty = DirtyFlags::empty();
        self.touched_substations.clear();
        self.touched_lines.clear();
        Ok(&self.output)
    }

    fn run_grouping<N: NetworkIndex>(&mut self, network: &N) {
        self.grouping_diagnostics.clear();
        self.grouping = group_lines(network, self.params.parallel_path, &mut self.grouping_diagnostics);
        self.stats.grouping_runs += 1;
    }

    fn sync_parallel_indices(&mut self) {
        for geometry in self.geometry.values_mut() {
            geometry.parallel_index = self.grouping.parallel_index(&geometry.line_id);
        }
    }

    fn run_geometry<N: NetworkIndex>(&mut self, network: &N) {
        self.geometry.clear();
        self.geometry_diagnostics.clear();
        let lines = network.lines();
        for line in &lines {
            self.recompute_line(network, line);
        }
        let clusters: Vec<usize> = (0..self.cluster_count()).collect();
        self.broadcast_proximity(&clusters);
        self.stats.geometry_runs += 1;
        self.stats.lines_recomputed += lines.len();
        info!(lines = self.geometry.len(), "line geometry computed");
    }

    fn run_partial_geometry<N: NetworkIndex>(&mut self, network: &N) {
        let mut affected: HashSet<String> = self.touched_lines.clone();
        for geometry in self.geometry.values() {
            if geometry
                .substation_ids
                .iter()
                .any(|s| self.touched_substations.contains(s))
            {
                affected.insert(geometry.line_id.clone());
            }
        }

        // whole clusters, so the shared proximity minimum stays consistent
        let mut clusters = Vec::new();
        for (position, cluster) in self.grouping.clusters().enumerate() {
            if cluster.line_ids().any(|id| affected.contains(id)) {
                clusters.push(position);
                affected.extend(cluster.line_ids().map(str::to_string));
            }
        }

        let mut recomputed = 0;
        for line in network.lines() {
            if affected.contains(&line.id) {
                self.recompute_line(network, line);
                recomputed += 1;
            }
        }
        self.broadcast_proximity(&clusters);
        self.stats.partial_geometry_runs += 1;
        self.stats.lines_recomputed += recomputed;
        debug!(lines = recomputed, clusters = clusters.len(), "partial geometry update");
    }

    fn cluster_count(&self) -> usize {
        self.grouping.clusters().count()
    }

    fn recompute_line<N: NetworkIndex>(&mut self, network: &N, line: &Line) {
        self.geometry_diagnostics.retain_unrelated(&line.id);
        match self.line_geometry_for(network, line) {
            Ok(geometry) => {
                if !geometry.drawable {
                    self.geometry_diagnostics.add_warning_with_entity(
                        "position",
                        "an endpoint substation has no known position",
                        &line.id,
                    );
                }
                self.geometry.insert(line.id.clone(), geometry);
            }
            Err(e) => {
                warn!(line = %line.id, error = %e, "line skipped");
                self.geometry_diagnostics
                    .add_error_with_entity("endpoint", &e.to_string(), &line.id);
                self.geometry.remove(&line.id);
            }
        }
    }

    fn line_geometry_for<N: NetworkIndex>(&self, network: &N, line: &Line) -> Result<LineGeometry> {
        let substation1 = GeoData::endpoint_substation(network, line, Side::One)?;
        let substation2 = GeoData::endpoint_substation(network, line, Side::Two)?;
        let positions = self.geo.line_positions(network, line, self.params.full_path)?;
        let drawable = !positions.iter().any(|p| p.is_unknown());
        let cumulative_distances = GeoData::line_distances(&positions).unwrap_or_default();

        let nominal = |side: Side| {
            network
                .voltage_level(line.voltage_level_id(side))
                .map(|vl| vl.nominal_v)
        };
        let nominal_v = self
            .grouping
            .group_of(&line.id)
            .map(|g| g.nominal_v)
            .or_else(|| nominal(Side::One))
            .unwrap_or_default();
        let rank = |substation_id: &str, side: Side| {
            match (network.substation(substation_id), nominal(side)) {
                (Some(substation), Some(kv)) => substation_index(substation, kv),
                _ => 1,
            }
        };

        let (line_angle, angles, proximity_factors) = match end_angles(&positions) {
            Some(a) if drawable => (
                a.line,
                [a.entry, a.exit],
                end_proximity_factors(&positions, self.params.distance_between_lines)
                    .unwrap_or([0.0, 0.0]),
            ),
            _ => (Radians::ZERO, [Radians::ZERO; 2], [0.0, 0.0]),
        };

        Ok(LineGeometry {
            line_id: line.id.clone(),
            nominal_v,
            substation_ids: [substation1.to_string(), substation2.to_string()],
            substation_indices: [rank(substation1, Side::One), rank(substation2, Side::Two)],
            positions,
            cumulative_distances,
            parallel_index: self.grouping.parallel_index(&line.id),
            line_angle,
            angles,
            proximity_factors,
            drawable,
        })
    }

    /// Share the minimum proximity factor of each listed cluster among its
    /// drawable members.
    fn broadcast_proximity(&mut self, clusters: &[usize]) {
        let wanted: HashSet<usize> = clusters.iter().copied().collect();
        let geometry = &mut self.geometry;
        for (position, cluster) in self.grouping.clusters().enumerate() {
            if !wanted.contains(&position) {
                continue;
            }
            let updates = broadcast_cluster_minimum(cluster, |id| {
                geometry
                    .get(id)
                    .filter(|g| g.drawable)
                    .map(|g| g.proximity_factors)
            });
            for (id, factors) in updates {
                if let Some(g) = geometry.get_mut(&id) {
                    g.proximity_factors = factors;
                }
            }
        }
    }

    fn run_placement<N: NetworkIndex>(&mut self, network: &N) -> Result<()> {
        let mut primitives = Vec::new();
        for line in network.lines() {
            let Some(geometry) = self.geometry.get(&line.id) else {
                continue;
            };
            if geometry.drawable {
                self.line_primitives(line, geometry, &mut primitives)?;
            }
        }

        self.output.groups = self
            .grouping
            .groups
            .iter()
            .map(|group| self.group_layout(group))
            .collect();
        self.output.primitives = primitives;
        let mut diagnostics = self.grouping_diagnostics.clone();
        diagnostics.merge(self.geometry_diagnostics.clone());
        self.output.diagnostics = diagnostics;
        self.stats.placement_runs += 1;
        debug!(primitives = self.output.primitives.len(), "placement done");
        Ok(())
    }

    fn group_layout(&self, group: &VoltageGroup) -> GroupLayout {
        GroupLayout {
            nominal_v: group.nominal_v,
            lines: group
                .line_ids
                .iter()
                .filter_map(|id| self.geometry.get(id).cloned())
                .collect(),
        }
    }

    fn line_primitives(
        &self,
        line: &Line,
        geometry: &LineGeometry,
        out: &mut Vec<RenderPrimitive>,
    ) -> Result<()> {
        let params = &self.params;
        let dbl = params.distance_between_lines;
        let load_zone = LoadZone::of_line(line, params.line_flow_alert_threshold);
        let n = geometry.positions.len();

        out.push(RenderPrimitive::ParallelPath {
            line_id: line.id.clone(),
            nominal_v: geometry.nominal_v,
            positions: geometry.positions.clone(),
            cumulative_distances: geometry.cumulative_distances.clone(),
            parallel_index: geometry.parallel_index,
            load_zone,
            connected: line.is_connected(Side::One) && line.is_connected(Side::Two),
        });
        for (i, side) in [Side::One, Side::Two].into_iter().enumerate() {
            let (substation_position, angle) = match side {
                Side::One => (geometry.positions[0], geometry.angles[0]),
                Side::Two => (geometry.positions[n - 1], geometry.angles[1] + Radians::PI),
            };
            out.push(RenderPrimitive::ForkLine {
                line_id: line.id.clone(),
                side,
                substation_position,
                angle,
                parallel_index: geometry.parallel_index,
                proximity_factor: geometry.proximity_factors[i],
                substation_index: geometry.substation_indices[i],
            });
        }

        let place = |fraction: f64, direction: ArrowDirection| -> Result<Option<LabelPosition>> {
            label_display_position(
                &geometry.placement_input(fraction, dbl),
                fraction,
                direction,
                params.label_offset_px,
            )
        };

        let arrows = line_arrows(
            line,
            params.line_flow_mode,
            geometry.total_length(),
            Meters(params.arrow_spacing),
        );
        for arrow in arrows {
            if let Some(placement) = place(arrow.fraction, arrow.direction)? {
                out.push(RenderPrimitive::Arrow {
                    line_id: line.id.clone(),
                    fraction: arrow.fraction,
                    direction: arrow.direction,
                    load_zone,
                    placement,
                });
            }
        }

        for (side, fraction) in [
            (Side::One, FLOW_LABEL_FRACTION),
            (Side::Two, 1.0 - FLOW_LABEL_FRACTION),
        ] {
            let Some(p) = line.p(side) else {
                continue;
            };
            let direction = ArrowDirection::at_side(line, side);
            if let Some(placement) = place(fraction, direction)? {
                out.push(RenderPrimitive::FlowLabel {
                    line_id: line.id.clone(),
                    side,
                    value: Megawatts(p.value().abs().round()),
                    placement,
                });
            }
        }

        if let Some(status) = line.operating_status.filter(|s| s.is_outage()) {
            if let Some(placement) = place(STATUS_ICON_FRACTION, ArrowDirection::None)? {
                out.push(RenderPrimitive::StatusIcon {
                    line_id: line.id.clone(),
                    status,
                    placement,
                });
            }
        }
        Ok(())
    }
}

impl Default for GeoLayoutEngine {
    fn default() -> Self {
        Self::with_valid_params(LayoutParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmap_core::{Network, Substation};

    fn network() -> Network {
        let mut network = Network::new();
        network
            .add_substation(Substation::new("S1").with_voltage_level("VL1", 400.0))
            .unwrap();
        network
            .add_substation(Substation::new("S2").with_voltage_level("VL2", 400.0))
            .unwrap();
        network
            .add_line(Line::new("L1", "VL1", "VL2").with_flows(120.0, -119.0))
            .unwrap();
        network
    }

    fn engine() -> GeoLayoutEngine {
        let mut engine = GeoLayoutEngine::default();
        engine.set_substation_positions(vec![
            SubstationPosition::new("S1", 5.0, 45.0),
            SubstationPosition::new("S2", 5.5, 45.2),
        ]);
        engine
    }

    #[test]
    fn new_rejects_invalid_params() {
        let params = LayoutParams {
            arrow_spacing: 0.0,
            ..LayoutParams::default()
        };
        assert!(matches!(
            GeoLayoutEngine::new(params),
            Err(crate::error::Error::Config(_))
        ));
        assert!(GeoLayoutEngine::new(LayoutParams::default()).is_ok());
    }

    #[test]
    fn reversed_sibling_reports_its_own_frame() {
        let mut network = network();
        network
            .add_line(Line::new("L2", "VL2", "VL1").with_flows(-50.0, 50.0))
            .unwrap();
        let mut engine = engine();
        engine.layout(&network).unwrap();

        let l1 = engine.line_geometry("L1").unwrap();
        let l2 = engine.line_geometry("L2").unwrap();
        assert_eq!(l1.parallel_index, -0.5);
        assert_eq!(l2.parallel_index, -0.5);
        assert_eq!(engine.grouping().member("L2").unwrap().slot, 0.5);
    }

    #[test]
    fn first_pass_runs_every_stage() {
        let network = network();
        let mut engine = engine();
        engine.layout(&network).unwrap();
        let stats = engine.stats();
        assert_eq!(stats.grouping_runs, 1);
        assert_eq!(stats.geometry_runs, 1);
        assert_eq!(stats.placement_runs, 1);
        assert_eq!(stats.visibility_runs, 1);
        assert!(engine.dirty().is_empty());
    }

    #[test]
    fn clean_pass_runs_nothing() {
        let network = network();
        let mut engine = engine();
        engine.layout(&network).unwrap();
        let before = engine.stats();
        engine.layout(&network).unwrap();
        let after = engine.stats();
        assert_eq!(after.passes, before.passes + 1);
        assert_eq!(after.visibility_runs, before.visibility_runs);
    }

    #[test]
    fn set_params_marks_only_differences() {
        let mut engine = GeoLayoutEngine::default();
        let network = network();
        engine.layout(&network).unwrap();

        let mut params = engine.params().clone();
        engine.set_params(params.clone()).unwrap();
        assert!(engine.dirty().is_empty());

        params.parallel_path = false;
        params.max_substation_radius_px = 8.0;
        engine.set_params(params.clone()).unwrap();
        assert_eq!(engine.dirty(), DirtyFlags::PARALLEL | DirtyFlags::VIEW);

        params.distance_between_lines = -1.0;
        assert!(engine.set_params(params).is_err());
    }

    #[test]
    fn render_scale_clamps_pixels() {
        let params = LayoutParams::default();
        let far = RenderScale::resolve(&params, &ViewState { zoom: 2.0, center_latitude: 46.0 });
        assert_eq!(far.parallel_offset_px, params.min_parallel_offset_px);
        assert_eq!(far.substation_radius_px, params.min_substation_radius_px);
        assert!(!far.labels_visible);
        assert!(!far.arrows_visible);

        let near = RenderScale::resolve(&params, &ViewState { zoom: 18.0, center_latitude: 46.0 });
        assert_eq!(near.parallel_offset_px, params.max_parallel_offset_px);
        assert_eq!(near.substation_radius_px, params.max_substation_radius_px);
        assert!(near.labels_visible && near.arrows_visible);
    }

    #[test]
    fn placement_input_uses_nearest_end() {
        let geometry = LineGeometry {
            line_id: "L".into(),
            nominal_v: Kilovolts(400.0),
            substation_ids: ["A".into(), "B".into()],
            positions: vec![Coordinate::new(5.0, 45.0), Coordinate::new(5.0, 45.1)],
            cumulative_distances: vec![0.0, 11_000.0],
            parallel_index: 0.5,
            line_angle: Radians::ZERO,
            angles: [Radians(0.1), Radians(0.2)],
            proximity_factors: [0.3, 0.6],
            substation_indices: [1, 1],
            drawable: true,
        };
        let near_start = geometry.placement_input(0.1, 1000.0);
        assert_eq!(near_start.proximity_angle, Radians(0.1));
        assert_eq!(near_start.proximity_factor, 0.3);
        let near_end = geometry.placement_input(0.9, 1000.0);
        assert_eq!(near_end.proximity_angle, Radians(0.2) + Radians::PI);
        assert_eq!(near_end.proximity_factor, 0.6);
        assert_eq!(geometry.total_length(), Meters(11_000.0));
    }
}
