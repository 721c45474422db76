use std::collections::HashMap;

use gridmap_core::{Line, Network, NetworkIndex, OperatingStatus, Substation, VoltageLevel};
use gridmap_viz::geodesy::{map_angle, projected_angle};
use gridmap_viz::segment::line_distances;
use gridmap_viz::{
    find_segment, Coordinate, GeoData, GeoLayoutEngine, LayoutParams, LinePosition,
    LineFlowMode, PrimitiveCounts, RenderPrimitive, SubstationPosition, ViewState,
};

const SUB1: Coordinate = Coordinate::new(9.49322, 45.31267);
const SUB2: Coordinate = Coordinate::new(9.15484, 45.18608);
const MIDDLE: Coordinate = Coordinate::new(9.35453, 45.249375);

/// VL2_3 in SUB2, VL1_1 in SUB1, plus a second pair S3/S4 far away.
fn network() -> Network {
    let mut network = Network::new();
    network
        .add_substation(Substation::new("SUB1").with_voltage_level("VL1_1", 400.0))
        .unwrap();
    network
        .add_substation(Substation::new("SUB2").with_voltage_level("VL2_3", 400.0))
        .unwrap();
    network
        .add_substation(Substation::new("S3").with_voltage_level("VL3", 225.0))
        .unwrap();
    network
        .add_substation(Substation::new("S4").with_voltage_level("VL4", 225.0))
        .unwrap();
    network
        .add_line(Line::new("L1", "VL2_3", "VL1_1").with_flows(250.0, -248.0))
        .unwrap();
    network
        .add_line(Line::new("L2", "VL2_3", "VL1_1").with_flows(-40.0, 40.5))
        .unwrap();
    network
        .add_line(
            Line::new("L3", "VL3", "VL4")
                .with_flows(10.0, -10.0)
                .with_status(OperatingStatus::PlannedOutage),
        )
        .unwrap();
    network
}

fn positions() -> Vec<SubstationPosition> {
    vec![
        SubstationPosition::new("SUB1", SUB1.lon, SUB1.lat),
        SubstationPosition::new("SUB2", SUB2.lon, SUB2.lat),
        SubstationPosition::new("S3", 2.35, 48.85),
        SubstationPosition::new("S4", 2.60, 48.70),
    ]
}

fn engine() -> GeoLayoutEngine {
    let mut engine = GeoLayoutEngine::new(LayoutParams::default()).unwrap();
    engine.set_substation_positions(positions());
    engine.set_line_positions(vec![LinePosition::new(
        "L1",
        vec![SUB2.to_array(), MIDDLE.to_array(), SUB1.to_array()],
    )]);
    engine
}

#[test]
fn detailed_path_distances_and_segment_search() {
    let path = [SUB2, MIDDLE, SUB1];
    let d = line_distances(&path).unwrap();
    assert_eq!(d.len(), 3);
    assert_eq!(d[0], 0.0);
    assert!(d[0] < d[1] && d[1] < d[2]);

    let wanted = d[2] * 0.6;
    let segment = find_segment(&path, &d, wanted).unwrap();
    let expected = if wanted <= d[1] { 0 } else { 1 };
    assert_eq!(segment.index, expected);
    assert!(segment.remaining.value() >= 0.0);
    assert!(segment.remaining.value() <= d[segment.index + 1] - d[segment.index]);
}

#[test]
fn substation_position_round_trip() {
    let mut geo = GeoData::new();
    geo.set_substation_positions(vec![SubstationPosition::new("S1", 9.49, 45.31)]);
    assert_eq!(geo.substation_position("S1").to_array(), [9.49, 45.31]);
    assert_eq!(geo.substation_position("nowhere").to_array(), [0.0, 0.0]);
}

#[test]
fn unpositioned_endpoint_ignores_detailed_path() {
    let network = network();
    let mut geo = GeoData::new();
    geo.set_substation_positions(vec![SubstationPosition::new("SUB2", SUB2.lon, SUB2.lat)]);
    geo.set_line_positions(vec![LinePosition::new(
        "L1",
        vec![SUB2.to_array(), MIDDLE.to_array(), SUB1.to_array()],
    )]);
    let line = network.line("L1").unwrap();
    let positions = geo.line_positions(&network, line, true).unwrap();
    assert_eq!(positions, vec![Coordinate::UNKNOWN, Coordinate::UNKNOWN]);
}

#[test]
fn lines_sharing_substations_fan_out() {
    let network = network();
    let mut engine = engine();
    engine.layout(&network).unwrap();
    assert_eq!(engine.line_geometry("L1").unwrap().parallel_index, -0.5);
    assert_eq!(engine.line_geometry("L2").unwrap().parallel_index, 0.5);
    assert_eq!(engine.line_geometry("L3").unwrap().parallel_index, 0.0);

    let groups: Vec<f64> = engine
        .output()
        .groups
        .iter()
        .map(|g| g.nominal_v.value())
        .collect();
    assert_eq!(groups, vec![400.0, 225.0]);
}

#[test]
fn cluster_shares_its_smallest_proximity_factor() {
    let network = network();
    let mut engine = engine();
    // L2 leaves SUB2 through a very short first segment
    let near_sub2 = Coordinate::new(SUB2.lon + 0.002, SUB2.lat);
    engine.set_line_positions(vec![
        LinePosition::new("L1", vec![SUB2.to_array(), MIDDLE.to_array(), SUB1.to_array()]),
        LinePosition::new("L2", vec![SUB2.to_array(), near_sub2.to_array(), SUB1.to_array()]),
    ]);
    engine.layout(&network).unwrap();

    let l1 = engine.line_geometry("L1").unwrap();
    let l2 = engine.line_geometry("L2").unwrap();
    assert!(l2.proximity_factors[0] < 1.0);
    assert_eq!(l1.proximity_factors, l2.proximity_factors);
    assert_eq!(l1.proximity_factors[1], 1.0);
}

#[test]
fn zoom_change_only_reruns_visibility() {
    let network = network();
    let mut engine = engine();
    engine.layout(&network).unwrap();
    let before = engine.stats();
    let primitives = engine.output().primitives.clone();
    assert!(!engine.output().render_scale.labels_visible);

    engine.set_view(ViewState {
        zoom: 12.0,
        center_latitude: 45.3,
    });
    engine.layout(&network).unwrap();
    let after = engine.stats();
    assert_eq!(after.grouping_runs, before.grouping_runs);
    assert_eq!(after.geometry_runs, before.geometry_runs);
    assert_eq!(after.partial_geometry_runs, before.partial_geometry_runs);
    assert_eq!(after.placement_runs, before.placement_runs);
    assert_eq!(after.visibility_runs, before.visibility_runs + 1);
    assert!(engine.output().render_scale.labels_visible);
    assert_eq!(engine.output().primitives, primitives);
}

#[test]
fn partial_update_recomputes_affected_cluster_only() {
    let network = network();
    let mut engine = engine();
    engine.layout(&network).unwrap();
    let before = engine.stats();

    engine.update_substation_positions(
        &["S4".to_string()],
        vec![SubstationPosition::new("S4", 2.70, 48.60)],
    );
    engine.layout(&network).unwrap();
    let after = engine.stats();
    assert_eq!(after.geometry_runs, before.geometry_runs);
    assert_eq!(after.partial_geometry_runs, before.partial_geometry_runs + 1);
    assert_eq!(after.lines_recomputed, before.lines_recomputed + 1);
    assert_eq!(
        engine.line_geometry("L3").unwrap().positions[1],
        Coordinate::new(2.70, 48.60)
    );
}

#[test]
fn line_path_update_recomputes_its_cluster() {
    let network = network();
    let mut engine = engine();
    engine.layout(&network).unwrap();
    let before = engine.stats();

    // stored path starting a hair off SUB2: kept as is, no extra vertex
    let start = Coordinate::new(SUB2.lon + 1e-6, SUB2.lat);
    engine.update_line_positions(
        &["L1".to_string()],
        vec![LinePosition::new(
            "L1",
            vec![start.to_array(), MIDDLE.to_array(), SUB1.to_array()],
        )],
    );
    engine.layout(&network).unwrap();
    let after = engine.stats();
    assert_eq!(after.geometry_runs, before.geometry_runs);
    assert_eq!(after.partial_geometry_runs, before.partial_geometry_runs + 1);
    // L1 and its parallel sibling L2
    assert_eq!(after.lines_recomputed, before.lines_recomputed + 2);

    let l1 = engine.line_geometry("L1").unwrap();
    assert_eq!(l1.positions, vec![start, MIDDLE, SUB1]);
    let l2 = engine.line_geometry("L2").unwrap();
    assert!(l2.proximity_factors.iter().all(|f| (f - 1.0).abs() < 1e-9));
}

#[test]
fn forgetting_a_position_makes_lines_undrawable() {
    let network = network();
    let mut engine = engine();
    engine.layout(&network).unwrap();

    // requested but not returned: the server can no longer place S3
    engine.update_substation_positions(&["S3".to_string()], Vec::new());
    let output = engine.layout(&network).unwrap();
    assert!(output.primitives.iter().all(|p| p.line_id() != "L3"));
    assert!(!engine.line_geometry("L3").unwrap().drawable);
    assert_eq!(engine.output().diagnostics.warning_count(), 1);
}

#[test]
fn disabling_parallel_paths_skips_geometry() {
    let network = network();
    let mut engine = engine();
    engine.layout(&network).unwrap();
    let before = engine.stats();

    let params = LayoutParams {
        parallel_path: false,
        ..engine.params().clone()
    };
    engine.set_params(params).unwrap();
    engine.layout(&network).unwrap();
    let after = engine.stats();
    assert_eq!(after.grouping_runs, before.grouping_runs + 1);
    assert_eq!(after.geometry_runs, before.geometry_runs);
    assert_eq!(engine.line_geometry("L1").unwrap().parallel_index, 0.0);
    assert_eq!(engine.line_geometry("L2").unwrap().parallel_index, 0.0);
}

#[test]
fn flow_change_reruns_placement_only() {
    let mut network = network();
    let mut engine = engine();
    engine.layout(&network).unwrap();
    let before = engine.stats();

    network.line_mut("L3").unwrap().operating_status = None;
    engine.flows_changed();
    let output = engine.layout(&network).unwrap();
    assert!(output
        .primitives
        .iter()
        .all(|p| !matches!(p, RenderPrimitive::StatusIcon { .. })));
    let after = engine.stats();
    assert_eq!(after.geometry_runs, before.geometry_runs);
    assert_eq!(after.placement_runs, before.placement_runs + 1);
}

#[test]
fn feeder_primitives() {
    let network = network();
    let mut engine = engine();
    let output = engine.layout(&network).unwrap();

    let mut counts = PrimitiveCounts::default();
    gridmap_viz::primitives::dispatch(&output.primitives, &mut counts);
    assert_eq!(counts.parallel_paths, 3);
    assert_eq!(counts.fork_lines, 6);
    assert_eq!(counts.arrows, 6);
    assert_eq!(counts.flow_labels, 6);
    assert_eq!(counts.status_icons, 1);

    let l1_label = output
        .primitives
        .iter()
        .find_map(|p| match p {
            RenderPrimitive::FlowLabel { line_id, value, .. } if line_id == "L1" => Some(*value),
            _ => None,
        })
        .unwrap();
    assert_eq!(l1_label.value(), 250.0);
}

#[test]
fn animated_arrows_follow_spacing() {
    let network = network();
    let mut engine = engine();
    let params = LayoutParams {
        line_flow_mode: LineFlowMode::AnimatedArrows,
        arrow_spacing: 5_000.0,
        ..LayoutParams::default()
    };
    engine.set_params(params).unwrap();
    engine.layout(&network).unwrap();

    let length = engine.line_geometry("L2").unwrap().total_length().value();
    let expected = (length / 5_000.0).ceil() as usize;
    assert!(expected > 1);
    let arrows = engine
        .output()
        .primitives
        .iter()
        .filter(|p| matches!(p, RenderPrimitive::Arrow { line_id, .. } if line_id == "L2"))
        .count();
    assert_eq!(arrows, expected);
}

#[test]
fn label_rotation_matches_projected_rendering() {
    for (from, to) in [(SUB2, SUB1), (SUB1, SUB2), (SUB2, MIDDLE)] {
        let cpu = map_angle(from, to).value();
        let gpu = projected_angle(from, to).value();
        assert!((cpu - gpu).abs() < 0.5, "{cpu} vs {gpu}");
    }
}

/// Lookup collaborator with holes, as a partially loaded network would be.
#[derive(Default)]
struct PartialIndex {
    voltage_levels: HashMap<String, VoltageLevel>,
    substations: HashMap<String, Substation>,
    lines: Vec<Line>,
}

impl NetworkIndex for PartialIndex {
    fn voltage_level(&self, id: &str) -> Option<&VoltageLevel> {
        self.voltage_levels.get(id)
    }

    fn substation(&self, id: &str) -> Option<&Substation> {
        self.substations.get(id)
    }

    fn lines(&self) -> Vec<&Line> {
        self.lines.iter().collect()
    }
}

#[test]
fn missing_equipment_skips_the_line_only() {
    let mut index = PartialIndex::default();
    for (s, vl) in [("SUB1", "VL1_1"), ("SUB2", "VL2_3")] {
        let substation = Substation::new(s).with_voltage_level(vl, 400.0);
        index
            .voltage_levels
            .insert(vl.to_string(), substation.voltage_levels[0].clone());
        index.substations.insert(s.to_string(), substation);
    }
    index.lines.push(Line::new("GOOD", "VL2_3", "VL1_1"));
    index.lines.push(Line::new("HALF", "VL2_3", "VL_MISSING"));
    index.lines.push(Line::new("NONE", "VL_X", "VL_Y"));

    let mut engine = engine();
    let output = engine.layout(&index).unwrap();
    assert!(output.primitives.iter().any(|p| p.line_id() == "GOOD"));
    assert!(output.primitives.iter().all(|p| p.line_id() != "HALF"));
    assert!(engine.line_geometry("HALF").is_none());
    assert!(engine.line_geometry("NONE").is_none());

    let skipped: Vec<&str> = engine.output().diagnostics.skipped_entities().collect();
    assert!(skipped.contains(&"HALF"));
    assert!(skipped.contains(&"NONE"));
    assert!(engine.grouping().contains("HALF"));
    assert!(!engine.grouping().contains("NONE"));
}
