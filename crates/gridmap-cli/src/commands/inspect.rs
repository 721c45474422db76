//! Single-line inspection: raw positions next to the derived geometry.

use std::path::Path;

use anyhow::{bail, Result};
use serde::Serialize;

use gridmap_cli::input::{load_config, load_geo_data, load_network};
use gridmap_core::DiagnosticIssue;
use gridmap_viz::{GeoLayoutEngine, LineGeometry, RenderPrimitive};

#[derive(Serialize)]
struct LineReport<'a> {
    geometry: &'a LineGeometry,
    total_length_m: f64,
    cluster: Option<String>,
    primitives: Vec<&'a RenderPrimitive>,
    diagnostics: Vec<&'a DiagnosticIssue>,
}

pub fn handle(network: &Path, geo: &Path, line_id: &str, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let network = load_network(network)?;
    let geo_data = load_geo_data(geo)?;

    if network.line(line_id).is_none() {
        bail!("Line '{line_id}' not found in network");
    }

    let mut engine = GeoLayoutEngine::new(config.layout)?.with_geo_data(geo_data);
    engine.set_view(config.view);
    engine.layout(&network)?;

    let diagnostics = &engine.output().diagnostics;
    let Some(geometry) = engine.line_geometry(line_id) else {
        let reasons: Vec<String> = diagnostics
            .for_entity(line_id)
            .map(|issue| issue.to_string())
            .collect();
        bail!("Line '{line_id}' was skipped by the layout: {}", reasons.join("; "));
    };
    let report = LineReport {
        geometry,
        total_length_m: geometry.total_length().value(),
        cluster: engine
            .grouping()
            .cluster_of(line_id)
            .map(|cluster| cluster.key.to_string()),
        primitives: engine
            .output()
            .primitives
            .iter()
            .filter(|primitive| primitive.line_id() == line_id)
            .collect(),
        diagnostics: diagnostics.for_entity(line_id).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
