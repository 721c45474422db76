use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use gridmap_cli::input::{load_config, load_geo_data, load_network};
use gridmap_viz::GeoLayoutEngine;

use super::emit;

pub fn handle(
    network: &Path,
    geo: &Path,
    config: Option<&Path>,
    zoom: Option<f64>,
    primitives_only: bool,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let network = load_network(network)?;
    let geo_data = load_geo_data(geo)?;

    let mut engine = GeoLayoutEngine::new(config.layout)?.with_geo_data(geo_data);
    engine.set_view(config.view);
    if let Some(zoom) = zoom {
        engine.set_zoom(zoom);
    }

    let layout = engine.layout(&network)?;
    if layout.diagnostics.has_issues() {
        warn!("{}", layout.diagnostics.summary());
    }
    let payload = if primitives_only {
        serde_json::to_string_pretty(&layout.primitives)?
    } else {
        serde_json::to_string_pretty(layout)?
    };
    info!(
        groups = layout.groups.len(),
        primitives = layout.primitives.len(),
        "Layout computed for {} lines",
        network.line_count()
    );
    emit(&payload, output)
}
