//! Loading of network, geo data and configuration files.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use gridmap_core::Network;
use gridmap_viz::{GeoData, GeoDataSet, GridmapConfig};

pub fn load_network(path: &Path) -> Result<Network> {
    if !path.exists() {
        bail!("Network file '{}' does not exist", path.display());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading network file {}", path.display()))?;
    Network::from_json(&text).with_context(|| format!("parsing network file {}", path.display()))
}

pub fn load_geo_data(path: &Path) -> Result<GeoData> {
    if !path.exists() {
        bail!("Geo data file '{}' does not exist", path.display());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading geo data file {}", path.display()))?;
    let set: GeoDataSet = serde_json::from_str(&text)
        .with_context(|| format!("parsing geo data file {}", path.display()))?;
    Ok(GeoData::from_set(set))
}

/// Configuration from `path`, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<GridmapConfig> {
    match path {
        Some(path) => GridmapConfig::load_from(path)
            .with_context(|| format!("loading configuration {}", path.display())),
        None => Ok(GridmapConfig::default()),
    }
}
