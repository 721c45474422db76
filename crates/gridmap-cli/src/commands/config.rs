use std::path::Path;

use anyhow::Result;

use gridmap_cli::input::load_config;

pub fn handle(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}
