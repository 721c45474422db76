pub mod config;
pub mod inspect;
pub mod layout;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Write `payload` to `output`, or print it when no path is given.
pub(crate) fn emit(payload: &str, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        fs::write(path, payload).with_context(|| format!("writing {}", path.display()))?;
        println!("Layout written to {}", path.display());
    } else {
        println!("{payload}");
    }
    Ok(())
}
