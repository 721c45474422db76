use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a layout pass and print the layout as JSON
    Layout {
        /// Network file (JSON, `{"substations": [...], "lines": [...]}`)
        #[arg(value_hint = ValueHint::FilePath)]
        network: PathBuf,
        /// Geo data file (JSON, `{"substations": [...], "lines": [...]}`)
        #[arg(value_hint = ValueHint::FilePath)]
        geo: PathBuf,
        /// TOML configuration file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
        /// Override the view zoom level
        #[arg(long)]
        zoom: Option<f64>,
        /// Emit render primitives only
        #[arg(long)]
        primitives_only: bool,
        /// Write output to a file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    /// Print the positions, distances and derived geometry of one line
    Inspect {
        #[arg(value_hint = ValueHint::FilePath)]
        network: PathBuf,
        #[arg(value_hint = ValueHint::FilePath)]
        geo: PathBuf,
        /// Line identifier
        line_id: String,
        /// TOML configuration file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config {
        /// TOML configuration file (defaults are printed when omitted)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
    },
}
