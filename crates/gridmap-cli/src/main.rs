use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use gridmap_cli::cli::{Cli, Commands};

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {e}");
    }

    let result = match &cli.command {
        Some(Commands::Layout {
            network,
            geo,
            config,
            zoom,
            primitives_only,
            output,
        }) => {
            info!("Laying out {} with {}", network.display(), geo.display());
            commands::layout::handle(
                network,
                geo,
                config.as_deref(),
                *zoom,
                *primitives_only,
                output.as_deref(),
            )
        }
        Some(Commands::Inspect {
            network,
            geo,
            line_id,
            config,
        }) => commands::inspect::handle(network, geo, line_id, config.as_deref()),
        Some(Commands::Config { config }) => commands::config::handle(config.as_deref()),
        None => {
            info!("No subcommand given, try --help");
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("Command failed: {:?}", e);
        std::process::exit(1);
    }
}
