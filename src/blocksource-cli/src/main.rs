mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "blocksource=debug,blocksrc=debug"
    } else {
        "blocksource=warn,blocksrc=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Configure {
            layout,
            format,
            show,
        } => {
            commands::configure::handle(layout, format, show)?;
        }

        Commands::Blocks { layout, format } => {
            let config = Config::load()?;
            let layout = config.resolve_layout(layout)?;
            commands::query::blocks(&layout, config.resolve_format(format))?;
        }

        Commands::Locate {
            address,
            layout,
            format,
        } => {
            let config = Config::load()?;
            let layout = config.resolve_layout(layout)?;
            commands::query::locate(&layout, &address, config.resolve_format(format))?;
        }
    }

    Ok(())
}
