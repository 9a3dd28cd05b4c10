//! VPforce Rhino Driver CLI
//!
//! A command-line interface for querying and exercising the Rhino's
//! force-feedback engine.

use anyhow::Result;
use clap::Parser;
use tracing::info;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

use rhino_driver::DriverConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(DriverConfig::default_path);
    let mut config = DriverConfig::load(&config_path)?;
    cli.apply(&mut config);

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    info!("Using config {:?}", config_path);

    match cli.command {
        None | Some(Commands::Info) => commands::query::info(&config)?,
        Some(Commands::List { json }) => commands::query::list(&config, json)?,
        Some(Commands::Gains) => commands::query::gains(&config)?,
        Some(Commands::SetGain { slider, percent }) => {
            commands::set::set_gain(&config, slider, percent)?
        }
        Some(Commands::Reset) => commands::set::reset(&config)?,
        Some(Commands::StopAll) => commands::set::stop_all(&config)?,
        Some(Commands::Monitor) => commands::monitor::monitor(&config).await?,
        Some(Commands::TestEffect {
            kind,
            strength,
            seconds,
        }) => commands::effect::test_effect(&config, kind, strength, seconds)?,
    }

    Ok(())
}
