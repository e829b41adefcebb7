//! Sports player tracking command-line entry point.

use anyhow::Result;
use clap::Parser;
use log::info;
use sports_player_tracking::app::{self, Cli};

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logger
    if cli.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Sports Player Tracking");

    app::run(cli)?;

    Ok(())
}
