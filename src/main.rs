//! fxbridge - Host-side control for the USB-to-FPGA acquisition bridge
//!
//! Loads FPGA bitstreams over the bridge's vendor control protocol and
//! relays runtime commands (stop, pause, status) to the acquisition
//! pipeline behind it.

mod cli;
mod commands;
mod device;
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use device::Bridge;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let bridge = Bridge::open()?;

    match cli.command {
        Commands::Load { bitstream } => commands::run_load(&bridge, &bitstream)?,
        Commands::Status => commands::run_status(&bridge)?,
        Commands::Stop => commands::run_stop(&bridge)?,
        Commands::Pause { state } => commands::run_pause(&bridge, state)?,
    }

    Ok(())
}
