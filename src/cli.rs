//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fxbridge")]
#[command(author, version, about = "USB-to-FPGA acquisition bridge control", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load an FPGA bitstream onto the bridge
    Load {
        /// Bitstream file (raw binary, e.g. .rbf)
        bitstream: PathBuf,
    },
    /// Read the acquisition pipeline status byte
    Status,
    /// Stop the acquisition pipeline
    Stop,
    /// Pause or resume the acquisition pipeline
    Pause {
        /// Whether to pause or resume
        state: PauseState,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PauseState {
    /// Pause acquisition
    On,
    /// Resume acquisition
    Off,
}
