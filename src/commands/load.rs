//! Load command implementation

use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;

use fxbridge_core::protocol::EP0_MAX_PACKET;

use crate::device::Bridge;

/// Run the load command: full configuration session, start to stop.
pub fn run_load(bridge: &Bridge, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bitstream = fs::read(path)?;
    println!("Loading {} bytes from {:?}", bitstream.len(), path);

    bridge.configure_start()?;

    let pb = ProgressBar::new(bitstream.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
            .progress_chars("#>-"),
    );

    for chunk in bitstream.chunks(EP0_MAX_PACKET) {
        bridge.configure_write(chunk)?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    bridge.configure_stop()?;
    println!("Configuration complete");

    Ok(())
}
