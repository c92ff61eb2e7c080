//! Runtime pipeline commands: status, stop, pause

use crate::cli::PauseState;
use crate::device::Bridge;
use crate::error::Result;

/// Read and print the pipeline status byte.
pub fn run_status(bridge: &Bridge) -> Result<()> {
    let status = bridge.status()?;
    println!("Pipeline status: 0x{:02X}", status);
    Ok(())
}

/// Stop the acquisition pipeline.
pub fn run_stop(bridge: &Bridge) -> Result<()> {
    bridge.stop()?;
    println!("Pipeline stopped");
    Ok(())
}

/// Pause or resume the acquisition pipeline.
pub fn run_pause(bridge: &Bridge, state: PauseState) -> Result<()> {
    match state {
        PauseState::On => {
            bridge.pause(true)?;
            println!("Pipeline paused");
        }
        PauseState::Off => {
            bridge.pause(false)?;
            println!("Pipeline resumed");
        }
    }
    Ok(())
}
