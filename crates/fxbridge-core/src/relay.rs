//! Runtime command relay over the parallel bus
//!
//! Minimal request/response protocol toward the configured FPGA. A write is
//! two-phase: drive zero and pulse the clear strobe, then drive the command
//! byte and pulse the latch strobe. The receiving latch depends on this
//! ordering.

use crate::hal::{BusStrobe, Hal};

/// Bus code for "resume acquisition" (Pause with a zero argument)
const CODE_RUN: u8 = 0;
/// Bus code for Stop
const CODE_STOP: u8 = 1;
/// Bus code for Pause
const CODE_PAUSE: u8 = 2;

/// Two-phase write of one command byte.
pub fn send<H: Hal>(hal: &mut H, byte: u8) {
    hal.bus_write(0, BusStrobe::Clear);
    hal.bus_write(byte, BusStrobe::Latch);
}

/// Read one byte back from the pipeline.
pub fn recv<H: Hal>(hal: &mut H) -> u8 {
    hal.bus_read()
}

/// Relay Stop.
pub fn stop<H: Hal>(hal: &mut H) {
    send(hal, CODE_STOP);
}

/// Relay Pause; a nonzero argument pauses, zero resumes.
pub fn pause<H: Hal>(hal: &mut H, arg: u8) {
    send(hal, if arg != 0 { CODE_PAUSE } else { CODE_RUN });
}

/// Read the pipeline status byte.
pub fn status<H: Hal>(hal: &mut H) -> u8 {
    recv(hal)
}
