//! fxbridge-core - Firmware logic for a USB-to-FPGA acquisition bridge
//!
//! This crate contains the hardware-independent half of the bridge firmware:
//! the vendor-command dispatcher, the FPGA configuration-session protocol,
//! the command-bus relay, the adaptive streaming-watermark controller, the
//! power-state hooks, and the event-flag substrate that connects interrupt
//! handlers to the cooperative main loop.
//!
//! All hardware access goes through the [`hal::Hal`] trait, so the same logic
//! runs on a real bridge board and on the in-memory emulator used for tests
//! (see the `fxbridge-sim` crate).
//!
//! # Concurrency model
//!
//! The firmware is a single-threaded main loop preempted by interrupts.
//! Interrupt handlers only call into [`runtime::isr`]; every stateful
//! decision happens in [`runtime::Firmware::service`], invoked from the main
//! loop. The one datum shared across contexts is the saturating
//! [`events::TransferCounter`], which is read-and-cleared atomically.

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "std")]
extern crate std;

pub mod device;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod hal;
pub mod power;
pub mod protocol;
pub mod relay;
pub mod runtime;
pub mod session;
pub mod watermark;

pub use error::{Error, Result};
pub use runtime::Firmware;
