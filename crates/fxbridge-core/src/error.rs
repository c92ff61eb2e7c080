//! Error types for fxbridge-core
//!
//! Every rejected host request maps to exactly one of these variants. The
//! runtime turns a returned error into a control-transfer stall; no firmware
//! state is mutated before the validation that produces the error.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Protocol violations (host side at fault)
    /// Vendor request received while the device is not configured
    NotConfigured,
    /// SET_CONFIGURATION with a value other than the known configurations
    UnsupportedConfiguration,
    /// bmRequestType is not a vendor request addressed to the device
    BadRequestType,
    /// Command or subcommand not recognized for the current session state
    UnknownCommand,
    /// Data length does not match what the command expects
    BadLength,

    // Hardware handshake failures (FPGA side at fault)
    /// The FPGA reported a configuration failure mid-stream
    ConfigurationFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "device is not configured"),
            Self::UnsupportedConfiguration => write!(f, "unsupported configuration value"),
            Self::BadRequestType => write!(f, "not a vendor request for the device"),
            Self::UnknownCommand => write!(f, "unknown command for current session state"),
            Self::BadLength => write!(f, "unexpected data length"),
            Self::ConfigurationFailed => write!(f, "FPGA reported configuration failure"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
