//! Device configuration manager
//!
//! Tracks whether the host has configured the device and applies the
//! endpoint-bank state for each configuration. All endpoint register writes
//! are bracketed by a NAK-hold window so no partial configuration is ever
//! observable from the bus.

use crate::error::{Error, Result};
use crate::hal::Hal;
use crate::watermark::DEFAULT_COMMIT_THRESHOLD;

/// USB device configuration, as selected by SET_CONFIGURATION.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceConfig {
    /// No data endpoints armed; only the control endpoint is live.
    #[default]
    Unconfigured = 0,
    /// The bulk streaming endpoint is armed.
    Configured = 1,
}

impl DeviceConfig {
    /// Decode the wValue byte of a SET_CONFIGURATION request.
    pub fn from_raw(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(Self::Unconfigured),
            1 => Ok(Self::Configured),
            _ => Err(Error::UnsupportedConfiguration),
        }
    }

    /// The byte reported to GET_CONFIGURATION.
    pub fn raw(self) -> u8 {
        self as u8
    }
}

/// Owner of the device configuration state.
#[derive(Debug, Default)]
pub struct ConfigManager {
    current: DeviceConfig,
}

impl ConfigManager {
    /// A manager starting in the unconfigured state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently active configuration.
    pub fn configuration(&self) -> DeviceConfig {
        self.current
    }

    /// True once the host has selected the configured state.
    pub fn is_configured(&self) -> bool {
        self.current == DeviceConfig::Configured
    }

    /// Apply a SET_CONFIGURATION request.
    ///
    /// The streaming clock is forced to the internal source first, so the
    /// endpoint bank can be programmed even when the FPGA is not supplying a
    /// clock, and every endpoint register write happens inside the NAK-hold
    /// window. Idempotent: reapplying the current configuration rewrites the
    /// same register state.
    pub fn set_configuration<H: Hal>(&mut self, hal: &mut H, raw: u8) -> Result<()> {
        let target = DeviceConfig::from_raw(raw)?;

        hal.select_internal_clock();
        hal.nak_all();
        match target {
            DeviceConfig::Unconfigured => hal.disable_data_endpoints(),
            DeviceConfig::Configured => {
                hal.arm_stream_endpoint();
                hal.set_commit_threshold(DEFAULT_COMMIT_THRESHOLD);
            }
        }
        hal.clear_flag_routing();
        hal.release_nak();
        self.current = target;

        log::debug!("configuration set to {:?}", target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip() {
        assert_eq!(DeviceConfig::from_raw(0).unwrap().raw(), 0);
        assert_eq!(DeviceConfig::from_raw(1).unwrap().raw(), 1);
    }

    #[test]
    fn unknown_value_rejected() {
        assert_eq!(
            DeviceConfig::from_raw(2).unwrap_err(),
            Error::UnsupportedConfiguration
        );
        assert_eq!(
            DeviceConfig::from_raw(0xff).unwrap_err(),
            Error::UnsupportedConfiguration
        );
    }
}
