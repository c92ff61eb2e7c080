//! USB transport to the bridge
//!
//! Every command is a single vendor control transfer on endpoint zero; the
//! command and subcommand bytes ride in wIndex and any payload in the data
//! stage. A bitstream is therefore loaded in wLength-sized slices, one
//! ConfigureWrite transfer per slice.

use std::time::Duration;

use nusb::transfer::{ControlIn, ControlOut, ControlType, Recipient};
use nusb::{Device, Interface, MaybeFuture};

use fxbridge_core::protocol::{
    command_index, CMD_FPGA, CMD_PAUSE, CMD_STATUS, CMD_STOP, FPGA_CONFIGURE_START,
    FPGA_CONFIGURE_STOP, FPGA_CONFIGURE_WRITE, USB_PID, USB_VID, VENDOR_REQUEST,
};

use crate::error::{BridgeError, Result};

const TIMEOUT: Duration = Duration::from_secs(1);

/// An open connection to the bridge.
pub struct Bridge {
    _device: Device,
    interface: Interface,
}

impl Bridge {
    /// Find the bridge on the bus and claim its interface.
    pub fn open() -> Result<Self> {
        let mut matches: Vec<nusb::DeviceInfo> = nusb::list_devices()
            .wait()?
            .filter(|dev| dev.vendor_id() == USB_VID && dev.product_id() == USB_PID)
            .collect();

        if matches.is_empty() {
            return Err(BridgeError::DeviceNotFound);
        }
        if matches.len() > 1 {
            return Err(BridgeError::MultipleDevicesFound(matches.len()));
        }
        let info = matches.remove(0);
        log::info!("opening bridge at address {}", info.device_address());

        let device = info
            .open()
            .wait()
            .map_err(|e| BridgeError::OpenFailed(e.to_string()))?;
        let interface = device
            .claim_interface(0)
            .wait()
            .map_err(|e| BridgeError::ClaimFailed(e.to_string()))?;

        Ok(Self {
            _device: device,
            interface,
        })
    }

    /// Begin an FPGA configuration session.
    pub fn configure_start(&self) -> Result<()> {
        self.vendor_out(CMD_FPGA, FPGA_CONFIGURE_START, &[])
    }

    /// Forward one slice of the bitstream. At most 64 bytes per call.
    pub fn configure_write(&self, chunk: &[u8]) -> Result<()> {
        self.vendor_out(CMD_FPGA, FPGA_CONFIGURE_WRITE, chunk)
    }

    /// Finalize the configuration session and start the pipeline clock.
    pub fn configure_stop(&self) -> Result<()> {
        self.vendor_out(CMD_FPGA, FPGA_CONFIGURE_STOP, &[])
    }

    /// Stop the acquisition pipeline.
    pub fn stop(&self) -> Result<()> {
        self.vendor_out(CMD_STOP, 0, &[])
    }

    /// Pause (true) or resume (false) the acquisition pipeline.
    pub fn pause(&self, paused: bool) -> Result<()> {
        self.vendor_out(CMD_PAUSE, paused as u8, &[])
    }

    /// Read the pipeline status byte.
    pub fn status(&self) -> Result<u8> {
        let reply = self.vendor_in(CMD_STATUS, 0, 1)?;
        reply.first().copied().ok_or(BridgeError::ShortReply)
    }

    fn vendor_out(&self, command: u8, subcommand: u8, data: &[u8]) -> Result<()> {
        self.interface
            .control_out(
                ControlOut {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request: VENDOR_REQUEST,
                    value: 0,
                    index: command_index(command, subcommand),
                    data,
                },
                TIMEOUT,
            )
            .wait()?;
        Ok(())
    }

    fn vendor_in(&self, command: u8, subcommand: u8, length: u16) -> Result<Vec<u8>> {
        Ok(self
            .interface
            .control_in(
                ControlIn {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request: VENDOR_REQUEST,
                    value: 0,
                    index: command_index(command, subcommand),
                    length,
                },
                TIMEOUT,
            )
            .wait()?)
    }
}
