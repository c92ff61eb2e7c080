//! Wire-level vendor protocol shared by the firmware and the host driver
//!
//! One vendor bRequest carries every bridge command. The command byte lives
//! in the high byte of wIndex, the subcommand (or the one-byte argument, for
//! Pause) in the low byte, and wLength declares the data stage.

use bitflags::bitflags;
use zerocopy::little_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{Error, Result};

/// USB vendor ID of the bridge
pub const USB_VID: u16 = 0x16C0;
/// USB product ID of the bridge
pub const USB_PID: u16 = 0x07A9;

/// The single vendor bRequest understood by the bridge
pub const VENDOR_REQUEST: u8 = 0x10;

/// Standard bRequest: GET_CONFIGURATION
pub const GET_CONFIGURATION: u8 = 0x08;
/// Standard bRequest: SET_CONFIGURATION
pub const SET_CONFIGURATION: u8 = 0x09;

/// Command byte: FPGA configuration session control
pub const CMD_FPGA: u8 = 0;
/// Command byte: relay Stop to the acquisition pipeline
pub const CMD_STOP: u8 = 1;
/// Command byte: read one status byte from the command bus (device-to-host)
pub const CMD_STATUS: u8 = 2;
/// Command byte: relay Pause; the subcommand byte is the argument
pub const CMD_PAUSE: u8 = 3;

/// FPGA subcommand: begin a configuration session
pub const FPGA_CONFIGURE_START: u8 = 0;
/// FPGA subcommand: forward wLength bitstream bytes to the FPGA
pub const FPGA_CONFIGURE_WRITE: u8 = 1;
/// FPGA subcommand: finalize the session and restore the external clock
pub const FPGA_CONFIGURE_STOP: u8 = 2;

/// Largest data stage a single control transfer can carry
pub const EP0_MAX_PACKET: usize = 64;

/// Build the wIndex field for a vendor command
pub const fn command_index(command: u8, subcommand: u8) -> u16 {
    (command as u16) << 8 | subcommand as u16
}

bitflags! {
    /// bmRequestType bit layout
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RequestType: u8 {
        /// Direction: device-to-host when set
        const DIR_IN          = 0x80;
        /// Type field: class request
        const TYPE_CLASS      = 0x20;
        /// Type field: vendor request
        const TYPE_VENDOR     = 0x40;
        /// Recipient field: interface
        const RECIP_INTERFACE = 0x01;
        /// Recipient field: endpoint
        const RECIP_ENDPOINT  = 0x02;
        /// Mask covering the two type bits
        const TYPE_MASK       = 0x60;
        /// Mask covering the recipient bits
        const RECIP_MASK      = 0x1f;
    }
}

impl RequestType {
    /// Transfer direction encoded in bit 7
    pub fn direction(self) -> Direction {
        if self.contains(Self::DIR_IN) {
            Direction::In
        } else {
            Direction::Out
        }
    }

    /// True for a vendor request whose recipient is the device
    pub fn is_vendor_for_device(self) -> bool {
        self.bits() & (Self::TYPE_MASK.bits() | Self::RECIP_MASK.bits()) == Self::TYPE_VENDOR.bits()
    }
}

/// Control-transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host-to-device
    Out,
    /// Device-to-host
    In,
}

/// Layout of the 8-byte USB SETUP packet
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SetupPacket {
    /// bmRequestType: direction, type and recipient bits
    pub request_type: u8,
    /// bRequest
    pub request: u8,
    /// wValue
    pub value: U16,
    /// wIndex: low byte = subcommand, high byte = command
    pub index: U16,
    /// wLength: size of the data stage
    pub length: U16,
}

impl SetupPacket {
    /// Reinterpret the raw SETUP bytes delivered by the USB stack
    pub fn decode(raw: [u8; 8]) -> Self {
        zerocopy::transmute!(raw)
    }
}

/// A decoded vendor command, valid only for the duration of dispatch
#[derive(Debug, Clone, Copy)]
pub struct VendorRequest {
    /// Transfer direction
    pub direction: Direction,
    /// Command byte (wIndex high byte)
    pub command: u8,
    /// Subcommand byte, doubling as the Pause argument (wIndex low byte)
    pub subcommand: u8,
    /// Declared data-stage length
    pub length: u16,
}

impl VendorRequest {
    /// Validate the request-type bits and pull the command fields apart.
    ///
    /// Rejects anything that is not `VENDOR_REQUEST` aimed at the device;
    /// per-command validation happens in the dispatcher.
    pub fn decode(setup: &SetupPacket) -> Result<Self> {
        let request_type = RequestType::from_bits_retain(setup.request_type);
        if setup.request != VENDOR_REQUEST || !request_type.is_vendor_for_device() {
            return Err(Error::BadRequestType);
        }
        let index = setup.index.get();
        Ok(Self {
            direction: request_type.direction(),
            command: (index >> 8) as u8,
            subcommand: (index & 0xff) as u8,
            length: setup.length.get(),
        })
    }
}
