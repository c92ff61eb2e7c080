//! Host-side error types

use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur when talking to the bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No bridge on the bus
    #[error("no bridge device found (16c0:07a9)")]
    DeviceNotFound,
    /// More than one bridge on the bus
    #[error("multiple bridge devices found ({0}); unplug all but one")]
    MultipleDevicesFound(usize),
    /// Failed to open the device
    #[error("failed to open device: {0}")]
    OpenFailed(String),
    /// Failed to claim the interface
    #[error("failed to claim interface: {0}")]
    ClaimFailed(String),
    /// Device enumeration failed
    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),
    /// A control transfer failed; a stall here means the device rejected
    /// the command
    #[error("control transfer failed: {0}")]
    Transfer(#[from] nusb::transfer::TransferError),
    /// The device answered a status read with fewer bytes than requested
    #[error("short status reply from device")]
    ShortReply,
}
