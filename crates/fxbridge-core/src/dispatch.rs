//! Vendor command dispatcher
//!
//! Arbitrates host vendor requests against the device configuration and the
//! FPGA session state. Validation is strictly front-loaded: by the time any
//! hardware is touched, the request has already been accepted. A returned
//! error becomes a control stall in the runtime, with no side effects.

use crate::device::ConfigManager;
use crate::error::{Error, Result};
use crate::hal::Hal;
use crate::protocol::{
    Direction, VendorRequest, CMD_FPGA, CMD_PAUSE, CMD_STATUS, CMD_STOP, FPGA_CONFIGURE_START,
    FPGA_CONFIGURE_STOP, FPGA_CONFIGURE_WRITE,
};
use crate::relay;
use crate::session::{ConfigSession, SessionState};

/// How an accepted request completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The request is done; the runtime completes the status stage.
    Complete,
    /// A data stage was armed; completion happens in the ep0-out handler.
    DataStagePending,
}

/// Dispatch one decoded vendor request.
pub fn handle_vendor_request<H: Hal>(
    hal: &mut H,
    config: &ConfigManager,
    session: &mut ConfigSession,
    req: &VendorRequest,
) -> Result<Outcome> {
    if !config.is_configured() {
        return Err(Error::NotConfigured);
    }

    match session.state() {
        SessionState::Idle => dispatch_idle(hal, session, req),
        SessionState::Streaming => dispatch_session(hal, session, req, true),
        SessionState::Stopped => dispatch_session(hal, session, req, false),
        // `start` blocks until Streaming, so dispatch never observes this.
        SessionState::AwaitingStatusLow => Err(Error::UnknownCommand),
    }
}

/// No session active: configuration start plus the runtime relay commands.
fn dispatch_idle<H: Hal>(
    hal: &mut H,
    session: &mut ConfigSession,
    req: &VendorRequest,
) -> Result<Outcome> {
    match req.direction {
        Direction::Out => {
            // None of the Out commands accepted here carries data.
            if req.length != 0 {
                return Err(Error::BadLength);
            }
            match (req.command, req.subcommand) {
                (CMD_FPGA, FPGA_CONFIGURE_START) => {
                    session.start(hal);
                    Ok(Outcome::Complete)
                }
                (CMD_STOP, _) => {
                    relay::stop(hal);
                    Ok(Outcome::Complete)
                }
                (CMD_PAUSE, arg) => {
                    relay::pause(hal, arg);
                    Ok(Outcome::Complete)
                }
                _ => Err(Error::UnknownCommand),
            }
        }
        Direction::In => match req.command {
            CMD_STATUS => {
                if req.length != 1 {
                    return Err(Error::BadLength);
                }
                let status = relay::status(hal);
                hal.ep0_write_reply(&[status]);
                Ok(Outcome::Complete)
            }
            _ => Err(Error::UnknownCommand),
        },
    }
}

/// Session active (or stopped by a suspend): only FPGA subcommands are
/// legal. `accept_write` distinguishes a live `Streaming` session from a
/// `Stopped` one, which can be restarted or finalized but not written to.
fn dispatch_session<H: Hal>(
    hal: &mut H,
    session: &mut ConfigSession,
    req: &VendorRequest,
    accept_write: bool,
) -> Result<Outcome> {
    if req.direction == Direction::In || req.command != CMD_FPGA {
        return Err(Error::UnknownCommand);
    }
    match req.subcommand {
        FPGA_CONFIGURE_START => {
            if req.length != 0 {
                return Err(Error::BadLength);
            }
            // A fresh Start is a hard reset of the in-progress session.
            session.start(hal);
            Ok(Outcome::Complete)
        }
        FPGA_CONFIGURE_WRITE if accept_write => {
            if req.length == 0 {
                return Err(Error::BadLength);
            }
            session.begin_write(hal, req.length);
            Ok(Outcome::DataStagePending)
        }
        FPGA_CONFIGURE_STOP => {
            if req.length != 0 {
                return Err(Error::BadLength);
            }
            session.stop(hal);
            Ok(Outcome::Complete)
        }
        _ => Err(Error::UnknownCommand),
    }
}
