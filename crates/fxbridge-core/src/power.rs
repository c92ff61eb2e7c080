//! Power-state hooks
//!
//! The USB stack collaborator performs the actual suspend/resume handshake
//! (low-power CPU entry, remote-wakeup polling, resume signalling). These
//! two hooks bracket it.

use crate::hal::Hal;
use crate::session::ConfigSession;

/// Called synchronously before the low-power handshake.
///
/// Forces the FPGA into its reset-line state (the first step of a
/// configuration start, without the rest of the sequence) and turns off the
/// host-power indicator. An active configuration session can no longer
/// complete after this, so it is marked stopped.
pub fn on_suspend<H: Hal>(hal: &mut H, session: &mut ConfigSession) {
    hal.set_fpga_reset(true);
    hal.set_indicator_enabled(false);
    session.suspend();
    log::debug!("suspending: FPGA held in reset");
}

/// Called synchronously after the bus resumes.
pub fn on_resume<H: Hal>(hal: &mut H) {
    hal.set_indicator_enabled(true);
    log::debug!("resumed");
}
