//! Main-loop runtime and interrupt entry points
//!
//! [`Firmware`] owns every piece of mutable firmware state and is driven
//! exclusively from the main loop: each iteration calls
//! [`Firmware::service`], which drains the pending-event mailboxes set by
//! the [`isr`] entry points and acts on them in a fixed priority order.

use crate::device::ConfigManager;
use crate::dispatch::{self, Outcome};
use crate::error::Error;
use crate::events::{PendingEvents, TransferCounter};
use crate::hal::Hal;
use crate::power;
use crate::protocol::{
    RequestType, SetupPacket, VendorRequest, GET_CONFIGURATION, SET_CONFIGURATION,
};
use crate::session::ConfigSession;
use crate::watermark::Watermark;

/// The firmware's complete mutable state, plus the hardware behind it.
#[derive(Debug)]
pub struct Firmware<H: Hal> {
    hal: H,
    config: ConfigManager,
    session: ConfigSession,
    watermark: Watermark,
}

impl<H: Hal> Firmware<H> {
    /// Wrap a hardware port. Call [`Firmware::init`] before servicing.
    pub fn new(hal: H) -> Self {
        Self {
            hal,
            config: ConfigManager::new(),
            session: ConfigSession::new(),
            watermark: Watermark::new(),
        }
    }

    /// Bring the endpoint bank to the powered-but-unconfigured state.
    pub fn init(&mut self) {
        // Cannot fail for configuration zero.
        let _ = self.config.set_configuration(&mut self.hal, 0);
    }

    /// The hardware port.
    pub fn hal(&self) -> &H {
        &self.hal
    }

    /// Mutable access to the hardware port.
    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    /// The configuration manager.
    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    /// The FPGA configuration session.
    pub fn session(&self) -> &ConfigSession {
        &self.session
    }

    /// The watermark controller.
    pub fn watermark(&self) -> &Watermark {
        &self.watermark
    }

    /// One main-loop iteration: drain the mailboxes and act on each.
    ///
    /// Order matters. A pending control request is handled before its data
    /// stage can be observed, and suspend is handled last so everything
    /// raised before the bus went quiet is drained first.
    pub fn service(&mut self, events: &PendingEvents, transfers: &TransferCounter) {
        if events.control_request.take() {
            self.handle_control_request();
        }
        if events.ep0_out.take() {
            self.session.handle_ep0_out(&mut self.hal);
        }
        if events.timer_tick.take() {
            self.watermark.on_tick(&mut self.hal, transfers.take());
        }
        if events.suspend.take() {
            power::on_suspend(&mut self.hal, &mut self.session);
            self.hal.enter_low_power();
            power::on_resume(&mut self.hal);
        }
    }

    fn handle_control_request(&mut self) {
        let setup = SetupPacket::decode(self.hal.setup_packet());
        match VendorRequest::decode(&setup) {
            Ok(req) => {
                let outcome = dispatch::handle_vendor_request(
                    &mut self.hal,
                    &self.config,
                    &mut self.session,
                    &req,
                );
                match outcome {
                    Ok(Outcome::Complete) => self.hal.ep0_handshake(),
                    Ok(Outcome::DataStagePending) => {}
                    Err(err) => {
                        log::warn!(
                            "vendor request {}/{} rejected: {}",
                            req.command,
                            req.subcommand,
                            err
                        );
                        self.hal.ep0_stall();
                    }
                }
            }
            Err(Error::BadRequestType) => {
                let request_type = RequestType::from_bits_retain(setup.request_type);
                if request_type.contains(RequestType::TYPE_VENDOR) {
                    log::warn!("unknown vendor bRequest {:#04x}", setup.request);
                    self.hal.ep0_stall();
                } else {
                    self.handle_standard_request(&setup);
                }
            }
            Err(err) => {
                log::warn!("malformed control request: {}", err);
                self.hal.ep0_stall();
            }
        }
    }

    /// The two standard requests the USB stack hands through to firmware.
    /// Everything else in the standard request set is answered by the stack
    /// itself before this code runs.
    fn handle_standard_request(&mut self, setup: &SetupPacket) {
        match setup.request {
            SET_CONFIGURATION => {
                let raw = (setup.value.get() & 0xff) as u8;
                match self.config.set_configuration(&mut self.hal, raw) {
                    Ok(()) => {
                        self.watermark.reset();
                        self.hal.ep0_handshake();
                    }
                    Err(err) => {
                        log::warn!("SET_CONFIGURATION({}) rejected: {}", raw, err);
                        self.hal.ep0_stall();
                    }
                }
            }
            GET_CONFIGURATION => {
                self.hal
                    .ep0_write_reply(&[self.config.configuration().raw()]);
                self.hal.ep0_handshake();
            }
            _ => {}
        }
    }
}

/// Interrupt-context entry points.
///
/// Each is a leaf call from one hardware interrupt handler. They never block
/// and never touch [`Firmware`] state; everything beyond flag-raising is
/// deferred to [`Firmware::service`]. The vector glue that invokes these is
/// expected to mask its own interrupt source for the duration of the call,
/// leaving unrelated sources live.
pub mod isr {
    use crate::events::{EventFlag, TransferCounter};
    use crate::hal::Hal;

    /// SETUP-packet interrupt.
    pub fn setup_received(flag: &EventFlag) {
        flag.set();
    }

    /// Control OUT data-stage completion interrupt.
    pub fn ep0_out_complete(flag: &EventFlag) {
        flag.set();
    }

    /// Bus-suspend interrupt.
    pub fn suspend_requested(flag: &EventFlag) {
        flag.set();
    }

    /// Watermark timer interrupt.
    pub fn watermark_tick(flag: &EventFlag) {
        flag.set();
    }

    /// Streaming-endpoint transfer-completion interrupt.
    pub fn stream_transfer_complete(counter: &TransferCounter) {
        counter.record();
    }

    /// Streaming-endpoint NAK interrupt: the host asked for data the FIFO
    /// has not committed yet. Forcing an end-of-packet commits whatever is
    /// buffered so the next poll is answered. A NAK with an empty FIFO means
    /// there is genuinely nothing to send and must not commit a null packet.
    pub fn stream_nak<H: Hal>(hal: &mut H) {
        if !hal.stream_fifo_empty() {
            hal.force_packet_end();
        }
    }
}
