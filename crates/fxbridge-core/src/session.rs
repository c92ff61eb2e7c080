//! FPGA configuration session
//!
//! State machine for one bitstream load, from ConfigureStart to
//! ConfigureStop. The session is owned exclusively by main-loop context;
//! interrupt handlers never touch it.
//!
//! The two busy-waits in [`ConfigSession::start`] are deliberate: the FPGA
//! bounds them with its own configuration handshake (sub-millisecond), so
//! there is no firmware timeout.

use crate::hal::Hal;
use crate::protocol::EP0_MAX_PACKET;

/// Lifecycle of a configuration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session; runtime commands are relayed to the pipeline.
    #[default]
    Idle,
    /// Reset asserted, waiting for the FPGA to acknowledge on the status
    /// line. Transient: only observable while `start` is polling.
    AwaitingStatusLow,
    /// The FPGA accepts bitstream bytes via ConfigureWrite.
    Streaming,
    /// A suspend forced the FPGA into reset mid-session. Only a fresh
    /// ConfigureStart or a ConfigureStop is accepted from here.
    Stopped,
}

/// One FPGA configuration attempt.
#[derive(Debug, Default)]
pub struct ConfigSession {
    state: SessionState,
    bytes_remaining: u16,
}

impl ConfigSession {
    /// A session starting out idle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bytes still expected by an armed ConfigureWrite data stage.
    pub fn bytes_remaining(&self) -> u16 {
        self.bytes_remaining
    }

    /// Run the FPGA reset sequence and enter `Streaming`.
    ///
    /// Also serves as a hard restart: calling it during an active session
    /// abandons that session. Steps, in hardware-mandated order: internal
    /// clock (the FPGA stops feeding the external one), reset asserted,
    /// serial clock gated through, streaming FIFO cleared and re-armed under
    /// NAK, wait for the status line to acknowledge reset (low), release
    /// reset, prime the transmitter so the first byte loads immediately,
    /// wait for status high.
    pub fn start<H: Hal>(&mut self, hal: &mut H) {
        hal.select_internal_clock();
        hal.set_fpga_reset(true);
        hal.enable_config_clock();

        self.resync_stream_fifo(hal);
        self.bytes_remaining = 0;
        self.state = SessionState::AwaitingStatusLow;

        // Hardware-bounded wait: the FPGA acknowledges reset by driving the
        // status line low.
        while !hal.fpga_status_low() {}
        hal.set_fpga_reset(false);
        hal.prime_config_serial();
        while hal.fpga_status_low() {}

        self.state = SessionState::Streaming;
        log::debug!("configuration session started");
    }

    /// Arm a ConfigureWrite data stage expecting `len` bytes.
    pub fn begin_write<H: Hal>(&mut self, hal: &mut H, len: u16) {
        self.bytes_remaining = len;
        hal.ep0_arm_out();
    }

    /// Transmit a batch of bitstream bytes over the byte-serial link.
    ///
    /// Each byte must be fully accepted by the transmitter before the next
    /// is loaded, so this blocks on the ready signal per byte. Returns true
    /// if the status line reads low after the batch, which means the FPGA
    /// has aborted the configuration and the caller must stop feeding data.
    pub fn write_bytes<H: Hal>(&mut self, hal: &mut H, buf: &[u8]) -> bool {
        for &byte in buf {
            while !hal.config_serial_ready() {}
            hal.load_config_byte(byte);
        }
        hal.fpga_status_low()
    }

    /// Data-stage completion handler for an armed ConfigureWrite.
    ///
    /// Forwards the received chunk, then either re-arms the control endpoint
    /// (more bytes declared), completes the handshake (exactly the declared
    /// count consumed and the FPGA still healthy), or stalls (oversized
    /// chunk, or the status line reports failure). On failure the session
    /// stays `Streaming` so the host may retry ConfigureWrite or abandon
    /// with ConfigureStop.
    pub fn handle_ep0_out<H: Hal>(&mut self, hal: &mut H) {
        if self.bytes_remaining == 0 {
            return;
        }
        let mut chunk = [0u8; EP0_MAX_PACKET];
        let received = hal.ep0_take_out(&mut chunk);

        let failed = received as u16 > self.bytes_remaining
            || self.write_bytes(hal, &chunk[..received]);
        if failed {
            log::warn!(
                "configuration write aborted with {} bytes outstanding",
                self.bytes_remaining
            );
            self.bytes_remaining = 0;
            hal.ep0_stall();
            return;
        }

        self.bytes_remaining -= received as u16;
        if self.bytes_remaining > 0 {
            hal.ep0_arm_out();
        } else {
            hal.ep0_handshake();
        }
    }

    /// Finalize the session and hand the streaming path back to the FPGA.
    ///
    /// Resyncs the streaming FIFO, switches the FIFO clock back to the
    /// external (FPGA-driven) source, and toggles the glitch filter to
    /// re-latch input polarity, which drifted while no clock was supplied.
    pub fn stop<H: Hal>(&mut self, hal: &mut H) {
        self.resync_stream_fifo(hal);
        hal.select_external_clock();
        hal.relatch_input_polarity();
        self.state = SessionState::Idle;
        self.bytes_remaining = 0;
        log::debug!("configuration session stopped");
    }

    /// Mark an active session dead after a suspend forced the FPGA into
    /// reset. No hardware is touched here; the power manager already did.
    pub fn suspend(&mut self) {
        if matches!(
            self.state,
            SessionState::Streaming | SessionState::AwaitingStatusLow
        ) {
            self.state = SessionState::Stopped;
            self.bytes_remaining = 0;
        }
    }

    /// Clear and re-enable the streaming FIFO under a NAK-hold so the bus
    /// never observes it half-reset.
    fn resync_stream_fifo<H: Hal>(&mut self, hal: &mut H) {
        hal.nak_all();
        hal.set_stream_auto_commit(false);
        hal.reset_stream_fifo();
        hal.set_stream_auto_commit(true);
        hal.release_nak();
    }
}
