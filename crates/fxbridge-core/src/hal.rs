//! Hardware abstraction for the bridge board
//!
//! The [`Hal`] trait is the single seam between the firmware logic and the
//! target hardware. A port implements it on top of the real registers; the
//! `fxbridge-sim` crate implements it as an in-memory emulation for tests.
//!
//! Methods are grouped by the peripheral they touch. Implementations are
//! expected to be cheap register accesses; nothing here is allowed to block
//! except as documented on the FPGA status and serial-ready lines, which the
//! session logic busy-polls (bounded by the FPGA's own configuration
//! handshake, not by firmware).

/// Strobe lines on the parallel command bus.
///
/// The receiving latch requires a two-phase write: a `Clear` pulse with the
/// bus driven to zero, then a `Latch` pulse with the command byte driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusStrobe {
    /// First-phase strobe, clears the receiver latch
    Clear,
    /// Second-phase strobe, latches the driven value
    Latch,
}

/// Register-level access to the bridge hardware.
pub trait Hal {
    // --- Streaming clock routing -------------------------------------------

    /// Derive the streaming FIFO clock from the internal oscillator.
    ///
    /// Required whenever the FPGA may not be supplying a clock: during
    /// endpoint reconfiguration and for the whole configuration session.
    fn select_internal_clock(&mut self);

    /// Derive the streaming FIFO clock from the FPGA-driven external source.
    fn select_external_clock(&mut self);

    /// Toggle the glitch-filter line so the input stage re-latches correct
    /// polarity after the external clock has been absent.
    fn relatch_input_polarity(&mut self);

    // --- Endpoint / FIFO bank ----------------------------------------------

    /// Assert the NAK-hold across all data FIFOs. While held, no endpoint
    /// activity is observable from the bus side.
    fn nak_all(&mut self);

    /// Release the NAK-hold.
    fn release_nak(&mut self);

    /// Clear the streaming FIFO. Only valid while the NAK-hold is asserted.
    fn reset_stream_fifo(&mut self);

    /// Enable or disable auto-commit on the streaming FIFO.
    fn set_stream_auto_commit(&mut self, enabled: bool);

    /// Mark every non-control endpoint invalid. Only valid under NAK-hold.
    fn disable_data_endpoints(&mut self);

    /// Configure the endpoint bank for streaming: the bulk IN stream
    /// endpoint valid with auto-commit enabled, everything else invalid.
    /// Only valid under NAK-hold.
    fn arm_stream_endpoint(&mut self);

    /// Zero the FIFO flag routing and polarity/latch configuration.
    fn clear_flag_routing(&mut self);

    /// Program the streaming commit threshold (the programmable-flag
    /// register). Implementations must preserve the register's unrelated
    /// configuration bits with a masked read-modify-write.
    fn set_commit_threshold(&mut self, level: u16);

    /// True when the streaming FIFO holds no uncommitted data.
    fn stream_fifo_empty(&self) -> bool;

    /// Force an end-of-packet so a partially filled buffer is committed.
    /// Idempotent; safe to call from interrupt context.
    fn force_packet_end(&mut self);

    // --- FPGA configuration link -------------------------------------------

    /// Drive the FPGA's configuration-enable line. Asserted = held in reset.
    fn set_fpga_reset(&mut self, asserted: bool);

    /// Sample the FPGA status line. True while it reads low (active-low
    /// "busy"; high means done).
    fn fpga_status_low(&self) -> bool;

    /// Gate the byte-serial transmit clock through to the FPGA.
    fn enable_config_clock(&mut self);

    /// Prime the byte-serial transmitter's ready signal, as if a previous
    /// transfer had completed, so the first byte can be loaded immediately.
    fn prime_config_serial(&mut self);

    /// True when the byte-serial transmitter can accept another byte.
    fn config_serial_ready(&self) -> bool;

    /// Load one byte into the byte-serial transmitter. Only valid when
    /// [`Hal::config_serial_ready`] reads true; loading earlier corrupts the
    /// bit stream.
    fn load_config_byte(&mut self, byte: u8);

    // --- Parallel command bus ----------------------------------------------

    /// Drive the data lines with `value` and pulse the given strobe.
    fn bus_write(&mut self, value: u8, strobe: BusStrobe);

    /// Pulse the read-enable line, sample the data lines, restore the line.
    fn bus_read(&mut self) -> u8;

    // --- Control endpoint ---------------------------------------------------

    /// The 8 SETUP bytes of the most recent control request.
    fn setup_packet(&self) -> [u8; 8];

    /// Arm the control endpoint to accept the next data-stage packet.
    fn ep0_arm_out(&mut self);

    /// Copy the received data-stage packet into `buf`; returns its length.
    fn ep0_take_out(&mut self, buf: &mut [u8]) -> usize;

    /// Stage a device-to-host reply for the data stage.
    fn ep0_write_reply(&mut self, data: &[u8]);

    /// Complete the control transfer's status stage.
    fn ep0_handshake(&mut self);

    /// Stall the control transfer, signalling rejection to the host.
    fn ep0_stall(&mut self);

    // --- Power ---------------------------------------------------------------

    /// Enable or disable the host-power indicator output driver.
    fn set_indicator_enabled(&mut self, enabled: bool);

    /// Enter the low-power CPU state and perform the suspend/resume
    /// handshake with the host. Returns once the bus resumes. This is the
    /// USB stack collaborator's dance; the firmware only brackets it with
    /// the power-state hooks.
    fn enter_low_power(&mut self);
}
