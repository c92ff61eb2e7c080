//! fxbridge-sim - In-memory bridge-board emulator for testing
//!
//! This crate provides a [`SimBoard`] that implements the firmware's
//! hardware trait entirely in memory, so the full firmware can be exercised
//! without a bridge board or an FPGA. Beyond emulating behavior, the board
//! audits hardware contracts: every mutating register access is appended to
//! a journal (so tests can assert a rejected request touched nothing), and
//! violations of the NAK-hold and serial-ready preconditions are counted.
//!
//! [`Rig`] wires a [`SimBoard`] into a `Firmware` instance together with the
//! event mailboxes, and plays the roles of the USB stack and the host.

use fxbridge_core::events::{PendingEvents, TransferCounter};
use fxbridge_core::hal::{BusStrobe, Hal};
use fxbridge_core::protocol::{
    command_index, RequestType, SET_CONFIGURATION, VENDOR_REQUEST,
};
use fxbridge_core::runtime::isr;
use fxbridge_core::Firmware;

/// Bits of the programmable-flag register that hold the commit threshold.
/// The remaining bits are mode configuration and must survive threshold
/// updates untouched.
pub const PF_THRESHOLD_MASK: u16 = 0x0fff;

/// Where the streaming FIFO clock currently comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    /// On-board oscillator
    Internal,
    /// FPGA-driven pin
    External,
}

/// How the emulated control transfer ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ep0Result {
    /// Status stage completed normally
    Handshake,
    /// The firmware stalled the transfer
    Stall,
}

/// Emulated FPGA on the far side of the configuration link.
#[derive(Debug, Default)]
pub struct FpgaModel {
    /// Configuration-enable line state (asserted = held in reset)
    pub reset_asserted: bool,
    /// When set, the status line reports failure once this many bitstream
    /// bytes have been accepted. Must be at least 1; the line would
    /// otherwise report failure before the handshake completes.
    pub fail_after: Option<usize>,
    /// Every bitstream byte accepted since the last reset
    pub bitstream: Vec<u8>,
    /// Serial transmit clock gated through
    pub config_clock_enabled: bool,
    /// Transmitter ready signal
    serial_primed: bool,
    /// Bytes loaded while the ready signal was not asserted
    pub unprimed_loads: usize,
}

impl FpgaModel {
    /// Transmitter ready signal state.
    pub fn serial_primed(&self) -> bool {
        self.serial_primed
    }

    fn status_low(&self) -> bool {
        self.reset_asserted
            || self
                .fail_after
                .is_some_and(|limit| self.bitstream.len() >= limit)
    }
}

/// Emulated receiver on the parallel command bus.
#[derive(Debug, Default)]
pub struct BusModel {
    /// Every strobe pulse, in order, with the driven value
    pub writes: Vec<(u8, BusStrobe)>,
    /// Byte returned by the next read
    pub status_reply: u8,
    /// Number of read-enable pulses
    pub reads: usize,
}

/// Emulated control endpoint.
#[derive(Debug, Default)]
pub struct Ep0Model {
    /// The 8 SETUP bytes the firmware will decode
    pub setup: [u8; 8],
    /// Data-stage packets queued by the host, oldest first
    pub inbox: Vec<Vec<u8>>,
    /// Device-to-host reply staged by the firmware
    pub reply: Vec<u8>,
    /// Terminal outcome of the current transfer, once decided
    pub result: Option<Ep0Result>,
    /// Whether the endpoint will accept the next OUT packet
    pub armed: bool,
    /// How many times the endpoint was armed
    pub arm_count: usize,
}

/// In-memory bridge board.
///
/// All model state is public so tests can inspect and prime it directly.
#[derive(Debug)]
pub struct SimBoard {
    /// Streaming FIFO clock source
    pub clock: ClockSource,
    /// Glitch-filter toggles observed
    pub polarity_relatches: usize,
    /// NAK-hold line state
    pub nak_held: bool,
    /// Endpoint-bank writes issued while the NAK-hold was not asserted
    pub bracket_violations: usize,
    /// Streaming FIFO resets observed
    pub fifo_resets: usize,
    /// Streaming FIFO auto-commit enable
    pub auto_commit: bool,
    /// Bulk streaming endpoint armed and valid
    pub stream_endpoint_armed: bool,
    /// Flag routing register (zeroed by `clear_flag_routing`)
    pub flag_routing: u8,
    /// Programmable-flag register, threshold field plus mode bits
    pub pf_register: u16,
    /// Uncommitted bytes sitting in the streaming FIFO
    pub fifo_pending: usize,
    /// Packets committed by a forced end-of-packet
    pub forced_commits: usize,
    /// The FPGA model
    pub fpga: FpgaModel,
    /// The command-bus model
    pub bus: BusModel,
    /// The control-endpoint model
    pub ep0: Ep0Model,
    /// Host-power indicator driver enable
    pub indicator_enabled: bool,
    /// Times the CPU entered the low-power state
    pub low_power_entries: usize,
    journal: Vec<String>,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    /// A board in its power-on state.
    pub fn new() -> Self {
        Self {
            clock: ClockSource::External,
            polarity_relatches: 0,
            nak_held: false,
            bracket_violations: 0,
            fifo_resets: 0,
            auto_commit: false,
            stream_endpoint_armed: false,
            flag_routing: 0xff,
            pf_register: 0,
            fifo_pending: 0,
            forced_commits: 0,
            fpga: FpgaModel::default(),
            bus: BusModel::default(),
            ep0: Ep0Model::default(),
            indicator_enabled: true,
            low_power_entries: 0,
            journal: Vec::new(),
        }
    }

    /// Every hardware mutation so far, in order. Control-endpoint staging is
    /// deliberately not journaled; a stall must leave the journal untouched.
    pub fn journal(&self) -> &[String] {
        &self.journal
    }

    /// The commit threshold currently programmed.
    pub fn commit_threshold(&self) -> u16 {
        self.pf_register & PF_THRESHOLD_MASK
    }

    /// Consume and return the outcome of the current control transfer.
    pub fn take_ep0_result(&mut self) -> Option<Ep0Result> {
        self.ep0.result.take()
    }

    fn note(&mut self, entry: String) {
        self.journal.push(entry);
    }
}

impl Hal for SimBoard {
    fn select_internal_clock(&mut self) {
        self.clock = ClockSource::Internal;
        self.note("clock=internal".into());
    }

    fn select_external_clock(&mut self) {
        self.clock = ClockSource::External;
        self.note("clock=external".into());
    }

    fn relatch_input_polarity(&mut self) {
        self.polarity_relatches += 1;
        self.note("relatch-polarity".into());
    }

    fn nak_all(&mut self) {
        self.nak_held = true;
        self.note("nak=held".into());
    }

    fn release_nak(&mut self) {
        self.nak_held = false;
        self.note("nak=released".into());
    }

    fn reset_stream_fifo(&mut self) {
        if !self.nak_held {
            self.bracket_violations += 1;
        }
        self.fifo_resets += 1;
        self.fifo_pending = 0;
        self.note("fifo-reset".into());
    }

    fn set_stream_auto_commit(&mut self, enabled: bool) {
        self.auto_commit = enabled;
        self.note(format!("auto-commit={}", enabled));
    }

    fn disable_data_endpoints(&mut self) {
        if !self.nak_held {
            self.bracket_violations += 1;
        }
        self.stream_endpoint_armed = false;
        self.note("endpoints=disabled".into());
    }

    fn arm_stream_endpoint(&mut self) {
        if !self.nak_held {
            self.bracket_violations += 1;
        }
        self.stream_endpoint_armed = true;
        self.auto_commit = true;
        self.note("endpoints=stream".into());
    }

    fn clear_flag_routing(&mut self) {
        self.flag_routing = 0;
        self.note("flag-routing=0".into());
    }

    fn set_commit_threshold(&mut self, level: u16) {
        self.pf_register =
            (self.pf_register & !PF_THRESHOLD_MASK) | (level & PF_THRESHOLD_MASK);
        self.note(format!("threshold={}", level));
    }

    fn stream_fifo_empty(&self) -> bool {
        self.fifo_pending == 0
    }

    fn force_packet_end(&mut self) {
        if self.fifo_pending > 0 {
            self.fifo_pending = 0;
            self.forced_commits += 1;
        }
        self.note("force-pktend".into());
    }

    fn set_fpga_reset(&mut self, asserted: bool) {
        self.fpga.reset_asserted = asserted;
        if asserted {
            // Reset discards any partially loaded bitstream.
            self.fpga.bitstream.clear();
            self.fpga.serial_primed = false;
        }
        self.note(format!("fpga-reset={}", asserted));
    }

    fn fpga_status_low(&self) -> bool {
        self.fpga.status_low()
    }

    fn enable_config_clock(&mut self) {
        self.fpga.config_clock_enabled = true;
        self.note("config-clock=on".into());
    }

    fn prime_config_serial(&mut self) {
        self.fpga.serial_primed = true;
        self.note("serial-primed".into());
    }

    fn config_serial_ready(&self) -> bool {
        // Transmission is instantaneous in the emulation, so once primed
        // the transmitter is always ready for the next byte.
        self.fpga.serial_primed
    }

    fn load_config_byte(&mut self, byte: u8) {
        if !self.fpga.serial_primed {
            self.fpga.unprimed_loads += 1;
        }
        self.fpga.bitstream.push(byte);
        self.note(format!("config-byte={:#04x}", byte));
    }

    fn bus_write(&mut self, value: u8, strobe: BusStrobe) {
        self.bus.writes.push((value, strobe));
        self.note(format!("bus-write={} ({:?})", value, strobe));
    }

    fn bus_read(&mut self) -> u8 {
        self.bus.reads += 1;
        self.note("bus-read".into());
        self.bus.status_reply
    }

    fn setup_packet(&self) -> [u8; 8] {
        self.ep0.setup
    }

    fn ep0_arm_out(&mut self) {
        self.ep0.armed = true;
        self.ep0.arm_count += 1;
    }

    fn ep0_take_out(&mut self, buf: &mut [u8]) -> usize {
        self.ep0.armed = false;
        if self.ep0.inbox.is_empty() {
            return 0;
        }
        let packet = self.ep0.inbox.remove(0);
        let len = packet.len().min(buf.len());
        buf[..len].copy_from_slice(&packet[..len]);
        len
    }

    fn ep0_write_reply(&mut self, data: &[u8]) {
        self.ep0.reply = data.to_vec();
    }

    fn ep0_handshake(&mut self) {
        self.ep0.result = Some(Ep0Result::Handshake);
    }

    fn ep0_stall(&mut self) {
        self.ep0.result = Some(Ep0Result::Stall);
    }

    fn set_indicator_enabled(&mut self, enabled: bool) {
        self.indicator_enabled = enabled;
        self.note(format!("indicator={}", enabled));
    }

    fn enter_low_power(&mut self) {
        // The emulated bus resumes immediately.
        self.low_power_entries += 1;
        self.note("low-power".into());
    }
}

/// Firmware instance wired to a [`SimBoard`], driven like the hardware
/// would drive it: interrupt entry points raise flags, then the main loop
/// services them.
pub struct Rig {
    /// The firmware under test
    pub fw: Firmware<SimBoard>,
    /// The mailboxes the interrupt entry points write into
    pub events: PendingEvents,
    /// The streaming transfer-completion counter
    pub transfers: TransferCounter,
}

impl Default for Rig {
    fn default() -> Self {
        Self::new()
    }
}

impl Rig {
    /// A freshly initialized firmware on a power-on board.
    pub fn new() -> Self {
        let mut fw = Firmware::new(SimBoard::new());
        fw.init();
        Self {
            fw,
            events: PendingEvents::new(),
            transfers: TransferCounter::new(),
        }
    }

    /// The emulated board.
    pub fn board(&self) -> &SimBoard {
        self.fw.hal()
    }

    /// Mutable access to the emulated board.
    pub fn board_mut(&mut self) -> &mut SimBoard {
        self.fw.hal_mut()
    }

    /// Run one main-loop iteration.
    pub fn service(&mut self) {
        self.fw.service(&self.events, &self.transfers);
    }

    /// Deliver a raw SETUP packet and service it. Returns the transfer
    /// outcome, `None` when a data stage is still pending.
    pub fn submit_setup(&mut self, raw: [u8; 8]) -> Option<Ep0Result> {
        self.board_mut().ep0.setup = raw;
        isr::setup_received(&self.events.control_request);
        self.service();
        self.board_mut().take_ep0_result()
    }

    /// Submit a host-to-device vendor command.
    pub fn vendor_out(&mut self, command: u8, subcommand: u8, length: u16) -> Option<Ep0Result> {
        self.submit_setup(setup_bytes(
            RequestType::TYPE_VENDOR.bits(),
            VENDOR_REQUEST,
            0,
            command_index(command, subcommand),
            length,
        ))
    }

    /// Submit a device-to-host vendor command.
    pub fn vendor_in(&mut self, command: u8, subcommand: u8, length: u16) -> Option<Ep0Result> {
        self.submit_setup(setup_bytes(
            (RequestType::DIR_IN | RequestType::TYPE_VENDOR).bits(),
            VENDOR_REQUEST,
            0,
            command_index(command, subcommand),
            length,
        ))
    }

    /// Submit a standard SET_CONFIGURATION request.
    pub fn set_configuration(&mut self, value: u8) -> Option<Ep0Result> {
        self.submit_setup(setup_bytes(0x00, SET_CONFIGURATION, value as u16, 0, 0))
    }

    /// Deliver one data-stage packet and service the completion. Returns
    /// the transfer outcome, `None` while more data is expected.
    pub fn deliver_ep0_chunk(&mut self, data: &[u8]) -> Option<Ep0Result> {
        assert!(
            self.board().ep0.armed,
            "data-stage packet delivered to an unarmed control endpoint"
        );
        self.board_mut().ep0.inbox.push(data.to_vec());
        isr::ep0_out_complete(&self.events.ep0_out);
        self.service();
        self.board_mut().take_ep0_result()
    }

    /// Record `completions` streaming transfers and fire one watermark tick.
    pub fn tick(&mut self, completions: u8) {
        for _ in 0..completions {
            isr::stream_transfer_complete(&self.transfers);
        }
        isr::watermark_tick(&self.events.timer_tick);
        self.service();
    }

    /// Suspend the bus and resume it (the emulated low-power state returns
    /// immediately).
    pub fn suspend_resume(&mut self) {
        isr::suspend_requested(&self.events.suspend);
        self.service();
    }
}

/// Assemble the 8 SETUP bytes for a control request.
pub fn setup_bytes(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> [u8; 8] {
    let mut raw = [0u8; 8];
    raw[0] = request_type;
    raw[1] = request;
    raw[2..4].copy_from_slice(&value.to_le_bytes());
    raw[4..6].copy_from_slice(&index.to_le_bytes());
    raw[6..8].copy_from_slice(&length.to_le_bytes());
    raw
}
