//! FPGA configuration sessions: the reset handshake, bitstream delivery
//! over the control endpoint and the clock handover at stop.

use fxbridge_core::protocol::{
    CMD_FPGA, CMD_STATUS, FPGA_CONFIGURE_START, FPGA_CONFIGURE_STOP, FPGA_CONFIGURE_WRITE,
};
use fxbridge_core::session::SessionState;
use fxbridge_sim::{ClockSource, Ep0Result, Rig};

fn streaming() -> Rig {
    let mut rig = Rig::new();
    assert_eq!(rig.set_configuration(1), Some(Ep0Result::Handshake));
    assert_eq!(
        rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_START, 0),
        Some(Ep0Result::Handshake)
    );
    assert_eq!(rig.fw.session().state(), SessionState::Streaming);
    rig
}

#[test]
fn start_runs_the_reset_handshake() {
    let rig = streaming();
    let board = rig.board();

    // Reset was asserted and released again, the serial path is live and the
    // FIFO was resynced under clean bracketing.
    assert!(!board.fpga.reset_asserted);
    assert!(board.fpga.config_clock_enabled);
    assert!(board.fpga.serial_primed());
    assert_eq!(board.clock, ClockSource::Internal);
    assert_eq!(board.fifo_resets, 1);
    assert_eq!(board.bracket_violations, 0);
}

#[test]
fn empty_session_restores_external_clock() {
    let mut rig = streaming();
    assert_eq!(
        rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_STOP, 0),
        Some(Ep0Result::Handshake)
    );

    let board = rig.board();
    assert_eq!(rig.fw.session().state(), SessionState::Idle);
    assert_eq!(board.clock, ClockSource::External);
    assert_eq!(board.polarity_relatches, 1);
    assert_eq!(board.fifo_resets, 2);
    assert_eq!(board.bracket_violations, 0);
}

#[test]
fn write_with_zero_length_is_rejected() {
    let mut rig = streaming();
    assert_eq!(
        rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_WRITE, 0),
        Some(Ep0Result::Stall)
    );
    assert!(!rig.board().ep0.armed);
}

#[test]
fn write_forwards_exactly_the_declared_bytes() {
    let mut rig = streaming();
    let bitstream: Vec<u8> = (0..100u8).collect();

    assert_eq!(rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_WRITE, 100), None);
    assert!(rig.board().ep0.armed);

    // First packet does not complete the transfer, the endpoint is re-armed.
    assert_eq!(rig.deliver_ep0_chunk(&bitstream[..64]), None);
    assert!(rig.board().ep0.armed);

    assert_eq!(
        rig.deliver_ep0_chunk(&bitstream[64..]),
        Some(Ep0Result::Handshake)
    );
    assert_eq!(rig.board().fpga.bitstream, bitstream);
    assert_eq!(rig.board().fpga.unprimed_loads, 0);
}

#[test]
fn consecutive_writes_accumulate_one_bitstream() {
    let mut rig = streaming();

    for chunk in [&[0xaa; 64][..], &[0xbb; 64][..], &[0xcc; 10][..]] {
        assert_eq!(
            rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_WRITE, chunk.len() as u16),
            None
        );
        assert_eq!(rig.deliver_ep0_chunk(chunk), Some(Ep0Result::Handshake));
    }
    assert_eq!(rig.board().fpga.bitstream.len(), 64 + 64 + 10);
}

#[test]
fn oversized_chunk_stalls_the_transfer() {
    let mut rig = streaming();
    assert_eq!(rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_WRITE, 8), None);

    assert_eq!(rig.deliver_ep0_chunk(&[0u8; 16]), Some(Ep0Result::Stall));
    // The session survives; the host may retry.
    assert_eq!(rig.fw.session().state(), SessionState::Streaming);
    assert_eq!(rig.fw.session().bytes_remaining(), 0);
}

#[test]
fn fpga_abort_mid_write_stalls_but_keeps_the_session() {
    let mut rig = streaming();
    rig.board_mut().fpga.fail_after = Some(32);

    assert_eq!(rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_WRITE, 64), None);
    assert_eq!(rig.deliver_ep0_chunk(&[0u8; 64]), Some(Ep0Result::Stall));

    // Still Streaming: the host decides whether to restart or abandon.
    assert_eq!(rig.fw.session().state(), SessionState::Streaming);
    rig.board_mut().fpga.fail_after = None;
    assert_eq!(
        rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_START, 0),
        Some(Ep0Result::Handshake)
    );
    assert!(rig.board().fpga.bitstream.is_empty());
}

#[test]
fn restart_during_a_session_discards_loaded_bytes() {
    let mut rig = streaming();
    assert_eq!(rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_WRITE, 4), None);
    assert_eq!(
        rig.deliver_ep0_chunk(&[1, 2, 3, 4]),
        Some(Ep0Result::Handshake)
    );

    assert_eq!(
        rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_START, 0),
        Some(Ep0Result::Handshake)
    );
    assert!(rig.board().fpga.bitstream.is_empty());
    assert_eq!(rig.fw.session().state(), SessionState::Streaming);
}

#[test]
fn runtime_commands_are_rejected_during_a_session() {
    let mut rig = streaming();
    let journal_len = rig.board().journal().len();

    assert_eq!(rig.vendor_in(CMD_STATUS, 0, 1), Some(Ep0Result::Stall));
    assert_eq!(rig.vendor_out(1, 0, 0), Some(Ep0Result::Stall));
    assert_eq!(rig.vendor_out(3, 1, 0), Some(Ep0Result::Stall));

    assert_eq!(rig.board().journal().len(), journal_len);
    assert!(rig.board().bus.writes.is_empty());
}

#[test]
fn full_load_sequence_end_to_end() {
    let mut rig = streaming();
    let bitstream: Vec<u8> = (0..255u8).cycle().take(300).collect();

    for chunk in bitstream.chunks(64) {
        assert_eq!(
            rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_WRITE, chunk.len() as u16),
            None
        );
        assert_eq!(rig.deliver_ep0_chunk(chunk), Some(Ep0Result::Handshake));
    }
    assert_eq!(
        rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_STOP, 0),
        Some(Ep0Result::Handshake)
    );

    assert_eq!(rig.board().fpga.bitstream, bitstream);
    assert_eq!(rig.fw.session().state(), SessionState::Idle);
    assert_eq!(rig.board().clock, ClockSource::External);
}
