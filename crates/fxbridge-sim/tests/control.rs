//! Control-plane behavior: configuration management, vendor-command
//! dispatch and the runtime command relay.

use fxbridge_core::hal::BusStrobe;
use fxbridge_core::protocol::{
    command_index, CMD_FPGA, CMD_PAUSE, CMD_STATUS, CMD_STOP, FPGA_CONFIGURE_START,
    GET_CONFIGURATION, VENDOR_REQUEST,
};
use fxbridge_core::watermark::DEFAULT_COMMIT_THRESHOLD;
use fxbridge_sim::{setup_bytes, ClockSource, Ep0Result, Rig};

fn configured() -> Rig {
    let mut rig = Rig::new();
    assert_eq!(rig.set_configuration(1), Some(Ep0Result::Handshake));
    rig
}

#[test]
fn vendor_commands_rejected_before_configuration() {
    let mut rig = Rig::new();
    let journal_len = rig.board().journal().len();

    assert_eq!(
        rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_START, 0),
        Some(Ep0Result::Stall)
    );
    assert_eq!(rig.vendor_out(CMD_STOP, 0, 0), Some(Ep0Result::Stall));
    assert_eq!(rig.vendor_in(CMD_STATUS, 0, 1), Some(Ep0Result::Stall));

    // A rejection must not touch any hardware register.
    assert_eq!(rig.board().journal().len(), journal_len);
}

#[test]
fn set_configuration_arms_streaming_endpoint() {
    let rig = configured();
    let board = rig.board();

    assert!(board.stream_endpoint_armed);
    assert!(board.auto_commit);
    assert_eq!(board.clock, ClockSource::Internal);
    assert_eq!(board.flag_routing, 0);
    assert_eq!(board.commit_threshold(), DEFAULT_COMMIT_THRESHOLD);
    // Every endpoint-bank write happened under the NAK-hold.
    assert_eq!(board.bracket_violations, 0);
    assert!(!board.nak_held);
}

#[test]
fn set_configuration_is_idempotent() {
    let mut rig = configured();
    assert_eq!(rig.set_configuration(1), Some(Ep0Result::Handshake));

    assert!(rig.board().stream_endpoint_armed);
    assert_eq!(rig.board().bracket_violations, 0);
}

#[test]
fn deconfiguring_disables_data_endpoints() {
    let mut rig = configured();
    assert_eq!(rig.set_configuration(0), Some(Ep0Result::Handshake));

    assert!(!rig.board().stream_endpoint_armed);
    assert_eq!(rig.board().bracket_violations, 0);
}

#[test]
fn unsupported_configuration_value_stalls() {
    let mut rig = Rig::new();
    assert_eq!(rig.set_configuration(2), Some(Ep0Result::Stall));
    assert!(!rig.board().stream_endpoint_armed);
}

#[test]
fn get_configuration_reports_current_state() {
    let mut rig = Rig::new();
    let get = setup_bytes(0x80, GET_CONFIGURATION, 0, 0, 1);

    assert_eq!(rig.submit_setup(get), Some(Ep0Result::Handshake));
    assert_eq!(rig.board().ep0.reply, vec![0]);

    rig.set_configuration(1);
    assert_eq!(rig.submit_setup(get), Some(Ep0Result::Handshake));
    assert_eq!(rig.board().ep0.reply, vec![1]);
}

#[test]
fn unknown_command_tuples_stall_without_side_effects() {
    let mut rig = configured();
    let journal_len = rig.board().journal().len();

    // Write and Stop subcommands are not valid while no session is active.
    assert_eq!(rig.vendor_out(CMD_FPGA, 1, 8), Some(Ep0Result::Stall));
    assert_eq!(rig.vendor_out(CMD_FPGA, 2, 0), Some(Ep0Result::Stall));
    // Status is device-to-host only, Stop host-to-device only.
    assert_eq!(rig.vendor_out(CMD_STATUS, 0, 0), Some(Ep0Result::Stall));
    assert_eq!(rig.vendor_in(CMD_STOP, 0, 1), Some(Ep0Result::Stall));
    // Command bytes past the table.
    assert_eq!(rig.vendor_out(4, 0, 0), Some(Ep0Result::Stall));
    assert_eq!(rig.vendor_in(0xff, 0xff, 1), Some(Ep0Result::Stall));

    assert_eq!(rig.board().journal().len(), journal_len);
}

#[test]
fn unknown_vendor_brequest_stalls() {
    let mut rig = configured();
    let raw = setup_bytes(0x40, VENDOR_REQUEST + 1, 0, 0, 0);
    assert_eq!(rig.submit_setup(raw), Some(Ep0Result::Stall));
}

#[test]
fn out_commands_with_data_stage_are_rejected() {
    let mut rig = configured();
    let journal_len = rig.board().journal().len();

    assert_eq!(
        rig.vendor_out(CMD_FPGA, FPGA_CONFIGURE_START, 4),
        Some(Ep0Result::Stall)
    );
    assert_eq!(rig.vendor_out(CMD_STOP, 0, 1), Some(Ep0Result::Stall));

    assert_eq!(rig.board().journal().len(), journal_len);
}

#[test]
fn stop_is_relayed_as_two_phase_write() {
    let mut rig = configured();
    assert_eq!(rig.vendor_out(CMD_STOP, 0, 0), Some(Ep0Result::Handshake));

    assert_eq!(
        rig.board().bus.writes,
        vec![(0, BusStrobe::Clear), (1, BusStrobe::Latch)]
    );
}

#[test]
fn pause_argument_selects_pause_or_run() {
    let mut rig = configured();
    assert_eq!(rig.vendor_out(CMD_PAUSE, 1, 0), Some(Ep0Result::Handshake));
    assert_eq!(rig.vendor_out(CMD_PAUSE, 0, 0), Some(Ep0Result::Handshake));

    assert_eq!(
        rig.board().bus.writes,
        vec![
            (0, BusStrobe::Clear),
            (2, BusStrobe::Latch),
            (0, BusStrobe::Clear),
            (0, BusStrobe::Latch),
        ]
    );
}

#[test]
fn status_reads_one_byte_from_the_bus() {
    let mut rig = configured();
    rig.board_mut().bus.status_reply = 0x5a;

    assert_eq!(rig.vendor_in(CMD_STATUS, 0, 1), Some(Ep0Result::Handshake));
    assert_eq!(rig.board().ep0.reply, vec![0x5a]);
    assert_eq!(rig.board().bus.reads, 1);
}

#[test]
fn status_with_wrong_length_stalls_without_bus_access() {
    let mut rig = configured();

    assert_eq!(rig.vendor_in(CMD_STATUS, 0, 0), Some(Ep0Result::Stall));
    assert_eq!(rig.vendor_in(CMD_STATUS, 0, 2), Some(Ep0Result::Stall));
    assert_eq!(rig.board().bus.reads, 0);
}

#[test]
fn non_vendor_requests_with_the_vendor_brequest_are_ignored() {
    let mut rig = configured();
    // Class request carrying our bRequest value: someone else's domain.
    let raw = setup_bytes(0x21, VENDOR_REQUEST, 0, command_index(CMD_STOP, 0), 0);

    assert_eq!(rig.submit_setup(raw), None);
    assert!(rig.board().bus.writes.is_empty());
}
