//! Tests for the command and ACL data credit

use blelink_hci_interface::{Command, SendError, SessionConfigBuilder, TxState};
use blelink_host_tests::packets::{self, RESET};
use blelink_host_tests::{complete_writes, create_session, handle, WriteFailed};
use blelink_l2cap::pdu::att::AttPdu;
use blelink_l2cap::pdu::L2capPdu;

fn notification(value: u8) -> L2capPdu {
    L2capPdu::Attribute(AttPdu::HandleValueNotification {
        handle: 0x0003,
        value: vec![value],
    })
}

#[test]
fn commands_wait_for_credit() {
    let config = SessionConfigBuilder::new().set_initial_command_credit(0).build();

    let mut session = create_session(config);

    session.send_command(&Command::Reset).unwrap();

    session.send_command(&Command::ReadBdAddr).unwrap();

    assert_eq!(session.get_queued(), 2);

    assert!(complete_writes(&mut session).is_empty());

    session.feed(&packets::command_complete(2, 0x0000, &[])).unwrap();

    assert_eq!(
        complete_writes(&mut session),
        [vec![0x01, 0x03, 0x0C, 0x00], vec![0x01, 0x09, 0x10, 0x00]]
    );

    assert_eq!(session.get_command_credit(), 0);

    assert_eq!(session.get_queued(), 0);
}

#[test]
fn credit_is_set_not_added() {
    let mut session = create_session(Default::default());

    session.feed(&packets::command_complete(4, RESET, &[0x00])).unwrap();

    session.feed(&packets::command_complete(1, RESET, &[0x00])).unwrap();

    assert_eq!(session.get_command_credit(), 1);
}

#[test]
fn one_write_at_a_time() {
    let mut session = create_session(Default::default());

    session.feed(&packets::command_complete(3, RESET, &[0x00])).unwrap();

    session.send_command(&Command::Reset).unwrap();

    session.send_command(&Command::Reset).unwrap();

    assert_eq!(session.get_tx_state(), TxState::Ongoing);

    assert_eq!(session.get_transport().get_written().len(), 1);

    assert_eq!(session.get_queued(), 1);

    assert_eq!(complete_writes(&mut session).len(), 2);

    assert_eq!(session.get_tx_state(), TxState::Idle);
}

#[test]
fn waiting_command_blocks_queue() {
    let config = SessionConfigBuilder::new().set_initial_command_credit(0).build();

    let mut session = create_session(config);

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    session.send_command(&Command::Reset).unwrap();

    session.send_l2cap(handle(0x0001), &notification(1)).unwrap();

    assert!(complete_writes(&mut session).is_empty());

    session.feed(&packets::command_complete(1, 0x0000, &[])).unwrap();

    let written = complete_writes(&mut session);

    assert_eq!(written.len(), 2);

    assert_eq!(written[0][0], 0x01);

    assert_eq!(written[1][0], 0x02);
}

#[test]
fn acl_data_waits_for_buffers() {
    let mut session = create_session(Default::default());

    assert_eq!(session.get_acl_credit(), None);

    session.feed(&packets::le_buffer_size(27, 1)).unwrap();

    assert_eq!(session.get_acl_credit(), Some(1));

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    session.send_l2cap(handle(0x0001), &notification(1)).unwrap();

    session.send_l2cap(handle(0x0001), &notification(2)).unwrap();

    assert_eq!(complete_writes(&mut session).len(), 1);

    assert_eq!(session.get_acl_credit(), Some(0));

    assert_eq!(session.get_queued(), 1);

    session
        .feed(&packets::number_of_completed_packets(&[(0x0001, 1)]))
        .unwrap();

    let written = complete_writes(&mut session);

    assert_eq!(written.len(), 1);

    // the handle value notification with the value 2
    assert_eq!(written[0].last(), Some(&2));
}

#[test]
fn controller_buffer_limits_fragment_size() {
    let config = SessionConfigBuilder::new().set_max_acl_payload(251).build();

    let mut session = create_session(config);

    assert_eq!(session.get_max_acl_payload(), 251);

    session.feed(&packets::le_buffer_size(27, 4)).unwrap();

    assert_eq!(session.get_max_acl_payload(), 27);
}

#[test]
fn failed_write_returns_credit() {
    let mut session = create_session(Default::default());

    session.get_mut_transport().set_fail_writes(true);

    assert_eq!(
        session.send_command(&Command::Reset),
        Err(SendError::Transport(WriteFailed))
    );

    assert_eq!(session.get_command_credit(), 1);

    assert_eq!(session.get_tx_state(), TxState::Idle);

    // the command stays queued until it is written
    assert_eq!(session.get_queued(), 1);

    assert_eq!(session.get_stats().write_failures, 1);

    session.get_mut_transport().set_fail_writes(false);

    session.on_write_complete().unwrap();

    assert_eq!(session.get_transport().get_written(), [vec![0x01, 0x03, 0x0C, 0x00]]);

    assert_eq!(session.get_queued(), 0);
}

#[test]
fn failed_write_does_not_stop_receiving() {
    let config = SessionConfigBuilder::new().set_initial_command_credit(0).build();

    let mut session = create_session(config);

    session.send_command(&Command::Reset).unwrap();

    session.get_mut_transport().set_fail_writes(true);

    // the first event releases the reset command, the write of it fails
    let mut chunk = packets::command_complete(1, 0x0000, &[]);

    chunk.extend(packets::command_complete(1, RESET, &[0x00]));

    assert_eq!(session.feed(&chunk), Err(WriteFailed));

    assert_eq!(session.get_upper().events().count(), 2);

    assert_eq!(session.get_stats().events_dispatched, 2);

    assert_eq!(session.get_queued(), 1);

    assert_eq!(session.get_command_credit(), 1);

    assert_eq!(session.get_tx_state(), TxState::Idle);

    session.get_mut_transport().set_fail_writes(false);

    session.feed(&packets::command_complete(1, 0x0000, &[])).unwrap();

    assert_eq!(session.get_transport().get_written(), [vec![0x01, 0x03, 0x0C, 0x00]]);

    assert_eq!(session.get_queued(), 0);
}

#[test]
fn closing_connection_purges_queued_data() {
    let mut session = create_session(Default::default());

    session.feed(&packets::le_buffer_size(27, 1)).unwrap();

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    session.feed(&packets::le_connection_complete(0x0002)).unwrap();

    session.send_l2cap(handle(0x0001), &notification(1)).unwrap();

    session.send_l2cap(handle(0x0001), &notification(2)).unwrap();

    session.send_l2cap(handle(0x0002), &notification(3)).unwrap();

    assert_eq!(session.get_queued(), 2);

    session.feed(&packets::disconnection_complete(0x0001)).unwrap();

    assert_eq!(session.get_queued(), 1);
}

#[test]
fn reset_keeps_controller_state() {
    let mut session = create_session(Default::default());

    session.feed(&packets::le_buffer_size(20, 4)).unwrap();

    session.feed(&packets::command_complete(3, RESET, &[0x00])).unwrap();

    session.send_command(&Command::Reset).unwrap();

    session.send_command(&Command::ReadBdAddr).unwrap();

    assert_eq!(session.get_queued(), 1);

    session.reset();

    assert_eq!(session.get_queued(), 0);

    assert_eq!(session.get_command_credit(), 2);

    assert_eq!(session.get_acl_credit(), Some(4));

    assert_eq!(session.get_max_acl_payload(), 20);

    // the write started before the reset is still outstanding
    assert_eq!(session.get_tx_state(), TxState::Ongoing);

    session.on_write_complete().unwrap();

    assert_eq!(session.get_tx_state(), TxState::Idle);
}
