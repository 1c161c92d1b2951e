//! Tests for recovering from protocol violations
//!
//! None of these return an error to the user of the session, the session discards what it cannot
//! understand and continues with the next packet.

use blelink_hci_host::AclPacketBoundary;
use blelink_hci_interface::{Command, FramingError, RxState, SessionConfigBuilder};
use blelink_host_tests::packets::{self, RESET};
use blelink_host_tests::{create_session, handle};

#[test]
fn unknown_packet_indicators() {
    let mut session = create_session(Default::default());

    // SCO, ISO, and bytes that are no indicator at all
    session.feed(&[0x03, 0x05, 0x00, 0x99]).unwrap();

    assert_eq!(session.get_stats().unknown_packet_indicator, 4);

    assert_eq!(session.get_last_error(), Some(FramingError::UnknownPacketIndicator(0x99)));

    session.feed(&packets::command_complete(1, RESET, &[0x00])).unwrap();

    assert_eq!(session.get_stats().events_dispatched, 1);
}

#[test]
fn over_delivery() {
    let mut session = create_session(Default::default());

    session.on_received(&[0x04, 0x0E]).unwrap();

    assert_eq!(session.get_last_error(), Some(FramingError::FrameOverrun));

    assert_eq!(session.get_rx_state(), RxState::WaitType);

    assert_eq!(session.get_requested_len(), 1);
}

#[test]
fn wrong_return_parameter_length() {
    let mut session = create_session(Default::default());

    // The return parameters of Reset are only the status
    session.feed(&packets::command_complete(3, RESET, &[0x00, 0x00])).unwrap();

    assert_eq!(session.get_stats().length_mismatch, 1);

    assert_eq!(session.get_upper().events().count(), 0);

    // the credit of the discarded event is still used
    assert_eq!(session.get_command_credit(), 3);

    assert_eq!(session.get_rx_state(), RxState::WaitType);
}

#[test]
fn acl_data_for_unknown_connection() {
    let mut session = create_session(Default::default());

    let frame = packets::basic_frame(0x0004, &[0x1B, 0x03, 0x00, 0x01]);

    session
        .feed(&packets::acl(0x0007, AclPacketBoundary::FirstNonFlushable, &frame))
        .unwrap();

    assert_eq!(
        session.get_last_error(),
        Some(FramingError::UnknownConnection(handle(0x0007)))
    );

    assert_eq!(session.get_upper().frames().count(), 0);

    assert_eq!(session.get_rx_state(), RxState::WaitType);
}

#[test]
fn large_acl_data_for_unknown_connection() {
    let mut session = create_session(Default::default());

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    let frame = packets::basic_frame(0x0004, &[0x1B, 0x03, 0x00, 0xAA, 0xBB]);

    session
        .feed(&packets::acl(0x0001, AclPacketBoundary::FirstNonFlushable, &frame[..6]))
        .unwrap();

    // larger than the trash capacity
    let stray = packets::acl(0x0002, AclPacketBoundary::FirstNonFlushable, &[0xEE; 300]);

    session.feed(&stray).unwrap();

    assert_eq!(
        session.get_last_error(),
        Some(FramingError::UnknownConnection(handle(0x0002)))
    );

    assert_eq!(session.get_stats().unknown_connection, 1);

    assert_eq!(session.get_stats().trash_overflow, 0);

    assert_eq!(session.get_rx_state(), RxState::WaitType);

    // the frame of the open connection is still being recombined
    assert!(session.is_reassembling(handle(0x0001)));

    session
        .feed(&packets::acl(0x0001, AclPacketBoundary::ContinuingFragment, &frame[6..]))
        .unwrap();

    assert_eq!(session.get_upper().frames().count(), 1);

    assert!(!session.is_reassembling(handle(0x0001)));
}

#[test]
fn invalid_acl_header() {
    let mut session = create_session(Default::default());

    // reserved broadcast flag, two bytes of data
    session.feed(&[0x02, 0x01, 0xC0, 0x02, 0x00, 0xAA, 0xBB]).unwrap();

    assert_eq!(session.get_stats().invalid_packet, 1);

    assert_eq!(session.get_rx_state(), RxState::WaitType);

    session.feed(&packets::command_complete(1, RESET, &[0x00])).unwrap();

    assert_eq!(session.get_stats().events_dispatched, 1);
}

#[test]
fn trash_overflow_resets_session() {
    let config = SessionConfigBuilder::new()
        .set_trash_capacity(8)
        .set_initial_command_credit(0)
        .build();

    let mut session = create_session(config);

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    session.send_command(&Command::Reset).unwrap();

    // an unknown event with sixteen bytes of parameters
    let mut unknown = vec![0x04, 0xFE, 0x10];

    unknown.extend_from_slice(&[0; 16]);

    session.feed(&unknown[..3]).unwrap();

    assert_eq!(session.get_last_error(), Some(FramingError::TrashOverflow(16)));

    assert_eq!(session.get_stats().trash_overflow, 1);

    assert_eq!(session.get_queued(), 0);

    assert_eq!(session.get_rx_state(), RxState::WaitType);

    // connections survive a reset
    assert!(session.is_connection_open(handle(0x0001)));
}

#[test]
fn discarded_packet_within_trash_capacity() {
    let config = SessionConfigBuilder::new().set_trash_capacity(16).build();

    let mut session = create_session(config);

    let mut unknown = vec![0x04, 0xFE, 0x10];

    unknown.extend_from_slice(&[0xFF; 16]);

    session.feed(&unknown).unwrap();

    assert_eq!(session.get_stats().trash_overflow, 0);

    assert_eq!(session.get_stats().unknown_message_id, 1);

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    assert!(session.is_connection_open(handle(0x0001)));
}
