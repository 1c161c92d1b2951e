//! Tests for sending and receiving commands

use blelink_hci_host::CodecError;
use blelink_hci_interface::{Command, SendError, SessionConfig};
use blelink_host_tests::{complete_writes, create_session, handle, Received};

#[test]
fn send_vendor_debug_command() {
    let mut session = create_session(SessionConfig::default());

    session.send_command(&Command::DbgFlashIdentify).unwrap();

    assert_eq!(complete_writes(&mut session), [vec![0x01, 0x05, 0xFC, 0x00]]);
}

#[test]
fn send_command_with_parameters() {
    let mut session = create_session(SessionConfig::default());

    let disconnect = Command::Disconnect {
        connection_handle: handle(0x0040),
        reason: 0x13,
    };

    session.send_command(&disconnect).unwrap();

    assert_eq!(
        complete_writes(&mut session),
        [vec![0x01, 0x06, 0x04, 0x03, 0x40, 0x00, 0x13]]
    );
}

#[test]
fn oversized_advertising_data_is_not_sent() {
    let mut session = create_session(SessionConfig::default());

    let command = Command::LeSetAdvertisingData { data: vec![0x02; 32] };

    assert_eq!(
        session.send_command(&command),
        Err(SendError::Codec(CodecError::InvalidParameter("data length")))
    );

    assert_eq!(session.get_queued(), 0);

    assert!(complete_writes(&mut session).is_empty());

    assert_eq!(session.get_command_credit(), 1);
}

#[test]
fn receive_command() {
    let mut session = create_session(SessionConfig::default());

    session.feed(&[0x01, 0x05, 0xFC, 0x00]).unwrap();

    session
        .feed(&[0x01, 0x06, 0x04, 0x03, 0x40, 0x00, 0x13])
        .unwrap();

    let received = session.get_mut_upper().take_received();

    assert_eq!(
        received,
        [
            Received::Command {
                opcode: 0xFC05,
                command: Command::DbgFlashIdentify,
            },
            Received::Command {
                opcode: 0x0406,
                command: Command::Disconnect {
                    connection_handle: handle(0x0040),
                    reason: 0x13
                },
            },
        ]
    );

    assert_eq!(session.get_stats().commands_dispatched, 2);
}

#[test]
fn receive_unknown_command() {
    let mut session = create_session(SessionConfig::default());

    // LE Read Local Supported Features is not within the registry
    session.feed(&[0x01, 0x03, 0x20, 0x02, 0xAA, 0xBB]).unwrap();

    assert!(session.get_upper().get_received().is_empty());

    assert_eq!(session.get_stats().unknown_opcode, 1);

    session.feed(&[0x01, 0x03, 0x0C, 0x00]).unwrap();

    assert_eq!(
        session.get_upper().get_received(),
        [Received::Command {
            opcode: 0x0C03,
            command: Command::Reset,
        }]
    );
}

#[test]
fn receive_command_with_wrong_length() {
    let mut session = create_session(SessionConfig::default());

    // Disconnect must have three bytes of parameters
    session.feed(&[0x01, 0x06, 0x04, 0x02, 0x40, 0x00]).unwrap();

    assert!(session.get_upper().get_received().is_empty());

    assert_eq!(session.get_stats().length_mismatch, 1);
}
