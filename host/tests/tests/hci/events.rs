//! Tests for receiving events

use blelink_core::Error;
use blelink_hci_host::ReturnParameters;
use blelink_hci_interface::{DestinationTask, Event, FramingError, MessageId, SessionConfig};
use blelink_host_tests::packets::{self, RESET};
use blelink_host_tests::{create_session, handle, Received};

#[test]
fn unknown_event_then_command_complete() {
    let mut session = create_session(SessionConfig::default());

    session.feed(&[0x04, 0xFF, 0x02, 0xAA, 0xBB]).unwrap();

    assert_eq!(
        session.get_last_error(),
        Some(FramingError::UnknownMessageId(MessageId::Event(0xFF)))
    );

    assert!(session.get_upper().get_received().is_empty());

    session.feed(&packets::command_complete(1, RESET, &[0x00])).unwrap();

    assert_eq!(
        session.get_upper().get_received(),
        [Received::Event {
            msg_id: MessageId::CommandComplete(RESET),
            destination: DestinationTask::Host,
            event: Event::CommandComplete {
                num_hci_command_packets: 1,
                opcode: RESET,
                return_parameters: ReturnParameters::Status(Error::NoError),
            },
        }]
    );

    assert_eq!(session.get_stats().unknown_message_id, 1);
}

#[test]
fn command_status_updates_credit() {
    let mut session = create_session(SessionConfig::default());

    // Command Status of LE Create Connection
    session.feed(&packets::command_status(0x00, 5, 0x200D)).unwrap();

    assert_eq!(session.get_command_credit(), 5);

    assert_eq!(
        session.get_upper().get_received(),
        [Received::Event {
            msg_id: MessageId::CommandStatus(0x200D),
            destination: DestinationTask::Gap,
            event: Event::CommandStatus {
                status: Error::NoError,
                num_hci_command_packets: 5,
                opcode: 0x200D,
            },
        }]
    );
}

#[test]
fn connection_complete_opens_connection() {
    let mut session = create_session(SessionConfig::default());

    session.feed(&packets::le_connection_complete(0x0040)).unwrap();

    assert!(session.is_connection_open(handle(0x0040)));

    match session.get_upper().get_received() {
        [Received::Event {
            msg_id: MessageId::LeMeta(0x01),
            destination: DestinationTask::Gap,
            event: Event::LeConnectionComplete(data),
        }] => {
            assert_eq!(data.connection_handle, handle(0x0040));
            assert_eq!(data.connection_interval, 0x18);
            assert_eq!(data.supervision_timeout, 0x48);
        }
        received => panic!("unexpected messages {:?}", received),
    }

    session.feed(&packets::disconnection_complete(0x0040)).unwrap();

    assert!(!session.is_connection_open(handle(0x0040)));

    assert_eq!(session.get_open_connections().count(), 0);
}

#[test]
fn connection_limit() {
    let config = blelink_hci_interface::SessionConfigBuilder::new()
        .set_max_connections(1)
        .build();

    let mut session = create_session(config);

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    session.feed(&packets::le_connection_complete(0x0002)).unwrap();

    assert_eq!(session.get_open_connections().collect::<Vec<_>>(), [handle(0x0001)]);

    // both events are still dispatched
    assert_eq!(session.get_upper().events().count(), 2);
}

#[test]
fn event_split_across_reads() {
    let mut session = create_session(SessionConfig::default());

    let packet = packets::le_connection_complete(0x0002);

    for byte in packet.iter() {
        session.feed(core::slice::from_ref(byte)).unwrap();
    }

    assert!(session.is_connection_open(handle(0x0002)));

    assert_eq!(session.get_stats().events_dispatched, 1);
}
