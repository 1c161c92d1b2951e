//! Tests for the fragmentation and recombination of L2CAP frames

use blelink_hci_host::AclPacketBoundary;
use blelink_hci_interface::{ChannelIdentifier, Destination, SendError, SessionConfigBuilder};
use blelink_host_tests::{complete_writes, create_session, handle, packets, Received};
use blelink_l2cap::pdu::att::AttPdu;
use blelink_l2cap::pdu::L2capPdu;

fn write_request() -> L2capPdu {
    L2capPdu::Attribute(AttPdu::WriteRequest {
        handle: 0x002A,
        value: vec![0xAA, 0xBB],
    })
}

#[test]
fn send_fragmented_write_request() {
    let config = SessionConfigBuilder::new().set_max_acl_payload(2).build();

    let mut sender = create_session(config);

    sender.feed(&packets::le_connection_complete(0x0001)).unwrap();

    sender.send_l2cap(handle(0x0001), &write_request()).unwrap();

    let written = complete_writes(&mut sender);

    assert_eq!(
        written,
        [
            vec![0x02, 0x01, 0x00, 0x02, 0x00, 0x05, 0x00],
            vec![0x02, 0x01, 0x10, 0x02, 0x00, 0x04, 0x00],
            vec![0x02, 0x01, 0x10, 0x02, 0x00, 0x12, 0x2A],
            vec![0x02, 0x01, 0x10, 0x02, 0x00, 0x00, 0xAA],
            vec![0x02, 0x01, 0x10, 0x01, 0x00, 0xBB],
        ]
    );

    let mut receiver = create_session(Default::default());

    receiver.feed(&packets::le_connection_complete(0x0001)).unwrap();

    receiver.get_mut_upper().take_received();

    for packet in written.iter() {
        assert_eq!(receiver.get_upper().frames().count(), 0);

        receiver.feed(packet).unwrap();
    }

    assert_eq!(
        receiver.get_upper().get_received(),
        [Received::Frame {
            handle: handle(0x0001),
            channel_id: ChannelIdentifier::AttributeProtocol,
            destination: Destination::Attribute,
            pdu: write_request(),
        }]
    );

    assert!(!receiver.is_reassembling(handle(0x0001)));

    assert_eq!(receiver.get_stats().reassembly.completed, 1);
}

#[test]
fn flushable_frames() {
    let config = SessionConfigBuilder::new()
        .set_max_acl_payload(8)
        .enable_flushable_l2cap()
        .build();

    let mut session = create_session(config);

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    session.send_l2cap(handle(0x0001), &write_request()).unwrap();

    let written = complete_writes(&mut session);

    assert_eq!(written.len(), 2);

    assert_eq!(written[0][1..3], [0x01, 0x20]);

    assert_eq!(written[1][1..3], [0x01, 0x10]);
}

#[test]
fn send_to_unknown_connection() {
    let mut session = create_session(Default::default());

    assert_eq!(
        session.send_l2cap(handle(0x0001), &write_request()),
        Err(SendError::UnknownConnection(handle(0x0001)))
    );

    assert_eq!(session.get_queued(), 0);
}

#[test]
fn interleaved_connections() {
    let mut session = create_session(Default::default());

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    session.feed(&packets::le_connection_complete(0x0002)).unwrap();

    let frame_1 = packets::basic_frame(0x0004, &[0x1B, 0x03, 0x00, 0x01]);

    let frame_2 = packets::basic_frame(0x0004, &[0x1B, 0x03, 0x00, 0x02]);

    let (start_1, rest_1) = frame_1.split_at(3);

    let (start_2, rest_2) = frame_2.split_at(5);

    for (raw, boundary, data) in [
        (0x0001, AclPacketBoundary::FirstNonFlushable, start_1),
        (0x0002, AclPacketBoundary::FirstNonFlushable, start_2),
        (0x0001, AclPacketBoundary::ContinuingFragment, rest_1),
        (0x0002, AclPacketBoundary::ContinuingFragment, rest_2),
    ] {
        session.feed(&packets::acl(raw, boundary, data)).unwrap();
    }

    let handles = session
        .get_upper()
        .get_received()
        .iter()
        .filter_map(|received| match received {
            Received::Frame { handle, .. } => Some(handle.get_raw_handle()),
            _ => None,
        })
        .collect::<Vec<_>>();

    assert_eq!(handles, [0x0001, 0x0002]);
}

#[test]
fn disconnection_discards_partial_frame() {
    let mut session = create_session(Default::default());

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    let frame = packets::basic_frame(0x0004, &[0x1B, 0x03, 0x00, 0x01]);

    session
        .feed(&packets::acl(0x0001, AclPacketBoundary::FirstNonFlushable, &frame[..6]))
        .unwrap();

    assert!(session.is_reassembling(handle(0x0001)));

    session.feed(&packets::disconnection_complete(0x0001)).unwrap();

    assert!(!session.is_reassembling(handle(0x0001)));

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    session
        .feed(&packets::acl(0x0001, AclPacketBoundary::ContinuingFragment, &frame[6..]))
        .unwrap();

    assert_eq!(session.get_upper().frames().count(), 0);

    assert_eq!(session.get_stats().reassembly.unexpected_continuation, 1);
}

#[test]
fn new_start_replaces_partial_frame() {
    let mut session = create_session(Default::default());

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    let frame = packets::basic_frame(0x0004, &[0x1B, 0x03, 0x00, 0x01]);

    session
        .feed(&packets::acl(0x0001, AclPacketBoundary::FirstNonFlushable, &frame[..6]))
        .unwrap();

    session
        .feed(&packets::acl(0x0001, AclPacketBoundary::FirstNonFlushable, &frame))
        .unwrap();

    assert_eq!(session.get_stats().reassembly.unexpected_start, 1);

    assert_eq!(session.get_upper().frames().count(), 1);
}

#[test]
fn fragment_longer_than_frame() {
    let mut session = create_session(Default::default());

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    // the header declares two bytes of payload but four follow
    session
        .feed(&packets::acl(
            0x0001,
            AclPacketBoundary::FirstNonFlushable,
            &[0x02, 0x00, 0x04, 0x00, 0x1B, 0x03, 0x00, 0x01],
        ))
        .unwrap();

    assert_eq!(session.get_stats().reassembly.frame_overrun, 1);

    assert!(!session.is_reassembling(handle(0x0001)));

    assert_eq!(session.get_upper().frames().count(), 0);
}
