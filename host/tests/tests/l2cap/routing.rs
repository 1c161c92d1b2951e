//! Tests for routing recombined frames to the protocols of the fixed channels

use blelink_hci_host::{AclPacketBoundary, HciAclData};
use blelink_hci_interface::{ChannelIdentifier, Destination, FramingError};
use blelink_host_tests::{complete_writes, create_session, handle, packets, Received, TestSession};
use blelink_l2cap::pdu::signals::{CommandRejectReason, SignalingPdu};
use blelink_l2cap::pdu::sm::SecurityManagerPdu;
use blelink_l2cap::pdu::{BasicFrame, L2capPdu, PduError};
use core::num::NonZeroU8;

fn connected_session() -> TestSession {
    let mut session = create_session(Default::default());

    session.feed(&packets::le_connection_complete(0x0001)).unwrap();

    session.get_mut_upper().take_received();

    session
}

fn receive_frame(session: &mut TestSession, channel_id: u16, payload: &[u8]) {
    let frame = packets::basic_frame(channel_id, payload);

    session
        .feed(&packets::acl(0x0001, AclPacketBoundary::FirstNonFlushable, &frame))
        .unwrap();
}

/// Unpack the L2CAP PDU within a written packet
fn sent_pdu(packet: &[u8]) -> L2capPdu {
    assert_eq!(packet[0], 0x02, "not an ACL data packet");

    let acl_data = HciAclData::try_from_packet(&packet[1..]).unwrap();

    let frame = BasicFrame::try_from_slice(acl_data.get_payload()).unwrap();

    L2capPdu::try_from_frame(&frame).unwrap()
}

#[test]
fn security_manager_frame() {
    let mut session = connected_session();

    receive_frame(&mut session, 0x0006, &[0x05, 0x08]);

    assert_eq!(
        session.get_upper().get_received(),
        [Received::Frame {
            handle: handle(0x0001),
            channel_id: ChannelIdentifier::SecurityManager,
            destination: Destination::SecurityManager,
            pdu: L2capPdu::SecurityManager(SecurityManagerPdu::PairingFailed { reason: 0x08 }),
        }]
    );
}

#[test]
fn signaling_frame() {
    let mut session = connected_session();

    receive_frame(&mut session, 0x0005, &[0x06, 0x03, 0x04, 0x00, 0x40, 0x00, 0x41, 0x00]);

    match session.get_upper().get_received() {
        [Received::Frame {
            destination: Destination::Signaling,
            pdu: L2capPdu::Signaling(SignalingPdu::DisconnectionRequest { identifier, .. }),
            ..
        }] => assert_eq!(identifier.get(), 3),
        received => panic!("unexpected messages {:?}", received),
    }

    assert!(complete_writes(&mut session).is_empty());
}

#[test]
fn unsupported_channel_is_rejected() {
    let mut session = connected_session();

    receive_frame(&mut session, 0x0040, &[0x01, 0x02]);

    assert!(session.get_upper().get_received().is_empty());

    assert_eq!(
        session.get_last_error(),
        Some(FramingError::Pdu(PduError::InvalidCid(ChannelIdentifier::Dynamic(0x0040))))
    );

    let written = complete_writes(&mut session);

    assert_eq!(written.len(), 1);

    match sent_pdu(&written[0]) {
        L2capPdu::Signaling(SignalingPdu::CommandReject {
            reason: CommandRejectReason::InvalidCidInRequest { local_cid, .. },
            ..
        }) => assert_eq!(local_cid, 0x0040),
        pdu => panic!("unexpected PDU {:?}", pdu),
    }

    assert_eq!(session.get_stats().pdu_rejected, 1);
}

#[test]
fn unknown_signal_is_rejected_with_its_identifier() {
    let mut session = connected_session();

    receive_frame(&mut session, 0x0005, &[0x7F, 0x07, 0x00, 0x00]);

    let written = complete_writes(&mut session);

    assert_eq!(written.len(), 1);

    assert_eq!(
        sent_pdu(&written[0]),
        L2capPdu::Signaling(SignalingPdu::CommandReject {
            identifier: NonZeroU8::new(7).unwrap(),
            reason: CommandRejectReason::CommandNotUnderstood,
        })
    );
}

#[test]
fn unknown_attribute_opcode_is_rejected() {
    let mut session = connected_session();

    receive_frame(&mut session, 0x0004, &[0x7F, 0x00]);

    let written = complete_writes(&mut session);

    assert_eq!(written.len(), 1);

    match sent_pdu(&written[0]) {
        L2capPdu::Signaling(SignalingPdu::CommandReject {
            reason: CommandRejectReason::CommandNotUnderstood,
            ..
        }) => (),
        pdu => panic!("unexpected PDU {:?}", pdu),
    }
}

#[test]
fn malformed_frame_is_dropped() {
    let mut session = connected_session();

    // a write request without a complete handle
    receive_frame(&mut session, 0x0004, &[0x12, 0x2A]);

    assert!(session.get_upper().get_received().is_empty());

    assert!(complete_writes(&mut session).is_empty());

    assert_eq!(session.get_stats().pdu_dropped, 1);

    assert_eq!(
        session.get_last_error(),
        Some(FramingError::Pdu(PduError::InvalidLength { code: 0x12 }))
    );
}
