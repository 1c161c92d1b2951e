//! Property tests over the receive path of a session

use blelink_hci_host::AclPacketBoundary;
use blelink_hci_interface::SessionConfigBuilder;
use blelink_host_tests::{complete_writes, create_session, handle, packets};
use blelink_l2cap::pdu::att::AttPdu;
use blelink_l2cap::pdu::L2capPdu;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

#[quickcheck]
fn pdu_survives_fragmentation(value: Vec<u8>, max_payload: u8) -> TestResult {
    if max_payload == 0 {
        return TestResult::discard();
    }

    let pdu = L2capPdu::Attribute(AttPdu::WriteCommand {
        handle: 0x0010,
        value,
    });

    let config = SessionConfigBuilder::new()
        .set_max_acl_payload(max_payload.into())
        .build();

    let mut sender = create_session(config);

    let mut receiver = create_session(Default::default());

    for session in [&mut sender, &mut receiver] {
        session.feed(&packets::le_connection_complete(0x0001)).unwrap();
    }

    sender.send_l2cap(handle(0x0001), &pdu).unwrap();

    for packet in complete_writes(&mut sender) {
        if packet.len() - 5 > max_payload.into() {
            return TestResult::failed();
        }

        receiver.feed(&packet).unwrap();
    }

    let received = receiver.get_upper().frames().cloned().collect::<Vec<_>>();

    TestResult::from_bool(received == [pdu])
}

#[quickcheck]
fn arbitrary_bytes_never_stall_receiver(bytes: Vec<u8>) -> bool {
    let mut session = create_session(Default::default());

    session.feed(&bytes).unwrap();

    session.get_requested_len() > 0
}

#[quickcheck]
fn chunking_does_not_change_messages(splits: Vec<u8>) -> bool {
    let mut stream = packets::le_connection_complete(0x0001);

    stream.extend(packets::command_complete(1, packets::RESET, &[0x00]));

    stream.extend(packets::acl(
        0x0001,
        AclPacketBoundary::FirstNonFlushable,
        &packets::basic_frame(0x0004, &[0x1B, 0x03, 0x00, 0xAA, 0xBB]),
    ));

    let mut whole = create_session(Default::default());

    whole.feed(&stream).unwrap();

    let mut chunked = create_session(Default::default());

    let mut rest = stream.as_slice();

    for split in splits {
        let (chunk, remaining) = rest.split_at(core::cmp::min(split.into(), rest.len()));

        chunked.feed(chunk).unwrap();

        rest = remaining;
    }

    chunked.feed(rest).unwrap();

    whole.get_upper().get_received() == chunked.get_upper().get_received()
        && whole.get_upper().get_received().len() == 3
}
