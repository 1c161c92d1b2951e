//! Conversion between HCI ACL data packets and L2CAP fragments

use crate::acl::{AclBroadcastFlag, AclPacketBoundary, HciAclData};
use alloc::vec::Vec;
use blelink_hci_util::ConnectionHandle;
use blelink_l2cap::pdu::{BasicFrame, FragmentationError};
use blelink_l2cap::{FragmentKind, L2capFragment};
use core::ops::Deref;

impl From<FragmentKind> for AclPacketBoundary {
    fn from(kind: FragmentKind) -> Self {
        match kind {
            FragmentKind::StartNonFlushable => AclPacketBoundary::FirstNonFlushable,
            FragmentKind::StartFlushable => AclPacketBoundary::FirstAutoFlushable,
            FragmentKind::Continuing => AclPacketBoundary::ContinuingFragment,
        }
    }
}

impl From<AclPacketBoundary> for FragmentKind {
    fn from(flag: AclPacketBoundary) -> Self {
        match flag {
            AclPacketBoundary::FirstNonFlushable => FragmentKind::StartNonFlushable,
            AclPacketBoundary::FirstAutoFlushable | AclPacketBoundary::CompleteL2capPdu => FragmentKind::StartFlushable,
            AclPacketBoundary::ContinuingFragment => FragmentKind::Continuing,
        }
    }
}

impl<T> HciAclData<T>
where
    T: Deref<Target = [u8]>,
{
    /// Convert the payload of this packet into a L2CAP fragment
    pub fn into_l2cap_fragment(self) -> L2capFragment<T> {
        let kind = self.get_packet_boundary_flag().into();

        L2capFragment::new(kind, self.into_payload())
    }
}

/// Fragment a basic frame into HCI ACL data packets for the connection `handle`
///
/// The payload of every packet is at most `max_payload` bytes.
pub fn fragment_frame<T>(
    handle: ConnectionHandle,
    frame: &BasicFrame<T>,
    max_payload: usize,
    flushable: bool,
) -> Result<Vec<HciAclData<Vec<u8>>>, FragmentationError>
where
    T: Deref<Target = [u8]>,
{
    let fragment_size = core::cmp::min(max_payload, <u16>::MAX.into());

    frame
        .fragments(fragment_size, flushable)?
        .map(|fragment| {
            let flag = fragment.get_kind().into();

            HciAclData::try_new(handle, flag, AclBroadcastFlag::NoBroadcast, fragment.into_inner())
                .map_err(|_| FragmentationError::DataForTypeIsTooLarge)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use blelink_l2cap::reassembly::ReassemblyState;
    use blelink_l2cap::ChannelIdentifier;

    #[test]
    fn fragments_to_acl_packets_and_back() {
        let handle = ConnectionHandle::try_from(0x0002u16).unwrap();

        let payload: Vec<u8> = (0..40).collect();

        let frame = BasicFrame::new(payload, ChannelIdentifier::from_raw(ChannelIdentifier::ATT_CID));

        let packets = fragment_frame(handle, &frame, HciAclData::<()>::MIN_MAX_PAYLOAD_SIZE, false).unwrap();

        assert_eq!(packets.len(), 2);

        assert_eq!(packets[0].get_packet_boundary_flag(), AclPacketBoundary::FirstNonFlushable);

        assert_eq!(packets[1].get_packet_boundary_flag(), AclPacketBoundary::ContinuingFragment);

        assert_eq!(packets[1].get_payload().len(), 44 - 27);

        let mut state = ReassemblyState::new();

        let mut recombined = None;

        for packet in packets {
            let packet = packet.to_packet();

            let fragment = HciAclData::try_from_packet(&packet).unwrap().into_l2cap_fragment();

            recombined = state.push(&fragment).unwrap();
        }

        assert_eq!(recombined, Some(frame));
    }

    #[test]
    fn flushable_start() {
        let handle = ConnectionHandle::try_from(0x0002u16).unwrap();

        let frame = BasicFrame::new(vec![1, 2, 3], ChannelIdentifier::from_raw(ChannelIdentifier::SM_CID));

        let packets = fragment_frame(handle, &frame, 100, true).unwrap();

        assert_eq!(packets.len(), 1);

        assert_eq!(packets[0].get_packet_boundary_flag(), AclPacketBoundary::FirstAutoFlushable);
    }

    #[test]
    fn zero_payload_size() {
        let handle = ConnectionHandle::try_from(0x0002u16).unwrap();

        let frame = BasicFrame::new(vec![1], ChannelIdentifier::from_raw(ChannelIdentifier::SM_CID));

        assert_eq!(
            fragment_frame(handle, &frame, 0, false),
            Err(FragmentationError::FragmentationSizeIsZero)
        );
    }
}
