//! HCI ACL data packets

use alloc::vec::Vec;
use blelink_hci_util::{ConnectionHandle, HciPacketType};
use core::ops::Deref;

/// The packet boundary flag
///
/// The packet boundary flag is a two bit flag within the HCI ACL data packet. It marks whether the
/// payload is the start or a continuation of a L2CAP PDU.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AclPacketBoundary {
    FirstNonFlushable,
    ContinuingFragment,
    FirstAutoFlushable,
    CompleteL2capPdu,
}

impl AclPacketBoundary {
    /// Get the value shifted into the place of the flag within the first two bytes of the header
    fn get_shifted_val(&self) -> u16 {
        (match self {
            AclPacketBoundary::FirstNonFlushable => 0x0,
            AclPacketBoundary::ContinuingFragment => 0x1,
            AclPacketBoundary::FirstAutoFlushable => 0x2,
            AclPacketBoundary::CompleteL2capPdu => 0x3,
        }) << 12
    }

    /// Get the `AclPacketBoundary` from the first two bytes of the header
    ///
    /// `val` does not need to be masked, but it must be in host byte order.
    fn from_shifted_val(val: u16) -> Self {
        match (val >> 12) & 0x3 {
            0x0 => AclPacketBoundary::FirstNonFlushable,
            0x1 => AclPacketBoundary::ContinuingFragment,
            0x2 => AclPacketBoundary::FirstAutoFlushable,
            _ => AclPacketBoundary::CompleteL2capPdu,
        }
    }
}

/// The broadcast flag
///
/// Only `NoBroadcast` is valid for a LE-U logical link.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AclBroadcastFlag {
    /// Point-to-point message
    NoBroadcast,
    /// Broadcast to all active peripherals
    BrEdrBroadcast,
}

impl AclBroadcastFlag {
    fn get_shifted_val(&self) -> u16 {
        (match self {
            AclBroadcastFlag::NoBroadcast => 0x0,
            AclBroadcastFlag::BrEdrBroadcast => 0x1,
        }) << 14
    }

    fn try_from_shifted_val(val: u16) -> Result<Self, HciAclPacketError> {
        match (val >> 14) & 0x3 {
            0x0 => Ok(AclBroadcastFlag::NoBroadcast),
            0x1 => Ok(AclBroadcastFlag::BrEdrBroadcast),
            _ => Err(HciAclPacketError::InvalidBroadcastFlag),
        }
    }
}

/// Error from a HCI ACL packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HciAclPacketError {
    PacketTooSmall,
    PayloadTooLarge,
    InvalidBroadcastFlag,
    InvalidConnectionHandle(&'static str),
    InvalidDataTotalLength,
}

impl core::fmt::Display for HciAclPacketError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            HciAclPacketError::PacketTooSmall => f.write_str("packet is too small to be a valid HCI ACL data packet"),
            HciAclPacketError::PayloadTooLarge => f.write_str("payload is larger than the maximum of a HCI ACL data packet"),
            HciAclPacketError::InvalidBroadcastFlag => f.write_str("invalid broadcast flag"),
            HciAclPacketError::InvalidConnectionHandle(reason) => {
                write!(f, "invalid connection handle, {}", reason)
            }
            HciAclPacketError::InvalidDataTotalLength => {
                f.write_str("the data total length field is larger than the received data")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HciAclPacketError {}

/// The header of a HCI ACL data packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclHeader {
    pub connection_handle: ConnectionHandle,
    pub packet_boundary_flag: AclPacketBoundary,
    pub broadcast_flag: AclBroadcastFlag,
    pub data_len: u16,
}

impl AclHeader {
    /// The size of the header following the packet indicator
    pub const SIZE: usize = 4;

    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, HciAclPacketError> {
        let (first_2_bytes, data_len) = match *bytes {
            [b0, b1, b2, b3, ..] => (<u16>::from_le_bytes([b0, b1]), <u16>::from_le_bytes([b2, b3])),
            _ => return Err(HciAclPacketError::PacketTooSmall),
        };

        let connection_handle =
            ConnectionHandle::try_from(first_2_bytes & 0xFFF).map_err(HciAclPacketError::InvalidConnectionHandle)?;

        let packet_boundary_flag = AclPacketBoundary::from_shifted_val(first_2_bytes);

        let broadcast_flag = AclBroadcastFlag::try_from_shifted_val(first_2_bytes)?;

        Ok(AclHeader {
            connection_handle,
            packet_boundary_flag,
            broadcast_flag,
            data_len,
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let first_2_bytes = self.connection_handle.get_raw_handle()
            | self.packet_boundary_flag.get_shifted_val()
            | self.broadcast_flag.get_shifted_val();

        let [b0, b1] = first_2_bytes.to_le_bytes();

        let [b2, b3] = self.data_len.to_le_bytes();

        [b0, b1, b2, b3]
    }
}

/// The HCI ACL Data Packet
///
/// HCI ACL data packets are sent between the host and controller for a specified connection. The
/// header contains a connection handle, a packet boundary flag, a broadcast flag, and the length of
/// the payload. The packet boundary flag is used for recombining a L2CAP PDU from the payloads of
/// multiple packets.
///
/// # LE-U Logical Link
/// For a LE-U logical link the packet boundary flag can be either
/// [`FirstNonFlushable`](AclPacketBoundary::FirstNonFlushable) or
/// [`ContinuingFragment`](AclPacketBoundary::ContinuingFragment) and the broadcast flag must
/// always be [`NoBroadcast`](AclBroadcastFlag::NoBroadcast).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HciAclData<T> {
    connection_handle: ConnectionHandle,
    packet_boundary_flag: AclPacketBoundary,
    broadcast_flag: AclBroadcastFlag,
    payload: T,
}

impl HciAclData<()> {
    /// The size of the header of a HCI ACL data packet
    pub const HEADER_SIZE: usize = AclHeader::SIZE;

    /// Both the host and controller must accept a HCI ACL data packet with a payload of 27 bytes
    pub const MIN_MAX_PAYLOAD_SIZE: usize = 27;
}

impl<T> HciAclData<T>
where
    T: Deref<Target = [u8]>,
{
    /// Create a new `HciAclData`
    ///
    /// # Error
    /// The payload must not be larger than the maximum `u16` number
    pub fn try_new(
        connection_handle: ConnectionHandle,
        packet_boundary_flag: AclPacketBoundary,
        broadcast_flag: AclBroadcastFlag,
        payload: T,
    ) -> Result<Self, HciAclPacketError> {
        if payload.len() > <u16>::MAX.into() {
            return Err(HciAclPacketError::PayloadTooLarge);
        }

        Ok(HciAclData {
            connection_handle,
            packet_boundary_flag,
            broadcast_flag,
            payload,
        })
    }

    pub fn get_handle(&self) -> ConnectionHandle {
        self.connection_handle
    }

    pub fn get_payload(&self) -> &T {
        &self.payload
    }

    pub fn get_packet_boundary_flag(&self) -> AclPacketBoundary {
        self.packet_boundary_flag
    }

    pub fn get_broadcast_flag(&self) -> AclBroadcastFlag {
        self.broadcast_flag
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Get the header of the packet
    pub fn get_header(&self) -> AclHeader {
        AclHeader {
            connection_handle: self.connection_handle,
            packet_boundary_flag: self.packet_boundary_flag,
            broadcast_flag: self.broadcast_flag,
            data_len: self.payload.len() as u16,
        }
    }

    /// Convert into a raw packet
    ///
    /// The returned packet does not include the packet indicator.
    pub fn to_packet(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.payload.len() + AclHeader::SIZE);

        v.extend_from_slice(&self.get_header().to_bytes());

        v.extend_from_slice(&self.payload);

        v
    }

    /// Convert into a raw packet preceded by the UART packet indicator
    pub fn to_uart_packet(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.payload.len() + AclHeader::SIZE + 1);

        v.push(HciPacketType::Acl.to_indicator());

        v.extend_from_slice(&self.get_header().to_bytes());

        v.extend_from_slice(&self.payload);

        v
    }
}

impl<'a> HciAclData<&'a [u8]> {
    /// Attempt to create a `HciAclData` from a raw packet
    ///
    /// The packet must not contain the packet indicator. Bytes past the data length are ignored.
    pub fn try_from_packet(packet: &'a [u8]) -> Result<Self, HciAclPacketError> {
        let header = AclHeader::try_from_bytes(packet)?;

        let payload = packet
            .get(AclHeader::SIZE..AclHeader::SIZE + usize::from(header.data_len))
            .ok_or(HciAclPacketError::InvalidDataTotalLength)?;

        Ok(HciAclData {
            connection_handle: header.connection_handle,
            packet_boundary_flag: header.packet_boundary_flag,
            broadcast_flag: header.broadcast_flag,
            payload,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_bit_layout() {
        let header = AclHeader::try_from_bytes(&[0x40, 0x10, 0x09, 0x00]).unwrap();

        assert_eq!(header.connection_handle.get_raw_handle(), 0x0040);
        assert_eq!(header.packet_boundary_flag, AclPacketBoundary::ContinuingFragment);
        assert_eq!(header.broadcast_flag, AclBroadcastFlag::NoBroadcast);
        assert_eq!(header.data_len, 9);

        assert_eq!(header.to_bytes(), [0x40, 0x10, 0x09, 0x00]);
    }

    #[test]
    fn reserved_broadcast_flag() {
        assert_eq!(
            AclHeader::try_from_bytes(&[0x01, 0x80, 0x00, 0x00]),
            Err(HciAclPacketError::InvalidBroadcastFlag)
        );
    }

    #[test]
    fn packet_conversion() {
        let handle = ConnectionHandle::try_from(0x0001u16).unwrap();

        let data = HciAclData::try_new(
            handle,
            AclPacketBoundary::FirstNonFlushable,
            AclBroadcastFlag::NoBroadcast,
            &[0xAAu8, 0xBB][..],
        )
        .unwrap();

        assert_eq!(data.to_uart_packet(), [0x02, 0x01, 0x00, 0x02, 0x00, 0xAA, 0xBB]);

        let packet = data.to_packet();

        let received = HciAclData::try_from_packet(&packet).unwrap();

        assert_eq!(received.get_handle(), handle);

        assert_eq!(*received.get_payload(), [0xAA, 0xBB]);
    }

    #[test]
    fn data_length_larger_than_packet() {
        assert_eq!(
            HciAclData::try_from_packet(&[0x01, 0x00, 0x05, 0x00, 0xAA]),
            Err(HciAclPacketError::InvalidDataTotalLength)
        );
    }
}
