//! L2CAP Protocol Data Unit (PDU) implementation
//!
//! A [`BasicFrame`] is the L2CAP header and a payload. The payload of a frame sent over one of the
//! LE fixed channels is one of the PDUs of the protocol owning the channel, these are collected
//! within the tagged union [`L2capPdu`]. Every PDU starts with a one byte code that determines the
//! layout of the rest of the PDU.
//!
//! ```
//! # use blelink_l2cap::pdu::{L2capPdu, att::AttPdu};
//! # use blelink_l2cap::ChannelIdentifier;
//! let write = L2capPdu::Attribute(AttPdu::WriteRequest {
//!     handle: 0x002A,
//!     value: vec![0xAA, 0xBB],
//! });
//!
//! let (channel_id, bytes) = write.pack();
//!
//! assert_eq!(channel_id, ChannelIdentifier::AttributeProtocol);
//! assert_eq!(bytes, [0x12, 0x2A, 0x00, 0xAA, 0xBB]);
//! assert_eq!(L2capPdu::unpack(channel_id, &bytes), Ok(write));
//! ```

pub mod att;
pub mod basic_frame;
pub mod signals;
pub mod sm;

use crate::channels::ChannelIdentifier;
use alloc::vec::Vec;
pub use basic_frame::{BasicFrame, BasicFrameError, FragmentationIterator};

/// A PDU carried over one of the LE fixed channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum L2capPdu {
    Signaling(signals::SignalingPdu),
    SecurityManager(sm::SecurityManagerPdu),
    Attribute(att::AttPdu),
}

impl L2capPdu {
    /// Get the channel this PDU is sent over
    pub fn get_channel_id(&self) -> ChannelIdentifier {
        match self {
            L2capPdu::Signaling(_) => ChannelIdentifier::LeSignaling,
            L2capPdu::SecurityManager(_) => ChannelIdentifier::SecurityManager,
            L2capPdu::Attribute(_) => ChannelIdentifier::AttributeProtocol,
        }
    }

    /// Get the code of this PDU
    pub fn get_code(&self) -> u8 {
        match self {
            L2capPdu::Signaling(pdu) => pdu.get_code(),
            L2capPdu::SecurityManager(pdu) => pdu.get_code(),
            L2capPdu::Attribute(pdu) => pdu.get_opcode(),
        }
    }

    /// Pack this PDU
    ///
    /// The return is the channel the PDU is to be sent on and the bytes of the PDU.
    pub fn pack(&self) -> (ChannelIdentifier, Vec<u8>) {
        let mut bytes = Vec::new();

        match self {
            L2capPdu::Signaling(pdu) => pdu.pack_into(&mut bytes),
            L2capPdu::SecurityManager(pdu) => pdu.pack_into(&mut bytes),
            L2capPdu::Attribute(pdu) => pdu.pack_into(&mut bytes),
        }

        (self.get_channel_id(), bytes)
    }

    /// Unpack a PDU received over the channel `channel_id`
    ///
    /// # Errors
    /// * `InvalidCid` if `channel_id` is not one of the fixed channels
    /// * `UnknownPduCode` if the first byte is not a code used by the channel's protocol
    /// * `InvalidLength` or `InvalidField` if the bytes do not match the layout for the code
    pub fn unpack(channel_id: ChannelIdentifier, bytes: &[u8]) -> Result<Self, PduError> {
        match channel_id {
            ChannelIdentifier::LeSignaling => signals::SignalingPdu::unpack(bytes).map(L2capPdu::Signaling),
            ChannelIdentifier::SecurityManager => sm::SecurityManagerPdu::unpack(bytes).map(L2capPdu::SecurityManager),
            ChannelIdentifier::AttributeProtocol => att::AttPdu::unpack(bytes).map(L2capPdu::Attribute),
            other => Err(PduError::InvalidCid(other)),
        }
    }

    /// Pack this PDU into a basic frame
    pub fn into_frame(&self) -> BasicFrame<Vec<u8>> {
        let (channel_id, bytes) = self.pack();

        BasicFrame::new(bytes, channel_id)
    }

    /// Unpack the payload of a basic frame
    pub fn try_from_frame<T>(frame: &BasicFrame<T>) -> Result<Self, PduError>
    where
        T: core::ops::Deref<Target = [u8]>,
    {
        Self::unpack(frame.get_channel_id(), frame.get_payload())
    }
}

impl core::fmt::Display for L2capPdu {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            L2capPdu::Signaling(pdu) => write!(f, "signaling PDU {:#04x}", pdu.get_code()),
            L2capPdu::SecurityManager(pdu) => write!(f, "security manager PDU {:#04x}", pdu.get_code()),
            L2capPdu::Attribute(pdu) => write!(f, "attribute protocol PDU {:#04x}", pdu.get_opcode()),
        }
    }
}

/// Error for unpacking a PDU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduError {
    /// There were no bytes to unpack
    Empty,
    /// The code is not known to the protocol of the channel
    UnknownPduCode { channel_id: ChannelIdentifier, code: u8 },
    /// The channel is not one of the fixed channels
    InvalidCid(ChannelIdentifier),
    /// The number of bytes does not match the layout of the PDU
    InvalidLength { code: u8 },
    /// A field contains a value that is not allowed
    InvalidField(&'static str),
}

impl core::fmt::Display for PduError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            PduError::Empty => f.write_str("no data for a PDU"),
            PduError::UnknownPduCode { channel_id, code } => {
                write!(f, "unknown PDU code {:#04x} for channel {}", code, channel_id)
            }
            PduError::InvalidCid(channel_id) => write!(f, "no PDUs are defined for channel {}", channel_id),
            PduError::InvalidLength { code } => write!(f, "invalid length for PDU with code {:#04x}", code),
            PduError::InvalidField(field) => write!(f, "invalid value for field {}", field),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PduError {}

/// Fragmentation Error
///
/// This is returned by the method [`BasicFrame::fragments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentationError {
    /// The size of a fragment was zero.
    FragmentationSizeIsZero,
    /// The payload is larger than the length field of the header can describe
    DataForTypeIsTooLarge,
}

impl core::fmt::Display for FragmentationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FragmentationError::FragmentationSizeIsZero => f.write_str("fragmentation size cannot be zero"),
            FragmentationError::DataForTypeIsTooLarge => {
                f.write_str("data too large for the L2CAP PDU length field")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FragmentationError {}

/// Sequential reader of the fields of a PDU
///
/// Every accessor fails with `InvalidLength` for the PDU code given at creation when there are not
/// enough bytes left.
pub(crate) struct FieldReader<'a> {
    code: u8,
    bytes: &'a [u8],
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(code: u8, bytes: &'a [u8]) -> Self {
        FieldReader { code, bytes }
    }

    fn invalid_length(&self) -> PduError {
        PduError::InvalidLength { code: self.code }
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N], PduError> {
        if self.bytes.len() < N {
            return Err(self.invalid_length());
        }

        let (field, rest) = self.bytes.split_at(N);

        self.bytes = rest;

        field.try_into().map_err(|_| self.invalid_length())
    }

    pub(crate) fn u8(&mut self) -> Result<u8, PduError> {
        self.array::<1>().map(|[b]| b)
    }

    pub(crate) fn u16(&mut self) -> Result<u16, PduError> {
        self.array::<2>().map(u16::from_le_bytes)
    }

    /// Take every remaining byte
    pub(crate) fn rest(&mut self) -> Vec<u8> {
        let rest = self.bytes.to_vec();

        self.bytes = &[];

        rest
    }

    /// Finish reading, there must not be any bytes left
    pub(crate) fn finish(self) -> Result<(), PduError> {
        if self.bytes.is_empty() {
            Ok(())
        } else {
            Err(self.invalid_length())
        }
    }
}

/// Split the code from the rest of the bytes of a PDU
pub(crate) fn split_code(bytes: &[u8]) -> Result<(u8, &[u8]), PduError> {
    bytes.split_first().map(|(code, rest)| (*code, rest)).ok_or(PduError::Empty)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unpack_on_dynamic_channel() {
        assert_eq!(
            L2capPdu::unpack(ChannelIdentifier::Dynamic(0x40), &[0x12]),
            Err(PduError::InvalidCid(ChannelIdentifier::Dynamic(0x40)))
        );
    }

    #[test]
    fn unpack_empty() {
        assert_eq!(
            L2capPdu::unpack(ChannelIdentifier::AttributeProtocol, &[]),
            Err(PduError::Empty)
        );
    }

    #[test]
    fn field_reader_too_short() {
        let mut reader = FieldReader::new(0x0A, &[0x01]);

        assert_eq!(reader.u16(), Err(PduError::InvalidLength { code: 0x0A }));
    }
}
