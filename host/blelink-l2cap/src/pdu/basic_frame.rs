//! L2CAP Basic Frame Implementation

use crate::channels::ChannelIdentifier;
use crate::pdu::FragmentationError;
use crate::{FragmentKind, L2capFragment};
use alloc::vec::Vec;
use core::ops::Deref;

/// Basic information frame
///
/// The simplest PDU of L2CAP is the basic information frame (B-frame). A B-frame consists of just
/// the length of the payload, the channel identifier, and the payload. The maximum size of a
/// payload is 65535 bytes and the minimum is 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicFrame<T> {
    channel_id: ChannelIdentifier,
    payload: T,
}

impl<T> BasicFrame<T> {
    /// The number of bytes within a Basic Info frame header.
    pub const HEADER_SIZE: usize = 4;

    /// Create a new `BasicFrame`
    pub fn new(payload: T, channel_id: ChannelIdentifier) -> Self {
        BasicFrame { channel_id, payload }
    }

    /// Get the channel identifier for this `BasicFrame`
    pub fn get_channel_id(&self) -> ChannelIdentifier {
        self.channel_id
    }

    /// Get the payload within this `BasicFrame`
    pub fn get_payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T> BasicFrame<T>
where
    T: Deref<Target = [u8]>,
{
    /// Get the header of this frame
    pub fn header(&self) -> [u8; 4] {
        let [l0, l1] = (self.payload.len() as u16).to_le_bytes();

        let [c0, c1] = self.channel_id.to_val().to_le_bytes();

        [l0, l1, c0, c1]
    }

    /// Get the length of this frame once it is packed
    pub fn packed_len(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }

    /// Create fragments of this frame
    ///
    /// Every fragment is at most `fragmentation_size` bytes. The first fragment starts with the
    /// header of the frame and is either a flushable or a non-flushable starting fragment depending
    /// on `flushable`. Every following fragment is a continuing fragment.
    ///
    /// # Errors
    /// 1) The input `fragmentation_size` is zero.
    /// 2) The payload is larger than the maximum payload size of a basic frame
    pub fn fragments(
        &self,
        fragmentation_size: usize,
        flushable: bool,
    ) -> Result<FragmentationIterator<'_, T>, FragmentationError> {
        if fragmentation_size == 0 {
            Err(FragmentationError::FragmentationSizeIsZero)
        } else if self.payload.len() > <u16>::MAX.into() {
            Err(FragmentationError::DataForTypeIsTooLarge)
        } else {
            let start_kind = if flushable {
                FragmentKind::StartFlushable
            } else {
                FragmentKind::StartNonFlushable
            };

            Ok(FragmentationIterator {
                header: self.header(),
                b_frame: self,
                fragmentation_size,
                start_kind,
                offset: 0,
            })
        }
    }
}

impl BasicFrame<Vec<u8>> {
    /// Try to create a `BasicFrame` from a complete packed frame
    pub fn try_from_slice(data: &[u8]) -> Result<Self, BasicFrameError> {
        if data.len() < Self::HEADER_SIZE {
            return Err(BasicFrameError::RawDataTooSmall);
        }

        let len = <u16>::from_le_bytes([data[0], data[1]]) as usize;

        let channel_id = ChannelIdentifier::from_raw(<u16>::from_le_bytes([data[2], data[3]]));

        if data.len() - Self::HEADER_SIZE != len {
            return Err(BasicFrameError::PayloadLengthIncorrect);
        }

        Ok(BasicFrame::new(data[Self::HEADER_SIZE..].to_vec(), channel_id))
    }
}

impl<T> core::fmt::Display for BasicFrame<T>
where
    T: Deref<Target = [u8]>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "Basic Info Frame {{ channel id: {}, payload: {:x?} }}",
            self.channel_id,
            self.payload.deref()
        )
    }
}

impl<T> From<BasicFrame<T>> for Vec<u8>
where
    T: Deref<Target = [u8]>,
{
    fn from(frame: BasicFrame<T>) -> Vec<u8> {
        let mut v = Vec::with_capacity(frame.packed_len());

        v.extend_from_slice(&frame.header());

        v.extend_from_slice(&frame.payload);

        v
    }
}

/// Basic Frame Errors
///
/// These are errors that can occur when trying to translate raw data into a L2CAP basic information
/// frame.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BasicFrameError {
    /// Raw data is too small for a basic frame
    RawDataTooSmall,
    /// Specified payload length didn't match the actual payload length
    PayloadLengthIncorrect,
}

impl core::fmt::Display for BasicFrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            BasicFrameError::RawDataTooSmall => f.write_str("raw data is too small for a basic frame"),
            BasicFrameError::PayloadLengthIncorrect => {
                f.write_str("specified payload length didn't match the actual payload length")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BasicFrameError {}

/// Iterator over the fragments of a basic frame
///
/// This is created by the method [`BasicFrame::fragments`].
pub struct FragmentationIterator<'a, T> {
    b_frame: &'a BasicFrame<T>,
    header: [u8; 4],
    fragmentation_size: usize,
    start_kind: FragmentKind,
    offset: usize,
}

impl<T> FragmentationIterator<'_, T>
where
    T: Deref<Target = [u8]>,
{
    /// Get the number of bytes of the frame that have not been put into a fragment
    pub fn remaining_len(&self) -> usize {
        self.b_frame.packed_len() - self.offset
    }
}

impl<T> Iterator for FragmentationIterator<'_, T>
where
    T: Deref<Target = [u8]>,
{
    type Item = L2capFragment<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        const HEADER_SIZE: usize = 4;

        let total = self.b_frame.packed_len();

        if self.offset >= total {
            return None;
        }

        let end = core::cmp::min(self.offset + self.fragmentation_size, total);

        let mut data = Vec::with_capacity(end - self.offset);

        if self.offset < HEADER_SIZE {
            data.extend_from_slice(&self.header[self.offset..end.min(HEADER_SIZE)]);
        }

        let payload_start = self.offset.max(HEADER_SIZE) - HEADER_SIZE;

        let payload_end = end.saturating_sub(HEADER_SIZE);

        if payload_end > payload_start {
            data.extend_from_slice(&self.b_frame.payload[payload_start..payload_end]);
        }

        let kind = if self.offset == 0 {
            self.start_kind
        } else {
            FragmentKind::Continuing
        };

        self.offset = end;

        Some(L2capFragment::new(kind, data))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining_len();

        let count = (remaining + self.fragmentation_size - 1) / self.fragmentation_size;

        (count, Some(count))
    }
}

impl<T> ExactSizeIterator for FragmentationIterator<'_, T> where T: Deref<Target = [u8]> {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fragment_with_header_split() {
        let frame = BasicFrame::new(vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9], ChannelIdentifier::AttributeProtocol);

        let fragments: Vec<_> = frame.fragments(5, false).unwrap().collect();

        assert_eq!(fragments.len(), 3);

        assert_eq!(fragments[0], L2capFragment::new(FragmentKind::StartNonFlushable, vec![10, 0, 4, 0, 0]));

        assert_eq!(fragments[1], L2capFragment::new(FragmentKind::Continuing, vec![1, 2, 3, 4, 5]));

        assert_eq!(fragments[2], L2capFragment::new(FragmentKind::Continuing, vec![6, 7, 8, 9]));
    }

    #[test]
    fn fragment_smaller_than_header() {
        let frame = BasicFrame::new(vec![0xAA], ChannelIdentifier::SecurityManager);

        let fragments: Vec<_> = frame.fragments(3, true).unwrap().collect();

        assert_eq!(fragments[0], L2capFragment::new(FragmentKind::StartFlushable, vec![1, 0, 6]));

        assert_eq!(fragments[1], L2capFragment::new(FragmentKind::Continuing, vec![0, 0xAA]));
    }

    #[test]
    fn fragment_count_hint() {
        let frame = BasicFrame::new(vec![0; 20], ChannelIdentifier::AttributeProtocol);

        let iter = frame.fragments(8, false).unwrap();

        assert_eq!(iter.len(), 3);

        assert_eq!(iter.count(), 3);
    }

    #[test]
    fn zero_fragmentation_size() {
        let frame = BasicFrame::new(vec![0; 20], ChannelIdentifier::AttributeProtocol);

        assert!(matches!(
            frame.fragments(0, false),
            Err(FragmentationError::FragmentationSizeIsZero)
        ));
    }

    #[test]
    fn from_slice() {
        let frame = BasicFrame::try_from_slice(&[2, 0, 5, 0, 0xA, 0xB]).unwrap();

        assert_eq!(frame.get_channel_id(), ChannelIdentifier::LeSignaling);

        assert_eq!(frame.get_payload(), &vec![0xA, 0xB]);

        assert_eq!(
            BasicFrame::try_from_slice(&[3, 0, 5, 0, 0xA, 0xB]),
            Err(BasicFrameError::PayloadLengthIncorrect)
        );

        assert_eq!(BasicFrame::try_from_slice(&[3, 0]), Err(BasicFrameError::RawDataTooSmall));
    }
}
