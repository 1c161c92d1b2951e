//! Recombination of received fragments
//!
//! Fragments of a frame arrive in order within a connection, but fragments of different
//! connections interleave. A [`ReassemblyState`] recombines the frames of one connection and a
//! [`Reassembler`] keeps one state per connection.
//!
//! The length within the L2CAP header is the only integrity check of a frame. While a frame is
//! being recombined the number of bytes written plus the number of bytes still expected always
//! equals the length within the header. A fragment that carries more bytes than are expected is
//! a frame overrun and the partially recombined frame is discarded.

use crate::channels::ChannelIdentifier;
use crate::pdu::BasicFrame;
use crate::L2capFragment;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;
use core::ops::Deref;

/// Errors of recombining fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblyError {
    /// A starting fragment was received while a frame was being recombined. The partial frame
    /// was discarded and a new frame was started with the fragment.
    UnexpectedStart,
    /// A continuing fragment was received while no frame was being recombined. The fragment was
    /// dropped.
    UnexpectedContinuation,
    /// A fragment contained more bytes than what was remaining for the frame. The partial frame
    /// was discarded.
    FrameOverrun,
}

impl fmt::Display for ReassemblyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReassemblyError::UnexpectedStart => {
                f.write_str("received a starting fragment before the previous frame was complete")
            }
            ReassemblyError::UnexpectedContinuation => {
                f.write_str("received a continuing fragment without a starting fragment")
            }
            ReassemblyError::FrameOverrun => f.write_str("fragment is larger than the remaining length of the frame"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ReassemblyError {}

/// Recombination state of a single connection
#[derive(Debug, Default)]
pub struct ReassemblyState {
    header: [u8; 4],
    header_len: usize,
    channel_id: Option<ChannelIdentifier>,
    total_len: u16,
    expected_remaining_len: u16,
    write_offset: u16,
    buffer: Vec<u8>,
    in_progress: bool,
}

impl ReassemblyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a frame is being recombined
    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Get the channel of the frame being recombined
    ///
    /// This is `None` until the complete L2CAP header is received.
    pub fn get_channel_id(&self) -> Option<ChannelIdentifier> {
        self.channel_id
    }

    /// Get the number of payload bytes still expected for the frame being recombined
    pub fn get_expected_remaining_len(&self) -> u16 {
        self.expected_remaining_len
    }

    /// Discard any partially recombined frame
    pub fn discard(&mut self) {
        *self = Self::default();
    }

    fn invariant_holds(&self) -> bool {
        self.write_offset as usize + self.expected_remaining_len as usize == self.total_len as usize
            && self.buffer.len() == self.write_offset as usize
    }

    /// Process a fragment
    ///
    /// A complete frame is returned when the fragment completes it. A starting fragment always
    /// begins a new frame, any partially recombined frame is discarded.
    ///
    /// # Errors
    /// * `UnexpectedContinuation` when `fragment` is a continuing fragment and no frame is being
    ///   recombined. The state is not changed.
    /// * `FrameOverrun` when `fragment` has more bytes than what remains of the frame. The
    ///   partial frame is discarded.
    pub fn push<T>(&mut self, fragment: &L2capFragment<T>) -> Result<Option<BasicFrame<Vec<u8>>>, ReassemblyError>
    where
        T: Deref<Target = [u8]>,
    {
        if fragment.is_start_fragment() {
            self.discard();

            self.in_progress = true;
        } else if !self.in_progress {
            return Err(ReassemblyError::UnexpectedContinuation);
        }

        let mut data: &[u8] = fragment.get_data();

        if self.channel_id.is_none() {
            let take = core::cmp::min(BasicFrame::<Vec<u8>>::HEADER_SIZE - self.header_len, data.len());

            self.header[self.header_len..self.header_len + take].copy_from_slice(&data[..take]);

            self.header_len += take;

            data = &data[take..];

            if self.header_len < BasicFrame::<Vec<u8>>::HEADER_SIZE {
                return Ok(None);
            }

            self.total_len = <u16>::from_le_bytes([self.header[0], self.header[1]]);

            self.channel_id = Some(ChannelIdentifier::from_raw(<u16>::from_le_bytes([
                self.header[2],
                self.header[3],
            ])));

            self.expected_remaining_len = self.total_len;

            self.buffer = Vec::with_capacity(self.total_len.into());
        }

        if data.len() > self.expected_remaining_len.into() {
            log::warn!(
                "(L2CAP) fragment of {} bytes overruns frame with {} bytes remaining",
                data.len(),
                self.expected_remaining_len
            );

            self.discard();

            return Err(ReassemblyError::FrameOverrun);
        }

        self.buffer.extend_from_slice(data);

        self.write_offset += data.len() as u16;

        self.expected_remaining_len -= data.len() as u16;

        debug_assert!(self.invariant_holds());

        if self.expected_remaining_len == 0 {
            let channel_id = self.channel_id.unwrap_or(ChannelIdentifier::Unassigned(0));

            let payload = core::mem::take(&mut self.buffer);

            self.discard();

            Ok(Some(BasicFrame::new(payload, channel_id)))
        } else {
            Ok(None)
        }
    }
}

/// Counters of a [`Reassembler`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReassemblyStats {
    pub completed: usize,
    pub unexpected_start: usize,
    pub unexpected_continuation: usize,
    pub frame_overrun: usize,
}

/// Recombination for multiple connections
///
/// There is a [`ReassemblyState`] for every connection that has a frame being recombined. The
/// states are independent of each other, a fragment only ever changes the state of its own
/// connection.
#[derive(Debug)]
pub struct Reassembler<K> {
    states: BTreeMap<K, ReassemblyState>,
    stats: ReassemblyStats,
}

impl<K> Default for Reassembler<K> {
    fn default() -> Self {
        Reassembler {
            states: BTreeMap::new(),
            stats: ReassemblyStats::default(),
        }
    }
}

impl<K> Reassembler<K>
where
    K: Ord + Copy + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a fragment for the connection `key`
    ///
    /// A starting fragment received while a frame is being recombined is a protocol violation,
    /// it is logged and counted but the fragment is still used to start a new frame.
    pub fn push<T>(
        &mut self,
        key: K,
        fragment: &L2capFragment<T>,
    ) -> Result<Option<BasicFrame<Vec<u8>>>, ReassemblyError>
    where
        T: Deref<Target = [u8]>,
    {
        if !fragment.is_start_fragment() && !self.states.contains_key(&key) {
            log::warn!("(L2CAP) {:?}: {}", key, ReassemblyError::UnexpectedContinuation);

            self.stats.unexpected_continuation += 1;

            return Err(ReassemblyError::UnexpectedContinuation);
        }

        let state = self.states.entry(key).or_default();

        if fragment.is_start_fragment() && state.is_in_progress() {
            log::warn!("(L2CAP) {:?}: {}", key, ReassemblyError::UnexpectedStart);

            self.stats.unexpected_start += 1;
        }

        let result = state.push(fragment);

        match &result {
            Ok(None) => (),
            Ok(Some(_)) => {
                self.stats.completed += 1;

                self.states.remove(&key);
            }
            Err(e) => {
                if let ReassemblyError::FrameOverrun = e {
                    self.stats.frame_overrun += 1;
                }

                self.states.remove(&key);
            }
        }

        result
    }

    /// Remove the state for `key`
    ///
    /// `true` is returned if a partially recombined frame was discarded.
    pub fn remove(&mut self, key: K) -> bool {
        self.states.remove(&key).map(|state| state.is_in_progress()).unwrap_or_default()
    }

    /// Remove the state of every connection
    pub fn clear(&mut self) {
        self.states.clear()
    }

    /// Check if a frame is being recombined for `key`
    pub fn is_in_progress(&self, key: K) -> bool {
        self.states.get(&key).map(|state| state.is_in_progress()).unwrap_or_default()
    }

    /// Get the state for `key`
    pub fn get_state(&self, key: K) -> Option<&ReassemblyState> {
        self.states.get(&key)
    }

    pub fn stats(&self) -> ReassemblyStats {
        self.stats
    }
}
