//! Logical Link Control and Adaption Protocol
//!
//! This is the part of L2CAP that sits directly on top of the HCI. An L2CAP frame (a [`BasicFrame`])
//! is usually larger than what the controller accepts within a single ACL data packet so it is
//! broken into [`L2capFragment`]s when sent and recombined from them when received.
//!
//! * [`pdu`] contains the basic frame, its fragmentation, and the codec for the PDUs carried over
//!   the LE fixed channels (signaling, security manager, and attribute protocol).
//! * [`reassembly`] contains the per connection recombination of received fragments.
//! * [`router`] resolves which protocol a recombined frame belongs to.
//!
//! Only the LE-U logical link is supported.
//!
//! [`BasicFrame`]: pdu::BasicFrame

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod channels;
pub mod pdu;
pub mod reassembly;
pub mod router;

pub use channels::ChannelIdentifier;

/// The kind of a fragment
///
/// A frame is sent as one starting fragment followed by zero or more continuing fragments. The
/// two kinds of starting fragments only differ in whether the controller is allowed to flush the
/// frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    StartNonFlushable,
    StartFlushable,
    Continuing,
}

impl FragmentKind {
    /// Check if this is either kind of starting fragment
    pub fn is_start(&self) -> bool {
        !matches!(self, FragmentKind::Continuing)
    }
}

/// A L2CAP PDU fragment
///
/// This is the part of a L2CAP frame that is carried by a single ACL data packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2capFragment<T> {
    kind: FragmentKind,
    data: T,
}

impl<T> L2capFragment<T> {
    /// Create a new `L2capFragment`
    pub fn new(kind: FragmentKind, data: T) -> Self {
        L2capFragment { kind, data }
    }

    /// Get the kind of fragment
    pub fn get_kind(&self) -> FragmentKind {
        self.kind
    }

    /// Check if this is the starting fragment of a frame
    pub fn is_start_fragment(&self) -> bool {
        self.kind.is_start()
    }

    pub fn get_data(&self) -> &T {
        &self.data
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}
