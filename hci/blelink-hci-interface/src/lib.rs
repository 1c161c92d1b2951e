//! Implementation for the interface between the host and controller
//!
//! A [`TransportSession`] sits between a raw byte transport (usually a UART) and the layers of the
//! host above the HCI. Bytes received from the controller are framed into packets, commands and
//! events are unpacked and dispatched upward, and ACL data is recombined into L2CAP frames before
//! being routed to the protocol owning the channel. In the other direction, messages sent through
//! the session are packed, fragmented when necessary, and queued for the transport.
//!
//! # The Physical Interface
//! The session does not drive the physical interface itself. A driver implements [`Transport`]
//! and reports back to the session whenever the bytes it was asked for have arrived (see
//! [`on_received`]) and whenever a write has finished (see [`on_write_complete`]). When the driver
//! cannot deliver exactly the number of bytes requested, the method [`feed`] accepts any chunk of
//! the byte stream.
//!
//! ## Flow Control
//! Only one write is outstanding at a time. Commands are only written while the controller has
//! command credit, which is set by the *num HCI command packets* field of every Command Complete
//! and Command Status event. ACL data is only written while the controller has free buffers once
//! the buffer count is known from the Command Complete event of the *LE Read Buffer Size*
//! command. Packets waiting for credit hold back every packet queued after them. A packet the
//! transport fails to write stays at the front of the queue and the received bytes are processed
//! regardless of the failure.
//!
//! ## Protocol Violations
//! Violations of the protocol are never returned to the caller. Packets that are not understood
//! are discarded and the receiver continues with the next packet. The only condition that
//! resets the session is a command or event that must be discarded but is longer than the
//! configured trash capacity. Discarded ACL data is always skipped for the length within its
//! header.
//!
//! [`on_received`]: TransportSession::on_received
//! [`on_write_complete`]: TransportSession::on_write_complete
//! [`feed`]: TransportSession::feed

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

mod config;
mod error;
mod rx;
mod session;

pub use blelink_hci_host::{Command, DestinationTask, Event};
pub use blelink_hci_util::events::MessageId;
pub use blelink_hci_util::ConnectionHandle;
pub use blelink_l2cap::pdu::L2capPdu;
pub use blelink_l2cap::router::Destination;
pub use blelink_l2cap::ChannelIdentifier;
pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{ConnectionError, FramingError, SendError};
pub use session::{RxState, SessionStats, TransportSession, TxState};

/// The driver of the physical interface
pub trait Transport {
    type Error;

    /// Start receiving `len` bytes
    ///
    /// The received bytes are handed back to the session with
    /// [`on_received`](TransportSession::on_received).
    fn start_receive(&mut self, len: usize);

    /// Start writing `bytes`
    ///
    /// The completion of the write is reported back to the session with
    /// [`on_write_complete`](TransportSession::on_write_complete).
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// The layers of the host above the HCI
pub trait UpperLayer {
    /// A command was received
    fn dispatch_command(&mut self, opcode: u16, command: Command);

    /// An event was received
    ///
    /// `destination` is the task that owns the event according to the registry.
    fn dispatch_event(&mut self, msg_id: MessageId, destination: DestinationTask, event: Event);

    /// A L2CAP PDU was recombined for the connection `handle`
    fn deliver_l2cap_frame(
        &mut self,
        handle: ConnectionHandle,
        channel_id: ChannelIdentifier,
        destination: Destination,
        pdu: L2capPdu,
    );
}
