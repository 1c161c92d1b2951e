//! Routing of recombined frames
//!
//! Every fixed channel of a LE-U logical link is owned by one protocol. A recombined frame is
//! decoded by the protocol owning its channel and handed to the layer implementing that protocol.
//! Frames that cannot be delivered are answered with a command reject sent over the signaling
//! channel.

use crate::channels::ChannelIdentifier;
use crate::pdu::signals::SignalingPdu;
use crate::pdu::{BasicFrame, L2capPdu, PduError};
use core::num::NonZeroU8;
use core::ops::Deref;

/// The protocol a frame is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Attribute,
    Signaling,
    SecurityManager,
    Unknown,
}

impl core::fmt::Display for Destination {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Destination::Attribute => f.write_str("attribute protocol"),
            Destination::Signaling => f.write_str("signaling"),
            Destination::SecurityManager => f.write_str("security manager"),
            Destination::Unknown => f.write_str("unknown"),
        }
    }
}

/// Get the destination for a channel
pub fn route(channel_id: ChannelIdentifier) -> Destination {
    match channel_id {
        ChannelIdentifier::AttributeProtocol => Destination::Attribute,
        ChannelIdentifier::LeSignaling => Destination::Signaling,
        ChannelIdentifier::SecurityManager => Destination::SecurityManager,
        ChannelIdentifier::Dynamic(_) | ChannelIdentifier::Unassigned(_) => Destination::Unknown,
    }
}

/// The outcome of routing a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The frame was decoded and is to be delivered to `destination`
    Deliver { destination: Destination, pdu: L2capPdu },
    /// The frame is rejected and `reply` is to be sent back to the peer
    Reject { error: PduError, reply: L2capPdu },
    /// The frame is malformed and is dropped without a reply
    Drop(PduError),
}

/// Router of recombined frames
///
/// The router keeps the identifier used for command rejects that do not answer a signaling
/// request.
#[derive(Debug)]
pub struct ChannelRouter {
    next_identifier: NonZeroU8,
}

impl Default for ChannelRouter {
    fn default() -> Self {
        ChannelRouter {
            next_identifier: NonZeroU8::MIN,
        }
    }
}

impl ChannelRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_identifier(&mut self) -> NonZeroU8 {
        let identifier = self.next_identifier;

        self.next_identifier = identifier.checked_add(1).unwrap_or(NonZeroU8::MIN);

        identifier
    }

    /// Get the identifier for a reply to the signaling request within `payload`
    ///
    /// The identifier of a request is the second byte of the signaling PDU. A new identifier is
    /// used when the payload is not a signaling PDU or the identifier is missing.
    fn reply_identifier(&mut self, channel_id: ChannelIdentifier, payload: &[u8]) -> NonZeroU8 {
        match (channel_id, payload.get(1).copied().and_then(NonZeroU8::new)) {
            (ChannelIdentifier::LeSignaling, Some(identifier)) => identifier,
            _ => self.take_identifier(),
        }
    }

    /// Route a recombined frame
    pub fn route_frame<T>(&mut self, frame: &BasicFrame<T>) -> RouteOutcome
    where
        T: Deref<Target = [u8]>,
    {
        let channel_id = frame.get_channel_id();

        let payload: &[u8] = frame.get_payload();

        let destination = route(channel_id);

        if let Destination::Unknown = destination {
            log::warn!("(L2CAP) received frame for unsupported channel {}", channel_id);

            let reply = SignalingPdu::new_invalid_cid(self.take_identifier(), channel_id, 0);

            return RouteOutcome::Reject {
                error: PduError::InvalidCid(channel_id),
                reply: L2capPdu::Signaling(reply),
            };
        }

        match L2capPdu::unpack(channel_id, payload) {
            Ok(pdu) => {
                log::trace!("(L2CAP) routing {} to {}", pdu, destination);

                RouteOutcome::Deliver { destination, pdu }
            }
            Err(error @ PduError::UnknownPduCode { .. }) => {
                log::warn!("(L2CAP) {}", error);

                let reply = SignalingPdu::new_command_not_understood(self.reply_identifier(channel_id, payload));

                RouteOutcome::Reject {
                    error,
                    reply: L2capPdu::Signaling(reply),
                }
            }
            Err(error) => {
                log::warn!("(L2CAP) dropping frame for channel {}: {}", channel_id, error);

                RouteOutcome::Drop(error)
            }
        }
    }
}
