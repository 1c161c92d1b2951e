use blelink_hci_host::{CodecError, HciAclPacketError};
use blelink_hci_util::events::MessageId;
use blelink_hci_util::ConnectionHandle;
use blelink_l2cap::pdu::{FragmentationError, PduError};
use blelink_l2cap::reassembly::ReassemblyError;
use core::fmt::{Debug, Display, Formatter};

/// A violation of the protocol found while receiving
///
/// These are never returned to the user of a [`TransportSession`](crate::TransportSession). They
/// are logged and counted within the [`SessionStats`](crate::SessionStats), and the last one is
/// available through [`get_last_error`](crate::TransportSession::get_last_error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingError {
    /// The byte is not the indicator of a supported packet type
    UnknownPacketIndicator(u8),
    UnknownOpcode(u16),
    UnknownMessageId(MessageId),
    /// ACL data was received for a connection that is not open
    UnknownConnection(ConnectionHandle),
    /// The parameters of a message were dropped
    Codec(CodecError),
    /// The header of an ACL data packet is invalid
    InvalidAclHeader(HciAclPacketError),
    /// More bytes were delivered than were requested
    FrameOverrun,
    /// A L2CAP fragment could not be recombined
    Reassembly(ReassemblyError),
    /// A recombined L2CAP frame could not be delivered
    Pdu(PduError),
    /// The length of a packet that must be discarded is larger than the trash capacity
    TrashOverflow(usize),
}

impl From<CodecError> for FramingError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::UnknownOpcode(opcode) => FramingError::UnknownOpcode(opcode),
            CodecError::UnknownMessageId(msg_id) => FramingError::UnknownMessageId(msg_id),
            e => FramingError::Codec(e),
        }
    }
}

impl From<HciAclPacketError> for FramingError {
    fn from(e: HciAclPacketError) -> Self {
        FramingError::InvalidAclHeader(e)
    }
}

impl From<ReassemblyError> for FramingError {
    fn from(e: ReassemblyError) -> Self {
        FramingError::Reassembly(e)
    }
}

impl From<PduError> for FramingError {
    fn from(e: PduError) -> Self {
        FramingError::Pdu(e)
    }
}

impl Display for FramingError {
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        match self {
            FramingError::UnknownPacketIndicator(indicator) => {
                write!(f, "unknown packet indicator {:#04x}", indicator)
            }
            FramingError::UnknownOpcode(opcode) => write!(f, "unknown opcode {:#06x}", opcode),
            FramingError::UnknownMessageId(msg_id) => write!(f, "unknown message, {}", msg_id),
            FramingError::UnknownConnection(handle) => write!(f, "no connection for handle {}", handle),
            FramingError::Codec(e) => Display::fmt(e, f),
            FramingError::InvalidAclHeader(e) => Display::fmt(e, f),
            FramingError::FrameOverrun => f.write_str("more bytes were received than requested"),
            FramingError::Reassembly(e) => Display::fmt(e, f),
            FramingError::Pdu(e) => Display::fmt(e, f),
            FramingError::TrashOverflow(len) => {
                write!(f, "cannot discard a packet of {} bytes", len)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FramingError {}

/// Error for opening a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    AlreadyOpen(ConnectionHandle),
    TooManyConnections,
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        match self {
            ConnectionError::AlreadyOpen(handle) => write!(f, "connection {} is already open", handle),
            ConnectionError::TooManyConnections => f.write_str("the maximum number of connections are open"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConnectionError {}

/// Error returned when sending
///
/// `E` is the error of the [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError<E> {
    Transport(E),
    Codec(CodecError),
    Fragmentation(FragmentationError),
    UnknownConnection(ConnectionHandle),
}

impl<E> From<CodecError> for SendError<E> {
    fn from(e: CodecError) -> Self {
        SendError::Codec(e)
    }
}

impl<E> From<FragmentationError> for SendError<E> {
    fn from(e: FragmentationError) -> Self {
        SendError::Fragmentation(e)
    }
}

impl<E: Display> Display for SendError<E> {
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        match self {
            SendError::Transport(e) => write!(f, "transport error, {}", e),
            SendError::Codec(e) => Display::fmt(e, f),
            SendError::Fragmentation(e) => Display::fmt(e, f),
            SendError::UnknownConnection(handle) => write!(f, "no connection for handle {}", handle),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for SendError<E> where Self: Debug + Display {}
