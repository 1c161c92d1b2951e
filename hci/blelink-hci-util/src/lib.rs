//! Common items for the host controller interface
//!
//! This crate carries the parts of the HCI that are used by multiple HCI crates. These are the
//! identifiers that appear within the header of every HCI packet (the [packet type indicator],
//! [opcodes], [event codes], and the [`ConnectionHandle`]) along with the descriptions of how the
//! parameters of a packet are laid out on the wire ([`PackStyle`] and [`ParameterLength`]).
//!
//! [packet type indicator]: HciPacketType
//! [opcodes]: opcodes
//! [event codes]: events

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

pub mod events;
pub mod opcodes;

use core::fmt;

/// The connection handle
///
/// This is used as an identifier of a connection by both the host and controller. It is created by
/// the controller when a connection is established and is only valid until the connection is
/// disconnected. Only the lower twelve bits of the first two bytes of an ACL data packet are the
/// connection handle, and the largest value a controller may assign is `0x0EFF`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionHandle {
    handle: u16,
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.handle)
    }
}

impl fmt::LowerHex for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(&self.handle, f)
    }
}

impl fmt::UpperHex for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::UpperHex::fmt(&self.handle, f)
    }
}

impl ConnectionHandle {
    pub const MAX: u16 = 0x0EFF;

    const ERROR: &'static str = "Raw connection handle value larger then the maximum (0x0EFF)";

    pub fn get_raw_handle(&self) -> u16 {
        self.handle
    }

    /// Get the little endian bytes of the connection handle
    pub fn to_le_bytes(&self) -> [u8; 2] {
        self.handle.to_le_bytes()
    }
}

impl TryFrom<u16> for ConnectionHandle {
    type Error = &'static str;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        if raw <= ConnectionHandle::MAX {
            Ok(ConnectionHandle { handle: raw })
        } else {
            Err(Self::ERROR)
        }
    }
}

impl TryFrom<[u8; 2]> for ConnectionHandle {
    type Error = &'static str;

    fn try_from(raw: [u8; 2]) -> Result<Self, Self::Error> {
        ConnectionHandle::try_from(<u16>::from_le_bytes(raw))
    }
}

/// HCI packet indicator
///
/// When the HCI is transported over a UART, every packet is preceded by a single byte that
/// indicates the kind of packet that follows it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HciPacketType {
    /// Command packet
    Command,
    /// Asynchronous Connection-Oriented Data Packet
    Acl,
    /// Synchronous Connection-Oriented Data Packet
    Sco,
    /// Event Packet
    Event,
    /// Isochronous Data Packet
    Iso,
}

impl HciPacketType {
    /// Get the packet indicator byte
    pub fn to_indicator(self) -> u8 {
        match self {
            HciPacketType::Command => 0x01,
            HciPacketType::Acl => 0x02,
            HciPacketType::Sco => 0x03,
            HciPacketType::Event => 0x04,
            HciPacketType::Iso => 0x05,
        }
    }

    /// Try to create a `HciPacketType` from a packet indicator byte
    pub fn try_from_indicator(indicator: u8) -> Result<Self, u8> {
        match indicator {
            0x01 => Ok(HciPacketType::Command),
            0x02 => Ok(HciPacketType::Acl),
            0x03 => Ok(HciPacketType::Sco),
            0x04 => Ok(HciPacketType::Event),
            0x05 => Ok(HciPacketType::Iso),
            val => Err(val),
        }
    }

    /// Get the size of the header that follows the packet indicator
    ///
    /// For an event this is only the event code and the parameter length. Some events have more
    /// header fields, see [`EventEnvelope`](events::EventEnvelope).
    pub fn header_size(self) -> usize {
        match self {
            HciPacketType::Command => 3,
            HciPacketType::Acl => 4,
            HciPacketType::Sco => 3,
            HciPacketType::Event => 2,
            HciPacketType::Iso => 4,
        }
    }
}

impl fmt::Display for HciPacketType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HciPacketType::Command => f.write_str("Command"),
            HciPacketType::Acl => f.write_str("ACL"),
            HciPacketType::Sco => f.write_str("SCO"),
            HciPacketType::Event => f.write_str("Event"),
            HciPacketType::Iso => f.write_str("ISO"),
        }
    }
}

/// How the parameters of a message are laid out on the wire
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PackStyle {
    /// The parameters are a fixed size byte image that is copied as is.
    Aligned,
    /// There are no parameters.
    Basic,
    /// The parameters are written field by field in wire order with no padding between them.
    Padded,
}

impl fmt::Display for PackStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PackStyle::Aligned => f.write_str("aligned"),
            PackStyle::Basic => f.write_str("basic"),
            PackStyle::Padded => f.write_str("padded"),
        }
    }
}

/// The expected length of the parameters of a message
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParameterLength {
    Fixed(u8),
    Variable { min: u8, max: u8 },
}

impl ParameterLength {
    /// Check if `len` is an acceptable parameter length
    pub fn accepts(&self, len: usize) -> bool {
        match *self {
            ParameterLength::Fixed(fixed) => len == usize::from(fixed),
            ParameterLength::Variable { min, max } => (usize::from(min)..=usize::from(max)).contains(&len),
        }
    }
}

impl fmt::Display for ParameterLength {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParameterLength::Fixed(len) => write!(f, "{} bytes", len),
            ParameterLength::Variable { min, max } => write!(f, "{} to {} bytes", min, max),
        }
    }
}
