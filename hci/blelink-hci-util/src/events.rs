//! HCI event identification
//!
//! An event is identified by its event code, but a few event codes are containers for other
//! messages. The *LE Meta* event carries a subevent code and the *Command Complete* and *Command
//! Status* events carry the opcode of the command they are a response to. The combination of
//! these is a [`MessageId`].

use core::fmt;

/// The number of bytes within the header of every event (the event code and parameter length)
pub const EVENT_HEADER_SIZE: usize = 2;

/// Event codes
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventCode {
    DisconnectionComplete,
    EncryptionChange,
    ReadRemoteVersionInformationComplete,
    CommandComplete,
    CommandStatus,
    HardwareError,
    NumberOfCompletedPackets,
    DataBufferOverflow,
    EncryptionKeyRefreshComplete,
    LeMeta,
}

impl EventCode {
    pub const fn to_val(self) -> u8 {
        match self {
            EventCode::DisconnectionComplete => 0x05,
            EventCode::EncryptionChange => 0x08,
            EventCode::ReadRemoteVersionInformationComplete => 0x0C,
            EventCode::CommandComplete => 0x0E,
            EventCode::CommandStatus => 0x0F,
            EventCode::HardwareError => 0x10,
            EventCode::NumberOfCompletedPackets => 0x13,
            EventCode::DataBufferOverflow => 0x1A,
            EventCode::EncryptionKeyRefreshComplete => 0x30,
            EventCode::LeMeta => 0x3E,
        }
    }

    pub fn try_from_val(code: u8) -> Result<Self, u8> {
        match code {
            0x05 => Ok(EventCode::DisconnectionComplete),
            0x08 => Ok(EventCode::EncryptionChange),
            0x0C => Ok(EventCode::ReadRemoteVersionInformationComplete),
            0x0E => Ok(EventCode::CommandComplete),
            0x0F => Ok(EventCode::CommandStatus),
            0x10 => Ok(EventCode::HardwareError),
            0x13 => Ok(EventCode::NumberOfCompletedPackets),
            0x1A => Ok(EventCode::DataBufferOverflow),
            0x30 => Ok(EventCode::EncryptionKeyRefreshComplete),
            0x3E => Ok(EventCode::LeMeta),
            val => Err(val),
        }
    }
}

/// Subevent codes of the LE Meta event
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LeSubevent {
    ConnectionComplete,
    AdvertisingReport,
    ConnectionUpdateComplete,
    ReadRemoteFeaturesComplete,
    LongTermKeyRequest,
}

impl LeSubevent {
    pub const fn to_val(self) -> u8 {
        match self {
            LeSubevent::ConnectionComplete => 0x01,
            LeSubevent::AdvertisingReport => 0x02,
            LeSubevent::ConnectionUpdateComplete => 0x03,
            LeSubevent::ReadRemoteFeaturesComplete => 0x04,
            LeSubevent::LongTermKeyRequest => 0x05,
        }
    }

    pub fn try_from_val(code: u8) -> Result<Self, u8> {
        match code {
            0x01 => Ok(LeSubevent::ConnectionComplete),
            0x02 => Ok(LeSubevent::AdvertisingReport),
            0x03 => Ok(LeSubevent::ConnectionUpdateComplete),
            0x04 => Ok(LeSubevent::ReadRemoteFeaturesComplete),
            0x05 => Ok(LeSubevent::LongTermKeyRequest),
            val => Err(val),
        }
    }
}

/// Identifier of an event message
///
/// Raw values are kept so that a message the registry does not know about can still be named
/// within a log.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageId {
    /// An event that is not a container for other messages
    Event(u8),
    /// A subevent of the LE Meta event
    LeMeta(u8),
    /// A Command Complete event for the contained opcode
    CommandComplete(u16),
    /// A Command Status event for the contained opcode
    CommandStatus(u16),
}

impl MessageId {
    /// Get the event code of the event carrying this message
    pub fn get_event_code(&self) -> u8 {
        match self {
            MessageId::Event(code) => *code,
            MessageId::LeMeta(_) => EventCode::LeMeta.to_val(),
            MessageId::CommandComplete(_) => EventCode::CommandComplete.to_val(),
            MessageId::CommandStatus(_) => EventCode::CommandStatus.to_val(),
        }
    }

    /// Get the envelope of the event carrying this message
    pub fn get_envelope(&self) -> EventEnvelope {
        EventEnvelope::for_code(self.get_event_code())
    }
}

impl From<EventCode> for MessageId {
    fn from(code: EventCode) -> Self {
        MessageId::Event(code.to_val())
    }
}

impl From<LeSubevent> for MessageId {
    fn from(subevent: LeSubevent) -> Self {
        MessageId::LeMeta(subevent.to_val())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MessageId::Event(code) => write!(f, "event {:#04x}", code),
            MessageId::LeMeta(subevent) => write!(f, "LE meta subevent {:#04x}", subevent),
            MessageId::CommandComplete(opcode) => write!(f, "command complete for opcode {:#06x}", opcode),
            MessageId::CommandStatus(opcode) => write!(f, "command status for opcode {:#06x}", opcode),
        }
    }
}

/// The routing envelope of an event
///
/// A few events carry routing fields in front of (or mixed in with) their parameters. The Command
/// Complete event has the number of command packets and the opcode, the Command Status event has
/// the same two fields preceded by the status, and the LE Meta event has the subevent code.
///
/// The parameter offset is the number of bytes, counted from the event code, that are taken by the
/// event header plus the routing fields. This is 5 for both the Command Complete and Command Status
/// events (the status of a Command Status is its parameter, not a routing field), 3 for an LE Meta
/// event and 2 for every other event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventEnvelope {
    CommandComplete,
    CommandStatus,
    LeMeta,
    Other,
}

impl EventEnvelope {
    /// Get the envelope used by the event with code `code`
    pub fn for_code(code: u8) -> Self {
        match EventCode::try_from_val(code) {
            Ok(EventCode::CommandComplete) => EventEnvelope::CommandComplete,
            Ok(EventCode::CommandStatus) => EventEnvelope::CommandStatus,
            Ok(EventCode::LeMeta) => EventEnvelope::LeMeta,
            _ => EventEnvelope::Other,
        }
    }

    /// Offset of the typed parameters from the event code
    pub const fn param_offset(&self) -> usize {
        match self {
            EventEnvelope::CommandComplete => 5,
            EventEnvelope::CommandStatus => 5,
            EventEnvelope::LeMeta => 3,
            EventEnvelope::Other => 2,
        }
    }

    /// Number of parameter bytes used for routing
    pub const fn routing_len(&self) -> usize {
        self.param_offset() - EVENT_HEADER_SIZE
    }

    /// Number of bytes following the event header that must be read to route the event
    ///
    /// This differs from [`routing_len`](EventEnvelope::routing_len) for a Command Status event
    /// because its status parameter is transferred before the routing fields.
    pub const fn header_extension(&self) -> usize {
        match self {
            EventEnvelope::CommandStatus => self.routing_len() + 1,
            _ => self.routing_len(),
        }
    }
}
