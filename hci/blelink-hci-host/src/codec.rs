//! Packing and unpacking of HCI command and event packets
//!
//! A packed packet starts with its UART packet indicator. The unpack functions take the parts of a
//! packet that follow the indicator as the transport framer reads them: first the header, then the
//! parameters.
//!
//! ```
//! use blelink_hci_host::codec::{pack_command, unpack_command_packet};
//! use blelink_hci_host::commands::Command;
//!
//! let packet = pack_command(&Command::Reset).unwrap();
//!
//! assert_eq!(packet, [0x01, 0x03, 0x0C, 0x00]);
//!
//! assert_eq!(unpack_command_packet(&packet[1..]), Ok(Command::Reset));
//! ```

use crate::commands::Command;
use crate::events::Event;
use crate::params::Chew;
use crate::registry::{lookup_command, lookup_event, EventEntry, OpcodeEntry};
use alloc::vec::Vec;
use blelink_core::Error;
use blelink_hci_util::events::{EventEnvelope, MessageId, EVENT_HEADER_SIZE};
use blelink_hci_util::{HciPacketType, PackStyle, ParameterLength};

/// Errors of packing or unpacking a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The opcode is not within the registry
    UnknownOpcode(u16),
    /// The event message is not within the registry
    UnknownMessageId(MessageId),
    /// The parameter length disagrees with the registry
    LengthMismatch { expected: ParameterLength, actual: usize },
    /// A parameter has a value that is not valid
    InvalidParameter(&'static str),
    /// There are not enough bytes for the fields of the message
    Truncated,
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            CodecError::UnknownOpcode(opcode) => write!(f, "unknown opcode {:#06x}", opcode),
            CodecError::UnknownMessageId(msg_id) => write!(f, "unknown message, {}", msg_id),
            CodecError::LengthMismatch { expected, actual } => {
                write!(f, "parameter length of {} bytes, expected {}", actual, expected)
            }
            CodecError::InvalidParameter(name) => write!(f, "invalid parameter {}", name),
            CodecError::Truncated => f.write_str("not enough bytes for the message fields"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}

/// The header of a command packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    pub opcode: u16,
    pub param_len: u8,
}

impl CommandHeader {
    /// The size of the header following the packet indicator
    pub const SIZE: usize = 3;

    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        match *bytes {
            [o0, o1, param_len, ..] => Ok(CommandHeader {
                opcode: <u16>::from_le_bytes([o0, o1]),
                param_len,
            }),
            _ => Err(CodecError::Truncated),
        }
    }
}

/// The routing fields of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventRouting {
    None,
    CommandComplete {
        num_hci_command_packets: u8,
        opcode: u16,
    },
    CommandStatus {
        status: Error,
        num_hci_command_packets: u8,
        opcode: u16,
    },
    LeMeta {
        subevent: u8,
    },
}

impl EventRouting {
    /// Pack the routing fields to the end of `bytes`
    pub fn pack_into(&self, bytes: &mut Vec<u8>) {
        match *self {
            EventRouting::None => (),
            EventRouting::CommandComplete {
                num_hci_command_packets,
                opcode,
            } => {
                bytes.push(num_hci_command_packets);
                bytes.extend_from_slice(&opcode.to_le_bytes());
            }
            EventRouting::CommandStatus {
                status,
                num_hci_command_packets,
                opcode,
            } => {
                bytes.push(status.to_val());
                bytes.push(num_hci_command_packets);
                bytes.extend_from_slice(&opcode.to_le_bytes());
            }
            EventRouting::LeMeta { subevent } => bytes.push(subevent),
        }
    }
}

/// The header of an event packet
///
/// This is the event code and parameter length followed by the routing fields of the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHeader {
    code: u8,
    param_len: u8,
    routing: EventRouting,
}

impl EventHeader {
    /// Get the number of bytes of the header for the event with code `code`
    pub fn header_len(code: u8) -> usize {
        EVENT_HEADER_SIZE + EventEnvelope::for_code(code).header_extension()
    }

    /// Create an `EventHeader` from the event code, parameter length, and routing fields
    ///
    /// # Errors
    /// * `LengthMismatch` if the parameter length is too small for the routing fields
    /// * `Truncated` if `bytes` does not contain exactly the header
    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let (code, param_len) = match *bytes {
            [code, param_len, ..] => (code, param_len),
            _ => return Err(CodecError::Truncated),
        };

        let envelope = EventEnvelope::for_code(code);

        if usize::from(param_len) < envelope.header_extension() {
            return Err(CodecError::LengthMismatch {
                expected: ParameterLength::Variable {
                    min: envelope.header_extension() as u8,
                    max: u8::MAX,
                },
                actual: param_len.into(),
            });
        }

        let mut chew = Chew::new(&bytes[EVENT_HEADER_SIZE..]);

        let routing = match envelope {
            EventEnvelope::CommandComplete => EventRouting::CommandComplete {
                num_hci_command_packets: chew.u8()?,
                opcode: chew.u16()?,
            },
            EventEnvelope::CommandStatus => EventRouting::CommandStatus {
                status: chew.status()?,
                num_hci_command_packets: chew.u8()?,
                opcode: chew.u16()?,
            },
            EventEnvelope::LeMeta => EventRouting::LeMeta { subevent: chew.u8()? },
            EventEnvelope::Other => EventRouting::None,
        };

        chew.finish().map_err(|_| CodecError::Truncated)?;

        Ok(EventHeader {
            code,
            param_len,
            routing,
        })
    }

    pub fn get_code(&self) -> u8 {
        self.code
    }

    pub fn get_routing(&self) -> EventRouting {
        self.routing
    }

    pub fn get_envelope(&self) -> EventEnvelope {
        EventEnvelope::for_code(self.code)
    }

    /// Get the parameter length within the event header
    pub fn get_param_len(&self) -> usize {
        self.param_len.into()
    }

    /// Get the length of the parameters that follow the routing fields
    pub fn get_typed_len(&self) -> usize {
        self.get_param_len() - self.get_envelope().routing_len()
    }

    /// Get the number of bytes of the event after this header
    pub fn get_remaining_len(&self) -> usize {
        self.get_param_len() - self.get_envelope().header_extension()
    }

    pub fn get_message_id(&self) -> MessageId {
        match self.routing {
            EventRouting::None => MessageId::Event(self.code),
            EventRouting::CommandComplete { opcode, .. } => MessageId::CommandComplete(opcode),
            EventRouting::CommandStatus { opcode, .. } => MessageId::CommandStatus(opcode),
            EventRouting::LeMeta { subevent } => MessageId::LeMeta(subevent),
        }
    }

    /// Get the number of commands the controller can accept
    ///
    /// This is only returned for Command Complete and Command Status events.
    pub fn get_command_credit(&self) -> Option<u8> {
        match self.routing {
            EventRouting::CommandComplete {
                num_hci_command_packets,
                ..
            }
            | EventRouting::CommandStatus {
                num_hci_command_packets,
                ..
            } => Some(num_hci_command_packets),
            _ => None,
        }
    }
}

/// Look up and length check the header of a command
pub fn check_command_header(header: &CommandHeader) -> Result<&'static OpcodeEntry, CodecError> {
    let entry = lookup_command(header.opcode).ok_or(CodecError::UnknownOpcode(header.opcode))?;

    if entry.param_len.accepts(header.param_len.into()) {
        Ok(entry)
    } else {
        Err(CodecError::LengthMismatch {
            expected: entry.param_len,
            actual: header.param_len.into(),
        })
    }
}

/// Look up and length check the header of an event
pub fn check_event_header(header: &EventHeader) -> Result<&'static EventEntry, CodecError> {
    let msg_id = header.get_message_id();

    let entry = lookup_event(msg_id).ok_or(CodecError::UnknownMessageId(msg_id))?;

    if entry.size.accepts(header.get_typed_len()) {
        Ok(entry)
    } else {
        Err(CodecError::LengthMismatch {
            expected: entry.size,
            actual: header.get_typed_len(),
        })
    }
}

/// Check that a message of the aligned style is a fixed size image of `len` bytes
fn check_image(len: ParameterLength, actual: usize) -> Result<(), CodecError> {
    match len {
        ParameterLength::Fixed(size) if usize::from(size) == actual => Ok(()),
        expected => Err(CodecError::LengthMismatch { expected, actual }),
    }
}

/// Pack the fields of a message as an aligned image
///
/// The fields are written into an image buffer and the image is copied to the end of `bytes`. The
/// first `routing_len` bytes of the image are routing fields and not part of the fixed size.
fn pack_image<F>(len: ParameterLength, routing_len: usize, bytes: &mut Vec<u8>, fields: F) -> Result<(), CodecError>
where
    F: FnOnce(&mut Vec<u8>) -> Result<(), CodecError>,
{
    let mut image = Vec::with_capacity(routing_len + 32);

    fields(&mut image)?;

    check_image(len, image.len().saturating_sub(routing_len))?;

    bytes.extend_from_slice(&image);

    Ok(())
}

/// Pack a command into a command packet
///
/// # Errors
/// * `UnknownOpcode` if the command has no entry within the registry
/// * `InvalidParameter` if a parameter cannot be packed, such as data that is too long
/// * `LengthMismatch` if the packed parameters have a length not accepted by the registry
pub fn pack_command(command: &Command) -> Result<Vec<u8>, CodecError> {
    let opcode = command.get_opcode();

    let entry = lookup_command(opcode).ok_or(CodecError::UnknownOpcode(opcode))?;

    let mut packet = Vec::with_capacity(HciPacketType::Command.header_size() + 1);

    packet.push(HciPacketType::Command.to_indicator());

    packet.extend_from_slice(&opcode.to_le_bytes());

    packet.push(0);

    let packed = match entry.style {
        PackStyle::Basic => Ok(()),
        PackStyle::Aligned => pack_image(entry.param_len, 0, &mut packet, |image| command.pack_parameters(image)),
        PackStyle::Padded => command.pack_parameters(&mut packet),
    };

    let param_len = packet.len() - (CommandHeader::SIZE + 1);

    let result = packed.and_then(|_| match u8::try_from(param_len) {
        Ok(len) if entry.param_len.accepts(param_len) => {
            packet[3] = len;

            Ok(packet)
        }
        _ => Err(CodecError::LengthMismatch {
            expected: entry.param_len,
            actual: param_len,
        }),
    });

    if let Err(e) = &result {
        log::warn!("(HCI) cannot pack {}: {}", command, e);
    }

    result
}

/// Unpack the parameters of a command
pub fn unpack_command(opcode: u16, parameters: &[u8]) -> Result<Command, CodecError> {
    let entry = check_command_header(&CommandHeader {
        opcode,
        param_len: u8::try_from(parameters.len()).map_err(|_| CodecError::LengthMismatch {
            expected: ParameterLength::Variable { min: 0, max: u8::MAX },
            actual: parameters.len(),
        })?,
    })?;

    let result = match entry.style {
        PackStyle::Basic => match parameters {
            [] => Command::without_parameters(entry.kind).ok_or(CodecError::InvalidParameter("pack style")),
            _ => Err(CodecError::LengthMismatch {
                expected: ParameterLength::Fixed(0),
                actual: parameters.len(),
            }),
        },
        PackStyle::Aligned => check_image(entry.param_len, parameters.len())
            .and_then(|_| Command::unpack_parameters(entry.kind, parameters)),
        PackStyle::Padded => Command::unpack_parameters(entry.kind, parameters),
    };

    if let Err(e) = &result {
        log::debug!("(HCI) cannot unpack {} command: {}", entry.kind, e);
    }

    result
}

/// Unpack a command packet without its packet indicator
pub fn unpack_command_packet(packet: &[u8]) -> Result<Command, CodecError> {
    let header = CommandHeader::try_from_bytes(packet)?;

    let parameters = &packet[CommandHeader::SIZE..];

    if parameters.len() != usize::from(header.param_len) {
        return Err(CodecError::LengthMismatch {
            expected: ParameterLength::Fixed(header.param_len),
            actual: parameters.len(),
        });
    }

    unpack_command(header.opcode, parameters)
}

/// Pack an event into an event packet
///
/// # Errors
/// The event must have an entry within the registry and the packed parameters must have a length
/// accepted by it.
pub fn pack_event(event: &Event) -> Result<Vec<u8>, CodecError> {
    let msg_id = event.get_message_id();

    let entry = lookup_event(msg_id).ok_or(CodecError::UnknownMessageId(msg_id))?;

    let routing_len = msg_id.get_envelope().routing_len();

    let mut packet = Vec::with_capacity(HciPacketType::Event.header_size() + 1);

    packet.push(HciPacketType::Event.to_indicator());

    packet.push(msg_id.get_event_code());

    packet.push(0);

    let packed = match entry.style {
        PackStyle::Basic => {
            event.get_routing().pack_into(&mut packet);

            Ok(())
        }
        PackStyle::Aligned => pack_image(entry.size, routing_len, &mut packet, |image| event.pack_parameters(image)),
        PackStyle::Padded => event.pack_parameters(&mut packet),
    };

    let param_len = packet.len() - 3;

    let typed_len = param_len.saturating_sub(routing_len);

    let result = packed.and_then(|_| match u8::try_from(param_len) {
        Ok(len) if entry.size.accepts(typed_len) => {
            packet[2] = len;

            Ok(packet)
        }
        _ => Err(CodecError::LengthMismatch {
            expected: entry.size,
            actual: typed_len,
        }),
    });

    if let Err(e) = &result {
        log::warn!("(HCI) cannot pack {}: {}", msg_id, e);
    }

    result
}

/// Unpack the parameters that follow the header of an event
pub fn unpack_event(header: &EventHeader, parameters: &[u8]) -> Result<Event, CodecError> {
    let entry = check_event_header(header)?;

    if parameters.len() != header.get_remaining_len() {
        return Err(CodecError::LengthMismatch {
            expected: entry.size,
            actual: parameters.len() + header.get_typed_len() - header.get_remaining_len(),
        });
    }

    let result = match entry.style {
        PackStyle::Basic => match header.get_typed_len() {
            0 => Event::without_parameters(entry.kind, header.get_routing())
                .ok_or(CodecError::InvalidParameter("pack style")),
            actual => Err(CodecError::LengthMismatch {
                expected: ParameterLength::Fixed(0),
                actual,
            }),
        },
        PackStyle::Aligned => check_image(entry.size, header.get_typed_len())
            .and_then(|_| Event::unpack_parameters(entry.kind, header, parameters)),
        PackStyle::Padded => Event::unpack_parameters(entry.kind, header, parameters),
    };

    if let Err(e) = &result {
        log::debug!("(HCI) cannot unpack {}: {}", entry.msg_id, e);
    }

    result
}

/// Unpack an event packet without its packet indicator
pub fn unpack_event_packet(packet: &[u8]) -> Result<Event, CodecError> {
    let code = *packet.first().ok_or(CodecError::Truncated)?;

    let header_len = EventHeader::header_len(code);

    let header = EventHeader::try_from_bytes(packet.get(..header_len).unwrap_or(packet))?;

    unpack_event(&header, packet.get(header_len..).unwrap_or_default())
}
