//! Attribute protocol PDUs
//!
//! The first byte of an ATT PDU is the opcode. Bit 6 of the opcode marks a command (a PDU that
//! has no response) and bit 7 marks that an authentication signature is appended to the PDU.
//! Values and lists are the trailing part of a PDU and run to the end of the frame.

use super::{split_code, FieldReader, PduError};
use crate::channels::ChannelIdentifier;
use alloc::vec::Vec;

/// An attribute type
///
/// Attribute types are UUIDs, they are transferred in the shortened 16 bit form when possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Uuid16(u16),
    Uuid128(u128),
}

impl AttributeType {
    fn pack_into(&self, bytes: &mut Vec<u8>) {
        match self {
            AttributeType::Uuid16(uuid) => bytes.extend_from_slice(&uuid.to_le_bytes()),
            AttributeType::Uuid128(uuid) => bytes.extend_from_slice(&uuid.to_le_bytes()),
        }
    }

    fn unpack(code: u8, bytes: &[u8]) -> Result<Self, PduError> {
        match bytes.len() {
            2 => Ok(AttributeType::Uuid16(<u16>::from_le_bytes([bytes[0], bytes[1]]))),
            16 => {
                let mut raw = [0u8; 16];

                raw.copy_from_slice(bytes);

                Ok(AttributeType::Uuid128(<u128>::from_le_bytes(raw)))
            }
            _ => Err(PduError::InvalidLength { code }),
        }
    }
}

/// An attribute protocol PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttPdu {
    ErrorResponse {
        request_opcode: u8,
        handle: u16,
        error_code: u8,
    },
    ExchangeMtuRequest {
        client_rx_mtu: u16,
    },
    ExchangeMtuResponse {
        server_rx_mtu: u16,
    },
    FindInformationRequest {
        start_handle: u16,
        end_handle: u16,
    },
    FindInformationResponse {
        format: u8,
        information_data: Vec<u8>,
    },
    FindByTypeValueRequest {
        start_handle: u16,
        end_handle: u16,
        attribute_type: u16,
        value: Vec<u8>,
    },
    FindByTypeValueResponse {
        handles_information: Vec<(u16, u16)>,
    },
    ReadByTypeRequest {
        start_handle: u16,
        end_handle: u16,
        attribute_type: AttributeType,
    },
    ReadByTypeResponse {
        length: u8,
        attribute_data: Vec<u8>,
    },
    ReadRequest {
        handle: u16,
    },
    ReadResponse {
        value: Vec<u8>,
    },
    ReadBlobRequest {
        handle: u16,
        offset: u16,
    },
    ReadBlobResponse {
        value: Vec<u8>,
    },
    ReadMultipleRequest {
        handles: Vec<u16>,
    },
    ReadMultipleResponse {
        values: Vec<u8>,
    },
    ReadByGroupTypeRequest {
        start_handle: u16,
        end_handle: u16,
        group_type: AttributeType,
    },
    ReadByGroupTypeResponse {
        length: u8,
        attribute_data: Vec<u8>,
    },
    WriteRequest {
        handle: u16,
        value: Vec<u8>,
    },
    WriteResponse,
    PrepareWriteRequest {
        handle: u16,
        offset: u16,
        value: Vec<u8>,
    },
    PrepareWriteResponse {
        handle: u16,
        offset: u16,
        value: Vec<u8>,
    },
    ExecuteWriteRequest {
        flags: u8,
    },
    ExecuteWriteResponse,
    HandleValueNotification {
        handle: u16,
        value: Vec<u8>,
    },
    HandleValueIndication {
        handle: u16,
        value: Vec<u8>,
    },
    HandleValueConfirmation,
    WriteCommand {
        handle: u16,
        value: Vec<u8>,
    },
    SignedWriteCommand {
        handle: u16,
        value: Vec<u8>,
        signature: [u8; 12],
    },
}

impl AttPdu {
    /// The size of the authentication signature of a signed write
    pub const SIGNATURE_SIZE: usize = 12;

    pub fn get_opcode(&self) -> u8 {
        match self {
            AttPdu::ErrorResponse { .. } => 0x01,
            AttPdu::ExchangeMtuRequest { .. } => 0x02,
            AttPdu::ExchangeMtuResponse { .. } => 0x03,
            AttPdu::FindInformationRequest { .. } => 0x04,
            AttPdu::FindInformationResponse { .. } => 0x05,
            AttPdu::FindByTypeValueRequest { .. } => 0x06,
            AttPdu::FindByTypeValueResponse { .. } => 0x07,
            AttPdu::ReadByTypeRequest { .. } => 0x08,
            AttPdu::ReadByTypeResponse { .. } => 0x09,
            AttPdu::ReadRequest { .. } => 0x0A,
            AttPdu::ReadResponse { .. } => 0x0B,
            AttPdu::ReadBlobRequest { .. } => 0x0C,
            AttPdu::ReadBlobResponse { .. } => 0x0D,
            AttPdu::ReadMultipleRequest { .. } => 0x0E,
            AttPdu::ReadMultipleResponse { .. } => 0x0F,
            AttPdu::ReadByGroupTypeRequest { .. } => 0x10,
            AttPdu::ReadByGroupTypeResponse { .. } => 0x11,
            AttPdu::WriteRequest { .. } => 0x12,
            AttPdu::WriteResponse => 0x13,
            AttPdu::PrepareWriteRequest { .. } => 0x16,
            AttPdu::PrepareWriteResponse { .. } => 0x17,
            AttPdu::ExecuteWriteRequest { .. } => 0x18,
            AttPdu::ExecuteWriteResponse => 0x19,
            AttPdu::HandleValueNotification { .. } => 0x1B,
            AttPdu::HandleValueIndication { .. } => 0x1D,
            AttPdu::HandleValueConfirmation => 0x1E,
            AttPdu::WriteCommand { .. } => 0x52,
            AttPdu::SignedWriteCommand { .. } => 0xD2,
        }
    }

    /// Check if this PDU is a command
    pub fn is_command(&self) -> bool {
        self.get_opcode() & 1 << 6 != 0
    }

    /// Check if this PDU carries an authentication signature
    pub fn has_auth_sig(&self) -> bool {
        self.get_opcode() & 1 << 7 != 0
    }

    /// Pack this PDU to the end of `bytes`
    pub fn pack_into(&self, bytes: &mut Vec<u8>) {
        fn push_u16(bytes: &mut Vec<u8>, val: u16) {
            bytes.extend_from_slice(&val.to_le_bytes())
        }

        bytes.push(self.get_opcode());

        match self {
            AttPdu::ErrorResponse {
                request_opcode,
                handle,
                error_code,
            } => {
                bytes.push(*request_opcode);
                push_u16(bytes, *handle);
                bytes.push(*error_code);
            }
            AttPdu::ExchangeMtuRequest { client_rx_mtu: mtu } | AttPdu::ExchangeMtuResponse { server_rx_mtu: mtu } => {
                push_u16(bytes, *mtu)
            }
            AttPdu::FindInformationRequest {
                start_handle,
                end_handle,
            } => {
                push_u16(bytes, *start_handle);
                push_u16(bytes, *end_handle);
            }
            AttPdu::FindInformationResponse {
                format,
                information_data,
            } => {
                bytes.push(*format);
                bytes.extend_from_slice(information_data);
            }
            AttPdu::FindByTypeValueRequest {
                start_handle,
                end_handle,
                attribute_type,
                value,
            } => {
                push_u16(bytes, *start_handle);
                push_u16(bytes, *end_handle);
                push_u16(bytes, *attribute_type);
                bytes.extend_from_slice(value);
            }
            AttPdu::FindByTypeValueResponse { handles_information } => {
                for (found, group_end) in handles_information {
                    push_u16(bytes, *found);
                    push_u16(bytes, *group_end);
                }
            }
            AttPdu::ReadByTypeRequest {
                start_handle,
                end_handle,
                attribute_type: uuid,
            }
            | AttPdu::ReadByGroupTypeRequest {
                start_handle,
                end_handle,
                group_type: uuid,
            } => {
                push_u16(bytes, *start_handle);
                push_u16(bytes, *end_handle);
                uuid.pack_into(bytes);
            }
            AttPdu::ReadByTypeResponse { length, attribute_data }
            | AttPdu::ReadByGroupTypeResponse { length, attribute_data } => {
                bytes.push(*length);
                bytes.extend_from_slice(attribute_data);
            }
            AttPdu::ReadRequest { handle } => push_u16(bytes, *handle),
            AttPdu::ReadResponse { value } | AttPdu::ReadBlobResponse { value } => bytes.extend_from_slice(value),
            AttPdu::ReadBlobRequest { handle, offset } => {
                push_u16(bytes, *handle);
                push_u16(bytes, *offset);
            }
            AttPdu::ReadMultipleRequest { handles } => handles.iter().for_each(|handle| push_u16(bytes, *handle)),
            AttPdu::ReadMultipleResponse { values } => bytes.extend_from_slice(values),
            AttPdu::WriteRequest { handle, value }
            | AttPdu::HandleValueNotification { handle, value }
            | AttPdu::HandleValueIndication { handle, value }
            | AttPdu::WriteCommand { handle, value } => {
                push_u16(bytes, *handle);
                bytes.extend_from_slice(value);
            }
            AttPdu::PrepareWriteRequest { handle, offset, value }
            | AttPdu::PrepareWriteResponse { handle, offset, value } => {
                push_u16(bytes, *handle);
                push_u16(bytes, *offset);
                bytes.extend_from_slice(value);
            }
            AttPdu::ExecuteWriteRequest { flags } => bytes.push(*flags),
            AttPdu::WriteResponse | AttPdu::ExecuteWriteResponse | AttPdu::HandleValueConfirmation => (),
            AttPdu::SignedWriteCommand {
                handle,
                value,
                signature,
            } => {
                push_u16(bytes, *handle);
                bytes.extend_from_slice(value);
                bytes.extend_from_slice(signature);
            }
        }
    }

    /// Unpack an attribute protocol PDU
    pub fn unpack(bytes: &[u8]) -> Result<Self, PduError> {
        let (code, rest) = split_code(bytes)?;

        let mut reader = FieldReader::new(code, rest);

        let pdu = match code {
            0x01 => AttPdu::ErrorResponse {
                request_opcode: reader.u8()?,
                handle: reader.u16()?,
                error_code: reader.u8()?,
            },
            0x02 => AttPdu::ExchangeMtuRequest {
                client_rx_mtu: reader.u16()?,
            },
            0x03 => AttPdu::ExchangeMtuResponse {
                server_rx_mtu: reader.u16()?,
            },
            0x04 => AttPdu::FindInformationRequest {
                start_handle: reader.u16()?,
                end_handle: reader.u16()?,
            },
            0x05 => AttPdu::FindInformationResponse {
                format: reader.u8()?,
                information_data: reader.rest(),
            },
            0x06 => AttPdu::FindByTypeValueRequest {
                start_handle: reader.u16()?,
                end_handle: reader.u16()?,
                attribute_type: reader.u16()?,
                value: reader.rest(),
            },
            0x07 => {
                let list = reader.rest();

                if list.is_empty() || list.len() % 4 != 0 {
                    return Err(PduError::InvalidLength { code });
                }

                let handles_information = list
                    .chunks_exact(4)
                    .map(|c| (<u16>::from_le_bytes([c[0], c[1]]), <u16>::from_le_bytes([c[2], c[3]])))
                    .collect();

                AttPdu::FindByTypeValueResponse { handles_information }
            }
            0x08 => AttPdu::ReadByTypeRequest {
                start_handle: reader.u16()?,
                end_handle: reader.u16()?,
                attribute_type: AttributeType::unpack(code, &reader.rest())?,
            },
            0x09 => AttPdu::ReadByTypeResponse {
                length: reader.u8()?,
                attribute_data: reader.rest(),
            },
            0x0A => AttPdu::ReadRequest { handle: reader.u16()? },
            0x0B => AttPdu::ReadResponse { value: reader.rest() },
            0x0C => AttPdu::ReadBlobRequest {
                handle: reader.u16()?,
                offset: reader.u16()?,
            },
            0x0D => AttPdu::ReadBlobResponse { value: reader.rest() },
            0x0E => {
                let list = reader.rest();

                if list.len() < 4 || list.len() % 2 != 0 {
                    return Err(PduError::InvalidLength { code });
                }

                let handles = list
                    .chunks_exact(2)
                    .map(|c| <u16>::from_le_bytes([c[0], c[1]]))
                    .collect();

                AttPdu::ReadMultipleRequest { handles }
            }
            0x0F => AttPdu::ReadMultipleResponse { values: reader.rest() },
            0x10 => AttPdu::ReadByGroupTypeRequest {
                start_handle: reader.u16()?,
                end_handle: reader.u16()?,
                group_type: AttributeType::unpack(code, &reader.rest())?,
            },
            0x11 => AttPdu::ReadByGroupTypeResponse {
                length: reader.u8()?,
                attribute_data: reader.rest(),
            },
            0x12 => AttPdu::WriteRequest {
                handle: reader.u16()?,
                value: reader.rest(),
            },
            0x13 => AttPdu::WriteResponse,
            0x16 => AttPdu::PrepareWriteRequest {
                handle: reader.u16()?,
                offset: reader.u16()?,
                value: reader.rest(),
            },
            0x17 => AttPdu::PrepareWriteResponse {
                handle: reader.u16()?,
                offset: reader.u16()?,
                value: reader.rest(),
            },
            0x18 => AttPdu::ExecuteWriteRequest { flags: reader.u8()? },
            0x19 => AttPdu::ExecuteWriteResponse,
            0x1B => AttPdu::HandleValueNotification {
                handle: reader.u16()?,
                value: reader.rest(),
            },
            0x1D => AttPdu::HandleValueIndication {
                handle: reader.u16()?,
                value: reader.rest(),
            },
            0x1E => AttPdu::HandleValueConfirmation,
            0x52 => AttPdu::WriteCommand {
                handle: reader.u16()?,
                value: reader.rest(),
            },
            0xD2 => {
                let handle = reader.u16()?;

                let mut value = reader.rest();

                if value.len() < Self::SIGNATURE_SIZE {
                    return Err(PduError::InvalidLength { code });
                }

                let mut signature = [0u8; 12];

                signature.copy_from_slice(&value[value.len() - Self::SIGNATURE_SIZE..]);

                value.truncate(value.len() - Self::SIGNATURE_SIZE);

                AttPdu::SignedWriteCommand {
                    handle,
                    value,
                    signature,
                }
            }
            code => {
                return Err(PduError::UnknownPduCode {
                    channel_id: ChannelIdentifier::AttributeProtocol,
                    code,
                })
            }
        };

        reader.finish()?;

        Ok(pdu)
    }
}
