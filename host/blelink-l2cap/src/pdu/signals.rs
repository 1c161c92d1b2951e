//! LE signaling channel PDUs
//!
//! Every signaling command is made up of a code, an identifier, the length of the data and then
//! the data. The identifier is used for matching a response to its request and is never zero.

use super::{split_code, FieldReader, PduError};
use crate::channels::ChannelIdentifier;
use alloc::vec::Vec;
use core::fmt;
use core::num::NonZeroU8;

/// Signaling codes used by the LE signaling channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalCode {
    CommandReject,
    DisconnectionRequest,
    DisconnectionResponse,
    ConnectionParameterUpdateRequest,
    ConnectionParameterUpdateResponse,
    LeCreditBasedConnectionRequest,
    LeCreditBasedConnectionResponse,
    FlowControlCreditIndication,
}

impl SignalCode {
    /// Get the raw code value of the Signal
    pub fn into_code(self) -> u8 {
        match self {
            SignalCode::CommandReject => 0x1,
            SignalCode::DisconnectionRequest => 0x6,
            SignalCode::DisconnectionResponse => 0x7,
            SignalCode::ConnectionParameterUpdateRequest => 0x12,
            SignalCode::ConnectionParameterUpdateResponse => 0x13,
            SignalCode::LeCreditBasedConnectionRequest => 0x14,
            SignalCode::LeCreditBasedConnectionResponse => 0x15,
            SignalCode::FlowControlCreditIndication => 0x16,
        }
    }

    /// Create a `SignalCode` from the raw code value
    pub fn try_from_code(val: u8) -> Result<Self, u8> {
        match val {
            0x1 => Ok(SignalCode::CommandReject),
            0x6 => Ok(SignalCode::DisconnectionRequest),
            0x7 => Ok(SignalCode::DisconnectionResponse),
            0x12 => Ok(SignalCode::ConnectionParameterUpdateRequest),
            0x13 => Ok(SignalCode::ConnectionParameterUpdateResponse),
            0x14 => Ok(SignalCode::LeCreditBasedConnectionRequest),
            0x15 => Ok(SignalCode::LeCreditBasedConnectionResponse),
            0x16 => Ok(SignalCode::FlowControlCreditIndication),
            _ => Err(val),
        }
    }
}

impl fmt::Display for SignalCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SignalCode::CommandReject => f.write_str("command reject"),
            SignalCode::DisconnectionRequest => f.write_str("disconnection request"),
            SignalCode::DisconnectionResponse => f.write_str("disconnection response"),
            SignalCode::ConnectionParameterUpdateRequest => f.write_str("connection parameter update request"),
            SignalCode::ConnectionParameterUpdateResponse => f.write_str("connection parameter update response"),
            SignalCode::LeCreditBasedConnectionRequest => f.write_str("LE credit based connection request"),
            SignalCode::LeCreditBasedConnectionResponse => f.write_str("LE credit based connection response"),
            SignalCode::FlowControlCreditIndication => f.write_str("flow control credit indication"),
        }
    }
}

/// Command Rejection Reason
///
/// This is the *Reason* field along with its *reason data* within a command reject.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CommandRejectReason {
    CommandNotUnderstood,
    SignalingMtuExceeded { actual_mtu: u16 },
    InvalidCidInRequest { local_cid: u16, remote_cid: u16 },
}

impl CommandRejectReason {
    fn into_val(self) -> u16 {
        match self {
            CommandRejectReason::CommandNotUnderstood => 0x0,
            CommandRejectReason::SignalingMtuExceeded { .. } => 0x1,
            CommandRejectReason::InvalidCidInRequest { .. } => 0x2,
        }
    }
}

/// An LE signaling channel PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingPdu {
    CommandReject {
        identifier: NonZeroU8,
        reason: CommandRejectReason,
    },
    DisconnectionRequest {
        identifier: NonZeroU8,
        destination_cid: u16,
        source_cid: u16,
    },
    DisconnectionResponse {
        identifier: NonZeroU8,
        destination_cid: u16,
        source_cid: u16,
    },
    ConnectionParameterUpdateRequest {
        identifier: NonZeroU8,
        interval_min: u16,
        interval_max: u16,
        latency: u16,
        timeout: u16,
    },
    ConnectionParameterUpdateResponse {
        identifier: NonZeroU8,
        result: u16,
    },
    LeCreditBasedConnectionRequest {
        identifier: NonZeroU8,
        spsm: u16,
        source_cid: u16,
        mtu: u16,
        mps: u16,
        initial_credits: u16,
    },
    LeCreditBasedConnectionResponse {
        identifier: NonZeroU8,
        destination_cid: u16,
        mtu: u16,
        mps: u16,
        initial_credits: u16,
        result: u16,
    },
    FlowControlCreditIndication {
        identifier: NonZeroU8,
        cid: u16,
        credits: u16,
    },
}

impl SignalingPdu {
    /// The size of the code, identifier and length fields
    pub const HEADER_SIZE: usize = 4;

    /// Create a command reject for a request that is not understood
    pub fn new_command_not_understood(identifier: NonZeroU8) -> Self {
        SignalingPdu::CommandReject {
            identifier,
            reason: CommandRejectReason::CommandNotUnderstood,
        }
    }

    /// Create a command reject for a channel identifier that is not valid
    pub fn new_invalid_cid(identifier: NonZeroU8, local_cid: ChannelIdentifier, remote_cid: u16) -> Self {
        SignalingPdu::CommandReject {
            identifier,
            reason: CommandRejectReason::InvalidCidInRequest {
                local_cid: local_cid.to_val(),
                remote_cid,
            },
        }
    }

    pub fn get_signal_code(&self) -> SignalCode {
        match self {
            SignalingPdu::CommandReject { .. } => SignalCode::CommandReject,
            SignalingPdu::DisconnectionRequest { .. } => SignalCode::DisconnectionRequest,
            SignalingPdu::DisconnectionResponse { .. } => SignalCode::DisconnectionResponse,
            SignalingPdu::ConnectionParameterUpdateRequest { .. } => SignalCode::ConnectionParameterUpdateRequest,
            SignalingPdu::ConnectionParameterUpdateResponse { .. } => SignalCode::ConnectionParameterUpdateResponse,
            SignalingPdu::LeCreditBasedConnectionRequest { .. } => SignalCode::LeCreditBasedConnectionRequest,
            SignalingPdu::LeCreditBasedConnectionResponse { .. } => SignalCode::LeCreditBasedConnectionResponse,
            SignalingPdu::FlowControlCreditIndication { .. } => SignalCode::FlowControlCreditIndication,
        }
    }

    pub fn get_code(&self) -> u8 {
        self.get_signal_code().into_code()
    }

    pub fn get_identifier(&self) -> NonZeroU8 {
        match self {
            SignalingPdu::CommandReject { identifier, .. }
            | SignalingPdu::DisconnectionRequest { identifier, .. }
            | SignalingPdu::DisconnectionResponse { identifier, .. }
            | SignalingPdu::ConnectionParameterUpdateRequest { identifier, .. }
            | SignalingPdu::ConnectionParameterUpdateResponse { identifier, .. }
            | SignalingPdu::LeCreditBasedConnectionRequest { identifier, .. }
            | SignalingPdu::LeCreditBasedConnectionResponse { identifier, .. }
            | SignalingPdu::FlowControlCreditIndication { identifier, .. } => *identifier,
        }
    }

    fn data_fields(&self) -> Vec<u16> {
        match *self {
            SignalingPdu::CommandReject { reason, .. } => {
                let mut fields = alloc::vec![reason.into_val()];

                match reason {
                    CommandRejectReason::CommandNotUnderstood => (),
                    CommandRejectReason::SignalingMtuExceeded { actual_mtu } => fields.push(actual_mtu),
                    CommandRejectReason::InvalidCidInRequest { local_cid, remote_cid } => {
                        fields.extend_from_slice(&[local_cid, remote_cid])
                    }
                }

                fields
            }
            SignalingPdu::DisconnectionRequest {
                destination_cid,
                source_cid,
                ..
            }
            | SignalingPdu::DisconnectionResponse {
                destination_cid,
                source_cid,
                ..
            } => alloc::vec![destination_cid, source_cid],
            SignalingPdu::ConnectionParameterUpdateRequest {
                interval_min,
                interval_max,
                latency,
                timeout,
                ..
            } => alloc::vec![interval_min, interval_max, latency, timeout],
            SignalingPdu::ConnectionParameterUpdateResponse { result, .. } => alloc::vec![result],
            SignalingPdu::LeCreditBasedConnectionRequest {
                spsm,
                source_cid,
                mtu,
                mps,
                initial_credits,
                ..
            } => alloc::vec![spsm, source_cid, mtu, mps, initial_credits],
            SignalingPdu::LeCreditBasedConnectionResponse {
                destination_cid,
                mtu,
                mps,
                initial_credits,
                result,
                ..
            } => alloc::vec![destination_cid, mtu, mps, initial_credits, result],
            SignalingPdu::FlowControlCreditIndication { cid, credits, .. } => alloc::vec![cid, credits],
        }
    }

    /// Pack this PDU to the end of `bytes`
    pub fn pack_into(&self, bytes: &mut Vec<u8>) {
        let fields = self.data_fields();

        bytes.push(self.get_code());

        bytes.push(self.get_identifier().get());

        bytes.extend_from_slice(&((fields.len() * 2) as u16).to_le_bytes());

        fields.iter().for_each(|field| bytes.extend_from_slice(&field.to_le_bytes()));
    }

    /// Unpack a signaling PDU
    pub fn unpack(bytes: &[u8]) -> Result<Self, PduError> {
        let (code, rest) = split_code(bytes)?;

        let signal = SignalCode::try_from_code(code).map_err(|code| PduError::UnknownPduCode {
            channel_id: ChannelIdentifier::LeSignaling,
            code,
        })?;

        let mut reader = FieldReader::new(code, rest);

        let identifier = NonZeroU8::new(reader.u8()?).ok_or(PduError::InvalidField("identifier"))?;

        let data_len = reader.u16()? as usize;

        let data = reader.rest();

        if data.len() != data_len {
            return Err(PduError::InvalidLength { code });
        }

        let mut reader = FieldReader::new(code, &data);

        let pdu = match signal {
            SignalCode::CommandReject => {
                let reason = match reader.u16()? {
                    0x0 => CommandRejectReason::CommandNotUnderstood,
                    0x1 => CommandRejectReason::SignalingMtuExceeded {
                        actual_mtu: reader.u16()?,
                    },
                    0x2 => CommandRejectReason::InvalidCidInRequest {
                        local_cid: reader.u16()?,
                        remote_cid: reader.u16()?,
                    },
                    _ => return Err(PduError::InvalidField("reason")),
                };

                SignalingPdu::CommandReject { identifier, reason }
            }
            SignalCode::DisconnectionRequest => SignalingPdu::DisconnectionRequest {
                identifier,
                destination_cid: reader.u16()?,
                source_cid: reader.u16()?,
            },
            SignalCode::DisconnectionResponse => SignalingPdu::DisconnectionResponse {
                identifier,
                destination_cid: reader.u16()?,
                source_cid: reader.u16()?,
            },
            SignalCode::ConnectionParameterUpdateRequest => SignalingPdu::ConnectionParameterUpdateRequest {
                identifier,
                interval_min: reader.u16()?,
                interval_max: reader.u16()?,
                latency: reader.u16()?,
                timeout: reader.u16()?,
            },
            SignalCode::ConnectionParameterUpdateResponse => SignalingPdu::ConnectionParameterUpdateResponse {
                identifier,
                result: reader.u16()?,
            },
            SignalCode::LeCreditBasedConnectionRequest => SignalingPdu::LeCreditBasedConnectionRequest {
                identifier,
                spsm: reader.u16()?,
                source_cid: reader.u16()?,
                mtu: reader.u16()?,
                mps: reader.u16()?,
                initial_credits: reader.u16()?,
            },
            SignalCode::LeCreditBasedConnectionResponse => SignalingPdu::LeCreditBasedConnectionResponse {
                identifier,
                destination_cid: reader.u16()?,
                mtu: reader.u16()?,
                mps: reader.u16()?,
                initial_credits: reader.u16()?,
                result: reader.u16()?,
            },
            SignalCode::FlowControlCreditIndication => SignalingPdu::FlowControlCreditIndication {
                identifier,
                cid: reader.u16()?,
                credits: reader.u16()?,
            },
        };

        reader.finish()?;

        Ok(pdu)
    }
}
