//! Security manager protocol PDUs
//!
//! Only the layout of the PDUs is covered here, pairing itself is done by the consumer of the
//! security manager channel.

use super::{split_code, FieldReader, PduError};
use crate::channels::ChannelIdentifier;
use alloc::vec::Vec;
use blelink_core::BluetoothDeviceAddress;

/// The feature exchange fields of a pairing request or pairing response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingFeatures {
    pub io_capability: u8,
    pub oob_data_flag: u8,
    pub auth_req: u8,
    pub max_encryption_key_size: u8,
    pub initiator_key_distribution: u8,
    pub responder_key_distribution: u8,
}

impl PairingFeatures {
    fn to_bytes(self) -> [u8; 6] {
        [
            self.io_capability,
            self.oob_data_flag,
            self.auth_req,
            self.max_encryption_key_size,
            self.initiator_key_distribution,
            self.responder_key_distribution,
        ]
    }

    fn from_bytes(bytes: [u8; 6]) -> Self {
        PairingFeatures {
            io_capability: bytes[0],
            oob_data_flag: bytes[1],
            auth_req: bytes[2],
            max_encryption_key_size: bytes[3],
            initiator_key_distribution: bytes[4],
            responder_key_distribution: bytes[5],
        }
    }
}

/// A security manager protocol PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityManagerPdu {
    PairingRequest(PairingFeatures),
    PairingResponse(PairingFeatures),
    PairingConfirm { confirm_value: [u8; 16] },
    PairingRandom { random_value: [u8; 16] },
    PairingFailed { reason: u8 },
    EncryptionInformation { long_term_key: [u8; 16] },
    MasterIdentification { ediv: u16, rand: [u8; 8] },
    IdentityInformation { identity_resolving_key: [u8; 16] },
    IdentityAddressInformation { address_type: u8, address: BluetoothDeviceAddress },
    SigningInformation { signature_key: [u8; 16] },
    SecurityRequest { auth_req: u8 },
}

impl SecurityManagerPdu {
    pub fn get_code(&self) -> u8 {
        match self {
            SecurityManagerPdu::PairingRequest(_) => 0x01,
            SecurityManagerPdu::PairingResponse(_) => 0x02,
            SecurityManagerPdu::PairingConfirm { .. } => 0x03,
            SecurityManagerPdu::PairingRandom { .. } => 0x04,
            SecurityManagerPdu::PairingFailed { .. } => 0x05,
            SecurityManagerPdu::EncryptionInformation { .. } => 0x06,
            SecurityManagerPdu::MasterIdentification { .. } => 0x07,
            SecurityManagerPdu::IdentityInformation { .. } => 0x08,
            SecurityManagerPdu::IdentityAddressInformation { .. } => 0x09,
            SecurityManagerPdu::SigningInformation { .. } => 0x0A,
            SecurityManagerPdu::SecurityRequest { .. } => 0x0B,
        }
    }

    /// Pack this PDU to the end of `bytes`
    pub fn pack_into(&self, bytes: &mut Vec<u8>) {
        bytes.push(self.get_code());

        match self {
            SecurityManagerPdu::PairingRequest(features) | SecurityManagerPdu::PairingResponse(features) => {
                bytes.extend_from_slice(&features.to_bytes())
            }
            SecurityManagerPdu::PairingConfirm { confirm_value: key }
            | SecurityManagerPdu::PairingRandom { random_value: key }
            | SecurityManagerPdu::EncryptionInformation { long_term_key: key }
            | SecurityManagerPdu::IdentityInformation {
                identity_resolving_key: key,
            }
            | SecurityManagerPdu::SigningInformation { signature_key: key } => bytes.extend_from_slice(key),
            SecurityManagerPdu::PairingFailed { reason } => bytes.push(*reason),
            SecurityManagerPdu::MasterIdentification { ediv, rand } => {
                bytes.extend_from_slice(&ediv.to_le_bytes());
                bytes.extend_from_slice(rand);
            }
            SecurityManagerPdu::IdentityAddressInformation { address_type, address } => {
                bytes.push(*address_type);
                bytes.extend_from_slice(&address.to_le_bytes());
            }
            SecurityManagerPdu::SecurityRequest { auth_req } => bytes.push(*auth_req),
        }
    }

    /// Unpack a security manager PDU
    pub fn unpack(bytes: &[u8]) -> Result<Self, PduError> {
        let (code, rest) = split_code(bytes)?;

        let mut reader = FieldReader::new(code, rest);

        let pdu = match code {
            0x01 => SecurityManagerPdu::PairingRequest(PairingFeatures::from_bytes(reader.array()?)),
            0x02 => SecurityManagerPdu::PairingResponse(PairingFeatures::from_bytes(reader.array()?)),
            0x03 => SecurityManagerPdu::PairingConfirm {
                confirm_value: reader.array()?,
            },
            0x04 => SecurityManagerPdu::PairingRandom {
                random_value: reader.array()?,
            },
            0x05 => SecurityManagerPdu::PairingFailed { reason: reader.u8()? },
            0x06 => SecurityManagerPdu::EncryptionInformation {
                long_term_key: reader.array()?,
            },
            0x07 => SecurityManagerPdu::MasterIdentification {
                ediv: reader.u16()?,
                rand: reader.array()?,
            },
            0x08 => SecurityManagerPdu::IdentityInformation {
                identity_resolving_key: reader.array()?,
            },
            0x09 => SecurityManagerPdu::IdentityAddressInformation {
                address_type: reader.u8()?,
                address: BluetoothDeviceAddress::from_le_bytes(reader.array()?),
            },
            0x0A => SecurityManagerPdu::SigningInformation {
                signature_key: reader.array()?,
            },
            0x0B => SecurityManagerPdu::SecurityRequest { auth_req: reader.u8()? },
            code => {
                return Err(PduError::UnknownPduCode {
                    channel_id: ChannelIdentifier::SecurityManager,
                    code,
                })
            }
        };

        reader.finish()?;

        Ok(pdu)
    }
}
