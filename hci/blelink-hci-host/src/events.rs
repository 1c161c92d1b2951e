//! Host Controller Interface Events
//!
//! An [`Event`] is an event with its parameters. The Command Complete event carries the return
//! parameters of the command it completes, these are the [`ReturnParameters`] and their layout
//! depends on the opcode of the completed command.

use crate::codec::{CodecError, EventHeader, EventRouting};
use crate::commands::{MAX_ADVERTISING_DATA_LEN, MAX_DEBUG_DATA_LEN};
use crate::params::{push_sized, Chew};
use alloc::vec::Vec;
use blelink_core::{BluetoothDeviceAddress, Error};
use blelink_hci_util::events::{EventCode, LeSubevent, MessageId};
use blelink_hci_util::ConnectionHandle;

/// The task above the HCI that owns a message
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DestinationTask {
    Gap,
    Gatt,
    L2cap,
    Smp,
    Debug,
    Host,
}

impl core::fmt::Display for DestinationTask {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            DestinationTask::Gap => f.write_str("GAP"),
            DestinationTask::Gatt => f.write_str("GATT"),
            DestinationTask::L2cap => f.write_str("L2CAP"),
            DestinationTask::Smp => f.write_str("SMP"),
            DestinationTask::Debug => f.write_str("debug"),
            DestinationTask::Host => f.write_str("host"),
        }
    }
}

/// The layout of the return parameters within a Command Complete event
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReturnKind {
    /// The *No Operation* opcode (`0x0000`) is only used to hand credits to the host
    NoOperation,
    Status,
    LocalVersion,
    BdAddr,
    Rssi,
    BufferSize,
    FilterListSize,
    Encrypt,
    Rand,
    ChannelMap,
    HandleStatus,
    DebugData,
    FlashIdentify,
}

/// The return parameters of a Command Complete event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnParameters {
    NoOperation,
    Status(Error),
    LocalVersion {
        status: Error,
        hci_version: u8,
        hci_revision: u16,
        lmp_version: u8,
        manufacturer_name: u16,
        lmp_subversion: u16,
    },
    BdAddr {
        status: Error,
        address: BluetoothDeviceAddress,
    },
    Rssi {
        status: Error,
        connection_handle: ConnectionHandle,
        rssi: i8,
    },
    BufferSize {
        status: Error,
        acl_data_packet_length: u16,
        total_num_acl_data_packets: u8,
    },
    FilterListSize {
        status: Error,
        size: u8,
    },
    Encrypt {
        status: Error,
        encrypted_data: [u8; 16],
    },
    Rand {
        status: Error,
        random_number: [u8; 8],
    },
    ChannelMap {
        status: Error,
        connection_handle: ConnectionHandle,
        channel_map: [u8; 5],
    },
    HandleStatus {
        status: Error,
        connection_handle: ConnectionHandle,
    },
    DebugData {
        status: Error,
        data: Vec<u8>,
    },
    FlashIdentify {
        status: Error,
        flash_id: u32,
    },
}

impl ReturnParameters {
    pub fn get_kind(&self) -> ReturnKind {
        match self {
            ReturnParameters::NoOperation => ReturnKind::NoOperation,
            ReturnParameters::Status(_) => ReturnKind::Status,
            ReturnParameters::LocalVersion { .. } => ReturnKind::LocalVersion,
            ReturnParameters::BdAddr { .. } => ReturnKind::BdAddr,
            ReturnParameters::Rssi { .. } => ReturnKind::Rssi,
            ReturnParameters::BufferSize { .. } => ReturnKind::BufferSize,
            ReturnParameters::FilterListSize { .. } => ReturnKind::FilterListSize,
            ReturnParameters::Encrypt { .. } => ReturnKind::Encrypt,
            ReturnParameters::Rand { .. } => ReturnKind::Rand,
            ReturnParameters::ChannelMap { .. } => ReturnKind::ChannelMap,
            ReturnParameters::HandleStatus { .. } => ReturnKind::HandleStatus,
            ReturnParameters::DebugData { .. } => ReturnKind::DebugData,
            ReturnParameters::FlashIdentify { .. } => ReturnKind::FlashIdentify,
        }
    }

    /// Get the status of the completed command
    ///
    /// The *No Operation* return has no status and is always `NoError`.
    pub fn get_status(&self) -> Error {
        match self {
            ReturnParameters::NoOperation => Error::NoError,
            ReturnParameters::Status(status)
            | ReturnParameters::LocalVersion { status, .. }
            | ReturnParameters::BdAddr { status, .. }
            | ReturnParameters::Rssi { status, .. }
            | ReturnParameters::BufferSize { status, .. }
            | ReturnParameters::FilterListSize { status, .. }
            | ReturnParameters::Encrypt { status, .. }
            | ReturnParameters::Rand { status, .. }
            | ReturnParameters::ChannelMap { status, .. }
            | ReturnParameters::HandleStatus { status, .. }
            | ReturnParameters::DebugData { status, .. }
            | ReturnParameters::FlashIdentify { status, .. } => *status,
        }
    }

    fn pack_into(&self, bytes: &mut Vec<u8>) -> Result<(), CodecError> {
        if let ReturnParameters::NoOperation = self {
            return Ok(());
        }

        bytes.push(self.get_status().to_val());

        match self {
            ReturnParameters::NoOperation | ReturnParameters::Status(_) => (),
            ReturnParameters::LocalVersion {
                hci_version,
                hci_revision,
                lmp_version,
                manufacturer_name,
                lmp_subversion,
                ..
            } => {
                bytes.push(*hci_version);
                bytes.extend_from_slice(&hci_revision.to_le_bytes());
                bytes.push(*lmp_version);
                bytes.extend_from_slice(&manufacturer_name.to_le_bytes());
                bytes.extend_from_slice(&lmp_subversion.to_le_bytes());
            }
            ReturnParameters::BdAddr { address, .. } => bytes.extend_from_slice(&address.to_le_bytes()),
            ReturnParameters::Rssi {
                connection_handle, rssi, ..
            } => {
                bytes.extend_from_slice(&connection_handle.to_le_bytes());
                bytes.extend_from_slice(&rssi.to_le_bytes());
            }
            ReturnParameters::BufferSize {
                acl_data_packet_length,
                total_num_acl_data_packets,
                ..
            } => {
                bytes.extend_from_slice(&acl_data_packet_length.to_le_bytes());
                bytes.push(*total_num_acl_data_packets);
            }
            ReturnParameters::FilterListSize { size, .. } => bytes.push(*size),
            ReturnParameters::Encrypt { encrypted_data, .. } => bytes.extend_from_slice(encrypted_data),
            ReturnParameters::Rand { random_number, .. } => bytes.extend_from_slice(random_number),
            ReturnParameters::ChannelMap {
                connection_handle,
                channel_map,
                ..
            } => {
                bytes.extend_from_slice(&connection_handle.to_le_bytes());
                bytes.extend_from_slice(channel_map);
            }
            ReturnParameters::HandleStatus { connection_handle, .. } => {
                bytes.extend_from_slice(&connection_handle.to_le_bytes())
            }
            ReturnParameters::DebugData { data, .. } => push_sized(bytes, data, MAX_DEBUG_DATA_LEN)?,
            ReturnParameters::FlashIdentify { flash_id, .. } => bytes.extend_from_slice(&flash_id.to_le_bytes()),
        }

        Ok(())
    }

    fn unpack(kind: ReturnKind, chew: &mut Chew) -> Result<Self, CodecError> {
        if let ReturnKind::NoOperation = kind {
            return Ok(ReturnParameters::NoOperation);
        }

        let status = chew.status()?;

        let parameters = match kind {
            ReturnKind::NoOperation => ReturnParameters::NoOperation,
            ReturnKind::Status => ReturnParameters::Status(status),
            ReturnKind::LocalVersion => ReturnParameters::LocalVersion {
                status,
                hci_version: chew.u8()?,
                hci_revision: chew.u16()?,
                lmp_version: chew.u8()?,
                manufacturer_name: chew.u16()?,
                lmp_subversion: chew.u16()?,
            },
            ReturnKind::BdAddr => ReturnParameters::BdAddr {
                status,
                address: chew.baddr()?,
            },
            ReturnKind::Rssi => ReturnParameters::Rssi {
                status,
                connection_handle: chew.handle()?,
                rssi: chew.i8()?,
            },
            ReturnKind::BufferSize => ReturnParameters::BufferSize {
                status,
                acl_data_packet_length: chew.u16()?,
                total_num_acl_data_packets: chew.u8()?,
            },
            ReturnKind::FilterListSize => ReturnParameters::FilterListSize {
                status,
                size: chew.u8()?,
            },
            ReturnKind::Encrypt => ReturnParameters::Encrypt {
                status,
                encrypted_data: chew.array()?,
            },
            ReturnKind::Rand => ReturnParameters::Rand {
                status,
                random_number: chew.array()?,
            },
            ReturnKind::ChannelMap => ReturnParameters::ChannelMap {
                status,
                connection_handle: chew.handle()?,
                channel_map: chew.array()?,
            },
            ReturnKind::HandleStatus => ReturnParameters::HandleStatus {
                status,
                connection_handle: chew.handle()?,
            },
            ReturnKind::DebugData => ReturnParameters::DebugData {
                status,
                data: chew.sized_vec()?,
            },
            ReturnKind::FlashIdentify => ReturnParameters::FlashIdentify {
                status,
                flash_id: chew.u32()?,
            },
        };

        Ok(parameters)
    }
}

/// Parameters of the *LE Connection Complete* event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeConnectionCompleteData {
    pub status: Error,
    pub connection_handle: ConnectionHandle,
    pub role: u8,
    pub peer_address_type: u8,
    pub peer_address: BluetoothDeviceAddress,
    pub connection_interval: u16,
    pub peripheral_latency: u16,
    pub supervision_timeout: u16,
    pub central_clock_accuracy: u8,
}

/// A single report of an *LE Advertising Report* event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingReport {
    pub event_type: u8,
    pub address_type: u8,
    pub address: BluetoothDeviceAddress,
    pub data: Vec<u8>,
    pub rssi: i8,
}

/// The layout of the parameters of an event
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    DisconnectionComplete,
    EncryptionChange,
    ReadRemoteVersionInformationComplete,
    CommandComplete(ReturnKind),
    CommandStatus,
    HardwareError,
    NumberOfCompletedPackets,
    DataBufferOverflow,
    EncryptionKeyRefreshComplete,
    LeConnectionComplete,
    LeAdvertisingReport,
    LeConnectionUpdateComplete,
    LeReadRemoteFeaturesComplete,
    LeLongTermKeyRequest,
}

/// An event with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    DisconnectionComplete {
        status: Error,
        connection_handle: ConnectionHandle,
        reason: Error,
    },
    EncryptionChange {
        status: Error,
        connection_handle: ConnectionHandle,
        encryption_enabled: u8,
    },
    ReadRemoteVersionInformationComplete {
        status: Error,
        connection_handle: ConnectionHandle,
        version: u8,
        manufacturer_name: u16,
        subversion: u16,
    },
    CommandComplete {
        num_hci_command_packets: u8,
        opcode: u16,
        return_parameters: ReturnParameters,
    },
    CommandStatus {
        status: Error,
        num_hci_command_packets: u8,
        opcode: u16,
    },
    HardwareError {
        hardware_code: u8,
    },
    NumberOfCompletedPackets {
        completed: Vec<(ConnectionHandle, u16)>,
    },
    DataBufferOverflow {
        link_type: u8,
    },
    EncryptionKeyRefreshComplete {
        status: Error,
        connection_handle: ConnectionHandle,
    },
    LeConnectionComplete(LeConnectionCompleteData),
    LeAdvertisingReport {
        reports: Vec<AdvertisingReport>,
    },
    LeConnectionUpdateComplete {
        status: Error,
        connection_handle: ConnectionHandle,
        connection_interval: u16,
        peripheral_latency: u16,
        supervision_timeout: u16,
    },
    LeReadRemoteFeaturesComplete {
        status: Error,
        connection_handle: ConnectionHandle,
        features: [u8; 8],
    },
    LeLongTermKeyRequest {
        connection_handle: ConnectionHandle,
        random_number: [u8; 8],
        encrypted_diversifier: u16,
    },
}

impl Event {
    pub fn get_message_id(&self) -> MessageId {
        match self {
            Event::DisconnectionComplete { .. } => EventCode::DisconnectionComplete.into(),
            Event::EncryptionChange { .. } => EventCode::EncryptionChange.into(),
            Event::ReadRemoteVersionInformationComplete { .. } => {
                EventCode::ReadRemoteVersionInformationComplete.into()
            }
            Event::CommandComplete { opcode, .. } => MessageId::CommandComplete(*opcode),
            Event::CommandStatus { opcode, .. } => MessageId::CommandStatus(*opcode),
            Event::HardwareError { .. } => EventCode::HardwareError.into(),
            Event::NumberOfCompletedPackets { .. } => EventCode::NumberOfCompletedPackets.into(),
            Event::DataBufferOverflow { .. } => EventCode::DataBufferOverflow.into(),
            Event::EncryptionKeyRefreshComplete { .. } => EventCode::EncryptionKeyRefreshComplete.into(),
            Event::LeConnectionComplete(_) => LeSubevent::ConnectionComplete.into(),
            Event::LeAdvertisingReport { .. } => LeSubevent::AdvertisingReport.into(),
            Event::LeConnectionUpdateComplete { .. } => LeSubevent::ConnectionUpdateComplete.into(),
            Event::LeReadRemoteFeaturesComplete { .. } => LeSubevent::ReadRemoteFeaturesComplete.into(),
            Event::LeLongTermKeyRequest { .. } => LeSubevent::LongTermKeyRequest.into(),
        }
    }

    /// Get the routing fields of this event
    pub fn get_routing(&self) -> EventRouting {
        match *self {
            Event::CommandComplete {
                num_hci_command_packets,
                opcode,
                ..
            } => EventRouting::CommandComplete {
                num_hci_command_packets,
                opcode,
            },
            Event::CommandStatus {
                status,
                num_hci_command_packets,
                opcode,
            } => EventRouting::CommandStatus {
                status,
                num_hci_command_packets,
                opcode,
            },
            _ => match self.get_message_id() {
                MessageId::LeMeta(subevent) => EventRouting::LeMeta { subevent },
                _ => EventRouting::None,
            },
        }
    }

    /// Create an event that only consists of its routing fields
    ///
    /// `None` is returned if an event of `kind` has parameters after the routing fields.
    pub fn without_parameters(kind: EventKind, routing: EventRouting) -> Option<Self> {
        match (kind, routing) {
            (
                EventKind::CommandComplete(ReturnKind::NoOperation),
                EventRouting::CommandComplete {
                    num_hci_command_packets,
                    opcode,
                },
            ) => Some(Event::CommandComplete {
                num_hci_command_packets,
                opcode,
                return_parameters: ReturnParameters::NoOperation,
            }),
            _ => None,
        }
    }

    /// Pack the parameters of this event field by field, including the routing fields, to the end
    /// of `bytes`
    pub(crate) fn pack_parameters(&self, bytes: &mut Vec<u8>) -> Result<(), CodecError> {
        match self {
            Event::DisconnectionComplete {
                status,
                connection_handle,
                reason,
            } => {
                bytes.push(status.to_val());
                bytes.extend_from_slice(&connection_handle.to_le_bytes());
                bytes.push(reason.to_val());
            }
            Event::EncryptionChange {
                status,
                connection_handle,
                encryption_enabled,
            } => {
                bytes.push(status.to_val());
                bytes.extend_from_slice(&connection_handle.to_le_bytes());
                bytes.push(*encryption_enabled);
            }
            Event::ReadRemoteVersionInformationComplete {
                status,
                connection_handle,
                version,
                manufacturer_name,
                subversion,
            } => {
                bytes.push(status.to_val());
                bytes.extend_from_slice(&connection_handle.to_le_bytes());
                bytes.push(*version);
                bytes.extend_from_slice(&manufacturer_name.to_le_bytes());
                bytes.extend_from_slice(&subversion.to_le_bytes());
            }
            Event::CommandComplete {
                num_hci_command_packets,
                opcode,
                return_parameters,
            } => {
                bytes.push(*num_hci_command_packets);
                bytes.extend_from_slice(&opcode.to_le_bytes());
                return_parameters.pack_into(bytes)?;
            }
            Event::CommandStatus {
                status,
                num_hci_command_packets,
                opcode,
            } => {
                bytes.push(status.to_val());
                bytes.push(*num_hci_command_packets);
                bytes.extend_from_slice(&opcode.to_le_bytes());
            }
            Event::HardwareError { hardware_code } => bytes.push(*hardware_code),
            Event::NumberOfCompletedPackets { completed } => {
                bytes.push(completed.len() as u8);

                for (handle, count) in completed {
                    bytes.extend_from_slice(&handle.to_le_bytes());
                    bytes.extend_from_slice(&count.to_le_bytes());
                }
            }
            Event::DataBufferOverflow { link_type } => bytes.push(*link_type),
            Event::EncryptionKeyRefreshComplete {
                status,
                connection_handle,
            } => {
                bytes.push(status.to_val());
                bytes.extend_from_slice(&connection_handle.to_le_bytes());
            }
            Event::LeConnectionComplete(data) => {
                bytes.push(LeSubevent::ConnectionComplete.to_val());
                bytes.push(data.status.to_val());
                bytes.extend_from_slice(&data.connection_handle.to_le_bytes());
                bytes.push(data.role);
                bytes.push(data.peer_address_type);
                bytes.extend_from_slice(&data.peer_address.to_le_bytes());
                bytes.extend_from_slice(&data.connection_interval.to_le_bytes());
                bytes.extend_from_slice(&data.peripheral_latency.to_le_bytes());
                bytes.extend_from_slice(&data.supervision_timeout.to_le_bytes());
                bytes.push(data.central_clock_accuracy);
            }
            Event::LeAdvertisingReport { reports } => {
                bytes.push(LeSubevent::AdvertisingReport.to_val());
                bytes.push(reports.len() as u8);

                for report in reports {
                    bytes.push(report.event_type);
                    bytes.push(report.address_type);
                    bytes.extend_from_slice(&report.address.to_le_bytes());
                    push_sized(bytes, &report.data, MAX_ADVERTISING_DATA_LEN)?;
                    bytes.extend_from_slice(&report.rssi.to_le_bytes());
                }
            }
            Event::LeConnectionUpdateComplete {
                status,
                connection_handle,
                connection_interval,
                peripheral_latency,
                supervision_timeout,
            } => {
                bytes.push(LeSubevent::ConnectionUpdateComplete.to_val());
                bytes.push(status.to_val());
                bytes.extend_from_slice(&connection_handle.to_le_bytes());
                bytes.extend_from_slice(&connection_interval.to_le_bytes());
                bytes.extend_from_slice(&peripheral_latency.to_le_bytes());
                bytes.extend_from_slice(&supervision_timeout.to_le_bytes());
            }
            Event::LeReadRemoteFeaturesComplete {
                status,
                connection_handle,
                features,
            } => {
                bytes.push(LeSubevent::ReadRemoteFeaturesComplete.to_val());
                bytes.push(status.to_val());
                bytes.extend_from_slice(&connection_handle.to_le_bytes());
                bytes.extend_from_slice(features);
            }
            Event::LeLongTermKeyRequest {
                connection_handle,
                random_number,
                encrypted_diversifier,
            } => {
                bytes.push(LeSubevent::LongTermKeyRequest.to_val());
                bytes.extend_from_slice(&connection_handle.to_le_bytes());
                bytes.extend_from_slice(random_number);
                bytes.extend_from_slice(&encrypted_diversifier.to_le_bytes());
            }
        }

        Ok(())
    }

    /// Unpack the parameters that follow the routing fields of an event
    ///
    /// The routing fields are taken from `header`.
    pub(crate) fn unpack_parameters(
        kind: EventKind,
        header: &EventHeader,
        parameters: &[u8],
    ) -> Result<Self, CodecError> {
        let mut chew = Chew::new(parameters);

        let event = match (kind, header.get_routing()) {
            (
                EventKind::CommandComplete(return_kind),
                EventRouting::CommandComplete {
                    num_hci_command_packets,
                    opcode,
                },
            ) => Event::CommandComplete {
                num_hci_command_packets,
                opcode,
                return_parameters: ReturnParameters::unpack(return_kind, &mut chew)?,
            },
            (
                EventKind::CommandStatus,
                EventRouting::CommandStatus {
                    status,
                    num_hci_command_packets,
                    opcode,
                },
            ) => Event::CommandStatus {
                status,
                num_hci_command_packets,
                opcode,
            },
            (EventKind::CommandComplete(_), _) | (EventKind::CommandStatus, _) => {
                return Err(CodecError::InvalidParameter("routing fields"))
            }
            (EventKind::DisconnectionComplete, _) => Event::DisconnectionComplete {
                status: chew.status()?,
                connection_handle: chew.handle()?,
                reason: chew.status()?,
            },
            (EventKind::EncryptionChange, _) => Event::EncryptionChange {
                status: chew.status()?,
                connection_handle: chew.handle()?,
                encryption_enabled: chew.u8()?,
            },
            (EventKind::ReadRemoteVersionInformationComplete, _) => Event::ReadRemoteVersionInformationComplete {
                status: chew.status()?,
                connection_handle: chew.handle()?,
                version: chew.u8()?,
                manufacturer_name: chew.u16()?,
                subversion: chew.u16()?,
            },
            (EventKind::HardwareError, _) => Event::HardwareError {
                hardware_code: chew.u8()?,
            },
            (EventKind::NumberOfCompletedPackets, _) => {
                let count = chew.u8()?;

                let completed = (0..count)
                    .map(|_| -> Result<_, CodecError> { Ok((chew.handle()?, chew.u16()?)) })
                    .collect::<Result<Vec<_>, CodecError>>()?;

                Event::NumberOfCompletedPackets { completed }
            }
            (EventKind::DataBufferOverflow, _) => Event::DataBufferOverflow { link_type: chew.u8()? },
            (EventKind::EncryptionKeyRefreshComplete, _) => Event::EncryptionKeyRefreshComplete {
                status: chew.status()?,
                connection_handle: chew.handle()?,
            },
            (EventKind::LeConnectionComplete, _) => Event::LeConnectionComplete(LeConnectionCompleteData {
                status: chew.status()?,
                connection_handle: chew.handle()?,
                role: chew.u8()?,
                peer_address_type: chew.u8()?,
                peer_address: chew.baddr()?,
                connection_interval: chew.u16()?,
                peripheral_latency: chew.u16()?,
                supervision_timeout: chew.u16()?,
                central_clock_accuracy: chew.u8()?,
            }),
            (EventKind::LeAdvertisingReport, _) => {
                let count = chew.u8()?;

                let reports = (0..count)
                    .map(|_| -> Result<_, CodecError> {
                        Ok(AdvertisingReport {
                            event_type: chew.u8()?,
                            address_type: chew.u8()?,
                            address: chew.baddr()?,
                            data: chew.sized_vec()?,
                            rssi: chew.i8()?,
                        })
                    })
                    .collect::<Result<Vec<_>, CodecError>>()?;

                Event::LeAdvertisingReport { reports }
            }
            (EventKind::LeConnectionUpdateComplete, _) => Event::LeConnectionUpdateComplete {
                status: chew.status()?,
                connection_handle: chew.handle()?,
                connection_interval: chew.u16()?,
                peripheral_latency: chew.u16()?,
                supervision_timeout: chew.u16()?,
            },
            (EventKind::LeReadRemoteFeaturesComplete, _) => Event::LeReadRemoteFeaturesComplete {
                status: chew.status()?,
                connection_handle: chew.handle()?,
                features: chew.array()?,
            },
            (EventKind::LeLongTermKeyRequest, _) => Event::LeLongTermKeyRequest {
                connection_handle: chew.handle()?,
                random_number: chew.array()?,
                encrypted_diversifier: chew.u16()?,
            },
        };

        chew.finish()?;

        Ok(event)
    }
}

impl core::fmt::Display for Event {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.get_message_id(), f)
    }
}
