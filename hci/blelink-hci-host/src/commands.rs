//! Host Controller Interface Commands
//!
//! A [`Command`] is a command with its parameters. Every command has a [`CommandKind`] that
//! identifies it without its parameters and maps to the command's opcode.
//!
//! The commands are grouped by who processes them within the controller. The link layer manager
//! processes the commands for the controller as a whole (configuration, advertising, scanning and
//! initiating) and the link controller processes the commands for an established connection. The
//! vendor specific debug commands are only available with the `debug-commands` feature.

use crate::codec::CodecError;
#[cfg(feature = "debug-commands")]
use crate::params::push_sized;
use crate::params::{push_padded, Chew};
use alloc::vec::Vec;
use blelink_core::BluetoothDeviceAddress;
use blelink_hci_util::opcodes::{OpCodeGroup, OpCodePair};
use blelink_hci_util::ConnectionHandle;

/// The maximum number of bytes of advertising or scan response data
pub const MAX_ADVERTISING_DATA_LEN: usize = 31;

/// The maximum number of data bytes transferred by a single debug memory or flash command
pub const MAX_DEBUG_DATA_LEN: usize = 128;

macro_rules! command_kinds {
    ( $( $name:ident => ($group:ident, $ocf:literal), $text:literal; )* ) => {
        /// Identifier of a command
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum CommandKind {
            $( $name, )*
        }

        impl CommandKind {
            /// Get the opcode of the command
            pub const fn get_opcode_pair(self) -> OpCodePair {
                match self {
                    $( CommandKind::$name => OpCodePair::new(OpCodeGroup::$group, $ocf), )*
                }
            }
        }

        impl core::fmt::Display for CommandKind {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                match self {
                    $( CommandKind::$name => f.write_str($text), )*
                }
            }
        }
    };
}

command_kinds! {
    SetEventMask => (ControllerAndBaseband, 0x0001), "set event mask";
    Reset => (ControllerAndBaseband, 0x0003), "reset";
    ReadLocalVersionInformation => (InformationParameters, 0x0001), "read local version information";
    ReadBdAddr => (InformationParameters, 0x0009), "read BD_ADDR";
    ReadRssi => (StatusParameters, 0x0005), "read RSSI";
    LeSetEventMask => (LeController, 0x0001), "LE set event mask";
    LeReadBufferSize => (LeController, 0x0002), "LE read buffer size";
    LeSetRandomAddress => (LeController, 0x0005), "LE set random address";
    LeSetAdvertisingParameters => (LeController, 0x0006), "LE set advertising parameters";
    LeSetAdvertisingData => (LeController, 0x0008), "LE set advertising data";
    LeSetScanResponseData => (LeController, 0x0009), "LE set scan response data";
    LeSetAdvertisingEnable => (LeController, 0x000A), "LE set advertising enable";
    LeSetScanParameters => (LeController, 0x000B), "LE set scan parameters";
    LeSetScanEnable => (LeController, 0x000C), "LE set scan enable";
    LeCreateConnection => (LeController, 0x000D), "LE create connection";
    LeCreateConnectionCancel => (LeController, 0x000E), "LE create connection cancel";
    LeReadFilterListSize => (LeController, 0x000F), "LE read filter accept list size";
    LeClearFilterList => (LeController, 0x0010), "LE clear filter accept list";
    LeEncrypt => (LeController, 0x0017), "LE encrypt";
    LeRand => (LeController, 0x0018), "LE rand";
    Disconnect => (LinkControl, 0x0006), "disconnect";
    ReadRemoteVersionInformation => (LinkControl, 0x001D), "read remote version information";
    LeConnectionUpdate => (LeController, 0x0013), "LE connection update";
    LeReadChannelMap => (LeController, 0x0015), "LE read channel map";
    LeReadRemoteFeatures => (LeController, 0x0016), "LE read remote features";
    LeStartEncryption => (LeController, 0x0019), "LE enable encryption";
    LeLongTermKeyRequestReply => (LeController, 0x001A), "LE long term key request reply";
    LeLongTermKeyRequestNegativeReply => (LeController, 0x001B), "LE long term key request negative reply";
    DbgReadMemory => (VendorSpecific, 0x0001), "debug read memory";
    DbgWriteMemory => (VendorSpecific, 0x0002), "debug write memory";
    DbgFlashIdentify => (VendorSpecific, 0x0005), "debug flash identify";
    DbgFlashErase => (VendorSpecific, 0x0006), "debug flash erase";
    DbgFlashWrite => (VendorSpecific, 0x0007), "debug flash write";
    DbgFlashRead => (VendorSpecific, 0x0008), "debug flash read";
}

impl CommandKind {
    /// Get the opcode of the command
    pub const fn get_opcode(self) -> u16 {
        self.get_opcode_pair().into_opcode()
    }
}

/// Parameters of the *LE Set Advertising Parameters* command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingParameters {
    pub interval_min: u16,
    pub interval_max: u16,
    pub advertising_type: u8,
    pub own_address_type: u8,
    pub peer_address_type: u8,
    pub peer_address: BluetoothDeviceAddress,
    pub channel_map: u8,
    pub filter_policy: u8,
}

impl Default for AdvertisingParameters {
    fn default() -> Self {
        AdvertisingParameters {
            interval_min: 0x0800,
            interval_max: 0x0800,
            advertising_type: 0,
            own_address_type: 0,
            peer_address_type: 0,
            peer_address: BluetoothDeviceAddress::default(),
            channel_map: 0x07,
            filter_policy: 0,
        }
    }
}

/// Parameters of the *LE Set Scan Parameters* command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParameters {
    pub scan_type: u8,
    pub interval: u16,
    pub window: u16,
    pub own_address_type: u8,
    pub filter_policy: u8,
}

/// Parameters of the *LE Create Connection* command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub scan_interval: u16,
    pub scan_window: u16,
    pub initiator_filter_policy: u8,
    pub peer_address_type: u8,
    pub peer_address: BluetoothDeviceAddress,
    pub own_address_type: u8,
    pub connection_interval_min: u16,
    pub connection_interval_max: u16,
    pub max_latency: u16,
    pub supervision_timeout: u16,
    pub min_ce_length: u16,
    pub max_ce_length: u16,
}

/// Parameters of the *LE Connection Update* command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionUpdateParameters {
    pub connection_handle: ConnectionHandle,
    pub connection_interval_min: u16,
    pub connection_interval_max: u16,
    pub max_latency: u16,
    pub supervision_timeout: u16,
    pub min_ce_length: u16,
    pub max_ce_length: u16,
}

/// A command with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetEventMask { mask: [u8; 8] },
    Reset,
    ReadLocalVersionInformation,
    ReadBdAddr,
    ReadRssi { connection_handle: ConnectionHandle },
    LeSetEventMask { mask: [u8; 8] },
    LeReadBufferSize,
    LeSetRandomAddress { address: BluetoothDeviceAddress },
    LeSetAdvertisingParameters(AdvertisingParameters),
    /// At most [`MAX_ADVERTISING_DATA_LEN`] bytes of data
    LeSetAdvertisingData { data: Vec<u8> },
    /// At most [`MAX_ADVERTISING_DATA_LEN`] bytes of data
    LeSetScanResponseData { data: Vec<u8> },
    LeSetAdvertisingEnable { enable: bool },
    LeSetScanParameters(ScanParameters),
    LeSetScanEnable { enable: bool, filter_duplicates: bool },
    LeCreateConnection(ConnectionParameters),
    LeCreateConnectionCancel,
    LeReadFilterListSize,
    LeClearFilterList,
    LeEncrypt { key: [u8; 16], plaintext: [u8; 16] },
    LeRand,
    Disconnect { connection_handle: ConnectionHandle, reason: u8 },
    ReadRemoteVersionInformation { connection_handle: ConnectionHandle },
    LeConnectionUpdate(ConnectionUpdateParameters),
    LeReadChannelMap { connection_handle: ConnectionHandle },
    LeReadRemoteFeatures { connection_handle: ConnectionHandle },
    LeStartEncryption {
        connection_handle: ConnectionHandle,
        random_number: [u8; 8],
        encrypted_diversifier: u16,
        long_term_key: [u8; 16],
    },
    LeLongTermKeyRequestReply { connection_handle: ConnectionHandle, long_term_key: [u8; 16] },
    LeLongTermKeyRequestNegativeReply { connection_handle: ConnectionHandle },
    #[cfg(feature = "debug-commands")]
    DbgReadMemory { start_address: u32, access_size: u8, size: u8 },
    /// At most [`MAX_DEBUG_DATA_LEN`] bytes of data
    #[cfg(feature = "debug-commands")]
    DbgWriteMemory { start_address: u32, access_size: u8, data: Vec<u8> },
    #[cfg(feature = "debug-commands")]
    DbgFlashIdentify,
    #[cfg(feature = "debug-commands")]
    DbgFlashErase { flash_type: u8, start_offset: u32, size: u32 },
    /// At most [`MAX_DEBUG_DATA_LEN`] bytes of data
    #[cfg(feature = "debug-commands")]
    DbgFlashWrite { flash_type: u8, start_offset: u32, data: Vec<u8> },
    #[cfg(feature = "debug-commands")]
    DbgFlashRead { flash_type: u8, start_offset: u32, size: u8 },
}

impl Command {
    pub fn get_kind(&self) -> CommandKind {
        match self {
            Command::SetEventMask { .. } => CommandKind::SetEventMask,
            Command::Reset => CommandKind::Reset,
            Command::ReadLocalVersionInformation => CommandKind::ReadLocalVersionInformation,
            Command::ReadBdAddr => CommandKind::ReadBdAddr,
            Command::ReadRssi { .. } => CommandKind::ReadRssi,
            Command::LeSetEventMask { .. } => CommandKind::LeSetEventMask,
            Command::LeReadBufferSize => CommandKind::LeReadBufferSize,
            Command::LeSetRandomAddress { .. } => CommandKind::LeSetRandomAddress,
            Command::LeSetAdvertisingParameters(_) => CommandKind::LeSetAdvertisingParameters,
            Command::LeSetAdvertisingData { .. } => CommandKind::LeSetAdvertisingData,
            Command::LeSetScanResponseData { .. } => CommandKind::LeSetScanResponseData,
            Command::LeSetAdvertisingEnable { .. } => CommandKind::LeSetAdvertisingEnable,
            Command::LeSetScanParameters(_) => CommandKind::LeSetScanParameters,
            Command::LeSetScanEnable { .. } => CommandKind::LeSetScanEnable,
            Command::LeCreateConnection(_) => CommandKind::LeCreateConnection,
            Command::LeCreateConnectionCancel => CommandKind::LeCreateConnectionCancel,
            Command::LeReadFilterListSize => CommandKind::LeReadFilterListSize,
            Command::LeClearFilterList => CommandKind::LeClearFilterList,
            Command::LeEncrypt { .. } => CommandKind::LeEncrypt,
            Command::LeRand => CommandKind::LeRand,
            Command::Disconnect { .. } => CommandKind::Disconnect,
            Command::ReadRemoteVersionInformation { .. } => CommandKind::ReadRemoteVersionInformation,
            Command::LeConnectionUpdate(_) => CommandKind::LeConnectionUpdate,
            Command::LeReadChannelMap { .. } => CommandKind::LeReadChannelMap,
            Command::LeReadRemoteFeatures { .. } => CommandKind::LeReadRemoteFeatures,
            Command::LeStartEncryption { .. } => CommandKind::LeStartEncryption,
            Command::LeLongTermKeyRequestReply { .. } => CommandKind::LeLongTermKeyRequestReply,
            Command::LeLongTermKeyRequestNegativeReply { .. } => CommandKind::LeLongTermKeyRequestNegativeReply,
            #[cfg(feature = "debug-commands")]
            Command::DbgReadMemory { .. } => CommandKind::DbgReadMemory,
            #[cfg(feature = "debug-commands")]
            Command::DbgWriteMemory { .. } => CommandKind::DbgWriteMemory,
            #[cfg(feature = "debug-commands")]
            Command::DbgFlashIdentify => CommandKind::DbgFlashIdentify,
            #[cfg(feature = "debug-commands")]
            Command::DbgFlashErase { .. } => CommandKind::DbgFlashErase,
            #[cfg(feature = "debug-commands")]
            Command::DbgFlashWrite { .. } => CommandKind::DbgFlashWrite,
            #[cfg(feature = "debug-commands")]
            Command::DbgFlashRead { .. } => CommandKind::DbgFlashRead,
        }
    }

    pub fn get_opcode(&self) -> u16 {
        self.get_kind().get_opcode()
    }

    /// Create a command that has no parameters
    ///
    /// `None` is returned if a command of `kind` has parameters.
    pub fn without_parameters(kind: CommandKind) -> Option<Self> {
        match kind {
            CommandKind::Reset => Some(Command::Reset),
            CommandKind::ReadLocalVersionInformation => Some(Command::ReadLocalVersionInformation),
            CommandKind::ReadBdAddr => Some(Command::ReadBdAddr),
            CommandKind::LeReadBufferSize => Some(Command::LeReadBufferSize),
            CommandKind::LeCreateConnectionCancel => Some(Command::LeCreateConnectionCancel),
            CommandKind::LeReadFilterListSize => Some(Command::LeReadFilterListSize),
            CommandKind::LeClearFilterList => Some(Command::LeClearFilterList),
            CommandKind::LeRand => Some(Command::LeRand),
            #[cfg(feature = "debug-commands")]
            CommandKind::DbgFlashIdentify => Some(Command::DbgFlashIdentify),
            _ => None,
        }
    }

    /// Pack the parameters of this command field by field to the end of `bytes`
    ///
    /// # Error
    /// Data longer than the maximum allowed for the command is an `InvalidParameter`.
    pub(crate) fn pack_parameters(&self, bytes: &mut Vec<u8>) -> Result<(), CodecError> {
        match self {
            Command::Reset
            | Command::ReadLocalVersionInformation
            | Command::ReadBdAddr
            | Command::LeReadBufferSize
            | Command::LeCreateConnectionCancel
            | Command::LeReadFilterListSize
            | Command::LeClearFilterList
            | Command::LeRand => (),
            #[cfg(feature = "debug-commands")]
            Command::DbgFlashIdentify => (),
            Command::SetEventMask { mask } | Command::LeSetEventMask { mask } => bytes.extend_from_slice(mask),
            Command::ReadRssi { connection_handle }
            | Command::ReadRemoteVersionInformation { connection_handle }
            | Command::LeReadChannelMap { connection_handle }
            | Command::LeReadRemoteFeatures { connection_handle }
            | Command::LeLongTermKeyRequestNegativeReply { connection_handle } => {
                bytes.extend_from_slice(&connection_handle.to_le_bytes())
            }
            Command::LeSetRandomAddress { address } => bytes.extend_from_slice(&address.to_le_bytes()),
            Command::LeSetAdvertisingParameters(p) => {
                bytes.extend_from_slice(&p.interval_min.to_le_bytes());
                bytes.extend_from_slice(&p.interval_max.to_le_bytes());
                bytes.push(p.advertising_type);
                bytes.push(p.own_address_type);
                bytes.push(p.peer_address_type);
                bytes.extend_from_slice(&p.peer_address.to_le_bytes());
                bytes.push(p.channel_map);
                bytes.push(p.filter_policy);
            }
            Command::LeSetAdvertisingData { data } | Command::LeSetScanResponseData { data } => {
                push_padded::<MAX_ADVERTISING_DATA_LEN>(bytes, data)?
            }
            Command::LeSetAdvertisingEnable { enable } => bytes.push(*enable as u8),
            Command::LeSetScanParameters(p) => {
                bytes.push(p.scan_type);
                bytes.extend_from_slice(&p.interval.to_le_bytes());
                bytes.extend_from_slice(&p.window.to_le_bytes());
                bytes.push(p.own_address_type);
                bytes.push(p.filter_policy);
            }
            Command::LeSetScanEnable {
                enable,
                filter_duplicates,
            } => {
                bytes.push(*enable as u8);
                bytes.push(*filter_duplicates as u8);
            }
            Command::LeCreateConnection(p) => {
                bytes.extend_from_slice(&p.scan_interval.to_le_bytes());
                bytes.extend_from_slice(&p.scan_window.to_le_bytes());
                bytes.push(p.initiator_filter_policy);
                bytes.push(p.peer_address_type);
                bytes.extend_from_slice(&p.peer_address.to_le_bytes());
                bytes.push(p.own_address_type);
                [
                    p.connection_interval_min,
                    p.connection_interval_max,
                    p.max_latency,
                    p.supervision_timeout,
                    p.min_ce_length,
                    p.max_ce_length,
                ]
                .iter()
                .for_each(|val| bytes.extend_from_slice(&val.to_le_bytes()));
            }
            Command::LeEncrypt { key, plaintext } => {
                bytes.extend_from_slice(key);
                bytes.extend_from_slice(plaintext);
            }
            Command::Disconnect {
                connection_handle,
                reason,
            } => {
                bytes.extend_from_slice(&connection_handle.to_le_bytes());
                bytes.push(*reason);
            }
            Command::LeConnectionUpdate(p) => {
                bytes.extend_from_slice(&p.connection_handle.to_le_bytes());
                [
                    p.connection_interval_min,
                    p.connection_interval_max,
                    p.max_latency,
                    p.supervision_timeout,
                    p.min_ce_length,
                    p.max_ce_length,
                ]
                .iter()
                .for_each(|val| bytes.extend_from_slice(&val.to_le_bytes()));
            }
            Command::LeStartEncryption {
                connection_handle,
                random_number,
                encrypted_diversifier,
                long_term_key,
            } => {
                bytes.extend_from_slice(&connection_handle.to_le_bytes());
                bytes.extend_from_slice(random_number);
                bytes.extend_from_slice(&encrypted_diversifier.to_le_bytes());
                bytes.extend_from_slice(long_term_key);
            }
            Command::LeLongTermKeyRequestReply {
                connection_handle,
                long_term_key,
            } => {
                bytes.extend_from_slice(&connection_handle.to_le_bytes());
                bytes.extend_from_slice(long_term_key);
            }
            #[cfg(feature = "debug-commands")]
            Command::DbgReadMemory {
                start_address,
                access_size,
                size,
            } => {
                bytes.extend_from_slice(&start_address.to_le_bytes());
                bytes.push(*access_size);
                bytes.push(*size);
            }
            #[cfg(feature = "debug-commands")]
            Command::DbgWriteMemory {
                start_address,
                access_size,
                data,
            } => {
                bytes.extend_from_slice(&start_address.to_le_bytes());
                bytes.push(*access_size);
                push_sized(bytes, data, MAX_DEBUG_DATA_LEN)?;
            }
            #[cfg(feature = "debug-commands")]
            Command::DbgFlashErase {
                flash_type,
                start_offset,
                size,
            } => {
                bytes.push(*flash_type);
                bytes.extend_from_slice(&start_offset.to_le_bytes());
                bytes.extend_from_slice(&size.to_le_bytes());
            }
            #[cfg(feature = "debug-commands")]
            Command::DbgFlashWrite {
                flash_type,
                start_offset,
                data,
            } => {
                bytes.push(*flash_type);
                bytes.extend_from_slice(&start_offset.to_le_bytes());
                push_sized(bytes, data, MAX_DEBUG_DATA_LEN)?;
            }
            #[cfg(feature = "debug-commands")]
            Command::DbgFlashRead {
                flash_type,
                start_offset,
                size,
            } => {
                bytes.push(*flash_type);
                bytes.extend_from_slice(&start_offset.to_le_bytes());
                bytes.push(*size);
            }
        }

        Ok(())
    }

    /// Unpack the parameters of a command
    ///
    /// The length of `parameters` must already be checked against the registry, this only fails
    /// for parameters containing invalid values or an inner length that disagrees with the
    /// parameter length.
    pub(crate) fn unpack_parameters(kind: CommandKind, parameters: &[u8]) -> Result<Self, CodecError> {
        let mut chew = Chew::new(parameters);

        let command = match kind {
            CommandKind::SetEventMask => Command::SetEventMask { mask: chew.array()? },
            CommandKind::Reset => Command::Reset,
            CommandKind::ReadLocalVersionInformation => Command::ReadLocalVersionInformation,
            CommandKind::ReadBdAddr => Command::ReadBdAddr,
            CommandKind::ReadRssi => Command::ReadRssi {
                connection_handle: chew.handle()?,
            },
            CommandKind::LeSetEventMask => Command::LeSetEventMask { mask: chew.array()? },
            CommandKind::LeReadBufferSize => Command::LeReadBufferSize,
            CommandKind::LeSetRandomAddress => Command::LeSetRandomAddress { address: chew.baddr()? },
            CommandKind::LeSetAdvertisingParameters => {
                Command::LeSetAdvertisingParameters(AdvertisingParameters {
                    interval_min: chew.u16()?,
                    interval_max: chew.u16()?,
                    advertising_type: chew.u8()?,
                    own_address_type: chew.u8()?,
                    peer_address_type: chew.u8()?,
                    peer_address: chew.baddr()?,
                    channel_map: chew.u8()?,
                    filter_policy: chew.u8()?,
                })
            }
            CommandKind::LeSetAdvertisingData => Command::LeSetAdvertisingData {
                data: chew.padded_vec::<MAX_ADVERTISING_DATA_LEN>()?,
            },
            CommandKind::LeSetScanResponseData => Command::LeSetScanResponseData {
                data: chew.padded_vec::<MAX_ADVERTISING_DATA_LEN>()?,
            },
            CommandKind::LeSetAdvertisingEnable => Command::LeSetAdvertisingEnable {
                enable: chew.bool("advertising enable")?,
            },
            CommandKind::LeSetScanParameters => Command::LeSetScanParameters(ScanParameters {
                scan_type: chew.u8()?,
                interval: chew.u16()?,
                window: chew.u16()?,
                own_address_type: chew.u8()?,
                filter_policy: chew.u8()?,
            }),
            CommandKind::LeSetScanEnable => Command::LeSetScanEnable {
                enable: chew.bool("scan enable")?,
                filter_duplicates: chew.bool("filter duplicates")?,
            },
            CommandKind::LeCreateConnection => Command::LeCreateConnection(ConnectionParameters {
                scan_interval: chew.u16()?,
                scan_window: chew.u16()?,
                initiator_filter_policy: chew.u8()?,
                peer_address_type: chew.u8()?,
                peer_address: chew.baddr()?,
                own_address_type: chew.u8()?,
                connection_interval_min: chew.u16()?,
                connection_interval_max: chew.u16()?,
                max_latency: chew.u16()?,
                supervision_timeout: chew.u16()?,
                min_ce_length: chew.u16()?,
                max_ce_length: chew.u16()?,
            }),
            CommandKind::LeCreateConnectionCancel => Command::LeCreateConnectionCancel,
            CommandKind::LeReadFilterListSize => Command::LeReadFilterListSize,
            CommandKind::LeClearFilterList => Command::LeClearFilterList,
            CommandKind::LeEncrypt => Command::LeEncrypt {
                key: chew.array()?,
                plaintext: chew.array()?,
            },
            CommandKind::LeRand => Command::LeRand,
            CommandKind::Disconnect => Command::Disconnect {
                connection_handle: chew.handle()?,
                reason: chew.u8()?,
            },
            CommandKind::ReadRemoteVersionInformation => Command::ReadRemoteVersionInformation {
                connection_handle: chew.handle()?,
            },
            CommandKind::LeConnectionUpdate => Command::LeConnectionUpdate(ConnectionUpdateParameters {
                connection_handle: chew.handle()?,
                connection_interval_min: chew.u16()?,
                connection_interval_max: chew.u16()?,
                max_latency: chew.u16()?,
                supervision_timeout: chew.u16()?,
                min_ce_length: chew.u16()?,
                max_ce_length: chew.u16()?,
            }),
            CommandKind::LeReadChannelMap => Command::LeReadChannelMap {
                connection_handle: chew.handle()?,
            },
            CommandKind::LeReadRemoteFeatures => Command::LeReadRemoteFeatures {
                connection_handle: chew.handle()?,
            },
            CommandKind::LeStartEncryption => Command::LeStartEncryption {
                connection_handle: chew.handle()?,
                random_number: chew.array()?,
                encrypted_diversifier: chew.u16()?,
                long_term_key: chew.array()?,
            },
            CommandKind::LeLongTermKeyRequestReply => Command::LeLongTermKeyRequestReply {
                connection_handle: chew.handle()?,
                long_term_key: chew.array()?,
            },
            CommandKind::LeLongTermKeyRequestNegativeReply => Command::LeLongTermKeyRequestNegativeReply {
                connection_handle: chew.handle()?,
            },
            #[cfg(feature = "debug-commands")]
            CommandKind::DbgReadMemory => Command::DbgReadMemory {
                start_address: chew.u32()?,
                access_size: chew.u8()?,
                size: chew.u8()?,
            },
            #[cfg(feature = "debug-commands")]
            CommandKind::DbgWriteMemory => Command::DbgWriteMemory {
                start_address: chew.u32()?,
                access_size: chew.u8()?,
                data: chew.sized_vec()?,
            },
            #[cfg(feature = "debug-commands")]
            CommandKind::DbgFlashIdentify => Command::DbgFlashIdentify,
            #[cfg(feature = "debug-commands")]
            CommandKind::DbgFlashErase => Command::DbgFlashErase {
                flash_type: chew.u8()?,
                start_offset: chew.u32()?,
                size: chew.u32()?,
            },
            #[cfg(feature = "debug-commands")]
            CommandKind::DbgFlashWrite => Command::DbgFlashWrite {
                flash_type: chew.u8()?,
                start_offset: chew.u32()?,
                data: chew.sized_vec()?,
            },
            #[cfg(feature = "debug-commands")]
            CommandKind::DbgFlashRead => Command::DbgFlashRead {
                flash_type: chew.u8()?,
                start_offset: chew.u32()?,
                size: chew.u8()?,
            },
            #[cfg(not(feature = "debug-commands"))]
            CommandKind::DbgReadMemory
            | CommandKind::DbgWriteMemory
            | CommandKind::DbgFlashIdentify
            | CommandKind::DbgFlashErase
            | CommandKind::DbgFlashWrite
            | CommandKind::DbgFlashRead => return Err(CodecError::UnknownOpcode(kind.get_opcode())),
        };

        chew.finish()?;

        Ok(command)
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{} ({:#06x})", self.get_kind(), self.get_opcode())
    }
}
