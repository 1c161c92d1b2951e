//! The opcode and message registry
//!
//! Every command and event known to this crate has an entry within one of the static tables here.
//! An entry describes the expected parameter length and the pack style of the message, and which
//! typed codec is used to unpack it. A message without an entry is unknown and its bytes are
//! discarded by the transport framer.
//!
//! The length within an [`EventEntry`] is the length of the parameters that follow the routing
//! fields of the event. For a Command Status event this is always the one byte status.
//!
//! The tables are sorted, commands by opcode and events by [`MessageId`], so that a lookup is a
//! binary search of each table.

use crate::commands::CommandKind;
use crate::events::{DestinationTask, EventKind, ReturnKind};
use blelink_hci_util::events::{EventCode, LeSubevent, MessageId};
use blelink_hci_util::{PackStyle, ParameterLength};

/// A registry entry for a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeEntry {
    pub opcode: u16,
    pub param_len: ParameterLength,
    pub style: PackStyle,
    pub kind: CommandKind,
}

impl OpcodeEntry {
    const fn new(kind: CommandKind, param_len: ParameterLength, style: PackStyle) -> Self {
        OpcodeEntry {
            opcode: kind.get_opcode(),
            param_len,
            style,
            kind,
        }
    }
}

/// A registry entry for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventEntry {
    pub msg_id: MessageId,
    pub dest: DestinationTask,
    pub size: ParameterLength,
    pub style: PackStyle,
    pub kind: EventKind,
}

const fn fixed(len: u8) -> ParameterLength {
    ParameterLength::Fixed(len)
}

macro_rules! opcode_table {
    ( $( $kind:ident, $len:expr, $style:ident; )* ) => {
        &[ $( OpcodeEntry::new(CommandKind::$kind, $len, PackStyle::$style), )* ]
    };
}

/// Commands processed by the link layer manager
pub static LLM_COMMANDS: &[OpcodeEntry] = opcode_table! {
    SetEventMask, fixed(8), Aligned;
    Reset, fixed(0), Basic;
    ReadLocalVersionInformation, fixed(0), Basic;
    ReadBdAddr, fixed(0), Basic;
    LeSetEventMask, fixed(8), Aligned;
    LeReadBufferSize, fixed(0), Basic;
    LeSetRandomAddress, fixed(6), Aligned;
    LeSetAdvertisingParameters, fixed(15), Padded;
    LeSetAdvertisingData, fixed(32), Aligned;
    LeSetScanResponseData, fixed(32), Aligned;
    LeSetAdvertisingEnable, fixed(1), Aligned;
    LeSetScanParameters, fixed(7), Padded;
    LeSetScanEnable, fixed(2), Aligned;
    LeCreateConnection, fixed(25), Padded;
    LeCreateConnectionCancel, fixed(0), Basic;
    LeReadFilterListSize, fixed(0), Basic;
    LeClearFilterList, fixed(0), Basic;
    LeEncrypt, fixed(32), Aligned;
    LeRand, fixed(0), Basic;
};

/// Commands processed by the link controller
pub static LLC_COMMANDS: &[OpcodeEntry] = opcode_table! {
    Disconnect, fixed(3), Padded;
    ReadRemoteVersionInformation, fixed(2), Aligned;
    ReadRssi, fixed(2), Aligned;
    LeConnectionUpdate, fixed(14), Padded;
    LeReadChannelMap, fixed(2), Aligned;
    LeReadRemoteFeatures, fixed(2), Aligned;
    LeStartEncryption, fixed(28), Padded;
    LeLongTermKeyRequestReply, fixed(18), Padded;
    LeLongTermKeyRequestNegativeReply, fixed(2), Aligned;
};

/// Vendor specific debug commands
#[cfg(feature = "debug-commands")]
pub static DBG_COMMANDS: &[OpcodeEntry] = opcode_table! {
    DbgReadMemory, fixed(6), Padded;
    DbgWriteMemory, ParameterLength::Variable { min: 6, max: 134 }, Padded;
    DbgFlashIdentify, fixed(0), Basic;
    DbgFlashErase, fixed(9), Padded;
    DbgFlashWrite, ParameterLength::Variable { min: 6, max: 134 }, Padded;
    DbgFlashRead, fixed(6), Padded;
};

#[cfg(not(feature = "debug-commands"))]
pub static DBG_COMMANDS: &[OpcodeEntry] = &[];

macro_rules! event_table {
    ( $( $id:expr => $dest:ident, $len:expr, $style:ident, $kind:expr; )* ) => {
        &[ $(
            EventEntry {
                msg_id: $id,
                dest: DestinationTask::$dest,
                size: $len,
                style: PackStyle::$style,
                kind: $kind,
            },
        )* ]
    };
}

const fn event(code: EventCode) -> MessageId {
    MessageId::Event(code.to_val())
}

const fn le(subevent: LeSubevent) -> MessageId {
    MessageId::LeMeta(subevent.to_val())
}

const fn complete(kind: CommandKind) -> MessageId {
    MessageId::CommandComplete(kind.get_opcode())
}

const fn status(kind: CommandKind) -> MessageId {
    MessageId::CommandStatus(kind.get_opcode())
}

const NO_OPERATION: MessageId = MessageId::CommandComplete(0x0000);

const STATUS_ONLY: EventKind = EventKind::CommandComplete(ReturnKind::Status);

/// Events that are not Command Complete or Command Status events
pub static EVENTS: &[EventEntry] = event_table! {
    event(EventCode::DisconnectionComplete) => Gap, fixed(4), Padded, EventKind::DisconnectionComplete;
    event(EventCode::EncryptionChange) => Smp, fixed(4), Padded, EventKind::EncryptionChange;
    event(EventCode::ReadRemoteVersionInformationComplete) => Gap, fixed(8), Padded,
        EventKind::ReadRemoteVersionInformationComplete;
    event(EventCode::HardwareError) => Host, fixed(1), Aligned, EventKind::HardwareError;
    event(EventCode::NumberOfCompletedPackets) => L2cap, ParameterLength::Variable { min: 1, max: 255 }, Padded,
        EventKind::NumberOfCompletedPackets;
    event(EventCode::DataBufferOverflow) => Host, fixed(1), Aligned, EventKind::DataBufferOverflow;
    event(EventCode::EncryptionKeyRefreshComplete) => Smp, fixed(3), Padded, EventKind::EncryptionKeyRefreshComplete;
    le(LeSubevent::ConnectionComplete) => Gap, fixed(18), Padded, EventKind::LeConnectionComplete;
    le(LeSubevent::AdvertisingReport) => Gap, ParameterLength::Variable { min: 11, max: 254 }, Padded,
        EventKind::LeAdvertisingReport;
    le(LeSubevent::ConnectionUpdateComplete) => Gap, fixed(9), Padded, EventKind::LeConnectionUpdateComplete;
    le(LeSubevent::ReadRemoteFeaturesComplete) => Gap, fixed(11), Padded, EventKind::LeReadRemoteFeaturesComplete;
    le(LeSubevent::LongTermKeyRequest) => Smp, fixed(12), Padded, EventKind::LeLongTermKeyRequest;
};

/// Command Complete events for the commands processed by the link layer manager
pub static LLM_COMMAND_COMPLETE_EVENTS: &[EventEntry] = event_table! {
    NO_OPERATION => Host, fixed(0), Basic, EventKind::CommandComplete(ReturnKind::NoOperation);
    complete(CommandKind::SetEventMask) => Host, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::Reset) => Host, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::ReadLocalVersionInformation) => Host, fixed(9), Padded,
        EventKind::CommandComplete(ReturnKind::LocalVersion);
    complete(CommandKind::ReadBdAddr) => Host, fixed(7), Aligned, EventKind::CommandComplete(ReturnKind::BdAddr);
    complete(CommandKind::LeSetEventMask) => Host, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::LeReadBufferSize) => Host, fixed(4), Padded, EventKind::CommandComplete(ReturnKind::BufferSize);
    complete(CommandKind::LeSetRandomAddress) => Gap, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::LeSetAdvertisingParameters) => Gap, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::LeSetAdvertisingData) => Gap, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::LeSetScanResponseData) => Gap, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::LeSetAdvertisingEnable) => Gap, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::LeSetScanParameters) => Gap, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::LeSetScanEnable) => Gap, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::LeCreateConnectionCancel) => Gap, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::LeReadFilterListSize) => Gap, fixed(2), Aligned,
        EventKind::CommandComplete(ReturnKind::FilterListSize);
    complete(CommandKind::LeClearFilterList) => Gap, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::LeEncrypt) => Smp, fixed(17), Aligned, EventKind::CommandComplete(ReturnKind::Encrypt);
    complete(CommandKind::LeRand) => Smp, fixed(9), Aligned, EventKind::CommandComplete(ReturnKind::Rand);
};

/// Command Complete and Command Status events for the commands processed by the link controller
pub static LLC_COMMAND_EVENTS: &[EventEntry] = event_table! {
    complete(CommandKind::ReadRssi) => Gap, fixed(4), Padded, EventKind::CommandComplete(ReturnKind::Rssi);
    complete(CommandKind::LeReadChannelMap) => Gap, fixed(8), Padded,
        EventKind::CommandComplete(ReturnKind::ChannelMap);
    complete(CommandKind::LeLongTermKeyRequestReply) => Smp, fixed(3), Padded,
        EventKind::CommandComplete(ReturnKind::HandleStatus);
    complete(CommandKind::LeLongTermKeyRequestNegativeReply) => Smp, fixed(3), Padded,
        EventKind::CommandComplete(ReturnKind::HandleStatus);
    status(CommandKind::Disconnect) => Gap, fixed(1), Aligned, EventKind::CommandStatus;
    status(CommandKind::ReadRemoteVersionInformation) => Gap, fixed(1), Aligned, EventKind::CommandStatus;
    status(CommandKind::LeCreateConnection) => Gap, fixed(1), Aligned, EventKind::CommandStatus;
    status(CommandKind::LeConnectionUpdate) => Gap, fixed(1), Aligned, EventKind::CommandStatus;
    status(CommandKind::LeReadRemoteFeatures) => Gap, fixed(1), Aligned, EventKind::CommandStatus;
    status(CommandKind::LeStartEncryption) => Smp, fixed(1), Aligned, EventKind::CommandStatus;
};

/// Command Complete events for the vendor specific debug commands
#[cfg(feature = "debug-commands")]
pub static DBG_COMMAND_COMPLETE_EVENTS: &[EventEntry] = event_table! {
    complete(CommandKind::DbgReadMemory) => Debug, ParameterLength::Variable { min: 2, max: 130 }, Padded,
        EventKind::CommandComplete(ReturnKind::DebugData);
    complete(CommandKind::DbgWriteMemory) => Debug, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::DbgFlashIdentify) => Debug, fixed(5), Padded,
        EventKind::CommandComplete(ReturnKind::FlashIdentify);
    complete(CommandKind::DbgFlashErase) => Debug, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::DbgFlashWrite) => Debug, fixed(1), Aligned, STATUS_ONLY;
    complete(CommandKind::DbgFlashRead) => Debug, ParameterLength::Variable { min: 2, max: 130 }, Padded,
        EventKind::CommandComplete(ReturnKind::DebugData);
};

#[cfg(not(feature = "debug-commands"))]
pub static DBG_COMMAND_COMPLETE_EVENTS: &[EventEntry] = &[];

/// Binary search a sorted table for the entry with `key`
fn search<E, K: Ord>(table: &'static [E], key: &K, f: impl FnMut(&E) -> K) -> Option<&'static E> {
    table.binary_search_by_key(key, f).ok().map(|index| &table[index])
}

/// Look up the entry for a command
///
/// The link layer manager, link controller, and debug tables are searched in that order.
pub fn lookup_command(opcode: u16) -> Option<&'static OpcodeEntry> {
    [LLM_COMMANDS, LLC_COMMANDS, DBG_COMMANDS]
        .into_iter()
        .find_map(|table| search(table, &opcode, |entry| entry.opcode))
}

/// Look up the entry for an event message
pub fn lookup_event(msg_id: MessageId) -> Option<&'static EventEntry> {
    match msg_id {
        MessageId::Event(_) | MessageId::LeMeta(_) => search(EVENTS, &msg_id, |entry| entry.msg_id),
        MessageId::CommandComplete(_) | MessageId::CommandStatus(_) => {
            [LLM_COMMAND_COMPLETE_EVENTS, LLC_COMMAND_EVENTS, DBG_COMMAND_COMPLETE_EVENTS]
                .into_iter()
                .find_map(|table| search(table, &msg_id, |entry| entry.msg_id))
        }
    }
}

/// Check if an event code may carry a known message
///
/// This is used at the time the event header is received, before any routing fields are read.
pub fn is_known_event_code(code: u8) -> bool {
    match EventCode::try_from_val(code) {
        Ok(EventCode::CommandComplete | EventCode::CommandStatus | EventCode::LeMeta) => true,
        Ok(_) => lookup_event(MessageId::Event(code)).is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic_style_has_no_parameters() {
        LLM_COMMANDS
            .iter()
            .chain(LLC_COMMANDS)
            .chain(DBG_COMMANDS)
            .filter(|entry| entry.style == PackStyle::Basic)
            .for_each(|entry| assert_eq!(entry.param_len, ParameterLength::Fixed(0), "{}", entry.kind));
    }

    fn is_sorted<E, K: Ord>(table: &[E], f: impl Fn(&E) -> K) -> bool {
        table.windows(2).all(|pair| f(&pair[0]) < f(&pair[1]))
    }

    #[test]
    fn tables_are_sorted() {
        for table in [LLM_COMMANDS, LLC_COMMANDS, DBG_COMMANDS] {
            assert!(is_sorted(table, |entry| entry.opcode));
        }

        for table in [
            EVENTS,
            LLM_COMMAND_COMPLETE_EVENTS,
            LLC_COMMAND_EVENTS,
            DBG_COMMAND_COMPLETE_EVENTS,
        ] {
            assert!(is_sorted(table, |entry| entry.msg_id));
        }
    }

    #[test]
    fn every_entry_is_found() {
        LLM_COMMANDS
            .iter()
            .chain(LLC_COMMANDS)
            .chain(DBG_COMMANDS)
            .for_each(|entry| assert_eq!(lookup_command(entry.opcode), Some(entry)));

        EVENTS
            .iter()
            .chain(LLM_COMMAND_COMPLETE_EVENTS)
            .chain(LLC_COMMAND_EVENTS)
            .chain(DBG_COMMAND_COMPLETE_EVENTS)
            .for_each(|entry| assert_eq!(lookup_event(entry.msg_id), Some(entry)));
    }

    #[test]
    fn aligned_style_has_a_fixed_length() {
        LLM_COMMANDS
            .iter()
            .chain(LLC_COMMANDS)
            .chain(DBG_COMMANDS)
            .filter(|entry| entry.style == PackStyle::Aligned)
            .for_each(|entry| assert!(matches!(entry.param_len, ParameterLength::Fixed(_)), "{}", entry.kind));

        EVENTS
            .iter()
            .chain(LLM_COMMAND_COMPLETE_EVENTS)
            .chain(LLC_COMMAND_EVENTS)
            .chain(DBG_COMMAND_COMPLETE_EVENTS)
            .filter(|entry| entry.style == PackStyle::Aligned)
            .for_each(|entry| assert!(matches!(entry.size, ParameterLength::Fixed(_)), "{}", entry.msg_id));
    }

    #[test]
    fn basic_style_unpacks_without_parameters() {
        LLM_COMMANDS
            .iter()
            .chain(LLC_COMMANDS)
            .chain(DBG_COMMANDS)
            .filter(|entry| entry.style == PackStyle::Basic)
            .for_each(|entry| assert!(
                crate::commands::Command::without_parameters(entry.kind).is_some(),
                "{}",
                entry.kind
            ));
    }

    #[test]
    fn opcodes_are_unique() {
        let all: Vec<_> = LLM_COMMANDS.iter().chain(LLC_COMMANDS).chain(DBG_COMMANDS).collect();

        for (i, entry) in all.iter().enumerate() {
            assert!(
                all[i + 1..].iter().all(|other| other.opcode != entry.opcode),
                "duplicate opcode {:#06x}",
                entry.opcode
            );
        }
    }

    #[test]
    fn command_lookup() {
        let entry = lookup_command(0x0406).unwrap();

        assert_eq!(entry.kind, CommandKind::Disconnect);
        assert_eq!(entry.param_len, ParameterLength::Fixed(3));

        assert!(lookup_command(0x2003).is_none());
    }

    #[cfg(feature = "debug-commands")]
    #[test]
    fn debug_lookup() {
        let entry = lookup_command(0xFC05).unwrap();

        assert_eq!(entry.kind, CommandKind::DbgFlashIdentify);
        assert_eq!(entry.style, PackStyle::Basic);

        assert_eq!(
            lookup_event(MessageId::CommandComplete(0xFC05)).map(|e| e.dest),
            Some(DestinationTask::Debug)
        );
    }

    #[test]
    fn event_lookup() {
        assert_eq!(
            lookup_event(MessageId::CommandComplete(0x0C03)).map(|e| e.kind),
            Some(STATUS_ONLY)
        );

        assert_eq!(
            lookup_event(MessageId::CommandStatus(0x0406)).map(|e| e.kind),
            Some(EventKind::CommandStatus)
        );

        assert_eq!(
            lookup_event(MessageId::LeMeta(0x01)).map(|e| e.size),
            Some(ParameterLength::Fixed(18))
        );

        assert!(lookup_event(MessageId::CommandStatus(0x0C03)).is_none());

        assert!(lookup_event(MessageId::Event(0xFF)).is_none());
    }

    #[test]
    fn known_event_codes() {
        assert!(is_known_event_code(0x0E));
        assert!(is_known_event_code(0x05));
        assert!(is_known_event_code(0x3E));
        assert!(!is_known_event_code(0xFF));
        assert!(!is_known_event_code(0x01));
    }
}
