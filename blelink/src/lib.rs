//! A Bluetooth Low Energy link layer for the host
//!
//! blelink implements the host side of the Host Controller Interface (HCI) transported over a
//! UART, and the part of the Logical Link Control and Adaptation Protocol (L2CAP) needed to carry
//! the fixed channels of a LE-U logical link. It is intended to be used in environments where only
//! [`core`](https://doc.rust-lang.org/core/) and [`alloc`](https://doc.rust-lang.org/alloc/) are
//! available.
//!
//! The entry point is the [`TransportSession`](hci::TransportSession) within the module [`hci`].
//! It frames the byte stream from the controller into packets, dispatches commands and events to
//! the layers above the HCI, and recombines ACL data into L2CAP PDUs.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub use blelink_core::{BluetoothDeviceAddress, Error};

/// The Host Controller Interface
pub mod hci {
    pub use blelink_hci_host::{
        acl, codec, commands, events, registry, AclBroadcastFlag, AclPacketBoundary, CodecError, Command,
        CommandKind, DestinationTask, Event, HciAclData, ReturnParameters,
    };
    pub use blelink_hci_interface::*;
    pub use blelink_hci_util::{events::MessageId, opcodes, ConnectionHandle, HciPacketType};
}

/// The Logical Link Control and Adaptation Protocol
pub mod l2cap {
    pub use blelink_l2cap::*;
}
