//! The Host side of the Host Controller Interface
//!
//! This crate contains the messages that are passed between the host and the controller along
//! with the tables that describe them.
//!
//! ## Commands and Events
//! The commands are within the module [`commands`] and the events within [`events`]. Every command
//! opcode and every event message has an entry within the [`registry`], the entry is what
//! determines the length of the parameters and which upper task an event is dispatched to. The
//! module [`codec`] packs and unpacks the messages into their packet form.
//!
//! ## ACL Data
//! [`HciAclData`] is the HCI ACL data packet. With the `l2cap` feature the module [`l2cap`]
//! converts between HCI ACL data packets and L2CAP fragments.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod acl;
pub mod codec;
pub mod commands;
pub mod events;
#[cfg(feature = "l2cap")]
pub mod l2cap;
mod params;
pub mod registry;

pub use acl::{AclBroadcastFlag, AclHeader, AclPacketBoundary, HciAclData, HciAclPacketError};
pub use codec::{CodecError, CommandHeader, EventHeader, EventRouting};
pub use commands::{Command, CommandKind};
pub use events::{DestinationTask, Event, EventKind, ReturnParameters};
