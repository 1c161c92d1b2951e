//! HCI Command Opcodes
//!
//! Opcodes are composed of a group identifier (OGF) and an individual command identifier (OCF)
//! specific to the group. The lower ten bits of the opcode are the OCF and the upper six bits are
//! the OGF.
//!
//! ```
//! # use blelink_hci_util::opcodes::{OpCodeGroup, OpCodePair};
//! let reset = OpCodePair::new(OpCodeGroup::ControllerAndBaseband, 0x3);
//!
//! assert_eq!(0x0C03, reset.into_opcode());
//! ```

use core::fmt;

/// The opcode group field of a command
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpCodeGroup {
    LinkControl,
    LinkPolicy,
    ControllerAndBaseband,
    InformationParameters,
    StatusParameters,
    Testing,
    LeController,
    VendorSpecific,
}

impl OpCodeGroup {
    /// Get the raw OGF value
    pub const fn to_val(self) -> u16 {
        match self {
            OpCodeGroup::LinkControl => 0x01,
            OpCodeGroup::LinkPolicy => 0x02,
            OpCodeGroup::ControllerAndBaseband => 0x03,
            OpCodeGroup::InformationParameters => 0x04,
            OpCodeGroup::StatusParameters => 0x05,
            OpCodeGroup::Testing => 0x06,
            OpCodeGroup::LeController => 0x08,
            OpCodeGroup::VendorSpecific => 0x3F,
        }
    }

    /// Try to get the group from a raw OGF value
    pub fn try_from_val(ogf: u16) -> Result<Self, u16> {
        match ogf {
            0x01 => Ok(OpCodeGroup::LinkControl),
            0x02 => Ok(OpCodeGroup::LinkPolicy),
            0x03 => Ok(OpCodeGroup::ControllerAndBaseband),
            0x04 => Ok(OpCodeGroup::InformationParameters),
            0x05 => Ok(OpCodeGroup::StatusParameters),
            0x06 => Ok(OpCodeGroup::Testing),
            0x08 => Ok(OpCodeGroup::LeController),
            0x3F => Ok(OpCodeGroup::VendorSpecific),
            val => Err(val),
        }
    }
}

impl fmt::Display for OpCodeGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OpCodeGroup::LinkControl => f.write_str("link control"),
            OpCodeGroup::LinkPolicy => f.write_str("link policy"),
            OpCodeGroup::ControllerAndBaseband => f.write_str("controller and baseband"),
            OpCodeGroup::InformationParameters => f.write_str("information parameters"),
            OpCodeGroup::StatusParameters => f.write_str("status parameters"),
            OpCodeGroup::Testing => f.write_str("testing"),
            OpCodeGroup::LeController => f.write_str("LE controller"),
            OpCodeGroup::VendorSpecific => f.write_str("vendor specific"),
        }
    }
}

/// An type for the pair of OGF (OpCode Group Field) and OCF (OpCode Command Field)
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OpCodePair {
    pub ogf: u16,
    pub ocf: u16,
}

impl OpCodePair {
    /// Create a new `OpCodePair`
    pub const fn new(group: OpCodeGroup, ocf: u16) -> Self {
        OpCodePair {
            ogf: group.to_val(),
            ocf,
        }
    }

    /// Get the OpCode Group Field value
    pub fn get_ogf(&self) -> u16 {
        self.ogf
    }

    /// Get the OpCode Command Field value
    pub fn get_ocf(&self) -> u16 {
        self.ocf
    }

    /// Get the group of this opcode
    ///
    /// The raw OGF is returned as the error if it is not a known group.
    pub fn get_group(&self) -> Result<OpCodeGroup, u16> {
        OpCodeGroup::try_from_val(self.ogf)
    }

    /// Convert the OpCodePair into the opcode
    pub const fn into_opcode(self) -> u16 {
        (self.ocf & 0x3FF) | (self.ogf << 10)
    }

    /// Convert an opcode into an OpCodePair
    pub const fn from_opcode(opcode: u16) -> Self {
        OpCodePair {
            ogf: opcode >> 10,
            ocf: opcode & 0x3FF,
        }
    }
}

impl fmt::Display for OpCodePair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.get_group() {
            Ok(group) => write!(f, "{} ({:#x}:{:#x})", group, self.ogf, self.ocf),
            Err(_) => write!(f, "unknown group ({:#x}:{:#x})", self.ogf, self.ocf),
        }
    }
}
