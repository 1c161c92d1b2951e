//! L2CAP Channels Definitions

use core::fmt;

/// Channel Identifier
///
/// Channel Identifiers are used by the L2CAP to associate the data with a given channel. This is
/// the channel map of a LE-U logical link. Every raw value has a representation as a received
/// frame can contain any value, `Unassigned` is for the values that a LE-U logical link does not
/// use.
///
/// # Specification Reference
/// See Bluetooth Specification V5 | Vol 3, Part A Section 2.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelIdentifier {
    /// Attribute protocol channel
    AttributeProtocol,
    /// LE signaling channel
    LeSignaling,
    /// Security manager protocol channel
    SecurityManager,
    /// A dynamically allocated channel (`0x0040..=0x007F`)
    Dynamic(u16),
    /// A value that is not assigned for a LE-U logical link
    Unassigned(u16),
}

impl ChannelIdentifier {
    pub const ATT_CID: u16 = 0x0004;
    pub const LE_SIGNALING_CID: u16 = 0x0005;
    pub const SM_CID: u16 = 0x0006;

    pub const DYNAMIC_BOUNDS: core::ops::RangeInclusive<u16> = 0x0040..=0x007F;

    /// Convert this `ChannelIdentifier` to its numerical value
    pub fn to_val(&self) -> u16 {
        match self {
            ChannelIdentifier::AttributeProtocol => Self::ATT_CID,
            ChannelIdentifier::LeSignaling => Self::LE_SIGNALING_CID,
            ChannelIdentifier::SecurityManager => Self::SM_CID,
            ChannelIdentifier::Dynamic(val) | ChannelIdentifier::Unassigned(val) => *val,
        }
    }

    /// Get the channel identifier of a raw value
    pub fn from_raw(val: u16) -> Self {
        match val {
            Self::ATT_CID => ChannelIdentifier::AttributeProtocol,
            Self::LE_SIGNALING_CID => ChannelIdentifier::LeSignaling,
            Self::SM_CID => ChannelIdentifier::SecurityManager,
            _ if Self::DYNAMIC_BOUNDS.contains(&val) => ChannelIdentifier::Dynamic(val),
            _ => ChannelIdentifier::Unassigned(val),
        }
    }

    /// Try to create a dynamic channel identifier
    pub fn try_new_dynamic(val: u16) -> Result<Self, u16> {
        if Self::DYNAMIC_BOUNDS.contains(&val) {
            Ok(ChannelIdentifier::Dynamic(val))
        } else {
            Err(val)
        }
    }

    /// Check if this is one of the fixed channels
    pub fn is_fixed(&self) -> bool {
        matches!(
            self,
            ChannelIdentifier::AttributeProtocol | ChannelIdentifier::LeSignaling | ChannelIdentifier::SecurityManager
        )
    }
}

impl fmt::Display for ChannelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChannelIdentifier::AttributeProtocol => f.write_str("Attribute Protocol"),
            ChannelIdentifier::LeSignaling => f.write_str("LE L2CAP Signaling Channel"),
            ChannelIdentifier::SecurityManager => f.write_str("Security Manager Protocol"),
            ChannelIdentifier::Dynamic(val) => write!(f, "Dynamically Allocated Channel ({:#06x})", val),
            ChannelIdentifier::Unassigned(val) => write!(f, "Unassigned Channel ({:#06x})", val),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn raw_values() {
        assert_eq!(ChannelIdentifier::from_raw(0x4), ChannelIdentifier::AttributeProtocol);
        assert_eq!(ChannelIdentifier::from_raw(0x5), ChannelIdentifier::LeSignaling);
        assert_eq!(ChannelIdentifier::from_raw(0x6), ChannelIdentifier::SecurityManager);
        assert_eq!(ChannelIdentifier::from_raw(0x40), ChannelIdentifier::Dynamic(0x40));
        assert_eq!(ChannelIdentifier::from_raw(0x80), ChannelIdentifier::Unassigned(0x80));
        assert_eq!(ChannelIdentifier::from_raw(0x1), ChannelIdentifier::Unassigned(0x1));

        for raw in [0x0u16, 0x4, 0x5, 0x6, 0x41, 0x7F, 0x1234] {
            assert_eq!(ChannelIdentifier::from_raw(raw).to_val(), raw)
        }
    }

    #[test]
    fn dynamic_bounds() {
        assert!(ChannelIdentifier::try_new_dynamic(0x3F).is_err());
        assert!(ChannelIdentifier::try_new_dynamic(0x7F).is_ok());
        assert!(ChannelIdentifier::try_new_dynamic(0x80).is_err());
    }
}
