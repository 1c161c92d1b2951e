//! Core types shared by the `blelink` crates
//!
//! This contains the small vocabulary that both the HCI crates and the host crates need to agree
//! on. That is the controller [`Error`](errors::Error) codes carried within the status field of
//! HCI events and the [`BluetoothDeviceAddress`].

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod errors;

pub use errors::Error;

/// A Bluetooth device address
///
/// This is the six byte address of a Bluetooth device. The bytes are stored in the order they are
/// transferred over the interface (least significant byte first), but the address is displayed in
/// the customary most significant byte first notation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BluetoothDeviceAddress(pub [u8; 6]);

impl BluetoothDeviceAddress {
    /// The number of bytes of an address within a packet
    pub const SIZE: usize = 6;

    /// Create a `BluetoothDeviceAddress` from bytes in transfer order
    pub fn from_le_bytes(bytes: [u8; 6]) -> Self {
        BluetoothDeviceAddress(bytes)
    }

    /// Get the bytes of the address in transfer order
    pub fn to_le_bytes(self) -> [u8; 6] {
        self.0
    }

    /// Try to create an address from the start of a slice
    ///
    /// `None` is returned if `bytes` is shorter than six bytes.
    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; 6] = bytes.get(..Self::SIZE)?.try_into().ok()?;

        Some(BluetoothDeviceAddress(raw))
    }
}

impl core::fmt::Display for BluetoothDeviceAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[5], self.0[4], self.0[3], self.0[2], self.0[1], self.0[0]
        )
    }
}

impl From<[u8; 6]> for BluetoothDeviceAddress {
    fn from(raw: [u8; 6]) -> Self {
        BluetoothDeviceAddress(raw)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn address_display_is_msb_first() {
        let address = BluetoothDeviceAddress::from_le_bytes([0x01, 0x02, 0x03, 0x04, 0x05, 0xC0]);

        assert_eq!(format!("{}", address), "C0:05:04:03:02:01");
    }

    #[test]
    fn address_from_short_slice() {
        assert_eq!(BluetoothDeviceAddress::try_from_slice(&[1, 2, 3]), None);

        assert_eq!(
            BluetoothDeviceAddress::try_from_slice(&[1, 2, 3, 4, 5, 6, 7]),
            Some(BluetoothDeviceAddress([1, 2, 3, 4, 5, 6]))
        );
    }
}
