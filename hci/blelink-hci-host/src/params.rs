//! Field readers for packed parameters

use crate::codec::CodecError;
use alloc::vec::Vec;
use blelink_core::{BluetoothDeviceAddress, Error};
use blelink_hci_util::ConnectionHandle;

/// "Chews off" fields from the front of a parameter buffer
///
/// Every method fails with `Truncated` when there are not enough bytes left for the field.
pub(crate) struct Chew<'a> {
    packet: &'a [u8],
}

impl<'a> Chew<'a> {
    pub(crate) fn new(packet: &'a [u8]) -> Self {
        Chew { packet }
    }

    pub(crate) fn slice(&mut self, size: usize) -> Result<&'a [u8], CodecError> {
        if self.packet.len() < size {
            return Err(CodecError::Truncated);
        }

        let (chewed, rest) = self.packet.split_at(size);

        self.packet = rest;

        Ok(chewed)
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        self.slice(N)?.try_into().map_err(|_| CodecError::Truncated)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, CodecError> {
        self.array::<1>().map(|[byte]| byte)
    }

    pub(crate) fn i8(&mut self) -> Result<i8, CodecError> {
        self.array::<1>().map(i8::from_le_bytes)
    }

    pub(crate) fn u16(&mut self) -> Result<u16, CodecError> {
        self.array::<2>().map(u16::from_le_bytes)
    }

    pub(crate) fn u32(&mut self) -> Result<u32, CodecError> {
        self.array::<4>().map(u32::from_le_bytes)
    }

    pub(crate) fn bool(&mut self, field: &'static str) -> Result<bool, CodecError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(CodecError::InvalidParameter(field)),
        }
    }

    pub(crate) fn status(&mut self) -> Result<Error, CodecError> {
        self.u8().map(Error::from)
    }

    pub(crate) fn handle(&mut self) -> Result<ConnectionHandle, CodecError> {
        ConnectionHandle::try_from(self.u16()?).map_err(|_| CodecError::InvalidParameter("connection handle"))
    }

    pub(crate) fn baddr(&mut self) -> Result<BluetoothDeviceAddress, CodecError> {
        self.array().map(BluetoothDeviceAddress::from_le_bytes)
    }

    /// Chew a one byte length followed by that many bytes
    pub(crate) fn sized_vec(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.u8()?;

        self.slice(len.into()).map(|data| data.to_vec())
    }

    /// Chew a one byte length followed by a fixed size field that the length is within
    pub(crate) fn padded_vec<const N: usize>(&mut self) -> Result<Vec<u8>, CodecError> {
        let len: usize = self.u8()?.into();

        let field = self.array::<N>()?;

        field
            .get(..len)
            .map(|data| data.to_vec())
            .ok_or(CodecError::InvalidParameter("data length"))
    }

    /// There must not be any bytes left
    pub(crate) fn finish(self) -> Result<(), CodecError> {
        if self.packet.is_empty() {
            Ok(())
        } else {
            Err(CodecError::InvalidParameter("trailing bytes"))
        }
    }
}

/// Push a one byte length and `data` padded with zeros to `N` bytes
///
/// # Error
/// `data` cannot be longer than `N` bytes.
pub(crate) fn push_padded<const N: usize>(bytes: &mut Vec<u8>, data: &[u8]) -> Result<(), CodecError> {
    if data.len() > N {
        return Err(CodecError::InvalidParameter("data length"));
    }

    bytes.push(data.len() as u8);

    bytes.extend_from_slice(data);

    bytes.resize(bytes.len() + N - data.len(), 0);

    Ok(())
}

/// Push a one byte length followed by `data`
///
/// # Error
/// `data` cannot be longer than `max` bytes.
pub(crate) fn push_sized(bytes: &mut Vec<u8>, data: &[u8], max: usize) -> Result<(), CodecError> {
    let len = u8::try_from(data.len())
        .ok()
        .filter(|len| usize::from(*len) <= max)
        .ok_or(CodecError::InvalidParameter("data length"))?;

    bytes.push(len);

    bytes.extend_from_slice(data);

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn chew_fields_in_order() {
        let mut chew = Chew::new(&[0x01, 0x40, 0x00, 0xAA, 0xBB, 0xCC, 0xDD, 0x02, 0x10, 0x20]);

        assert_eq!(chew.u8(), Ok(0x01));
        assert_eq!(chew.handle(), Ok(ConnectionHandle::try_from(0x40u16).unwrap()));
        assert_eq!(chew.u32(), Ok(0xDDCCBBAA));
        assert_eq!(chew.sized_vec(), Ok(vec![0x10, 0x20]));
        assert_eq!(chew.finish(), Ok(()));
    }

    #[test]
    fn truncated() {
        let mut chew = Chew::new(&[0x01]);

        assert_eq!(chew.u16(), Err(CodecError::Truncated));
    }

    #[test]
    fn padded_round_trip() {
        let mut bytes = Vec::new();

        push_padded::<31>(&mut bytes, &[1, 2, 3]).unwrap();

        assert_eq!(bytes.len(), 32);

        assert_eq!(Chew::new(&bytes).padded_vec::<31>(), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn oversized_data_is_not_pushed() {
        let mut bytes = Vec::new();

        assert_eq!(
            push_padded::<4>(&mut bytes, &[0; 5]),
            Err(CodecError::InvalidParameter("data length"))
        );

        assert_eq!(
            push_sized(&mut bytes, &[0; 3], 2),
            Err(CodecError::InvalidParameter("data length"))
        );

        assert!(bytes.is_empty());
    }
}
