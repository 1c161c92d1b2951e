//! Controller error codes
//!
//! Every HCI event that reports the outcome of an operation carries a one byte status. A status
//! of zero is success, anything else is one of the controller error codes listed in volume one,
//! part F of the Bluetooth Core Specification.

use core::fmt;

macro_rules! controller_errors {
    ( $( $val:literal => $name:ident, $text:literal; )* ) => {
        /// A Controller Error
        ///
        /// This is created from the status byte of an event. Zero becomes `NoError` and any
        /// code that is not listed here becomes `Unknown` so that converting back to the raw
        /// byte is always lossless.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Error {
            NoError,
            Unknown(u8),
            $( $name, )*
        }

        impl Error {
            /// Get the raw error code
            pub fn to_val(self) -> u8 {
                match self {
                    Error::NoError => 0x00,
                    Error::Unknown(val) => val,
                    $( Error::$name => $val, )*
                }
            }
        }

        impl From<u8> for Error {
            fn from(raw: u8) -> Self {
                match raw {
                    0x00 => Error::NoError,
                    $( $val => Error::$name, )*
                    val => Error::Unknown(val),
                }
            }
        }

        impl fmt::Display for Error {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                match self {
                    Error::NoError => f.write_str("no error"),
                    Error::Unknown(val) => write!(f, "unknown error code (0x{:X})", val),
                    $( Error::$name => write!(f, "controller error: {} (0x{:02X})", $text, $val), )*
                }
            }
        }
    };
}

controller_errors! {
    0x01 => UnknownHciCommand, "unknown HCI command";
    0x02 => UnknownConnectionIdentifier, "unknown connection identifier";
    0x03 => HardwareFailure, "hardware failure";
    0x05 => AuthenticationFailure, "authentication failure";
    0x06 => PinOrKeyMissing, "PIN or key missing";
    0x07 => MemoryCapacityExceeded, "memory capacity exceeded";
    0x08 => ConnectionTimeout, "connection timeout";
    0x09 => ConnectionLimitExceeded, "connection limit exceeded";
    0x0B => ConnectionAlreadyExists, "connection already exists";
    0x0C => CommandDisallowed, "command disallowed";
    0x0D => ConnectionRejectedDueToLimitedResources, "connection rejected due to limited resources";
    0x11 => UnsupportedFeatureOrParameterValue, "unsupported feature or parameter value";
    0x12 => InvalidHciCommandParameters, "invalid HCI command parameters";
    0x13 => RemoteUserTerminatedConnection, "remote user terminated connection";
    0x14 => RemoteDeviceTerminatedConnectionDueToLowResources, "remote device terminated connection due to low resources";
    0x15 => RemoteDeviceTerminatedConnectionDueToPowerOff, "remote device terminated connection due to power off";
    0x16 => ConnectionTerminatedByLocalHost, "connection terminated by local host";
    0x1A => UnsupportedRemoteFeature, "unsupported remote feature";
    0x1E => InvalidLlParameters, "invalid LL parameters";
    0x1F => UnspecifiedError, "unspecified error";
    0x20 => UnsupportedLlParameterValue, "unsupported LL parameter value";
    0x22 => LlResponseTimeout, "LL response timeout";
    0x23 => LlProcedureCollision, "LL procedure collision";
    0x25 => EncryptionModeNotAcceptable, "encryption mode not acceptable";
    0x28 => InstantPassed, "instant passed";
    0x29 => PairingWithUnitKeyNotSupported, "pairing with unit key not supported";
    0x2F => InsufficientSecurity, "insufficient security";
    0x3A => ControllerBusy, "controller busy";
    0x3B => UnacceptableConnectionParameters, "unacceptable connection parameters";
    0x3C => AdvertisingTimeout, "advertising timeout";
    0x3D => ConnectionTerminatedDueToMicFailure, "connection terminated due to MIC failure";
    0x3E => ConnectionFailedToBeEstablished, "connection failed to be established";
    0x44 => OperationCancelledByHost, "operation cancelled by host";
    0x45 => PacketTooLong, "packet too long";
}

impl Error {
    /// Convert this into a `Result`
    ///
    /// `NoError` becomes `Ok(())`, everything else is mapped by `err`.
    pub fn ok_or_else<F, E>(self, err: F) -> Result<(), E>
    where
        F: FnOnce(Self) -> E,
    {
        if let Error::NoError = self {
            Ok(())
        } else {
            Err(err(self))
        }
    }

    /// Check if this is a successful status
    pub fn is_success(self) -> bool {
        self == Error::NoError
    }
}

impl From<Error> for u8 {
    fn from(error: Error) -> Self {
        error.to_val()
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
