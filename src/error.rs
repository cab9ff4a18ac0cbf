use crate::record::Version;
use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

/// Errors of the EEPROM operations. Marked as non-exhaustive to allow for
/// future additions without breaking the API.
#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A bus transaction did not complete. Nothing is retried.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// The bytes do not form a record of the layout they claim.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A paged write was asked to use chunks of zero bytes.
    #[error("page size must be greater than zero")]
    InvalidPageSize,

    /// The write would run past the 16-bit device address space.
    #[error("write of {len} bytes at offset {offset:#06x} exceeds the device address space")]
    AddressOverflow { offset: u16, len: usize },
}

/// A failed transaction against the memory device.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[error("bus transaction at offset {offset:#06x} ({len} bytes) failed: {kind}")]
pub struct BusError {
    /// Device offset the transaction addressed.
    pub offset: u16,
    /// Number of data bytes the transaction tried to move.
    pub len: usize,
    pub kind: ErrorKind,
}

impl BusError {
    pub fn new(offset: u16, len: usize, kind: ErrorKind) -> Self {
        Self { offset, len, kind }
    }
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// The buffer is shorter than the layout it has to hold.
    #[error("record truncated: need {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Only returned by a decode that was told which layout to expect.
    #[error("record signature mismatch")]
    BadSignature,

    /// Only returned by a decode that was told which layout to expect.
    #[error("expected a {expected} record, found version byte {found}")]
    VersionMismatch { expected: Version, found: u8 },
}

/// Import and export failures.
#[cfg(feature = "std")]
#[derive(Error, Debug)]
pub enum FileError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Eeprom(#[from] Error),
}

#[cfg(feature = "std")]
impl From<FormatError> for FileError {
    fn from(value: FormatError) -> Self {
        FileError::Eeprom(Error::Format(value))
    }
}

#[cfg(feature = "std")]
impl From<BusError> for FileError {
    fn from(value: BusError) -> Self {
        FileError::Eeprom(Error::Bus(value))
    }
}
