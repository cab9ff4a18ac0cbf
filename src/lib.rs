#![doc = include_str!("../README.md")]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod codec;
pub mod error;
pub mod flags;
pub mod migrate;
mod paged;
pub mod platform;
mod record;
mod store;

pub use error::{BusError, Error, FormatError};
#[cfg(feature = "std")]
pub use error::FileError;
pub use flags::{Features, FlagInfo, FlagList, FlagSummary, ModeFlags};
pub use migrate::{Migration, Outcome, State};
pub use paged::{WRITE_CYCLE_MS, write_paged};
pub use platform::{EEPROM_ADDRESS, I2cTransport, StorageTransport, Transport};
pub use record::{
    MAX_RECORD_SIZE, MODESETTING_SIZE, Modesetting, RawRecord, Record, RecordV1, RecordV2,
    SIGNATURE, V1_RECORD_SIZE, V2_RECORD_SIZE, Version,
};
pub use store::Eeprom;
