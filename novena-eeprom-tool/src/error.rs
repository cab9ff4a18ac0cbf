use novena_eeprom::FileError;
use thiserror::Error;

/// Errors of a single tool invocation. Parse errors are raised before the
/// device is touched.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to parse MAC address \"{0}\"")]
    InvalidMac(String),

    #[error("invalid number \"{0}\"")]
    InvalidNumber(String),

    #[error("{value} does not fit in {bits} bits")]
    NumberTooLarge { value: u64, bits: u32 },

    #[error("unrecognized feature \"{0}\"")]
    UnknownFeature(String),

    #[error("invalid modeline: {0}")]
    InvalidModeline(String),

    #[error("unrecognized modeline flag \"{0}\"")]
    UnknownModeFlag(String),

    #[error(transparent)]
    Eeprom(#[from] novena_eeprom::Error),

    #[error(transparent)]
    File(#[from] FileError),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}
