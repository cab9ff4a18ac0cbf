use crate::codec;
use crate::flags::{Features, ModeFlags};

/// Marker at offset 0 of every initialized record.
pub const SIGNATURE: [u8; 6] = *b"Novena";

/// Encoded size of the version 1 layout.
pub const V1_RECORD_SIZE: usize = 20;
/// Encoded size of the version 2 layout.
pub const V2_RECORD_SIZE: usize = 104;
/// The most bytes any record occupies on the device.
pub const MAX_RECORD_SIZE: usize = V2_RECORD_SIZE;
/// Encoded size of one [`Modesetting`].
pub const MODESETTING_SIZE: usize = 24;

/// Signature, version byte and the byte following it. Every layout starts with these.
pub(crate) const HEADER_SIZE: usize = 8;

/// Record layouts this crate understands, keyed by the version byte at offset 6.
#[derive(strum::FromRepr, strum::Display, Debug, Eq, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Version {
    V1 = 1,
    V2 = 2,
}

impl Version {
    /// Fixed encoded size of this layout.
    pub const fn record_size(self) -> usize {
        match self {
            Version::V1 => V1_RECORD_SIZE,
            Version::V2 => V2_RECORD_SIZE,
        }
    }
}

/// Display timing for one output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modesetting {
    /// Pixel clock in Hz.
    pub frequency: u32,
    pub hactive: u16,
    pub vactive: u16,
    pub hback_porch: u16,
    pub hfront_porch: u16,
    pub hsync_len: u16,
    pub vback_porch: u16,
    pub vfront_porch: u16,
    pub vsync_len: u16,
    pub flags: ModeFlags,
}

impl Modesetting {
    /// An entry with no timing and only the given flags set.
    pub const fn flags_only(flags: ModeFlags) -> Self {
        Self {
            frequency: 0,
            hactive: 0,
            vactive: 0,
            hback_porch: 0,
            hfront_porch: 0,
            hsync_len: 0,
            vback_porch: 0,
            vfront_porch: 0,
            vsync_len: 0,
            flags,
        }
    }
}

/// The original layout: identity and feature bits only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordV1 {
    pub signature: [u8; 6],
    /// Unused byte at offset 7, kept so a V1 record round-trips verbatim.
    pub reserved: u8,
    pub serial: u32,
    pub mac: [u8; 6],
    pub features: Features,
}

/// The current layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordV2 {
    pub signature: [u8; 6],
    /// Bytes the device accepts per write transaction.
    pub page_size: u8,
    pub serial: u32,
    pub mac: [u8; 6],
    pub features: Features,
    pub lvds1: Modesetting,
    pub lvds2: Modesetting,
    pub hdmi: Modesetting,
    /// Total capacity of the device in bytes.
    pub eeprom_size: u32,
    pub eepromoops_offset: u32,
    pub eepromoops_length: u32,
}

/// Device contents that match no known layout: blank, or a version this crate
/// does not know. Holds up to [`MAX_RECORD_SIZE`] bytes as they were read.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawRecord {
    bytes: [u8; MAX_RECORD_SIZE],
    len: usize,
}

impl RawRecord {
    /// Captures the first [`MAX_RECORD_SIZE`] bytes of `bytes`.
    pub fn new(bytes: &[u8]) -> Self {
        let len = bytes.len().min(MAX_RECORD_SIZE);
        let mut raw = Self {
            bytes: [0u8; MAX_RECORD_SIZE],
            len,
        };
        raw.bytes[..len].copy_from_slice(&bytes[..len]);
        raw
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// The full buffer, zero-filled past the captured length, so fixed offsets
    /// are always in range.
    pub(crate) fn padded(&self) -> &[u8; MAX_RECORD_SIZE] {
        &self.bytes
    }
}

impl core::fmt::Debug for RawRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawRecord")
            .field("len", &self.len)
            .field("header", &&self.bytes[..HEADER_SIZE.min(self.len)])
            .finish()
    }
}

/// A decoded record in whatever layout the device held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    V1(RecordV1),
    V2(RecordV2),
    Unknown(RawRecord),
}

/// Accessors for the fields every layout places at the same offsets.
impl Record {
    pub fn signature(&self) -> [u8; 6] {
        match self {
            Record::V1(r) => r.signature,
            Record::V2(r) => r.signature,
            Record::Unknown(raw) => codec::read_signature(raw.padded()),
        }
    }

    pub fn has_valid_signature(&self) -> bool {
        self.signature() == SIGNATURE
    }

    /// The version byte as stored.
    pub fn version(&self) -> u8 {
        match self {
            Record::V1(_) => Version::V1 as u8,
            Record::V2(_) => Version::V2 as u8,
            Record::Unknown(raw) => raw.padded()[codec::offset::VERSION],
        }
    }

    pub fn serial(&self) -> u32 {
        match self {
            Record::V1(r) => r.serial,
            Record::V2(r) => r.serial,
            Record::Unknown(raw) => codec::read_u32(raw.padded(), codec::offset::SERIAL),
        }
    }

    pub fn mac(&self) -> [u8; 6] {
        match self {
            Record::V1(r) => r.mac,
            Record::V2(r) => r.mac,
            Record::Unknown(raw) => codec::read_mac(raw.padded()),
        }
    }

    pub fn features(&self) -> Features {
        match self {
            Record::V1(r) => r.features,
            Record::V2(r) => r.features,
            Record::Unknown(raw) => Features::from_bits_retain(codec::read_u16(
                raw.padded(),
                codec::offset::FEATURES,
            )),
        }
    }

    /// The current-layout view, if the record already is one.
    pub fn as_v2(&self) -> Option<&RecordV2> {
        match self {
            Record::V2(r) => Some(r),
            _ => None,
        }
    }
}

impl From<RecordV1> for Record {
    fn from(value: RecordV1) -> Self {
        Record::V1(value)
    }
}

impl From<RecordV2> for Record {
    fn from(value: RecordV2) -> Self {
        Record::V2(value)
    }
}
