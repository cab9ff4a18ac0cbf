//! Packed byte layout of the record.
//!
//! Fields are read and written at fixed offsets with no padding. Multi-byte
//! integers are little-endian on every host, matching the records already
//! written by the boards themselves.

use crate::error::FormatError;
use crate::flags::{Features, ModeFlags};
use crate::record::{
    HEADER_SIZE, MAX_RECORD_SIZE, MODESETTING_SIZE, Modesetting, RawRecord, Record, RecordV1,
    RecordV2, SIGNATURE, V1_RECORD_SIZE, V2_RECORD_SIZE, Version,
};
use core::ops::Deref;

pub(crate) mod offset {
    pub const SIGNATURE: usize = 0;
    pub const VERSION: usize = 6;
    /// `reserved` in V1, `page_size` in V2.
    pub const PAGE_SIZE: usize = 7;
    pub const SERIAL: usize = 8;
    pub const MAC: usize = 12;
    pub const FEATURES: usize = 18;
    pub const LVDS1: usize = 20;
    pub const LVDS2: usize = 44;
    pub const HDMI: usize = 68;
    pub const EEPROM_SIZE: usize = 92;
    pub const EEPROMOOPS_OFFSET: usize = 96;
    pub const EEPROMOOPS_LENGTH: usize = 100;

    pub mod modesetting {
        pub const FREQUENCY: usize = 0;
        pub const HACTIVE: usize = 4;
        pub const VACTIVE: usize = 6;
        pub const HBACK_PORCH: usize = 8;
        pub const HFRONT_PORCH: usize = 10;
        pub const HSYNC_LEN: usize = 12;
        pub const VBACK_PORCH: usize = 14;
        pub const VFRONT_PORCH: usize = 16;
        pub const VSYNC_LEN: usize = 18;
        pub const FLAGS: usize = 20;
    }
}

// Compile-time assertions that the offset tables tile each layout exactly
const _: () = assert!(
    offset::FEATURES + 2 == V1_RECORD_SIZE,
    "V1 layout must end after the feature bits"
);
const _: () = assert!(
    offset::LVDS1 == V1_RECORD_SIZE
        && offset::LVDS2 == offset::LVDS1 + MODESETTING_SIZE
        && offset::HDMI == offset::LVDS2 + MODESETTING_SIZE
        && offset::EEPROM_SIZE == offset::HDMI + MODESETTING_SIZE,
    "modesetting blocks must be contiguous"
);
const _: () = assert!(
    offset::EEPROMOOPS_LENGTH + 4 == V2_RECORD_SIZE,
    "V2 layout must end after the oops length"
);
const _: () = assert!(
    offset::modesetting::FLAGS + 4 == MODESETTING_SIZE,
    "modesetting layout must end after its flags"
);
const _: () = assert!(offset::PAGE_SIZE + 1 == HEADER_SIZE);

/// An encoded record. Its length is fixed by the layout it was encoded from.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Encoded {
    buf: [u8; MAX_RECORD_SIZE],
    len: usize,
}

impl Encoded {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Deref for Encoded {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Encoded {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl core::fmt::Debug for Encoded {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.as_bytes()).finish()
    }
}

/// Decodes `bytes` in the layout named by its version byte.
///
/// A buffer whose signature does not match, or whose version byte is unknown,
/// decodes to [`Record::Unknown`] without looking at any other field.
pub fn decode(bytes: &[u8]) -> Result<Record, FormatError> {
    ensure_len(bytes, HEADER_SIZE)?;

    if read_signature(bytes) != SIGNATURE {
        return Ok(Record::Unknown(RawRecord::new(bytes)));
    }

    match Version::from_repr(bytes[offset::VERSION]) {
        Some(Version::V1) => decode_v1(bytes).map(Record::V1),
        Some(Version::V2) => decode_v2(bytes).map(Record::V2),
        None => Ok(Record::Unknown(RawRecord::new(bytes))),
    }
}

/// Decodes `bytes` as `version`, failing if the stored version byte disagrees.
pub fn decode_as(bytes: &[u8], version: Version) -> Result<Record, FormatError> {
    ensure_len(bytes, HEADER_SIZE)?;

    if read_signature(bytes) != SIGNATURE {
        return Err(FormatError::BadSignature);
    }

    let found = bytes[offset::VERSION];
    if found != version as u8 {
        return Err(FormatError::VersionMismatch {
            expected: version,
            found,
        });
    }

    decode(bytes)
}

pub fn decode_v1(bytes: &[u8]) -> Result<RecordV1, FormatError> {
    ensure_len(bytes, V1_RECORD_SIZE)?;

    Ok(RecordV1 {
        signature: read_signature(bytes),
        reserved: bytes[offset::PAGE_SIZE],
        serial: read_u32(bytes, offset::SERIAL),
        mac: read_mac(bytes),
        features: Features::from_bits_retain(read_u16(bytes, offset::FEATURES)),
    })
}

pub fn decode_v2(bytes: &[u8]) -> Result<RecordV2, FormatError> {
    ensure_len(bytes, V2_RECORD_SIZE)?;

    Ok(RecordV2 {
        signature: read_signature(bytes),
        page_size: bytes[offset::PAGE_SIZE],
        serial: read_u32(bytes, offset::SERIAL),
        mac: read_mac(bytes),
        features: Features::from_bits_retain(read_u16(bytes, offset::FEATURES)),
        lvds1: decode_modesetting(bytes, offset::LVDS1),
        lvds2: decode_modesetting(bytes, offset::LVDS2),
        hdmi: decode_modesetting(bytes, offset::HDMI),
        eeprom_size: read_u32(bytes, offset::EEPROM_SIZE),
        eepromoops_offset: read_u32(bytes, offset::EEPROMOOPS_OFFSET),
        eepromoops_length: read_u32(bytes, offset::EEPROMOOPS_LENGTH),
    })
}

/// Encodes `record` in its own layout.
pub fn encode(record: &Record) -> Encoded {
    match record {
        Record::V1(r) => encode_v1(r),
        Record::V2(r) => encode_v2(r),
        Record::Unknown(raw) => {
            let bytes = raw.as_bytes();
            let mut encoded = Encoded {
                buf: [0u8; MAX_RECORD_SIZE],
                len: bytes.len(),
            };
            encoded.buf[..bytes.len()].copy_from_slice(bytes);
            encoded
        }
    }
}

pub fn encode_v1(record: &RecordV1) -> Encoded {
    let mut encoded = Encoded {
        buf: [0u8; MAX_RECORD_SIZE],
        len: V1_RECORD_SIZE,
    };
    let buf = &mut encoded.buf;
    buf[offset::SIGNATURE..offset::SIGNATURE + 6].copy_from_slice(&record.signature);
    buf[offset::VERSION] = Version::V1 as u8;
    buf[offset::PAGE_SIZE] = record.reserved;
    write_u32(buf, offset::SERIAL, record.serial);
    buf[offset::MAC..offset::MAC + 6].copy_from_slice(&record.mac);
    write_u16(buf, offset::FEATURES, record.features.bits());
    encoded
}

pub fn encode_v2(record: &RecordV2) -> Encoded {
    let mut encoded = Encoded {
        buf: [0u8; MAX_RECORD_SIZE],
        len: V2_RECORD_SIZE,
    };
    let buf = &mut encoded.buf;
    buf[offset::SIGNATURE..offset::SIGNATURE + 6].copy_from_slice(&record.signature);
    buf[offset::VERSION] = Version::V2 as u8;
    buf[offset::PAGE_SIZE] = record.page_size;
    write_u32(buf, offset::SERIAL, record.serial);
    buf[offset::MAC..offset::MAC + 6].copy_from_slice(&record.mac);
    write_u16(buf, offset::FEATURES, record.features.bits());
    encode_modesetting(buf, offset::LVDS1, &record.lvds1);
    encode_modesetting(buf, offset::LVDS2, &record.lvds2);
    encode_modesetting(buf, offset::HDMI, &record.hdmi);
    write_u32(buf, offset::EEPROM_SIZE, record.eeprom_size);
    write_u32(buf, offset::EEPROMOOPS_OFFSET, record.eepromoops_offset);
    write_u32(buf, offset::EEPROMOOPS_LENGTH, record.eepromoops_length);
    encoded
}

fn decode_modesetting(bytes: &[u8], base: usize) -> Modesetting {
    use offset::modesetting::*;

    Modesetting {
        frequency: read_u32(bytes, base + FREQUENCY),
        hactive: read_u16(bytes, base + HACTIVE),
        vactive: read_u16(bytes, base + VACTIVE),
        hback_porch: read_u16(bytes, base + HBACK_PORCH),
        hfront_porch: read_u16(bytes, base + HFRONT_PORCH),
        hsync_len: read_u16(bytes, base + HSYNC_LEN),
        vback_porch: read_u16(bytes, base + VBACK_PORCH),
        vfront_porch: read_u16(bytes, base + VFRONT_PORCH),
        vsync_len: read_u16(bytes, base + VSYNC_LEN),
        flags: ModeFlags::from_bits_retain(read_u32(bytes, base + FLAGS)),
    }
}

fn encode_modesetting(buf: &mut [u8], base: usize, m: &Modesetting) {
    use offset::modesetting::*;

    write_u32(buf, base + FREQUENCY, m.frequency);
    write_u16(buf, base + HACTIVE, m.hactive);
    write_u16(buf, base + VACTIVE, m.vactive);
    write_u16(buf, base + HBACK_PORCH, m.hback_porch);
    write_u16(buf, base + HFRONT_PORCH, m.hfront_porch);
    write_u16(buf, base + HSYNC_LEN, m.hsync_len);
    write_u16(buf, base + VBACK_PORCH, m.vback_porch);
    write_u16(buf, base + VFRONT_PORCH, m.vfront_porch);
    write_u16(buf, base + VSYNC_LEN, m.vsync_len);
    write_u32(buf, base + FLAGS, m.flags.bits());
}

fn ensure_len(bytes: &[u8], expected: usize) -> Result<(), FormatError> {
    if bytes.len() < expected {
        return Err(FormatError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

// The helpers below index with fixed offsets; callers have checked the length.

pub(crate) fn read_signature(bytes: &[u8]) -> [u8; 6] {
    let mut signature = [0u8; 6];
    signature.copy_from_slice(&bytes[offset::SIGNATURE..offset::SIGNATURE + 6]);
    signature
}

pub(crate) fn read_mac(bytes: &[u8]) -> [u8; 6] {
    let mut mac = [0u8; 6];
    mac.copy_from_slice(&bytes[offset::MAC..offset::MAC + 6]);
    mac
}

pub(crate) fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn write_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
