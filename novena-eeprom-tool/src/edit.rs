use crate::error::Error;
use novena_eeprom::flags::{self, FEATURES};
use novena_eeprom::{Features, FlagList, Modesetting, RecordV2};

/// Field changes requested on the command line. Unset fields keep whatever the
/// normalized record holds.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Edits {
    pub mac: Option<[u8; 6]>,
    pub serial: Option<u32>,
    pub features: Option<Features>,
    pub eepromoops_offset: Option<u32>,
    pub eepromoops_length: Option<u32>,
    pub page_size: Option<u8>,
    pub eeprom_size: Option<u32>,
    pub lvds1: Option<Modesetting>,
    pub lvds2: Option<Modesetting>,
    pub hdmi: Option<Modesetting>,
}

impl Edits {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, record: &mut RecordV2) {
        if let Some(mac) = self.mac {
            record.mac = mac;
        }
        if let Some(serial) = self.serial {
            record.serial = serial;
        }
        if let Some(features) = self.features {
            log::debug!("features: {}", FlagList::new(&FEATURES, features));
            record.features = features;
        }
        if let Some(offset) = self.eepromoops_offset {
            record.eepromoops_offset = offset;
        }
        if let Some(length) = self.eepromoops_length {
            record.eepromoops_length = length;
        }
        if let Some(page_size) = self.page_size {
            record.page_size = page_size;
        }
        if let Some(size) = self.eeprom_size {
            record.eeprom_size = size;
        }
        if let Some(mode) = self.lvds1 {
            record.lvds1 = mode;
        }
        if let Some(mode) = self.lvds2 {
            record.lvds2 = mode;
        }
        if let Some(mode) = self.hdmi {
            record.hdmi = mode;
        }
    }
}

/// Parses an unsigned number in C notation: `0x` hex, a leading `0` for octal,
/// decimal otherwise.
pub fn parse_int<T: TryFrom<u64>>(s: &str) -> Result<T, Error> {
    let invalid = || Error::InvalidNumber(s.to_string());

    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };

    // from_str_radix accepts a sign, C's strtoul callers here do not
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(invalid());
    }

    let value = u64::from_str_radix(digits, radix).map_err(|_| invalid())?;
    T::try_from(value).map_err(|_| Error::NumberTooLarge {
        value,
        bits: (core::mem::size_of::<T>() * 8) as u32,
    })
}

/// `OFFSET` or `OFFSET,LENGTH` of the oops region.
pub fn parse_oops(s: &str) -> Result<(u32, Option<u32>), Error> {
    match s.split_once(',') {
        Some((offset, length)) => Ok((parse_int(offset)?, Some(parse_int(length)?))),
        None => Ok((parse_int(s)?, None)),
    }
}

/// A comma-delimited feature list; the whole list replaces the stored bits.
pub fn parse_features(s: &str) -> Result<Features, Error> {
    flags::parse_list(&FEATURES, s).map_err(|e| Error::UnknownFeature(e.0.to_string()))
}
