//! Normalization of whatever the device held into the current layout.

use crate::flags::{Features, ModeFlags};
use crate::record::{Modesetting, Record, RecordV1, RecordV2, SIGNATURE};

pub const DEFAULT_PAGE_SIZE: u8 = 128;
pub const DEFAULT_EEPROM_SIZE: u32 = 65536;
pub const DEFAULT_EEPROMOOPS_OFFSET: u32 = 4096;
pub const DEFAULT_EEPROMOOPS_LENGTH: u32 = 61440;

pub const DEFAULT_FEATURES: Features = Features::ES8328
    .union(Features::PCIE)
    .union(Features::GBIT)
    .union(Features::HDMI)
    .union(Features::RETINA)
    .union(Features::EEPROMOOPS);

/// 1920x1080 at 148.5 MHz, dual-channel JEIDA 8-bit.
pub const DEFAULT_LVDS1: Modesetting = Modesetting {
    frequency: 148_500_000,
    hactive: 1920,
    vactive: 1080,
    hback_porch: 148,
    hfront_porch: 88,
    hsync_len: 44,
    vback_porch: 36,
    vfront_porch: 4,
    vsync_len: 5,
    flags: ModeFlags::VSYNC_POLARITY
        .union(ModeFlags::HSYNC_POLARITY)
        .union(ModeFlags::DATA_WIDTH_8BIT)
        .union(ModeFlags::MAPPING_JEIDA)
        .union(ModeFlags::DUAL_CHANNEL)
        .union(ModeFlags::CHANNEL_PRESENT),
};

/// Second LVDS channel, slaved to the first.
pub const DEFAULT_LVDS2: Modesetting = Modesetting::flags_only(ModeFlags::CHANNEL_PRESENT);

/// HDMI present, timing taken from EDID.
pub const DEFAULT_HDMI: Modesetting = Modesetting::flags_only(
    ModeFlags::CHANNEL_PRESENT
        .union(ModeFlags::IGNORE_SETTINGS)
        .union(ModeFlags::DATA_WIDTH_8BIT),
);

/// What the device held, judged by signature first and version byte second.
#[derive(strum::Display, Debug, Eq, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    #[strum(to_string = "blank")]
    Blank,
    #[strum(to_string = "v1")]
    V1,
    #[strum(to_string = "v2")]
    V2,
    #[strum(to_string = "unrecognized")]
    Unrecognized,
}

/// How a record was brought to the current layout.
#[derive(strum::Display, Debug, Eq, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Signature missing; defaults were installed.
    #[strum(to_string = "blank")]
    Blank,
    /// A V1 record gained the V2 fields.
    #[strum(to_string = "upgraded")]
    Upgraded,
    /// Already current, passed through untouched.
    #[strum(to_string = "current")]
    Current,
    /// Signature present but the version byte is unknown; defaults were installed.
    #[strum(to_string = "unrecognized (v{version})")]
    Unrecognized { version: u8 },
}

/// A record normalized to the current layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub record: RecordV2,
    pub outcome: Outcome,
}

/// Classifies a decoded record. The signature is checked before anything else.
pub fn classify(record: &Record) -> State {
    match record {
        _ if !record.has_valid_signature() => State::Blank,
        Record::V1(_) => State::V1,
        Record::V2(_) => State::V2,
        Record::Unknown(_) => State::Unrecognized,
    }
}

/// Brings `record` to the current layout.
///
/// Serial, MAC and feature bits of a V1 record are carried over unchanged. A V2
/// record passes through untouched. Blank and unrecognized contents are
/// replaced by [`defaults`].
pub fn migrate(record: &Record) -> Migration {
    let (record, outcome) = match (classify(record), record) {
        (State::V2, Record::V2(v2)) => (*v2, Outcome::Current),
        (State::V1, Record::V1(v1)) => {
            log::info!("Updating v1 EEPROM to v2");
            (upgrade_v1(v1), Outcome::Upgraded)
        }
        (State::Unrecognized, _) => {
            let version = record.version();
            log::warn!("Unrecognized EEPROM version found (v{version}), overwriting with v2");
            (defaults(), Outcome::Unrecognized { version })
        }
        _ => {
            log::info!("Blank EEPROM found, setting defaults");
            (defaults(), Outcome::Blank)
        }
    };

    Migration { record, outcome }
}

/// The record a freshly manufactured board gets.
pub fn defaults() -> RecordV2 {
    RecordV2 {
        signature: SIGNATURE,
        page_size: DEFAULT_PAGE_SIZE,
        serial: 0,
        mac: [0xff; 6],
        features: DEFAULT_FEATURES,
        lvds1: DEFAULT_LVDS1,
        lvds2: DEFAULT_LVDS2,
        hdmi: DEFAULT_HDMI,
        eeprom_size: DEFAULT_EEPROM_SIZE,
        eepromoops_offset: DEFAULT_EEPROMOOPS_OFFSET,
        eepromoops_length: DEFAULT_EEPROMOOPS_LENGTH,
    }
}

/// Adds the V2 fields to a V1 record.
///
/// Display timing is only installed for outputs the feature bits say exist:
/// the default LVDS panel with the eDP bridge, auto-detected HDMI with HDMI.
pub fn upgrade_v1(v1: &RecordV1) -> RecordV2 {
    let mut v2 = RecordV2 {
        signature: v1.signature,
        page_size: DEFAULT_PAGE_SIZE,
        serial: v1.serial,
        mac: v1.mac,
        features: v1.features,
        lvds1: Modesetting::default(),
        lvds2: Modesetting::default(),
        hdmi: Modesetting::default(),
        eeprom_size: DEFAULT_EEPROM_SIZE,
        eepromoops_offset: DEFAULT_EEPROMOOPS_OFFSET,
        eepromoops_length: DEFAULT_EEPROMOOPS_LENGTH,
    };

    if v1.features.contains(Features::RETINA) {
        v2.lvds1 = DEFAULT_LVDS1;
        v2.lvds2 = DEFAULT_LVDS2;
    }

    if v1.features.contains(Features::HDMI) {
        v2.hdmi = DEFAULT_HDMI;
    }

    v2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::record::MAX_RECORD_SIZE;
    use pretty_assertions::assert_eq;

    fn v1(features: Features) -> RecordV1 {
        RecordV1 {
            signature: SIGNATURE,
            reserved: 0,
            serial: 31337,
            mac: [0x02, 0x04, 0x06, 0x08, 0x0a, 0x0c],
            features,
        }
    }

    #[test]
    fn v2_is_a_fixed_point() {
        let mut record = defaults();
        record.serial = 99;
        record.page_size = 32;

        let migrated = migrate(&record.into());
        assert_eq!(migrated.outcome, Outcome::Current);
        assert_eq!(migrated.record, record);
        assert_eq!(
            codec::encode_v2(&migrated.record),
            codec::encode_v2(&record)
        );

        let again = migrate(&migrated.record.into());
        assert_eq!(again.record, migrated.record);
    }

    #[test]
    fn v1_keeps_identity_and_gains_defaults() {
        let source = v1(Features::ES8328 | Features::GBIT);
        let migrated = migrate(&source.into());

        assert_eq!(migrated.outcome, Outcome::Upgraded);
        let r = migrated.record;
        assert_eq!(r.signature, SIGNATURE);
        assert_eq!(r.serial, 31337);
        assert_eq!(r.mac, source.mac);
        assert_eq!(r.features, source.features);
        assert_eq!(r.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(r.eeprom_size, DEFAULT_EEPROM_SIZE);
        assert_eq!(r.eepromoops_offset, DEFAULT_EEPROMOOPS_OFFSET);
        assert_eq!(r.eepromoops_length, DEFAULT_EEPROMOOPS_LENGTH);
        // no display features, no display timing
        assert_eq!(r.lvds1, Modesetting::default());
        assert_eq!(r.lvds2, Modesetting::default());
        assert_eq!(r.hdmi, Modesetting::default());
    }

    #[test]
    fn v1_with_displays_gets_default_timings() {
        let migrated = migrate(&v1(Features::RETINA).into());
        assert_eq!(migrated.record.lvds1, DEFAULT_LVDS1);
        assert_eq!(migrated.record.lvds2, DEFAULT_LVDS2);
        assert_eq!(migrated.record.hdmi, Modesetting::default());

        let migrated = migrate(&v1(Features::HDMI).into());
        assert_eq!(migrated.record.lvds1, Modesetting::default());
        assert_eq!(migrated.record.hdmi, DEFAULT_HDMI);
    }

    #[test]
    fn v1_unknown_feature_bits_survive() {
        let features = Features::PCIE | Features::from_bits_retain(0x2000);
        let migrated = migrate(&v1(features).into());
        assert_eq!(migrated.record.features.bits(), 0x2010);
    }

    #[test]
    fn signature_mismatch_is_blank_whatever_follows() {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = (i * 37 + 11) as u8;
        }
        // a valid-looking version byte must not matter
        buf[6] = 2;
        buf[..6].copy_from_slice(b"Novenb");

        let record = codec::decode(&buf).unwrap();
        let migrated = migrate(&record);
        assert_eq!(migrated.outcome, Outcome::Blank);
        assert_eq!(migrated.record, defaults());
        assert_eq!(migrated.record.page_size, 128);
        assert_eq!(migrated.record.eeprom_size, 65536);
    }

    #[test]
    fn erased_device_is_blank() {
        let record = codec::decode(&[0xffu8; MAX_RECORD_SIZE]).unwrap();
        assert_eq!(classify(&record), State::Blank);
    }

    #[test]
    fn unrecognized_version_is_replaced() {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        buf.copy_from_slice(&codec::encode_v2(&defaults()));
        buf[6] = 9;
        buf[8] = 0x77; // serial must not leak through

        let migrated = migrate(&codec::decode(&buf).unwrap());
        assert_eq!(migrated.outcome, Outcome::Unrecognized { version: 9 });
        assert_eq!(migrated.outcome.to_string(), "unrecognized (v9)");
        assert_eq!(migrated.record, defaults());

        buf[6] = 0;
        assert_eq!(classify(&codec::decode(&buf).unwrap()), State::Unrecognized);
    }

    #[test]
    fn defaults_match_the_factory_image() {
        let d = defaults();
        assert_eq!(d.mac, [0xff; 6]);
        assert_eq!(d.serial, 0);
        assert_eq!(d.features.bits(), 0x00f5);
        assert_eq!(d.lvds1.flags.bits(), 0x3f);
        assert_eq!(d.lvds2.flags.bits(), 0x01);
        assert_eq!(d.hdmi.flags.bits(), 0x61);
    }
}
