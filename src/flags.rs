//! Named bit-set tables and the comma-delimited text form used to edit them.
//!
//! Each table is walked in declaration order, both for lookups and for
//! rendering, so the printed order never depends on the order of the input.

use bitflags::{Flags, bitflags};
use core::fmt;
use thiserror::Error;

bitflags! {
    /// Optional hardware present on the board.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u16 {
        const ES8328 = 0x0001;
        const SENOKO = 0x0002;
        /// eDP bridge chip, historically called "retina".
        const RETINA = 0x0004;
        const PIXELQI = 0x0008;
        const PCIE = 0x0010;
        const GBIT = 0x0020;
        const HDMI = 0x0040;
        const EEPROMOOPS = 0x0080;
        const ROOTSRC_SATA = 0x0100;
    }
}

bitflags! {
    /// Flags attached to a display timing entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModeFlags: u32 {
        /// If unset the output is not present.
        const CHANNEL_PRESENT = 0x01;
        /// Dual-channel LVDS (lvds1 only).
        const DUAL_CHANNEL = 0x02;
        const VSYNC_POLARITY = 0x04;
        const HSYNC_POLARITY = 0x08;
        /// JEIDA pixel mapping. Unset means PSWG.
        const MAPPING_JEIDA = 0x10;
        /// 8-bit data. Unset means 6-bit (LVDS) or 10-bit (HDMI).
        const DATA_WIDTH_8BIT = 0x20;
        /// The output exists but its timing should be auto-detected.
        const IGNORE_SETTINGS = 0x40;
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// One row of a flag table.
#[derive(Debug, Clone, Copy)]
pub struct FlagInfo<F> {
    pub name: &'static str,
    pub flag: F,
    pub description: &'static str,
}

const fn info<F>(name: &'static str, flag: F, description: &'static str) -> FlagInfo<F> {
    FlagInfo {
        name,
        flag,
        description,
    }
}

pub static FEATURES: [FlagInfo<Features>; 9] = [
    info("es8328", Features::ES8328, "ES8328 audio codec"),
    info("senoko", Features::SENOKO, "Senoko battery board"),
    info("edp", Features::RETINA, "eDP bridge chip"),
    info("pixelqi", Features::PIXELQI, "PixelQi LVDS display (deprecated)"),
    info("pcie", Features::PCIE, "PCI Express support"),
    info("gbit", Features::GBIT, "Gigabit Ethernet"),
    info("hdmi", Features::HDMI, "HDMI Output (deprecated)"),
    info("eepromoops", Features::EEPROMOOPS, "EEPROM Oops storage"),
    info("sataroot", Features::ROOTSRC_SATA, "Root device is SATA"),
];

pub static MODE_FLAGS: [FlagInfo<ModeFlags>; 7] = [
    info("channel_present", ModeFlags::CHANNEL_PRESENT, "This channel is present"),
    info("dual_channel", ModeFlags::DUAL_CHANNEL, "Channel is dual-lane"),
    info("vsync_polarity", ModeFlags::VSYNC_POLARITY, "VSync polarity is positive"),
    info("hsync_polarity", ModeFlags::HSYNC_POLARITY, "HSync polarity is positive"),
    info("mapping_jeida", ModeFlags::MAPPING_JEIDA, "Use JEIDA (as opposed to PSWG) mapping"),
    info(
        "data_width_8bit",
        ModeFlags::DATA_WIDTH_8BIT,
        "Use 8-bit (as opposed to 6 [LVDS] or 10 [HDMI] bit)",
    ),
    info(
        "ignore_settings",
        ModeFlags::IGNORE_SETTINGS,
        "Ignore settings and attempt to auto-detect",
    ),
];

/// A name in a flag list that no table row carries.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[error("unrecognized flag \"{0}\"")]
pub struct UnknownFlag<'a>(pub &'a str);

/// Exact-match lookup of a single name.
pub fn find<F: Copy>(table: &[FlagInfo<F>], name: &str) -> Option<F> {
    table.iter().find(|row| row.name == name).map(|row| row.flag)
}

/// ASCII case-insensitive lookup of a single name.
pub fn find_ignore_case<F: Copy>(table: &[FlagInfo<F>], name: &str) -> Option<F> {
    table
        .iter()
        .find(|row| row.name.eq_ignore_ascii_case(name))
        .map(|row| row.flag)
}

/// Parses a comma-delimited list of names into a bit-set.
///
/// Empty items (`"a,,b"`, a trailing comma) are skipped. The first unknown name
/// aborts the parse.
pub fn parse_list<'a, F: Flags + Copy>(
    table: &[FlagInfo<F>],
    list: &'a str,
) -> Result<F, UnknownFlag<'a>> {
    let mut flags = F::empty();
    for word in list.split(',').filter(|word| !word.is_empty()) {
        flags.insert(find(table, word).ok_or(UnknownFlag(word))?);
    }
    Ok(flags)
}

/// Names of the table rows set in `flags`, in table order.
pub fn names<F: Flags + Copy + 'static>(
    table: &'static [FlagInfo<F>],
    flags: F,
) -> impl Iterator<Item = &'static str> {
    table
        .iter()
        .filter(move |row| flags.intersects(row.flag))
        .map(|row| row.name)
}

/// The bits of `flags` not covered by any table row.
pub fn unrecognized<F: Flags + Copy>(table: &[FlagInfo<F>], flags: F) -> F {
    let mut rest = flags;
    for row in table {
        rest.remove(row.flag);
    }
    rest
}

/// Renders a bit-set as `name,name` followed by a note about unknown bits.
///
/// `FlagList::new(&FEATURES, Features::from_bits_retain(0x221))` renders as
/// `es8328,gbit Unrecognized flags: 0x200`.
pub struct FlagList<F: 'static> {
    table: &'static [FlagInfo<F>],
    flags: F,
}

impl<F: Flags + Copy + 'static> FlagList<F> {
    pub fn new(table: &'static [FlagInfo<F>], flags: F) -> Self {
        Self { table, flags }
    }
}

impl<F> fmt::Display for FlagList<F>
where
    F: Flags + Copy + 'static,
    F::Bits: fmt::LowerHex,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut matched = 0;
        for name in names(self.table, self.flags) {
            if matched > 0 {
                f.write_str(",")?;
            }
            f.write_str(name)?;
            matched += 1;
        }

        let rest = unrecognized(self.table, self.flags);
        if !rest.is_empty() {
            if matched > 0 {
                f.write_str(" ")?;
            }
            write!(f, "Unrecognized flags: 0x{:02x}", rest.bits())?;
        }
        Ok(())
    }
}

/// Renders a bit-set as `0x21 (es8328,gbit)`, the raw value first and the
/// names in parentheses, followed by a note about unknown bits if any.
pub struct FlagSummary<F: 'static> {
    table: &'static [FlagInfo<F>],
    flags: F,
}

impl<F: Flags + Copy + 'static> FlagSummary<F> {
    pub fn new(table: &'static [FlagInfo<F>], flags: F) -> Self {
        Self { table, flags }
    }
}

impl<F> fmt::Display for FlagSummary<F>
where
    F: Flags + Copy + 'static,
    F::Bits: fmt::LowerHex,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.flags.bits())?;

        let mut named = names(self.table, self.flags).peekable();
        if named.peek().is_some() {
            f.write_str(" (")?;
            for (i, name) in named.enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                f.write_str(name)?;
            }
            f.write_str(")")?;
        }

        let rest = unrecognized(self.table, self.flags);
        if !rest.is_empty() {
            write!(f, " Unrecognized flags: 0x{:02x}", rest.bits())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::string::ToString;

    fn set_of(rendered: &str) -> BTreeSet<&str> {
        rendered.split(',').filter(|s| !s.is_empty()).collect()
    }

    #[test]
    fn renders_known_bits_in_table_order() {
        let rendered = FlagList::new(&FEATURES, Features::from_bits_retain(0x0021)).to_string();
        assert_eq!(rendered, "es8328,gbit");
        assert_eq!(set_of(&rendered), BTreeSet::from(["es8328", "gbit"]));
    }

    #[test]
    fn parse_is_order_independent() {
        let a = parse_list(&FEATURES, "gbit,es8328,edp").unwrap();
        let b = parse_list(&FEATURES, "edp,gbit,es8328").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Features::GBIT | Features::ES8328 | Features::RETINA);

        let rendered = FlagList::new(&FEATURES, a).to_string();
        assert_eq!(set_of(&rendered), BTreeSet::from(["es8328", "edp", "gbit"]));
        assert_eq!(parse_list(&FEATURES, &rendered).unwrap(), a);
    }

    #[test]
    fn every_feature_subset_survives_render_and_parse() {
        assert_eq!(FEATURES.len(), 9);
        for mask in 0u32..1 << FEATURES.len() {
            let chosen: Vec<_> = FEATURES
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, row)| row)
                .collect();
            let expected = chosen
                .iter()
                .fold(Features::empty(), |acc, row| acc | row.flag);

            let rendered = FlagList::new(&FEATURES, expected).to_string();
            assert_eq!(parse_list(&FEATURES, &rendered), Ok(expected), "{rendered}");

            let reversed: Vec<_> = chosen.iter().rev().map(|row| row.name).collect();
            let reversed = reversed.join(",");
            assert_eq!(parse_list(&FEATURES, &reversed), Ok(expected), "{reversed}");
        }
    }

    #[test]
    fn parse_names_the_offending_token() {
        assert_eq!(
            parse_list(&FEATURES, "es8328,retina,gbit"),
            Err(UnknownFlag("retina"))
        );
        assert_eq!(
            UnknownFlag("retina").to_string(),
            "unrecognized flag \"retina\""
        );
    }

    #[test]
    fn parse_skips_empty_items() {
        assert_eq!(parse_list(&FEATURES, ""), Ok(Features::empty()));
        assert_eq!(parse_list(&FEATURES, ",pcie,,"), Ok(Features::PCIE));
    }

    #[test]
    fn unknown_bits_are_kept_and_reported() {
        let flags = Features::from_bits_retain(0x8021);
        assert_eq!(flags.bits(), 0x8021);
        assert_eq!(unrecognized(&FEATURES, flags).bits(), 0x8000);
        assert_eq!(
            FlagList::new(&FEATURES, flags).to_string(),
            "es8328,gbit Unrecognized flags: 0x8000"
        );
        assert_eq!(
            FlagList::new(&MODE_FLAGS, ModeFlags::from_bits_retain(0x100)).to_string(),
            "Unrecognized flags: 0x100"
        );
    }

    #[test]
    fn summary_leads_with_the_raw_value() {
        assert_eq!(
            FlagSummary::new(&FEATURES, Features::from_bits_retain(0x0021)).to_string(),
            "0x21 (es8328,gbit)"
        );
        assert_eq!(
            FlagSummary::new(&FEATURES, Features::from_bits_retain(0x8001)).to_string(),
            "0x8001 (es8328) Unrecognized flags: 0x8000"
        );
        assert_eq!(
            FlagSummary::new(&MODE_FLAGS, ModeFlags::from_bits_retain(0x80)).to_string(),
            "0x80 Unrecognized flags: 0x80"
        );
        assert_eq!(FlagSummary::new(&FEATURES, Features::empty()).to_string(), "0x0");
    }

    #[test]
    fn mode_flag_lookup_ignores_case() {
        assert_eq!(
            find_ignore_case(&MODE_FLAGS, "Mapping_JEIDA"),
            Some(ModeFlags::MAPPING_JEIDA)
        );
        assert_eq!(find(&MODE_FLAGS, "Mapping_JEIDA"), None);
    }
}
