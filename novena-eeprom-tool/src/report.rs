//! Human-readable dump of a record.

use crate::mac::Mac;
use crate::modeline::Modeline;
use novena_eeprom::flags::{FEATURES, FlagInfo, MODE_FLAGS};
use novena_eeprom::{FlagSummary, Modesetting, Record};
use std::fmt::{self, Write};

/// Every field the record's layout carries, one per line, tab-indented.
///
/// Records of an unknown layout show only the fields every layout shares.
pub struct Report<'a>(pub &'a Record);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.0;

        f.write_str("\tSignature:        ")?;
        for byte in record.signature() {
            write!(f, "{}", core::ascii::escape_default(byte))?;
        }
        writeln!(f)?;
        writeln!(f, "\tVersion:          {}", record.version())?;
        writeln!(f, "\tSerial:           {}", record.serial())?;
        writeln!(f, "\tMAC:              {}", Mac(&record.mac()))?;
        writeln!(
            f,
            "\tFeatures:         {}",
            FlagSummary::new(&FEATURES, record.features())
        )?;

        let Some(v2) = record.as_v2() else {
            return Ok(());
        };

        writeln!(f, "\tEEPROM size:      {}", v2.eeprom_size)?;
        writeln!(f, "\tEEPROM page size: {}", v2.page_size)?;
        writeln!(f, "\tOops offset:      {}", v2.eepromoops_offset)?;
        writeln!(f, "\tOops length:      {}", v2.eepromoops_length)?;

        write_channel(f, "LVDS channel 1", "lvds1", &v2.lvds1)?;
        write_channel(f, "LVDS channel 2", "lvds2", &v2.lvds2)?;
        write_channel(f, "HDMI channel", "hdmi", &v2.hdmi)
    }
}

fn write_channel(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    name: &str,
    mode: &Modesetting,
) -> fmt::Result {
    writeln!(f, "\t{title}:")?;
    writeln!(f, "\t\t{}", Modeline { name, mode })?;
    writeln!(f, "\t\tFlags: {}", FlagSummary::new(&MODE_FLAGS, mode.flags))
}

/// The flag tables and a modeline example, for the end of `--help`.
pub fn flag_help() -> String {
    let mut help = String::new();

    help.push_str("Valid features:\n");
    push_table(&mut help, &FEATURES, 12);

    help.push_str(
        "\nModelines should be specified entirely in quotes. Flags come at the end. You\n\
         may specify positive polarity with either the modesetting convention,\n\
         or as a flag. E.g. either +HSync or hsync_polarity. For example:\n\n    \
         -1 'Modeline \"lvds1\" 148.500  1920 2068 2156 2200   1080 1116 1120 1125 \
         +HSync +VSync channel_present dual_channel mapping_jeida data_width_8bit'\n\n",
    );

    help.push_str("Valid modeline flags:\n");
    push_table(&mut help, &MODE_FLAGS, 25);

    help.push_str("\nExample:\n  novena-eeprom -f es8328,edp -s 12345 -w\n");
    help
}

fn push_table<F>(out: &mut String, table: &[FlagInfo<F>], width: usize) {
    for row in table {
        // writing to a String cannot fail
        let _ = writeln!(out, "    {:<width$}{}", row.name, row.description);
    }
}
