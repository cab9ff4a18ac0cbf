//! X11-style modelines for the display timing entries.
//!
//! ```text
//! Modeline "lvds1" 148.500  1920 2068 2156 2200   1080 1116 1120 1125 +HSync +VSync dual_channel
//! ```
//!
//! The four horizontal (and vertical) numbers are running sums: active, then
//! active plus back porch, then plus front porch, then plus sync length.

use crate::error::Error;
use novena_eeprom::flags::{self, MODE_FLAGS};
use novena_eeprom::{ModeFlags, Modesetting};
use std::fmt;

/// Parses a full modeline. The first two words (normally `Modeline` and the
/// quoted name) are skipped whatever they say. Flags after the timing are
/// `+HSync`, `-HSync`, `+VSync`, `-VSync` or modesetting flag names, all
/// case-insensitive.
pub fn parse(s: &str) -> Result<Modesetting, Error> {
    let invalid = |what: &str| Error::InvalidModeline(format!("{what} in \"{s}\""));

    let mut words = s.split_whitespace();
    if words.next().is_none() {
        return Err(invalid("missing \"Modeline\" keyword"));
    }
    if words.next().is_none() {
        return Err(invalid("missing mode name"));
    }

    let frequency = words
        .next()
        .ok_or_else(|| invalid("missing pixel clock"))
        .and_then(|mhz| parse_mhz(mhz).ok_or_else(|| invalid("bad pixel clock")))?;

    let mut timing = [0u16; 8];
    for slot in timing.iter_mut() {
        *slot = words
            .next()
            .and_then(|word| word.parse().ok())
            .ok_or_else(|| invalid("expected 8 timing values"))?;
    }
    let [h1, h2, h3, h4, v1, v2, v3, v4] = timing;
    let [hback_porch, hfront_porch, hsync_len] =
        steps(h1, [h2, h3, h4]).ok_or_else(|| invalid("horizontal timing decreases"))?;
    let [vback_porch, vfront_porch, vsync_len] =
        steps(v1, [v2, v3, v4]).ok_or_else(|| invalid("vertical timing decreases"))?;

    let mut mode = Modesetting {
        frequency,
        hactive: h1,
        vactive: v1,
        hback_porch,
        hfront_porch,
        hsync_len,
        vback_porch,
        vfront_porch,
        vsync_len,
        flags: ModeFlags::empty(),
    };

    for word in words {
        match word.to_ascii_lowercase().as_str() {
            "+hsync" => mode.flags.insert(ModeFlags::HSYNC_POLARITY),
            "-hsync" => mode.flags.remove(ModeFlags::HSYNC_POLARITY),
            "+vsync" => mode.flags.insert(ModeFlags::VSYNC_POLARITY),
            "-vsync" => mode.flags.remove(ModeFlags::VSYNC_POLARITY),
            name => {
                let flag = flags::find_ignore_case(&MODE_FLAGS, name)
                    .ok_or_else(|| Error::UnknownModeFlag(word.to_string()))?;
                mode.flags.insert(flag);
            }
        }
    }

    Ok(mode)
}

/// Exact decimal MHz to Hz, e.g. `148.5` to `148_500_000`.
fn parse_mhz(s: &str) -> Option<u32> {
    let (int, frac) = s.split_once('.').unwrap_or((s, ""));
    if int.is_empty() || frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let int: u32 = int.parse().ok()?;
    let frac: u32 = if frac.is_empty() {
        0
    } else {
        frac.parse::<u32>().ok()? * 10u32.pow(6 - frac.len() as u32)
    };
    int.checked_mul(1_000_000)?.checked_add(frac)
}

/// Differences between successive running sums.
fn steps(start: u16, sums: [u16; 3]) -> Option<[u16; 3]> {
    let mut prev = start;
    let mut out = [0u16; 3];
    for (slot, sum) in out.iter_mut().zip(sums) {
        *slot = sum.checked_sub(prev)?;
        prev = sum;
    }
    Some(out)
}

/// Renders an entry back as a modeline with sync polarities, without the
/// remaining flags.
pub struct Modeline<'a> {
    pub name: &'a str,
    pub mode: &'a Modesetting,
}

impl fmt::Display for Modeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mode;
        let polarity = |flag: ModeFlags| if m.flags.contains(flag) { '+' } else { '-' };
        let khz = (u64::from(m.frequency) + 500) / 1000;

        // wide enough that garbage timing cannot overflow the sums
        let h = [m.hback_porch, m.hfront_porch, m.hsync_len].map(u32::from);
        let v = [m.vback_porch, m.vfront_porch, m.vsync_len].map(u32::from);
        let (h1, v1) = (u32::from(m.hactive), u32::from(m.vactive));

        write!(
            f,
            "Modeline \"{}\" {}.{:03}  {} {} {} {}   {} {} {} {} {}HSync {}VSync",
            self.name,
            khz / 1000,
            khz % 1000,
            h1,
            h1 + h[0],
            h1 + h[0] + h[1],
            h1 + h[0] + h[1] + h[2],
            v1,
            v1 + v[0],
            v1 + v[0] + v[1],
            v1 + v[0] + v[1] + v[2],
            polarity(ModeFlags::HSYNC_POLARITY),
            polarity(ModeFlags::VSYNC_POLARITY),
        )
    }
}
