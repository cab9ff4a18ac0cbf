//! Text form of the Ethernet MAC address.

use crate::error::Error;
use std::fmt;

const SEPARATORS: &[u8] = b"-:.";

/// Parses six hex pairs. Each pair may be followed by one `-`, `:` or `.`;
/// anything left after the sixth pair is an error.
///
/// `00:1f:11:02:03:04`, `00-1F-11-02-03-04` and `001f11020304` are all accepted.
pub fn parse(s: &str) -> Result<[u8; 6], Error> {
    let invalid = || Error::InvalidMac(s.to_string());

    let mut mac = [0u8; 6];
    let mut rest = s.as_bytes();
    for byte in mac.iter_mut() {
        let [hi, lo, tail @ ..] = rest else {
            return Err(invalid());
        };
        hex::decode_to_slice([*hi, *lo], core::slice::from_mut(byte)).map_err(|_| invalid())?;

        rest = match tail {
            [sep, tail @ ..] if SEPARATORS.contains(sep) => tail,
            _ => tail,
        };
    }

    if !rest.is_empty() {
        return Err(invalid());
    }
    Ok(mac)
}

/// Renders as `xx:xx:xx:xx:xx:xx`.
pub struct Mac<'a>(pub &'a [u8; 6]);

impl fmt::Display for Mac<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
