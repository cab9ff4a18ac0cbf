use crate::edit::Edits;
use crate::error::Error;
use crate::report::Report;
use embedded_hal::delay::DelayNs;
use novena_eeprom::{Eeprom, Transport};
use std::io::Write;
use std::path::PathBuf;

/// What one invocation of the tool asks for, independent of how it was parsed.
#[derive(Debug, Default, Clone)]
pub struct Invocation {
    pub edits: Edits,
    /// Write the normalized and edited record back to the device.
    pub write: bool,
    /// Load the record from a file instead of reading the device.
    pub import: Option<PathBuf>,
    /// Save the record to a file and do nothing else. An imported record is
    /// saved as is, without reading the device.
    pub export: Option<PathBuf>,
}

/// Carries out `invocation` against `eeprom`, printing the report to `out`.
pub fn run<T, D, W>(
    eeprom: &mut Eeprom<T, D>,
    invocation: &Invocation,
    out: &mut W,
) -> Result<(), Error>
where
    T: Transport,
    D: DelayNs,
    W: Write,
{
    if let Some(path) = &invocation.import {
        eeprom.import(path)?;
        log::info!("imported EEPROM from {}", path.display());
    }

    if let Some(path) = &invocation.export {
        eeprom.export(path)?;
        log::info!("exported EEPROM to {}", path.display());
        return Ok(());
    }

    if !invocation.write {
        if !invocation.edits.is_empty() || invocation.import.is_some() {
            writeln!(out, "Not writing data, as -w was not specified")?;
        }
        writeln!(out, "Current EEPROM settings:")?;
        write!(out, "{}", Report(eeprom.read()?))?;
        return Ok(());
    }

    let outcome = eeprom.provision(|record| invocation.edits.apply(record))?;
    log::debug!("wrote EEPROM, source was {outcome}");

    writeln!(out, "Updated EEPROM.  New values:")?;
    write!(out, "{}", Report(eeprom.read()?))?;
    Ok(())
}
