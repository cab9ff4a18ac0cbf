use crate::error::Error;
use crate::platform::Transport;
use embedded_hal::delay::DelayNs;

/// Time the device needs to finish its internal write cycle after each page.
pub const WRITE_CYCLE_MS: u32 = 10;

/// Writes `bytes` at `base` in chunks of `page_size` bytes, the last one clipped.
///
/// Chunks go out one at a time in increasing offset order, each followed by
/// [`WRITE_CYCLE_MS`] of settling. The first failing chunk stops the loop;
/// chunks already written stay on the device.
pub fn write_paged<T, D>(
    transport: &mut T,
    delay: &mut D,
    base: u16,
    bytes: &[u8],
    page_size: usize,
) -> Result<(), Error>
where
    T: Transport + ?Sized,
    D: DelayNs + ?Sized,
{
    if page_size == 0 {
        return Err(Error::InvalidPageSize);
    }

    if usize::from(base) + bytes.len() > usize::from(u16::MAX) + 1 {
        return Err(Error::AddressOverflow {
            offset: base,
            len: bytes.len(),
        });
    }

    for (index, chunk) in bytes.chunks(page_size).enumerate() {
        let start = usize::from(base) + index * page_size;
        let offset = u16::try_from(start).map_err(|_| Error::AddressOverflow {
            offset: base,
            len: bytes.len(),
        })?;

        log::trace!("page write @{offset:#06x}: [{}]", chunk.len());
        transport.write(offset, chunk)?;
        delay.delay_ms(WRITE_CYCLE_MS);
    }

    Ok(())
}
