use crate::codec;
use crate::error::Error;
use crate::migrate::{self, DEFAULT_PAGE_SIZE, Migration, Outcome};
use crate::paged::write_paged;
use crate::platform::Transport;
use crate::record::{MAX_RECORD_SIZE, Record, RecordV2, SIGNATURE};
use embedded_hal::delay::DelayNs;

#[cfg(feature = "std")]
use crate::error::FileError;
#[cfg(feature = "std")]
use std::path::Path;

/// The configuration record of one device.
///
/// The device is read at most once: the first successful [`Eeprom::read`] (or an
/// import, or a write) fills the cache, and every later access is served from
/// it. The cache stays authoritative for the lifetime of the value.
pub struct Eeprom<T, D> {
    transport: T,
    delay: D,
    cache: Option<Record>,
}

impl<T: Transport, D: DelayNs> Eeprom<T, D> {
    pub fn new(transport: T, delay: D) -> Self {
        Self {
            transport,
            delay,
            cache: None,
        }
    }

    /// Returns the record, reading the full record area from the device only if
    /// nothing is cached yet. A failed read leaves the cache empty.
    pub fn read(&mut self) -> Result<&Record, Error> {
        let record = match self.cache.take() {
            Some(record) => record,
            None => self.load()?,
        };
        Ok(self.cache.insert(record))
    }

    fn load(&mut self) -> Result<Record, Error> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        self.transport.read(0, &mut buf)?;

        let record = codec::decode(&buf)?;
        log::debug!(
            "loaded record: version byte {}, signature {}",
            record.version(),
            if record.has_valid_signature() { "valid" } else { "missing" }
        );
        Ok(record)
    }

    /// The cached record, if the device has been read or the cache populated.
    pub fn cached(&self) -> Option<&Record> {
        self.cache.as_ref()
    }

    /// Makes `record` the cached copy and pushes it to the device page by page,
    /// using the record's own page size.
    ///
    /// A page size of zero falls back to the default chunk size; the record is
    /// still written with the value it holds. A failed chunk is not rolled back.
    pub fn write(&mut self, record: RecordV2) -> Result<(), Error> {
        self.cache = Some(record.into());

        let page_size = match record.page_size {
            0 => {
                log::warn!("record page size is 0, writing in {DEFAULT_PAGE_SIZE}-byte pages");
                DEFAULT_PAGE_SIZE
            }
            n => n,
        };

        let encoded = codec::encode_v2(&record);
        write_paged(
            &mut self.transport,
            &mut self.delay,
            0,
            &encoded,
            usize::from(page_size),
        )
    }

    /// Reads the record, normalizes it to the current layout without writing.
    pub fn normalized(&mut self) -> Result<Migration, Error> {
        self.read().map(migrate::migrate)
    }

    /// Reads and normalizes the record, lets `edit` change it, then writes it
    /// back with a fresh signature. Contents of an unknown version are never
    /// written back as they were.
    pub fn provision<F>(&mut self, edit: F) -> Result<Outcome, Error>
    where
        F: FnOnce(&mut RecordV2),
    {
        let Migration {
            mut record,
            outcome,
        } = self.normalized()?;

        edit(&mut record);
        record.signature = SIGNATURE;

        self.write(record)?;
        Ok(outcome)
    }

    /// Decodes `bytes` into the cache. The device is not touched.
    pub fn import_bytes(&mut self, bytes: &[u8]) -> Result<&Record, Error> {
        let record = codec::decode(bytes)?;
        Ok(self.cache.insert(record))
    }

    /// Encodes the record in its own layout, reading it first if needed.
    pub fn export_bytes(&mut self) -> Result<codec::Encoded, Error> {
        self.read().map(codec::encode)
    }

    /// Gives the bus and the delay back.
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }
}

#[cfg(feature = "std")]
impl<T: Transport, D: DelayNs> Eeprom<T, D> {
    /// Loads the cache from a file holding an encoded record.
    pub fn import(&mut self, path: impl AsRef<Path>) -> Result<&Record, FileError> {
        let bytes = std::fs::read(path)?;
        Ok(self.import_bytes(&bytes)?)
    }

    /// Writes the encoded record to a file, reading the device first if needed.
    pub fn export(&mut self, path: impl AsRef<Path>) -> Result<(), FileError> {
        let encoded = self.export_bytes()?;
        std::fs::write(path, encoded.as_bytes())?;
        Ok(())
    }
}
