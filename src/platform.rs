use crate::error::BusError;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c, SevenBitAddress};
use embedded_storage::Storage;

/// 7-bit bus address of the configuration EEPROM (0xAC in 8-bit form).
pub const EEPROM_ADDRESS: SevenBitAddress = 0xac >> 1;

/// Largest data payload a single [`I2cTransport::write`] accepts.
pub const MAX_WRITE_LEN: usize = 256;

/// Addressed access to the memory device.
///
/// Each call is exactly one device transaction. Implementations must not retry;
/// failures carry the offset and length that were attempted.
pub trait Transport {
    /// Fills `bytes` from the device starting at `offset`.
    fn read(&mut self, offset: u16, bytes: &mut [u8]) -> Result<(), BusError>;

    /// Writes `bytes` at `offset`. The device must not be asked to accept more
    /// than one page per call.
    fn write(&mut self, offset: u16, bytes: &[u8]) -> Result<(), BusError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn read(&mut self, offset: u16, bytes: &mut [u8]) -> Result<(), BusError> {
        T::read(self, offset, bytes)
    }

    fn write(&mut self, offset: u16, bytes: &[u8]) -> Result<(), BusError> {
        T::write(self, offset, bytes)
    }
}

/// A 16-bit addressed serial EEPROM on an I2C bus.
///
/// A read is one write-then-read session: two big-endian offset bytes without
/// the read flag, then the data with the read flag, both at the same address.
/// A write is one message whose payload is the offset followed by the data.
pub struct I2cTransport<I> {
    i2c: I,
    address: SevenBitAddress,
}

impl<I: I2c> I2cTransport<I> {
    pub fn new(i2c: I) -> Self {
        Self::with_address(i2c, EEPROM_ADDRESS)
    }

    pub fn with_address(i2c: I, address: SevenBitAddress) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    /// Gives the bus back.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> Transport for I2cTransport<I> {
    fn read(&mut self, offset: u16, bytes: &mut [u8]) -> Result<(), BusError> {
        let len = bytes.len();
        log::trace!("i2c read @{offset:#06x}: [{len}]");

        self.i2c
            .write_read(self.address, &offset.to_be_bytes(), bytes)
            .map_err(|e| {
                log::error!("i2c read @{offset:#06x} failed: {e:?}");
                BusError::new(offset, len, e.kind())
            })
    }

    fn write(&mut self, offset: u16, bytes: &[u8]) -> Result<(), BusError> {
        let len = bytes.len();
        log::trace!("i2c write @{offset:#06x}: [{len}]");

        if len > MAX_WRITE_LEN {
            return Err(BusError::new(offset, len, ErrorKind::Overrun));
        }

        // offset and data go out back to back in a single message
        let mut buf = [0u8; 2 + MAX_WRITE_LEN];
        buf[..2].copy_from_slice(&offset.to_be_bytes());
        buf[2..2 + len].copy_from_slice(bytes);

        self.i2c.write(self.address, &buf[..2 + len]).map_err(|e| {
            log::error!("i2c write @{offset:#06x} failed: {e:?}");
            BusError::new(offset, len, e.kind())
        })
    }
}

/// Keeps the record in any byte-addressable [`Storage`], e.g. an emulated
/// EEPROM in flash or a RAM buffer.
pub struct StorageTransport<S> {
    storage: S,
}

impl<S: Storage> StorageTransport<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn release(self) -> S {
        self.storage
    }
}

impl<S: Storage> Transport for StorageTransport<S> {
    fn read(&mut self, offset: u16, bytes: &mut [u8]) -> Result<(), BusError> {
        let len = bytes.len();
        self.storage
            .read(u32::from(offset), bytes)
            .map_err(|_| BusError::new(offset, len, ErrorKind::Other))
    }

    fn write(&mut self, offset: u16, bytes: &[u8]) -> Result<(), BusError> {
        self.storage
            .write(u32::from(offset), bytes)
            .map_err(|_| BusError::new(offset, bytes.len(), ErrorKind::Other))
    }
}
