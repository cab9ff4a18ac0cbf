#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, SevenBitAddress};
use embedded_storage::{ReadStorage, Storage};
use std::cell::Cell;
use std::rc::Rc;

pub const DEVICE_ADDRESS: u8 = 0x56;
pub const DEVICE_SIZE: usize = 65536;
/// Internal write cycle of the emulated part.
pub const WRITE_CYCLE_NS: u64 = 10_000_000;

/// Shared time base of the mock device and the mock delay.
#[derive(Clone, Default)]
pub struct Clock(Rc<Cell<u64>>);

impl Clock {
    pub fn now(&self) -> u64 {
        self.0.get()
    }

    fn advance(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

/// Moves the shared clock forward instead of sleeping.
#[derive(Clone, Default)]
pub struct Delay {
    pub clock: Clock,
    pub calls: Rc<Cell<usize>>,
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls.set(self.calls.get() + 1);
        self.clock.advance(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.calls.set(self.calls.get() + 1);
        self.clock.advance(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls.set(self.calls.get() + 1);
        self.clock.advance(u64::from(ms) * 1_000_000);
    }
}

/// One bus session as the device saw it.
#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    /// Pointer write followed by a read in the same session.
    Read { offset: u16, len: usize },
    /// Pointer write followed by data in the same message.
    Write { offset: u16, len: usize },
}

/// A 24xx512-style EEPROM: 16-bit big-endian address pointer, sequential reads,
/// and no acknowledge while an internal write cycle is running.
pub struct Eeprom {
    pub buf: Vec<u8>,
    pub address: u8,
    pub fail_after_operation: usize,
    pub operations: Vec<Operation>,
    /// Raw shape of every session, one entry per leg: `(is_read, len)`.
    pub legs: Vec<Vec<(bool, usize)>>,
    pub clock: Clock,
    busy_until: u64,
}

impl Eeprom {
    pub fn new(clock: Clock) -> Self {
        Self {
            buf: vec![0xffu8; DEVICE_SIZE],
            address: DEVICE_ADDRESS,
            fail_after_operation: usize::MAX,
            operations: Vec::new(),
            legs: Vec::new(),
            clock,
            busy_until: 0,
        }
    }

    pub fn new_with_fault(clock: Clock, fail_after_operation: usize) -> Self {
        Self {
            fail_after_operation,
            ..Self::new(clock)
        }
    }

    pub fn with_contents(clock: Clock, contents: &[u8]) -> Self {
        let mut eeprom = Self::new(clock);
        eeprom.buf[..contents.len()].copy_from_slice(contents);
        eeprom
    }

    pub fn reads(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Read { .. }))
            .count()
    }

    pub fn writes(&self) -> Vec<(u16, usize)> {
        self.operations
            .iter()
            .filter_map(|op| match *op {
                Operation::Write { offset, len } => Some((offset, len)),
                _ => None,
            })
            .collect()
    }

    pub fn dump_operations(&self) {
        println!("Operations:");
        for op in &self.operations {
            println!("  {:?}", op);
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct BusFault(pub ErrorKind);

impl i2c::Error for BusFault {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

impl ErrorType for Eeprom {
    type Error = BusFault;
}

impl I2c<SevenBitAddress> for Eeprom {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.legs.push(
            operations
                .iter()
                .map(|op| match op {
                    i2c::Operation::Read(buf) => (true, buf.len()),
                    i2c::Operation::Write(buf) => (false, buf.len()),
                })
                .collect(),
        );

        if address != self.address {
            println!("    eeprom: no device at 0x{address:02x}");
            return Err(BusFault(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address,
            )));
        }

        if self.clock.now() < self.busy_until {
            println!("    eeprom: busy");
            return Err(BusFault(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address,
            )));
        }

        if self.operations.len() >= self.fail_after_operation {
            println!("    eeprom: FAULT");
            return Err(BusFault(ErrorKind::Bus));
        }

        let mut pointer: Option<usize> = None;
        let mut written = None;
        let mut read = None;

        for op in operations.iter_mut() {
            match op {
                i2c::Operation::Write(bytes) => {
                    let [hi, lo, data @ ..] = &bytes[..] else {
                        return Err(BusFault(ErrorKind::Other));
                    };
                    let offset = usize::from(u16::from_be_bytes([*hi, *lo]));
                    for (i, byte) in data.iter().enumerate() {
                        self.buf[(offset + i) % DEVICE_SIZE] = *byte;
                    }
                    if !data.is_empty() {
                        written = Some((offset, data.len()));
                    }
                    pointer = Some(offset + data.len());
                }
                i2c::Operation::Read(bytes) => {
                    let offset = pointer.unwrap_or(0);
                    for (i, byte) in bytes.iter_mut().enumerate() {
                        *byte = self.buf[(offset + i) % DEVICE_SIZE];
                    }
                    read = Some((offset, bytes.len()));
                    pointer = Some(offset + bytes.len());
                }
            }
        }

        if let Some((offset, len)) = written {
            println!("    eeprom: write: 0x{offset:04X}[0x{len:04X}]");
            self.operations.push(Operation::Write {
                offset: offset as u16,
                len,
            });
            self.busy_until = self.clock.now() + WRITE_CYCLE_NS;
        }

        if let Some((offset, len)) = read {
            println!("    eeprom: read:  0x{offset:04X}[0x{len:04X}]");
            self.operations.push(Operation::Read {
                offset: offset as u16,
                len,
            });
        }

        Ok(())
    }
}

/// Byte-addressable RAM behind the `embedded-storage` traits.
pub struct Ram {
    pub buf: Vec<u8>,
    pub fail: bool,
}

impl Ram {
    pub fn new(size: usize) -> Self {
        Self {
            buf: vec![0xffu8; size],
            fail: false,
        }
    }
}

#[derive(Debug)]
pub struct RamError;

impl ReadStorage for Ram {
    type Error = RamError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        if self.fail || offset + bytes.len() > self.buf.len() {
            return Err(RamError);
        }
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Storage for Ram {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        if self.fail || offset + bytes.len() > self.buf.len() {
            return Err(RamError);
        }
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}
