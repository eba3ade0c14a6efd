//! In-memory log storage.
//!
//! Backs the test suites, benches and fuzz targets; also a reasonable
//! starting point for embedding the codecs behind a custom store.

use std::io;
use std::sync::RwLock;

use crate::{ReadHelper, WriteHelper};

/// An append-only byte log in memory, usable as both helper halves.
///
/// Writes take the lock exclusively; reads share it, so concurrent readers
/// satisfy the `read_at` contract.
#[derive(Debug, Default)]
pub struct MemLog {
    buf: RwLock<Vec<u8>>,
}

impl MemLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current log contents.
    pub fn snapshot(&self) -> Vec<u8> {
        self.buf.read().unwrap().clone()
    }

    /// XOR one stored byte, for corruption tests.
    pub fn flip_byte(&self, offset: usize) {
        let mut buf = self.buf.write().unwrap();
        buf[offset] ^= 0xff;
    }
}

impl WriteHelper for MemLog {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.buf.write().unwrap().extend_from_slice(buf);
        Ok(())
    }
}

impl WriteHelper for &MemLog {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.buf.write().unwrap().extend_from_slice(buf);
        Ok(())
    }
}

impl ReadHelper for MemLog {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let log = self.buf.read().unwrap();
        let offset = offset as usize;
        let end = offset
            .checked_add(buf.len())
            .filter(|&end| end <= log.len())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "read past end of log")
            })?;
        buf.copy_from_slice(&log[offset..end]);
        Ok(())
    }
}
