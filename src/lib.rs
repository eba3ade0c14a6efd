//! warlog — an append-only log codec with random record access.
//!
//! Records are framed as `varint(len) || payload || masked crc32c` and are
//! addressed by the byte offset at which their envelope begins; that offset
//! is returned by `add` and is the only key `get` accepts.
//!
//! Two codecs share the envelope:
//!
//! - [`lite::LiteWriter`] / [`lite::LiteReader`] — no compression, but a
//!   group-commit append path that folds concurrent producers into one
//!   storage write per leader batch.
//! - [`compress::CompressWriter`] / [`compress::CompressReader`] — dictionary
//!   compression against three nested regions of the log itself:
//!
//!   | region      | size    | reference width |
//!   |-------------|---------|-----------------|
//!   | war zone    | 16 MiB  | 3-byte offset   |
//!   | battlefield | 64 KiB  | 2-byte offset   |
//!   | frontline   | 256 B   | 1-byte offset   |
//!
//!   The first 16 MiB of the log (the war zone) and the first 64 KiB of each
//!   later war zone (its battlefield) are stored uncompressed and double as
//!   dictionaries. Every other record is encoded as a stream of literals and
//!   back-references, picked per position by a profit model over a
//!   suffix-array search of the two dictionaries plus a sliding-window scan
//!   of the record itself.
//!
//! Storage is abstracted behind [`WriteHelper`] and [`ReadHelper`]; the
//! codecs never touch a file descriptor themselves. [`mem::MemLog`]
//! implements both for in-memory use.
//!
//! ```
//! use warlog::{compress::{CompressReader, CompressWriter}, mem::MemLog};
//!
//! let log = MemLog::new();
//! let mut writer = CompressWriter::new(&log, 0);
//! let span = writer.add(b"hello").unwrap();
//!
//! let reader = CompressReader::new(&log);
//! let mut out = Vec::new();
//! let next = reader.get(span.id, &mut out).unwrap();
//! assert_eq!(out, b"hello");
//! assert_eq!(next, span.id + span.len as u64);
//! ```

use std::io;

use thiserror::Error;

mod bloom;
mod coding;
mod dict;
mod envelope;
mod sais;

pub mod compress;
pub mod crc32c;
pub mod lite;
pub mod mem;

/// Sink half of the storage contract: append exactly `buf` to the log.
///
/// A failed write must not leave a partial append observable to readers.
pub trait WriteHelper {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
}

/// Source half of the storage contract: fill `buf` with the log bytes
/// starting at `offset`.
///
/// Takes `&self` so independent readers can issue reads concurrently.
pub trait ReadHelper {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()>;
}

impl<H: WriteHelper + ?Sized> WriteHelper for &mut H {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).write_all(buf)
    }
}

impl<H: ReadHelper + ?Sized> ReadHelper for &H {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        (**self).read_at(offset, buf)
    }
}

/// Location of an appended envelope: the id accepted by `get` plus the
/// number of log bytes the envelope occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub id: u64,
    pub len: usize,
}

/// Errors surfaced by the read path.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The length prefix at the requested id does not decode as a varint,
    /// or a compressed payload is internally inconsistent.
    #[error("malformed envelope")]
    MalformedEnvelope,
    /// The stored checksum disagrees with the (reconstructed) payload.
    #[error("record checksum mismatch")]
    CrcMismatch,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Largest record accepted by `add`: the envelope of a record must fit a
/// battlefield with room for two worst-case varints and the checksum.
pub const MAX_RECORD_SIZE: usize =
    compress::BATTLEFIELD_SIZE - 2 * coding::MAX_VARINT32_LEN - 4;
