//! The compress codec: dictionary compression against three nested regions
//! of the log itself.
//!
//! Offsets alone decide how a record is stored. The first 16 MiB of the log
//! (the war zone) is written as-is and becomes a global dictionary reachable
//! with 3-byte references. Each later 16 MiB window opens with 64 KiB of
//! as-is records (its battlefield), reachable with 2-byte references from
//! within that window. Everything else is a compressed envelope: a sequence
//! of marks encoding literals and back-references into war zone,
//! battlefield, or a 256-byte sliding window over the record being decoded
//! (the frontline).
//!
//! The decoder needs no encoder state: it re-derives the region layout from
//! the id and materializes dictionary references by random-reading the log.

mod reader;
mod writer;

pub use reader::CompressReader;
pub use writer::CompressWriter;

/// Global dictionary region: the first 16 MiB of the log.
pub const WAR_ZONE_SIZE: usize = 1 << 24;
/// Local dictionary region: the first 64 KiB of each later war zone.
pub const BATTLEFIELD_SIZE: usize = 1 << 16;
/// Sliding window over the record being encoded.
pub const FRONTLINE_SIZE: usize = 256;

/// Shortest frontline match worth considering.
pub(crate) const MIN_REPEAT: usize = 3;
/// Battlefield matches must amortize a 2-byte position.
pub(crate) const MIN_REPEAT_BATTLEFIELD: usize = MIN_REPEAT + 1;
/// War-zone matches must amortize a 3-byte position.
pub(crate) const MIN_REPEAT_WAR_ZONE: usize = MIN_REPEAT_BATTLEFIELD + 1;

/// Longest item length a mark carries inline; longer lengths follow as a
/// varint after a zero length field.
pub(crate) const INLINE_LEN_MAX: usize = 63;

// Mark bases: the top two bits select the item kind, the low six hold the
// inline length.
pub(crate) const MARK_WAR_ZONE: u8 = 0;
pub(crate) const MARK_BATTLEFIELD: u8 = 64;
pub(crate) const MARK_FRONTLINE: u8 = 128;
pub(crate) const MARK_LITERAL: u8 = 192;
pub(crate) const MARK_KIND: u8 = 0xc0;
