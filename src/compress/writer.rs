//! Compress-codec append path: region bookkeeping, dictionary index
//! construction, and the mark/profit encoder.

use std::io;

use crate::coding::{self, MAX_VARINT32_LEN};
use crate::dict::DictIndex;
use crate::{crc32c, envelope, Span, WriteHelper, MAX_RECORD_SIZE};

use super::{
    BATTLEFIELD_SIZE, FRONTLINE_SIZE, INLINE_LEN_MAX, MARK_BATTLEFIELD, MARK_FRONTLINE,
    MARK_LITERAL, MARK_WAR_ZONE, MIN_REPEAT, MIN_REPEAT_BATTLEFIELD, MIN_REPEAT_WAR_ZONE,
    WAR_ZONE_SIZE,
};

/// Single-producer append half of the compress codec.
///
/// Owns the dictionary regions and their indexes; readers never need them.
/// Not thread-safe — one logical producer drives [`add`](Self::add).
pub struct CompressWriter<H> {
    helper: H,
    cursor: u64,
    /// Scratch the next envelope is assembled in.
    backup: Vec<u8>,
    war_zone: Vec<u8>,
    battlefield: Vec<u8>,
    war_zone_index: Option<DictIndex>,
    battlefield_index: Option<DictIndex>,
}

impl<H: WriteHelper> CompressWriter<H> {
    /// A writer appending through `helper`, with `cursor` naming the log
    /// offset the next envelope lands at. A fresh log starts at 0; resuming
    /// at a later offset assumes the caller has replayed the log so the
    /// dictionary regions match what readers will fetch.
    pub fn new(helper: H, cursor: u64) -> Self {
        CompressWriter {
            helper,
            cursor,
            backup: Vec::new(),
            war_zone: Vec::with_capacity(WAR_ZONE_SIZE),
            battlefield: Vec::with_capacity(BATTLEFIELD_SIZE),
            war_zone_index: None,
            battlefield_index: None,
        }
    }

    /// Append `record`, returning the id (and encoded length) of its
    /// envelope.
    ///
    /// The id alone decides the payload form: war zone #0 and the leading
    /// battlefield of every later war zone store records as-is, everything
    /// else is mark-encoded. Blocks for the dictionary index build when an
    /// append completes a region.
    ///
    /// # Panics
    ///
    /// If `record` exceeds [`MAX_RECORD_SIZE`]; callers size-check first.
    pub fn add(&mut self, record: &[u8]) -> io::Result<Span> {
        assert!(
            record.len() <= MAX_RECORD_SIZE,
            "record of {} bytes exceeds the battlefield envelope bound",
            record.len(),
        );

        let id = self.cursor;
        let wz_index = id / WAR_ZONE_SIZE as u64;
        let wz_rem = (id % WAR_ZONE_SIZE as u64) as usize;

        let len = if wz_index == 0 {
            let start = self.generate_plain(record);
            let len = self.backup.len() - start;
            self.helper.write_all(&self.backup[start..])?;

            let left = WAR_ZONE_SIZE - wz_rem;
            if left > len {
                self.war_zone.extend_from_slice(&self.backup[start..]);
            } else {
                // This envelope completes the war zone; the tail past the
                // boundary opens war zone #1's battlefield.
                self.war_zone
                    .extend_from_slice(&self.backup[start..start + left]);
                self.war_zone_index =
                    Some(DictIndex::build(&self.war_zone, MIN_REPEAT_WAR_ZONE));
                self.battlefield
                    .extend_from_slice(&self.backup[start + left..]);
            }
            len
        } else if wz_rem < BATTLEFIELD_SIZE {
            let start = self.generate_plain(record);
            let len = self.backup.len() - start;
            self.helper.write_all(&self.backup[start..])?;

            let left = BATTLEFIELD_SIZE - wz_rem;
            if left > len {
                self.battlefield.extend_from_slice(&self.backup[start..]);
            } else {
                // Bytes past the battlefield boundary are compressed-zone
                // territory, not dictionary material.
                self.battlefield
                    .extend_from_slice(&self.backup[start..start + left]);
                self.battlefield_index = Some(DictIndex::build(
                    &self.battlefield,
                    MIN_REPEAT_BATTLEFIELD,
                ));
            }
            len
        } else {
            let start = self.generate_compressed(record);
            let len = self.backup.len() - start;
            self.helper.write_all(&self.backup[start..])?;

            let left = WAR_ZONE_SIZE - wz_rem;
            if left <= len {
                // The envelope straddles the war-zone boundary: its tail is
                // the first bytes of the next war zone and therefore seeds
                // the next battlefield.
                self.battlefield.clear();
                self.battlefield_index = None;
                self.battlefield
                    .extend_from_slice(&self.backup[start + left..]);
            }
            len
        };

        self.cursor += len as u64;
        Ok(Span { id, len })
    }

    /// Assemble the plain envelope of `record` in `backup`; returns the
    /// offset the envelope starts at (always 0 for plain).
    fn generate_plain(&mut self, record: &[u8]) -> usize {
        self.backup.clear();
        envelope::append_plain(&mut self.backup, record);
        0
    }

    /// Mark-encode `record` into `backup`; returns the offset the envelope
    /// starts at. Five bytes are reserved up front so the payload-size
    /// varint can be written in place once the payload is complete.
    fn generate_compressed(&mut self, record: &[u8]) -> usize {
        debug_assert_eq!(self.war_zone.len(), WAR_ZONE_SIZE);
        debug_assert_eq!(self.battlefield.len(), BATTLEFIELD_SIZE);
        let wz_index = self
            .war_zone_index
            .as_ref()
            .expect("war zone index is built before the compressed zone begins");
        let bf_index = self
            .battlefield_index
            .as_ref()
            .expect("battlefield index is built before the compressed zone begins");

        let backup = &mut self.backup;
        backup.clear();
        backup.resize(MAX_VARINT32_LEN, 0);

        // Pending literal run, as a range of `record`. Always ends at the
        // current encode position when non-empty.
        let mut lit_start = 0usize;
        let mut lit_end = 0usize;

        let mut i = 0usize;
        loop {
            let pattern = &record[i..];
            if pattern.len() < MIN_REPEAT {
                lit_end = record.len();
                break;
            }

            let (wz_pos, wz_len) = wz_index.find_longest_repeat(&self.war_zone, pattern);
            let (bf_pos, bf_len) = bf_index.find_longest_repeat(&self.battlefield, pattern);
            let (fl_pos, fl_len) = find_frontline(record, i);

            let profits = [
                profit(wz_len, 3),
                profit(bf_len, 2),
                profit(fl_len, 1),
            ];
            // First maximum wins: war zone over battlefield over frontline.
            let mut best = 0;
            for candidate in 1..profits.len() {
                if profits[candidate] > profits[best] {
                    best = candidate;
                }
            }

            if profits[best] > 0 {
                emit_literal(backup, &record[lit_start..lit_end]);
                let len = match best {
                    0 => {
                        emit_mark(backup, MARK_WAR_ZONE, wz_len);
                        backup.extend_from_slice(&(wz_pos as u32).to_le_bytes()[..3]);
                        wz_len
                    }
                    1 => {
                        emit_mark(backup, MARK_BATTLEFIELD, bf_len);
                        backup.extend_from_slice(&(bf_pos as u32).to_le_bytes()[..2]);
                        bf_len
                    }
                    _ => {
                        emit_mark(backup, MARK_FRONTLINE, fl_len);
                        backup.push(fl_pos as u8);
                        fl_len
                    }
                };
                i += len;
                lit_start = i;
                lit_end = i;
            } else {
                lit_end += 1;
                i += 1;
            }
        }
        emit_literal(backup, &record[lit_start..lit_end]);

        // Write the payload-size varint flush against the payload.
        let payload_len = backup.len() - MAX_VARINT32_LEN;
        let varint_len = coding::varint_length(payload_len as u64);
        let start = MAX_VARINT32_LEN - varint_len;
        coding::encode_varint32(&mut backup[start..], payload_len as u32);

        coding::put_fixed32(backup, crc32c::mask(crc32c::value(record)));
        debug_assert!(
            backup.len() - start <= BATTLEFIELD_SIZE,
            "encoded payload exceeds a battlefield",
        );
        start
    }
}

/// Wire cost a back-reference must beat: mark byte, position bytes, and the
/// length varint when it does not fit the mark.
fn profit(len: usize, pos_bytes: i64) -> i64 {
    let len_bytes = if len <= INLINE_LEN_MAX {
        0
    } else {
        coding::varint_length(len as u64) as i64
    };
    len as i64 - (pos_bytes + 1) - len_bytes
}

fn emit_mark(dst: &mut Vec<u8>, base: u8, len: usize) {
    debug_assert!(len > 0);
    if len <= INLINE_LEN_MAX {
        dst.push(base + len as u8);
    } else {
        dst.push(base);
        coding::put_varint32(dst, len as u32);
    }
}

fn emit_literal(dst: &mut Vec<u8>, literal: &[u8]) {
    if literal.is_empty() {
        return;
    }
    emit_mark(dst, MARK_LITERAL, literal.len());
    dst.extend_from_slice(literal);
}

/// Longest prefix of `record[before..]` that also starts within the
/// trailing [`FRONTLINE_SIZE`] bytes before `before`.
///
/// Returns `(wire_offset, len)` where a wire offset of 0 encodes a one-byte
/// lookback. The match may run past `before`; the decoder copies byte by
/// byte, so such overlap extends a run.
fn find_frontline(record: &[u8], before: usize) -> (usize, usize) {
    let mut begin = before.saturating_sub(FRONTLINE_SIZE);
    let mut len = 0usize;
    while before + len < record.len() {
        let needle = &record[before..=before + len];
        let hit = record[begin..]
            .windows(needle.len())
            .position(|w| w == needle)
            .map(|p| p + begin);
        match hit {
            Some(p) if p < before => begin = p,
            _ => break,
        }
        len += 1;
    }
    if len == 0 {
        return (0, 0);
    }
    (before - begin - 1, len)
}

#[cfg(test)]
impl<H: WriteHelper> CompressWriter<H> {
    /// Test-only: a writer resumed mid-log with its region state supplied
    /// directly instead of replayed.
    fn with_regions(helper: H, cursor: u64, war_zone: Vec<u8>, battlefield: Vec<u8>) -> Self {
        let war_zone_index = Some(DictIndex::build(&war_zone, MIN_REPEAT_WAR_ZONE));
        let battlefield_index = Some(DictIndex::build(&battlefield, MIN_REPEAT_BATTLEFIELD));
        CompressWriter {
            helper,
            cursor,
            backup: Vec::new(),
            war_zone,
            battlefield,
            war_zone_index,
            battlefield_index,
        }
    }
}
