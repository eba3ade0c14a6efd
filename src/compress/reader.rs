//! Compress-codec read path: envelope fetch, region classification, and the
//! mark-walking reconstruction of compressed payloads.

use crate::coding;
use crate::{crc32c, envelope, ReadError, ReadHelper};

use super::{
    BATTLEFIELD_SIZE, MARK_BATTLEFIELD, MARK_FRONTLINE, MARK_KIND, MARK_LITERAL, MARK_WAR_ZONE,
    WAR_ZONE_SIZE,
};

/// Read half of the compress codec.
///
/// Stateless between calls; concurrent `get`s are fine whenever the
/// helper's `read_at` is.
pub struct CompressReader<H> {
    helper: H,
}

impl<H: ReadHelper> CompressReader<H> {
    pub fn new(helper: H) -> Self {
        CompressReader { helper }
    }

    /// Append the record stored at `id` to `dst` and return the id of the
    /// next envelope.
    ///
    /// On error `dst` is left exactly as it was.
    pub fn get(&self, id: u64, dst: &mut Vec<u8>) -> Result<u64, ReadError> {
        let env = envelope::read_envelope(&self.helper, id)?;

        let wz_index = id / WAR_ZONE_SIZE as u64;
        let wz_rem = id % WAR_ZONE_SIZE as u64;
        let plain = wz_index == 0 || wz_rem < BATTLEFIELD_SIZE as u64;

        if plain {
            if crc32c::value(env.payload()) != env.crc {
                return Err(ReadError::CrcMismatch);
            }
            dst.extend_from_slice(env.payload());
        } else {
            // 2-byte references are relative to the current war zone's
            // origin, where its battlefield starts.
            let battlefield_origin = id - wz_rem;
            let dst_start = dst.len();
            if let Err(e) = self.expand(env.payload(), battlefield_origin, env.crc, dst, dst_start)
            {
                dst.truncate(dst_start);
                return Err(e);
            }
        }
        Ok(id + env.total_len() as u64)
    }

    /// Walk the mark stream of a compressed payload, materializing
    /// dictionary references through the helper.
    fn expand(
        &self,
        payload: &[u8],
        battlefield_origin: u64,
        crc: u32,
        dst: &mut Vec<u8>,
        dst_start: usize,
    ) -> Result<(), ReadError> {
        let mut p = 0usize;
        while p < payload.len() {
            let mark = payload[p];
            p += 1;

            let mut len = usize::from(mark & !MARK_KIND);
            if len == 0 {
                let (v, n) =
                    coding::get_varint32(&payload[p..]).ok_or(ReadError::MalformedEnvelope)?;
                len = v as usize;
                p += n;
                // No item outgrows a record; a bigger length is corruption
                // and must not drive the allocations below.
                if len > BATTLEFIELD_SIZE {
                    return Err(ReadError::MalformedEnvelope);
                }
            }

            match mark & MARK_KIND {
                MARK_LITERAL => {
                    let end = p.checked_add(len).ok_or(ReadError::MalformedEnvelope)?;
                    if end > payload.len() {
                        return Err(ReadError::MalformedEnvelope);
                    }
                    dst.extend_from_slice(&payload[p..end]);
                    p = end;
                }
                MARK_WAR_ZONE => {
                    let pos = self.take_pos(payload, &mut p, 3)?;
                    self.append_from_log(pos, len, dst)?;
                }
                MARK_BATTLEFIELD => {
                    let pos = self.take_pos(payload, &mut p, 2)?;
                    self.append_from_log(battlefield_origin + pos, len, dst)?;
                }
                _ => {
                    let pos = self.take_pos(payload, &mut p, 1)? as usize;
                    // Byte-at-a-time so an overlapping reference keeps
                    // reading bytes it just produced.
                    let back = pos + 1;
                    if back > dst.len() - dst_start {
                        return Err(ReadError::MalformedEnvelope);
                    }
                    let mut from = dst.len() - back;
                    for _ in 0..len {
                        let byte = dst[from];
                        dst.push(byte);
                        from += 1;
                    }
                }
            }
        }

        if crc32c::value(&dst[dst_start..]) != crc {
            return Err(ReadError::CrcMismatch);
        }
        Ok(())
    }

    /// Little-endian position field of `width` bytes.
    fn take_pos(&self, payload: &[u8], p: &mut usize, width: usize) -> Result<u64, ReadError> {
        if *p + width > payload.len() {
            return Err(ReadError::MalformedEnvelope);
        }
        let mut bytes = [0u8; 8];
        bytes[..width].copy_from_slice(&payload[*p..*p + width]);
        *p += width;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Append `len` bytes read from the log at `offset`.
    fn append_from_log(&self, offset: u64, len: usize, dst: &mut Vec<u8>) -> Result<(), ReadError> {
        let at = dst.len();
        dst.resize(at + len, 0);
        self.helper.read_at(offset, &mut dst[at..])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::put_varint32;
    use crate::mem::MemLog;
    use crate::WriteHelper;

    /// A log whose compressed zone starts right after war zone #1's
    /// battlefield, with marker bytes planted in both dictionaries.
    fn planted_log() -> (MemLog, u64) {
        let mut base = vec![0u8; WAR_ZONE_SIZE + BATTLEFIELD_SIZE];
        base[100..108].copy_from_slice(b"warzone!");
        base[WAR_ZONE_SIZE + 50..WAR_ZONE_SIZE + 54].copy_from_slice(b"bf42");
        let log = MemLog::new();
        let mut sink = &log;
        sink.write_all(&base).unwrap();
        (log, (WAR_ZONE_SIZE + BATTLEFIELD_SIZE) as u64)
    }

    fn append_envelope(log: &MemLog, payload: &[u8], crc: u32) {
        let mut env = Vec::new();
        put_varint32(&mut env, payload.len() as u32);
        env.extend_from_slice(payload);
        env.extend_from_slice(&crc32c::mask(crc).to_le_bytes());
        let mut sink = log;
        sink.write_all(&env).unwrap();
    }

    #[test]
    fn walks_all_four_item_kinds() {
        let (log, id) = planted_log();

        // lit || war-zone(100, 8) || battlefield(50, 4) || frontline copy
        // of the last three bytes.
        let mut payload = Vec::new();
        payload.push(MARK_LITERAL + 3);
        payload.extend_from_slice(b"lit");
        payload.push(MARK_WAR_ZONE + 8);
        payload.extend_from_slice(&100u32.to_le_bytes()[..3]);
        payload.push(MARK_BATTLEFIELD + 4);
        payload.extend_from_slice(&50u16.to_le_bytes());
        payload.push(MARK_FRONTLINE + 3);
        payload.push(2); // lookback of three bytes

        let expected = b"litwarzone!bf42f42".to_vec();
        append_envelope(&log, &payload, crc32c::value(&expected));

        let reader = CompressReader::new(&log);
        let mut out = b"prefix-".to_vec();
        let next = reader.get(id, &mut out).unwrap();
        assert_eq!(&out[7..], expected.as_slice());
        assert_eq!(next, id + 1 + payload.len() as u64 + 4);
    }

    #[test]
    fn inline_zero_length_takes_a_varint() {
        let (log, id) = planted_log();

        // A 70-byte literal cannot fit the mark's six length bits.
        let literal = vec![b'x'; 70];
        let mut payload = vec![MARK_LITERAL, 70];
        payload.extend_from_slice(&literal);
        append_envelope(&log, &payload, crc32c::value(&literal));

        let reader = CompressReader::new(&log);
        let mut out = Vec::new();
        reader.get(id, &mut out).unwrap();
        assert_eq!(out, literal);
    }

    #[test]
    fn crc_mismatch_leaves_dst_untouched() {
        let (log, id) = planted_log();
        let mut payload = vec![MARK_LITERAL + 3];
        payload.extend_from_slice(b"abc");
        append_envelope(&log, &payload, crc32c::value(b"not abc"));

        let reader = CompressReader::new(&log);
        let mut out = b"keep".to_vec();
        assert!(matches!(
            reader.get(id, &mut out),
            Err(ReadError::CrcMismatch)
        ));
        assert_eq!(out, b"keep");
    }

    #[test]
    fn truncated_literal_is_malformed() {
        let (log, id) = planted_log();
        let payload = vec![MARK_LITERAL + 5, b'a', b'b'];
        append_envelope(&log, &payload, 0);

        let reader = CompressReader::new(&log);
        let mut out = Vec::new();
        assert!(matches!(
            reader.get(id, &mut out),
            Err(ReadError::MalformedEnvelope)
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn frontline_lookback_past_start_is_malformed() {
        let (log, id) = planted_log();
        // One literal byte, then a frontline reference reaching back two.
        let payload = vec![MARK_LITERAL + 1, b'a', MARK_FRONTLINE + 1, 1];
        append_envelope(&log, &payload, 0);

        let reader = CompressReader::new(&log);
        let mut out = Vec::new();
        assert!(matches!(
            reader.get(id, &mut out),
            Err(ReadError::MalformedEnvelope)
        ));
    }

    #[test]
    fn plain_ids_never_reach_the_mark_walker() {
        // An envelope below 16 MiB decodes as plain even if its payload
        // happens to look like marks.
        let log = MemLog::new();
        let payload = [MARK_WAR_ZONE + 8, 1, 2, 3];
        append_envelope(&log, &payload, crc32c::value(&payload));

        let reader = CompressReader::new(&log);
        let mut out = Vec::new();
        reader.get(0, &mut out).unwrap();
        assert_eq!(out, payload);
    }
}
