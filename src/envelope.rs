//! The record envelope shared by both codecs:
//! `varint(payload_len) || payload || u32_le(mask(crc32c))`.

use crate::coding::{self, MAX_VARINT32_LEN};
use crate::{crc32c, ReadError, ReadHelper};

/// Append the plain envelope of `record` to `dst`; the checksum is over the
/// record bytes themselves.
pub(crate) fn append_plain(dst: &mut Vec<u8>, record: &[u8]) {
    coding::put_varint32(dst, record.len() as u32);
    dst.extend_from_slice(record);
    coding::put_fixed32(dst, crc32c::mask(crc32c::value(record)));
}

/// Encoded size of the plain envelope of a `record_len`-byte record.
#[inline]
pub(crate) fn plain_len(record_len: usize) -> usize {
    coding::varint_length(record_len as u64) + record_len + 4
}

/// An envelope fetched from storage, before payload interpretation.
pub(crate) struct RawEnvelope {
    buf: Vec<u8>,
    payload_start: usize,
    payload_len: usize,
    /// Stored checksum, already unmasked.
    pub(crate) crc: u32,
}

impl RawEnvelope {
    pub(crate) fn payload(&self) -> &[u8] {
        &self.buf[self.payload_start..self.payload_start + self.payload_len]
    }

    /// Total log bytes the envelope occupies.
    pub(crate) fn total_len(&self) -> usize {
        self.payload_start + self.payload_len + 4
    }
}

/// Random-read the envelope starting at `id`: a worst-case varint prefix
/// first, then the remainder once the payload length is known.
pub(crate) fn read_envelope<H: ReadHelper>(helper: &H, id: u64) -> Result<RawEnvelope, ReadError> {
    let mut buf = vec![0u8; MAX_VARINT32_LEN];
    helper.read_at(id, &mut buf)?;
    let (payload_len, varint_len) =
        coding::get_varint32(&buf).ok_or(ReadError::MalformedEnvelope)?;
    let payload_len = payload_len as usize;
    // No legal envelope outgrows a battlefield; a bigger prefix is
    // corruption and must not drive the allocation below.
    if payload_len > crate::compress::BATTLEFIELD_SIZE {
        return Err(ReadError::MalformedEnvelope);
    }

    let data_len = varint_len + payload_len;
    let total_len = data_len + 4;
    buf.resize(total_len, 0);
    if total_len > MAX_VARINT32_LEN {
        helper.read_at(
            id + MAX_VARINT32_LEN as u64,
            &mut buf[MAX_VARINT32_LEN..],
        )?;
    }

    let crc = crc32c::unmask(coding::read_le32(&buf, data_len));
    Ok(RawEnvelope {
        buf,
        payload_start: varint_len,
        payload_len,
        crc,
    })
}
