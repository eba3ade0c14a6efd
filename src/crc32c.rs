//! CRC-32C (Castagnoli) helpers with the rotate-and-add storage mask.
//!
//! Thin wrapper over the `crc32c` crate, which uses the hardware CRC32
//! instruction where available and a table fallback elsewhere.

use ::crc32c::{crc32c, crc32c_append};

const MASK_DELTA: u32 = 0xa282_ead8;

/// CRC-32C of `data`.
#[inline]
pub fn value(data: &[u8]) -> u32 {
    crc32c(data)
}

/// Continue `init_crc` over `data`.
#[inline]
pub fn extend(init_crc: u32, data: &[u8]) -> u32 {
    crc32c_append(init_crc, data)
}

/// Masked representation of `crc` for storage.
///
/// Computing the CRC of bytes that themselves contain CRCs degenerates, so
/// stored checksums are rotated and offset first.
#[inline]
pub fn mask(crc: u32) -> u32 {
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Inverse of [`mask`].
#[inline]
pub fn unmask(masked_crc: u32) -> u32 {
    masked_crc.wrapping_sub(MASK_DELTA).rotate_left(15)
}
