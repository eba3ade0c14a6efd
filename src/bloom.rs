//! Single-probe Bloom filter over the fixed-length substrings of a region.
//!
//! One xxh32 probe per key keeps the filter cheap enough to sit in front of
//! every suffix-array search; a negative answer skips the search entirely.

use xxhash_rust::xxh32::xxh32;

const BLOOM_SEED: u32 = 0;

/// Build the filter for `src`: one bit per length-`min_repeat` window.
///
/// Filter size is `max(64, n)` bits rounded up to whole bytes; the floor
/// keeps the false-positive rate sane for tiny regions.
pub(crate) fn build_filter(src: &[u8], min_repeat: usize) -> Vec<u8> {
    let bits = src.len().max(64);
    let bytes = (bits + 7) / 8;
    let bits = bytes * 8;

    let mut filter = vec![0u8; bytes];
    if src.len() >= min_repeat {
        for window in src.windows(min_repeat) {
            let bitpos = xxh32(window, BLOOM_SEED) as usize % bits;
            filter[bitpos / 8] |= 1 << (bitpos % 8);
        }
    }
    filter
}

/// True when `key` may occur in the region the filter was built over.
pub(crate) fn may_match(key: &[u8], filter: &[u8]) -> bool {
    let bits = filter.len() * 8;
    let bitpos = xxh32(key, BLOOM_SEED) as usize % bits;
    filter[bitpos / 8] >> (bitpos % 8) & 1 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_false_negatives() {
        let src = b"the quick brown fox jumps over the lazy dog";
        let filter = build_filter(src, 4);
        for window in src.windows(4) {
            assert!(may_match(window, &filter));
        }
    }

    #[test]
    fn misses_are_possible() {
        let src = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let filter = build_filter(src, 4);
        // A single distinct window sets a single bit; almost everything
        // else must miss.
        let miss = (0..=u8::MAX)
            .any(|b| !may_match(&[b, b.wrapping_add(1), b, b], &filter));
        assert!(miss);
    }

    #[test]
    fn region_shorter_than_key_matches_nothing_it_contains() {
        let filter = build_filter(b"ab", 4);
        assert_eq!(filter.len(), 8);
        assert!(filter.iter().all(|&b| b == 0));
    }
}
