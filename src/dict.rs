//! Dictionary index over an uncompressed region: suffix array, heap-indexed
//! LCP-LR array, and a Bloom filter gate.
//!
//! The index answers one question — the longest substring of the region
//! matching a prefix of a pattern — in O(m + log n) character comparisons.
//! The LCP-LR array stores, for every node of the binary-search tree over
//! the suffix array, the longest common prefix of the endpoints that search
//! node visits, so each binary-search level costs O(1) beyond the single
//! comparison that actually extends the match.

use std::time::Instant;

use log::debug;

use crate::{bloom, sais};

pub(crate) struct DictIndex {
    sa: Vec<i32>,
    lcplr: Vec<i32>,
    bloom: Vec<u8>,
    min_repeat: usize,
}

impl DictIndex {
    /// Build the full index for `src`. This is the only unbounded-time
    /// operation in the append path; it runs once per region.
    pub(crate) fn build(src: &[u8], min_repeat: usize) -> Self {
        let started = Instant::now();
        let sa = sais::suffix_array(src);
        let lcp = kasai_lcp(src, &sa);
        let lcplr = build_lcplr(&lcp);
        let bloom = bloom::build_filter(src, min_repeat);
        debug!(
            "dictionary index built: region_len={} min_repeat={} elapsed={:?}",
            src.len(),
            min_repeat,
            started.elapsed(),
        );
        DictIndex {
            sa,
            lcplr,
            bloom,
            min_repeat,
        }
    }

    /// Longest substring of `src` (the region this index was built over)
    /// equal to a prefix of `pattern`.
    ///
    /// Returns `(position, length)` with `length >= min_repeat`, or a zero
    /// length when there is no qualifying match. Ties go to the first
    /// candidate seen in suffix-array order.
    pub(crate) fn find_longest_repeat(&self, src: &[u8], pattern: &[u8]) -> (usize, usize) {
        if pattern.len() < self.min_repeat
            || !bloom::may_match(&pattern[..self.min_repeat], &self.bloom)
        {
            return (0, 0);
        }

        let sa = &self.sa;
        let n = sa.len();
        let m = pattern.len();

        let mut l = 0usize;
        let mut r = n - 1;
        let mut node = 1usize;
        let mut commons = 0i64;
        let mut matches = 0i64;
        let mut grow = false;

        loop {
            let mid = (l + r) / 2;
            if commons > matches {
                // The mid suffix agrees with the last-compared endpoint past
                // the point where the pattern diverged, so the pattern
                // relates to mid exactly as it did to that endpoint: keep
                // moving toward the pattern's side without comparing.
                if grow {
                    l = mid;
                } else {
                    r = mid;
                }
                node = node * 2 + grow as usize;
            } else if commons < matches {
                // The mid suffix diverges from the endpoint before the
                // pattern does, so the match stays on the endpoint's side.
                if grow {
                    r = mid;
                } else {
                    l = mid;
                }
                node = node * 2 + (!grow) as usize;
            } else {
                matches = compare_from(src, sa[mid] as usize, pattern, matches as usize, &mut grow)
                    as i64;
                if grow {
                    l = mid;
                } else {
                    r = mid;
                }
                node = node * 2 + grow as usize;
            }

            if r - l <= 2 {
                break;
            }
            // LCP of the next mid with the endpoint the last comparison
            // anchored at: the child node on that side.
            commons = i64::from(self.lcplr[node * 2 + (!grow) as usize]);
        }

        let mut pos = 0usize;
        let mut len = 0usize;
        for j in l..=r {
            let from = sa[j] as usize;
            let bound = m.min(n - from);
            let mut common = 0;
            while common < bound && pattern[common] == src[from + common] {
                common += 1;
            }
            if common > len {
                pos = from;
                len = common;
            }
        }
        if len < self.min_repeat {
            return (0, 0);
        }
        (pos, len)
    }
}

/// Compare `pattern` against the suffix at `suf`, both already known equal
/// for `start` bytes. Returns the new match length; `grow` records whether
/// the suffix compared less than the pattern at the first difference
/// (exhaustion counts as a zero byte).
fn compare_from(src: &[u8], suf: usize, pattern: &[u8], mut start: usize, grow: &mut bool) -> usize {
    let n = src.len();
    let m = pattern.len();
    let mut i = suf + start;
    while i < n && start < m && src[i] == pattern[start] {
        i += 1;
        start += 1;
    }
    let suffix_byte = if i < n { u32::from(src[i]) } else { 0 };
    let pattern_byte = if start < m { u32::from(pattern[start]) } else { 0 };
    *grow = suffix_byte < pattern_byte;
    start
}

/// Kasai's LCP construction: `lcp[i]` is the longest common prefix of the
/// suffixes at `sa[i]` and `sa[i + 1]`; the last slot is a max sentinel.
fn kasai_lcp(src: &[u8], sa: &[i32]) -> Vec<i32> {
    let n = sa.len();
    let mut isa = vec![0i32; n];
    for (rank, &pos) in sa.iter().enumerate() {
        isa[pos as usize] = rank as i32;
    }

    let mut lcp = vec![0i32; n];
    let mut p = 0usize;
    for i in 0..n {
        let rank = isa[i] as usize;
        if rank == n - 1 {
            p = 0;
            lcp[n - 1] = i32::MAX;
            continue;
        }
        let j = sa[rank + 1] as usize;
        while i + p < n && j + p < n && src[i + p] == src[j + p] {
            p += 1;
        }
        lcp[rank] = p as i32;
        p = p.saturating_sub(1);
    }
    lcp
}

/// Heap layout of the binary-search tree over `[0, n-1]`: entry `i` holds
/// the LCP of the endpoints of the range node `i` visits.
fn build_lcplr(lcp: &[i32]) -> Vec<i32> {
    let n = lcp.len();
    let mut lcplr = Vec::new();
    if n < 2 {
        return lcplr;
    }
    lcplr.reserve(n);
    build_node(lcp, &mut lcplr, 1, 0, n - 1);
    lcplr
}

fn build_node(lcp: &[i32], lcplr: &mut Vec<i32>, node: usize, l: usize, r: usize) -> (i32, i32) {
    let (common, range_min) = match r - l {
        1 => (lcp[l], lcp[l].min(lcp[r])),
        2 => {
            let common = lcp[l].min(lcp[l + 1]);
            (common, common.min(lcp[r]))
        }
        _ => {
            let mid = (l + r) / 2;
            let left = build_node(lcp, lcplr, node * 2, l, mid);
            let right = build_node(lcp, lcplr, node * 2 + 1, mid, r);
            (left.1.min(right.0), left.1.min(right.1))
        }
    };
    if node >= lcplr.len() {
        lcplr.resize(node + 1, 0);
    }
    lcplr[node] = common;
    (common, range_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Longest substring of `src` equal to a prefix of `pattern`, by
    /// scanning every starting position.
    fn brute_longest(src: &[u8], pattern: &[u8]) -> usize {
        let mut best = 0;
        for from in 0..src.len() {
            let bound = pattern.len().min(src.len() - from);
            let mut common = 0;
            while common < bound && src[from + common] == pattern[common] {
                common += 1;
            }
            best = best.max(common);
        }
        best
    }

    fn check(src: &[u8], pattern: &[u8], min_repeat: usize) {
        let index = DictIndex::build(src, min_repeat);
        let (pos, len) = index.find_longest_repeat(src, pattern);
        let best = brute_longest(src, pattern);
        if best >= min_repeat {
            assert_eq!(len, best, "src={src:?} pattern={pattern:?}");
            assert_eq!(&src[pos..pos + len], &pattern[..len]);
        } else {
            assert_eq!(len, 0, "src={src:?} pattern={pattern:?}");
        }
    }

    #[test]
    fn kasai_matches_definition() {
        let src = b"banana";
        let sa = sais::suffix_array(src);
        let lcp = kasai_lcp(src, &sa);
        // SA of banana: [5, 3, 1, 0, 4, 2]; adjacent LCPs: 1, 3, 0, 0, 2.
        assert_eq!(&lcp[..5], &[1, 3, 0, 0, 2]);
        assert_eq!(lcp[5], i32::MAX);
    }

    #[test]
    fn finds_exact_substring() {
        let src = b"the quick brown fox jumps over the lazy dog";
        let index = DictIndex::build(src, 4);
        let (pos, len) = index.find_longest_repeat(src, b"quick brown");
        assert_eq!(&src[pos..pos + len], b"quick brown");
    }

    #[test]
    fn respects_min_repeat() {
        let src = b"abcdefgh";
        let index = DictIndex::build(src, 5);
        // "abcd" occurs but is below the minimum.
        assert_eq!(index.find_longest_repeat(src, b"abcdXYZW"), (0, 0));
    }

    #[test]
    fn short_pattern_is_rejected() {
        let src = b"abcdefgh";
        let index = DictIndex::build(src, 4);
        assert_eq!(index.find_longest_repeat(src, b"abc"), (0, 0));
    }

    #[test]
    fn no_match_returns_zero() {
        let src = b"aaaaaaaaaaaaaaaa";
        let index = DictIndex::build(src, 3);
        assert_eq!(index.find_longest_repeat(src, b"zzzzzz").1, 0);
    }

    #[test]
    fn prefix_longer_than_any_suffix_tail() {
        // The best match runs into the end of the region.
        let src = b"xyzxyzab";
        check(src, b"zabcdef", 3);
    }

    #[test]
    fn repetitive_region() {
        let src: Vec<u8> = b"abcabcabcabcabcabc".to_vec();
        check(&src, b"cabcab", 3);
        check(&src, b"abcabcabcabcabcabcabc", 3);
    }

    proptest! {
        // Exactness holds for content without 0x00 bytes. A suffix that
        // ends the region compares as if padded with zeroes, so a pattern
        // that continues with a literal zero can be mis-ordered against it
        // and the search may settle for a shorter (still real) match.
        #[test]
        fn matches_brute_force(
            src in proptest::collection::vec(1u8..5, 2..256),
            pattern in proptest::collection::vec(1u8..5, 0..64),
            min_repeat in 3usize..6,
        ) {
            let index = DictIndex::build(&src, min_repeat);
            let (pos, len) = index.find_longest_repeat(&src, &pattern);
            let best = brute_longest(&src, &pattern);
            if best >= min_repeat {
                prop_assert_eq!(len, best);
                prop_assert_eq!(&src[pos..pos + len], &pattern[..len]);
            } else {
                prop_assert_eq!(len, 0);
            }
        }

        // Over arbitrary bytes the result is always sound: a reported match
        // is a real occurrence of a pattern prefix, never shorter than the
        // region minimum.
        #[test]
        fn reported_matches_are_real(
            src in proptest::collection::vec(any::<u8>(), 2..256),
            pattern in proptest::collection::vec(any::<u8>(), 0..64),
            min_repeat in 3usize..6,
        ) {
            let index = DictIndex::build(&src, min_repeat);
            let (pos, len) = index.find_longest_repeat(&src, &pattern);
            if len > 0 {
                prop_assert!(len >= min_repeat);
                prop_assert!(pos + len <= src.len());
                prop_assert_eq!(&src[pos..pos + len], &pattern[..len]);
            }
        }
    }
}
