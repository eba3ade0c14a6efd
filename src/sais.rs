//! Suffix-array construction by induced sorting (SA-IS).
//!
//! Linear time and alphabet-independent, which matters because the war-zone
//! region is 16 MiB: a comparison sort would make the one-off index build at
//! the region boundary the dominant cost of the whole log.
//!
//! The implementation works on a copy of the input shifted up by one with a
//! zero sentinel appended, so the recursion can always rely on a unique
//! minimal final character.

/// Suffix array of `text`: the starting positions of all suffixes in
/// lexicographic order.
pub(crate) fn suffix_array(text: &[u8]) -> Vec<i32> {
    match text.len() {
        0 => Vec::new(),
        1 => vec![0],
        _ => {
            let mut s = Vec::with_capacity(text.len() + 1);
            s.extend(text.iter().map(|&b| u32::from(b) + 1));
            s.push(0);
            let mut sa = vec![0i32; s.len()];
            sais(&s, 257, &mut sa);
            // Slot 0 is the sentinel suffix.
            sa.remove(0);
            sa
        }
    }
}

#[inline]
fn is_lms(is_s: &[bool], i: usize) -> bool {
    i > 0 && is_s[i] && !is_s[i - 1]
}

/// Character-wise equality of the LMS substrings starting at `a` and `b`,
/// inclusive of their terminating LMS character.
fn lms_eq(s: &[u32], is_s: &[bool], a: usize, b: usize) -> bool {
    let n = s.len();
    if a == b {
        return true;
    }
    // The sentinel substring is a singleton and equals nothing else.
    if a == n - 1 || b == n - 1 {
        return false;
    }
    let mut i = 0;
    loop {
        let a_end = i > 0 && is_lms(is_s, a + i);
        let b_end = i > 0 && is_lms(is_s, b + i);
        if a_end && b_end {
            return true;
        }
        if a_end != b_end || s[a + i] != s[b + i] {
            return false;
        }
        i += 1;
    }
}

fn bucket_heads(counts: &[i32]) -> Vec<i32> {
    let mut heads = Vec::with_capacity(counts.len());
    let mut sum = 0;
    for &c in counts {
        heads.push(sum);
        sum += c;
    }
    heads
}

fn bucket_tails(counts: &[i32]) -> Vec<i32> {
    let mut tails = Vec::with_capacity(counts.len());
    let mut sum = 0;
    for &c in counts {
        sum += c;
        tails.push(sum);
    }
    tails
}

/// Induce L suffixes left-to-right from bucket heads, then S suffixes
/// right-to-left from bucket tails.
fn induce(s: &[u32], sa: &mut [i32], is_s: &[bool], counts: &[i32]) {
    let n = s.len();

    let mut heads = bucket_heads(counts);
    for i in 0..n {
        let j = sa[i];
        if j > 0 {
            let p = (j - 1) as usize;
            if !is_s[p] {
                let c = s[p] as usize;
                sa[heads[c] as usize] = p as i32;
                heads[c] += 1;
            }
        }
    }

    let mut tails = bucket_tails(counts);
    for i in (0..n).rev() {
        let j = sa[i];
        if j > 0 {
            let p = (j - 1) as usize;
            if is_s[p] {
                let c = s[p] as usize;
                tails[c] -= 1;
                sa[tails[c] as usize] = p as i32;
            }
        }
    }
}

/// Core recursion. `s` ends with a unique minimal sentinel, values lie in
/// `0..k`, and `sa` has exactly `s.len()` slots.
fn sais(s: &[u32], k: usize, sa: &mut [i32]) {
    let n = s.len();
    if n == 1 {
        sa[0] = 0;
        return;
    }
    if n == 2 {
        sa[0] = 1;
        sa[1] = 0;
        return;
    }

    let mut is_s = vec![false; n];
    is_s[n - 1] = true;
    for i in (0..n - 1).rev() {
        is_s[i] = s[i] < s[i + 1] || (s[i] == s[i + 1] && is_s[i + 1]);
    }

    let mut counts = vec![0i32; k];
    for &c in s {
        counts[c as usize] += 1;
    }

    // Stage 1: drop the LMS positions at their bucket tails in any order
    // and induce; this sorts the LMS substrings.
    sa.fill(-1);
    let mut tails = bucket_tails(&counts);
    for i in 1..n {
        if is_lms(&is_s, i) {
            let c = s[i] as usize;
            tails[c] -= 1;
            sa[tails[c] as usize] = i as i32;
        }
    }
    induce(s, sa, &is_s, &counts);

    // Compact the sorted LMS positions to the front of `sa`.
    let mut n_lms = 0;
    for i in 0..n {
        let j = sa[i];
        if j > 0 && is_lms(&is_s, j as usize) {
            sa[n_lms] = j;
            n_lms += 1;
        }
    }

    // Name the LMS substrings in sorted order. Names land in the upper part
    // of `sa`, keyed by position / 2 — LMS positions are at least two
    // apart, so the key is unique and fits.
    let (sorted, work) = sa.split_at_mut(n_lms);
    work.fill(-1);
    let mut name = 0i32;
    let mut prev: Option<usize> = None;
    for &p in sorted.iter() {
        let p = p as usize;
        if let Some(q) = prev {
            if !lms_eq(s, &is_s, q, p) {
                name += 1;
            }
        }
        work[p / 2] = name;
        prev = Some(p);
    }
    let distinct = (name + 1) as usize;

    // Reduced string: the names in text order. Its final element is the
    // sentinel's name 0, unique by construction, so the recursion
    // precondition holds.
    let mut s1 = Vec::with_capacity(n_lms);
    for &w in work.iter() {
        if w >= 0 {
            s1.push(w as u32);
        }
    }

    let mut sa1 = vec![0i32; n_lms];
    if distinct == n_lms {
        // Every name is unique: the order is the names themselves.
        for (i, &c) in s1.iter().enumerate() {
            sa1[c as usize] = i as i32;
        }
    } else {
        sais(&s1, distinct, &mut sa1);
    }

    let mut lms_pos = Vec::with_capacity(n_lms);
    for i in 1..n {
        if is_lms(&is_s, i) {
            lms_pos.push(i as i32);
        }
    }

    // Stage 2: seed the buckets with the LMS suffixes in their final
    // relative order and induce everything else.
    sa.fill(-1);
    let mut tails = bucket_tails(&counts);
    for &rank in sa1.iter().rev() {
        let p = lms_pos[rank as usize];
        let c = s[p as usize] as usize;
        tails[c] -= 1;
        sa[tails[c] as usize] = p;
    }
    induce(s, sa, &is_s, &counts);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn brute_force(text: &[u8]) -> Vec<i32> {
        let mut idx: Vec<i32> = (0..text.len() as i32).collect();
        idx.sort_by(|&a, &b| text[a as usize..].cmp(&text[b as usize..]));
        idx
    }

    #[test]
    fn empty_and_single() {
        assert!(suffix_array(b"").is_empty());
        assert_eq!(suffix_array(b"x"), vec![0]);
    }

    #[test]
    fn banana() {
        assert_eq!(suffix_array(b"banana"), vec![5, 3, 1, 0, 4, 2]);
    }

    #[test]
    fn mississippi() {
        assert_eq!(suffix_array(b"mississippi"), brute_force(b"mississippi"));
    }

    #[test]
    fn all_equal_bytes() {
        let text = vec![7u8; 64];
        assert_eq!(suffix_array(&text), brute_force(&text));
    }

    #[test]
    fn strictly_decreasing() {
        let text: Vec<u8> = (0..=255u8).rev().collect();
        assert_eq!(suffix_array(&text), brute_force(&text));
    }

    #[test]
    fn strictly_increasing() {
        let text: Vec<u8> = (0..=255u8).collect();
        assert_eq!(suffix_array(&text), brute_force(&text));
    }

    #[test]
    fn abab_family() {
        for text in [&b"abab"[..], b"ababa", b"abaabaab", b"aabaabaa"] {
            assert_eq!(suffix_array(text), brute_force(text), "{text:?}");
        }
    }

    proptest! {
        #[test]
        fn matches_brute_force(text in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(suffix_array(&text), brute_force(&text));
        }

        #[test]
        fn matches_brute_force_small_alphabet(
            text in proptest::collection::vec(0u8..3, 0..512),
        ) {
            prop_assert_eq!(suffix_array(&text), brute_force(&text));
        }
    }
}
