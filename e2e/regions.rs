//! E2E: the full three-region walk.
//!
//! One log is driven from offset 0 across the war-zone boundary and the
//! first battlefield into the compressed zone, exercising: plain encoding in
//! war zone #0, the envelope that spills across the 16 MiB boundary, the
//! battlefield fill of war zone #1, dictionary-compressed records (war-zone,
//! battlefield and frontline references, plus the all-literal fallback), id
//! chaining over every envelope, region classification by id, and encoder
//! determinism.
//!
//! This test is deliberately heavyweight: it builds the 16 MiB war-zone
//! index twice (once per determinism pass).

use warlog::compress::{CompressReader, CompressWriter, BATTLEFIELD_SIZE, WAR_ZONE_SIZE};
use warlog::mem::MemLog;

const BRIGADE: &[u8] = b"abcdefgh";

/// `len` bytes of the repeating brigade pattern.
fn patterned(len: usize) -> Vec<u8> {
    BRIGADE.iter().copied().cycle().take(len).collect()
}

/// Deterministic xorshift noise, incompressible for our dictionaries.
fn pseudo_random(len: usize, mut state: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        out.push(state as u8);
    }
    out
}

fn varint_len(mut v: usize) -> usize {
    let mut len = 1;
    while v >= 128 {
        v >>= 7;
        len += 1;
    }
    len
}

fn plain_envelope_len(record_len: usize) -> usize {
    varint_len(record_len) + record_len + 4
}

#[test]
fn three_region_walk() {
    let log = MemLog::new();
    let mut writer = CompressWriter::new(&log, 0);
    let mut records: Vec<Vec<u8>> = Vec::new();
    let mut spans = Vec::new();

    // Phase A — fill war zone #0 up to exactly 16 MiB - 10 with plain
    // records of highly repetitive content (the future dictionary).
    let big = patterned(65408); // envelope: 3 + 65408 + 4 = 65415
    for _ in 0..256 {
        spans.push(writer.add(&big).unwrap());
        records.push(big.clone());
    }
    let filler = patterned(30959); // envelope: 3 + 30959 + 4 = 30966
    spans.push(writer.add(&filler).unwrap());
    records.push(filler);
    assert_eq!(log.len(), WAR_ZONE_SIZE - 10);

    // Phase B — a 20-byte record whose envelope crosses the war-zone
    // boundary. Still one contiguous envelope, still plain (id < 16 MiB).
    let spill = b"spill-record-bytes!!".to_vec();
    let spill_span = writer.add(&spill).unwrap();
    assert_eq!(spill_span.id, WAR_ZONE_SIZE as u64 - 10);
    assert_eq!(spill_span.len, 25);
    spans.push(spill_span);
    records.push(spill);

    // Phase C — one record completing war zone #1's battlefield exactly.
    let bf_fill = patterned(65514); // envelope: 3 + 65514 + 4 = 65521
    spans.push(writer.add(&bf_fill).unwrap());
    records.push(bf_fill);
    assert_eq!(log.len(), WAR_ZONE_SIZE + BATTLEFIELD_SIZE);

    // Phase D — compressed zone.
    // Dictionary hits collapse whole records into one reference.
    for _ in 0..10 {
        let r = patterned(128);
        let span = writer.add(&r).unwrap();
        assert!(
            span.len <= 12,
            "expected a dictionary reference, got a {}-byte envelope",
            span.len,
        );
        spans.push(span);
        records.push(r);
    }

    // A record whose only redundancy is its own sliding window.
    let frontline_only = b"xyz".repeat(20);
    let span = writer.add(&frontline_only).unwrap();
    assert!(span.len <= 16);
    spans.push(span);
    records.push(frontline_only);

    // Incompressible input falls back to literals and stays representable.
    let noise = pseudo_random(1024, 0x1234_5678);
    let span = writer.add(&noise).unwrap();
    assert!(span.len <= 1024 + 1024 / 63 + 16);
    spans.push(span);
    records.push(noise);

    // Mixed content: a dictionary hit up front, noise behind.
    let mut mixed = patterned(512);
    mixed.extend(pseudo_random(256, 99));
    spans.push(writer.add(&mixed).unwrap());
    records.push(mixed);

    // Phase E — classification by id, and a full chained scan.
    for (span, record) in spans.iter().zip(&records) {
        let plain = span.id < WAR_ZONE_SIZE as u64
            || span.id % (WAR_ZONE_SIZE as u64) < BATTLEFIELD_SIZE as u64;
        if plain {
            assert_eq!(span.len, plain_envelope_len(record.len()));
        }
    }

    let reader = CompressReader::new(&log);
    let mut id = 0u64;
    for (span, record) in spans.iter().zip(&records) {
        assert_eq!(id, span.id);
        let mut out = Vec::new();
        id = reader.get(id, &mut out).unwrap();
        assert_eq!(id, span.id + span.len as u64);
        assert_eq!(&out, record, "payload mismatch at id {}", span.id);
    }
    assert_eq!(id, log.len() as u64);

    // Phase F — determinism: replaying the same records byte-identically.
    let replay = MemLog::new();
    let mut second = CompressWriter::new(&replay, 0);
    for r in &records {
        second.add(r).unwrap();
    }
    assert_eq!(replay.snapshot(), log.snapshot());
}
