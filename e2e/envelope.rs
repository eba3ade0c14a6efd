//! E2E: the shared record envelope through the public API.
//!
//! Covers exact on-disk bytes for a short record, id chaining, determinism
//! of the encoders, the record-size precondition, and a file-backed helper
//! wired the way a real store would be.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use warlog::compress::{CompressReader, CompressWriter};
use warlog::lite::{LiteReader, LiteWriter};
use warlog::mem::MemLog;
use warlog::{crc32c, ReadHelper, WriteHelper, MAX_RECORD_SIZE};

// ─────────────────────────────────────────────────────────────────────────────
// Exact envelope bytes
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn hello_is_framed_byte_exactly() {
    let log = MemLog::new();
    let mut writer = CompressWriter::new(&log, 0);
    let span = writer.add(b"hello").unwrap();
    assert_eq!(span.id, 0);
    assert_eq!(span.len, 10);

    let mut expected = vec![0x05];
    expected.extend_from_slice(b"hello");
    expected.extend_from_slice(&crc32c::mask(crc32c::value(b"hello")).to_le_bytes());
    assert_eq!(log.snapshot(), expected);

    let reader = CompressReader::new(&log);
    let mut out = Vec::new();
    let next = reader.get(0, &mut out).unwrap();
    assert_eq!(out, b"hello");
    assert_eq!(next, 10);
}

#[test]
fn lite_and_compress_agree_on_plain_records() {
    // Every record here stays inside war zone #0, so both codecs must
    // produce identical logs.
    let records: &[&[u8]] = &[b"alpha", b"", b"gamma gamma", &[0u8; 300]];

    let lite_log = MemLog::new();
    let lite = LiteWriter::new(&lite_log, 0);
    for r in records {
        lite.add(r).unwrap();
    }

    let comp_log = MemLog::new();
    let mut comp = CompressWriter::new(&comp_log, 0);
    for r in records {
        comp.add(r).unwrap();
    }

    assert_eq!(lite_log.snapshot(), comp_log.snapshot());
}

// ─────────────────────────────────────────────────────────────────────────────
// Id chaining and monotonicity
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn ids_chain_through_the_log() {
    let log = MemLog::new();
    let mut writer = CompressWriter::new(&log, 0);

    let records: Vec<Vec<u8>> = (0..100)
        .map(|i| format!("record number {i:03}").into_bytes())
        .collect();
    let mut spans = Vec::new();
    for r in &records {
        spans.push(writer.add(r).unwrap());
    }
    for pair in spans.windows(2) {
        assert_eq!(pair[0].id + pair[0].len as u64, pair[1].id);
    }

    let reader = CompressReader::new(&log);
    let mut id = 0u64;
    for (span, record) in spans.iter().zip(&records) {
        assert_eq!(id, span.id);
        let mut out = Vec::new();
        id = reader.get(id, &mut out).unwrap();
        assert_eq!(&out, record);
    }
    assert_eq!(id, log.len() as u64);
}

#[test]
fn readers_are_interchangeable_on_plain_records() {
    let log = MemLog::new();
    let lite = LiteWriter::new(&log, 0);
    let span = lite.add(b"shared envelope").unwrap();

    let mut out = Vec::new();
    LiteReader::new(&log).get(span.id, &mut out).unwrap();
    assert_eq!(out, b"shared envelope");

    out.clear();
    CompressReader::new(&log).get(span.id, &mut out).unwrap();
    assert_eq!(out, b"shared envelope");
}

// ─────────────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn identical_inputs_give_identical_logs() {
    let records: Vec<Vec<u8>> = (0..500)
        .map(|i: u32| i.to_le_bytes().repeat(8 + (i as usize % 17)))
        .collect();

    let mut snapshots = Vec::new();
    for _ in 0..2 {
        let log = MemLog::new();
        let mut writer = CompressWriter::new(&log, 0);
        for r in &records {
            writer.add(r).unwrap();
        }
        snapshots.push(log.snapshot());
    }
    assert_eq!(snapshots[0], snapshots[1]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Record-size precondition
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn max_record_size_is_accepted() {
    let log = MemLog::new();
    let mut writer = CompressWriter::new(&log, 0);
    let record = vec![0x55u8; MAX_RECORD_SIZE];
    let span = writer.add(&record).unwrap();

    let reader = CompressReader::new(&log);
    let mut out = Vec::new();
    reader.get(span.id, &mut out).unwrap();
    assert_eq!(out, record);
}

#[test]
#[should_panic(expected = "exceeds the battlefield envelope bound")]
fn oversized_record_panics() {
    let log = MemLog::new();
    let mut writer = CompressWriter::new(&log, 0);
    let record = vec![0u8; MAX_RECORD_SIZE + 1];
    let _ = writer.add(&record);
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed helper
// ─────────────────────────────────────────────────────────────────────────────

/// Minimal file-backed store: appends at the end, reads by absolute offset.
struct FileLog {
    file: Mutex<File>,
}

impl FileLog {
    fn new() -> Self {
        FileLog {
            file: Mutex::new(tempfile::tempfile().unwrap()),
        }
    }
}

impl WriteHelper for &FileLog {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::End(0))?;
        file.write_all(buf)
    }
}

impl ReadHelper for FileLog {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)
    }
}

#[test]
fn file_backed_roundtrip() {
    let store = FileLog::new();
    let writer = LiteWriter::new(&store, 0);

    let mut spans = Vec::new();
    for i in 0..50u32 {
        spans.push(writer.add(format!("file record {i}").as_bytes()).unwrap());
    }

    let reader = LiteReader::new(&store);
    for (i, span) in spans.iter().enumerate() {
        let mut out = Vec::new();
        reader.get(span.id, &mut out).unwrap();
        assert_eq!(out, format!("file record {i}").as_bytes());
    }
}
