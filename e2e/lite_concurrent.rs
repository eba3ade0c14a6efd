//! E2E: lite-codec group commit under contention.
//!
//! Covers: distinct strictly-ordered ids across concurrent producers, batch
//! write folding (fewer helper writes than appends under contention), full
//! readback, and failure atomicity of a batch.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use warlog::lite::{LiteReader, LiteWriter};
use warlog::mem::MemLog;
use warlog::{Span, WriteHelper};

/// Counts helper writes on the way into a `MemLog`.
struct CountingLog<'a> {
    inner: &'a MemLog,
    writes: &'a AtomicUsize,
}

impl WriteHelper for CountingLog<'_> {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut sink = self.inner;
        sink.write_all(buf)
    }
}

fn record_for(thread: usize, seq: usize) -> Vec<u8> {
    format!("thread {thread} record {seq:04} ++ payload padding").into_bytes()
}

#[test]
fn four_threads_thousand_records_each() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 1000;

    let log = MemLog::new();
    let writes = AtomicUsize::new(0);
    let writer = LiteWriter::new(
        CountingLog {
            inner: &log,
            writes: &writes,
        },
        0,
    );

    let mut all: Vec<(Span, Vec<u8>)> = Vec::new();
    thread::scope(|scope| {
        let mut handles = Vec::new();
        for t in 0..THREADS {
            let writer = &writer;
            handles.push(scope.spawn(move || {
                let mut own = Vec::with_capacity(PER_THREAD);
                for seq in 0..PER_THREAD {
                    let record = record_for(t, seq);
                    let span = writer.add(&record).unwrap();
                    own.push((span, record));
                }
                own
            }));
        }
        for handle in handles {
            all.extend(handle.join().unwrap());
        }
    });

    assert_eq!(all.len(), THREADS * PER_THREAD);
    // One storage write per batch, never more than one per append.
    assert!(writes.load(Ordering::Relaxed) <= all.len());

    // Ids are distinct and per-thread monotone; spans tile the log exactly.
    let mut by_id = all;
    by_id.sort_by_key(|(span, _)| span.id);
    let mut expected_id = 0u64;
    for (span, _) in &by_id {
        assert_eq!(span.id, expected_id, "spans must tile the log");
        expected_id += span.len as u64;
    }
    assert_eq!(expected_id, log.len() as u64);

    // Every record reads back from its own id.
    let reader = LiteReader::new(&log);
    for (span, record) in &by_id {
        let mut out = Vec::new();
        let next = reader.get(span.id, &mut out).unwrap();
        assert_eq!(&out, record);
        assert_eq!(next, span.id + span.len as u64);
    }
}

/// Fails the first write, then lets everything through.
struct FailOnce<'a> {
    inner: &'a MemLog,
    failed: bool,
}

impl WriteHelper for FailOnce<'_> {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        if !self.failed {
            self.failed = true;
            return Err(io::Error::new(io::ErrorKind::WriteZero, "injected fault"));
        }
        let mut sink = self.inner;
        sink.write_all(buf)
    }
}

#[test]
fn failed_batch_does_not_advance_the_cursor() {
    let log = MemLog::new();
    let writer = LiteWriter::new(
        FailOnce {
            inner: &log,
            failed: false,
        },
        0,
    );

    let err = writer.add(b"lost to the fault").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    assert!(log.is_empty());

    // The next append lands exactly where the failed one would have.
    let span = writer.add(b"second attempt").unwrap();
    assert_eq!(span.id, 0);

    let reader = LiteReader::new(&log);
    let mut out = Vec::new();
    reader.get(0, &mut out).unwrap();
    assert_eq!(out, b"second attempt");
}

/// Every write fails: each concurrent producer must observe an error.
struct AlwaysFails;

impl WriteHelper for AlwaysFails {
    fn write_all(&mut self, _buf: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "storage offline"))
    }
}

#[test]
fn every_producer_in_a_failing_batch_sees_the_error() {
    let writer = LiteWriter::new(AlwaysFails, 0);
    thread::scope(|scope| {
        let mut handles = Vec::new();
        for t in 0..8 {
            let writer = &writer;
            handles.push(scope.spawn(move || {
                for seq in 0..50 {
                    let record = record_for(t, seq);
                    assert!(writer.add(&record).is_err());
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    });
}
