//! Criterion benchmarks for the compress codec.
//!
//! Setup drives one writer across the war-zone and battlefield boundaries
//! (paying the dictionary index builds up front), then measures
//! steady-state compressed appends and random record reads.


use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use warlog::compress::{CompressReader, CompressWriter, BATTLEFIELD_SIZE, WAR_ZONE_SIZE};
use warlog::mem::MemLog;

const RECORD_SIZE: usize = 4096;

/// Drive `writer` past the plain regions so appends hit the encoder.
fn cross_into_compressed_zone(log: &MemLog, writer: &mut CompressWriter<&MemLog>) {
    let chunk = corpus::synthetic_data(60_000);
    while log.len() < WAR_ZONE_SIZE + BATTLEFIELD_SIZE {
        writer.add(&chunk).unwrap();
    }
}

fn bench_add(c: &mut Criterion) {
    let log = MemLog::new();
    let mut writer = CompressWriter::new(&log, 0);
    cross_into_compressed_zone(&log, &mut writer);
    let record = corpus::synthetic_data(RECORD_SIZE);

    let mut group = c.benchmark_group("compress");
    group.throughput(Throughput::Bytes(RECORD_SIZE as u64));
    group.bench_function("add_4k", |b| {
        b.iter(|| writer.add(&record).unwrap());
    });
    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let log = MemLog::new();
    let mut writer = CompressWriter::new(&log, 0);
    cross_into_compressed_zone(&log, &mut writer);
    let record = corpus::synthetic_data(RECORD_SIZE);
    let spans: Vec<_> = (0..64).map(|_| writer.add(&record).unwrap()).collect();

    let reader = CompressReader::new(&log);
    let mut group = c.benchmark_group("compress");
    group.throughput(Throughput::Bytes((RECORD_SIZE * spans.len()) as u64));
    group.bench_function("get_4k_x64", |b| {
        b.iter(|| {
            let mut out = Vec::new();
            for span in &spans {
                out.clear();
                reader.get(span.id, &mut out).unwrap();
            }
            out.len()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_add, bench_get);
criterion_main!(benches);
