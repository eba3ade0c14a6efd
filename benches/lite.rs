//! Criterion benchmarks for the lite codec: single-producer appends and the
//! group-commit path under four producers.


use std::thread;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use warlog::lite::{LiteReader, LiteWriter};
use warlog::mem::MemLog;

const RECORD_SIZE: usize = 512;

fn bench_add_single(c: &mut Criterion) {
    let log = MemLog::new();
    let writer = LiteWriter::new(&log, 0);
    let record = corpus::synthetic_data(RECORD_SIZE);

    let mut group = c.benchmark_group("lite");
    group.throughput(Throughput::Bytes(RECORD_SIZE as u64));
    group.bench_function("add_512", |b| {
        b.iter(|| writer.add(&record).unwrap());
    });
    group.finish();
}

fn bench_add_contended(c: &mut Criterion) {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 64;

    let log = MemLog::new();
    let writer = LiteWriter::new(&log, 0);
    let record = corpus::synthetic_data(RECORD_SIZE);

    let mut group = c.benchmark_group("lite");
    group.throughput(Throughput::Bytes((RECORD_SIZE * THREADS * PER_THREAD) as u64));
    group.bench_function("add_512_x4_threads", |b| {
        b.iter(|| {
            thread::scope(|scope| {
                for _ in 0..THREADS {
                    let writer = &writer;
                    let record = &record;
                    scope.spawn(move || {
                        for _ in 0..PER_THREAD {
                            writer.add(record).unwrap();
                        }
                    });
                }
            });
        });
    });
    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let log = MemLog::new();
    let writer = LiteWriter::new(&log, 0);
    let record = corpus::synthetic_data(RECORD_SIZE);
    let spans: Vec<_> = (0..256).map(|_| writer.add(&record).unwrap()).collect();

    let reader = LiteReader::new(&log);
    let mut group = c.benchmark_group("lite");
    group.throughput(Throughput::Bytes((RECORD_SIZE * spans.len()) as u64));
    group.bench_function("get_512_x256", |b| {
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

criterion_group!(benches, bench_add_single, bench_add_contended, bench_get);
criterion_main!(benches);
