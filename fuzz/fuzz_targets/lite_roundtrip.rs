#![no_main]
use libfuzzer_sys::fuzz_target;

use warlog::lite::{LiteReader, LiteWriter};
use warlog::mem::MemLog;

fuzz_target!(|data: &[u8]| {
    // Split the input into records, append them all, read them all back.
    let log = MemLog::new();
    let writer = LiteWriter::new(&log, 0);

    let mut spans = Vec::new();
    let mut expected = Vec::new();
    for record in data.chunks(97) {
        spans.push(writer.add(record).unwrap());
        expected.push(record);
    }

    let reader = LiteReader::new(&log);
    let mut id = 0u64;
    for (span, record) in spans.iter().zip(expected) {
        assert_eq!(id, span.id);
        let mut out = Vec::new();
        id = reader.get(id, &mut out).unwrap();
        assert_eq!(out.as_slice(), record);
    }
    assert_eq!(id, log.len() as u64);
});
