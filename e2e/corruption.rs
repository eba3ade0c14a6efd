//! E2E: every single-byte corruption of a stored envelope is detected.

use warlog::compress::{CompressReader, CompressWriter};
use warlog::lite::{LiteReader, LiteWriter};
use warlog::mem::MemLog;

#[test]
fn any_flipped_byte_fails_the_read() {
    // Byte-exact envelope of "hello" is 10 bytes; try corrupting each one.
    let pristine_len = {
        let log = MemLog::new();
        let writer = LiteWriter::new(&log, 0);
        writer.add(b"hello").unwrap().len
    };

    for victim in 0..pristine_len {
        let log = MemLog::new();
        let writer = LiteWriter::new(&log, 0);
        writer.add(b"hello").unwrap();
        log.flip_byte(victim);

        let reader = LiteReader::new(&log);
        let mut out = Vec::new();
        assert!(
            reader.get(0, &mut out).is_err(),
            "flip at byte {victim} went undetected",
        );
    }
}

#[test]
fn corruption_in_one_record_leaves_others_readable() {
    let log = MemLog::new();
    let writer = LiteWriter::new(&log, 0);
    let first = writer.add(b"record one").unwrap();
    let second = writer.add(b"record two").unwrap();
    let third = writer.add(b"record three").unwrap();

    // Corrupt a payload byte of the middle record.
    log.flip_byte(second.id as usize + 3);

    let reader = LiteReader::new(&log);
    let mut out = Vec::new();
    reader.get(first.id, &mut out).unwrap();
    assert_eq!(out, b"record one");

    out.clear();
    assert!(reader.get(second.id, &mut out).is_err());
    assert!(out.is_empty());

    out.clear();
    reader.get(third.id, &mut out).unwrap();
    assert_eq!(out, b"record three");
}

#[test]
fn compress_reader_rejects_corruption_too() {
    let log = MemLog::new();
    let mut writer = CompressWriter::new(&log, 0);
    let span = writer.add(b"a record the compress reader will fetch").unwrap();

    log.flip_byte(span.id as usize + 6);

    let reader = CompressReader::new(&log);
    let mut out = Vec::new();
    assert!(reader.get(span.id, &mut out).is_err());
    assert!(out.is_empty());
}

#[test]
fn truncated_log_is_an_error_not_a_panic() {
    // A length prefix promising more bytes than the log holds.
    let log = MemLog::new();
    {
        use warlog::WriteHelper;
        let mut sink = &log;
        sink.write_all(&[0x7f, b'x']).unwrap();
    }
    let reader = LiteReader::new(&log);
    let mut out = Vec::new();
    assert!(reader.get(0, &mut out).is_err());
}
