#![no_main]
use libfuzzer_sys::fuzz_target;

use std::io;

use warlog::compress::{CompressReader, BATTLEFIELD_SIZE, WAR_ZONE_SIZE};
use warlog::lite::LiteReader;
use warlog::mem::MemLog;
use warlog::{ReadHelper, WriteHelper};

/// A log of `base_len` zero bytes followed by the fuzz input, materializing
/// nothing: dictionary regions read back as zeroes, so no per-iteration
/// allocation scales past the input itself.
struct SparseLog<'a> {
    base_len: u64,
    tail: &'a [u8],
}

impl ReadHelper for SparseLog<'_> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let total = self.base_len + self.tail.len() as u64;
        offset
            .checked_add(buf.len() as u64)
            .filter(|&end| end <= total)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "read past end of log")
            })?;
        for (i, byte) in buf.iter_mut().enumerate() {
            let pos = offset + i as u64;
            *byte = if pos < self.base_len {
                0
            } else {
                self.tail[(pos - self.base_len) as usize]
            };
        }
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes through both readers. Err results are expected
    // and fine; what we verify is no panics.

    // As a log read from offset 0: exercises the plain envelope path.
    {
        let log = MemLog::new();
        let mut sink = &log;
        sink.write_all(data).unwrap();

        let mut out = Vec::new();
        let _ = LiteReader::new(&log).get(0, &mut out);
        out.clear();
        let _ = CompressReader::new(&log).get(0, &mut out);

        // A few data-derived ids as well.
        for chunk in data.chunks(2).take(4) {
            let id = u64::from(chunk[0]) | u64::from(*chunk.last().unwrap()) << 8;
            out.clear();
            let _ = LiteReader::new(&log).get(id, &mut out);
        }
    }

    // Behind a compressed-zone id: exercises the mark walker, with the
    // dictionary regions backed by the sparse zero base.
    {
        let base = (WAR_ZONE_SIZE + BATTLEFIELD_SIZE) as u64;
        let log = SparseLog {
            base_len: base,
            tail: data,
        };

        let mut out = Vec::new();
        let _ = CompressReader::new(log).get(base, &mut out);
    }
});
