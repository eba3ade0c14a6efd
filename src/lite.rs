//! The lite codec: no compression, one storage write per leader batch.
//!
//! Concurrent producers queue their envelopes under a mutex; whichever
//! producer finds itself at the front becomes the batch leader, concatenates
//! every queued envelope into one buffer, performs the single helper write
//! with the mutex released, and then wakes the followers it committed —
//! each on its own condition variable, so only intended waiters run.

use std::collections::VecDeque;
use std::io;
use std::mem;
use std::sync::{Arc, Condvar, Mutex};

use log::trace;

use crate::{envelope, ReadError, ReadHelper, Span, WriteHelper, MAX_RECORD_SIZE};

/// Multi-producer append half of the lite codec.
pub struct LiteWriter<H> {
    helper: Mutex<H>,
    state: Mutex<LiteState>,
}

struct LiteState {
    cursor: u64,
    /// Shared batch buffer, reused across leader rounds.
    scratch: Vec<u8>,
    queue: VecDeque<Arc<Commit>>,
}

/// One queued append: its pre-encoded envelope plus the rendezvous the
/// leader completes it through.
struct Commit {
    envelope: Vec<u8>,
    cv: Condvar,
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    pos: u64,
    len: usize,
    done: bool,
    err: Option<(io::ErrorKind, String)>,
}

impl<H: WriteHelper> LiteWriter<H> {
    /// A writer appending through `helper`, with `cursor` naming the log
    /// offset the next envelope lands at.
    pub fn new(helper: H, cursor: u64) -> Self {
        LiteWriter {
            helper: Mutex::new(helper),
            state: Mutex::new(LiteState {
                cursor,
                scratch: Vec::new(),
                queue: VecDeque::new(),
            }),
        }
    }

    /// Append `record`, returning the id (and encoded length) of its
    /// envelope. Safe to call from any number of threads; each call blocks
    /// until its batch is durably handed to the helper.
    ///
    /// If the helper write fails, every append in the failing batch
    /// observes the error and the cursor stays put.
    ///
    /// # Panics
    ///
    /// If `record` exceeds [`MAX_RECORD_SIZE`]; callers size-check first.
    pub fn add(&self, record: &[u8]) -> io::Result<Span> {
        assert!(
            record.len() <= MAX_RECORD_SIZE,
            "record of {} bytes exceeds the battlefield envelope bound",
            record.len(),
        );

        // Envelopes are position-independent, so encode before queueing;
        // the leader only concatenates.
        let mut enc = Vec::with_capacity(envelope::plain_len(record.len()));
        envelope::append_plain(&mut enc, record);
        let commit = Arc::new(Commit {
            envelope: enc,
            cv: Condvar::new(),
            slot: Mutex::new(Slot::default()),
        });

        let mut state = self.state.lock().unwrap();
        state.queue.push_back(Arc::clone(&commit));
        loop {
            if commit.slot.lock().unwrap().done {
                // A leader committed this record on our behalf.
                drop(state);
                return finish(&commit);
            }
            if Arc::ptr_eq(state.queue.front().expect("own commit is queued"), &commit) {
                break;
            }
            state = commit.cv.wait(state).unwrap();
        }

        // Leader: fold the whole queue into one batch.
        let st = &mut *state;
        st.scratch.clear();
        for queued in st.queue.iter() {
            let mut slot = queued.slot.lock().unwrap();
            slot.pos = st.cursor + st.scratch.len() as u64;
            slot.len = queued.envelope.len();
            st.scratch.extend_from_slice(&queued.envelope);
        }
        let batch = st.queue.len();
        let buf = mem::take(&mut st.scratch);
        drop(state);

        trace!("group commit: batch={} bytes={}", batch, buf.len());
        let written = self.helper.lock().unwrap().write_all(&buf);

        let mut state = self.state.lock().unwrap();
        if written.is_ok() {
            state.cursor += buf.len() as u64;
        }
        state.scratch = buf;
        let err = written
            .as_ref()
            .err()
            .map(|e| (e.kind(), e.to_string()));
        if let Some(e) = &err {
            commit.slot.lock().unwrap().err = Some(e.clone());
        }

        for _ in 0..batch {
            let ready = state.queue.pop_front().expect("batch entries still queued");
            if !Arc::ptr_eq(&ready, &commit) {
                let mut slot = ready.slot.lock().unwrap();
                slot.err = err.clone();
                slot.done = true;
                drop(slot);
                ready.cv.notify_one();
            }
        }
        // Hand leadership to whoever queued during the write.
        if let Some(next) = state.queue.front() {
            next.cv.notify_one();
        }
        drop(state);

        finish(&commit)
    }
}

fn finish(commit: &Commit) -> io::Result<Span> {
    let slot = commit.slot.lock().unwrap();
    match &slot.err {
        Some((kind, msg)) => Err(io::Error::new(*kind, msg.clone())),
        None => Ok(Span {
            id: slot.pos,
            len: slot.len,
        }),
    }
}

/// Read half of the lite codec: every record is a plain envelope.
pub struct LiteReader<H> {
    helper: H,
}

impl<H: ReadHelper> LiteReader<H> {
    pub fn new(helper: H) -> Self {
        LiteReader { helper }
    }

    /// Append the record stored at `id` to `dst` and return the id of the
    /// next envelope.
    pub fn get(&self, id: u64, dst: &mut Vec<u8>) -> Result<u64, ReadError> {
        let env = envelope::read_envelope(&self.helper, id)?;
        if crate::crc32c::value(env.payload()) != env.crc {
            return Err(ReadError::CrcMismatch);
        }
        dst.extend_from_slice(env.payload());
        Ok(id + env.total_len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::MemLog;

    #[test]
    fn single_thread_roundtrip() {
        let log = MemLog::new();
        let writer = LiteWriter::new(&log, 0);

        let a = writer.add(b"alpha").unwrap();
        let b = writer.add(b"beta").unwrap();
        assert_eq!(a.id, 0);
        assert_eq!(b.id, a.len as u64);

        let reader = LiteReader::new(&log);
        let mut out = Vec::new();
        let next = reader.get(a.id, &mut out).unwrap();
        assert_eq!(out, b"alpha");
        assert_eq!(next, b.id);
        out.clear();
        reader.get(b.id, &mut out).unwrap();
        assert_eq!(out, b"beta");
    }

    #[test]
    fn empty_record() {
        let log = MemLog::new();
        let writer = LiteWriter::new(&log, 0);
        let span = writer.add(b"").unwrap();
        assert_eq!(span.len, 5);

        let reader = LiteReader::new(&log);
        let mut out = Vec::new();
        let next = reader.get(span.id, &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(next, 5);
    }

    struct FailingHelper;

    impl WriteHelper for FailingHelper {
        fn write_all(&mut self, _buf: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn write_error_reaches_caller_and_cursor_holds() {
        let writer = LiteWriter::new(FailingHelper, 0);
        let err = writer.add(b"doomed").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(writer.state.lock().unwrap().cursor, 0);
    }

    #[test]
    fn nonzero_initial_cursor() {
        let log = MemLog::new();
        let writer = LiteWriter::new(&log, 1000);
        let span = writer.add(b"x").unwrap();
        assert_eq!(span.id, 1000);
    }
}
