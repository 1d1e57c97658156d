//! Scripted collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::error::{ErrorKind, SourceError};
use crate::reporter::TransferObserver;
use crate::sink::{SinkFuture, WriteSink};
use crate::source::{ChunkSource, SourceFuture};
use crate::types::{ProgressEvent, TransferFailure, TransferSummary};

pub(crate) enum ReadStep {
    Chunk(Vec<u8>),
    Fail(SourceError),
    /// Never resolves; only cancellation ends the read.
    Hang,
}

/// Source that replays a fixed script, then reports end of stream.
pub(crate) struct ScriptedSource {
    steps: VecDeque<ReadStep>,
    reads: Arc<Mutex<usize>>,
    size_hint: Option<u64>,
}

impl ScriptedSource {
    pub(crate) fn new(steps: Vec<ReadStep>) -> Self {
        Self {
            steps: steps.into(),
            reads: Arc::new(Mutex::new(0)),
            size_hint: None,
        }
    }

    /// Source yielding `count` chunks of `len` bytes with distinct contents.
    pub(crate) fn chunks(count: usize, len: usize) -> Self {
        Self::new(
            (0..count)
                .map(|i| ReadStep::Chunk(pattern(i, len)))
                .collect(),
        )
    }

    pub(crate) fn with_size_hint(mut self, total: u64) -> Self {
        self.size_hint = Some(total);
        self
    }

    pub(crate) fn read_counter(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.reads)
    }
}

impl ChunkSource for ScriptedSource {
    fn read_chunk<'a>(&'a mut self, buf: &'a mut [u8]) -> SourceFuture<'a> {
        Box::pin(async move {
            *self.reads.lock().unwrap() += 1;
            match self.steps.pop_front() {
                None => Ok(0),
                Some(ReadStep::Chunk(data)) => {
                    assert!(data.len() <= buf.len(), "scripted chunk exceeds buffer");
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                Some(ReadStep::Fail(e)) => Err(e),
                Some(ReadStep::Hang) => std::future::pending().await,
            }
        })
    }

    fn size_hint(&self) -> Option<u64> {
        self.size_hint
    }
}

/// Deterministic chunk contents so reordering shows up in comparisons.
pub(crate) fn pattern(index: usize, len: usize) -> Vec<u8> {
    (0..len).map(|j| ((index * 31 + j) % 251) as u8).collect()
}

#[derive(Default)]
pub(crate) struct SinkLog {
    /// `(offset, requested_len, written_len)` per `write_at` call.
    pub(crate) writes: Vec<(u64, usize, usize)>,
    pub(crate) contents: Vec<u8>,
    pub(crate) stat_calls: usize,
}

#[derive(Default)]
struct SinkFaults {
    fail_stat: bool,
    fail_write_call: Option<(usize, io::ErrorKind)>,
    max_write: Option<usize>,
    cancel_during_write: Option<(usize, CancellationToken)>,
}

/// In-memory sink recording every call.
#[derive(Default)]
pub(crate) struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
    faults: SinkFaults,
}

impl RecordingSink {
    pub(crate) fn with_contents(contents: &[u8]) -> Self {
        let sink = Self::default();
        sink.log.lock().unwrap().contents = contents.to_vec();
        sink
    }

    pub(crate) fn log(&self) -> Arc<Mutex<SinkLog>> {
        Arc::clone(&self.log)
    }

    pub(crate) fn failing_stat(mut self) -> Self {
        self.faults.fail_stat = true;
        self
    }

    /// Fails the `call`-th write (1-based) with `kind`.
    pub(crate) fn failing_write(mut self, call: usize, kind: io::ErrorKind) -> Self {
        self.faults.fail_write_call = Some((call, kind));
        self
    }

    /// Accepts at most `max` bytes per call.
    pub(crate) fn short_writes(mut self, max: usize) -> Self {
        self.faults.max_write = Some(max);
        self
    }

    /// Fires `token` while the `call`-th write is in flight; the write
    /// still completes.
    pub(crate) fn cancel_during_write(mut self, call: usize, token: CancellationToken) -> Self {
        self.faults.cancel_during_write = Some((call, token));
        self
    }
}

impl WriteSink for RecordingSink {
    fn stat_size(&mut self) -> SinkFuture<'_, u64> {
        Box::pin(async move {
            let mut log = self.log.lock().unwrap();
            log.stat_calls += 1;
            if self.faults.fail_stat {
                return Err(io::Error::from(io::ErrorKind::NotFound));
            }
            Ok(log.contents.len() as u64)
        })
    }

    fn write_at<'a>(&'a mut self, offset: u64, data: &'a [u8]) -> SinkFuture<'a, usize> {
        Box::pin(async move {
            let call = self.log.lock().unwrap().writes.len() + 1;

            if let Some((n, token)) = &self.faults.cancel_during_write
                && *n == call
            {
                token.cancel();
                tokio::task::yield_now().await;
            }

            let mut log = self.log.lock().unwrap();
            if let Some((n, kind)) = self.faults.fail_write_call
                && n == call
            {
                log.writes.push((offset, data.len(), 0));
                return Err(io::Error::from(kind));
            }

            let len = self.faults.max_write.map_or(data.len(), |m| m.min(data.len()));
            let start = offset as usize;
            let end = start + len;
            if log.contents.len() < end {
                log.contents.resize(end, 0);
            }
            log.contents[start..end].copy_from_slice(&data[..len]);
            log.writes.push((offset, data.len(), len));
            Ok(len)
        })
    }
}

#[derive(Default)]
struct Recorded {
    progress: Vec<ProgressEvent>,
    successes: Vec<u64>,
    failures: Vec<(ErrorKind, u64)>,
}

/// Observer that records every callback; clones share the record.
#[derive(Clone, Default)]
pub(crate) struct RecordingObserver {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingObserver {
    pub(crate) fn progress(&self) -> Vec<ProgressEvent> {
        self.inner.lock().unwrap().progress.clone()
    }

    pub(crate) fn progress_bytes(&self) -> Vec<u64> {
        self.progress().iter().map(|p| p.bytes_written).collect()
    }

    pub(crate) fn successes(&self) -> Vec<u64> {
        self.inner.lock().unwrap().successes.clone()
    }

    pub(crate) fn failures(&self) -> Vec<(ErrorKind, u64)> {
        self.inner.lock().unwrap().failures.clone()
    }

    pub(crate) fn terminal_count(&self) -> usize {
        let r = self.inner.lock().unwrap();
        r.successes.len() + r.failures.len()
    }
}

impl TransferObserver for RecordingObserver {
    fn on_progress(&mut self, event: ProgressEvent) {
        self.inner.lock().unwrap().progress.push(event);
    }

    fn on_success(&mut self, summary: &TransferSummary) {
        self.inner.lock().unwrap().successes.push(summary.bytes_written);
    }

    fn on_error(&mut self, failure: &TransferFailure) {
        self.inner
            .lock()
            .unwrap()
            .failures
            .push((failure.kind(), failure.bytes_written));
    }
}
