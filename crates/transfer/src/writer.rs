//! Write orchestrator.
//!
//! Drives one transfer through
//! `Start -> ProbingDestination -> (Reading -> Writing)* -> Completed`,
//! with `Failed` reachable from every non-terminal state. Exactly one read
//! or write is outstanding at any time: the next operation is only issued
//! from the loop after the previous one resolved, and both phases share the
//! single transfer buffer.

use std::io;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, trace, warn};

use crate::config::WriterConfig;
use crate::error::{SourceError, TransferError};
use crate::progress::ProgressThrottle;
use crate::reporter::{CompletionReporter, TransferObserver};
use crate::sink::WriteSink;
use crate::source::ChunkSource;
use crate::types::{
    ProgressEvent, Transfer, TransferFailure, TransferParams, TransferState, TransferSummary,
};

/// Moves bytes from a [`ChunkSource`] into a [`WriteSink`] under a quota.
pub struct FileWriter<S, K> {
    id: String,
    source: S,
    sink: K,
    transfer: Transfer,
    config: WriterConfig,
    cancel: CancellationToken,
    state: TransferState,
    buffer: Vec<u8>,
}

impl<S: ChunkSource, K: WriteSink> FileWriter<S, K> {
    /// Creates a transfer. Nothing is validated or touched until
    /// [`run`](Self::run).
    pub fn new(source: S, sink: K, params: TransferParams, cancel: CancellationToken) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source,
            sink,
            transfer: Transfer::new(params),
            config: WriterConfig::default(),
            cancel,
            state: TransferState::Start,
            buffer: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Unique identifier used in log records.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Runs the transfer to completion.
    ///
    /// `observer` receives throttled progress and exactly one terminal
    /// callback; the same outcome is returned.
    pub async fn run<O: TransferObserver>(
        mut self,
        observer: O,
    ) -> Result<TransferSummary, TransferFailure> {
        let span = info_span!("transfer", id = %self.id);
        async move {
            let mut reporter = CompletionReporter::new(observer);
            let mut throttle = self.config.throttle();

            match self.drive(&mut reporter, &mut throttle).await {
                Ok(()) => {
                    let summary = self.transfer.summary();
                    let now = Instant::now();
                    if throttle.should_report(now, summary.bytes_written, true) {
                        reporter.progress(self.progress_event(true));
                        throttle.mark_reported(now, summary.bytes_written);
                    }
                    reporter.succeed(&summary);
                    info!(
                        bytes_written = summary.bytes_written,
                        initial_size = summary.initial_size,
                        "transfer completed"
                    );
                    Ok(summary)
                }
                Err(error) => {
                    let failed_in = self.state;
                    self.state = TransferState::Failed;
                    debug!(from = %failed_in, to = %self.state, "state transition");
                    let failure = TransferFailure {
                        error,
                        bytes_written: self.transfer.bytes_written(),
                    };
                    warn!(
                        state = %failed_in,
                        kind = ?failure.kind(),
                        bytes_written = failure.bytes_written,
                        error = %failure.error,
                        "transfer failed"
                    );
                    reporter.fail(&failure);
                    Err(failure)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn drive<O: TransferObserver>(
        &mut self,
        reporter: &mut CompletionReporter<O>,
        throttle: &mut ProgressThrottle,
    ) -> Result<(), TransferError> {
        while !self.state.is_terminal() {
            if self.cancel.is_cancelled() {
                return Err(TransferError::Cancelled);
            }

            let next = match self.state {
                TransferState::Start => self.start()?,
                TransferState::ProbingDestination => self.probe().await?,
                TransferState::Reading => self.read().await?,
                TransferState::Writing { len } => self.write(len, reporter, throttle).await?,
                TransferState::Completed | TransferState::Failed => self.state,
            };
            debug!(from = %self.state, to = %next, "state transition");
            self.state = next;
        }
        Ok(())
    }

    fn start(&mut self) -> Result<TransferState, TransferError> {
        self.transfer.params().validate()?;
        self.config
            .validate()
            .map_err(|e| TransferError::InvalidArgument(e.to_string()))?;

        self.buffer = vec![0u8; self.config.buffer_size];
        Ok(TransferState::ProbingDestination)
    }

    async fn probe(&mut self) -> Result<TransferState, TransferError> {
        let size = self
            .sink
            .stat_size()
            .await
            .map_err(TransferError::DestinationUnavailable)?;
        self.transfer.set_initial_size(size);

        debug!(
            size,
            offset = self.transfer.params().start_offset,
            baseline = self.transfer.baseline(),
            "destination probed"
        );
        Ok(TransferState::Reading)
    }

    async fn read(&mut self) -> Result<TransferState, TransferError> {
        // A pending read is abandoned on cancellation; it has not touched
        // the destination yet.
        let n = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(TransferError::Cancelled);
            }
            result = self.source.read_chunk(&mut self.buffer) => result?,
        };

        if n == 0 {
            return Ok(TransferState::Completed);
        }
        if n > self.buffer.len() {
            return Err(SourceError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("source reported {n} bytes for a {} byte buffer", self.buffer.len()),
            ))
            .into());
        }

        self.transfer.add_read(n);
        trace!(len = n, "chunk received");
        Ok(TransferState::Writing { len: n })
    }

    async fn write<O: TransferObserver>(
        &mut self,
        len: usize,
        reporter: &mut CompletionReporter<O>,
        throttle: &mut ProgressThrottle,
    ) -> Result<TransferState, TransferError> {
        let decision = self.transfer.decide(len);
        if decision.exceeded {
            debug!(
                chunk = len,
                allowed = decision.bytes_to_write,
                "chunk truncated by quota"
            );
        }

        let mut done = 0;
        while done < decision.bytes_to_write {
            let offset = self.transfer.write_offset();
            let pending = &self.buffer[done..decision.bytes_to_write];
            let n = self
                .sink
                .write_at(offset, pending)
                .await
                .map_err(TransferError::Write)?;
            if n == 0 {
                return Err(TransferError::Write(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "sink accepted zero bytes",
                )));
            }
            let n = n.min(pending.len());

            self.transfer.add_written(n);
            done += n;
            trace!(offset, len = n, "chunk written");

            let now = Instant::now();
            let written = self.transfer.bytes_written();
            if throttle.should_report(now, written, false) {
                reporter.progress(self.progress_event(false));
                throttle.mark_reported(now, written);
            }
        }

        if decision.exceeded {
            let ceiling = self.transfer.params().quota.ceiling().unwrap_or_default();
            return Err(TransferError::QuotaExceeded { ceiling });
        }
        Ok(TransferState::Reading)
    }

    fn progress_event(&self, done: bool) -> ProgressEvent {
        ProgressEvent {
            bytes_written: self.transfer.bytes_written(),
            expected_total: self.source.size_hint(),
            done,
        }
    }
}
