//! Operation callbacks and the one-shot completion gate.
//!
//! Every transfer ends with exactly one call to either
//! [`TransferObserver::on_success`] or [`TransferObserver::on_error`].
//! [`CompletionReporter`] enforces that: once a terminal callback has been
//! delivered, later terminal and progress deliveries are dropped.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::{ProgressEvent, TransferEvent, TransferFailure, TransferSummary};

/// Receives notifications from a running transfer.
pub trait TransferObserver: Send {
    /// Rate-limited progress update.
    fn on_progress(&mut self, event: ProgressEvent);

    /// The transfer finished; all source bytes were written.
    fn on_success(&mut self, summary: &TransferSummary);

    /// The transfer failed. Bytes already written stay on disk.
    fn on_error(&mut self, failure: &TransferFailure);
}

/// Channel observer. Progress is best-effort and never takes the last free
/// slot, which stays reserved for the terminal event.
impl TransferObserver for mpsc::Sender<TransferEvent> {
    fn on_progress(&mut self, event: ProgressEvent) {
        if self.capacity() <= 1 {
            debug!(
                bytes = event.bytes_written,
                "progress event dropped: channel nearly full"
            );
            return;
        }
        if let Err(e) = self.try_send(TransferEvent::Progress(event)) {
            debug!("progress event dropped: {e}");
        }
    }

    fn on_success(&mut self, summary: &TransferSummary) {
        if let Err(e) = self.try_send(TransferEvent::Completed {
            bytes_written: summary.bytes_written,
        }) {
            warn!("failed to forward completion event: {e}");
        }
    }

    fn on_error(&mut self, failure: &TransferFailure) {
        if let Err(e) = self.try_send(TransferEvent::Failed {
            kind: failure.kind(),
            detail: failure.detail(),
            bytes_written: failure.bytes_written,
        }) {
            warn!("failed to forward failure event: {e}");
        }
    }
}

/// Wraps an observer and guarantees a single terminal delivery.
pub struct CompletionReporter<O> {
    observer: O,
    delivered: bool,
}

impl<O: TransferObserver> CompletionReporter<O> {
    pub fn new(observer: O) -> Self {
        Self {
            observer,
            delivered: false,
        }
    }

    /// Forwards a progress event unless the transfer already ended.
    pub fn progress(&mut self, event: ProgressEvent) {
        if self.delivered {
            debug!(bytes = event.bytes_written, "progress after completion dropped");
            return;
        }
        self.observer.on_progress(event);
    }

    /// Delivers the success callback. Returns `false` if a terminal callback
    /// was already delivered.
    pub fn succeed(&mut self, summary: &TransferSummary) -> bool {
        if self.delivered {
            warn!(
                bytes_written = summary.bytes_written,
                "duplicate terminal success suppressed"
            );
            return false;
        }
        self.delivered = true;
        self.observer.on_success(summary);
        true
    }

    /// Delivers the error callback. Returns `false` if a terminal callback
    /// was already delivered.
    pub fn fail(&mut self, failure: &TransferFailure) -> bool {
        if self.delivered {
            warn!(error = %failure, "duplicate terminal failure suppressed");
            return false;
        }
        self.delivered = true;
        self.observer.on_error(failure);
        true
    }
}
