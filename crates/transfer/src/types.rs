use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, TransferError};
use crate::quota::{self, QuotaDecision};

/// How much a transfer may write to its destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuotaLimit {
    /// No limit; chunks are never truncated.
    #[default]
    Unlimited,
    /// At most this many bytes may be written by the transfer.
    Absolute(i64),
    /// The destination file may grow by at most this many bytes.
    ///
    /// Bytes overwritten in place below the current end of file are free;
    /// a start offset beyond the end of file consumes growth for the gap.
    Growth(i64),
}

impl QuotaLimit {
    /// Returns the ceiling, or `None` when unlimited.
    pub fn ceiling(&self) -> Option<i64> {
        match self {
            QuotaLimit::Unlimited => None,
            QuotaLimit::Absolute(c) | QuotaLimit::Growth(c) => Some(*c),
        }
    }

    /// Bytes already consumed against the ceiling before the first write.
    pub fn baseline(&self, start_offset: i64, current_size: u64) -> i64 {
        match self {
            QuotaLimit::Growth(_) => {
                let size = i64::try_from(current_size).unwrap_or(i64::MAX);
                start_offset.saturating_sub(size)
            }
            QuotaLimit::Unlimited | QuotaLimit::Absolute(_) => 0,
        }
    }
}

/// Parameters supplied when a transfer is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferParams {
    /// Byte offset in the destination where the first chunk lands.
    pub start_offset: i64,
    pub quota: QuotaLimit,
}

impl TransferParams {
    pub fn new(start_offset: i64, quota: QuotaLimit) -> Self {
        Self {
            start_offset,
            quota,
        }
    }

    /// Rejects negative offsets and negative quota ceilings.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.start_offset < 0 {
            return Err(TransferError::InvalidArgument(format!(
                "start offset must be non-negative, got {}",
                self.start_offset
            )));
        }
        if let Some(ceiling) = self.quota.ceiling()
            && ceiling < 0
        {
            return Err(TransferError::InvalidArgument(format!(
                "quota ceiling must be non-negative, got {ceiling}"
            )));
        }
        Ok(())
    }
}

/// Byte accounting for one transfer.
#[derive(Debug, Clone)]
pub struct Transfer {
    params: TransferParams,
    initial_size: u64,
    baseline: i64,
    bytes_read: u64,
    bytes_written: u64,
}

impl Transfer {
    pub fn new(params: TransferParams) -> Self {
        Self {
            params,
            initial_size: 0,
            baseline: 0,
            bytes_read: 0,
            bytes_written: 0,
        }
    }

    /// Records the destination size observed by the probe and derives the
    /// quota baseline from it.
    pub fn set_initial_size(&mut self, size: u64) {
        self.initial_size = size;
        self.baseline = self.params.quota.baseline(self.params.start_offset, size);
    }

    /// Decides how much of a `chunk_len` byte chunk may be written.
    pub fn decide(&self, chunk_len: usize) -> QuotaDecision {
        match self.params.quota.ceiling() {
            Some(ceiling) => quota::decide(ceiling, self.baseline, self.bytes_written, chunk_len),
            None => QuotaDecision::unlimited(chunk_len),
        }
    }

    /// Destination offset of the next byte to be written.
    ///
    /// Only meaningful once the params passed validation.
    pub fn write_offset(&self) -> u64 {
        let start = u64::try_from(self.params.start_offset).unwrap_or(0);
        start.saturating_add(self.bytes_written)
    }

    pub fn add_read(&mut self, bytes: usize) {
        self.bytes_read += bytes as u64;
    }

    pub fn add_written(&mut self, bytes: usize) {
        self.bytes_written += bytes as u64;
    }

    pub fn params(&self) -> &TransferParams {
        &self.params
    }

    pub fn baseline(&self) -> i64 {
        self.baseline
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn summary(&self) -> TransferSummary {
        TransferSummary {
            bytes_written: self.bytes_written,
            bytes_read: self.bytes_read,
            initial_size: self.initial_size,
        }
    }
}

/// State of the write orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Start,
    ProbingDestination,
    Reading,
    /// Holds the number of bytes filled into the transfer buffer.
    Writing { len: usize },
    Completed,
    Failed,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Completed | TransferState::Failed)
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferState::Start => f.write_str("start"),
            TransferState::ProbingDestination => f.write_str("probing"),
            TransferState::Reading => f.write_str("reading"),
            TransferState::Writing { len } => write!(f, "writing({len})"),
            TransferState::Completed => f.write_str("completed"),
            TransferState::Failed => f.write_str("failed"),
        }
    }
}

/// Progress notification sent to the owning operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub bytes_written: u64,
    /// Total bytes the source expects to deliver, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_total: Option<u64>,
    pub done: bool,
}

/// Outcome of a successful transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSummary {
    pub bytes_written: u64,
    pub bytes_read: u64,
    /// Destination size observed before the first write.
    pub initial_size: u64,
}

/// Outcome of a failed transfer.
///
/// `bytes_written` counts bytes that reached the sink before the failure;
/// they are left in place.
#[derive(Debug, thiserror::Error)]
#[error("{error} ({bytes_written} bytes written)")]
pub struct TransferFailure {
    #[source]
    pub error: TransferError,
    pub bytes_written: u64,
}

impl TransferFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn detail(&self) -> String {
        self.error.to_string()
    }
}

/// Channel-friendly form of the operation callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TransferEvent {
    Progress(ProgressEvent),
    Completed {
        bytes_written: u64,
    },
    Failed {
        kind: ErrorKind,
        detail: String,
        bytes_written: u64,
    },
}
