//! Error types for the transfer crate.

use std::io;

use serde::{Deserialize, Serialize};

/// Failure reported by a [`ChunkSource`](crate::ChunkSource) while reading.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("authentication required (status {0})")]
    AuthRequired(u16),

    #[error("redirect refused: {0}")]
    RedirectRefused(String),

    #[error("network error: {0}")]
    Network(String),
}

impl SourceError {
    /// Upstream status code or OS error number, if the failure carries one.
    pub fn code(&self) -> Option<i32> {
        match self {
            SourceError::Io(e) => e.raw_os_error(),
            SourceError::Status(status) | SourceError::AuthRequired(status) => {
                Some(i32::from(*status))
            }
            SourceError::RedirectRefused(_) | SourceError::Network(_) => None,
        }
    }
}

/// Terminal failure of a transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("destination unavailable: {0}")]
    DestinationUnavailable(#[source] io::Error),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("write error: {0}")]
    Write(#[source] io::Error),

    #[error("quota exceeded: ceiling of {ceiling} bytes reached")]
    QuotaExceeded { ceiling: i64 },

    #[error("cancelled")]
    Cancelled,
}

impl TransferError {
    /// Classifies the error for the operation callback.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            TransferError::DestinationUnavailable(_) => ErrorKind::DestinationUnavailable,
            TransferError::Source(_) => ErrorKind::SourceError,
            TransferError::Write(_) => ErrorKind::WriteError,
            TransferError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            TransferError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Coarse failure classification delivered with `on_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidArgument,
    DestinationUnavailable,
    SourceError,
    WriteError,
    QuotaExceeded,
    Cancelled,
}

/// Errors produced while loading a [`WriterConfig`](crate::WriterConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            TransferError::InvalidArgument("x".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            TransferError::Source(SourceError::Status(500)).kind(),
            ErrorKind::SourceError
        );
        assert_eq!(
            TransferError::Write(io::Error::from(io::ErrorKind::StorageFull)).kind(),
            ErrorKind::WriteError
        );
        assert_eq!(
            TransferError::QuotaExceeded { ceiling: 10 }.kind(),
            ErrorKind::QuotaExceeded
        );
        assert_eq!(TransferError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn source_error_exposes_upstream_code() {
        assert_eq!(SourceError::Status(503).code(), Some(503));
        assert_eq!(SourceError::AuthRequired(401).code(), Some(401));
        assert_eq!(SourceError::Network("reset".into()).code(), None);
        assert_eq!(
            SourceError::Io(io::Error::from_raw_os_error(5)).code(),
            Some(5)
        );
    }

    #[test]
    fn error_kind_serializes_camel_case() {
        let json = serde_json::to_string(&ErrorKind::QuotaExceeded).unwrap();
        assert_eq!(json, "\"quotaExceeded\"");
    }

    #[test]
    fn display_includes_detail() {
        let err = TransferError::QuotaExceeded { ceiling: 1000 };
        assert_eq!(err.to_string(), "quota exceeded: ceiling of 1000 bytes reached");
    }
}
