//! Quota-bounded streaming writes.
//!
//! A [`FileWriter`] pulls chunks from a [`ChunkSource`] and writes them to a
//! [`WriteSink`] at consecutive offsets, truncating the final chunk when the
//! quota ceiling is reached. Progress is reported through a throttled
//! [`TransferObserver`], which also receives exactly one terminal callback.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use filedrop_transfer::{FileSink, FileWriter, QuotaLimit, ReaderSource, TransferParams};
//! use tokio_util::sync::CancellationToken;
//!
//! let source = ReaderSource::new(tokio::fs::File::open("input.bin").await?);
//! let sink = FileSink::open("output.bin").await?;
//! let params = TransferParams::new(0, QuotaLimit::Absolute(64 * 1024 * 1024));
//! let (tx, _rx) = tokio::sync::mpsc::channel(64);
//!
//! let summary = FileWriter::new(source, sink, params, CancellationToken::new())
//!     .run(tx)
//!     .await?;
//! println!("{} bytes written", summary.bytes_written);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod progress;
mod quota;
mod reporter;
mod sink;
mod source;
mod types;
mod validation;
mod writer;

#[cfg(test)]
mod testing;

pub use config::{DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE, WriterConfig};
pub use error::{ConfigError, ErrorKind, SourceError, TransferError};
pub use progress::{DEFAULT_PROGRESS_BYTES, DEFAULT_PROGRESS_INTERVAL, ProgressThrottle};
pub use quota::{QuotaDecision, decide};
pub use reporter::{CompletionReporter, TransferObserver};
pub use sink::{FileSink, SinkFuture, WriteSink};
pub use source::{ChunkSource, ReaderSource, SourceFuture, StreamSource};
pub use types::{
    ProgressEvent, QuotaLimit, Transfer, TransferEvent, TransferFailure, TransferParams,
    TransferState, TransferSummary,
};
pub use validation::validate_relative_path;
pub use writer::FileWriter;
