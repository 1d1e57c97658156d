use std::future::Future;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::error::TransferError;
use crate::validation::validate_relative_path;

/// Future returned by [`WriteSink`] operations.
pub type SinkFuture<'a, T> = Pin<Box<dyn Future<Output = io::Result<T>> + Send + 'a>>;

/// Destination of a transfer.
///
/// A transfer owns its sink exclusively and never issues an operation while
/// another one is outstanding.
pub trait WriteSink: Send {
    /// Returns the current size of the destination in bytes.
    fn stat_size(&mut self) -> SinkFuture<'_, u64>;

    /// Writes `data` at `offset` and returns how many bytes were written.
    ///
    /// A short count is allowed; the caller writes the rest in a follow-up
    /// call.
    fn write_at<'a>(&'a mut self, offset: u64, data: &'a [u8]) -> SinkFuture<'a, usize>;
}

impl<T: WriteSink + ?Sized> WriteSink for Box<T> {
    fn stat_size(&mut self) -> SinkFuture<'_, u64> {
        (**self).stat_size()
    }

    fn write_at<'a>(&'a mut self, offset: u64, data: &'a [u8]) -> SinkFuture<'a, usize> {
        (**self).write_at(offset, data)
    }
}

/// Sink backed by a local file.
///
/// The file is opened without truncation so existing bytes outside the
/// written range are preserved.
pub struct FileSink {
    file: tokio::fs::File,
    path: PathBuf,
}

impl FileSink {
    /// Opens `path` for writing, creating it if needed.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .await?;
        Ok(Self { file, path })
    }

    /// Opens `relative` under `base`, creating intermediate directories.
    ///
    /// Paths that would escape `base` are rejected with
    /// [`TransferError::InvalidArgument`].
    pub async fn open_in(base: &Path, relative: &str) -> Result<Self, TransferError> {
        validate_relative_path(relative)?;

        let full_path = base.join(relative);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(TransferError::DestinationUnavailable)?;
        }
        Self::open(&full_path)
            .await
            .map_err(TransferError::DestinationUnavailable)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WriteSink for FileSink {
    fn stat_size(&mut self) -> SinkFuture<'_, u64> {
        Box::pin(async move { Ok(self.file.metadata().await?.len()) })
    }

    fn write_at<'a>(&'a mut self, offset: u64, data: &'a [u8]) -> SinkFuture<'a, usize> {
        Box::pin(async move {
            self.file.seek(SeekFrom::Start(offset)).await?;
            let n = self.file.write(data).await?;
            // tokio hands writes to a blocking thread; flush waits for the
            // outcome so failures surface on this call.
            self.file.flush().await?;
            Ok(n)
        })
    }
}
