//! Byte sources feeding a transfer.
//!
//! The orchestrator owns the transfer buffer and lends it to the source for
//! exactly one read at a time. A read that fills zero bytes signals end of
//! stream.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::SourceError;

/// Future returned by [`ChunkSource::read_chunk`].
pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<usize, SourceError>> + Send + 'a>>;

/// Supplies the bytes written by a transfer.
///
/// Implementations are polled by a single transfer; a new read is never
/// issued before the previous one resolved.
pub trait ChunkSource: Send {
    /// Fills the front of `buf` with the next chunk and returns its length.
    /// Returns `Ok(0)` at end of stream.
    fn read_chunk<'a>(&'a mut self, buf: &'a mut [u8]) -> SourceFuture<'a>;

    /// Total bytes the source expects to deliver, when known up front.
    fn size_hint(&self) -> Option<u64> {
        None
    }
}

impl<T: ChunkSource + ?Sized> ChunkSource for Box<T> {
    fn read_chunk<'a>(&'a mut self, buf: &'a mut [u8]) -> SourceFuture<'a> {
        (**self).read_chunk(buf)
    }

    fn size_hint(&self) -> Option<u64> {
        (**self).size_hint()
    }
}

/// Source over any [`AsyncRead`]: sockets, pipes, local files.
pub struct ReaderSource<R> {
    reader: R,
    size_hint: Option<u64>,
}

impl<R> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            size_hint: None,
        }
    }

    pub fn with_size_hint(mut self, total: u64) -> Self {
        self.size_hint = Some(total);
        self
    }
}

impl<R: AsyncRead + Unpin + Send> ChunkSource for ReaderSource<R> {
    fn read_chunk<'a>(&'a mut self, buf: &'a mut [u8]) -> SourceFuture<'a> {
        Box::pin(async move { Ok(self.reader.read(buf).await?) })
    }

    fn size_hint(&self) -> Option<u64> {
        self.size_hint
    }
}

/// Source over a stream of [`Bytes`], such as an HTTP response body.
///
/// Stream items larger than the transfer buffer are handed out across
/// several reads; empty items are skipped.
pub struct StreamSource<S> {
    stream: S,
    pending: Bytes,
    size_hint: Option<u64>,
}

impl<S> StreamSource<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            pending: Bytes::new(),
            size_hint: None,
        }
    }

    pub fn with_size_hint(mut self, total: Option<u64>) -> Self {
        self.size_hint = total;
        self
    }
}

impl<S, E> ChunkSource for StreamSource<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin + Send,
    E: Into<SourceError>,
{
    fn read_chunk<'a>(&'a mut self, buf: &'a mut [u8]) -> SourceFuture<'a> {
        Box::pin(async move {
            while self.pending.is_empty() {
                match self.stream.next().await {
                    Some(Ok(bytes)) => self.pending = bytes,
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(0),
                }
            }

            let n = self.pending.len().min(buf.len());
            let head = self.pending.split_to(n);
            buf[..n].copy_from_slice(&head);
            Ok(n)
        })
    }

    fn size_hint(&self) -> Option<u64> {
        self.size_hint
    }
}
