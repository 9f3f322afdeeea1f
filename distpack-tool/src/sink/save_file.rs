use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::ArchiveError;

/// Wraps the destination and counts every byte accepted by it.
///
/// The count is what the archive summary reports as the archive size.
#[derive(Debug)]
pub struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for CountingWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = &poll {
            this.written += *n as u64;
        }
        poll
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// The open archive destination.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: CountingWriter<File>,
}

impl FileSink {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn output_error(&self, source: io::Error) -> ArchiveError {
        ArchiveError::Output {
            path: self.path.clone(),
            source,
        }
    }

    pub fn into_parts(self) -> (PathBuf, CountingWriter<File>) {
        (self.path, self.writer)
    }

    pub fn from_parts(path: PathBuf, writer: CountingWriter<File>) -> Self {
        Self { path, writer }
    }

    /// Saves a stream of archive chunks into the file.
    pub async fn save_stream<S>(&mut self, mut stream: S) -> Result<(), ArchiveError>
    where
        // Add `Unpin` bound because we are calling `stream.next()` directly.
        S: Stream<Item = Result<Bytes, ArchiveError>> + Unpin,
    {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Err(e) = self.writer.write_all(&chunk).await {
                return Err(self.output_error(e));
            }
        }
        Ok(())
    }

    /// Flushes and closes the file, returning the number of bytes written.
    pub async fn close(mut self) -> Result<u64, ArchiveError> {
        if let Err(e) = self.writer.shutdown().await {
            return Err(self.output_error(e));
        }
        Ok(self.writer.written())
    }
}

/// Creates the archive file, creating parent directories if they don't exist.
pub async fn create_file_writer<P: AsRef<Path>>(path: P) -> Result<FileSink, ArchiveError> {
    let path = path.as_ref();
    let output_error = |source| ArchiveError::Output {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(output_error)?;
    }

    let file = File::create(path).await.map_err(output_error)?;

    Ok(FileSink {
        path: path.to_path_buf(),
        writer: CountingWriter::new(file),
    })
}
