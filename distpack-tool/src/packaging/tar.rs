use bytes::Bytes;
use distpack_lib::ArchiverSettings;
use flate2::write::GzEncoder;
use futures::{Stream, StreamExt};
use std::fs::File;
use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::error::ArchiveError;
use crate::fs_utils::{EntryKind, FileEntry};
use crate::packaging::ProgressTracker;
use crate::sink::FileSink;

/// A `std::io::Write` that forwards every chunk into an mpsc channel using *blocking* sends.
/// Only usable inside `tokio::task::spawn_blocking`.
struct WriterToAsyncChannel {
    sender: mpsc::Sender<Result<Vec<u8>, ArchiveError>>,
}

impl Write for WriterToAsyncChannel {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        // Blocks the pool thread while the receiver is behind.
        self.sender
            .blocking_send(Ok(buf.to_vec()))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::BrokenPipe, e.to_string()))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn append_entries<W: Write>(
    writer: W,
    entries: &[FileEntry],
    progress: &mut ProgressTracker,
) -> Result<W, ArchiveError> {
    let mut builder = tar::Builder::new(writer);

    for fe in entries {
        match fe.kind {
            EntryKind::Dir => builder
                .append_dir(&fe.name_in_archive, &fe.path)
                .map_err(ArchiveError::Tar)?,
            EntryKind::File => {
                let mut f = match File::open(&fe.path) {
                    Ok(f) => f,
                    Err(e) => match ArchiveError::from_entry(fe.path.clone(), e) {
                        Some(err) => return Err(err),
                        None => {
                            warn!(
                                "Archive warning: {} no longer exists, skipping",
                                fe.path.display()
                            );
                            progress.advance(fe);
                            continue;
                        }
                    },
                };
                builder
                    .append_file(&fe.name_in_archive, &mut f)
                    .map_err(ArchiveError::Tar)?;
            }
        }
        progress.advance(fe);
    }

    builder.into_inner().map_err(ArchiveError::Tar)
}

/// Builds a tar (optionally gzipped) archive on the blocking pool and streams it out.
///
/// The returned handle resolves once the producer is done; errors travel through the stream.
pub fn package_tar_streaming(
    entries: Vec<FileEntry>,
    settings: ArchiverSettings,
    mut progress: ProgressTracker,
) -> (impl Stream<Item = Result<Bytes, ArchiveError>>, JoinHandle<()>) {
    // A small buffer keeps memory flat while still applying backpressure.
    let (tx, rx) = mpsc::channel::<Result<Vec<u8>, ArchiveError>>(4);

    let handle = task::spawn_blocking(move || {
        let pipe = WriterToAsyncChannel { sender: tx.clone() };

        let result = if settings.gzip() {
            let encoder = GzEncoder::new(pipe, flate2::Compression::new(settings.level()));
            append_entries(encoder, &entries, &mut progress)
                .and_then(|encoder| encoder.finish().map_err(ArchiveError::Tar))
                .map(drop)
        } else {
            append_entries(pipe, &entries, &mut progress).map(drop)
        };

        if let Err(e) = result {
            // The receiver may already be gone; nothing left to report to.
            let _ = tx.blocking_send(Err(e));
        }
    });

    let stream = ReceiverStream::new(rx).map(|r| r.map(Bytes::from));
    (stream, handle)
}

/// Writes a tar archive of `entries` into `sink`.
pub async fn write_tar(
    mut sink: FileSink,
    entries: Vec<FileEntry>,
    settings: ArchiverSettings,
    progress: ProgressTracker,
) -> Result<FileSink, ArchiveError> {
    let (stream, handle) = package_tar_streaming(entries, settings, progress);
    let mut pinned = Box::pin(stream);
    let saved = sink.save_stream(&mut pinned).await;

    // Dropping the receiver unblocks the producer if saving stopped early.
    drop(pinned);
    handle.await?;
    saved?;
    Ok(sink)
}
