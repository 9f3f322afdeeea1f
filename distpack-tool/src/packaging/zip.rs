use async_zip::tokio::write::ZipFileWriter;
use async_zip::{Compression, DeflateOption, ZipDateTime, ZipEntryBuilder};
use chrono::{DateTime, Utc};
use distpack_lib::ArchiverSettings;
use futures::AsyncWriteExt;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::warn;

use crate::error::ArchiveError;
use crate::fs_utils::{EntryKind, FileEntry};
use crate::packaging::ProgressTracker;
use crate::sink::FileSink;

/// Maps a 0-9 compression level onto a zip entry method.
///
/// Level 0 stores entries uncompressed; anything else deflates at that level.
pub fn entry_compression(level: u32) -> (Compression, Option<DeflateOption>) {
    match level {
        0 => (Compression::Stored, None),
        9 => (Compression::Deflate, Some(DeflateOption::Maximum)),
        n => (Compression::Deflate, Some(DeflateOption::Other(n as i32))),
    }
}

async fn last_modified(file: &File) -> Option<ZipDateTime> {
    let modified = file.metadata().await.ok()?.modified().ok()?;
    Some(ZipDateTime::from_chrono(&DateTime::<Utc>::from(modified)))
}

/// Streams every entry into a zip archive written straight into `sink`.
pub async fn write_zip(
    sink: FileSink,
    entries: &[FileEntry],
    settings: &ArchiverSettings,
    progress: &mut ProgressTracker,
) -> Result<FileSink, ArchiveError> {
    let (path, writer) = sink.into_parts();
    let output_error = |source| ArchiveError::Output {
        path: path.clone(),
        source,
    };
    let zip_error = |source| ArchiveError::from_zip(&path, source);

    let (compression, deflate) = entry_compression(settings.level());
    let mut zip = ZipFileWriter::with_tokio(writer);
    let mut buf = vec![0u8; 64 * 1024];

    for fe in entries {
        if fe.kind == EntryKind::Dir {
            let builder =
                ZipEntryBuilder::new(format!("{}/", fe.name_in_archive).into(), Compression::Stored);
            zip.write_entry_whole(builder, &[])
                .await
                .map_err(zip_error)?;
            progress.advance(fe);
            continue;
        }

        let mut f = match File::open(&fe.path).await {
            Ok(f) => f,
            Err(e) => match ArchiveError::from_entry(fe.path.clone(), e) {
                Some(err) => return Err(err),
                None => {
                    warn!("Archive warning: {} no longer exists, skipping", fe.path.display());
                    progress.advance(fe);
                    continue;
                }
            },
        };

        let mut builder = ZipEntryBuilder::new(fe.name_in_archive.clone().into(), compression);
        if let Some(option) = deflate {
            builder = builder.deflate_option(option);
        }
        if let Some(date) = last_modified(&f).await {
            builder = builder.last_modification_date(date);
        }

        let mut entry_writer = zip.write_entry_stream(builder).await.map_err(zip_error)?;
        loop {
            let n = f.read(&mut buf).await.map_err(|source| ArchiveError::Entry {
                path: fe.path.clone(),
                source,
            })?;
            if n == 0 {
                break;
            }
            entry_writer.write_all(&buf[..n]).await.map_err(output_error)?;
        }
        entry_writer.close().await.map_err(zip_error)?;

        progress.advance(fe);
    }

    let writer = zip.close().await.map_err(zip_error)?.into_inner();
    Ok(FileSink::from_parts(path, writer))
}
