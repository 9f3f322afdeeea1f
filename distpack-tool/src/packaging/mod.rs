use std::fmt;
use std::sync::Arc;

use distpack_lib::{
    ArchiveFormat, ArchiverSettings, ByteProgress, EntryProgress, ProgressData, ProgressSnapshot,
};
use tracing::debug;

use crate::error::ArchiveError;
use crate::fs_utils::{EntryKind, FileEntry, total_size};
use crate::sink::FileSink;

pub mod tar;
pub mod zip;

/// Called once per archived entry with the current progress.
pub type ProgressCallback = Arc<dyn Fn(&ProgressSnapshot) + Send + Sync>;

/// Accumulates progress for one archive run and forwards it to the callback.
///
/// Totals are fixed up front, so the reported percentage never decreases.
#[derive(Clone)]
pub struct ProgressTracker {
    data: ProgressData,
    callback: Option<ProgressCallback>,
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("data", &self.data)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl ProgressTracker {
    pub fn new(entries: &[FileEntry], callback: Option<ProgressCallback>) -> Self {
        Self {
            data: ProgressData {
                entries: EntryProgress {
                    total: entries.len() as u64,
                    processed: 0,
                },
                fs: ByteProgress {
                    total_bytes: total_size(entries),
                    processed_bytes: 0,
                },
            },
            callback,
        }
    }

    /// Marks `entry` as handled (archived or skipped) and notifies the callback.
    pub fn advance(&mut self, entry: &FileEntry) {
        self.data.entries.processed += 1;
        self.data.fs.processed_bytes += entry.size;
        if let Some(callback) = &self.callback {
            callback(&ProgressSnapshot::from(self.data));
        }
    }

    pub fn data(&self) -> ProgressData {
        self.data
    }
}

/// Writes `entries` into `sink` using the requested format, then closes the sink.
///
/// Returns the number of bytes the archive occupies on disk.
pub async fn write_archive(
    format: ArchiveFormat,
    settings: ArchiverSettings,
    entries: Vec<FileEntry>,
    sink: FileSink,
    mut progress: ProgressTracker,
) -> Result<u64, ArchiveError> {
    let dirs = entries.iter().filter(|e| e.kind == EntryKind::Dir).count();
    debug!(
        "writing {format} archive: {} files, {dirs} directories, level {}",
        entries.len() - dirs,
        settings.level()
    );

    let sink = match format {
        ArchiveFormat::Zip => zip::write_zip(sink, &entries, &settings, &mut progress).await?,
        ArchiveFormat::Tar => tar::write_tar(sink, entries, settings, progress).await?,
    };
    sink.close().await
}
