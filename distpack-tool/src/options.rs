use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use distpack_lib::{ArchiveFormat, ArchiverSettings, ProgressSnapshot};

use crate::packaging::ProgressCallback;

/// User-facing options of the archive hook. Everything is optional.
#[derive(Clone, Default)]
pub struct ArchiveOptions {
    /// Directory to archive; the host's output directory when unset.
    pub source_dir: Option<PathBuf>,
    /// Archive path; `<output dir name>.zip` when unset, whatever the format.
    pub output_file: Option<PathBuf>,
    pub format: ArchiveFormat,
    pub archiver: ArchiverSettings,
    pub on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for ArchiveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveOptions")
            .field("source_dir", &self.source_dir)
            .field("output_file", &self.output_file)
            .field("format", &self.format)
            .field("archiver", &self.archiver)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl ArchiveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    pub fn output_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.output_file = Some(file.into());
        self
    }

    pub fn format(mut self, format: ArchiveFormat) -> Self {
        self.format = format;
        self
    }

    pub fn archiver(mut self, settings: ArchiverSettings) -> Self {
        self.archiver = settings;
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ProgressSnapshot) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }
}
