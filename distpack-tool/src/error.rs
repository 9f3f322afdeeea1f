use std::io;
use async_zip::error::ZipError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything that can terminate an archive run.
///
/// Vanished entries are not represented here: they are logged as warnings and skipped.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Source directory {} does not exist", .0.display())]
    MissingSource(PathBuf),

    #[error("build output directory has not been resolved yet")]
    NotResolved,

    #[error("archive run already failed for this build; resolve the config again to retry")]
    RunFailed,

    #[error("invalid source pattern: {source}")]
    Pattern {
        #[from]
        source: glob::PatternError,
    },

    #[error("failed to scan {}: {source}", path.display())]
    Scan { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Output { path: PathBuf, source: io::Error },

    #[error("failed to read archive entry {}: {source}", path.display())]
    Entry { path: PathBuf, source: io::Error },

    #[error("zip writer failed: {source}")]
    Zip {
        #[from]
        source: ZipError,
    },

    #[error("tar writer failed: {0}")]
    Tar(io::Error),

    #[error("archive task did not complete: {source}")]
    Task {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl ArchiveError {
    /// Classifies an I/O failure on a single source entry.
    ///
    /// Returns `None` when the entry disappeared after enumeration, which callers
    /// treat as a warning.
    pub(crate) fn from_entry(path: PathBuf, source: io::Error) -> Option<Self> {
        if source.kind() == io::ErrorKind::NotFound {
            None
        } else {
            Some(ArchiveError::Entry { path, source })
        }
    }

    /// Classifies a zip writer failure. I/O raised by the destination counts as an
    /// output error, the same as for tar.
    pub(crate) fn from_zip(output: &Path, source: ZipError) -> Self {
        match source {
            ZipError::UpstreamReadError(source) => ArchiveError::Output {
                path: output.to_path_buf(),
                source,
            },
            source => ArchiveError::Zip { source },
        }
    }
}
