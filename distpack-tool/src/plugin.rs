use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::error::ArchiveError;
use crate::options::ArchiveOptions;
use crate::process::{ArchiveSummary, run_archive};

/// What the host build tool knows once its configuration is final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub root: PathBuf,
    pub out_dir: PathBuf,
}

impl HostConfig {
    pub fn new(root: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            out_dir: out_dir.into(),
        }
    }

    /// `root/out_dir` as an absolute path. An absolute `out_dir` replaces the root.
    pub fn resolved_output_dir(&self) -> PathBuf {
        let joined = self.root.join(&self.out_dir);
        std::path::absolute(&joined).unwrap_or(joined)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ConfigResolved,
    Archiving,
    Completed,
    Failed,
}

/// Archives the build output once the host has finished writing the bundle.
///
/// The host calls [`config_resolved`](Self::config_resolved) once per build and
/// [`close_bundle`](Self::close_bundle) after all files are on disk.
#[derive(Debug)]
pub struct ArchivePlugin {
    options: ArchiveOptions,
    output_dir: Option<PathBuf>,
    stage: Stage,
}

impl ArchivePlugin {
    pub const NAME: &'static str = "distpack";

    pub fn new(options: ArchiveOptions) -> Self {
        Self {
            options,
            output_dir: None,
            stage: Stage::Idle,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// Records the host's output directory and starts a new build run.
    pub fn config_resolved(&mut self, host: &HostConfig) {
        let dir = host.resolved_output_dir();
        debug!("{}: build output resolved to {}", Self::NAME, dir.display());
        self.output_dir = Some(dir);
        self.stage = Stage::ConfigResolved;
    }

    /// Runs the archive phase for the current build.
    pub async fn close_bundle(&mut self) -> Result<ArchiveSummary, ArchiveError> {
        match self.stage {
            Stage::Idle => return Err(ArchiveError::NotResolved),
            Stage::Failed | Stage::Archiving => return Err(ArchiveError::RunFailed),
            Stage::ConfigResolved | Stage::Completed => {}
        }
        let output_dir = self.output_dir.clone().ok_or(ArchiveError::NotResolved)?;

        self.stage = Stage::Archiving;
        match run_archive(&output_dir, &self.options).await {
            Ok(summary) => {
                self.stage = Stage::Completed;
                Ok(summary)
            }
            Err(e) => {
                error!("{}: {e}", Self::NAME);
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }
}
