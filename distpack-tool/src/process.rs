use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use distpack_lib::{ArchiveFormat, ArchiverSettings};
use tokio::task;
use tracing::info;

use crate::error::ArchiveError;
use crate::fs_utils::{format_mib, list_source_entries};
use crate::options::ArchiveOptions;
use crate::packaging::{ProgressTracker, write_archive};
use crate::sink::create_file_writer;

const GRAY: &str = "\x1b[90m";
const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Options with every default filled in for one archive run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub source_dir: PathBuf,
    pub output_file: PathBuf,
    pub format: ArchiveFormat,
    pub archiver: ArchiverSettings,
}

impl ResolvedOptions {
    pub fn resolve(options: &ArchiveOptions, output_dir: &Path) -> Self {
        Self {
            source_dir: options
                .source_dir
                .clone()
                .unwrap_or_else(|| output_dir.to_path_buf()),
            output_file: options
                .output_file
                .clone()
                .unwrap_or_else(|| default_output_file(output_dir)),
            format: options.format,
            archiver: options.archiver,
        }
    }
}

/// `<basename>.zip` for the given output directory, `archive.zip` if it has no name.
///
/// The extension stays `.zip` for tar archives too; pass an explicit output file to change it.
pub fn default_output_file(output_dir: &Path) -> PathBuf {
    match output_dir.file_name() {
        Some(name) => {
            let mut file = name.to_os_string();
            file.push(".zip");
            PathBuf::from(file)
        }
        None => PathBuf::from("archive.zip"),
    }
}

/// Outcome of a successful archive run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub output_file: PathBuf,
    pub elapsed: Duration,
    pub bytes_written: u64,
    pub entries: u64,
}

impl ArchiveSummary {
    pub fn size_mib(&self) -> String {
        format_mib(self.bytes_written)
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }

    pub fn render(&self) -> String {
        format!(
            "\n{GRAY}Archive written to:{RESET} {GREEN}{}{RESET}\n\
             {GRAY}Elapsed:{RESET} {BLUE}{}ms{RESET}\n\
             {GRAY}Size:{RESET} {YELLOW}{}MiB{RESET}\n",
            self.output_file.display(),
            self.elapsed_ms(),
            self.size_mib()
        )
    }
}

/// Archives the source directory after a build.
///
/// `output_dir` is the host's resolved build output directory. Nothing is written
/// when the source directory is missing.
pub async fn run_archive(
    output_dir: &Path,
    options: &ArchiveOptions,
) -> Result<ArchiveSummary, ArchiveError> {
    let start = Instant::now();
    let resolved = ResolvedOptions::resolve(options, output_dir);

    if !resolved.source_dir.is_dir() {
        return Err(ArchiveError::MissingSource(resolved.source_dir));
    }

    info!(
        "archiving {} into {} ({})",
        resolved.source_dir.display(),
        resolved.output_file.display(),
        resolved.format
    );

    let source = resolved.source_dir.clone();
    let exclude = resolved.output_file.file_name().map(|n| n.to_os_string());
    let entries =
        task::spawn_blocking(move || list_source_entries(&source, exclude.as_deref())).await??;
    let entry_count = entries.len() as u64;

    let progress = ProgressTracker::new(&entries, options.on_progress.clone());
    let sink = create_file_writer(&resolved.output_file).await?;
    let bytes_written =
        write_archive(resolved.format, resolved.archiver, entries, sink, progress).await?;

    let summary = ArchiveSummary {
        output_file: resolved.output_file,
        elapsed: start.elapsed(),
        bytes_written,
        entries: entry_count,
    };
    println!("{}", summary.render());
    info!(
        "archived {} entries in {}ms",
        summary.entries,
        summary.elapsed_ms()
    );

    Ok(summary)
}
