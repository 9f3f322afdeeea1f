use crate::error::ArchiveError;
use std::{
    ffi::OsStr,
    fs, io,
    path::{Component, Path, PathBuf},
};

use glob::{MatchOptions, Pattern, glob_with};
use tracing::{debug, warn};

/// Glob every entry below the source root, at any depth.
pub const SOURCE_PATTERN: &str = "**/*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// Represents a file or directory to include in the archive.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name_in_archive: String,
    pub kind: EntryKind,
    pub size: u64,
}

/// Lists everything under `source_dir` matching [`SOURCE_PATTERN`] in glob order.
///
/// Dotfiles and everything below a dot-directory are skipped. Entries whose file name
/// equals `exclude_name` are left out, wherever they sit in the tree.
pub fn list_source_entries(
    source_dir: &Path,
    exclude_name: Option<&OsStr>,
) -> Result<Vec<FileEntry>, ArchiveError> {
    let root = fs::canonicalize(source_dir).map_err(|source| ArchiveError::Scan {
        path: source_dir.to_path_buf(),
        source,
    })?;

    let pattern = format!(
        "{}/{}",
        Pattern::escape(&root.to_string_lossy()),
        SOURCE_PATTERN
    );
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: true,
    };

    let mut result = Vec::new();
    for matched in glob_with(&pattern, options)? {
        let path = matched.map_err(|e| ArchiveError::Scan {
            path: e.path().to_path_buf(),
            source: io::Error::from(e),
        })?;

        if exclude_name.is_some() && path.file_name() == exclude_name {
            debug!("excluding {} from archive", path.display());
            continue;
        }

        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Archive warning: {} vanished during scan: {e}", path.display());
                continue;
            }
            Err(source) => return Err(ArchiveError::Scan { path, source }),
        };

        let (kind, size) = if meta.is_dir() {
            (EntryKind::Dir, 0)
        } else {
            (EntryKind::File, meta.len())
        };

        result.push(FileEntry {
            name_in_archive: archive_name(&root, &path),
            path,
            kind,
            size,
        });
    }

    debug!("scanned {} entries under {}", result.len(), root.display());
    Ok(result)
}

/// Path of `path` relative to `root`, joined with `/` regardless of platform.
fn archive_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Sum of the byte sizes of all file entries.
pub fn total_size(entries: &[FileEntry]) -> u64 {
    entries.iter().map(|e| e.size).sum()
}

/// Formats a byte count as mebibytes with two decimals, e.g. `1.50`.
pub fn format_mib(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / 1024.0 / 1024.0)
}
