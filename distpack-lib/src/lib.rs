use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Settings shared by the `distpack` binary and anything embedding the archive hook.
///
/// Every field is optional so that env, file and CLI layers can be merged by priority.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Project root the output directory is resolved against.
    pub root: Option<String>,
    /// Build output directory (relative to `root`), `dist` when unset.
    pub out_dir: Option<String>,
    /// Directory to archive, defaults to the resolved output directory.
    pub source_dir: Option<String>,
    /// Archive path, defaults to `<out_dir basename>.zip`.
    pub output: Option<String>,
    pub config: Option<String>,
    pub format: Option<ArchiveFormat>,
    /// Compression level 0-9.
    pub level: Option<u32>,
    /// Gzip the tar stream (tar only).
    pub gzip: Option<bool>,
    /// Print progress percentages while archiving.
    pub progress: Option<bool>,
}

/// Container framing for the produced archive.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    #[default]
    Zip,
    Tar,
}

impl ArchiveFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Tar => "tar",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported archive format '{0}' (expected zip or tar)")]
pub struct UnknownFormat(pub String);

impl FromStr for ArchiveFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar" => Ok(ArchiveFormat::Tar),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Extra settings handed to the archive writer.
///
/// Unset fields fall back to the writer defaults (maximum compression, no gzip).
/// Paths and format are never read from here.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ArchiverSettings {
    pub level: Option<u32>,
    pub gzip: Option<bool>,
}

impl ArchiverSettings {
    pub const DEFAULT_LEVEL: u32 = 9;

    /// Effective compression level, clamped to 0-9.
    pub fn level(&self) -> u32 {
        self.level.unwrap_or(Self::DEFAULT_LEVEL).min(9)
    }

    pub fn gzip(&self) -> bool {
        self.gzip.unwrap_or(false)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryProgress {
    pub total: u64,
    pub processed: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ByteProgress {
    pub total_bytes: u64,
    pub processed_bytes: u64,
}

/// Raw progress event emitted by the archive writer after each entry.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressData {
    pub entries: EntryProgress,
    pub fs: ByteProgress,
}

impl ProgressData {
    /// Share of processed bytes in percent. An empty source counts as complete.
    pub fn percent(&self) -> f64 {
        if self.fs.total_bytes == 0 {
            return 100.0;
        }
        self.fs.processed_bytes as f64 / self.fs.total_bytes as f64 * 100.0
    }
}

/// What a progress callback receives: the raw event plus the formatted percentage.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub percent: String,
    #[serde(flatten)]
    pub data: ProgressData,
}

impl From<ProgressData> for ProgressSnapshot {
    fn from(data: ProgressData) -> Self {
        ProgressSnapshot {
            percent: format!("{:.2}", data.percent()),
            data,
        }
    }
}
