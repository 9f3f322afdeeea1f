//! Archives a build output directory into a single zip or tar file once bundling is done.
//!
//! A host build tool drives [`ArchivePlugin`] through two hooks: `config_resolved` when its
//! configuration is final and `close_bundle` after every output file is written.

pub mod config;
pub mod error;
pub mod fs_utils;
pub mod options;
pub mod packaging;
pub mod plugin;
pub mod process;
pub mod sink;

pub use distpack_lib::{ArchiveFormat, ArchiverSettings, ProgressData, ProgressSnapshot};
pub use error::ArchiveError;
pub use options::ArchiveOptions;
pub use packaging::ProgressCallback;
pub use plugin::{ArchivePlugin, HostConfig, Stage};
pub use process::{ArchiveSummary, run_archive};
