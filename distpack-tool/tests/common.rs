//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub use assert_cmd::Command;

pub fn distpack_cmd() -> Command {
    Command::cargo_bin("distpack").expect("Failed to find distpack binary for testing")
}

/// Writes `files` (name, body) into `dir`, creating it first.
pub fn populate(dir: &Path, files: &[(&str, &str)]) {
    fs::create_dir_all(dir).unwrap();
    for (name, body) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, body).unwrap();
    }
}

/// Entry names of a zip archive, sorted.
pub async fn zip_entries(path: &Path) -> Vec<String> {
    let reader = async_zip::tokio::read::fs::ZipFileReader::new(path)
        .await
        .unwrap();
    let mut names: Vec<String> = reader
        .file()
        .entries()
        .iter()
        .map(|e| e.filename().as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

/// [`zip_entries`] for tests that are not already inside a runtime.
pub fn zip_entries_blocking(path: &Path) -> Vec<String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(zip_entries(path))
}

/// Entry names of an uncompressed tar archive, sorted.
pub fn tar_entries(path: &Path) -> Vec<String> {
    let mut archive = tar::Archive::new(fs::File::open(path).unwrap());
    let mut names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| {
            let path = e.unwrap().path().unwrap().to_string_lossy().replace('\\', "/");
            path.trim_end_matches('/').to_string()
        })
        .collect();
    names.sort();
    names
}
