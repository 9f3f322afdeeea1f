//! End-to-end behaviour of the archive hook through the library API.

mod common;

use common::{populate, tar_entries, zip_entries};
use distpack::{ArchiveError, ArchiveFormat, ArchiveOptions, ArchivePlugin, HostConfig, Stage};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn flat_site() -> [(&'static str, &'static str); 4] {
    [
        ("index.html", "<html></html>"),
        ("app.js", "console.log('app')"),
        ("style.css", "body { margin: 0 }"),
        ("favicon.ico", "ico"),
    ]
}

#[tokio::test]
async fn archives_every_file_once() {
    let root = tempdir().unwrap();
    populate(&root.path().join("dist"), &flat_site());
    let output = root.path().join("artifacts/dist.zip");

    let mut plugin = ArchivePlugin::new(ArchiveOptions::new().output_file(&output));
    plugin.config_resolved(&HostConfig::new(root.path(), "dist"));
    let summary = plugin.close_bundle().await.unwrap();

    assert_eq!(plugin.stage(), Stage::Completed);
    assert_eq!(summary.entries, 4);
    assert_eq!(summary.output_file, output);
    assert_eq!(summary.bytes_written, std::fs::metadata(&output).unwrap().len());
    assert_eq!(
        zip_entries(&output).await,
        vec!["app.js", "favicon.ico", "index.html", "style.css"]
    );
}

#[tokio::test]
async fn file_sharing_the_output_name_is_left_out() {
    let root = tempdir().unwrap();
    let dist = root.path().join("dist");
    populate(&dist, &flat_site());
    populate(&dist, &[("site.zip", "stale archive")]);
    let output = root.path().join("out/site.zip");

    let mut plugin = ArchivePlugin::new(ArchiveOptions::new().output_file(&output));
    plugin.config_resolved(&HostConfig::new(root.path(), "dist"));
    plugin.close_bundle().await.unwrap();

    let names = zip_entries(&output).await;
    assert_eq!(names.len(), 4);
    assert!(!names.contains(&"site.zip".to_string()));
}

#[tokio::test]
async fn missing_source_fails_before_writing() {
    let root = tempdir().unwrap();
    let output = root.path().join("dist.zip");

    let mut plugin = ArchivePlugin::new(ArchiveOptions::new().output_file(&output));
    plugin.config_resolved(&HostConfig::new(root.path(), "dist"));
    let err = plugin.close_bundle().await.unwrap_err();

    assert!(matches!(err, ArchiveError::MissingSource(ref p) if p.ends_with("dist")));
    assert_eq!(plugin.stage(), Stage::Failed);
    assert!(!output.exists());
}

#[tokio::test]
async fn unwritable_destination_fails_the_run() {
    let root = tempdir().unwrap();
    populate(&root.path().join("dist"), &flat_site());
    let taken = root.path().join("taken");
    std::fs::create_dir(&taken).unwrap();

    let mut plugin = ArchivePlugin::new(ArchiveOptions::new().output_file(&taken));
    plugin.config_resolved(&HostConfig::new(root.path(), "dist"));
    let err = plugin.close_bundle().await.unwrap_err();

    assert!(matches!(err, ArchiveError::Output { ref path, .. } if *path == taken));
    assert_eq!(plugin.stage(), Stage::Failed);
    assert!(taken.is_dir());
}

#[tokio::test]
async fn build_manifest_directory_is_not_archived() {
    let root = tempdir().unwrap();
    let dist = root.path().join("dist");
    populate(
        &dist,
        &[
            ("index.html", "<html></html>"),
            (".vite/manifest.json", "{}"),
            (".env", "TOKEN=1"),
        ],
    );
    let output = root.path().join("dist.zip");

    let mut plugin = ArchivePlugin::new(ArchiveOptions::new().output_file(&output));
    plugin.config_resolved(&HostConfig::new(root.path(), "dist"));
    let summary = plugin.close_bundle().await.unwrap();

    assert_eq!(summary.entries, 1);
    assert_eq!(zip_entries(&output).await, vec!["index.html"]);
}

#[tokio::test]
async fn progress_climbs_to_one_hundred() {
    let root = tempdir().unwrap();
    populate(&root.path().join("dist"), &flat_site());
    let big = "x".repeat(10_000);
    populate(&root.path().join("dist/assets"), &[("big.bin", big.as_str())]);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();
    let options = ArchiveOptions::new()
        .output_file(root.path().join("dist.zip"))
        .on_progress(move |snapshot| {
            record.lock().unwrap().push(snapshot.clone());
        });

    let mut plugin = ArchivePlugin::new(options);
    plugin.config_resolved(&HostConfig::new(root.path(), "dist"));
    plugin.close_bundle().await.unwrap();

    let snapshots = seen.lock().unwrap();
    assert_eq!(snapshots.len(), 6);
    let percents: Vec<f64> = snapshots.iter().map(|s| s.percent.parse().unwrap()).collect();
    assert!(percents.iter().all(|p| (0.0..=100.0).contains(p)));
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(snapshots.last().unwrap().percent, "100.00");
    assert_eq!(snapshots.last().unwrap().data.entries.processed, 6);
}

#[tokio::test]
async fn rerun_with_output_inside_source_is_stable() {
    let root = tempdir().unwrap();
    let dist = root.path().join("dist");
    populate(&dist, &flat_site());
    let output = dist.join("dist.zip");

    let mut plugin = ArchivePlugin::new(ArchiveOptions::new().output_file(&output));
    plugin.config_resolved(&HostConfig::new(root.path(), "dist"));

    let first = plugin.close_bundle().await.unwrap();
    let first_entries = zip_entries(&output).await;
    let second = plugin.close_bundle().await.unwrap();
    let second_entries = zip_entries(&output).await;

    assert_eq!(first.entries, 4);
    assert_eq!(second.entries, 4);
    assert_eq!(first_entries, second_entries);
}

#[tokio::test]
async fn tar_format_writes_tar_framing() {
    let root = tempdir().unwrap();
    let dist = root.path().join("dist");
    populate(&dist, &flat_site());
    populate(&dist.join("nested"), &[("deep.txt", "deep")]);
    let output = root.path().join("dist.tar");

    let options = ArchiveOptions::new()
        .format(ArchiveFormat::Tar)
        .output_file(&output);
    let mut plugin = ArchivePlugin::new(options);
    plugin.config_resolved(&HostConfig::new(root.path(), "dist"));
    let summary = plugin.close_bundle().await.unwrap();

    assert_eq!(summary.entries, 6);
    assert_eq!(
        tar_entries(&output),
        vec![
            "app.js",
            "favicon.ico",
            "index.html",
            "nested",
            "nested/deep.txt",
            "style.css"
        ]
    );
}

#[tokio::test]
async fn explicit_source_dir_overrides_host_output() {
    let root = tempdir().unwrap();
    populate(&root.path().join("public"), &[("robots.txt", "User-agent: *")]);
    let output = root.path().join("public.zip");

    let options = ArchiveOptions::new()
        .source_dir(root.path().join("public"))
        .output_file(&output);
    let mut plugin = ArchivePlugin::new(options);
    plugin.config_resolved(&HostConfig::new(root.path(), "dist"));
    plugin.close_bundle().await.unwrap();

    assert_eq!(zip_entries(&output).await, vec!["robots.txt"]);
}
