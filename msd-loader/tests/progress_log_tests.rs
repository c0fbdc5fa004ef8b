//! Progress messages written while loading

mod helpers;

use helpers::log_capture::capture_logs;
use helpers::{minimal_track, provisioned_session, write_track, JsonTrackReader};
use msd_common::IngestConfig;
use msd_loader::BulkLoader;
use std::fs;
use tracing::Level;

#[tokio::test]
async fn test_one_completion_line_per_directory() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    write_track(&root.join("A/A/TRAA01.h5"), minimal_track("TRAA01", 2001));
    write_track(&root.join("A/A/TRAA02.h5"), minimal_track("TRAA02", 2002));
    write_track(&root.join("A/B/TRAB01.h5"), minimal_track("TRAB01", 2003));
    write_track(&root.join("TRROOT.h5"), minimal_track("TRROOT", 2004));
    fs::create_dir_all(root.join("C")).unwrap();

    let config = IngestConfig::default();
    let session = provisioned_session(&config).await;
    let reader = JsonTrackReader::new();

    let (capture, _guard) = capture_logs();
    BulkLoader::new(&session, &reader, &config)
        .run(root)
        .await
        .unwrap();

    let root = root.canonicalize().unwrap();
    let expected: Vec<String> = ["", "A", "A/A", "A/B", "C"]
        .iter()
        .map(|relative| {
            let dir = if relative.is_empty() {
                root.clone()
            } else {
                root.join(relative)
            };
            format!("Pushed data from '{}'", dir.display())
        })
        .collect();

    assert_eq!(
        capture.messages_starting_with(Level::INFO, "Pushed data from"),
        expected
    );
}

#[tokio::test]
async fn test_no_completion_line_for_failed_directory() {
    let temp = tempfile::tempdir().unwrap();
    write_track(&temp.path().join("A/T1.h5"), minimal_track("T1", 2001));
    fs::write(temp.path().join("A/T2.h5"), "{ truncated").unwrap();

    let config = IngestConfig::default();
    let session = provisioned_session(&config).await;
    let reader = JsonTrackReader::new();

    let (capture, _guard) = capture_logs();
    let result = BulkLoader::new(&session, &reader, &config)
        .run(temp.path())
        .await;

    assert!(result.is_err());
    // Only the (empty) root directory completed
    let root = temp.path().canonicalize().unwrap();
    assert_eq!(
        capture.messages_starting_with(Level::INFO, "Pushed data from"),
        vec![format!("Pushed data from '{}'", root.display())]
    );
}
