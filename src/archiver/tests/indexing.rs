use std::sync::Arc;

use tempfile::tempdir;

use crate::archiver::indexing::update_index;
use crate::archiver::test_helpers::{FakeSource, archiver};
use crate::config::Args;
use crate::types::{ExitCode, IndexEntry};

const ZED_LINE: &str = "- [Zed.jpg](Zed.jpg): <a href=\"https://commons.test/wiki/File:Zed.jpg\">\
                        See page for author</a>, See page for license, via Wikimedia Commons";

fn zed_source() -> Arc<FakeSource> {
    Arc::new(FakeSource::default().with_file("1", "File:Zed.jpg", b"zed"))
}

#[tokio::test]
async fn test_empty_index_gets_single_entry() {
    let dest = tempdir().unwrap();
    let index = dest.path().join("index.md");
    std::fs::write(&index, "").unwrap();

    let code = archiver(zed_source())
        .run(&Args::new(["File:Zed.jpg"], dest.path()).with_index(&index))
        .await;

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(
        std::fs::read_to_string(&index).unwrap(),
        format!("{ZED_LINE}\n")
    );
}

#[tokio::test]
async fn test_existing_index_keeps_header_and_sorts_entries() {
    let dest = tempdir().unwrap();
    let index = dest.path().join("index.md");
    std::fs::write(
        &index,
        "# Header\n\n- [Existing.jpg](Existing.jpg): old credit\n",
    )
    .unwrap();

    let code = archiver(zed_source())
        .run(&Args::new(["File:Zed.jpg"], dest.path()).with_index(&index))
        .await;

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(
        std::fs::read_to_string(&index).unwrap(),
        format!("# Header\n\n- [Existing.jpg](Existing.jpg): old credit\n{ZED_LINE}\n")
    );
}

#[tokio::test]
async fn test_missing_index_is_created_with_parents() {
    let dest = tempdir().unwrap();
    let index = dest.path().join("docs").join("credits").join("index.md");

    let code = archiver(zed_source())
        .run(&Args::new(["File:Zed.jpg"], dest.path()).with_index(&index))
        .await;

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(
        std::fs::read_to_string(&index).unwrap(),
        format!("{ZED_LINE}\n")
    );
}

#[tokio::test]
async fn test_no_index_path_writes_no_index() {
    let dest = tempdir().unwrap();

    let code = archiver(zed_source())
        .run(&Args::new(["File:Zed.jpg"], dest.path()))
        .await;

    assert_eq!(code, ExitCode::SUCCESS);
    let names: Vec<_> = std::fs::read_dir(dest.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("Zed.jpg")]);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let dest = tempdir().unwrap();
    let index = dest.path().join("index.md");
    let source = zed_source();
    let args = Args::new(["File:Zed.jpg"], dest.path()).with_index(&index);

    assert_eq!(archiver(Arc::clone(&source)).run(&args).await, ExitCode::SUCCESS);
    let first = std::fs::read_to_string(&index).unwrap();
    assert_eq!(archiver(Arc::clone(&source)).run(&args).await, ExitCode::SUCCESS);
    let second = std::fs::read_to_string(&index).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_shorter_index_is_truncated() {
    let dest = tempdir().unwrap();
    let index = dest.path().join("index.md");
    let long_credit = "x".repeat(500);
    std::fs::write(
        &index,
        format!("- [Zed.jpg](Zed.jpg): {long_credit}\n"),
    )
    .unwrap();

    update_index(
        &index,
        vec![IndexEntry {
            filename: "Zed.jpg".to_string(),
            line: "- [Zed.jpg](Zed.jpg): short".to_string(),
        }],
    )
    .await
    .unwrap();

    assert_eq!(
        std::fs::read_to_string(&index).unwrap(),
        "- [Zed.jpg](Zed.jpg): short\n"
    );
}

#[tokio::test]
async fn test_index_path_that_is_directory_fails_validation() {
    let dest = tempdir().unwrap();
    let source = zed_source();

    let code = archiver(Arc::clone(&source))
        .run(&Args::new(["File:Zed.jpg"], dest.path()).with_index(dest.path()))
        .await;

    assert_eq!(code, ExitCode::GENERIC_ERROR);
    assert!(source.query_calls().is_empty());
}

#[tokio::test]
async fn test_unwritable_index_sets_index_flag() {
    let dest = tempdir().unwrap();
    let blocker = dest.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let index = blocker.join("index.md");

    let code = archiver(zed_source())
        .run(&Args::new(["File:Zed.jpg"], dest.path()).with_index(&index))
        .await;

    assert_eq!(code, ExitCode::INDEX_ERROR | ExitCode::GENERIC_ERROR);
    assert_eq!(std::fs::read(dest.path().join("Zed.jpg")).unwrap(), b"zed");
}
