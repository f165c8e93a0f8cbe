mod common;

use std::path::Path;

use common::{canonical, create_indexed_workspace, create_workspace, test_config};
use phpintel::index::{self, INDEX_FILE_NAME};
use phpintel::scan::{self, ScanEvent};
use phpintel::{Backend, ProjectContext};

const USER_PHP: &str = "<?php\nclass User {\n    public function getName(): string {}\n}\n";
const POST_PHP: &str = "<?php\nclass Post {\n    public function title(): string {}\n}\n";

fn classes_in(root: &std::path::Path) -> Vec<String> {
    let mut classes: Vec<String> = index::load(&root.join(INDEX_FILE_NAME))
        .into_iter()
        .map(|d| d.class)
        .collect();
    classes.dedup();
    classes
}

// ─── Whole-project scan ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_project_scan_indexes_every_php_file() {
    let (_backend, dir) = create_indexed_workspace(&[
        ("src/User.php", USER_PHP),
        ("src/Blog/Post.php", POST_PHP),
        ("notes.txt", "class NotPhp {}"),
    ])
    .await;

    let root = canonical(dir.path());
    let declarations = index::load(&root.join(INDEX_FILE_NAME));
    assert_eq!(declarations.len(), 2);
    assert!(declarations.iter().any(|d| d.class == "User" && d.name == "getName"));
    assert!(declarations.iter().any(|d| d.class == "Post" && d.name == "title"));
    assert!(
        declarations
            .iter()
            .all(|d| Path::new(&d.path).is_absolute()),
        "paths are absolute"
    );
}

#[tokio::test]
async fn test_project_scan_creates_one_index_per_root() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    common::write_files(first.path(), &[("User.php", USER_PHP)]);
    common::write_files(second.path(), &[("Post.php", POST_PHP)]);

    let roots = vec![canonical(first.path()), canonical(second.path())];
    let backend = Backend::new_test_with_roots(&roots, test_config());
    assert!(backend.scan_project().await);

    assert_eq!(classes_in(&roots[0]), vec!["User"]);
    assert_eq!(classes_in(&roots[1]), vec!["Post"]);
}

#[tokio::test]
async fn test_project_scan_survives_malformed_files() {
    let (_backend, dir) = create_indexed_workspace(&[
        ("a/Broken.php", "<?php\nclass Broken { public function (\n"),
        ("b/User.php", USER_PHP),
    ])
    .await;

    let declarations = index::load(&canonical(dir.path()).join(INDEX_FILE_NAME));
    assert!(declarations.iter().any(|d| d.class == "User"));
}

#[tokio::test]
async fn test_project_scan_rebuilds_from_scratch() {
    let (backend, dir) = create_indexed_workspace(&[("User.php", USER_PHP), ("Post.php", POST_PHP)]).await;
    std::fs::remove_file(dir.path().join("Post.php")).unwrap();

    assert!(backend.scan_project().await);
    assert_eq!(classes_in(&canonical(dir.path())), vec!["User"]);
}

// ─── Single-file rescan ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_rescan_replaces_declarations_of_saved_file() {
    let (backend, dir) = create_indexed_workspace(&[("User.php", USER_PHP), ("Post.php", POST_PHP)]).await;
    let root = canonical(dir.path());
    let post_before: Vec<_> = index::load(&root.join(INDEX_FILE_NAME))
        .into_iter()
        .filter(|d| d.class == "Post")
        .collect();

    std::fs::write(
        dir.path().join("User.php"),
        "<?php\nclass User {\n    public function getEmail(): string {}\n}\n",
    )
    .unwrap();
    assert!(backend.rescan_file(dir.path().join("User.php")).await);

    let after = index::load(&root.join(INDEX_FILE_NAME));
    let user_names: Vec<&str> = after
        .iter()
        .filter(|d| d.class == "User")
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(user_names, vec!["getEmail"]);

    let post_after: Vec<_> = after.into_iter().filter(|d| d.class == "Post").collect();
    assert_eq!(post_before, post_after, "other files are untouched");
}

#[tokio::test]
async fn test_rescan_is_idempotent() {
    let (backend, dir) = create_indexed_workspace(&[("User.php", USER_PHP), ("Post.php", POST_PHP)]).await;
    let index_path = canonical(dir.path()).join(INDEX_FILE_NAME);

    assert!(backend.rescan_file(dir.path().join("User.php")).await);
    let once = index::load(&index_path);
    assert!(backend.rescan_file(dir.path().join("User.php")).await);
    let twice = index::load(&index_path);

    assert_eq!(once, twice);
    assert_eq!(once.len(), 2);
}

#[tokio::test]
async fn test_rescan_of_deleted_file_drops_its_declarations() {
    let (backend, dir) = create_indexed_workspace(&[("User.php", USER_PHP), ("Post.php", POST_PHP)]).await;
    let root = canonical(dir.path());
    let post = root.join("Post.php");
    std::fs::remove_file(&post).unwrap();

    assert!(backend.rescan_file(post).await);
    assert_eq!(classes_in(&root), vec!["User"]);
}

#[tokio::test]
async fn test_rescan_without_index_does_nothing() {
    let (backend, dir) = create_workspace(&[("User.php", USER_PHP)]);

    assert!(backend.rescan_file(dir.path().join("User.php")).await);
    assert!(!dir.path().join(INDEX_FILE_NAME).exists());
}

#[tokio::test]
async fn test_rescan_ignores_non_source_files() {
    let (backend, dir) = create_indexed_workspace(&[("User.php", USER_PHP)]).await;
    common::write_files(dir.path(), &[("readme.md", "class Fake {}")]);

    assert!(backend.rescan_file(dir.path().join("readme.md")).await);
    assert_eq!(classes_in(&canonical(dir.path())), vec!["User"]);
}

// ─── Scheduler functions directly ───────────────────────────────────────────

#[tokio::test]
async fn test_scan_project_reports_each_file() {
    let dir = tempfile::tempdir().unwrap();
    common::write_files(dir.path(), &[("A.php", USER_PHP), ("B.php", POST_PHP)]);
    let project = ProjectContext::with_roots(INDEX_FILE_NAME, [canonical(dir.path())]);
    let config = test_config();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let total = scan::scan_project(&project, &config, &tx).unwrap();
    drop(tx);

    assert_eq!(total, 2);
    let mut messages = Vec::new();
    while let Some(ScanEvent::Status(message)) = rx.recv().await {
        messages.push(message);
    }
    assert_eq!(messages.len(), 2);
    assert!(messages[0].starts_with("Scanning ") && messages[0].ends_with("A.php"));
    assert!(messages[1].ends_with("B.php"));
}

#[tokio::test]
async fn test_scan_project_fails_when_index_cannot_be_written() {
    let project = ProjectContext::with_roots(INDEX_FILE_NAME, ["/definitely/not/a/real/root"]);
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    assert!(scan::scan_project(&project, &test_config(), &tx).is_err());
}

#[tokio::test]
async fn test_scan_project_continues_past_a_bad_root() {
    let good = tempfile::tempdir().unwrap();
    common::write_files(good.path(), &[("A.php", USER_PHP)]);
    let project = ProjectContext::with_roots(
        INDEX_FILE_NAME,
        [Path::new("/definitely/not/a/real/root").to_path_buf(), canonical(good.path())],
    );

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    assert!(scan::scan_project(&project, &test_config(), &tx).is_err());
    assert_eq!(classes_in(&canonical(good.path())), vec!["User"]);
}

#[tokio::test]
async fn test_project_scan_with_bad_root_reports_failure() {
    let good = tempfile::tempdir().unwrap();
    common::write_files(good.path(), &[("A.php", USER_PHP)]);
    let roots = vec![
        Path::new("/definitely/not/a/real/root").to_path_buf(),
        canonical(good.path()),
    ];
    let backend = Backend::new_test_with_roots(&roots, test_config());

    assert!(!backend.scan_project().await);
    assert!(canonical(good.path()).join(INDEX_FILE_NAME).exists());
}
