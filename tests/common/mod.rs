#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use phpintel::{Backend, Config};
use tower_lsp::LanguageServer;
use tower_lsp::lsp_types::*;

pub fn create_test_backend() -> Backend {
    Backend::new_test()
}

/// Config for tests: no pause between files, fast progress ticks.
pub fn test_config() -> Config {
    Config {
        scan_delay_ms: 0,
        progress_interval_ms: 1,
        ..Config::default()
    }
}

/// Write `files` (relative path, content) into `root`, creating directories.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel_path, content) in files {
        let full = root.join(rel_path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("failed to create dirs");
        }
        fs::write(&full, content).expect("failed to write PHP file");
    }
}

/// Helper: create a temp workspace with PHP files and return a Backend
/// whose only project root is that workspace.  Nothing is scanned yet.
pub fn create_workspace(files: &[(&str, &str)]) -> (Backend, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_files(dir.path(), files);
    let root = canonical(dir.path());
    let backend = Backend::new_test_with_roots(&[root], test_config());
    (backend, dir)
}

/// Like [`create_workspace`], then runs a whole-project scan.
pub async fn create_indexed_workspace(files: &[(&str, &str)]) -> (Backend, tempfile::TempDir) {
    let (backend, dir) = create_workspace(files);
    assert!(backend.scan_project().await, "project scan should succeed");
    (backend, dir)
}

pub fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).expect("failed to canonicalize")
}

/// Byte offset just past the first occurrence of `marker` in `text`.
pub fn offset_after(text: &str, marker: &str) -> usize {
    text.find(marker).expect("marker not found") + marker.len()
}

/// LSP position of byte `offset` in `text` (ASCII content only).
pub fn position_at(text: &str, offset: usize) -> Position {
    let before = &text[..offset];
    let line = before.matches('\n').count() as u32;
    let character = before.rsplit('\n').next().unwrap_or(before).len() as u32;
    Position { line, character }
}

/// Open `text` as `uri` and request completion at `position`.
pub async fn complete_at(
    backend: &Backend,
    uri: &Url,
    text: &str,
    position: Position,
) -> Option<Vec<CompletionItem>> {
    backend
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: "php".to_string(),
                version: 1,
                text: text.to_string(),
            },
        })
        .await;

    let result = backend
        .completion(CompletionParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
                position,
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: None,
        })
        .await
        .unwrap();

    result.map(|response| match response {
        CompletionResponse::Array(items) => items,
        CompletionResponse::List(list) => list.items,
    })
}

pub fn labels(items: &[CompletionItem]) -> Vec<&str> {
    items.iter().map(|i| i.label.as_str()).collect()
}
