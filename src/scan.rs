//! Scan scheduling.
//!
//! Scans never run on the query path.  Each one is a blocking job on the
//! tokio blocking pool that reports [`ScanEvent`]s over a channel; a
//! separate progress task renders a bouncing indicator from those events
//! and stops by itself once the job drops its sender.
//!
//! Two kinds of job exist:
//!
//! - [`rescan_file`]: re-index one saved file and merge it into the index
//!   of the root that contains it.
//! - [`scan_project`]: rebuild the index of every root from scratch.
//!
//! Overlapping jobs on the same root are not serialised; the last writer
//! of an index file wins.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use ignore::WalkBuilder;
use tokio::sync::mpsc;
use tower_lsp::Client;
use tower_lsp::lsp_types::*;

use crate::config::Config;
use crate::index;
use crate::parser;
use crate::project::{ProjectContext, ProjectRoot};
use crate::types::Declaration;

/// Final status text of a successful scan.
pub const SCAN_COMPLETE: &str = "Scan complete";

/// Progress reported by a running scan job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Replace the indicator's message.
    Status(String),
    /// The job failed; the final status will be empty.
    Failed(String),
}

pub type EventSender = mpsc::UnboundedSender<ScanEvent>;

fn report(events: &EventSender, message: String) {
    // The progress task may already be gone; the scan itself still counts.
    let _ = events.send(ScanEvent::Status(message));
}

/// Every source file under `root`, sorted by path.
pub fn discover_files(root: &Path, config: &Config) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .standard_filters(config.respect_gitignore)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("phpintel: skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| config.is_source_file(path))
        .collect();
    files.sort();
    files
}

/// Read and scan one file.  An unreadable file contributes nothing.
pub fn scan_file(path: &Path) -> Vec<Declaration> {
    match std::fs::read_to_string(path) {
        Ok(source) => {
            let declarations = parser::scan(&source, path);
            tracing::debug!("phpintel: {} declarations in {}", declarations.len(), path.display());
            declarations
        }
        Err(e) => {
            tracing::warn!("phpintel: cannot read {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Re-index `path` into the index of the first indexed root containing it.
///
/// Returns `Ok(false)` when the file is not a source file or no indexed
/// root contains it (nothing to do until a project scan creates an index).
pub fn rescan_file(
    project: &ProjectContext,
    config: &Config,
    path: &Path,
    events: &EventSender,
) -> io::Result<bool> {
    if !config.is_source_file(path) {
        return Ok(false);
    }
    let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let Some(root) = project.indexed_root_for(&path) else {
        tracing::debug!("phpintel: {} is not under an indexed root", path.display());
        return Ok(false);
    };

    report(events, format!("Scanning {}", path.display()));
    let fresh = scan_file(&path);
    let old = index::load(&root.index_path);
    let merged = index::merge(old, &path.to_string_lossy(), fresh);
    index::save(&merged, &root.index_path)?;

    tracing::info!(
        "phpintel: re-indexed {} ({} declarations in {})",
        path.display(),
        merged.len(),
        root.index_path.display()
    );
    Ok(true)
}

/// Rebuild the index of one root from every source file under it.
pub fn scan_root(root: &ProjectRoot, config: &Config, events: &EventSender) -> io::Result<usize> {
    let files = discover_files(&root.path, config);
    let mut declarations = Vec::new();

    for (i, file) in files.iter().enumerate() {
        if i > 0 && !config.scan_delay().is_zero() {
            std::thread::sleep(config.scan_delay());
        }
        report(events, format!("Scanning {}", file.display()));
        declarations.extend(scan_file(file));
    }

    index::save(&declarations, &root.index_path)?;
    tracing::info!(
        "phpintel: indexed {} files ({} declarations) into {}",
        files.len(),
        declarations.len(),
        root.index_path.display()
    );
    Ok(declarations.len())
}

/// Rebuild the index of every root in `project`.
///
/// A root whose index cannot be written does not stop the others; the
/// whole scan fails once every root has been tried.
pub fn scan_project(project: &ProjectContext, config: &Config, events: &EventSender) -> io::Result<usize> {
    let mut total = 0;
    let mut failed = Vec::new();
    for root in project.roots() {
        match scan_root(root, config, events) {
            Ok(count) => total += count,
            Err(e) => {
                tracing::warn!("phpintel: cannot index {}: {}", root.path.display(), e);
                failed.push(root.path.display().to_string());
            }
        }
    }

    if failed.is_empty() {
        Ok(total)
    } else {
        Err(io::Error::other(format!("indexing failed for {}", failed.join(", "))))
    }
}

// ─── Progress ───────────────────────────────────────────────────────────────

/// The `[   =    ] message` indicator: an `=` bouncing between the
/// brackets, one step per tick.
#[derive(Debug, Clone)]
pub struct ProgressIndicator {
    size: usize,
    position: usize,
    forward: bool,
}

impl Default for ProgressIndicator {
    fn default() -> Self {
        Self {
            size: 8,
            position: 0,
            forward: true,
        }
    }
}

impl ProgressIndicator {
    /// Render the current frame around `message` and advance one step.
    pub fn tick(&mut self, message: &str) -> String {
        let before = self.position;
        let after = self.size - 1 - before;
        let frame = format!("[{}={}] {}", " ".repeat(before), " ".repeat(after), message);

        if after == 0 {
            self.forward = false;
        }
        if before == 0 {
            self.forward = true;
        }
        if self.forward {
            self.position += 1;
        } else {
            self.position -= 1;
        }
        frame
    }
}

/// Where status text goes while a scan runs.
#[tower_lsp::async_trait]
pub trait StatusSink: Send + Sync {
    async fn begin(&self, _title: &str) {}
    async fn report(&self, text: &str);
    /// Final status: [`SCAN_COMPLETE`] or the empty string after a failure.
    async fn end(&self, text: &str);
}

/// Status sink for runs without an editor: everything goes to the log.
#[derive(Debug, Default)]
pub struct LogStatusSink;

#[tower_lsp::async_trait]
impl StatusSink for LogStatusSink {
    async fn report(&self, text: &str) {
        tracing::debug!("{}", text);
    }

    async fn end(&self, text: &str) {
        if !text.is_empty() {
            tracing::info!("{}", text);
        }
    }
}

/// Status sink that drives an LSP `$/progress` work-done report.
pub struct LspStatusSink {
    client: Client,
    token: NumberOrString,
}

impl LspStatusSink {
    pub fn new(client: Client) -> Self {
        static NEXT_TOKEN: AtomicU32 = AtomicU32::new(1);
        let id = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
        Self {
            client,
            token: NumberOrString::String(format!("phpintel/scan/{id}")),
        }
    }

    async fn progress(&self, value: WorkDoneProgress) {
        self.client
            .send_notification::<notification::Progress>(ProgressParams {
                token: self.token.clone(),
                value: ProgressParamsValue::WorkDone(value),
            })
            .await;
    }
}

#[tower_lsp::async_trait]
impl StatusSink for LspStatusSink {
    async fn begin(&self, title: &str) {
        let created = self
            .client
            .send_request::<request::WorkDoneProgressCreate>(WorkDoneProgressCreateParams {
                token: self.token.clone(),
            })
            .await;
        if let Err(e) = created {
            tracing::debug!("phpintel: client refused progress token: {}", e);
        }
        self.progress(WorkDoneProgress::Begin(WorkDoneProgressBegin {
            title: title.to_string(),
            cancellable: Some(false),
            message: None,
            percentage: None,
        }))
        .await;
    }

    async fn report(&self, text: &str) {
        self.progress(WorkDoneProgress::Report(WorkDoneProgressReport {
            cancellable: Some(false),
            message: Some(text.to_string()),
            percentage: None,
        }))
        .await;
    }

    async fn end(&self, text: &str) {
        let message = (!text.is_empty()).then(|| text.to_string());
        self.progress(WorkDoneProgress::End(WorkDoneProgressEnd { message }))
            .await;
    }
}

/// Render progress until every sender of `events` is dropped.
async fn drive_progress(
    mut events: mpsc::UnboundedReceiver<ScanEvent>,
    sink: Arc<dyn StatusSink>,
    title: String,
    interval: Duration,
) {
    let mut indicator = ProgressIndicator::default();
    let mut message = title.clone();
    let mut failed = false;
    let mut ticker = tokio::time::interval(interval);

    sink.begin(&title).await;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ScanEvent::Status(text)) => message = text,
                Some(ScanEvent::Failed(reason)) => {
                    tracing::warn!("phpintel: {} failed: {}", title, reason);
                    failed = true;
                }
                None => break,
            },
            _ = ticker.tick() => sink.report(&indicator.tick(&message)).await,
        }
    }
    sink.end(if failed { "" } else { SCAN_COMPLETE }).await;
}

/// Run a blocking scan job with a progress task attached.
///
/// Resolves once both the job and the progress task have finished; the
/// result is `true` when the job succeeded.  A job that returns an error or
/// panics ends with an empty status.
pub async fn run_with_progress<F>(
    title: &str,
    sink: Arc<dyn StatusSink>,
    interval: Duration,
    job: F,
) -> bool
where
    F: FnOnce(&EventSender) -> io::Result<()> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let progress = tokio::spawn(drive_progress(rx, sink, title.to_string(), interval));

    let failure_tx = tx.clone();
    let outcome = tokio::task::spawn_blocking(move || job(&tx)).await;

    let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(e) => Some(format!("scan worker panicked: {e}")),
    };
    if let Some(reason) = &failure {
        tracing::error!("phpintel: {} failed: {}", title, reason);
        let _ = failure_tx.send(ScanEvent::Failed(reason.clone()));
    }
    drop(failure_tx);

    if let Err(e) = progress.await {
        tracing::error!("phpintel: progress task ended abnormally: {}", e);
    }
    failure.is_none()
}
