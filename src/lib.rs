//! phpintel: file-based PHP code intelligence.
//!
//! The crate scans PHP sources into a flat per-project symbol index and
//! answers "what can follow this expression" completion queries from it.
//!
//! - [`parser`] turns one file into [`Declaration`](types::Declaration)s.
//! - [`index`] persists them, one hidden file per project root.
//! - [`context`] reads the member-access chain in front of the cursor.
//! - [`completion`] resolves that chain against the index and filters
//!   candidates.
//! - [`scan`] schedules background scans with progress reporting.
//!
//! [`Backend`] ties everything to the Language Server Protocol.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tower_lsp::Client;

pub mod completion;
pub mod config;
pub mod context;
pub mod docblock;
pub mod index;
pub mod parser;
pub mod project;
pub mod scan;
mod server;
pub mod types;
mod util;

pub use completion::handler::{complete, on_completion_requested};
pub use config::Config;
pub use index::SymbolIndex;
pub use project::{ProjectContext, ProjectRoot};
pub use types::*;

use scan::{LogStatusSink, LspStatusSink, StatusSink};

/// Command id for a whole-project scan (`workspace/executeCommand`).
pub const SCAN_PROJECT_COMMAND: &str = "phpintel.scanProject";

pub struct Backend {
    name: String,
    version: String,
    /// Open buffers keyed by document URI.
    open_files: Arc<RwLock<HashMap<String, String>>>,
    project: Arc<RwLock<ProjectContext>>,
    config: Arc<RwLock<Config>>,
    /// Path given with `--config`, re-applied whenever config is reloaded.
    config_override: Option<PathBuf>,
    client: Option<Client>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self::with_client(Some(client), None)
    }

    /// A backend for the LSP server that layers `config_path` over the
    /// user and project configuration.
    pub fn with_config_override(client: Client, config_path: Option<PathBuf>) -> Self {
        Self::with_client(Some(client), config_path)
    }

    fn with_client(client: Option<Client>, config_override: Option<PathBuf>) -> Self {
        Self {
            name: "phpintel".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            open_files: Arc::new(RwLock::new(HashMap::new())),
            project: Arc::new(RwLock::new(ProjectContext::default())),
            config: Arc::new(RwLock::new(Config::default())),
            config_override,
            client,
        }
    }

    /// A backend with no client attached; status goes to the log.
    pub fn new_test() -> Self {
        Self::with_client(None, None)
    }

    /// Like [`Backend::new_test`], with the given roots already open and an
    /// explicit configuration.
    pub fn new_test_with_roots(roots: &[PathBuf], config: Config) -> Self {
        let backend = Self::new_test();
        *backend.project.write() = ProjectContext::with_roots(config.index_file.clone(), roots);
        *backend.config.write() = config;
        backend
    }

    pub fn project(&self) -> ProjectContext {
        self.project.read().clone()
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    /// Text of an open buffer.
    pub fn open_file(&self, uri: &str) -> Option<String> {
        self.open_files.read().get(uri).cloned()
    }

    /// Replace the open roots (ProjectContext lifecycle start) and reload
    /// the configuration for the new first root.
    pub(crate) fn set_roots(&self, roots: Vec<PathBuf>) {
        let config = Config::load(roots.first().map(PathBuf::as_path), self.config_override.as_deref());
        *self.project.write() = ProjectContext::with_roots(config.index_file.clone(), roots);
        *self.config.write() = config;
    }

    pub(crate) fn add_root(&self, root: PathBuf) {
        self.project.write().add_root(root);
    }

    pub(crate) fn remove_root(&self, root: &Path) {
        self.project.write().remove_root(root);
    }

    fn status_sink(&self) -> Arc<dyn StatusSink> {
        match &self.client {
            Some(client) => Arc::new(LspStatusSink::new(client.clone())),
            None => Arc::new(LogStatusSink),
        }
    }

    /// Start a background rescan of one saved file.
    ///
    /// The returned handle resolves to `true` when the job succeeded (which
    /// includes the no-op case of a file outside every indexed root).
    pub fn on_buffer_saved(&self, path: PathBuf) -> JoinHandle<bool> {
        let project = self.project();
        let config = self.config();
        let interval = config.progress_interval();
        let sink = self.status_sink();

        tokio::spawn(async move {
            scan::run_with_progress("Indexing file", sink, interval, move |events| {
                scan::rescan_file(&project, &config, &path, events).map(|_| ())
            })
            .await
        })
    }

    /// Start a background scan of every open root.
    pub fn on_project_scan_requested(&self) -> JoinHandle<bool> {
        let project = self.project();
        let config = self.config();
        let interval = config.progress_interval();
        let sink = self.status_sink();

        tokio::spawn(async move {
            scan::run_with_progress("Scanning project", sink, interval, move |events| {
                scan::scan_project(&project, &config, events).map(|_| ())
            })
            .await
        })
    }

    /// Run a whole-project scan and wait for it.
    pub async fn scan_project(&self) -> bool {
        self.on_project_scan_requested().await.unwrap_or(false)
    }

    /// Rescan one file and wait for it.
    pub async fn rescan_file(&self, path: impl Into<PathBuf>) -> bool {
        self.on_buffer_saved(path.into()).await.unwrap_or(false)
    }

    pub(crate) async fn log(&self, typ: tower_lsp::lsp_types::MessageType, message: String) {
        if let Some(client) = &self.client {
            client.log_message(typ, message).await;
        }
    }
}
