/// LSP server trait implementation.
///
/// This module contains the `impl LanguageServer for Backend` block,
/// which handles all LSP protocol messages (initialize, didOpen, didChange,
/// didClose, didSave, completion, executeCommand, workspace folders).
use tower_lsp::LanguageServer;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

use crate::{Backend, SCAN_PROJECT_COMMAND};

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Workspace folders take precedence over the legacy root URI.
        let mut roots: Vec<_> = params
            .workspace_folders
            .iter()
            .flatten()
            .filter_map(|folder| crate::util::uri_to_path(&folder.uri))
            .collect();
        if roots.is_empty()
            && let Some(root) = params.root_uri.as_ref().and_then(crate::util::uri_to_path)
        {
            roots.push(root);
        }
        self.set_roots(roots);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec![
                        "$".to_string(),
                        ">".to_string(),
                        ":".to_string(),
                    ]),
                    ..CompletionOptions::default()
                }),
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                        ..TextDocumentSyncOptions::default()
                    },
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![SCAN_PROJECT_COMMAND.to_string()],
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                }),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: self.name.clone(),
                version: Some(self.version.clone()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let project = self.project();
        let indexed = project.roots_with_index().count();
        self.log(
            MessageType::INFO,
            format!(
                "phpintel initialized: {} root(s), {} indexed",
                project.roots().len(),
                indexed
            ),
        )
        .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.open_files.write().insert(doc.uri.to_string(), doc.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.to_string();

        // Full sync: the last change carries the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.open_files.write().insert(uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.open_files
            .write()
            .remove(params.text_document.uri.as_str());
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        if let Some(path) = crate::util::uri_to_path(&params.text_document.uri) {
            // Runs in the background; the editor is never blocked on it.
            let _ = self.on_buffer_saved(path);
        }
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        for folder in &params.event.removed {
            if let Some(path) = crate::util::uri_to_path(&folder.uri) {
                self.remove_root(&path);
            }
        }
        for folder in params.event.added {
            if let Some(path) = crate::util::uri_to_path(&folder.uri) {
                self.add_root(path);
            }
        }
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        if params.command == SCAN_PROJECT_COMMAND {
            if self.project().is_empty() {
                self.log(
                    MessageType::WARNING,
                    "phpintel: no project folder open, nothing to scan".to_string(),
                )
                .await;
            } else {
                let _ = self.on_project_scan_requested();
            }
        }
        Ok(None)
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        self.handle_completion(params).await
    }
}
