/// Completion request orchestration.
///
/// [`on_completion_requested`] is the synchronous query path: extract the
/// context chain at the cursor, resolve it against the project's index and
/// filter the result.  The index is read from disk on every call.
///
/// `Backend::handle_completion` wraps it for the LSP `completion` request.
use std::path::Path;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

use crate::Backend;
use crate::context::{detect_operator, get_context};
use crate::index::SymbolIndex;
use crate::parser::enclosing_class;
use crate::project::ProjectContext;
use crate::types::Candidate;
use crate::util;

use super::builder::{filter, to_completion_item};
use super::resolver::resolve;

/// Answer "what can follow the expression at `cursor_offset`".
///
/// Returns `None` when no project root has an index yet (the editor should
/// fall back to its own completion).  `file` selects the root whose index is
/// used; without it the first indexed root wins.
pub fn on_completion_requested(
    buffer: &str,
    cursor_offset: usize,
    file: Option<&Path>,
    project: &ProjectContext,
) -> Option<Vec<Candidate>> {
    let index_path = project.index_for_query(file)?;
    let index = SymbolIndex::load(index_path);
    Some(complete(buffer, cursor_offset, &index))
}

/// Run context extraction, resolution and filtering against an already
/// loaded index.
pub fn complete(buffer: &str, cursor_offset: usize, index: &SymbolIndex) -> Vec<Candidate> {
    let mut chain = get_context(buffer, cursor_offset);
    if chain.is_empty() || index.is_empty() {
        return Vec::new();
    }

    let is_self_context = chain.len() >= 2 && chain[0] == "$this";

    if chain.len() >= 2
        && matches!(chain[0].as_str(), "$this" | "self" | "static")
        && let Some(class) = enclosing_class(buffer, cursor_offset)
    {
        chain[0] = class;
    }

    let Some(target) = resolve(&chain, index) else {
        return Vec::new();
    };
    let operator = detect_operator(buffer, cursor_offset);

    tracing::debug!(
        "phpintel: completing {:?} → class {} partial {:?}",
        chain,
        target.class,
        target.partial
    );

    filter(index, &target.class, &target.partial, operator, is_self_context)
}

impl Backend {
    /// Completion handler behind `LanguageServer::completion`.
    pub(crate) async fn handle_completion(
        &self,
        params: CompletionParams,
    ) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some(content) = self.open_files.read().get(uri.as_str()).cloned() else {
            return Ok(None);
        };

        let offset = util::position_to_offset(&content, position);
        let file = util::uri_to_path(&uri);
        let project = self.project.read().clone();

        let candidates = on_completion_requested(&content, offset, file.as_deref(), &project);

        Ok(match candidates {
            Some(candidates) if !candidates.is_empty() => Some(CompletionResponse::Array(
                candidates.iter().map(to_completion_item).collect(),
            )),
            _ => None,
        })
    }
}
