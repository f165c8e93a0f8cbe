/// Completion candidate building.
///
/// This module filters the declarations of one resolved class by name
/// prefix, visibility and staticness, turns them into [`Candidate`]s with an
/// editor snippet, and maps candidates to LSP `CompletionItem`s.
///
/// Access policy (exact match on both columns):
///
/// | context                         | visibility | static   |
/// |---------------------------------|------------|----------|
/// | `::` operator                   | `public`   | static   |
/// | `$this->...` (chain of 2+)      | any        | instance |
/// | otherwise                       | `public`   | instance |
use std::collections::HashSet;

use tower_lsp::lsp_types::*;

use crate::index::SymbolIndex;
use crate::types::*;

/// Which declarations an access context may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AccessPolicy {
    /// Required visibility, or `None` for any.
    pub visibility: Option<Visibility>,
    pub is_static: bool,
}

impl AccessPolicy {
    pub(crate) fn for_context(operator: AccessOperator, is_self_context: bool) -> Self {
        match operator {
            AccessOperator::DoubleColon => Self {
                visibility: Some(Visibility::Public),
                is_static: true,
            },
            _ if is_self_context => Self {
                visibility: None,
                is_static: false,
            },
            _ => Self {
                visibility: Some(Visibility::Public),
                is_static: false,
            },
        }
    }

    fn allows(&self, decl: &Declaration) -> bool {
        decl.is_static == self.is_static && self.visibility.is_none_or(|v| v == decl.visibility)
    }
}

/// Filter `index` down to the members of `class` that complete `partial`.
///
/// Results are deduplicated on `(label, snippet)` and sorted by label.
/// An empty result means "offer nothing of our own".
pub fn filter(
    index: &SymbolIndex,
    class: &str,
    partial: &str,
    operator: AccessOperator,
    is_self_context: bool,
) -> Vec<Candidate> {
    let policy = AccessPolicy::for_context(operator, is_self_context);

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut candidates: Vec<Candidate> = index
        .declarations()
        .iter()
        .filter(|d| d.class == class && policy.allows(d) && name_matches(d, partial))
        .map(build_candidate)
        .filter(|c| seen.insert((c.label(), c.snippet.clone())))
        .collect();

    candidates.sort_by_key(|c| c.label());
    candidates
}

/// Prefix match on the declaration name.
///
/// A partial typed with its `$` sigil only matches variables; otherwise the
/// sigil is ignored on both sides.
fn name_matches(decl: &Declaration, partial: &str) -> bool {
    if decl.bare_name().is_empty() {
        return false;
    }
    match partial.strip_prefix('$') {
        Some(bare) => decl.kind == Kind::Variable && decl.bare_name().starts_with(bare),
        None => decl.bare_name().starts_with(partial),
    }
}

fn build_candidate(decl: &Declaration) -> Candidate {
    let name = decl.bare_name().to_string();
    let snippet = match decl.kind {
        Kind::Variable => name.clone(),
        Kind::Function => build_callable_snippet(&name, &decl.args),
    };
    Candidate {
        name,
        returns: decl.returns.clone(),
        snippet,
        kind: decl.kind,
        global: decl.is_global(),
    }
}

/// Build a snippet string for a callable with one tab stop per parameter.
///
/// Example: `updateText(${1:\$text}, ${2:\$frogs})`
pub(crate) fn build_callable_snippet(name: &str, args: &[Parameter]) -> String {
    let placeholders: Vec<String> = args
        .iter()
        .enumerate()
        .map(|(i, arg)| format!("${{{}:{}}}", i + 1, escape_snippet_text(&arg.name)))
        .collect();
    format!("{}({})", name, placeholders.join(", "))
}

/// Escape the characters that are special inside a snippet placeholder.
fn escape_snippet_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 1);
    for c in text.chars() {
        if matches!(c, '$' | '}' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Map a candidate to an LSP completion item.
pub(crate) fn to_completion_item(candidate: &Candidate) -> CompletionItem {
    let kind = match (candidate.kind, candidate.global) {
        (Kind::Function, false) => CompletionItemKind::METHOD,
        (Kind::Variable, false) => CompletionItemKind::PROPERTY,
        (Kind::Function, true) => CompletionItemKind::FUNCTION,
        (Kind::Variable, true) => CompletionItemKind::VARIABLE,
    };
    let detail = (!candidate.returns.is_empty()).then(|| candidate.returns.clone());

    CompletionItem {
        label: candidate.name.clone(),
        kind: Some(kind),
        detail,
        insert_text: Some(candidate.snippet.clone()),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        filter_text: Some(candidate.name.clone()),
        sort_text: Some(candidate.label()),
        ..CompletionItem::default()
    }
}
