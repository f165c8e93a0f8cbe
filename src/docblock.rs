//! PHPDoc block lookup.
//!
//! The scanner only needs a small slice of PHPDoc: the `@return`, `@var`
//! and `@param` tags, used to fill in a declaration's type when the source
//! has no native type hint.

use mago_span::HasSpan;
use mago_syntax::ast::*;

/// Look up the docblock comment (if any) that immediately precedes an AST
/// node and return its raw text.
///
/// Walks the program's trivia backwards from the node start.  Whitespace and
/// ordinary comments between the docblock and the node are skipped; any
/// code in between means the docblock belongs to something else.
pub fn get_docblock_text_for_node<'a>(
    trivia: &'a [Trivia<'a>],
    content: &str,
    node: &impl HasSpan,
) -> Option<&'a str> {
    let node_start = node.span().start.offset;
    let candidate_idx = trivia.partition_point(|t| t.span.start.offset < node_start);
    if candidate_idx == 0 {
        return None;
    }

    let content_bytes = content.as_bytes();
    let mut covered_from = node_start;

    for i in (0..candidate_idx).rev() {
        let t = &trivia[i];
        let t_end = t.span.end.offset;

        let gap = content_bytes
            .get(t_end as usize..covered_from as usize)
            .unwrap_or(&[]);
        if !gap.iter().all(u8::is_ascii_whitespace) {
            return None;
        }

        match t.kind {
            TriviaKind::DocBlockComment => return Some(t.value),
            TriviaKind::WhiteSpace
            | TriviaKind::SingleLineComment
            | TriviaKind::MultiLineComment
            | TriviaKind::HashComment => {
                covered_from = t.span.start.offset;
            }
        }
    }

    None
}

/// Extract the type from a `@return` tag.
///
/// `/** @return \App\User|null */` → `Some("App\User")`
pub fn extract_return_type(docblock: &str) -> Option<String> {
    extract_tag_type(docblock, "@return")
}

/// Extract the type from a `@var` tag, with or without a trailing variable
/// name (`@var Foo` and `@var Foo $foo` both yield `Foo`).
pub fn extract_var_type(docblock: &str) -> Option<String> {
    extract_tag_type(docblock, "@var")
}

/// Extract the type a `@param` tag assigns to `var_name` (with `$`).
pub fn extract_param_type(docblock: &str, var_name: &str) -> Option<String> {
    for trimmed in tag_lines(docblock) {
        let Some(rest) = trimmed.strip_prefix("@param") else {
            continue;
        };
        let rest = rest.trim_start();
        if rest.is_empty() {
            continue;
        }
        let (type_token, remainder) = split_type_token(rest);
        if remainder.split_whitespace().next() == Some(var_name) {
            return Some(clean_type(type_token));
        }
    }
    None
}

fn extract_tag_type(docblock: &str, tag: &str) -> Option<String> {
    for trimmed in tag_lines(docblock) {
        let Some(rest) = trimmed.strip_prefix(tag) else {
            continue;
        };
        // `@returns` / `@variable` are not our tags.
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            continue;
        }
        let rest = rest.trim_start();
        if rest.is_empty() {
            continue;
        }
        // PHPStan conditional return types are not supported.
        if rest.starts_with('(') {
            return None;
        }
        let (type_str, _) = split_type_token(rest);
        let cleaned = clean_type(type_str);
        return (!cleaned.is_empty()).then_some(cleaned);
    }
    None
}

/// The content lines of a docblock with the `/**`, `*/` and `*` gutter
/// removed.
fn tag_lines(docblock: &str) -> impl Iterator<Item = &str> {
    let inner = docblock.trim();
    let inner = inner.strip_prefix("/**").unwrap_or(inner);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);
    inner
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
}

/// Split off the first type token from `s`, respecting `<…>` nesting.
fn split_type_token(s: &str) -> (&str, &str) {
    let mut angle_depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '<' => angle_depth += 1,
            '>' => {
                angle_depth -= 1;
                if angle_depth == 0 {
                    let end = i + c.len_utf8();
                    return (&s[..end], &s[end..]);
                }
            }
            c if c.is_whitespace() && angle_depth == 0 => {
                return (&s[..i], &s[i..]);
            }
            _ => {}
        }
    }
    (s, "")
}

/// Clean a raw docblock type: strip a leading `\`, generic arguments,
/// trailing punctuation and a `|null` member.
fn clean_type(raw: &str) -> String {
    let s = raw.strip_prefix('\\').unwrap_or(raw);
    let s = match s.find('<') {
        Some(idx) => &s[..idx],
        None => s,
    };
    let s = s.trim_end_matches(['.', ',']);

    if s.contains('|') {
        let parts: Vec<&str> = s
            .split('|')
            .map(str::trim)
            .filter(|p| !p.eq_ignore_ascii_case("null"))
            .collect();
        return parts.join("|");
    }

    s.to_string()
}
