//! Context chain extraction.
//!
//! Given a buffer and a cursor offset, walk backwards over the member-access
//! expression that ends at the cursor and return its segments in source
//! order.  The last segment is always the name being typed (possibly
//! empty).
//!
//! | Source before the cursor        | Chain                            |
//! |---------------------------------|----------------------------------|
//! | `$this->`                       | `["$this", ""]`                  |
//! | `$this->getName()->`            | `["$this", "getName", ""]`       |
//! | `$user->profile->ava`           | `["$user", "profile", "ava"]`    |
//! | `Factory::create($a, $b)->bu`   | `["Factory", "create", "bu"]`    |
//! | `(new Mailer())->se`            | `["Mailer", "se"]`               |
//! | `$repo?->find(1)->`             | `["$repo", "find", ""]`          |
//! | `str_rep`                       | `["str_rep"]`                    |
//!
//! Call arguments never become segments: a balanced `(...)` group in front
//! of an operator is skipped entirely.  Whitespace, including newlines, may
//! separate segments from operators so multi-line fluent chains work.

use crate::types::AccessOperator;
use crate::util::clamp_to_char_boundary;

/// Extract the context chain ending at `cursor_offset` (a byte offset).
///
/// Returns an empty vector when the cursor is not at the end of a
/// member-access expression or a bare name.
pub fn get_context(source: &str, cursor_offset: usize) -> Vec<String> {
    let end = clamp_to_char_boundary(source, cursor_offset);
    let chars: Vec<char> = source[..end].chars().collect();

    let mut i = chars.len();
    let partial_start = segment_start(&chars, i);
    let mut segments: Vec<String> = vec![chars[partial_start..i].iter().collect()];
    i = partial_start;

    while let Some(op_start) = operator_before(&chars, i) {
        let mut j = skip_whitespace_back(&chars, op_start);

        let mut is_call = false;
        if j > 0 && chars[j - 1] == ')' {
            let Some(open) = skip_balanced_parens_back(&chars, j) else {
                return Vec::new();
            };
            if segment_start(&chars, open) == open {
                // `(new Foo(...))->`: the class is the head of the chain.
                return match new_expression_inside_parens(&chars, open, j) {
                    Some(class_name) => finish(segments, Some(class_name)),
                    None => Vec::new(),
                };
            }
            j = open;
            is_call = true;
        }

        let start = segment_start(&chars, j);
        if start == j {
            // `"str"->`, `$arr[0]->`, a dangling operator: nothing to resolve.
            return Vec::new();
        }
        let segment: String = chars[start..j].iter().collect();

        // `new Foo()->` (PHP 8.4): the class is the head of the chain.
        if is_call && has_new_keyword_before(&chars, start) {
            return finish(segments, Some(segment));
        }

        segments.push(segment);
        i = start;
    }

    if segments.len() == 1 && segments[0].is_empty() {
        return Vec::new();
    }
    finish(segments, None)
}

/// Detect the operator directly in front of the partial name at the cursor.
pub fn detect_operator(source: &str, cursor_offset: usize) -> AccessOperator {
    let end = clamp_to_char_boundary(source, cursor_offset);
    let chars: Vec<char> = source[..end].chars().collect();
    let start = segment_start(&chars, chars.len());

    match operator_before(&chars, start) {
        Some(op) if chars[op] == ':' => AccessOperator::DoubleColon,
        Some(_) => AccessOperator::Arrow,
        None => AccessOperator::Other,
    }
}

/// Reverse the back-to-front segment list, appending a class head first if
/// one ended the walk.
fn finish(mut segments: Vec<String>, head: Option<String>) -> Vec<String> {
    if let Some(head) = head {
        segments.push(head);
    }
    segments.reverse();
    segments
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Walk back from `end` over identifier characters, including one leading
/// `$`.  Returns the start index (equal to `end` when there is none).
fn segment_start(chars: &[char], end: usize) -> usize {
    let mut i = end;
    while i > 0 && is_ident_char(chars[i - 1]) {
        i -= 1;
    }
    if i > 0 && chars[i - 1] == '$' {
        i -= 1;
    }
    i
}

fn skip_whitespace_back(chars: &[char], end: usize) -> usize {
    let mut i = end;
    while i > 0 && chars[i - 1].is_whitespace() {
        i -= 1;
    }
    i
}

/// If a member-access operator (`->`, `?->`, `::`) ends at `end` (after
/// optional whitespace), return the index of its first character.
fn operator_before(chars: &[char], end: usize) -> Option<usize> {
    let j = skip_whitespace_back(chars, end);
    if j < 2 {
        return None;
    }
    match (chars[j - 2], chars[j - 1]) {
        ('-', '>') if j >= 3 && chars[j - 3] == '?' => Some(j - 3),
        ('-', '>') | (':', ':') => Some(j - 2),
        _ => None,
    }
}

/// Skip backwards past a balanced parenthesised group `(…)`.
///
/// `pos` must point one past the closing `)`.  Returns the index of the
/// opening `(`, or `None` if parens are unbalanced.  Parens inside `'...'`
/// and `"..."` literals are not counted.
fn skip_balanced_parens_back(chars: &[char], pos: usize) -> Option<usize> {
    if pos == 0 || chars[pos - 1] != ')' {
        return None;
    }
    let mut depth: u32 = 0;
    let mut j = pos;
    while j > 0 {
        j -= 1;
        match chars[j] {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            quote @ ('\'' | '"') if !is_escaped(chars, j) => {
                j = string_start_back(chars, j, quote)?;
            }
            _ => {}
        }
    }
    None
}

/// Index of the unescaped `quote` that opens the literal closed at `close`.
fn string_start_back(chars: &[char], close: usize, quote: char) -> Option<usize> {
    let mut j = close;
    while j > 0 {
        j -= 1;
        if chars[j] == quote && !is_escaped(chars, j) {
            return Some(j);
        }
    }
    None
}

/// Whether the character at `idx` is preceded by an odd run of backslashes.
fn is_escaped(chars: &[char], idx: usize) -> bool {
    let backslashes = chars[..idx].iter().rev().take_while(|&&c| c == '\\').count();
    backslashes % 2 == 1
}

/// Check if the `new` keyword (followed by whitespace) appears immediately
/// before the identifier starting at `ident_start`.
fn has_new_keyword_before(chars: &[char], ident_start: usize) -> bool {
    let mut j = ident_start;
    while j > 0 && chars[j - 1].is_whitespace() {
        j -= 1;
    }
    if j == ident_start || j < 3 {
        return false;
    }
    if chars[j - 3..j] != ['n', 'e', 'w'] {
        return false;
    }
    j == 3 || !is_ident_char(chars[j - 4])
}

/// Look inside `(…)` for `new ClassName(...)` and return the short class
/// name.  `open` is the outer `(`, `close` one past the outer `)`.
fn new_expression_inside_parens(chars: &[char], open: usize, close: usize) -> Option<String> {
    let inner: String = chars[open + 1..close - 1].iter().collect();
    let rest = inner.trim_start().strip_prefix("new")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name: String = rest
        .trim_start()
        .chars()
        .take_while(|&c| is_ident_char(c) || c == '\\')
        .collect();
    let short = name.rsplit('\\').next().unwrap_or(&name);
    (!short.is_empty()).then(|| short.to_string())
}
