/// Utility functions for the phpintel server.
///
/// This module contains helpers for LSP position/offset conversion and
/// URI/path conversion.
use std::path::PathBuf;

use tower_lsp::lsp_types::{Position, Url};

/// Convert an LSP Position (line, UTF-16 character) to a byte offset in
/// `content`.
///
/// Both `\n` and `\r\n` line endings are handled.  A character past the end
/// of its line clamps to the end of that line; a line past the end of the
/// content clamps to the end of the content.
pub(crate) fn position_to_offset(content: &str, position: Position) -> usize {
    let mut line_start = 0;
    for _ in 0..position.line {
        match content[line_start..].find('\n') {
            Some(nl) => line_start += nl + 1,
            None => return content.len(),
        }
    }

    let line_end = content[line_start..]
        .find('\n')
        .map(|nl| line_start + nl)
        .unwrap_or(content.len());
    let line = content[line_start..line_end].trim_end_matches('\r');

    let mut utf16_col: u32 = 0;
    for (idx, ch) in line.char_indices() {
        if utf16_col >= position.character {
            return line_start + idx;
        }
        utf16_col += ch.len_utf16() as u32;
    }
    line_start + line.len()
}

/// Largest char boundary in `source` that is `<= offset`.
pub(crate) fn clamp_to_char_boundary(source: &str, offset: usize) -> usize {
    let mut end = offset.min(source.len());
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Local file path of a `file://` URI.
pub(crate) fn uri_to_path(uri: &Url) -> Option<PathBuf> {
    if uri.scheme() != "file" {
        return None;
    }
    uri.to_file_path().ok()
}
