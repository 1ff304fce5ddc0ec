//! Scanning procedures for the parts of the template language that cannot be
//! tokenized with ordinary rules: nested comments and raw blocks.

use crate::compile::search::{Delim, Searcher};
use crate::types::ast::Whitespace;
use crate::types::syntax::Kind;

/// Scans a comment whose begin delimiter is `open`.
///
/// Comments nest, so every begin comment delimiter found along the way must be
/// matched by an end comment delimiter before the comment is finished. Returns
/// the end of the comment and the modifier on its final end delimiter, or
/// `None` if the input ran out before the depth returned to zero.
pub fn comment(searcher: &Searcher, source: &str, open: Delim) -> Option<(usize, Option<Whitespace>)> {
    let begin = searcher.pattern(Kind::BeginComment)?;
    let mut depth = 1usize;
    let mut i = open.end;
    while i < source.len() {
        let rest = &source[i..];
        if rest.starts_with(begin) {
            depth += 1;
            i += begin.len();
        } else if let Some(close) = searcher.end_at(source, i, Kind::EndComment) {
            depth -= 1;
            if depth == 0 {
                return Some((close.end, close.ws));
            }
            i = close.end;
        } else {
            i += rest.chars().next().map_or(1, char::len_utf8);
        }
    }
    None
}

/// Finds the start of the `{% endraw %}` tag that terminates a raw block
/// whose content starts at `at`.
///
/// Everything before it is verbatim text, including anything that looks like
/// a delimiter. Any modifier variant of the end tag is accepted.
pub fn raw_end(searcher: &Searcher, source: &str, at: usize) -> Option<usize> {
    let mut i = at;
    while let Some(delim) = searcher.find_begin(source, i) {
        if delim.kind == Kind::BeginBlock && is_endraw(searcher, source, delim.end) {
            return Some(delim.start);
        }
        i = delim.start + source[delim.start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// Whether the text at `at` is the body and end delimiter of an `endraw` tag.
fn is_endraw(searcher: &Searcher, source: &str, at: usize) -> bool {
    let i = skip_whitespace(source, at);
    match source[i..].strip_prefix("endraw") {
        Some(_) => {
            let j = skip_whitespace(source, i + "endraw".len());
            searcher.end_at(source, j, Kind::EndBlock).is_some()
        }
        None => false,
    }
}

fn skip_whitespace(source: &str, at: usize) -> usize {
    let rest = &source[at..];
    at + (rest.len() - rest.trim_start().len())
}
