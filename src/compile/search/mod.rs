//! Delimiter search over the template source.
//!
//! Only a handful of short delimiters are configured, so a table of the
//! possible first bytes is enough to skip over plain text quickly. Matching
//! uses leftmost-longest semantics so that overlapping syntaxes such as `{`
//! and `{{` resolve to the longer delimiter.

use crate::types::ast::Whitespace;
use crate::types::syntax::{Kind, Syntax};

#[derive(Debug, Clone)]
pub struct Searcher {
    patterns: Vec<(Kind, String)>,
    /// Whether a byte can start any begin delimiter.
    first: [bool; 256],
}

/// A delimiter match in the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delim {
    pub kind: Kind,
    /// Start of the delimiter, including any leading modifier.
    pub start: usize,
    /// End of the delimiter, including any trailing modifier.
    pub end: usize,
    /// The whitespace modifier attached to the delimiter.
    pub ws: Option<Whitespace>,
}

impl Searcher {
    pub fn new(syntax: Syntax) -> Self {
        let mut first = [false; 256];
        for (kind, pattern) in &syntax.patterns {
            if kind.is_begin() {
                first[usize::from(pattern.as_bytes()[0])] = true;
            }
        }
        Self {
            patterns: syntax.patterns,
            first,
        }
    }

    /// Returns the delimiter string for the given kind, if configured.
    pub fn pattern(&self, kind: Kind) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, p)| p.as_str())
    }

    /// Finds the next begin delimiter at or after `at`.
    ///
    /// A modifier directly following the delimiter is included in the match.
    pub fn find_begin(&self, source: &str, at: usize) -> Option<Delim> {
        let bytes = source.as_bytes();
        (at..bytes.len())
            .filter(|&i| self.first[usize::from(bytes[i])])
            .find_map(|i| self.begin_at(source, i))
    }

    /// Returns the begin delimiter starting exactly at `at`, if any.
    pub fn begin_at(&self, source: &str, at: usize) -> Option<Delim> {
        let (kind, len) = self.longest_at(source, at, Kind::is_begin)?;
        let end = at + len;
        let ws = source[end..].chars().next().and_then(Whitespace::from_char);
        let end = end + usize::from(ws.is_some());
        Some(Delim {
            kind,
            start: at,
            end,
            ws,
        })
    }

    /// Returns the end delimiter of the given kind starting exactly at `at`,
    /// optionally preceded by a modifier.
    pub fn end_at(&self, source: &str, at: usize, kind: Kind) -> Option<Delim> {
        let pattern = self.pattern(kind)?;
        let rest = source.get(at..)?;
        let ws = rest.chars().next().and_then(Whitespace::from_char);
        if let Some(ws) = ws {
            if rest[1..].starts_with(pattern) {
                return Some(Delim {
                    kind,
                    start: at,
                    end: at + 1 + pattern.len(),
                    ws: Some(ws),
                });
            }
        }
        rest.starts_with(pattern).then(|| Delim {
            kind,
            start: at,
            end: at + pattern.len(),
            ws: None,
        })
    }

    /// Returns the kind and length of the longest pattern matching the filter
    /// that starts exactly at `at`.
    fn longest_at(&self, source: &str, at: usize, filter: fn(Kind) -> bool) -> Option<(Kind, usize)> {
        let rest = source.get(at..)?;
        self.patterns
            .iter()
            .filter(|(kind, p)| filter(*kind) && rest.starts_with(p.as_str()))
            .map(|(kind, p)| (*kind, p.len()))
            .max_by_key(|(_, len)| *len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_begin_default() {
        let searcher = Searcher::new(Syntax::default());
        let source = "lorem { ipsum {%- if %}";
        let delim = searcher.find_begin(source, 0).unwrap();
        assert_eq!(delim.kind, Kind::BeginBlock);
        assert_eq!(&source[delim.start..delim.end], "{%-");
        assert_eq!(delim.ws, Some(Whitespace::Suppress));
    }

    #[test]
    fn find_begin_overlapping_prefers_longest() {
        let syntax = Syntax::builder().expr("{", "}").block("{{", "}}").build();
        let searcher = Searcher::new(syntax);
        let delim = searcher.find_begin("ab {{ x }}", 0).unwrap();
        assert_eq!(delim.kind, Kind::BeginBlock);
        assert_eq!((delim.start, delim.end), (3, 5));
    }

    #[test]
    fn find_begin_none() {
        let searcher = Searcher::new(Syntax::default());
        assert_eq!(searcher.find_begin("plain { text } here", 0), None);
        assert_eq!(searcher.find_begin("{{", 1), None);
    }

    #[test]
    fn end_at_with_modifier() {
        let searcher = Searcher::new(Syntax::default());
        let delim = searcher.end_at("x ~%}", 2, Kind::EndBlock).unwrap();
        assert_eq!((delim.start, delim.end), (2, 5));
        assert_eq!(delim.ws, Some(Whitespace::Minimize));
        assert_eq!(searcher.end_at("x - %}", 2, Kind::EndBlock), None);
        assert_eq!(searcher.end_at("x }}", 2, Kind::EndBlock), None);
    }
}
