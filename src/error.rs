use std::cmp::max;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "unicode")]
use unicode_width::UnicodeWidthStr;

use crate::compile::lex::Token;
use crate::types::span::Span;

/// A convenient type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A diagnostic produced while parsing or validating a template.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    msg: String,
    span: Span,
    source: Option<Arc<str>>,
}

/// The category of an [`Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[non_exhaustive]
pub enum ErrorKind {
    /// A bad character, literal or escape inside a tag.
    Lex(LexError),
    /// A comment whose nesting depth never returned to zero.
    UnterminatedComment,
    /// A `{% raw %}` block without a matching `{% endraw %}`.
    UnterminatedRawBlock,
    /// The found token is not in the expected set at this position.
    UnexpectedToken {
        expected: Vec<Expected>,
        /// The token that was found, `None` at the end of input.
        found: Option<Token>,
    },
    /// Expressions or patterns nested deeper than the configured limit.
    RecursionLimitExceeded,
    /// An end tag without a matching opener or an opener without an end tag.
    ///
    /// Only produced by [`crate::validate`].
    UnbalancedTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LexError {
    UnexpectedCharacter,
    UnterminatedString,
    UnterminatedChar,
    EmptyChar,
    InvalidNumber,
    InvalidEscape,
}

/// Something the parser would have accepted at the error position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Expected {
    Token(Token),
    Identifier,
    Literal,
    Expression,
    Pattern,
    Statement,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, msg: impl Into<String>, span: impl Into<Span>) -> Self {
        Self {
            kind,
            msg: msg.into(),
            span: span.into(),
            source: None,
        }
    }

    pub(crate) fn lex(kind: LexError, span: impl Into<Span>) -> Self {
        let msg = match kind {
            LexError::UnexpectedCharacter => "unexpected character",
            LexError::UnterminatedString => "undelimited string",
            LexError::UnterminatedChar => "undelimited character",
            LexError::EmptyChar => "empty character literal",
            LexError::InvalidNumber => "invalid number literal",
            LexError::InvalidEscape => "unknown escape character",
        };
        Self::new(ErrorKind::Lex(kind), msg, span)
    }

    pub(crate) fn unexpected(expected: Vec<Expected>, found: Option<Token>, span: Span) -> Self {
        let mut msg = String::from("expected ");
        for (i, exp) in expected.iter().enumerate() {
            if i > 0 {
                msg.push_str(if i + 1 == expected.len() { " or " } else { ", " });
            }
            msg.push_str(&exp.to_string());
        }
        match found {
            Some(tk) => msg.push_str(&format!(", found {tk}")),
            None => msg.push_str(", found EOF"),
        }
        Self::new(ErrorKind::UnexpectedToken { expected, found }, msg, span)
    }

    /// Attaches the template source used for pretty printing.
    pub(crate) fn with_source(mut self, source: &Arc<str>) -> Self {
        self.source = Some(Arc::clone(source));
        self
    }

    /// The category of this error.
    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The human readable reason, without any location information.
    #[inline]
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// The region of the template source this error refers to.
    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.msg == other.msg && self.span == other.span
    }
}

impl Eq for Error {}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("Error", 3)?;
        s.serialize_field("kind", &self.kind)?;
        s.serialize_field("message", &self.msg)?;
        s.serialize_field("span", &self.span)?;
        s.end()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) if !source.is_empty() => fmt_pretty(&self.msg, source, self.span, f),
            _ => f
                .debug_struct("Error")
                .field("kind", &self.kind)
                .field("msg", &self.msg)
                .field("span", &self.span)
                .finish(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) if f.alternate() && !source.is_empty() => {
                fmt_pretty(&self.msg, source, self.span, f)
            }
            _ => write!(
                f,
                "{} between bytes {} and {}",
                self.msg, self.span.m, self.span.n
            ),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(tk) => write!(f, "{tk}"),
            Self::Identifier => f.write_str("identifier"),
            Self::Literal => f.write_str("literal"),
            Self::Expression => f.write_str("expression"),
            Self::Pattern => f.write_str("pattern"),
            Self::Statement => f.write_str("statement"),
        }
    }
}

fn fmt_pretty(msg: &str, source: &str, span: Span, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (line, start) = to_line(source, span.m);
    let code = source[start..]
        .split_terminator('\n')
        .next()
        .unwrap_or("")
        .trim_end_matches('\r');
    let col = width(&source[start..span.m]);
    let underlined = &source[span.m..max(span.m, span.n.min(start + code.len()))];
    let width = max(1, width(underlined));

    let num = (line + 1).to_string();
    let pad = num.len();
    let pipe = "|";
    let underline = "^".repeat(width);

    write!(
        f,
        "\n \
        {0:pad$} {pipe}\n \
        {num:>} {pipe} {code}\n \
        {0:pad$} {pipe} {underline:>width$} {msg}\n",
        "",
        pad = pad,
        pipe = pipe,
        num = num,
        code = code,
        underline = underline,
        width = col + width,
        msg = msg
    )
}

/// Returns the zero based line number containing `offset` and the byte offset
/// at which that line starts.
fn to_line(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count();
    let start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, start)
}

#[cfg(feature = "unicode")]
fn width(s: &str) -> usize {
    s.width()
}

#[cfg(not(feature = "unicode"))]
fn width(s: &str) -> usize {
    s.chars().count()
}
