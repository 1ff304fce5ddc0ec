use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use crate::compile::scan;
use crate::compile::search::Searcher;
use crate::types::ast::{NumKind, Whitespace, Ws};
use crate::types::span::Span;
use crate::types::syntax::Kind;
use crate::{Error, ErrorKind, Expected, LexError, Result};

/// A lexer that tokenizes the template source into distinct chunks so that the
/// parser doesn't have to operate on raw text.
///
/// The lexer is implemented as a fallible iterator. The parser should
/// repeatedly call the [`.next()?`][Lexer::next] method to return the next
/// non-whitespace token until [`None`] is returned.
///
/// Every error leaves the lexer in a position from which lexing can continue:
/// either the cursor moved forward or the lexer went back to the template
/// state.
pub struct Lexer<'p, 'source> {
    /// The delimiter searcher for the configured syntax.
    searcher: &'p Searcher,

    /// The original template source.
    pub source: &'source str,

    /// A cursor over the template source.
    cursor: usize,

    /// The current state of the lexer.
    state: State,
}

/// The state of the lexer.
///
/// The lexer requires state because the tokenization is different when
/// tokenizing text between expression and block syntax, e.g. `{{ expr }}`,
/// `{% if cond %}`, and inside a raw block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Within template content.
    Template,

    /// Between expression or block delimiters.
    Tag {
        /// The end delimiter we are expecting.
        end: Kind,
        /// Whether the previous token was a `.`, in which case a number is a
        /// tuple index and not a literal.
        after_dot: bool,
    },

    /// Directly after a `{% raw %}` tag.
    Raw,
}

/// The unit yielded by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Token {
    /// Template content
    Content,
    /// A whole comment, e.g. `{# a {# b #} #}`
    Comment,
    /// The verbatim text inside a raw block
    RawText,
    /// Begin expression tag, e.g. `{{`
    BeginExpr,
    /// End expression tag, e.g. `}}`
    EndExpr,
    /// Begin block tag, e.g. `{%`
    BeginBlock,
    /// End block tag, e.g. `%}`
    EndBlock,
    /// Any Unicode whitespace
    Whitespace,
    /// A variable, field or filter name
    Ident,
    /// A macro name followed by `!`, e.g. `format!`
    MacroName,
    /// A keyword like `if` or `for`
    Keyword(Keyword),
    /// An integer or float literal, e.g. `19`, `0b1011`, `1_000u32` or `2.5e3`
    Number,
    /// A string literal, e.g. `"Hello World!\n"`
    Str,
    /// A character literal, e.g. `'a'`
    Char,
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// `..=`
    DotDotEq,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `::`
    PathSep,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `|`
    Pipe,
    /// `||`
    OrOr,
    /// `&&`
    AndAnd,
    /// `&`
    Amp,
    /// `!`
    Bang,
    /// `?`
    Question,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `~`
    Tilde,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `==`
    EqEq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `=`
    Eq,
}

macro_rules! keywords {
    ($($variant:ident => $text:literal,)+) => {
        /// A word with a special meaning inside tags.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub enum Keyword {
            $($variant,)+
        }

        impl Keyword {
            pub fn all() -> &'static [Keyword] {
                &[$(Keyword::$variant,)+]
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)+
                }
            }

            pub fn from_ident(s: &str) -> Option<Self> {
                match s {
                    $($text => Some(Keyword::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

keywords! {
    Block => "block",
    EndBlock => "endblock",
    Extends => "extends",
    Include => "include",
    Import => "import",
    As => "as",
    Let => "let",
    Set => "set",
    Mut => "mut",
    For => "for",
    In => "in",
    EndFor => "endfor",
    Break => "break",
    Continue => "continue",
    If => "if",
    Else => "else",
    Elif => "elif",
    EndIf => "endif",
    Match => "match",
    EndMatch => "endmatch",
    When => "when",
    EndWhen => "endwhen",
    Macro => "macro",
    EndMacro => "endmacro",
    Call => "call",
    EndCall => "endcall",
    Filter => "filter",
    EndFilter => "endfilter",
    Raw => "raw",
    EndRaw => "endraw",
    Is => "is",
    Not => "not",
    Defined => "defined",
    With => "with",
    Or => "or",
    Xor => "xor",
    BitAnd => "bitand",
    BitOr => "bitor",
    True => "true",
    False => "false",
}

impl<'p, 'source> Lexer<'p, 'source> {
    /// Construct a new lexer.
    pub fn new(searcher: &'p Searcher, source: &'source str) -> Self {
        Self {
            searcher,
            source,
            cursor: 0,
            state: State::Template,
        }
    }

    /// Returns the next non-whitespace token and its span.
    pub fn next(&mut self) -> Result<Option<(Token, Span)>> {
        loop {
            match self.lex()? {
                Some((Token::Whitespace, _)) => continue,
                next => return Ok(next),
            }
        }
    }

    /// The current position in the template source.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the lexer is between the delimiters of a tag.
    pub fn in_tag(&self) -> bool {
        matches!(self.state, State::Tag { .. })
    }

    /// Switches to scanning the verbatim body of a raw block.
    ///
    /// Must be called directly after the end delimiter of the `raw` tag.
    pub fn enter_raw(&mut self) {
        self.state = State::Raw;
    }

    /// Skips the rest of the current tag.
    ///
    /// Stops after the end delimiter, before a begin delimiter or at the end
    /// of the input, whichever comes first. Errors are discarded.
    pub fn skip_tag(&mut self) {
        while self.in_tag() {
            match self.lex() {
                Ok(Some(_)) | Err(_) => {}
                Ok(None) => self.state = State::Template,
            }
        }
    }

    /// Returns the whitespace modifier on the begin or end delimiter token.
    pub fn delim_ws(&self, tk: Token, span: Span) -> Option<Whitespace> {
        match tk {
            Token::BeginExpr | Token::BeginBlock => {
                self.searcher.begin_at(self.source, span.m)?.ws
            }
            Token::EndExpr => self.searcher.end_at(self.source, span.m, Kind::EndExpr)?.ws,
            Token::EndBlock => self.searcher.end_at(self.source, span.m, Kind::EndBlock)?.ws,
            _ => None,
        }
    }

    /// Returns the whitespace modifiers of a comment token.
    pub fn comment_ws(&self, span: Span, terminated: bool) -> Ws {
        let open = match self.searcher.begin_at(self.source, span.m) {
            Some(open) => open,
            None => return Ws::default(),
        };
        if !terminated {
            return Ws(open.ws, None);
        }
        let close = self.searcher.pattern(Kind::EndComment).and_then(|end| {
            let at = span.n.checked_sub(end.len() + 1)?;
            if at < open.end {
                return None;
            }
            self.searcher.end_at(self.source, at, Kind::EndComment)?.ws
        });
        Ws(open.ws, close)
    }

    /// Returns the next token and span.
    fn lex(&mut self) -> Result<Option<(Token, Span)>> {
        let i = self.cursor;

        match self.state {
            State::Raw => self.lex_raw(i).map(Some),
            _ if i >= self.source.len() => Ok(None),
            State::Template => self.lex_template(i).map(Some),
            State::Tag { end, after_dot } => self.lex_tag(end, after_dot, i).map(Some),
        }
    }

    fn lex_template(&mut self, i: usize) -> Result<(Token, Span)> {
        let delim = match self.searcher.begin_at(self.source, i) {
            Some(delim) => delim,
            None => {
                // Template content runs up to the next begin delimiter.
                //
                // xxxxxxx{{xxxxxxxxx
                //    ^   ^
                //    i   j
                let j = self
                    .searcher
                    .find_begin(self.source, i)
                    .map_or(self.source.len(), |d| d.start);
                self.cursor = j;
                return Ok((Token::Content, Span::new(i, j)));
            }
        };

        match delim.kind {
            Kind::BeginComment => match scan::comment(self.searcher, self.source, delim) {
                Some((j, _)) => {
                    self.cursor = j;
                    Ok((Token::Comment, Span::new(i, j)))
                }
                None => {
                    self.cursor = self.source.len();
                    Err(Error::new(
                        ErrorKind::UnterminatedComment,
                        "unclosed comment",
                        Span::new(i, delim.end),
                    ))
                }
            },
            kind => {
                self.cursor = delim.end;
                self.state = State::Tag {
                    end: kind.pair(),
                    after_dot: false,
                };
                let tk = match kind {
                    Kind::BeginExpr => Token::BeginExpr,
                    _ => Token::BeginBlock,
                };
                Ok((tk, Span::new(i, delim.end)))
            }
        }
    }

    fn lex_raw(&mut self, i: usize) -> Result<(Token, Span)> {
        self.state = State::Template;
        match scan::raw_end(self.searcher, self.source, i) {
            Some(j) => {
                self.cursor = j;
                Ok((Token::RawText, Span::new(i, j)))
            }
            None => {
                self.cursor = self.source.len();
                Err(Error::new(
                    ErrorKind::UnterminatedRawBlock,
                    "unclosed raw block",
                    Span::new(i, self.source.len()),
                ))
            }
        }
    }

    fn lex_tag(&mut self, end: Kind, after_dot: bool, i: usize) -> Result<(Token, Span)> {
        // The end delimiter takes priority over operators so that `%}` is
        // never lexed as `%` followed by `}`.
        if let Some(delim) = self.searcher.end_at(self.source, i, end) {
            self.cursor = delim.end;
            self.state = State::Template;
            let tk = match end {
                Kind::EndExpr => Token::EndExpr,
                _ => Token::EndBlock,
            };
            return Ok((tk, Span::new(i, delim.end)));
        }

        // A begin delimiter means the current tag was never closed. The
        // cursor stays put so that the delimiter is lexed again as the start
        // of the next node.
        if let Some(delim) = self.searcher.begin_at(self.source, i) {
            self.state = State::Template;
            let expected = match end {
                Kind::EndExpr => Token::EndExpr,
                _ => Token::EndBlock,
            };
            let found = match delim.kind {
                Kind::BeginExpr => Token::BeginExpr,
                Kind::BeginBlock => Token::BeginBlock,
                _ => Token::Comment,
            };
            return Err(Error::unexpected(
                vec![Expected::Token(expected)],
                Some(found),
                Span::new(i, delim.end),
            ));
        }

        let source = self.source;
        let rest = &source[i..];
        let mut chars = rest.chars();
        let c = match chars.next() {
            Some(c) => c,
            None => return Err(Error::lex(LexError::UnexpectedCharacter, Span::empty(i))),
        };
        let c2 = chars.next();
        let c3 = chars.next();

        let (tk, len) = match (c, c2, c3) {
            ('.', Some('.'), Some('=')) => (Token::DotDotEq, 3),
            ('.', Some('.'), _) => (Token::DotDot, 2),
            ('.', _, _) => (Token::Dot, 1),
            (',', _, _) => (Token::Comma, 1),
            (':', Some(':'), _) => (Token::PathSep, 2),
            (':', _, _) => (Token::Colon, 1),
            ('(', _, _) => (Token::LParen, 1),
            (')', _, _) => (Token::RParen, 1),
            ('[', _, _) => (Token::LBracket, 1),
            (']', _, _) => (Token::RBracket, 1),
            ('{', _, _) => (Token::LBrace, 1),
            ('}', _, _) => (Token::RBrace, 1),
            ('|', Some('|'), _) => (Token::OrOr, 2),
            ('|', _, _) => (Token::Pipe, 1),
            ('&', Some('&'), _) => (Token::AndAnd, 2),
            ('&', _, _) => (Token::Amp, 1),
            ('!', Some('='), _) => (Token::Ne, 2),
            ('!', _, _) => (Token::Bang, 1),
            ('=', Some('='), _) => (Token::EqEq, 2),
            ('=', _, _) => (Token::Eq, 1),
            ('<', Some('<'), _) => (Token::Shl, 2),
            ('<', Some('='), _) => (Token::Le, 2),
            ('<', _, _) => (Token::Lt, 1),
            ('>', Some('>'), _) => (Token::Shr, 2),
            ('>', Some('='), _) => (Token::Ge, 2),
            ('>', _, _) => (Token::Gt, 1),
            ('?', _, _) => (Token::Question, 1),
            ('*', _, _) => (Token::Star, 1),
            ('/', _, _) => (Token::Slash, 1),
            ('%', _, _) => (Token::Percent, 1),
            ('+', _, _) => (Token::Plus, 1),
            ('-', _, _) => (Token::Minus, 1),
            ('~', _, _) => (Token::Tilde, 1),
            ('"', _, _) => self.lex_string(end, i)?,
            ('\'', _, _) => self.lex_char(end, i)?,
            (c, _, _) if c.is_ascii_digit() => match after_dot {
                true => (Token::Number, lex_while(rest, |c| c.is_ascii_digit())),
                false => self.lex_number(i)?,
            },
            (c, _, _) if c.is_whitespace() => (Token::Whitespace, lex_while(rest, char::is_whitespace)),
            (c, _, _) if is_ident_start(c) => lex_ident_or_keyword(rest),
            (c, _, _) => {
                let j = i + c.len_utf8();
                self.cursor = j;
                return Err(Error::lex(LexError::UnexpectedCharacter, Span::new(i, j)));
            }
        };

        let j = i + len;
        self.cursor = j;
        self.state = State::Tag {
            end,
            after_dot: tk == Token::Dot || (after_dot && tk == Token::Whitespace),
        };
        Ok((tk, Span::new(i, j)))
    }

    /// Lexes a string literal starting at the opening quote.
    ///
    /// Escapes are checked here so that the parser can rely on them being
    /// valid.
    fn lex_string(&mut self, end: Kind, i: usize) -> Result<(Token, usize)> {
        let j = self.lex_quoted(end, i, '"', LexError::UnterminatedString)?;
        if let Err(esc) = unescape(&self.source[i + 1..j - 1], false) {
            return Err(Error::lex(
                LexError::InvalidEscape,
                Span::new(i + 1 + esc.start, i + 1 + esc.end),
            ));
        }
        Ok((Token::Str, j - i))
    }

    /// Lexes a character literal starting at the opening quote.
    fn lex_char(&mut self, end: Kind, i: usize) -> Result<(Token, usize)> {
        let j = self.lex_quoted(end, i, '\'', LexError::UnterminatedChar)?;
        let body = &self.source[i + 1..j - 1];
        match unescape(body, true) {
            Ok(value) if value.chars().count() == 1 => Ok((Token::Char, j - i)),
            Ok(value) if value.is_empty() => Err(Error::lex(LexError::EmptyChar, Span::new(i, j))),
            Ok(_) => Err(Error::lex(LexError::UnterminatedChar, Span::new(i, j))),
            Err(esc) => Err(Error::lex(
                LexError::InvalidEscape,
                Span::new(i + 1 + esc.start, i + 1 + esc.end),
            )),
        }
    }

    /// Finds the closing quote of a quoted literal, returning the offset just
    /// past it. The cursor is always moved forward.
    fn lex_quoted(&mut self, end: Kind, i: usize, quote: char, kind: LexError) -> Result<usize> {
        let source = self.source;
        let mut iter = source[i + 1..].char_indices().map(|(d, c)| (i + 1 + d, c));
        let mut escaped = false;
        loop {
            match iter.next() {
                None => return Err(self.err_unterminated(end, i, source.len(), kind)),
                Some((j, '\r' | '\n')) => return Err(self.err_unterminated(end, i, j, kind)),
                Some((j, c)) if c == quote && !escaped => {
                    self.cursor = j + 1;
                    return Ok(j + 1);
                }
                Some((_, c)) => {
                    escaped = c == '\\' && !escaped;
                }
            }
        }
    }

    /// Reports a quoted literal starting at `i` that is not closed before
    /// `limit`.
    ///
    /// The literal is cut at the first end delimiter of the tag so that the
    /// tag still closes there.
    fn err_unterminated(&mut self, end: Kind, i: usize, limit: usize, kind: LexError) -> Error {
        let stop = self.source[i + 1..limit]
            .char_indices()
            .map(|(d, _)| i + 1 + d)
            .find(|&k| self.searcher.end_at(self.source, k, end).is_some())
            .unwrap_or(limit);
        self.cursor = stop;
        let n = i + 1 + self.source[i + 1..stop].trim_end().len();
        Error::lex(kind, Span::new(i, n))
    }

    /// Lexes a number literal, including any radix prefix, fraction, exponent
    /// and type suffix.
    fn lex_number(&mut self, i: usize) -> Result<(Token, usize)> {
        let rest = &self.source[i..];
        let len = number_len(rest);
        match split_number(&rest[..len]) {
            Some(_) => Ok((Token::Number, len)),
            None => {
                self.cursor = i + len;
                Err(Error::lex(LexError::InvalidNumber, Span::new(i, i + len)))
            }
        }
    }
}

impl Token {
    pub fn human(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Comment => "comment",
            Self::RawText => "raw text",
            Self::BeginExpr => "begin expression",
            Self::EndExpr => "end expression",
            Self::BeginBlock => "begin block",
            Self::EndBlock => "end block",
            Self::Whitespace => "whitespace",
            Self::Ident => "identifier",
            Self::MacroName => "macro name",
            Self::Keyword(_) => "keyword",
            Self::Number => "number",
            Self::Str => "string",
            Self::Char => "character",
            Self::Dot => "member access operator",
            Self::DotDot => "`..`",
            Self::DotDotEq => "`..=`",
            Self::Comma => "comma",
            Self::Colon => "colon",
            Self::PathSep => "`::`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::LBrace => "`{`",
            Self::RBrace => "`}`",
            Self::Pipe => "pipe",
            Self::OrOr => "`||`",
            Self::AndAnd => "`&&`",
            Self::Amp => "`&`",
            Self::Bang => "`!`",
            Self::Question => "`?`",
            Self::Star => "`*`",
            Self::Slash => "`/`",
            Self::Percent => "`%`",
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Tilde => "`~`",
            Self::Shl => "`<<`",
            Self::Shr => "`>>`",
            Self::EqEq => "`==`",
            Self::Ne => "`!=`",
            Self::Lt => "`<`",
            Self::Le => "`<=`",
            Self::Gt => "`>`",
            Self::Ge => "`>=`",
            Self::Eq => "`=`",
        }
    }

    pub(crate) fn is_end_tag(&self) -> bool {
        matches!(self, Self::EndExpr | Self::EndBlock)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(kw) => write!(f, "keyword `{kw}`"),
            tk => f.write_str(tk.human()),
        }
    }
}

impl Keyword {
    /// Whether the keyword can never be used as an identifier.
    ///
    /// The remaining keywords only have a special meaning at the start of a
    /// tag or in a specific position, so they are accepted as variable and
    /// field names elsewhere.
    pub fn is_reserved(self) -> bool {
        matches!(
            self,
            Self::As
                | Self::Mut
                | Self::In
                | Self::Is
                | Self::Not
                | Self::With
                | Self::Or
                | Self::Xor
                | Self::BitAnd
                | Self::BitOr
                | Self::True
                | Self::False
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const INT_SUFFIXES: &[&str] = &[
    "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64", "i128", "isize",
];

/// Validates a number literal and splits it into its kind and the offset at
/// which the type suffix starts.
///
/// Returns `None` if the literal is malformed.
pub(crate) fn split_number(raw: &str) -> Option<(NumKind, usize)> {
    let radix = match raw.as_bytes() {
        [b'0', b'x', ..] => 16,
        [b'0', b'o', ..] => 8,
        [b'0', b'b', ..] => 2,
        [b'0'..=b'9', ..] => 10,
        _ => return None,
    };

    if radix != 10 {
        let digits = &raw[2..];
        let n = match radix {
            16 => lex_while(digits, |c| c.is_ascii_hexdigit() || c == '_'),
            _ => lex_while(digits, |c| c.is_ascii_digit() || c == '_'),
        };
        let (digits, suffix) = digits.split_at(n);
        let valid = digits.chars().any(|c| c != '_')
            && digits.chars().all(|c| c == '_' || c.to_digit(radix).is_some());
        return (valid && (suffix.is_empty() || INT_SUFFIXES.contains(&suffix)))
            .then(|| (NumKind::Int, 2 + n));
    }

    let is_digit = |c: char| c.is_ascii_digit() || c == '_';
    let mut kind = NumKind::Int;
    let mut end = lex_while(raw, is_digit);

    if let Some(frac) = raw[end..].strip_prefix('.') {
        if !frac.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        end += 1 + lex_while(frac, is_digit);
        kind = NumKind::Float;
    }

    if let Some(exp) = raw[end..].strip_prefix(|c: char| c == 'e' || c == 'E') {
        let sign = usize::from(exp.starts_with(|c: char| c == '+' || c == '-'));
        let n = lex_while(&exp[sign..], is_digit);
        if !exp[sign..sign + n].chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        end += 1 + sign + n;
        kind = NumKind::Float;
    }

    match &raw[end..] {
        "" => Some((kind, end)),
        "f32" | "f64" => Some((NumKind::Float, end)),
        suffix if kind == NumKind::Int && INT_SUFFIXES.contains(&suffix) => Some((kind, end)),
        _ => None,
    }
}

/// Returns the length of the number literal at the start of `s`.
///
/// This is deliberately greedy over alphanumeric characters so that a
/// malformed literal such as `12ab` is reported as one invalid number.
fn number_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let decimal = !matches!(bytes, [b'0', b'x' | b'o' | b'b', ..]);
    let mut plain = true;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match b {
            b'0'..=b'9' | b'_' => i += 1,
            b'.' if decimal && plain && next.map_or(false, |b| b.is_ascii_digit()) => {
                plain = false;
                i += 1;
            }
            b'e' | b'E'
                if decimal
                    && matches!(next, Some(b'+' | b'-'))
                    && bytes.get(i + 2).map_or(false, u8::is_ascii_digit) =>
            {
                plain = false;
                i += 2;
            }
            b if b.is_ascii_alphanumeric() => {
                plain = false;
                i += 1;
            }
            _ => break,
        }
    }
    i
}

/// Resolves the escapes in the body of a string or character literal.
///
/// Returns the byte range of the first invalid escape on failure. The
/// `\uXXXX` form without braces is only accepted in character literals.
pub(crate) fn unescape(body: &str, is_char: bool) -> std::result::Result<Cow<'_, str>, Range<usize>> {
    if !body.contains('\\') {
        return Ok(Cow::Borrowed(body));
    }

    let mut out = String::with_capacity(body.len());
    let mut iter = body.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let (_, e) = iter.next().ok_or(i..body.len())?;
        let value = match e {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '\\' => '\\',
            '0' => '\0',
            '"' => '"',
            '\'' => '\'',
            'x' => {
                let hex = body.get(i + 2..i + 4).ok_or(i..body.len())?;
                let value = u8::from_str_radix(hex, 16)
                    .ok()
                    .filter(|v| *v <= 0x7f && hex.bytes().all(|b| b.is_ascii_hexdigit()))
                    .ok_or(i..i + 4)?;
                iter.next();
                iter.next();
                char::from(value)
            }
            'u' if iter.peek().map(|&(_, c)| c) == Some('{') => {
                let close = body[i..].find('}').map(|d| i + d).ok_or(i..body.len())?;
                let hex = &body[i + 3..close];
                let value = (!hex.is_empty() && hex.len() <= 6)
                    .then(|| u32::from_str_radix(hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or(i..close + 1)?;
                while iter.next_if(|&(j, _)| j <= close).is_some() {}
                value
            }
            'u' if is_char => {
                let hex = body.get(i + 2..i + 6).ok_or(i..body.len())?;
                let value = hex
                    .bytes()
                    .all(|b| b.is_ascii_hexdigit())
                    .then(|| u32::from_str_radix(hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or(i..i + 6)?;
                for _ in 0..4 {
                    iter.next();
                }
                value
            }
            e => return Err(i..i + 1 + e.len_utf8()),
        };
        out.push(value);
    }
    Ok(Cow::Owned(out))
}

fn lex_ident_or_keyword(s: &str) -> (Token, usize) {
    let first = s.chars().next().map_or(0, char::len_utf8);
    let n = first + lex_while(&s[first..], is_ident);
    let word = &s[..n];
    let rest = &s[n..];
    match Keyword::from_ident(word) {
        Some(kw) => (Token::Keyword(kw), n),
        None if rest.starts_with('!') && !rest.starts_with("!=") => (Token::MacroName, n + 1),
        None => (Token::Ident, n),
    }
}

/// Returns the length of the prefix of `s` matching the predicate.
fn lex_while<P>(s: &str, pred: P) -> usize
where
    P: Fn(char) -> bool,
{
    s.find(|c| !pred(c)).unwrap_or(s.len())
}

#[cfg(feature = "unicode")]
fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

#[cfg(feature = "unicode")]
fn is_ident(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

#[cfg(not(feature = "unicode"))]
fn is_ident_start(c: char) -> bool {
    matches!(c, 'A'..='Z' | 'a'..='z' | '_')
}

#[cfg(not(feature = "unicode"))]
fn is_ident(c: char) -> bool {
    matches!(c, '0'..='9' | 'A'..='Z' | 'a'..='z' | '_')
}
