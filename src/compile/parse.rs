use std::collections::VecDeque;

use crate::compile::lex::{self, Keyword, Lexer, Token};
use crate::compile::search::Searcher;
use crate::types::ast::*;
use crate::types::span::Span;
use crate::{Error, ErrorKind, Expected, LexError, Result};

/// A parser that constructs an AST from a token stream.
///
/// The parser never gives up on a template. A tag that fails to parse is
/// recorded as a diagnostic and replaced by [`Node::Error`], then parsing
/// resumes after the end delimiter of that tag.
pub struct Parser<'p, 'source> {
    /// A lexer that tokenizes the template source.
    pub(super) tokens: Lexer<'p, 'source>,

    /// Tokens that have been lexed but not consumed yet.
    peeked: VecDeque<(Token, Span)>,

    /// The span of the last consumed token.
    last: Span,

    /// The span of the end delimiter if the current tag has been closed.
    closed: Option<Span>,

    /// The current expression and pattern nesting depth.
    depth: usize,

    /// The maximum nesting depth.
    recursion_limit: usize,

    /// The diagnostics collected so far.
    errors: Vec<Error>,
}

impl<'p, 'source> Parser<'p, 'source> {
    /// Construct a new parser.
    pub fn new(searcher: &'p Searcher, source: &'source str, recursion_limit: usize) -> Self {
        Self {
            tokens: Lexer::new(searcher, source),
            peeked: VecDeque::new(),
            last: Span::empty(0),
            closed: None,
            depth: 0,
            recursion_limit,
            errors: Vec::new(),
        }
    }

    /// Parses the template into a flat list of nodes.
    ///
    /// The node spans are contiguous and cover the whole source.
    pub fn parse_template(mut self) -> (Template<'source>, Vec<Error>) {
        let mut nodes = Vec::new();

        loop {
            let start = self.tokens.cursor();
            let next = match self.next() {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(err) => {
                    let span = Span::new(start, self.tokens.cursor());
                    let node = match err.kind() {
                        ErrorKind::UnterminatedComment => Node::Comment(Comment {
                            ws: self.tokens.comment_ws(span, false),
                            span,
                        }),
                        ErrorKind::UnterminatedRawBlock => Node::Raw(Raw {
                            text: &self.source()[span],
                            span,
                        }),
                        _ => Node::Error(span),
                    };
                    self.errors.push(err);
                    if span.is_empty() {
                        break;
                    }
                    nodes.push(node);
                    continue;
                }
            };

            match next {
                (Token::Content, span) => nodes.push(Node::Content(Content {
                    text: &self.source()[span],
                    span,
                })),

                (Token::Comment, span) => nodes.push(Node::Comment(Comment {
                    ws: self.tokens.comment_ws(span, true),
                    span,
                })),

                (Token::RawText, span) => nodes.push(Node::Raw(Raw {
                    text: &self.source()[span],
                    span,
                })),

                (Token::BeginExpr, begin) => {
                    self.begin_tag();
                    let node = match self.parse_inline_expr(begin) {
                        Ok(expr) => Node::Expr(expr),
                        Err(err) => self.recover(begin, err),
                    };
                    nodes.push(node);
                }

                (Token::BeginBlock, begin) => {
                    self.begin_tag();
                    let node = match self.parse_tag(begin) {
                        Ok(tag) => Node::Tag(tag),
                        Err(err) => self.recover(begin, err),
                    };
                    nodes.push(node);
                }

                (tk, _) => unreachable!("lexer bug: unexpected {} in template", tk),
            }
        }

        (Template { nodes }, self.errors)
    }

    fn parse_inline_expr(&mut self, begin: Span) -> Result<InlineExpr<'source>> {
        let expr = self.parse_expr()?;
        let end = self.expect(Token::EndExpr)?;
        let ws = Ws(
            self.tokens.delim_ws(Token::BeginExpr, begin),
            self.tokens.delim_ws(Token::EndExpr, end),
        );
        Ok(InlineExpr {
            expr,
            ws,
            span: begin.combine(end),
        })
    }

    fn parse_tag(&mut self, begin: Span) -> Result<Tag<'source>> {
        let stmt = self.parse_stmt()?;
        let end = self.expect(Token::EndBlock)?;
        if stmt.kind == StmtKind::Raw {
            self.tokens.enter_raw();
        }
        let ws = Ws(
            self.tokens.delim_ws(Token::BeginBlock, begin),
            self.tokens.delim_ws(Token::EndBlock, end),
        );
        Ok(Tag {
            stmt,
            ws,
            span: begin.combine(end),
        })
    }

    fn begin_tag(&mut self) {
        self.closed = None;
        self.depth = 0;
    }

    /// Records the error and skips to the end of the tag that began at
    /// `begin`, returning the node that stands in for it.
    fn recover(&mut self, begin: Span, err: Error) -> Node<'source> {
        self.errors.push(err);

        let end = match self.closed.take() {
            Some(end) => end.n,
            None => {
                let mut end = None;
                while let Some((tk, span)) = self.peeked.pop_front() {
                    if tk.is_end_tag() {
                        end = Some(span.n);
                        break;
                    }
                }
                match end {
                    Some(end) => end,
                    None => {
                        self.tokens.skip_tag();
                        self.tokens.cursor()
                    }
                }
            }
        };
        self.peeked.clear();

        Node::Error(Span::new(begin.m, end))
    }

    ////////////////////////////////////////////////////////////////////////////
    // Statements
    ////////////////////////////////////////////////////////////////////////////

    fn parse_stmt(&mut self) -> Result<Stmt<'source>> {
        let (kw, span) = match self.next()? {
            Some((Token::Keyword(kw), span)) => (kw, span),
            found => return Err(self.err_unexpected(vec![Expected::Statement], found)),
        };

        let kind = match kw {
            Keyword::Block => StmtKind::Block(self.parse_ident()?),
            Keyword::EndBlock => StmtKind::EndBlock(self.parse_opt_ident()?),
            Keyword::Extends => StmtKind::Extends(self.parse_str()?),
            Keyword::Include => StmtKind::Include(self.parse_str()?),
            Keyword::Import => {
                let path = self.parse_str()?;
                self.expect_keyword(Keyword::As)?;
                let alias = self.parse_ident()?;
                StmtKind::Import(Import { path, alias })
            }
            Keyword::Let | Keyword::Set => {
                let keyword = match kw {
                    Keyword::Let => LetKeyword::Let,
                    _ => LetKeyword::Set,
                };
                let mutable = self.eat_keyword(Keyword::Mut)?.is_some();
                let pattern = self.parse_pattern()?;
                let value = match self.eat(Token::Eq)? {
                    Some(_) => Some(self.parse_expr()?),
                    None => None,
                };
                StmtKind::Let(Let {
                    keyword,
                    mutable,
                    pattern,
                    value,
                })
            }
            Keyword::For => {
                let pattern = self.parse_pattern()?;
                self.expect_keyword(Keyword::In)?;
                let iterable = self.parse_expr()?;
                let cond = match self.eat_keyword(Keyword::If)? {
                    Some(_) => Some(self.parse_expr()?),
                    None => None,
                };
                StmtKind::For(For {
                    pattern,
                    iterable,
                    cond,
                })
            }
            Keyword::EndFor => StmtKind::EndFor,
            Keyword::Break => StmtKind::Break,
            Keyword::Continue => StmtKind::Continue,
            Keyword::If => StmtKind::If(self.parse_cond()?),
            Keyword::Else => match self.eat_keyword(Keyword::If)? {
                Some(_) => StmtKind::ElseIf(self.parse_cond()?),
                None => StmtKind::Else,
            },
            Keyword::Elif => StmtKind::ElseIf(self.parse_cond()?),
            Keyword::EndIf => StmtKind::EndIf,
            Keyword::Match => StmtKind::Match(self.parse_expr()?),
            Keyword::EndMatch => StmtKind::EndMatch,
            Keyword::When => StmtKind::When(self.parse_when_pattern()?),
            Keyword::EndWhen => StmtKind::EndWhen,
            Keyword::Macro => {
                let name = self.parse_ident()?;
                self.expect(Token::LParen)?;
                let (params, _, _) = self.parse_seq(Token::RParen, Self::parse_param)?;
                StmtKind::Macro(MacroDef { name, params })
            }
            Keyword::EndMacro => StmtKind::EndMacro(self.parse_opt_ident()?),
            Keyword::Call => {
                let bindings = match self.eat(Token::LParen)? {
                    Some(_) => self.parse_seq(Token::RParen, Self::parse_ident)?.0,
                    None => Vec::new(),
                };
                let call = self.parse_expr()?;
                if !matches!(call.kind, ExprKind::Call { .. }) {
                    let found = self.peek()?;
                    return Err(self.err_unexpected(vec![Expected::Token(Token::LParen)], found));
                }
                StmtKind::Call(CallBlock { bindings, call })
            }
            Keyword::EndCall => StmtKind::EndCall,
            Keyword::Filter => {
                let mut filters = vec![self.parse_filter()?];
                while self.eat(Token::Pipe)?.is_some() {
                    filters.push(self.parse_filter()?);
                }
                StmtKind::Filter(FilterBlock { filters })
            }
            Keyword::EndFilter => StmtKind::EndFilter,
            Keyword::Raw => StmtKind::Raw,
            Keyword::EndRaw => StmtKind::EndRaw,
            _ => {
                return Err(self.err_unexpected(
                    vec![Expected::Statement],
                    Some((Token::Keyword(kw), span)),
                ))
            }
        };

        Ok(Stmt {
            kind,
            span: span.combine(self.last),
        })
    }

    /// Parses the condition of an `if` or `else if` tag.
    fn parse_cond(&mut self) -> Result<Cond<'source>> {
        match self.eat_keyword(Keyword::Let)? {
            Some(_) => {
                let pattern = self.parse_pattern()?;
                self.expect(Token::Eq)?;
                let value = self.parse_expr()?;
                Ok(Cond::Let { pattern, value })
            }
            None => Ok(Cond::Expr(self.parse_expr()?)),
        }
    }

    fn parse_param(&mut self) -> Result<Param<'source>> {
        let name = self.parse_ident()?;
        let default = match self.eat(Token::Eq)? {
            Some(_) => Some(self.parse_expr()?),
            None => None,
        };
        Ok(Param { name, default })
    }

    /// Parses a filter name with optional arguments, e.g. `truncate(10)`.
    pub(super) fn parse_filter(&mut self) -> Result<Filter<'source>> {
        let name = self.parse_ident()?;
        let args = match self.is_next(Token::LParen)? {
            true => Some(self.parse_args()?),
            false => None,
        };
        let span = match &args {
            Some(args) => name.span.combine(args.span),
            None => name.span,
        };
        Ok(Filter { name, args, span })
    }

    ////////////////////////////////////////////////////////////////////////////
    // Terminals
    ////////////////////////////////////////////////////////////////////////////

    /// Parses an identifier, also accepting the keywords that are not
    /// reserved.
    pub(super) fn parse_ident(&mut self) -> Result<Ident<'source>> {
        match self.next()? {
            Some((tk, span)) if is_ident(tk) => Ok(Ident {
                name: &self.source()[span],
                span,
            }),
            found => Err(self.err_unexpected(vec![Expected::Identifier], found)),
        }
    }

    fn parse_opt_ident(&mut self) -> Result<Option<Ident<'source>>> {
        match self.peek()? {
            Some((tk, _)) if is_ident(tk) => self.parse_ident().map(Some),
            _ => Ok(None),
        }
    }

    fn parse_str(&mut self) -> Result<Str<'source>> {
        match self.next()? {
            Some((Token::Str, span)) => Ok(Str {
                value: self.parse_str_value(span)?,
                span,
            }),
            found => Err(self.err_unexpected(vec![Expected::Token(Token::Str)], found)),
        }
    }

    /// Parses a literal token that has already been consumed.
    pub(super) fn parse_lit(&self, tk: Token, span: Span, negative: bool) -> Result<Lit<'source>> {
        match tk {
            Token::Str => self.parse_str_value(span).map(Lit::Str),
            Token::Char => {
                let raw = &self.source()[span];
                lex::unescape(&raw[1..raw.len() - 1], true)
                    .ok()
                    .and_then(|value| value.chars().next())
                    .map(Lit::Char)
                    .ok_or_else(|| Error::lex(LexError::InvalidEscape, span))
            }
            Token::Number => {
                let raw = &self.source()[span];
                let (kind, at) = lex::split_number(raw)
                    .ok_or_else(|| Error::lex(LexError::InvalidNumber, span))?;
                Ok(Lit::Num(Num {
                    raw,
                    kind,
                    suffix: (at < raw.len()).then(|| &raw[at..]),
                    negative,
                }))
            }
            Token::Keyword(Keyword::True) => Ok(Lit::Bool(true)),
            Token::Keyword(Keyword::False) => Ok(Lit::Bool(false)),
            tk => Err(Error::unexpected(vec![Expected::Literal], Some(tk), span)),
        }
    }

    fn parse_str_value(&self, span: Span) -> Result<std::borrow::Cow<'source, str>> {
        let raw = &self.source()[span];
        lex::unescape(&raw[1..raw.len() - 1], false).map_err(|esc| {
            let m = span.m + 1;
            Error::lex(LexError::InvalidEscape, Span::new(m + esc.start, m + esc.end))
        })
    }

    ////////////////////////////////////////////////////////////////////////////
    // Nesting
    ////////////////////////////////////////////////////////////////////////////

    /// Enters one level of expression or pattern nesting.
    pub(super) fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.recursion_limit {
            let span = match self.peek()? {
                Some((_, span)) => span,
                None => self.eof(),
            };
            return Err(Error::new(
                ErrorKind::RecursionLimitExceeded,
                format!("nesting exceeds the recursion limit of {}", self.recursion_limit),
                span,
            ));
        }
        Ok(())
    }

    pub(super) fn leave(&mut self) {
        self.depth -= 1;
    }

    ////////////////////////////////////////////////////////////////////////////
    // Token helpers
    ////////////////////////////////////////////////////////////////////////////

    /// Parses a comma separated sequence up to and including the `close`
    /// token, the open token must already be consumed.
    ///
    /// Returns the items, whether there was a trailing comma and the span of
    /// the close token.
    pub(super) fn parse_seq<T, F>(&mut self, close: Token, mut f: F) -> Result<(Vec<T>, bool, Span)>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let mut items = Vec::new();
        let mut trailing = false;
        loop {
            if let Some(span) = self.eat(close)? {
                return Ok((items, trailing, span));
            }
            items.push(f(self)?);
            match self.next()? {
                Some((Token::Comma, _)) => trailing = true,
                Some((tk, span)) if tk == close => return Ok((items, false, span)),
                found => {
                    let expected = vec![Expected::Token(Token::Comma), Expected::Token(close)];
                    return Err(self.err_unexpected(expected, found));
                }
            }
        }
    }

    pub(super) fn expect(&mut self, exp: Token) -> Result<Span> {
        match self.next()? {
            Some((tk, span)) if tk == exp => Ok(span),
            found => Err(self.err_unexpected(vec![Expected::Token(exp)], found)),
        }
    }

    fn expect_keyword(&mut self, exp: Keyword) -> Result<Span> {
        self.expect(Token::Keyword(exp))
    }

    /// Consumes the next token if it is `exp`.
    pub(super) fn eat(&mut self, exp: Token) -> Result<Option<Span>> {
        match self.peek()? {
            Some((tk, span)) if tk == exp => {
                self.next()?;
                Ok(Some(span))
            }
            _ => Ok(None),
        }
    }

    pub(super) fn eat_keyword(&mut self, exp: Keyword) -> Result<Option<Span>> {
        self.eat(Token::Keyword(exp))
    }

    pub(super) fn is_next(&mut self, exp: Token) -> Result<bool> {
        Ok(self.peek()?.map_or(false, |(tk, _)| tk == exp))
    }

    pub(super) fn peek(&mut self) -> Result<Option<(Token, Span)>> {
        self.peek_nth(0)
    }

    /// Returns the token `n` positions ahead without consuming anything.
    ///
    /// Must not look past the end delimiter of the current tag.
    pub(super) fn peek_nth(&mut self, n: usize) -> Result<Option<(Token, Span)>> {
        while self.peeked.len() <= n {
            match self.tokens.next()? {
                Some(next) => self.peeked.push_back(next),
                None => return Ok(None),
            }
        }
        Ok(self.peeked.get(n).copied())
    }

    pub(super) fn next(&mut self) -> Result<Option<(Token, Span)>> {
        let next = match self.peeked.pop_front() {
            Some(next) => Some(next),
            None => self.tokens.next()?,
        };
        if let Some((tk, span)) = next {
            if tk.is_end_tag() {
                self.closed = Some(span);
            }
            self.last = span;
        }
        Ok(next)
    }

    pub(super) fn source(&self) -> &'source str {
        self.tokens.source
    }

    pub(super) fn eof(&self) -> Span {
        Span::empty(self.source().len())
    }

    pub(super) fn err_unexpected(&self, expected: Vec<Expected>, found: Option<(Token, Span)>) -> Error {
        match found {
            Some((tk, span)) => Error::unexpected(expected, Some(tk), span),
            None => Error::unexpected(expected, None, self.eof()),
        }
    }
}

/// Whether the token can be used as an identifier.
pub(super) fn is_ident(tk: Token) -> bool {
    match tk {
        Token::Ident => true,
        Token::Keyword(kw) => !kw.is_reserved(),
        _ => false,
    }
}
