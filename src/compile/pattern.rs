use crate::compile::lex::{Keyword, Token};
use crate::compile::parse::{is_ident, Parser};
use crate::types::ast::*;
use crate::types::span::Span;
use crate::{Expected, Result};

impl<'p, 'source> Parser<'p, 'source> {
    /// Parses a pattern with optional `|` or `or` alternatives.
    pub(super) fn parse_pattern(&mut self) -> Result<Pattern<'source>> {
        self.enter()?;
        let mut alts = vec![self.parse_pattern_atom()?];
        while self.eat(Token::Pipe)?.is_some() || self.eat_keyword(Keyword::Or)?.is_some() {
            alts.push(self.parse_pattern_atom()?);
        }
        self.leave();

        if alts.len() == 1 {
            return Ok(alts.remove(0));
        }
        let span = alts[0].span.combine(alts[alts.len() - 1].span);
        Ok(Pattern {
            kind: PatternKind::Or(alts),
            span,
        })
    }

    /// Parses the pattern of a `when` tag, which may be followed by a `with`
    /// destructuring list, e.g. `Some with (x)`.
    pub(super) fn parse_when_pattern(&mut self) -> Result<Pattern<'source>> {
        let base = self.parse_pattern()?;
        if self.eat_keyword(Keyword::With)?.is_none() {
            return Ok(base);
        }
        let (close, open) = match self.next()? {
            Some((Token::LParen, span)) => (Token::RParen, span),
            Some((Token::LBracket, span)) => (Token::RBracket, span),
            found => {
                let expected = vec![
                    Expected::Token(Token::LParen),
                    Expected::Token(Token::LBracket),
                ];
                return Err(self.err_unexpected(expected, found));
            }
        };
        let (destructure, _, end) = self.parse_seq(close, Self::parse_pattern)?;
        let span = base.span.combine(open).combine(end);
        Ok(Pattern {
            kind: PatternKind::With {
                base: Box::new(base),
                destructure,
            },
            span,
        })
    }

    fn parse_pattern_atom(&mut self) -> Result<Pattern<'source>> {
        let (tk, span) = match self.next()? {
            Some(next) => next,
            None => return Err(self.err_unexpected(vec![Expected::Pattern], None)),
        };

        let kind = match tk {
            Token::Ident if &self.source()[span] == "_" => PatternKind::Placeholder,
            Token::DotDot => PatternKind::Rest,

            Token::Number | Token::Str | Token::Char | Token::Keyword(Keyword::True | Keyword::False) => {
                PatternKind::Lit(self.parse_lit(tk, span, false)?)
            }

            Token::Minus => {
                let (tk, num) = match self.next()? {
                    Some((Token::Number, num)) => (Token::Number, num),
                    found => {
                        return Err(self.err_unexpected(vec![Expected::Token(Token::Number)], found))
                    }
                };
                let lit = self.parse_lit(tk, num, true)?;
                return Ok(Pattern {
                    kind: PatternKind::Lit(lit),
                    span: span.combine(num),
                });
            }

            tk if is_ident(tk) => {
                let first = Ident {
                    name: &self.source()[span],
                    span,
                };
                return self.parse_path_pattern(false, vec![first], span);
            }

            Token::PathSep => {
                let first = self.parse_ident()?;
                return self.parse_path_pattern(true, vec![first], span);
            }

            Token::LParen => {
                let (mut elems, trailing, close) = self.parse_seq(Token::RParen, Self::parse_pattern)?;
                if elems.len() == 1 && !trailing {
                    return Ok(elems.remove(0));
                }
                return Ok(Pattern {
                    kind: PatternKind::Tuple(elems),
                    span: span.combine(close),
                });
            }

            Token::LBracket => {
                let (elems, _, close) = self.parse_seq(Token::RBracket, Self::parse_pattern)?;
                return Ok(Pattern {
                    kind: PatternKind::Slice(elems),
                    span: span.combine(close),
                });
            }

            tk => return Err(self.err_unexpected(vec![Expected::Pattern], Some((tk, span)))),
        };

        Ok(Pattern { kind, span })
    }

    /// Parses the rest of a pattern that starts with a name or path: a plain
    /// binding, a path, a tuple struct or a struct pattern.
    fn parse_path_pattern(
        &mut self,
        global: bool,
        mut segments: Vec<Ident<'source>>,
        start: Span,
    ) -> Result<Pattern<'source>> {
        while self.eat(Token::PathSep)?.is_some() {
            segments.push(self.parse_ident()?);
        }
        let end = segments.last().map_or(start, |seg| seg.span);
        let path = Path {
            global,
            segments,
            span: start.combine(end),
        };

        if self.eat(Token::LParen)?.is_some() {
            let (elems, _, close) = self.parse_seq(Token::RParen, Self::parse_pattern)?;
            let span = path.span.combine(close);
            return Ok(Pattern {
                kind: PatternKind::TupleStruct { path, elems },
                span,
            });
        }

        if self.eat(Token::LBrace)?.is_some() {
            let (fields, _, close) = self.parse_seq(Token::RBrace, Self::parse_field_pattern)?;
            let span = path.span.combine(close);
            return Ok(Pattern {
                kind: PatternKind::Struct { path, fields },
                span,
            });
        }

        let span = path.span;
        let kind = match (global, path.segments.as_slice()) {
            (false, [ident]) => PatternKind::Ident(ident.name),
            _ => PatternKind::Path(path),
        };
        Ok(Pattern { kind, span })
    }

    fn parse_field_pattern(&mut self) -> Result<FieldPattern<'source>> {
        if let Some(span) = self.eat(Token::DotDot)? {
            return Ok(FieldPattern::Rest(span));
        }
        let name = self.parse_ident()?;
        let pattern = match self.eat(Token::Colon)? {
            Some(_) => Some(self.parse_pattern()?),
            None => None,
        };
        Ok(FieldPattern::Field { name, pattern })
    }
}
