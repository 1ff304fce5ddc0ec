//! Expression parsing.
//!
//! Binary operators are parsed by precedence climbing over the table in
//! [`infix`], everything tighter than the filter operator is handled by
//! dedicated unary, postfix and primary functions.

use crate::compile::lex::{Keyword, Token};
use crate::compile::parse::{is_ident, Parser};
use crate::types::ast::*;
use crate::types::span::Span;
use crate::{Error, ErrorKind, Expected, LexError, Result};

/// Binding power of the binary operators, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Or,
    And,
    Compare,
    BitOr,
    Xor,
    BitAnd,
    Shift,
    Additive,
    Concat,
    Multiplicative,
    Filter,
}

#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinOp),
    Filter,
}

impl Prec {
    fn tighter(self) -> Option<Self> {
        Some(match self {
            Self::Or => Self::And,
            Self::And => Self::Compare,
            Self::Compare => Self::BitOr,
            Self::BitOr => Self::Xor,
            Self::Xor => Self::BitAnd,
            Self::BitAnd => Self::Shift,
            Self::Shift => Self::Additive,
            Self::Additive => Self::Concat,
            Self::Concat => Self::Multiplicative,
            Self::Multiplicative => Self::Filter,
            Self::Filter => return None,
        })
    }
}

/// Returns the precedence and meaning of an infix operator token.
fn infix(tk: Token) -> Option<(Prec, Infix)> {
    let (prec, op) = match tk {
        Token::OrOr => (Prec::Or, BinOp::Or),
        Token::AndAnd => (Prec::And, BinOp::And),
        Token::EqEq => (Prec::Compare, BinOp::Eq),
        Token::Ne => (Prec::Compare, BinOp::Ne),
        Token::Lt => (Prec::Compare, BinOp::Lt),
        Token::Le => (Prec::Compare, BinOp::Le),
        Token::Gt => (Prec::Compare, BinOp::Gt),
        Token::Ge => (Prec::Compare, BinOp::Ge),
        Token::Keyword(Keyword::BitOr) => (Prec::BitOr, BinOp::BitOr),
        Token::Keyword(Keyword::Xor) => (Prec::Xor, BinOp::Xor),
        Token::Keyword(Keyword::BitAnd) => (Prec::BitAnd, BinOp::BitAnd),
        Token::Shl => (Prec::Shift, BinOp::Shl),
        Token::Shr => (Prec::Shift, BinOp::Shr),
        Token::Plus => (Prec::Additive, BinOp::Add),
        Token::Minus => (Prec::Additive, BinOp::Sub),
        Token::Tilde => (Prec::Concat, BinOp::Concat),
        Token::Star => (Prec::Multiplicative, BinOp::Mul),
        Token::Slash => (Prec::Multiplicative, BinOp::Div),
        Token::Percent => (Prec::Multiplicative, BinOp::Rem),
        Token::Pipe => return Some((Prec::Filter, Infix::Filter)),
        _ => return None,
    };
    Some((prec, Infix::Binary(op)))
}

impl<'p, 'source> Parser<'p, 'source> {
    /// Parses a full expression, including a range.
    pub(super) fn parse_expr(&mut self) -> Result<Expr<'source>> {
        self.enter()?;
        let expr = self.parse_range()?;
        self.leave();
        Ok(expr)
    }

    /// Ranges bind the loosest and do not chain, `a..b..c` is rejected at the
    /// second `..` by whatever comes after the expression.
    fn parse_range(&mut self) -> Result<Expr<'source>> {
        let start = match self.peek()? {
            Some((Token::DotDot | Token::DotDotEq, _)) => None,
            _ => Some(self.parse_binary(Prec::Or)?),
        };

        let (inclusive, op) = match self.peek()? {
            Some((Token::DotDot, span)) => (false, span),
            Some((Token::DotDotEq, span)) => (true, span),
            _ => return start.ok_or_else(|| self.err_expected_expr(None)),
        };
        self.next()?;

        let end = match inclusive || self.starts_expr()? {
            true => Some(self.parse_binary(Prec::Or)?),
            false => None,
        };

        let m = start.as_ref().map_or(op.m, |e| e.span.m);
        let n = end.as_ref().map_or(op.n, |e| e.span.n);
        Ok(Expr {
            kind: ExprKind::Range {
                start: start.map(Box::new),
                end: end.map(Box::new),
                inclusive,
            },
            span: Span::new(m, n),
        })
    }

    /// Parses binary operators that bind at least as tight as `min`.
    ///
    /// Every operator nests the expression so far one level deeper and counts
    /// towards the recursion limit.
    fn parse_binary(&mut self, min: Prec) -> Result<Expr<'source>> {
        let mut left = self.parse_unary()?;
        let mut nested = 0;

        while let Some((tk, _)) = self.peek()? {
            let (prec, op) = match infix(tk) {
                Some((prec, op)) if prec >= min => (prec, op),
                _ => break,
            };
            // A filter appended to an existing chain does not nest.
            let flattens = matches!(op, Infix::Filter) && matches!(left.kind, ExprKind::Filter { .. });
            if !flattens {
                self.enter()?;
                nested += 1;
            }
            self.next()?;

            left = match op {
                Infix::Filter => self.parse_filter_into(left)?,
                Infix::Binary(op) => {
                    let right = match prec.tighter() {
                        Some(prec) => self.parse_binary(prec)?,
                        None => self.parse_unary()?,
                    };
                    let span = left.span.combine(right.span);
                    Expr {
                        kind: ExprKind::Binary {
                            op,
                            left: Box::new(left),
                            right: Box::new(right),
                        },
                        span,
                    }
                }
            };
        }

        for _ in 0..nested {
            self.leave();
        }
        Ok(left)
    }

    /// Appends the next filter to `value`.
    ///
    /// Consecutive filters are flattened into one chain unless the value is
    /// parenthesized.
    fn parse_filter_into(&mut self, value: Expr<'source>) -> Result<Expr<'source>> {
        let filter = self.parse_filter()?;
        let span = value.span.combine(filter.span);
        let kind = match value.kind {
            ExprKind::Filter { value, mut filters } => {
                filters.push(filter);
                ExprKind::Filter { value, filters }
            }
            kind => ExprKind::Filter {
                value: Box::new(Expr {
                    kind,
                    span: value.span,
                }),
                filters: vec![filter],
            },
        };
        Ok(Expr { kind, span })
    }

    fn parse_unary(&mut self) -> Result<Expr<'source>> {
        let (tk, span) = match self.peek()? {
            Some(next) => next,
            None => return self.parse_is_defined(),
        };

        let op = match tk {
            Token::Bang => Some(UnOp::Not),
            Token::Star => Some(UnOp::Deref),
            Token::Minus if !matches!(self.peek_nth(1)?, Some((Token::Number, _))) => {
                Some(UnOp::Neg)
            }
            Token::Amp => None,
            _ => return self.parse_is_defined(),
        };
        self.next()?;

        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();

        let span = span.combine(operand.span);
        let operand = Box::new(operand);
        let kind = match op {
            Some(op) => ExprKind::Unary { op, operand },
            None => ExprKind::Ref(operand),
        };
        Ok(Expr { kind, span })
    }

    /// Parses a postfix expression with an optional `is [not] defined` test.
    fn parse_is_defined(&mut self) -> Result<Expr<'source>> {
        let expr = self.parse_postfix()?;
        if self.eat_keyword(Keyword::Is)?.is_none() {
            return Ok(expr);
        }
        let negated = self.eat_keyword(Keyword::Not)?.is_some();
        let end = self.expect(Token::Keyword(Keyword::Defined))?;
        let span = expr.span.combine(end);
        Ok(Expr {
            kind: ExprKind::IsDefined {
                expr: Box::new(expr),
                negated,
            },
            span,
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr<'source>> {
        let mut expr = self.parse_primary()?;
        let mut nested = 0;

        loop {
            if !matches!(
                self.peek()?,
                Some((Token::LParen | Token::Dot | Token::LBracket | Token::Question, _))
            ) {
                break;
            }
            self.enter()?;
            nested += 1;

            expr = match self.peek()? {
                Some((Token::LParen, _)) => {
                    let args = self.parse_args()?;
                    let span = expr.span.combine(args.span);
                    Expr {
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    }
                }
                Some((Token::Dot, _)) => {
                    self.next()?;
                    let key = self.parse_key()?;
                    let span = expr.span.combine(key.span());
                    Expr {
                        kind: ExprKind::Field {
                            object: Box::new(expr),
                            key,
                        },
                        span,
                    }
                }
                Some((Token::LBracket, _)) => {
                    self.next()?;
                    let index = self.parse_expr()?;
                    let end = self.expect(Token::RBracket)?;
                    let span = expr.span.combine(end);
                    Expr {
                        kind: ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    }
                }
                Some((Token::Question, end)) => {
                    self.next()?;
                    let span = expr.span.combine(end);
                    Expr {
                        kind: ExprKind::Try(Box::new(expr)),
                        span,
                    }
                }
                _ => break,
            };
        }

        for _ in 0..nested {
            self.leave();
        }
        Ok(expr)
    }

    /// Parses the member after a `.`, either a name or a tuple index.
    fn parse_key(&mut self) -> Result<Key<'source>> {
        match self.next()? {
            Some((Token::Ident | Token::Keyword(_), span)) => Ok(Key::Name(Ident {
                name: &self.source()[span],
                span,
            })),
            Some((Token::Number, span)) => {
                let value = self.source()[span].parse().map_err(|_| {
                    Error::new(
                        ErrorKind::Lex(LexError::InvalidNumber),
                        "tuple index out of range",
                        span,
                    )
                })?;
                Ok(Key::Index(Index { value, span }))
            }
            found => Err(self.err_unexpected(vec![Expected::Identifier], found)),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr<'source>> {
        let (tk, span) = match self.next()? {
            Some(next) => next,
            None => return Err(self.err_expected_expr(None)),
        };

        match tk {
            Token::Number | Token::Str | Token::Char => {
                let lit = self.parse_lit(tk, span, false)?;
                Ok(Expr {
                    kind: ExprKind::Lit(lit),
                    span,
                })
            }

            Token::Minus => {
                // Only reached for a minus directly followed by a number.
                let (tk, num) = match self.next()? {
                    Some(next) => next,
                    None => return Err(self.err_expected_expr(None)),
                };
                let lit = self.parse_lit(tk, num, true)?;
                Ok(Expr {
                    kind: ExprKind::Lit(lit),
                    span: span.combine(num),
                })
            }

            Token::Keyword(Keyword::True | Keyword::False) => Ok(Expr {
                kind: ExprKind::Lit(self.parse_lit(tk, span, false)?),
                span,
            }),

            tk if is_ident(tk) => {
                let first = Ident {
                    name: &self.source()[span],
                    span,
                };
                if !self.is_next(Token::PathSep)? {
                    return Ok(Expr {
                        kind: ExprKind::Var(first.name),
                        span,
                    });
                }
                self.parse_path_expr(false, vec![first], span)
            }

            Token::PathSep => {
                let segments = Vec::new();
                match self.peek()? {
                    Some((Token::MacroName, _)) => self.parse_macro_segment(true, segments, span),
                    _ => {
                        let first = self.parse_ident()?;
                        self.parse_path_expr(true, vec![first], span)
                    }
                }
            }

            Token::MacroName => self.parse_macro(false, Vec::new(), span, span),

            Token::LParen => {
                let (mut elems, trailing, close) = self.parse_seq(Token::RParen, Self::parse_expr)?;
                let kind = match elems.len() {
                    0 => ExprKind::Unit,
                    1 if !trailing => ExprKind::Group(Box::new(elems.remove(0))),
                    _ => ExprKind::Tuple(elems),
                };
                Ok(Expr {
                    kind,
                    span: span.combine(close),
                })
            }

            Token::LBracket => {
                let (elems, _, close) = self.parse_seq(Token::RBracket, Self::parse_expr)?;
                Ok(Expr {
                    kind: ExprKind::Array(elems),
                    span: span.combine(close),
                })
            }

            tk => Err(self.err_expected_expr(Some((tk, span)))),
        }
    }

    /// Continues a path after its leading segments, ending at the first
    /// segment that is not followed by `::`.
    fn parse_path_expr(
        &mut self,
        global: bool,
        mut segments: Vec<Ident<'source>>,
        start: Span,
    ) -> Result<Expr<'source>> {
        while self.eat(Token::PathSep)?.is_some() {
            if let Some((Token::MacroName, _)) = self.peek()? {
                return self.parse_macro_segment(global, segments, start);
            }
            segments.push(self.parse_ident()?);
        }
        let span = start.combine(segments.last().map_or(start, |seg| seg.span));
        Ok(Expr {
            kind: ExprKind::Path(Path {
                global,
                segments,
                span,
            }),
            span,
        })
    }

    fn parse_macro_segment(
        &mut self,
        global: bool,
        segments: Vec<Ident<'source>>,
        start: Span,
    ) -> Result<Expr<'source>> {
        match self.next()? {
            Some((Token::MacroName, span)) => self.parse_macro(global, segments, start, span),
            found => Err(self.err_unexpected(vec![Expected::Identifier], found)),
        }
    }

    /// Parses a macro invocation given the span of the `name!` token.
    fn parse_macro(
        &mut self,
        global: bool,
        mut segments: Vec<Ident<'source>>,
        start: Span,
        name: Span,
    ) -> Result<Expr<'source>> {
        let ident = Span::new(name.m, name.n - 1);
        segments.push(Ident {
            name: &self.source()[ident],
            span: ident,
        });
        let path = Path {
            global,
            segments,
            span: start.combine(ident),
        };
        let args = self.parse_args()?;
        let span = start.combine(args.span);
        Ok(Expr {
            kind: ExprKind::Macro { path, args },
            span,
        })
    }

    /// Parses a parenthesized argument list.
    pub(super) fn parse_args(&mut self) -> Result<Args<'source>> {
        let open = self.expect(Token::LParen)?;
        let (items, _, close) = self.parse_seq(Token::RParen, Self::parse_arg)?;
        Ok(Args {
            items,
            span: open.combine(close),
        })
    }

    fn parse_arg(&mut self) -> Result<Arg<'source>> {
        let named = match self.peek()? {
            Some((tk, _)) if is_ident(tk) => {
                matches!(self.peek_nth(1)?, Some((Token::Eq, _)))
            }
            _ => false,
        };
        if !named {
            return self.parse_expr().map(Arg::Positional);
        }
        let name = self.parse_ident()?;
        self.expect(Token::Eq)?;
        let value = self.parse_expr()?;
        Ok(Arg::Named { name, value })
    }

    /// Whether the next token can start an operand.
    ///
    /// A trailing `if` is excluded so that the loop filter in
    /// `for x in 0.. if cond` is not taken as the range end.
    fn starts_expr(&mut self) -> Result<bool> {
        let next = self.peek()?;
        if let Some((tk, _)) = next {
            if tk != Token::Keyword(Keyword::If) && is_ident(tk) {
                return Ok(true);
            }
        }
        Ok(matches!(
            next,
            Some((
                Token::MacroName
                    | Token::Number
                    | Token::Str
                    | Token::Char
                    | Token::Keyword(Keyword::True | Keyword::False)
                    | Token::PathSep
                    | Token::LParen
                    | Token::LBracket
                    | Token::Bang
                    | Token::Star
                    | Token::Minus
                    | Token::Amp,
                _
            ))
        ))
    }

    fn err_expected_expr(&self, found: Option<(Token, Span)>) -> Error {
        self.err_unexpected(vec![Expected::Expression], found)
    }
}
