//! Structural checks over a parsed template.
//!
//! The parser emits control tags as a flat list, so nothing stops an `endfor`
//! from appearing without a `for`. This module pairs up the openers and end
//! tags and reports everything that does not balance.

use std::fmt;

use crate::compile;
use crate::types::ast::{Node, StmtKind, Template};
use crate::types::span::Span;
use crate::{Error, ErrorKind};

/// Checks that the control tags in the template are properly nested.
///
/// Returns one [`ErrorKind::UnbalancedTag`] diagnostic per problem. Tags that
/// failed to parse are skipped.
///
/// # Examples
///
/// ```
/// let parsed = askama_syntax::parse("{% if a %}{% endfor %}");
/// let errors = askama_syntax::validate(parsed.template(), parsed.source());
/// assert_eq!(errors.len(), 2);
/// assert_eq!(errors[0].message(), "unexpected `endfor` tag");
/// assert_eq!(errors[1].message(), "unclosed `if` tag");
/// ```
pub fn validate(template: &Template<'_>, source: &str) -> Vec<Error> {
    let mut validator = Validator::default();
    for node in &template.nodes {
        if let Node::Tag(tag) = node {
            validator.visit(&tag.stmt.kind, tag.span);
        }
    }
    compile::attach_source(validator.finish(), source)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    Block,
    For,
    If,
    Match,
    When,
    Macro,
    Call,
    Filter,
    Raw,
}

/// A tag that has been opened but not closed yet.
#[derive(Debug)]
struct Open<'a> {
    kind: Opener,
    span: Span,
    name: Option<&'a str>,
    /// Whether an `else` has been seen for this `if` or `for`.
    has_else: bool,
}

#[derive(Debug, Default)]
struct Validator<'a> {
    stack: Vec<Open<'a>>,
    errors: Vec<Error>,
}

impl<'a> Validator<'a> {
    fn visit(&mut self, stmt: &StmtKind<'a>, span: Span) {
        match stmt {
            StmtKind::Block(name) => self.open(Opener::Block, span, Some(name.name)),
            StmtKind::EndBlock(name) => self.close(Opener::Block, span, name.map(|n| n.name)),

            StmtKind::For(_) => self.open(Opener::For, span, None),
            StmtKind::EndFor => self.close(Opener::For, span, None),

            StmtKind::If(_) => self.open(Opener::If, span, None),
            StmtKind::ElseIf(_) => match self.stack.last() {
                Some(top) if top.kind == Opener::If && !top.has_else => {}
                _ => self.err_unexpected("else if", span),
            },
            StmtKind::Else => match self.stack.last_mut() {
                Some(top) if matches!(top.kind, Opener::If | Opener::For) && !top.has_else => {
                    top.has_else = true;
                }
                _ => self.err_unexpected("else", span),
            },
            StmtKind::EndIf => self.close(Opener::If, span, None),

            StmtKind::Match(_) => self.open(Opener::Match, span, None),
            StmtKind::When(_) => {
                // A `when` implicitly ends the previous arm.
                if self.top() == Some(Opener::When) {
                    self.stack.pop();
                }
                match self.top() {
                    Some(Opener::Match) => self.open(Opener::When, span, None),
                    _ => self.err_unexpected("when", span),
                }
            }
            StmtKind::EndWhen => self.close(Opener::When, span, None),
            StmtKind::EndMatch => {
                if self.top() == Some(Opener::When) {
                    self.stack.pop();
                }
                self.close(Opener::Match, span, None)
            }

            StmtKind::Macro(def) => self.open(Opener::Macro, span, Some(def.name.name)),
            StmtKind::EndMacro(name) => self.close(Opener::Macro, span, name.map(|n| n.name)),

            StmtKind::Call(_) => self.open(Opener::Call, span, None),
            StmtKind::EndCall => self.close(Opener::Call, span, None),

            StmtKind::Filter(_) => self.open(Opener::Filter, span, None),
            StmtKind::EndFilter => self.close(Opener::Filter, span, None),

            StmtKind::Raw => self.open(Opener::Raw, span, None),
            StmtKind::EndRaw => self.close(Opener::Raw, span, None),

            StmtKind::Break | StmtKind::Continue => {
                if !self.stack.iter().any(|open| open.kind == Opener::For) {
                    let kw = match stmt {
                        StmtKind::Break => "break",
                        _ => "continue",
                    };
                    self.errors.push(Error::new(
                        ErrorKind::UnbalancedTag,
                        format!("`{kw}` outside of a `for` loop"),
                        span,
                    ));
                }
            }

            StmtKind::Extends(_) | StmtKind::Include(_) | StmtKind::Import(_) | StmtKind::Let(_) => {}
        }
    }

    fn open(&mut self, kind: Opener, span: Span, name: Option<&'a str>) {
        self.stack.push(Open {
            kind,
            span,
            name,
            has_else: false,
        });
    }

    /// Closes the innermost open tag if it is of the given kind, otherwise
    /// the end tag is reported and ignored.
    fn close(&mut self, kind: Opener, span: Span, name: Option<&str>) {
        let open = match self.stack.last() {
            Some(open) if open.kind == kind => open,
            _ => return self.err_unexpected(kind.end(), span),
        };
        if let (Some(expected), Some(name)) = (open.name, name) {
            if expected != name {
                let msg = format!("expected `{} {expected}`, found `{} {name}`", kind.end(), kind.end());
                self.errors.push(Error::new(ErrorKind::UnbalancedTag, msg, span));
            }
        }
        self.stack.pop();
    }

    fn top(&self) -> Option<Opener> {
        self.stack.last().map(|open| open.kind)
    }

    fn finish(mut self) -> Vec<Error> {
        for open in std::mem::take(&mut self.stack) {
            self.errors.push(Error::new(
                ErrorKind::UnbalancedTag,
                format!("unclosed `{}` tag", open.kind),
                open.span,
            ));
        }
        self.errors
    }

    fn err_unexpected(&mut self, tag: &str, span: Span) {
        self.errors.push(Error::new(
            ErrorKind::UnbalancedTag,
            format!("unexpected `{tag}` tag"),
            span,
        ));
    }
}

impl Opener {
    fn end(self) -> &'static str {
        match self {
            Self::Block => "endblock",
            Self::For => "endfor",
            Self::If => "endif",
            Self::Match => "endmatch",
            Self::When => "endwhen",
            Self::Macro => "endmacro",
            Self::Call => "endcall",
            Self::Filter => "endfilter",
            Self::Raw => "endraw",
        }
    }
}

impl fmt::Display for Opener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Block => "block",
            Self::For => "for",
            Self::If => "if",
            Self::Match => "match",
            Self::When => "when",
            Self::Macro => "macro",
            Self::Call => "call",
            Self::Filter => "filter",
            Self::Raw => "raw",
        };
        f.write_str(s)
    }
}
