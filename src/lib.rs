//! A standalone tokenizer and parser for Askama template source.
//!
//! # Features
//!
//! ### Syntax
//!
//! - Expressions: `{{ user.name | upper }}`
//! - Control tags: `{% if user.enabled %}`, `{% for user in users if user.active %}`
//! - Pattern matching: `{% match item %}{% when Some(x) %}{% endmatch %}`
//! - Nested comments: `{# outer {# inner #} #}`
//! - Raw blocks: `{% raw %}{{ not parsed }}{% endraw %}`
//! - Whitespace control on any delimiter: `{{- x ~}}`
//! - Configurable delimiters: `<? user.name ?>`, `<% if user.enabled %>`
//!
//! ### Parser
//!
//! - Never fails outright, every problem is reported as a diagnostic and the
//!   rest of the template is still parsed
//! - Every node records its byte span and the node spans cover the whole
//!   source, so tooling can map any position back to the syntax tree
//! - Bounded nesting depth for untrusted input
//! - Optionally serialize the syntax tree and diagnostics using [`serde`]
//!
//! # Getting started
//!
//! The [`parse`] function parses a template using the default syntax.
//!
//! ```
//! let parsed = askama_syntax::parse("Hello {{ user.name }}!");
//! assert!(parsed.is_ok());
//! assert_eq!(parsed.template().nodes.len(), 3);
//! ```
//!
//! Problems do not stop the parser. A tag that fails to parse becomes an
//! [`ast::Node::Error`] and a diagnostic is recorded for it.
//!
//! ```
//! use askama_syntax::ast::Node;
//!
//! let parsed = askama_syntax::parse("{{ a + }} and {{ b }}");
//! assert_eq!(parsed.errors().len(), 1);
//! assert_eq!(
//!     parsed.errors()[0].to_string(),
//!     "expected expression, found end expression between bytes 7 and 9"
//! );
//! assert!(matches!(parsed.template().nodes[0], Node::Error(_)));
//! assert!(matches!(parsed.template().nodes[2], Node::Expr(_)));
//! ```
//!
//! The alternate format of an error renders the offending source line.
//!
//! ```
//! let parsed = askama_syntax::parse("{{ a + }}");
//! assert_eq!(
//!     format!("{:#}", parsed.errors()[0]),
//!     "\n   |\n 1 | {{ a + }}\n   |        ^^ expected expression, found end expression\n"
//! );
//! ```
//!
//! # Examples
//!
//! ### Inspect expressions
//!
//! Expressions, patterns and statements implement [`Display`][std::fmt::Display]
//! in a fully parenthesized form which makes the precedence explicit.
//!
//! ```
//! use askama_syntax::ast::Node;
//!
//! let parsed = askama_syntax::parse("{{ a + b * c | round }}");
//! match &parsed.template().nodes[0] {
//!     Node::Expr(expr) => assert_eq!(expr.expr.to_string(), "(a + (b * (c | round)))"),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! ### Check tag nesting
//!
//! The parser produces a flat list of nodes. Use [`Parsed::validate`] to check
//! that the control tags balance.
//!
//! ```
//! let parsed = askama_syntax::parse("{% for x in xs %}{{ x }}{% endif %}");
//! let errors = parsed.validate();
//! assert_eq!(errors[0].message(), "unexpected `endif` tag");
//! assert_eq!(errors[1].message(), "unclosed `for` tag");
//! ```
//!
//! ### Parse a template using custom syntax
//!
//! The template syntax can be set by constructing a parser using
//! [`Parser::with_syntax`].
//!
//! ```
//! let syntax = askama_syntax::Syntax::builder()
//!     .expr("<?", "?>")
//!     .block("<%", "%>")
//!     .build();
//!
//! let parsed = askama_syntax::Parser::with_syntax(syntax).parse("Hello <? user.name ?>");
//! assert!(parsed.is_ok());
//! ```

mod compile;
mod error;
mod types;
mod validate;

pub use crate::compile::lex::{Keyword, Token};
pub use crate::error::{Error, ErrorKind, Expected, LexError, Result};
pub use crate::types::ast;
pub use crate::types::span::Span;
pub use crate::types::syntax::{Syntax, SyntaxBuilder};
pub use crate::validate::validate;

use crate::compile::search::Searcher;
use crate::types::ast::Template;

/// The default maximum nesting depth of expressions and patterns.
pub const DEFAULT_RECURSION_LIMIT: usize = 64;

/// Parse a template using the default syntax and recursion limit.
///
/// See [`Parser::parse`].
#[inline]
pub fn parse(source: &str) -> Parsed<'_> {
    Parser::new().parse(source)
}

/// A reusable template parser.
///
/// The parser stores the syntax configuration and limits. Generally, you only
/// need to construct one parser during the lifetime of a program.
#[derive(Debug, Clone)]
pub struct Parser {
    pub(crate) searcher: Searcher,
    pub(crate) recursion_limit: usize,
}

/// The result of parsing a template: the syntax tree and any diagnostics.
#[derive(Debug, Clone)]
pub struct Parsed<'source> {
    source: &'source str,
    template: Template<'source>,
    errors: Vec<Error>,
}

impl Default for Parser {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Construct a new parser with the default syntax.
    #[inline]
    pub fn new() -> Self {
        Self::with_syntax(Syntax::default())
    }

    /// Construct a new parser with custom syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use askama_syntax::{Parser, Syntax};
    ///
    /// let syntax = Syntax::builder().expr("<{", "}>").block("<[", "]>").build();
    /// let parser = Parser::with_syntax(syntax);
    /// ```
    #[inline]
    pub fn with_syntax(syntax: Syntax) -> Self {
        Self {
            searcher: Searcher::new(syntax),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Set the maximum nesting depth of expressions and patterns.
    ///
    /// A tag that nests deeper is reported as
    /// [`ErrorKind::RecursionLimitExceeded`].
    ///
    /// # Examples
    ///
    /// ```
    /// use askama_syntax::{ErrorKind, Parser};
    ///
    /// let mut parser = Parser::new();
    /// parser.set_recursion_limit(2);
    /// let parsed = parser.parse("{{ ((x)) }}");
    /// assert_eq!(parsed.errors()[0].kind(), &ErrorKind::RecursionLimitExceeded);
    /// ```
    #[inline]
    pub fn set_recursion_limit(&mut self, limit: usize) -> &mut Self {
        self.recursion_limit = limit;
        self
    }

    /// Returns the maximum nesting depth of expressions and patterns.
    #[inline]
    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Parse a template.
    ///
    /// This never fails, check [`Parsed::errors`] for diagnostics.
    pub fn parse<'source>(&self, source: &'source str) -> Parsed<'source> {
        let (template, errors) = compile::template(self, source);
        Parsed {
            source,
            template,
            errors,
        }
    }
}

impl<'source> Parsed<'source> {
    /// Returns the original template source.
    #[inline]
    pub fn source(&self) -> &'source str {
        self.source
    }

    /// Returns the syntax tree.
    #[inline]
    pub fn template(&self) -> &Template<'source> {
        &self.template
    }

    /// Returns the diagnostics in source order.
    #[inline]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Whether the template parsed without any diagnostics.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consumes the result, returning the syntax tree and the diagnostics.
    #[inline]
    pub fn into_parts(self) -> (Template<'source>, Vec<Error>) {
        (self.template, self.errors)
    }

    /// Checks that the control tags in the template are properly nested.
    ///
    /// See [`validate()`].
    #[inline]
    pub fn validate(&self) -> Vec<Error> {
        validate::validate(&self.template, self.source)
    }
}
