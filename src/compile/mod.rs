//! Parse template source into a syntax tree.
//!
//! This process has two stages:
//! - The lexer chunks the template source into tokens, scanning comments and
//!   raw blocks as whole regions.
//! - The parser constructs the AST from the token stream, recording a
//!   diagnostic and an error node for every tag that fails to parse.

mod expr;
pub mod lex;
mod parse;
mod pattern;
mod scan;
pub mod search;

use std::sync::Arc;

use crate::types::ast::Template;
use crate::{Error, Parser};

/// Parse a template into its syntax tree and diagnostics.
pub fn template<'source>(parser: &Parser, source: &'source str) -> (Template<'source>, Vec<Error>) {
    let (template, errors) =
        parse::Parser::new(&parser.searcher, source, parser.recursion_limit).parse_template();
    (template, attach_source(errors, source))
}

/// Attaches the template source to the errors so that they can be pretty
/// printed.
pub(crate) fn attach_source(errors: Vec<Error>, source: &str) -> Vec<Error> {
    if errors.is_empty() {
        return errors;
    }
    let source: Arc<str> = Arc::from(source);
    errors
        .into_iter()
        .map(|err| err.with_source(&source))
        .collect()
}
