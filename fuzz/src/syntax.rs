#![no_main]

use arbitrary::Arbitrary;
use askama_syntax::{Parser, Syntax};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Delimiters<'a> {
    expr: (&'a str, &'a str),
    block: (&'a str, &'a str),
    comment: (&'a str, &'a str),
}

fuzz_target!(|data: (Delimiters<'_>, &str)| {
    let (delims, source) = data;
    let pairs = [delims.expr, delims.block, delims.comment];
    if pairs.iter().any(|(b, e)| b.is_empty() || e.is_empty()) {
        return;
    }
    let syntax = Syntax::builder()
        .expr(delims.expr.0, delims.expr.1)
        .block(delims.block.0, delims.block.1)
        .comment(delims.comment.0, delims.comment.1)
        .build();
    let parsed = Parser::with_syntax(syntax).parse(source);
    let len: usize = parsed
        .template()
        .nodes
        .iter()
        .map(|node| node.span().n - node.span().m)
        .sum();
    assert_eq!(len, source.len());
});
