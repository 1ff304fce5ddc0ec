use askama_syntax::ast::{ExprKind, Lit, Node};
use askama_syntax::{ErrorKind, Parser, Span};

#[track_caller]
fn kinds(nodes: &[Node<'_>]) -> Vec<&'static str> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Content(_) => "content",
            Node::Comment(_) => "comment",
            Node::Tag(_) => "tag",
            Node::Expr(_) => "expr",
            Node::Raw(_) => "raw",
            Node::Error(_) => "error",
        })
        .collect()
}

#[test]
fn recover_unknown_statement() {
    let parsed = askama_syntax::parse("{% foo %}{{ 1 }}");
    let errors = parsed.errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].kind(), ErrorKind::UnexpectedToken { .. }));
    assert_eq!(errors[0].span(), Span::new(3, 6));

    let nodes = &parsed.template().nodes;
    assert_eq!(nodes[0], Node::Error(Span::new(0, 9)));
    match &nodes[1] {
        Node::Expr(expr) => {
            assert!(matches!(expr.expr.kind, ExprKind::Lit(Lit::Num(_))));
            assert_eq!(expr.span, Span::new(9, 16));
        }
        node => panic!("unexpected node {node:?}"),
    }
}

#[test]
fn recover_multiple_errors() {
    let parsed = askama_syntax::parse("{{ a + }} {% for %} {{ ok }} {% if %}");
    let messages: Vec<_> = parsed.errors().iter().map(|e| e.message()).collect();
    assert_eq!(
        messages,
        [
            "expected expression, found end expression",
            "expected pattern, found end block",
            "expected expression, found end block",
        ]
    );
    assert_eq!(
        kinds(&parsed.template().nodes),
        ["error", "content", "error", "content", "expr", "content", "error"]
    );
}

#[test]
fn recover_after_peeked_end_delimiter() {
    let parsed = askama_syntax::parse("{% call m %}after");
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(parsed.template().nodes[0], Node::Error(Span::new(0, 12)));
    assert_eq!(parsed.template().nodes[1].span(), Span::new(12, 17));
}

#[test]
fn recover_skips_rest_of_tag() {
    let parsed = askama_syntax::parse("{% if a b c d %}x{% endif %}");
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(kinds(&parsed.template().nodes), ["error", "content", "tag"]);
    assert_eq!(parsed.template().nodes[0].span(), Span::new(0, 16));
}

#[test]
fn recover_skips_lex_errors_in_rest_of_tag() {
    let parsed = askama_syntax::parse("{{ a $ \"b }} c");
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(kinds(&parsed.template().nodes), ["error", "content"]);
    assert_eq!(parsed.template().nodes[0], Node::Error(Span::new(0, 12)));
}

#[test]
fn recover_unterminated_string_stops_at_end_delimiter() {
    let parsed = askama_syntax::parse("{{ \"abc }} <p>hi</p>\n{{ name }}");
    let errors = parsed.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].span(), Span::new(3, 7));
    assert_eq!(kinds(&parsed.template().nodes), ["error", "content", "expr"]);
    assert_eq!(parsed.template().nodes[0], Node::Error(Span::new(0, 10)));
    assert_eq!(parsed.template().nodes[1].span(), Span::new(10, 21));
    assert_eq!(parsed.template().nodes[2].span(), Span::new(21, 31));
}

#[test]
fn recover_unterminated_char_stops_at_end_delimiter() {
    let parsed = askama_syntax::parse("{% if c == 'a -%} x");
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(parsed.errors()[0].span(), Span::new(11, 13));
    assert_eq!(kinds(&parsed.template().nodes), ["error", "content"]);
    assert_eq!(parsed.template().nodes[0], Node::Error(Span::new(0, 17)));
}

#[test]
fn recover_unclosed_tag_at_next_tag() {
    let parsed = askama_syntax::parse("{% if a {% endif %}");
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(kinds(&parsed.template().nodes), ["error", "tag"]);
    assert_eq!(parsed.template().nodes[0].span(), Span::new(0, 8));
}

#[test]
fn recover_unclosed_tag_at_eof() {
    let parsed = askama_syntax::parse("a {% if b");
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(kinds(&parsed.template().nodes), ["content", "error"]);
    assert_eq!(parsed.template().nodes[1].span(), Span::new(2, 9));
}

#[test]
fn recover_keeps_nodes_before_unterminated_comment() {
    let parsed = askama_syntax::parse("{{ a }} {# b {# c #}");
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(parsed.errors()[0].kind(), &ErrorKind::UnterminatedComment);
    assert_eq!(kinds(&parsed.template().nodes), ["expr", "content", "comment"]);
    assert_eq!(parsed.template().nodes[2].span(), Span::new(8, 20));
}

#[test]
fn recover_keeps_nodes_before_unterminated_raw_block() {
    let parsed = askama_syntax::parse("{{ a }}{% raw -%} {{ b }}");
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(parsed.errors()[0].kind(), &ErrorKind::UnterminatedRawBlock);
    assert_eq!(kinds(&parsed.template().nodes), ["expr", "tag", "raw"]);
}

#[test]
fn recursion_limit_parens() {
    let source = format!("{{{{ {}x{} }}}} ok", "(".repeat(1000), ")".repeat(1000));
    let parsed = askama_syntax::parse(&source);
    let errors = parsed.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), &ErrorKind::RecursionLimitExceeded);
    assert_eq!(
        errors[0].message(),
        "nesting exceeds the recursion limit of 64"
    );
    assert_eq!(errors[0].span(), Span::new(67, 68));
    assert_eq!(kinds(&parsed.template().nodes), ["error", "content"]);
    assert_eq!(parsed.template().nodes[0].span(), Span::new(0, source.len() - 3));
}

#[test]
fn recursion_limit_unary() {
    let source = format!("{{{{ {}x }}}}", "!".repeat(1000));
    let parsed = askama_syntax::parse(&source);
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(parsed.errors()[0].kind(), &ErrorKind::RecursionLimitExceeded);
}

#[test]
fn recursion_limit_arrays() {
    let source = format!("{{{{ {}{} }}}}", "[".repeat(1000), "]".repeat(1000));
    let parsed = askama_syntax::parse(&source);
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(parsed.errors()[0].kind(), &ErrorKind::RecursionLimitExceeded);
}

#[test]
fn recursion_limit_patterns() {
    let source = format!("{{% let {}x{} = 1 %}}", "(".repeat(1000), ")".repeat(1000));
    let parsed = askama_syntax::parse(&source);
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(parsed.errors()[0].kind(), &ErrorKind::RecursionLimitExceeded);
}

#[test]
fn recursion_limit_postfix_chain() {
    let source = format!("{{{{ a{} }}}} ok", "?".repeat(100_000));
    let parsed = askama_syntax::parse(&source);
    let errors = parsed.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), &ErrorKind::RecursionLimitExceeded);
    assert_eq!(errors[0].span(), Span::new(67, 68));
    assert_eq!(kinds(&parsed.template().nodes), ["error", "content"]);

    let source = format!("{{{{ a{} }}}}", ".b()".repeat(50_000));
    let parsed = askama_syntax::parse(&source);
    assert_eq!(parsed.errors()[0].kind(), &ErrorKind::RecursionLimitExceeded);
}

#[test]
fn recursion_limit_binary_chain() {
    let source = format!("{{{{ a{} }}}} ok", "+a".repeat(100_000));
    let parsed = askama_syntax::parse(&source);
    let errors = parsed.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), &ErrorKind::RecursionLimitExceeded);
    assert_eq!(errors[0].span(), Span::new(130, 131));
    assert_eq!(kinds(&parsed.template().nodes), ["error", "content"]);

    let source = format!("{{{{ a{} }}}}", " ~ a".repeat(100_000));
    let parsed = askama_syntax::parse(&source);
    assert_eq!(parsed.errors()[0].kind(), &ErrorKind::RecursionLimitExceeded);
}

#[test]
fn recursion_limit_allows_long_filter_chains() {
    let source = format!("{{{{ a{} }}}}", " | f".repeat(1000));
    assert!(askama_syntax::parse(&source).is_ok());

    let source = format!("{{{{ a{} }}}}", "+a".repeat(60));
    assert!(askama_syntax::parse(&source).is_ok());
}

#[test]
fn recursion_limit_custom() {
    let mut parser = Parser::new();
    parser.set_recursion_limit(8);
    assert_eq!(parser.recursion_limit(), 8);

    let nested = |n: usize| format!("{{{{ {}x{} }}}}", "(".repeat(n), ")".repeat(n));
    assert!(parser.parse(&nested(7)).is_ok());
    let source = nested(8);
    let parsed = parser.parse(&source);
    assert_eq!(parsed.errors()[0].kind(), &ErrorKind::RecursionLimitExceeded);
}

#[test]
fn recursion_limit_is_per_tag() {
    let nested = format!("{{{{ {}x{} }}}}", "(".repeat(50), ")".repeat(50));
    let source = nested.repeat(10);
    assert!(askama_syntax::parse(&source).is_ok());
}
