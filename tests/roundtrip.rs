//! Property tests over arbitrary and delimiter-heavy template source.

use askama_syntax::ast::Node;
use askama_syntax::Parser;
use proptest::prelude::*;

/// Fragments that exercise the scanner and the tag parsers, joined in any
/// order so that most inputs are malformed in interesting ways.
const FRAGMENTS: &[&str] = &[
    "{{", "}}", "{%", "%}", "{#", "#}", "-", "+", "~", " ", "\n", "raw", "endraw", "if", "for",
    "in", "when", "let", "x", "Some", "_", "(", ")", "[", "]", "{", "}", ",", ".", "..", "|",
    "!", "&", "=", "==", "::", "\"", "'", "\\", "1", "0x", "2.5", "é", "lorem ",
];

fn template_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..48).prop_map(|parts| parts.concat())
}

#[track_caller]
fn assert_spans_cover(source: &str, nodes: &[Node<'_>]) {
    let mut at = 0;
    let mut rebuilt = String::new();
    for node in nodes {
        let span = node.span();
        assert_eq!(span.m, at, "gap or overlap before {node:?} in {source:?}");
        rebuilt.push_str(&source[span]);
        at = span.n;
    }
    assert_eq!(at, source.len(), "source not covered: {source:?}");
    assert_eq!(rebuilt, source);
}

#[test]
fn roundtrip_examples() {
    for source in [
        "",
        "lorem ipsum",
        "a {{ b }} c {% if d %}e{% endif %}",
        "{# a {# b #} c #}",
        "{# a",
        "{% raw %}{{ x }}{% endraw %}",
        "{% raw %}{{ x }}",
        "{{ a + }} {% foo %}{{ 1 }}",
        "{{ \"unterminated }}",
        "{% if a {{ b }}",
        "}} %} #}",
    ] {
        let parsed = askama_syntax::parse(source);
        assert_spans_cover(source, &parsed.template().nodes);
    }
}

proptest! {
    #[test]
    fn roundtrip_fragments(source in template_strategy()) {
        let parsed = askama_syntax::parse(&source);
        assert_spans_cover(&source, &parsed.template().nodes);
    }

    #[test]
    fn roundtrip_arbitrary(source in "\\PC*") {
        let parsed = askama_syntax::parse(&source);
        assert_spans_cover(&source, &parsed.template().nodes);
    }

    #[test]
    fn parse_is_deterministic(source in template_strategy()) {
        let parser = Parser::new();
        let a = parser.parse(&source);
        let b = parser.parse(&source);
        prop_assert_eq!(a.template(), b.template());
        prop_assert_eq!(a.errors(), b.errors());
    }

    #[test]
    fn errors_are_within_source(source in template_strategy()) {
        let parsed = askama_syntax::parse(&source);
        for err in parsed.errors() {
            let span = err.span();
            prop_assert!(span.m <= span.n && span.n <= source.len());
            prop_assert!(source.is_char_boundary(span.m) && source.is_char_boundary(span.n));
            // Pretty printing must not panic either.
            let _ = format!("{err:#}");
        }
        let _ = parsed.validate();
    }
}
