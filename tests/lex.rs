use askama_syntax::ast::Node;
use askama_syntax::{ErrorKind, Expected, LexError, Parser, Span, Syntax, Token};

#[track_caller]
fn assert_err(source: &str, kind: ErrorKind, plain: &str, pretty: &str) {
    let parsed = askama_syntax::parse(source);
    let errors = parsed.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].kind(), &kind);
    assert_eq!(errors[0].to_string(), plain);
    assert_eq!(format!("{:#}", errors[0]), pretty);
}

#[track_caller]
fn assert_ok(parser: &Parser, source: &str) {
    let parsed = parser.parse(source);
    assert!(parsed.is_ok(), "{:?}", parsed.errors());
}

#[test]
fn lex_while_eof() {
    assert_err(
        "lorem {{ ipsum",
        ErrorKind::UnexpectedToken {
            expected: vec![Expected::Token(Token::EndExpr)],
            found: None,
        },
        "expected end expression, found EOF between bytes 14 and 14",
        "
   |
 1 | lorem {{ ipsum
   |               ^ expected end expression, found EOF
",
    );
}

#[test]
fn lex_syntax_overlapping() {
    let syntax = Syntax::builder().expr("{", "}").block("{{", "}}").build();
    assert_ok(
        &Parser::with_syntax(syntax),
        "lorem { ipsum } {{ if dolor }} {{ endif }} sit amet",
    );
}

#[test]
fn lex_syntax_overlapping_flipped() {
    let syntax = Syntax::builder().expr("{{", "}}").block("{", "}").build();
    assert_ok(
        &Parser::with_syntax(syntax),
        "lorem {{ ipsum }} { if dolor } { endif } sit amet",
    );
}

#[test]
fn lex_syntax_whitespace_trimming() {
    assert_ok(
        &Parser::new(),
        "lorem {{- ipsum -}} {%~ if dolor +%} {#- sit ~#} {% endif %} amet",
    );
}

#[test]
fn lex_syntax_custom_comment() {
    let syntax = Syntax::builder()
        .expr("<?", "?>")
        .block("<%", "%>")
        .comment("<#", "#>")
        .build();
    let parsed = Parser::with_syntax(syntax).parse("a <# b <# c #> #> <? d ?> {{ e }}");
    assert!(parsed.is_ok(), "{:?}", parsed.errors());
    let nodes = &parsed.template().nodes;
    assert!(matches!(nodes[1], Node::Comment(_)));
    assert_eq!(nodes[1].span(), Span::new(2, 17));
    assert!(matches!(nodes[3], Node::Expr(_)));
    assert!(matches!(&nodes[4], Node::Content(c) if c.text == " {{ e }}"));
}

#[test]
fn lex_end_delimiters_outside_tags_are_content() {
    let parsed = askama_syntax::parse("lorem ipsum }} dolor %} sit #} amet");
    assert!(parsed.is_ok());
    assert_eq!(parsed.template().nodes.len(), 1);
}

#[test]
fn lex_err_unclosed_begin_expr() {
    assert_err(
        "lorem ipsum {{ {{ dolor }} sit amet",
        ErrorKind::UnexpectedToken {
            expected: vec![Expected::Token(Token::EndExpr)],
            found: Some(Token::BeginExpr),
        },
        "expected end expression, found begin expression between bytes 15 and 17",
        "
   |
 1 | lorem ipsum {{ {{ dolor }} sit amet
   |                ^^ expected end expression, found begin expression
",
    );
}

#[test]
fn lex_err_unclosed_begin_block() {
    assert_err(
        "lorem {% if ipsum {{ dolor }}",
        ErrorKind::UnexpectedToken {
            expected: vec![Expected::Token(Token::EndBlock)],
            found: Some(Token::BeginExpr),
        },
        "expected end block, found begin expression between bytes 18 and 20",
        "
   |
 1 | lorem {% if ipsum {{ dolor }}
   |                   ^^ expected end block, found begin expression
",
    );
}

#[test]
fn lex_err_unexpected_character() {
    assert_err(
        "lorem {{ ipsum $ dolor }}",
        ErrorKind::Lex(LexError::UnexpectedCharacter),
        "unexpected character between bytes 15 and 16",
        "
   |
 1 | lorem {{ ipsum $ dolor }}
   |                ^ unexpected character
",
    );
}

#[test]
fn lex_err_undelimited_string_end_delimiter() {
    assert_err(
        r#"lorem {{ "ipsum }}"#,
        ErrorKind::Lex(LexError::UnterminatedString),
        "undelimited string between bytes 9 and 15",
        r#"
   |
 1 | lorem {{ "ipsum }}
   |          ^^^^^^ undelimited string
"#,
    );
}

#[test]
fn lex_err_undelimited_string_eof() {
    assert_err(
        r#"lorem {{ "ipsum"#,
        ErrorKind::Lex(LexError::UnterminatedString),
        "undelimited string between bytes 9 and 15",
        r#"
   |
 1 | lorem {{ "ipsum
   |          ^^^^^^ undelimited string
"#,
    );
}

#[test]
fn lex_err_undelimited_string_newline() {
    assert_err(
        "lorem {{ \"ipsum\n\" }}",
        ErrorKind::Lex(LexError::UnterminatedString),
        "undelimited string between bytes 9 and 15",
        r#"
   |
 1 | lorem {{ "ipsum
   |          ^^^^^^ undelimited string
"#,
    );
}

#[test]
fn lex_err_undelimited_char() {
    assert_err(
        "{{ 'ab' }}",
        ErrorKind::Lex(LexError::UnterminatedChar),
        "undelimited character between bytes 3 and 7",
        "
   |
 1 | {{ 'ab' }}
   |    ^^^^ undelimited character
",
    );
}

#[test]
fn lex_err_empty_char() {
    assert_err(
        "{{ '' }}",
        ErrorKind::Lex(LexError::EmptyChar),
        "empty character literal between bytes 3 and 5",
        "
   |
 1 | {{ '' }}
   |    ^^ empty character literal
",
    );
}

#[test]
fn lex_err_unknown_escape() {
    assert_err(
        r#"{{ "a\qb" }}"#,
        ErrorKind::Lex(LexError::InvalidEscape),
        "unknown escape character between bytes 5 and 7",
        r#"
   |
 1 | {{ "a\qb" }}
   |      ^^ unknown escape character
"#,
    );
}

#[test]
fn lex_err_invalid_number() {
    assert_err(
        "{{ 12ab }}",
        ErrorKind::Lex(LexError::InvalidNumber),
        "invalid number literal between bytes 3 and 7",
        "
   |
 1 | {{ 12ab }}
   |    ^^^^ invalid number literal
",
    );
}

#[test]
fn lex_err_invalid_number_suffix() {
    assert_err(
        "{{ 1.5u8 }}",
        ErrorKind::Lex(LexError::InvalidNumber),
        "invalid number literal between bytes 3 and 8",
        "
   |
 1 | {{ 1.5u8 }}
   |    ^^^^^ invalid number literal
",
    );
}

#[test]
fn lex_err_unclosed_comment() {
    assert_err(
        "lorem {# ipsum {# dolor #} sit",
        ErrorKind::UnterminatedComment,
        "unclosed comment between bytes 6 and 8",
        "
   |
 1 | lorem {# ipsum {# dolor #} sit
   |       ^^ unclosed comment
",
    );
}

#[test]
fn lex_err_unclosed_raw_block() {
    assert_err(
        "{% raw %}{{ x }}",
        ErrorKind::UnterminatedRawBlock,
        "unclosed raw block between bytes 9 and 16",
        "
   |
 1 | {% raw %}{{ x }}
   |          ^^^^^^^ unclosed raw block
",
    );
}

#[test]
fn lex_err_multiline_source() {
    assert_err(
        "lorem\nipsum {{ dolor ) }}\nsit",
        ErrorKind::UnexpectedToken {
            expected: vec![Expected::Token(Token::EndExpr)],
            found: Some(Token::RParen),
        },
        "expected end expression, found `)` between bytes 21 and 22",
        "
   |
 2 | ipsum {{ dolor ) }}
   |                ^ expected end expression, found `)`
",
    );
}

#[test]
fn lex_numbers() {
    let parser = Parser::new();
    for num in [
        "0", "123", "1_000", "0x1f", "0xFF_u8", "0o777", "0b1010", "3.14", "3.14e2", "1e-3",
        "2E+10", "7usize", "1i128", "2.5f32", "1f64",
    ] {
        assert_ok(&parser, &format!("{{{{ {num} }}}}"));
    }
}

#[test]
fn lex_strings_and_chars() {
    let parser = Parser::new();
    for lit in [
        r#""""#,
        r#""normal""#,
        r#""escaped \n \r \t \\ \" \' \0""#,
        r#""\x41\u{1F600}""#,
        "'a'",
        r"'\n'",
        r"'\''",
        r"'\x7f'",
        r"'\u{e9}'",
        r"'\u00e9'",
        "'é'",
    ] {
        assert_ok(&parser, &format!("{{{{ {lit} }}}}"));
    }
}

#[cfg(feature = "unicode")]
#[test]
fn lex_unicode_identifiers() {
    let parsed = askama_syntax::parse("{{ größe | straße }}");
    assert!(parsed.is_ok(), "{:?}", parsed.errors());
}
