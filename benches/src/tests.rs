use crate::{random, repeat, PAGE};

#[test]
fn page_parses() {
    let parsed = askama_syntax::parse(PAGE);
    assert!(parsed.is_ok(), "{:?}", parsed.errors());
    assert!(parsed.validate().is_empty());
}

#[test]
fn random_parses() {
    for n in [0, 1, 10, 150] {
        let source = random(n);
        let parsed = askama_syntax::parse(&source);
        assert!(parsed.is_ok(), "{:#?}", parsed.errors());
        assert!(parsed.validate().is_empty(), "{:?}", parsed.validate());
    }
}

#[test]
fn random_is_seeded() {
    assert_eq!(random(25), random(25));
}

#[test]
fn repeated_page_parses() {
    let source = repeat(PAGE, 3);
    assert!(askama_syntax::parse(&source).is_ok());
}
