#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let parsed = askama_syntax::parse(data);
    let mut at = 0;
    for node in &parsed.template().nodes {
        let span = node.span();
        assert_eq!(span.m, at);
        at = span.n;
    }
    assert_eq!(at, data.len());
    for err in parsed.errors().iter().chain(&parsed.validate()) {
        let _ = format!("{err:#}");
    }
});
