//! Template sources for the parser benchmarks.

use std::fmt::Write;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

#[cfg(test)]
mod tests;

/// A hand written page that touches most of the template syntax.
pub const PAGE: &str = include_str!("../benchdata/page.html");

const NAMES: &[&str] = &["user", "item", "row", "entry", "post"];
const FIELDS: &[&str] = &["name", "age", "title", "is_disabled", "tags"];
const FILTERS: &[&str] = &["upper", "lower", "trim", "escape", "truncate(20)", "join(\", \")"];
const OPS: &[&str] = &["+", "-", "*", "/", "%", "==", "!=", "<", ">=", "&&", "||", "~"];

/// Repeats the source `n` times.
pub fn repeat(source: &str, n: usize) -> String {
    source.repeat(n)
}

/// Generates a random but well formed template with `n` top level sections.
///
/// The generator is seeded so the same `n` always gives the same source.
pub fn random(n: usize) -> String {
    let mut rng = StdRng::seed_from_u64(n as u64);
    let mut out = String::new();
    for i in 0..n {
        section(&mut rng, &mut out, i);
    }
    out
}

fn section(rng: &mut StdRng, out: &mut String, i: usize) {
    let name = NAMES.choose(rng).copied().unwrap_or("user");
    match rng.gen_range(0..5) {
        0 => {
            let _ = writeln!(out, "<ul>{{% for {name} in {name}s_{i} %}}");
            let _ = writeln!(out, "  <li>{{{{ {} }}}}</li>", expr(rng, name));
            let _ = writeln!(out, "{{% else %}}<li>none</li>{{% endfor %}}</ul>");
        }
        1 => {
            let _ = writeln!(
                out,
                "{{% if {} %}}{{{{ {} }}}}{{% else %}}{{{{ {} }}}}{{% endif %}}",
                expr(rng, name),
                expr(rng, name),
                expr(rng, name)
            );
        }
        2 => {
            let _ = writeln!(out, "{{% match {name}.kind %}}");
            let _ = writeln!(out, "  {{% when Some(Kind::A {{ x, .. }}) %}}{{{{ x }}}}");
            let _ = writeln!(out, "  {{% when Some with (k) %}}{{{{ k | lower }}}}");
            let _ = writeln!(out, "  {{% when _ %}}none");
            let _ = writeln!(out, "{{% endmatch %}}");
        }
        3 => {
            let _ = writeln!(out, "{{# section {i} {{# nested #}} #}}");
            let _ = writeln!(out, "<p>{{{{- {} -}}}}</p>", expr(rng, name));
        }
        _ => {
            let _ = writeln!(out, "{{% let v{i} = {} %}}", expr(rng, name));
            let _ = writeln!(out, "{{% raw %}}{{{{ v{i} }}}}{{% endraw %}}");
        }
    }
}

fn expr(rng: &mut StdRng, name: &str) -> String {
    let field = FIELDS.choose(rng).copied().unwrap_or("name");
    let mut expr = format!("{name}.{field}");
    for _ in 0..rng.gen_range(0..3) {
        let op = OPS.choose(rng).copied().unwrap_or("+");
        let _ = write!(expr, " {op} {}", rng.gen_range(0..1000));
    }
    for _ in 0..rng.gen_range(0..3) {
        let filter = FILTERS.choose(rng).copied().unwrap_or("trim");
        let _ = write!(expr, " | {filter}");
    }
    expr
}
