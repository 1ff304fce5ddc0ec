use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use benches::{random, repeat, PAGE};

criterion_group!(benches, bench_parse, bench_random, bench_validate, bench_recover);
criterion_main!(benches);

/// Benchmarks parsing of the hand written page repeated `n` times.
pub fn bench_parse(c: &mut Criterion) {
    let mut g = c.benchmark_group("parse");
    for n in [1, 10, 100] {
        let source = repeat(PAGE, n);
        g.throughput(Throughput::Bytes(source.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(n), &source, |b, source| {
            b.iter(|| askama_syntax::parse(black_box(source)));
        });
    }
    g.finish();
}

/// Benchmarks parsing of generated templates.
pub fn bench_random(c: &mut Criterion) {
    let mut g = c.benchmark_group("random");
    for n in [10, 150, 1000] {
        let source = random(n);
        g.throughput(Throughput::Bytes(source.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(n), &source, |b, source| {
            b.iter(|| askama_syntax::parse(black_box(source)));
        });
    }
    g.finish();
}

/// Benchmarks the structural validation pass alone.
pub fn bench_validate(c: &mut Criterion) {
    let source = repeat(PAGE, 100);
    let parsed = askama_syntax::parse(&source);
    c.bench_function("validate", |b| b.iter(|| black_box(&parsed).validate()));
}

/// Benchmarks a template where every other tag is malformed.
pub fn bench_recover(c: &mut Criterion) {
    let source = repeat("{{ a + }} {% if %}{{ b | f(1, 2) }}{% foo bar %}\n", 100);
    c.bench_function("recover", |b| {
        b.iter(|| askama_syntax::parse(black_box(&source)))
    });
}
