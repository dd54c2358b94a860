use criterion::{black_box, criterion_group, criterion_main, Criterion};

use oniguruma_parser::core::optimizer::{optimize, OptimizerOptions};
use oniguruma_parser::core::parser::{parse, ParserOptions};

const PATTERNS: &[&str] = &[
    "hello world",
    "^(?<year>\\d{4})-(?<month>\\d{2})-(?<day>\\d{2})$",
    "(?:foo|bar|baz)+\\s*[A-Za-z0-9_]*",
    "(?<=\\bfoo)\\p{L}+\\p{M}*[0-9A-Fa-f]{2,4}",
    "(a(b(c(d)e)f)g)\\k<1>\\g<2>",
];

fn parse_benchmark(c: &mut Criterion) {
    c.bench_function("parse representative patterns", |b| {
        b.iter(|| {
            for pattern in PATTERNS {
                let _ = parse(black_box(pattern), ParserOptions::default()).unwrap();
            }
        })
    });
}

fn optimize_benchmark(c: &mut Criterion) {
    c.bench_function("optimize representative patterns", |b| {
        b.iter(|| {
            for pattern in PATTERNS {
                let _ = optimize(black_box(pattern), OptimizerOptions::default()).unwrap();
            }
        })
    });
}

criterion_group!(benches, parse_benchmark, optimize_benchmark);
criterion_main!(benches);
