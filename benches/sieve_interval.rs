//! Interval sieve and survivor-test benchmarks.
//!
//! Measures the cost of marking composites in an interval as the sieve bound
//! grows, and of the built-in probable-prime test on the survivors.
//!
//! # Running
//!
//! ```bash
//! cargo bench --bench sieve_interval
//! # With a custom filter:
//! cargo bench --bench sieve_interval -- bound
//! ```
//!
//! # Report
//!
//! HTML report is generated in `target/criterion/` by criterion when
//! `--features html_reports` is active (enabled by default via Cargo.toml).

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use gapverify::parse::parse;
use gapverify::primality::is_probable_prime;
use gapverify::sieve::{Interval, sieve_with_stats};
use gapverify::{GapValidator, PrimalityOracle, ValidateOptions};

// ---------------------------------------------------------------------------
// Sieve
// ---------------------------------------------------------------------------

fn bench_sieve_bound(c: &mut Criterion) {
    let start = parse("503# - 659").unwrap();
    let gap = 10_000;
    let interval = Interval::new(start, gap).unwrap();

    let mut group = c.benchmark_group("sieve/bound");
    group.throughput(Throughput::Elements(gap + 1));
    for max_prime in [1_000u64, 100_000, 10_000_000] {
        group.bench_with_input(BenchmarkId::from_parameter(max_prime), &max_prime, |b, &max_prime| {
            b.iter(|| sieve_with_stats(&interval, max_prime).unwrap());
        });
    }
    group.finish();
}

fn bench_sieve_width(c: &mut Criterion) {
    let start = parse("10^300 + 1").unwrap();

    let mut group = c.benchmark_group("sieve/width");
    for gap in [1_000u64, 10_000, 100_000] {
        let interval = Interval::new(start.clone(), gap).unwrap();
        group.throughput(Throughput::Elements(gap + 1));
        group.bench_with_input(BenchmarkId::from_parameter(gap), &interval, |b, interval| {
            b.iter(|| sieve_with_stats(interval, 1_000_000).unwrap());
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Survivors
// ---------------------------------------------------------------------------

fn bench_probable_prime(c: &mut Criterion) {
    let mut group = c.benchmark_group("primality");
    for expr in ["31# + 1", "379# + 1", "1019# + 1"] {
        let n = parse(expr).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(expr), &n, |b, n| {
            b.iter(|| is_probable_prime(n));
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let oracle = PrimalityOracle::default();
    let validator = GapValidator::new(&oracle);
    let start = parse("18361375334787046697").unwrap();

    let mut group = c.benchmark_group("validate");
    group.sample_size(20);
    for threads in [1usize, 4] {
        let options = ValidateOptions {
            threads,
            ..ValidateOptions::default()
        };
        group.bench_with_input(BenchmarkId::new("gap1550", threads), &options, |b, options| {
            b.iter(|| validator.validate(&start, 1550, options).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sieve_bound,
    bench_sieve_width,
    bench_probable_prime,
    bench_validate
);
criterion_main!(benches);
