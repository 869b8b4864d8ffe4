//! Subcommand implementations.

use std::process::ExitCode;

use anyhow::{Context, Result};
use gapverify::config::VerifyConfig;
use gapverify::parse::{StandardForm, parse_standard_form};
use gapverify::sieve::{self, Interval};
use gapverify::validate::Report;
use gapverify::{GapValidator, PrimalityOracle, ValidateOptions, bound};
use num_bigint::BigUint;
use serde::Serialize;

use crate::format::OutputFormat;

/// Parse a number argument, decimal or expression.
pub fn parse_number(expr: &str) -> Result<BigUint> {
    gapverify::parse::parse(expr).with_context(|| format!("could not parse `{expr}`"))
}

// ---------------------------------------------------------------------------
// sieve
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SieveOutput {
    start: String,
    gap: u64,
    max_prime: u64,
    effective_max_prime: u64,
    primes_used: u64,
    unknowns: u64,
    composites: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    unknown_offsets: Option<Vec<u64>>,
}

pub fn sieve(expr: &str, gap: u64, max_prime: Option<u64>, list: bool, format: OutputFormat) -> Result<ExitCode> {
    let start = parse_number(expr)?;
    let interval = Interval::new(start, gap)?;
    let bound = sieve::resolve_bound(&interval, max_prime)?;
    let (mask, stats) = sieve::sieve_with_stats(&interval, bound)?;

    let output = SieveOutput {
        start: expr.trim().to_owned(),
        gap,
        max_prime: stats.max_prime,
        effective_max_prime: stats.effective_max_prime,
        primes_used: stats.primes_used,
        unknowns: stats.unknowns,
        composites: stats.composites,
        unknown_offsets: list.then(|| mask.unknown_offsets().collect()),
    };
    format.emit(&output, |o| {
        println!("interval:   {} + [0, {}]", o.start, o.gap);
        println!(
            "max prime:  {} (effective {}, {} odd primes)",
            o.max_prime, o.effective_max_prime, o.primes_used
        );
        println!("unknowns:   {}", o.unknowns);
        println!("composites: {} ({:.1}%)", o.composites, stats.composite_percent());
        if let Some(offsets) = &o.unknown_offsets {
            for offset in offsets {
                println!("  +{offset}");
            }
        }
    })?;
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ValidateOutput {
    start: String,
    gap: u64,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_prime: Option<u64>,
    survivors: u64,
    tested: u64,
}

pub fn validate(
    config: &VerifyConfig,
    expr: &str,
    gap: u64,
    options: &ValidateOptions,
    format: OutputFormat,
) -> Result<ExitCode> {
    let oracle = PrimalityOracle::from_config(config);
    let validator = GapValidator::new(&oracle);
    let report = run_validation(&validator, expr, gap, options)?;

    let valid = report.verdict.is_valid();
    let output = ValidateOutput {
        start: expr.trim().to_owned(),
        gap,
        valid,
        reason: report.verdict.rejection().map(|r| r.to_string()),
        max_prime: report.sieve.map(|s| s.max_prime),
        survivors: report.survivors,
        tested: report.tested,
    };
    format.emit(&output, |o| match &o.reason {
        None => println!("{} + {}: valid ({} survivors tested)", o.start, o.gap, o.tested),
        Some(reason) => println!("{} + {}: INVALID, {reason}", o.start, o.gap),
    })?;
    Ok(if valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn run_validation(validator: &GapValidator<'_>, expr: &str, gap: u64, options: &ValidateOptions) -> Result<Report> {
    let report = match parse_standard_form(expr) {
        Some(form) => validator.validate_form(&form, gap, options)?,
        None => validator.validate_with_report(&parse_number(expr)?, gap, options)?,
    };
    Ok(report)
}

// ---------------------------------------------------------------------------
// is-prime
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct IsPrimeOutput {
    expr: String,
    bits: u64,
    strategy: String,
    prime: bool,
}

pub fn is_prime(config: &VerifyConfig, expr: &str, format: OutputFormat) -> Result<ExitCode> {
    let n = parse_number(expr)?;
    let oracle = PrimalityOracle::from_config(config);
    let strategy = oracle.strategy_for(&n);
    let prime = oracle.is_prime_large(&n, Some(expr.trim()))?;

    let output = IsPrimeOutput {
        expr: expr.trim().to_owned(),
        bits: n.bits(),
        strategy: strategy.to_string(),
        prime,
    };
    format.emit(&output, |o| {
        let answer = if o.prime { "probable prime" } else { "composite" };
        println!("{}: {answer} ({} bits, {})", o.expr, o.bits, o.strategy);
    })?;
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// limit
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct LimitOutput {
    start: String,
    gap: u64,
    log2: f64,
    max_prime: u64,
    expected_survivors: f64,
}

pub fn limit(expr: &str, gap: u64, format: OutputFormat) -> Result<ExitCode> {
    let start = parse_number(expr)?;
    let max_prime = bound::estimate(&start, gap)?;
    let output = LimitOutput {
        start: expr.trim().to_owned(),
        gap,
        log2: bound::log2(&(&start + gap)),
        max_prime,
        expected_survivors: bound::expected_survivors(gap, max_prime),
    };
    format.emit(&output, |o| {
        println!("log2(end):          {:.2}", o.log2);
        println!("max prime:          {}", o.max_prime);
        println!("expected survivors: {:.1}", o.expected_survivors);
    })?;
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct FormOutput {
    m: String,
    p: u64,
    d: String,
    a: String,
}

impl From<&StandardForm> for FormOutput {
    fn from(form: &StandardForm) -> Self {
        Self {
            m: form.m.to_string(),
            p: form.p,
            d: form.d.to_string(),
            a: form.a.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ParseOutput {
    value: String,
    bits: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    standard_form: Option<FormOutput>,
}

pub fn parse(expr: &str, format: OutputFormat) -> Result<ExitCode> {
    let value = parse_number(expr)?;
    let output = ParseOutput {
        bits: value.bits(),
        value: value.to_string(),
        standard_form: parse_standard_form(expr).as_ref().map(FormOutput::from),
    };
    format.emit(&output, |o| {
        if let Some(form) = &o.standard_form {
            println!("m = {}, P = {}, d = {}, a = {}", form.m, form.p, form.d, form.a);
        }
        println!("{} bits", o.bits);
        println!("{}", o.value);
    })?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use gapverify::Verdict;

    use super::*;

    #[test]
    fn parse_number_reports_bad_input() {
        let err = parse_number("12 +").unwrap_err();
        assert!(err.to_string().contains("12 +"));
        assert_eq!(parse_number("11# / 5# + 17").unwrap(), BigUint::from(94u32));
    }

    #[test]
    fn standard_form_start_validates() {
        let oracle = PrimalityOracle::default();
        let validator = GapValidator::new(&oracle);
        // 31# + 1 = 200560490131
        let options = ValidateOptions::default();
        let via_form = run_validation(&validator, "31# + 1", 6, &options).unwrap();
        let via_decimal = run_validation(&validator, "200560490131", 6, &options).unwrap();
        assert_eq!(via_form.verdict, via_decimal.verdict);
    }

    #[test]
    fn small_gap_through_decimal_route() {
        let oracle = PrimalityOracle::default();
        let validator = GapValidator::new(&oracle);
        let report = run_validation(&validator, "360653", 96, &ValidateOptions::default()).unwrap();
        assert_eq!(report.verdict, Verdict::Valid);
    }

    #[test]
    fn invalid_gap_length_is_an_error() {
        let oracle = PrimalityOracle::default();
        let validator = GapValidator::new(&oracle);
        assert!(run_validation(&validator, "101", 0, &ValidateOptions::default()).is_err());
    }
}
