//! Sieve-depth estimation.
//!
//! Sieving with one more prime `p` removes about `gap / p` candidates at a
//! cost of one big-number remainder. Each candidate left standing costs a full
//! PRP test whose price grows like `bits^2.5`. The limit below is where those
//! two costs cross, using the same constants as GMP's `mpz_nextprime`.

use std::f64::consts::LN_2;

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::{Result, VerifyError};

/// Hard cap on an estimated sieve limit.
pub const MAX_LIMIT: u64 = 10_000_000_000;

/// `e^γ`, from Mertens' third theorem.
const MERTENS_E_GAMMA: f64 = 1.781_072_417_990_198;

/// Raw crossover limit for an interval of `gap` numbers of `n_bits` bits.
///
/// # Errors
/// [`VerifyError::InvalidArgument`] unless `1 <= n_bits <= 100000` and
/// `gap >= 2`.
pub fn sieve_limit(n_bits: f64, gap: u64) -> Result<u64> {
    if !(1.0..=100_000.0).contains(&n_bits) {
        return Err(VerifyError::invalid(format!("bad n_bits({n_bits})")));
    }
    if gap < 2 {
        return Err(VerifyError::invalid(format!("bad gap({gap})")));
    }
    Ok(crossover_limit(n_bits, gap))
}

fn crossover_limit(n_bits: f64, gap: u64) -> u64 {
    // Average prime gap near 2^n_bits is n_bits * ln 2.
    let adj = gap as f64 / (n_bits * LN_2);
    let limit = adj * n_bits.powf(2.5) / 124.0;
    if limit > MAX_LIMIT as f64 {
        tracing::debug!(limit, cap = MAX_LIMIT, "sieve limit capped");
        return MAX_LIMIT;
    }
    limit as u64
}

/// Largest sieving prime worth using on `[start, start + gap]`.
///
/// Non-decreasing in both `gap` and `start`. The result is clamped to
/// `start - 1` when the interval is tiny, and never below 3.
///
/// # Errors
/// [`VerifyError::InvalidArgument`] when `gap < 1`.
pub fn estimate(start: &BigUint, gap: u64) -> Result<u64> {
    if gap < 1 {
        return Err(VerifyError::invalid(format!("gap must be at least 1, got {gap}")));
    }
    let end = start + gap;
    let n_bits = log2(&end).max(1.0);
    let raw = crossover_limit(n_bits, gap);

    let mut max_prime = raw;
    if let Some(s) = start.to_u64()
        && raw >= s
    {
        max_prime = s.saturating_sub(1);
    }
    if max_prime <= 2 {
        max_prime = 3;
    }
    tracing::debug!(n_bits, gap, raw, max_prime, "estimated sieve bound");
    Ok(max_prime)
}

/// Expected number of unknowns left in a gap after sieving to `limit`.
#[must_use]
pub fn expected_survivors(gap: u64, limit: u64) -> f64 {
    let limit = limit.max(3) as f64;
    gap as f64 / (limit.ln() * MERTENS_E_GAMMA)
}

/// `log2(n)` to f64 precision for arbitrarily large `n`; `0` maps to `0`.
#[must_use]
pub fn log2(n: &BigUint) -> f64 {
    let bits = n.bits();
    if bits == 0 {
        return 0.0;
    }
    if bits <= 64 {
        return n.to_f64().map_or(0.0, f64::log2);
    }
    let shift = bits - 64;
    let top = (n >> shift).to_f64().map_or(0.0, f64::log2);
    top + shift as f64
}
