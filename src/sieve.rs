//! Segmented sieve over a single gap interval.
//!
//! The interval `[start, start + gap]` can sit at numbers with thousands of
//! digits, so the sieve never touches `start` except to take one exact
//! remainder per sieving prime. Everything after that is offset arithmetic in
//! machine words.
//!
//! # Guarantees
//!
//! - **Soundness**: `mask[i] == true` ⇒ `start + i` is 0, 1, or has a prime
//!   factor `<= max_prime`. A prime is never marked, even when it is itself a
//!   sieving prime inside the interval.
//! - **Evens**: every even `start + i > 2` is marked, whatever the bound.
//! - **Completeness at full depth**: once `max_prime >= sqrt(start + gap)`
//!   every unmarked entry is prime.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use tracing::instrument;

use crate::bound;
use crate::error::{Result, VerifyError};
use crate::primes::PrimeIter;

/// Largest accepted gap (`2^40`).
pub const MAX_GAP: u64 = 1 << 40;

/// Largest accepted explicit sieving bound.
pub const MAX_SIEVE_PRIME: u64 = 51_000_000_000;

// ---------------------------------------------------------------------------
// Interval
// ---------------------------------------------------------------------------

/// The closed range `[start, start + gap]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Interval {
    start: BigUint,
    gap: u64,
}

impl Interval {
    /// # Errors
    /// [`VerifyError::InvalidArgument`] when `gap < 1` or `gap > MAX_GAP`.
    pub fn new(start: BigUint, gap: u64) -> Result<Self> {
        if gap < 1 {
            return Err(VerifyError::invalid(format!("gap must be at least 1, got {gap}")));
        }
        if gap > MAX_GAP {
            return Err(VerifyError::invalid(format!("gap {gap} exceeds {MAX_GAP}")));
        }
        Ok(Self { start, gap })
    }

    pub const fn start(&self) -> &BigUint {
        &self.start
    }

    pub const fn gap(&self) -> u64 {
        self.gap
    }

    /// `start + gap`.
    #[must_use]
    pub fn end(&self) -> BigUint {
        &self.start + self.gap
    }

    /// `start + offset`.
    #[must_use]
    pub fn value_at(&self, offset: u64) -> BigUint {
        &self.start + offset
    }

    /// Number of positions, `gap + 1`.
    pub const fn positions(&self) -> u64 {
        self.gap + 1
    }
}

// ---------------------------------------------------------------------------
// CompositeMask
// ---------------------------------------------------------------------------

/// One flag per interval offset: `true` = proven composite by sieving,
/// `false` = unknown.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompositeMask(Vec<bool>);

impl CompositeMask {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` if `start + offset` was eliminated. Out-of-range offsets read
    /// as not composite.
    pub fn is_composite(&self, offset: u64) -> bool {
        usize::try_from(offset)
            .ok()
            .and_then(|i| self.0.get(i).copied())
            .unwrap_or(false)
    }

    /// Offsets not eliminated by the sieve, ascending.
    pub fn unknown_offsets(&self) -> impl Iterator<Item = u64> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, composite)| !**composite)
            .map(|(i, _)| i as u64)
    }

    pub fn count_unknown(&self) -> usize {
        self.0.iter().filter(|c| !**c).count()
    }

    pub fn count_composite(&self) -> usize {
        self.0.len() - self.count_unknown()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<bool> {
        self.0
    }
}

impl From<Vec<bool>> for CompositeMask {
    fn from(flags: Vec<bool>) -> Self {
        Self(flags)
    }
}

// ---------------------------------------------------------------------------
// SieveStats
// ---------------------------------------------------------------------------

/// Summary of one sieve run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SieveStats {
    /// Bound that was requested.
    pub max_prime: u64,
    /// Bound actually used: `min(max_prime, isqrt(start + gap))`.
    pub effective_max_prime: u64,
    /// Odd primes that were sieved with.
    pub primes_used: u64,
    /// Entries left unknown.
    pub unknowns: u64,
    /// Entries marked composite.
    pub composites: u64,
}

impl SieveStats {
    /// Share of the interval eliminated, in percent.
    #[must_use]
    pub fn composite_percent(&self) -> f64 {
        let total = self.unknowns + self.composites;
        if total == 0 {
            return 0.0;
        }
        100.0 * self.composites as f64 / total as f64
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Sieve `[start, start + gap]`. `None` (or `Some(0)`) picks the bound with
/// [`bound::estimate`].
///
/// # Errors
/// [`VerifyError::InvalidArgument`] for `gap < 1` or a bound outside
/// `2..=MAX_SIEVE_PRIME`.
pub fn sieve(start: &BigUint, gap: u64, max_prime: Option<u64>) -> Result<CompositeMask> {
    let interval = Interval::new(start.clone(), gap)?;
    let max_prime = resolve_bound(&interval, max_prime)?;
    let (mask, _) = sieve_with_stats(&interval, max_prime)?;
    Ok(mask)
}

/// Explicit bound, or the estimate when `max_prime` is `None` or `0`.
///
/// # Errors
/// Propagates [`bound::estimate`] failures.
pub fn resolve_bound(interval: &Interval, max_prime: Option<u64>) -> Result<u64> {
    match max_prime {
        Some(p) if p != 0 => Ok(p),
        _ => bound::estimate(interval.start(), interval.gap()),
    }
}

/// Sieve `interval` with every prime `<= max_prime` from the default source.
///
/// # Errors
/// [`VerifyError::InvalidArgument`] for a bound outside `2..=MAX_SIEVE_PRIME`.
pub fn sieve_with_stats(interval: &Interval, max_prime: u64) -> Result<(CompositeMask, SieveStats)> {
    sieve_with_source(interval, max_prime, PrimeIter::new())
}

/// Sieve `interval` using `primes`, which must yield every prime in
/// ascending order (2 may be included; it is skipped).
///
/// # Errors
/// [`VerifyError::InvalidArgument`] for a bound outside `2..=MAX_SIEVE_PRIME`
/// or an interval too large to hold in memory.
#[instrument(skip_all, fields(gap = interval.gap(), max_prime = max_prime))]
pub fn sieve_with_source<I>(interval: &Interval, max_prime: u64, primes: I) -> Result<(CompositeMask, SieveStats)>
where
    I: IntoIterator<Item = u64>,
{
    if max_prime < 2 {
        return Err(VerifyError::invalid(format!("max_prime must be at least 2, got {max_prime}")));
    }
    if max_prime > MAX_SIEVE_PRIME {
        return Err(VerifyError::invalid(format!(
            "max_prime {max_prime} exceeds {MAX_SIEVE_PRIME}"
        )));
    }
    let len = usize::try_from(interval.positions())
        .map_err(|_| VerifyError::invalid(format!("gap {} too large for this platform", interval.gap())))?;

    let start = interval.start();
    let gap = interval.gap();
    let start_odd = start.bit(0);
    let mut mask = vec![false; len];

    // Evens. Covers 0 too.
    let first_even = usize::from(start_odd);
    for flag in mask.iter_mut().skip(first_even).step_by(2) {
        *flag = true;
    }

    // Only a tiny start can reach 0, 1 or 2.
    let small_start = start.to_u128();
    if let Some(s) = small_start {
        let end = s + u128::from(gap);
        if s <= 1 && end >= 1 {
            mask[(1 - s) as usize] = true;
        }
        if s <= 2 && end >= 2 {
            mask[(2 - s) as usize] = false;
        }
    }

    // Nothing above isqrt(end) can mark anything.
    let root = interval.end().sqrt().to_u64().unwrap_or(u64::MAX);
    let effective = max_prime.min(root);

    let digits = start.to_u64_digits();
    let mut primes_used = 0u64;
    for p in primes
        .into_iter()
        .skip_while(|&p| p < 3)
        .take_while(|&p| p <= effective)
    {
        primes_used += 1;
        let r = rem_u64(&digits, p);
        let mut first = if r == 0 { 0 } else { p - r };
        // start + first = k * p; only odd k are left to mark.
        if (u64::from(start_odd) + first) % 2 == 0 {
            first += p;
        }
        // Never mark p itself: begin at p^2 if it lies further right.
        if let Some(s) = small_start {
            let square = u128::from(p) * u128::from(p);
            if s + u128::from(first) < square {
                first = (square - s) as u64;
            }
        }

        let mut i = first;
        while i <= gap {
            mask[i as usize] = true;
            i += 2 * p;
        }
    }

    let mask = CompositeMask(mask);
    let unknowns = mask.count_unknown() as u64;
    let stats = SieveStats {
        max_prime,
        effective_max_prime: effective,
        primes_used,
        unknowns,
        composites: interval.positions() - unknowns,
    };
    tracing::debug!(
        effective_max_prime = effective,
        primes_used,
        unknowns,
        composite_pct = stats.composite_percent(),
        "sieve complete"
    );
    Ok((mask, stats))
}

/// `n mod p` for `n` given as little-endian u64 limbs.
fn rem_u64(limbs: &[u64], p: u64) -> u64 {
    let p = u128::from(p);
    limbs
        .iter()
        .rev()
        .fold(0u128, |r, &limb| ((r << 64) | u128::from(limb)) % p) as u64
}
