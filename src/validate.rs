//! Gap validation.
//!
//! A claimed gap `(start, gap)` is accepted only when `start` and
//! `start + gap` are prime and every integer strictly between them is proven
//! composite. The validator walks a fixed sequence of [`Phase`]s:
//!
//! ```text
//! Start ─► EndpointsChecked ─► Sieved ─► ResolvingSurvivors ─► Done
//!   │            │                              │
//!   └─ start not prime                          └─ interior prime
//!                └─ end not prime
//! ```
//!
//! The first failing check decides the verdict. Interior survivors are tested
//! in ascending order, so the reported counterexample is always the smallest
//! offset holding a prime, with or without worker threads.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use tracing::instrument;

use crate::error::{Result, VerifyError};
use crate::oracle::{PrimalityOracle, Strategy};
use crate::parse::StandardForm;
use crate::sieve::{self, CompositeMask, Interval, MAX_SIEVE_PRIME, SieveStats};

/// Where a validation is in its protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Start,
    EndpointsChecked,
    Sieved,
    ResolvingSurvivors,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::EndpointsChecked => write!(f, "endpoints-checked"),
            Self::Sieved => write!(f, "sieved"),
            Self::ResolvingSurvivors => write!(f, "resolving-survivors"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Why a claimed gap was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    StartNotPrime,
    EndNotPrime,
    /// `start + offset` is prime with `0 < offset < gap`.
    InteriorPrime { offset: u64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartNotPrime => write!(f, "start not prime"),
            Self::EndNotPrime => write!(f, "end not prime"),
            Self::InteriorPrime { offset } => write!(f, "interior point is prime: start + {offset}"),
        }
    }
}

/// Outcome of a validation that ran to completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    Valid,
    Invalid(Rejection),
}

impl Verdict {
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }

    pub const fn rejection(self) -> Option<Rejection> {
        match self {
            Self::Valid => None,
            Self::Invalid(rejection) => Some(rejection),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid(rejection) => write!(f, "invalid: {rejection}"),
        }
    }
}

/// Knobs for one validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Sieve bound; `None` or `Some(0)` estimates one.
    pub max_prime: Option<u64>,
    /// Log phases and sieve statistics at info level.
    pub verbose: bool,
    /// Worker threads for survivor resolution; `0` and `1` run inline.
    pub threads: usize,
}

/// Everything learned during one validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Report {
    pub verdict: Verdict,
    /// Last phase reached before the verdict.
    pub phase: Phase,
    /// Sieve statistics, once the interval has been sieved.
    pub sieve: Option<SieveStats>,
    /// Interior offsets the sieve left unknown.
    pub survivors: u64,
    /// Survivors actually handed to the oracle.
    pub tested: u64,
}

impl Report {
    const fn early(verdict: Verdict, phase: Phase) -> Self {
        Self {
            verdict,
            phase,
            sieve: None,
            survivors: 0,
            tested: 0,
        }
    }
}

/// Runs the validation protocol against one oracle.
#[derive(Clone, Copy, Debug)]
pub struct GapValidator<'a> {
    oracle: &'a PrimalityOracle,
}

impl<'a> GapValidator<'a> {
    pub const fn new(oracle: &'a PrimalityOracle) -> Self {
        Self { oracle }
    }

    /// Validate the claimed gap `(start, gap)`.
    ///
    /// # Errors
    /// [`VerifyError::InvalidArgument`] for a bad gap or bound, raised before
    /// any primality test. Oracle failures and
    /// [`VerifyError::SieveInconsistency`] abort the validation.
    pub fn validate(&self, start: &BigUint, gap: u64, options: &ValidateOptions) -> Result<Verdict> {
        Ok(self.validate_with_report(start, gap, options)?.verdict)
    }

    /// [`validate`](Self::validate), keeping the sieve statistics and
    /// survivor counts.
    ///
    /// # Errors
    /// See [`validate`](Self::validate).
    pub fn validate_with_report(&self, start: &BigUint, gap: u64, options: &ValidateOptions) -> Result<Report> {
        let interval = Interval::new(start.clone(), gap)?;
        self.run(&interval, None, options)
    }

    /// Validate a gap whose start is written as `m * P# / d + a`. Queries for
    /// the external tool are sent in the same compact form, shifted by the
    /// offset being tested.
    ///
    /// # Errors
    /// [`VerifyError::InvalidArgument`] when `form` has no non-negative
    /// value, otherwise as [`validate`](Self::validate).
    pub fn validate_form(&self, form: &StandardForm, gap: u64, options: &ValidateOptions) -> Result<Report> {
        let start = form
            .value()
            .ok_or_else(|| VerifyError::invalid(format!("`{form}` is not a non-negative integer")))?;
        let interval = Interval::new(start, gap)?;
        self.run(&interval, Some(form), options)
    }

    #[instrument(skip_all, fields(gap = interval.gap(), bits = interval.start().bits()))]
    fn run(&self, interval: &Interval, form: Option<&StandardForm>, options: &ValidateOptions) -> Result<Report> {
        let gap = interval.gap();
        let max_prime = checked_override(options.max_prime)?;
        let verbose = options.verbose;

        note(verbose, Phase::Start, "checking endpoints");
        if !self.is_prime_at(interval, form, 0)? {
            return Ok(reject(verbose, Phase::Start, Rejection::StartNotPrime));
        }
        if !self.is_prime_at(interval, form, gap)? {
            return Ok(reject(verbose, Phase::Start, Rejection::EndNotPrime));
        }

        note(verbose, Phase::EndpointsChecked, "sieving interval");
        let bound = sieve::resolve_bound(interval, max_prime)?;
        let (mask, stats) = sieve::sieve_with_stats(interval, bound)?;
        check_even_invariant(interval, &mask)?;
        if verbose {
            tracing::info!(
                phase = %Phase::Sieved,
                max_prime = stats.max_prime,
                unknowns = stats.unknowns,
                composite_pct = stats.composite_percent(),
                "sieve complete"
            );
        }

        let survivors: Vec<u64> = mask.unknown_offsets().filter(|&i| i > 0 && i < gap).collect();
        note(verbose, Phase::ResolvingSurvivors, "testing survivors");
        let (found, tested) = if options.threads > 1 && survivors.len() > 1 {
            self.resolve_parallel(interval, form, &survivors, options.threads)?
        } else {
            self.resolve_sequential(interval, form, &survivors)?
        };

        let verdict = match found {
            Some(offset) => {
                let rejection = Rejection::InteriorPrime { offset };
                log_rejection(verbose, rejection);
                Verdict::Invalid(rejection)
            }
            None => Verdict::Valid,
        };
        note(verbose, Phase::Done, "validation finished");
        Ok(Report {
            verdict,
            phase: Phase::Done,
            sieve: Some(stats),
            survivors: survivors.len() as u64,
            tested,
        })
    }

    fn is_prime_at(&self, interval: &Interval, form: Option<&StandardForm>, offset: u64) -> Result<bool> {
        let n = interval.value_at(offset);
        match form {
            Some(form) if self.oracle.strategy_for(&n) == Strategy::ExternalTool => {
                let text = form.shifted(offset).to_string();
                self.oracle.is_prime_large(&n, Some(&text))
            }
            _ => self.oracle.is_prime(&n),
        }
    }

    fn resolve_sequential(
        &self,
        interval: &Interval,
        form: Option<&StandardForm>,
        survivors: &[u64],
    ) -> Result<(Option<u64>, u64)> {
        let mut tested = 0;
        for &offset in survivors {
            tested += 1;
            if self.is_prime_at(interval, form, offset)? {
                return Ok((Some(offset), tested));
            }
        }
        Ok((None, tested))
    }

    /// Survivors are handed out in ascending order. A worker stops taking work
    /// once every remaining offset is above the smallest prime or error seen,
    /// so everything below that cutoff is always tested and the result matches
    /// the sequential walk.
    fn resolve_parallel(
        &self,
        interval: &Interval,
        form: Option<&StandardForm>,
        survivors: &[u64],
        threads: usize,
    ) -> Result<(Option<u64>, u64)> {
        let next = AtomicUsize::new(0);
        let cutoff = AtomicU64::new(u64::MAX);
        let best_prime = AtomicU64::new(u64::MAX);
        let tested = AtomicU64::new(0);
        let first_error: Mutex<Option<(u64, VerifyError)>> = Mutex::new(None);

        std::thread::scope(|scope| {
            for _ in 0..threads.min(survivors.len()) {
                scope.spawn(|| {
                    loop {
                        let Some(&offset) = survivors.get(next.fetch_add(1, Ordering::Relaxed)) else {
                            break;
                        };
                        if offset > cutoff.load(Ordering::Acquire) {
                            break;
                        }
                        tested.fetch_add(1, Ordering::Relaxed);
                        match self.is_prime_at(interval, form, offset) {
                            Ok(false) => {}
                            Ok(true) => {
                                best_prime.fetch_min(offset, Ordering::AcqRel);
                                cutoff.fetch_min(offset, Ordering::AcqRel);
                            }
                            Err(e) => {
                                cutoff.fetch_min(offset, Ordering::AcqRel);
                                if let Ok(mut slot) = first_error.lock()
                                    && slot.as_ref().is_none_or(|(seen, _)| offset < *seen)
                                {
                                    *slot = Some((offset, e));
                                }
                            }
                        }
                    }
                });
            }
        });

        let best = best_prime.into_inner();
        let error = first_error.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some((offset, e)) = error
            && offset < best
        {
            return Err(e);
        }
        let found = (best != u64::MAX).then_some(best);
        Ok((found, tested.into_inner()))
    }
}

/// Validate with a default oracle. Numbers below the tool threshold never
/// touch the external tool.
///
/// # Errors
/// See [`GapValidator::validate`].
pub fn validate(start: &BigUint, gap: u64, max_prime: Option<u64>, verbose: bool) -> Result<Verdict> {
    let oracle = PrimalityOracle::default();
    let options = ValidateOptions {
        max_prime,
        verbose,
        threads: 1,
    };
    GapValidator::new(&oracle).validate(start, gap, &options)
}

fn checked_override(max_prime: Option<u64>) -> Result<Option<u64>> {
    match max_prime {
        None | Some(0) => Ok(None),
        Some(p) if p < 2 || p > MAX_SIEVE_PRIME => Err(VerifyError::invalid(format!(
            "max_prime must be in 2..={MAX_SIEVE_PRIME}, got {p}"
        ))),
        Some(p) => Ok(Some(p)),
    }
}

/// Every interior even value above 2 must have been marked.
fn check_even_invariant(interval: &Interval, mask: &CompositeMask) -> Result<()> {
    let small_start = interval.start().to_u64();
    let first = if interval.start().bit(0) { 1 } else { 2 };
    for offset in (first..interval.gap()).step_by(2) {
        if small_start.is_some_and(|s| s.saturating_add(offset) <= 2) {
            continue;
        }
        if !mask.is_composite(offset) {
            return Err(VerifyError::SieveInconsistency { offset });
        }
    }
    Ok(())
}

fn note(verbose: bool, phase: Phase, message: &str) {
    if verbose {
        tracing::info!(%phase, "{message}");
    } else {
        tracing::debug!(%phase, "{message}");
    }
}

fn reject(verbose: bool, phase: Phase, rejection: Rejection) -> Report {
    log_rejection(verbose, rejection);
    Report::early(Verdict::Invalid(rejection), phase)
}

fn log_rejection(verbose: bool, rejection: Rejection) {
    if verbose {
        tracing::info!(%rejection, "gap rejected");
    } else {
        tracing::debug!(%rejection, "gap rejected");
    }
}
