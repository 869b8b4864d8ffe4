//! gapverify library crate.
//!
//! Certifies claimed prime gaps: `start` and `start + gap` are prime and
//! every integer strictly between them is composite. The `gapverify` binary
//! is a thin wrapper; integration tests and other tools use these modules
//! directly.
//!
//! - [`bound`]: how deep to sieve a given interval.
//! - [`sieve`]: composite/unknown mask over `[start, start + gap]`.
//! - [`oracle`]: primality by operand size, in-process or via pfgw.
//! - [`validate`]: the validation protocol and its verdict.
//! - [`parse`]: `m * P# / d ± a` and `b^e ± a` expressions.

pub mod bound;
pub mod config;
pub mod error;
pub mod oracle;
pub mod parse;
pub mod primality;
pub mod primes;
pub mod sieve;
pub mod validate;

pub use error::{Result, VerifyError};
pub use oracle::{PrimalityOracle, Strategy};
pub use sieve::{CompositeMask, Interval, sieve};
pub use validate::{GapValidator, Rejection, ValidateOptions, Verdict, validate};
