//! In-process Baillie–PSW probable-prime test.
//!
//! A strong Fermat test to base 2 followed by a strong Lucas test with
//! Selfridge's parameters, as implemented by `num-prime`. No composite is known
//! to pass both halves. Values that fit in a `u64` get `num-prime`'s
//! deterministic 64-bit test instead.

use num_bigint::BigUint;
use num_prime::PrimalityTestConfig;
use num_prime::nt_funcs::is_prime;

/// BPSW probable-prime test. Exact for every `n < 2^64` and with no known
/// counterexample above.
#[must_use]
pub fn is_probable_prime(n: &BigUint) -> bool {
    is_prime(n, Some(PrimalityTestConfig::bpsw())).probably()
}
