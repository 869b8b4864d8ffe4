//! Small-prime enumeration.
//!
//! [`PrimeIter`] yields every prime in ascending order, sieving one block of
//! `2^16` integers at a time (odd numbers only) and growing its base primes on
//! demand, so memory stays flat no matter how far the sieve bound reaches.

use num_bigint::BigUint;

/// Integers covered by one block. Large enough to amortise the per-prime
/// bookkeeping, small enough to stay in L1/L2.
const BLOCK_SIZE: u64 = 1 << 16;
const ODD_BLOCK: usize = (BLOCK_SIZE / 2) as usize;

/// Ascending iterator over all primes, starting at 2.
#[derive(Debug, Clone)]
pub struct PrimeIter {
    emitted_two: bool,
    /// Start of the current block; always a multiple of [`BLOCK_SIZE`].
    base: u64,
    /// `block[i]` ⇔ `base + 2i + 1` is prime.
    block: Vec<bool>,
    index: usize,
    /// Odd primes used to sieve blocks.
    sieving: Vec<u64>,
    /// Next odd multiple of `sieving[i]` not yet crossed off.
    next_multiple: Vec<u64>,
}

impl Default for PrimeIter {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimeIter {
    #[must_use]
    pub fn new() -> Self {
        let mut iter = Self {
            emitted_two: false,
            base: 0,
            block: vec![true; ODD_BLOCK],
            index: 0,
            sieving: Vec::new(),
            next_multiple: Vec::new(),
        };
        iter.fill_block();
        iter
    }

    fn fill_block(&mut self) {
        let end = self.base + BLOCK_SIZE;

        // Every composite below `end` has an odd factor p with p*p < end.
        loop {
            let last = self.sieving.last().copied().unwrap_or(1);
            if last * last >= end {
                break;
            }
            let p = next_odd_prime(last, &self.sieving);
            self.sieving.push(p);
            self.next_multiple.push(first_odd_multiple(p, self.base));
        }

        self.block.fill(true);
        if self.base == 0 {
            self.block[0] = false; // 1
        }

        for (&p, next) in self.sieving.iter().zip(self.next_multiple.iter_mut()) {
            let mut m = *next;
            while m < end {
                self.block[((m - self.base) / 2) as usize] = false;
                m += 2 * p;
            }
            *next = m;
        }
    }
}

impl Iterator for PrimeIter {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if !self.emitted_two {
            self.emitted_two = true;
            return Some(2);
        }
        loop {
            while self.index < ODD_BLOCK {
                let i = self.index;
                self.index += 1;
                if self.block[i] {
                    return Some(self.base + 2 * i as u64 + 1);
                }
            }
            self.base += BLOCK_SIZE;
            self.index = 0;
            self.fill_block();
        }
    }
}

/// Smallest odd multiple of `p` that is `>= max(p*p, from)`.
const fn first_odd_multiple(p: u64, from: u64) -> u64 {
    let square = p * p;
    if square >= from {
        return square;
    }
    let mut k = from.div_ceil(p);
    if k % 2 == 0 {
        k += 1;
    }
    k * p
}

/// Next odd prime after `last`, given every odd prime `<= last`.
fn next_odd_prime(last: u64, known: &[u64]) -> u64 {
    let mut candidate = if last < 3 { 3 } else { last + 2 };
    loop {
        if known
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            return candidate;
        }
        candidate += 2;
    }
}

/// All odd primes `3 <= p <= limit`, ascending.
pub fn odd_primes_up_to(limit: u64) -> impl Iterator<Item = u64> {
    PrimeIter::new().skip(1).take_while(move |&p| p <= limit)
}

/// All primes `<= limit`, ascending.
#[must_use]
pub fn primes_up_to(limit: u64) -> Vec<u64> {
    PrimeIter::new().take_while(|&p| p <= limit).collect()
}

/// Trial-division primality, for small inputs only.
#[must_use]
pub fn is_prime_brute(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut p = 3;
    while p * p <= n {
        if n % p == 0 {
            return false;
        }
        p += 2;
    }
    true
}

/// `p#`, the product of all primes `<= p`.
#[must_use]
pub fn primorial(p: u64) -> BigUint {
    PrimeIter::new()
        .take_while(|&q| q <= p)
        .fold(BigUint::from(1u32), |acc, q| acc * q)
}
