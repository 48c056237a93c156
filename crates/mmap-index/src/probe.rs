//! Double-hashing probe sequences
//!
//! Probe `i` for a key visits slot `(h1 + i * h2) mod M` where
//! `h1 = key mod M` and `h2 = (key mod (M - 1)) + 1`. With `M` prime every
//! step in `[1, M - 1]` is invertible, so the first `M` probes visit each
//! slot exactly once.

use crate::key::IndexKey;

/// Reduce a big-endian unsigned integer of any length modulo `modulus`.
///
/// Equivalent to interpreting `bytes` as an arbitrary-precision number and
/// taking the remainder, without allocating.
pub fn reduce_be_bytes(bytes: &[u8], modulus: u64) -> u64 {
    let modulus = u128::from(modulus);
    let rem = bytes
        .iter()
        .fold(0u128, |acc, &b| ((acc << 8) | u128::from(b)) % modulus);
    rem as u64
}

/// First probe for a big-endian byte key.
pub fn byte_home(bytes: &[u8], modulus: u64) -> u64 {
    reduce_be_bytes(bytes, modulus)
}

/// Step size for a big-endian byte key, in `[1, modulus - 1]`.
pub fn byte_step(bytes: &[u8], modulus: u64) -> u64 {
    reduce_be_bytes(bytes, modulus - 1) + 1
}

/// First probe for an integer key. Negative keys wrap to a non-negative slot.
pub fn int_home(key: i64, modulus: u64) -> u64 {
    i128::from(key).rem_euclid(i128::from(modulus)) as u64
}

/// Step size for an integer key, in `[1, modulus - 1]`.
pub fn int_step(key: i64, modulus: u64) -> u64 {
    i128::from(key).rem_euclid(i128::from(modulus - 1)) as u64 + 1
}

/// Iterator over the slots a key may occupy, in probe order.
///
/// The step size is only computed once a second probe is requested.
#[derive(Debug)]
pub struct ProbeSequence<'k, K: ?Sized> {
    key: &'k K,
    modulus: u64,
    slot: u64,
    step: Option<u64>,
    issued: u64,
}

impl<'k, K: IndexKey + ?Sized> ProbeSequence<'k, K> {
    /// Start probing for `key` in a table of `modulus` slots.
    ///
    /// `modulus` must be at least 2.
    pub fn new(key: &'k K, modulus: u64) -> Self {
        debug_assert!(modulus >= 2, "modulus must be at least 2");
        Self {
            key,
            modulus,
            slot: key.home_slot(modulus),
            step: None,
            issued: 0,
        }
    }

    /// Number of probes handed out so far.
    pub const fn probes(&self) -> u64 {
        self.issued
    }
}

impl<K: IndexKey + ?Sized> Iterator for ProbeSequence<'_, K> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.issued == self.modulus {
            return None;
        }
        if self.issued > 0 {
            let step = match self.step {
                Some(step) => step,
                None => {
                    let step = self.key.step(self.modulus);
                    self.step = Some(step);
                    step
                }
            };
            self.slot = (self.slot + step) % self.modulus;
        }
        self.issued += 1;
        Some(self.slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.modulus - self.issued) as usize;
        (remaining, Some(remaining))
    }
}
