//! Table size planning
//!
//! The slot count of an index is always a prime taken from a fixed table.
//! A prime modulus keeps every double-hashing step size coprime with the
//! table size, so each probe sequence visits every slot exactly once.

use crate::error::{IndexError, Result};

/// Ascending primes the table size is chosen from.
///
/// Each entry is roughly twice the previous one. The largest entry bounds
/// the number of items a single index can hold.
pub const PRIMES: &[u64] = &[
    163,
    331,
    673,
    1_361,
    2_729,
    5_471,
    10_949,
    21_911,
    43_853,
    87_719,
    175_447,
    350_899,
    701_819,
    1_403_641,
    2_807_303,
    5_614_657,
    11_229_331,
    22_458_671,
    44_917_381,
    89_834_777,
    179_669_557,
    359_339_171,
    718_678_369,
    1_437_356_741,
];

/// Largest item count any index can be planned for.
pub const MAX_ITEM_COUNT: u64 = PRIMES[PRIMES.len() - 1];

/// Pick the table size for `item_count` entries.
///
/// Prefers the smallest prime holding 25% more slots than items. When no
/// tabulated prime leaves that much room, the smallest prime that still fits
/// every item is used instead.
pub fn plan(item_count: u64) -> Result<u64> {
    let with_slack = item_count.saturating_mul(5) / 4;
    if let Some(prime) = smallest_at_least(with_slack) {
        return Ok(prime);
    }
    smallest_at_least(item_count).ok_or(IndexError::CapacityExceeded {
        requested: item_count,
        limit: MAX_ITEM_COUNT,
    })
}

fn smallest_at_least(target: u64) -> Option<u64> {
    let i = PRIMES.partition_point(|&prime| prime < target);
    PRIMES.get(i).copied()
}

/// Trial-division primality test for table sizes.
///
/// Probe sequences only cover every slot when the slot count is prime.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d.saturating_mul(d) <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Table parameters fixed when an index is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    modulus: u64,
    max_item_count: u64,
}

impl Capacity {
    /// Plan a table that accepts up to `max_item_count` items.
    pub fn for_items(max_item_count: u64) -> Result<Self> {
        Ok(Self {
            modulus: plan(max_item_count)?,
            max_item_count,
        })
    }

    /// Use an explicit modulus. Only used to exercise full tables.
    #[cfg(test)]
    pub(crate) const fn exact(modulus: u64, max_item_count: u64) -> Self {
        Self {
            modulus,
            max_item_count,
        }
    }

    /// Number of slots in the index file.
    pub const fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Largest number of items a build may store.
    pub const fn max_item_count(&self) -> u64 {
        self.max_item_count
    }

    /// Reject a build that would store more than `max_item_count` items.
    pub fn check(&self, item_count: u64) -> Result<()> {
        if item_count > self.max_item_count {
            return Err(IndexError::CapacityExceeded {
                requested: item_count,
                limit: self.max_item_count,
            });
        }
        Ok(())
    }
}
