//! Stable hashing
//!
//! Value hashes must not depend on the process (std's `RandomState` is
//! seeded per run), so everything funnels through a 64-bit FNV-1a hasher.

use std::hash::{Hash, Hasher};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

/// 64-bit FNV-1a hasher with a fixed seed
#[derive(Debug, Clone, Copy)]
pub struct StableHasher(u64);

impl StableHasher {
    pub fn new() -> Self {
        Self(FNV_OFFSET)
    }
}

impl Default for StableHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for StableHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

/// Hashes any `Hash` value with a tag byte so that equal payloads of
/// different variants land apart.
pub fn stable_hash<T: Hash + ?Sized>(tag: u8, value: &T) -> u64 {
    let mut hasher = StableHasher::new();
    hasher.write_u8(tag);
    value.hash(&mut hasher);
    hasher.finish()
}

/// Combines element hashes where order matters
pub fn combine_ordered(hashes: impl IntoIterator<Item = u64>) -> u64 {
    hashes
        .into_iter()
        .fold(FNV_OFFSET, |acc, h| acc.wrapping_mul(31).wrapping_add(h))
}

/// Combines element hashes where order does not matter
pub fn combine_unordered(hashes: impl IntoIterator<Item = u64>) -> u64 {
    hashes.into_iter().fold(0u64, |acc, h| acc.wrapping_add(h))
}

/// Position-weighted sum: `Σ h_i * 7^i`
pub fn combine_weighted(hashes: impl IntoIterator<Item = u64>) -> u64 {
    let mut weight: u64 = 1;
    let mut total: u64 = 0;
    for h in hashes {
        total = total.wrapping_add(h.wrapping_mul(weight));
        weight = weight.wrapping_mul(7);
    }
    total
}
