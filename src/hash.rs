// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Polynomial checksum over a byte span.
//!
//! `sum(byte[i] * 257^i) mod 2^64`, wrapping. Tamper evidence against stray
//! writes, not a cryptographic digest: a deliberate forgery is easy.
//!
//! # Cost
//!
//! Linear in the span. The stack hashes its whole data region (every slot up to
//! `capacity`, not just the live ones) on every mutation, so with checksums
//! enabled each push and pop is O(capacity). `ProtectionLevel::StructuralOnly`
//! keeps the canaries and drops the checksums for amortized O(1).

/// Multiplier for each successive byte position.
pub const HASH_BASE: u64 = 257;

/// Hash a byte span.
///
/// An empty span hashes to 0. The stack only hands this an empty span when its
/// capacity has shrunk to zero, and "no bytes" has exactly one checksum.
#[inline]
pub fn poly_hash(bytes: &[u8]) -> u64 {
    let mut sum: u64 = 0;
    let mut power: u64 = 1;

    for &byte in bytes {
        sum = sum.wrapping_add(u64::from(byte).wrapping_mul(power));
        power = power.wrapping_mul(HASH_BASE);
    }

    sum
}

/// Incremental form of [`poly_hash`], for images assembled from several fields.
///
/// Feeding `a` then `b` gives the same result as hashing `a ++ b` in one call.
#[derive(Debug, Clone, Copy)]
pub struct PolyHasher {
    sum: u64,
    power: u64,
}

impl Default for PolyHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PolyHasher {
    pub fn new() -> Self {
        Self { sum: 0, power: 1 }
    }

    pub fn update(&mut self, bytes: &[u8]) -> &mut Self {
        for &byte in bytes {
            self.sum = self
                .sum
                .wrapping_add(u64::from(byte).wrapping_mul(self.power));
            self.power = self.power.wrapping_mul(HASH_BASE);
        }
        self
    }

    pub fn finish(&self) -> u64 {
        self.sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_span_is_zero() {
        assert_eq!(poly_hash(&[]), 0);
    }

    #[test]
    fn test_small_spans_by_hand() {
        assert_eq!(poly_hash(&[7]), 7);
        // 1 + 2*257 + 3*257^2
        assert_eq!(poly_hash(&[1, 2, 3]), 1 + 2 * 257 + 3 * 257 * 257);
    }

    #[test]
    fn test_position_matters() {
        assert_ne!(poly_hash(&[1, 0]), poly_hash(&[0, 1]));
    }

    #[test]
    fn test_wraps_instead_of_overflowing() {
        // 257^i overflows u64 around i = 8; must not panic in debug builds.
        let bytes = vec![0xFF; 4096];
        let a = poly_hash(&bytes);
        let b = poly_hash(&bytes);
        assert_eq!(a, b);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let whole: Vec<u8> = (0..=255).collect();
        let mut hasher = PolyHasher::new();
        hasher.update(&whole[..100]).update(&whole[100..]);
        assert_eq!(hasher.finish(), poly_hash(&whole));
    }

    #[test]
    fn test_single_byte_change_detected() {
        let mut bytes = vec![0u8; 200];
        let before = poly_hash(&bytes);
        bytes[137] = 1;
        assert_ne!(before, poly_hash(&bytes));
    }
}
