// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Kani model checking proofs for the guardstack resize policy.
//!
//! This standalone crate extracts the capacity arithmetic and the polynomial
//! checksum and proves their properties using Kani.
//!
//! Run with: `cargo kani`
//!
//! ## Verified Properties
//!
//! 1. **Growth makes room**: a grown capacity is strictly larger, never
//!    overflows, and never exceeds `MAX_CAPACITY`
//! 2. **Shrink keeps elements**: a shrunk capacity is never below size
//! 3. **No thrash**: a push that grows can't be undone by the next pop's shrink
//! 4. **Hash**: the empty span hashes to 0 and a single-byte change is seen

/// Largest capacity for 4-byte elements (copied from src/types.rs).
pub const MAX_CAPACITY: usize = isize::MAX as usize / 4;

/// Multiplier for each byte position (copied from src/hash.rs).
pub const HASH_BASE: u64 = 257;

// ============================================================================
// RESIZE POLICY (copied from src/capacity.rs)
// ============================================================================

pub fn grown_capacity(capacity: usize) -> Option<usize> {
    let grown = capacity.checked_add(capacity / 2)?.checked_add(1)?;
    (grown <= MAX_CAPACITY).then_some(grown)
}

pub fn shrunk_capacity(capacity: usize, size: usize) -> usize {
    (capacity / 2).max(size)
}

pub fn needs_grow(capacity: usize, size: usize) -> bool {
    size >= capacity
}

pub fn needs_shrink(capacity: usize, size: usize) -> bool {
    let sparse = size
        .checked_mul(2)
        .is_some_and(|double| capacity >= double);
    sparse && shrunk_capacity(capacity, size) != capacity
}

// ============================================================================
// CHECKSUM (copied from src/hash.rs)
// ============================================================================

pub fn poly_hash(bytes: &[u8]) -> u64 {
    let mut sum: u64 = 0;
    let mut power: u64 = 1;

    for &byte in bytes {
        sum = sum.wrapping_add(u64::from(byte).wrapping_mul(power));
        power = power.wrapping_mul(HASH_BASE);
    }

    sum
}

// ============================================================================
// KANI MODEL CHECKING PROOFS
// ============================================================================

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Verify growth never panics and always leaves room for the push.
    #[kani::proof]
    fn verify_growth_makes_room() {
        let capacity: usize = kani::any();

        if let Some(grown) = grown_capacity(capacity) {
            kani::assert(grown > capacity, "growth must add at least one slot");
            kani::assert(grown <= MAX_CAPACITY, "growth must respect MAX_CAPACITY");
        } else {
            kani::assert(
                capacity >= MAX_CAPACITY / 2,
                "growth may only fail near MAX_CAPACITY",
            );
        }
    }

    /// Verify a shrink never drops a live element.
    #[kani::proof]
    fn verify_shrink_keeps_size() {
        let capacity: usize = kani::any();
        let size: usize = kani::any_where(|&s| s <= capacity);

        let shrunk = shrunk_capacity(capacity, size);
        kani::assert(shrunk >= size, "shrink must keep every live element");
        kani::assert(shrunk <= capacity, "shrink must not grow");

        if needs_shrink(capacity, size) {
            kani::assert(shrunk < capacity, "a triggered shrink must change capacity");
        }
    }

    /// Verify the push after a grow and the pop after that don't resize back.
    #[kani::proof]
    fn verify_no_thrash_at_boundary() {
        let capacity: usize = kani::any_where(|&c| c < MAX_CAPACITY / 2);
        kani::assume(needs_grow(capacity, capacity));

        let grown = grown_capacity(capacity).unwrap();
        // Push lands: size = capacity + 1. Pop sees that size.
        let size_at_pop = capacity + 1;
        kani::assert(
            !needs_shrink(grown, size_at_pop),
            "pop right after a growing push must not shrink",
        );
    }

    /// Verify the empty span hashes to 0.
    #[kani::proof]
    fn verify_empty_hash_is_zero() {
        kani::assert(poly_hash(&[]) == 0, "empty span must hash to 0");
    }

    /// Verify any single-byte change in a short span changes the hash.
    #[kani::proof]
    #[kani::unwind(5)]
    fn verify_hash_sees_byte_change() {
        let bytes: [u8; 4] = kani::any();
        let index: usize = kani::any_where(|&i| i < 4);
        let replacement: u8 = kani::any_where(|&b| b != bytes[index]);

        let mut changed = bytes;
        changed[index] = replacement;
        kani::assert(
            poly_hash(&bytes) != poly_hash(&changed),
            "single-byte change must change the hash",
        );
    }
}
