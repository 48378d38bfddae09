// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for the polynomial checksum.
//!
//! Every checksum in the stack goes through `poly_hash`. It must be
//! deterministic, must agree with the incremental hasher at any split
//! point, and must see any single-byte change.

#![no_main]

use guardstack::{poly_hash, PolyHasher};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let whole = poly_hash(data);

    // Property 1: deterministic
    assert_eq!(whole, poly_hash(data));

    if data.is_empty() {
        assert_eq!(whole, 0, "empty span must hash to 0");
        return;
    }

    // Property 2: split invariance, using the first byte to pick the split
    let split = usize::from(data[0]) % (data.len() + 1);
    let mut hasher = PolyHasher::new();
    hasher.update(&data[..split]).update(&data[split..]);
    assert_eq!(hasher.finish(), whole, "split at {} changed the hash", split);

    // Property 3: flipping a byte changes the hash
    let index = usize::from(data[data.len() - 1]) % data.len();
    let mut flipped = data.to_vec();
    flipped[index] ^= 0x01;
    assert_ne!(poly_hash(&flipped), whole, "flip at {} went unnoticed", index);
});
