// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Growth and shrink policy for the data region.
//!
//! - **Grow** when a push finds `size == capacity`:
//!   `new = floor(capacity * 1.5) + 1`. The `+ 1` gets a zero-capacity stack
//!   moving.
//! - **Shrink** when a pop finds `capacity >= 2 * size`, before the underflow
//!   test: `new = max(capacity / 2, size)`. The floor at `size` means a shrink
//!   can never drop a live element. A shrink that would not change capacity is
//!   skipped.
//!
//! The 1.5x growth and 2x shrink threshold leave a gap between them, so a
//! push/pop pair at the boundary does not resize back and forth.
//!
//! `resize_region` only touches the slots. The stack wraps it with the
//! integrity check before and after, and refreshes both checksums.

use crate::region::DataRegion;
use crate::types::{MAX_CAPACITY, POISON};

/// Capacity after one growth step, or `None` past `MAX_CAPACITY`.
#[inline]
pub fn grown_capacity(capacity: usize) -> Option<usize> {
    let grown = capacity.checked_add(capacity / 2)?.checked_add(1)?;
    (grown <= MAX_CAPACITY as usize).then_some(grown)
}

/// Capacity after one shrink step. Never below `size`.
#[inline]
pub fn shrunk_capacity(capacity: usize, size: usize) -> usize {
    (capacity / 2).max(size)
}

/// Push-side trigger.
#[inline]
pub fn needs_grow(capacity: usize, size: usize) -> bool {
    size >= capacity
}

/// Pop-side trigger. False when the shrink would be a no-op.
#[inline]
pub fn needs_shrink(capacity: usize, size: usize) -> bool {
    let sparse = size
        .checked_mul(2)
        .is_some_and(|double| capacity >= double);
    sparse && shrunk_capacity(capacity, size) != capacity
}

/// Reallocate `region` to `new_capacity` slots.
///
/// Slots below `size` keep their values. Every slot in `[size, new_capacity)`
/// is poisoned, including any that were already vacant. Returns `false` if
/// the allocation failed, in which case the region is unchanged.
pub(crate) fn resize_region(region: &mut DataRegion, size: usize, new_capacity: usize) -> bool {
    let current = region.slots.len();

    if new_capacity > current {
        if region.slots.try_reserve_exact(new_capacity - current).is_err() {
            return false;
        }
        region.slots.resize(new_capacity, POISON);
    } else {
        region.slots.truncate(new_capacity);
        region.slots.shrink_to(new_capacity);
    }

    let first_vacant = size.min(new_capacity);
    region.slots[first_vacant..].fill(POISON);
    true
}
