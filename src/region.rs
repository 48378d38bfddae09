// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The two guarded regions and the checksums that cover them.
//!
//! ```text
//! ControlBlock:  [ left canary | size | capacity | state | right canary ]
//! DataRegion:    [ left canary | slot 0 .. slot capacity-1 | right canary ]
//! Checksums:     { control, data }   (stored apart from both regions)
//! ```
//!
//! Canaries are typed fields, not offsets into a shared allocation, so a
//! resize never has to move them: they travel with the region. The byte
//! images fed to the hash are little-endian and exclude the canaries.

use serde::Serialize;

use crate::hash::PolyHasher;
use crate::types::{Canary, Element, StackState, POISON};

/// Size, capacity, and lifecycle tag, bracketed by a canary pair.
///
/// Size and capacity are signed so that garbage written over them stays
/// representable (and reportable) instead of wrapping silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ControlBlock {
    pub(crate) left_canary: Canary,
    pub(crate) size: i64,
    pub(crate) capacity: i64,
    pub(crate) state: StackState,
    pub(crate) right_canary: Canary,
}

impl ControlBlock {
    pub(crate) fn live(capacity: usize) -> Self {
        Self {
            left_canary: Canary::INTACT,
            size: 0,
            capacity: capacity as i64,
            state: StackState::Live,
            right_canary: Canary::INTACT,
        }
    }

    /// Checksum over the mutable fields, canaries excluded.
    pub(crate) fn checksum(&self) -> u64 {
        PolyHasher::new()
            .update(&self.size.to_le_bytes())
            .update(&self.capacity.to_le_bytes())
            .update(&[self.state.tag()])
            .finish()
    }

    #[inline]
    pub(crate) fn canaries_intact(&self) -> bool {
        self.left_canary.is_intact() && self.right_canary.is_intact()
    }
}

impl Default for ControlBlock {
    fn default() -> Self {
        Self {
            left_canary: Canary::INTACT,
            size: 0,
            capacity: 0,
            state: StackState::Uninitialized,
            right_canary: Canary::INTACT,
        }
    }
}

/// Slot storage, bracketed by a canary pair. Exactly `capacity` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DataRegion {
    pub(crate) left_canary: Canary,
    pub(crate) slots: Vec<Element>,
    pub(crate) right_canary: Canary,
}

impl DataRegion {
    /// A fully poisoned region, or `None` if the allocation failed.
    pub(crate) fn poisoned(capacity: usize) -> Option<Self> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).ok()?;
        slots.resize(capacity, POISON);

        Some(Self {
            left_canary: Canary::INTACT,
            slots,
            right_canary: Canary::INTACT,
        })
    }

    /// Checksum over every slot, live and poisoned alike.
    pub(crate) fn checksum(&self) -> u64 {
        let mut hasher = PolyHasher::new();
        for slot in &self.slots {
            hasher.update(&slot.to_le_bytes());
        }
        hasher.finish()
    }

    #[inline]
    pub(crate) fn canaries_intact(&self) -> bool {
        self.left_canary.is_intact() && self.right_canary.is_intact()
    }
}

/// Stored checksums, refreshed after every mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Checksums {
    pub control: u64,
    pub data: u64,
}
