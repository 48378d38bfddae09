// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The building blocks of a guarded stack.
//!
//! Element type, the two magic values (canary and poison), call-site
//! provenance, and the lifecycle tag. Nothing here does any checking on its
//! own; `verify` is where these get compared against what they should be.
//!
//! # Magic values
//!
//! | Name     | Value                   | Lives in                               |
//! |----------|-------------------------|----------------------------------------|
//! | `CANARY` | `0xBADC_0FFE_E0DD_F00D` | both ends of the control block and data |
//! | `POISON` | `0x5EAD_BEEF`           | every slot in `[size, capacity)`        |
//!
//! The canary is 64 bits wide so that a stray write of any narrower integer
//! cannot leave it intact by coincidence.

use serde::Serialize;
use std::fmt;
use std::panic::Location;

/// The element kind the stack holds.
pub type Element = i32;

/// Value written into every vacant slot.
pub const POISON: Element = 0x5EAD_BEEF;

/// Value every intact canary holds.
pub const CANARY_VALUE: u64 = 0xBADC_0FFE_E0DD_F00D;

/// Starting capacity used by `StackConfig::default()`.
pub const DEFAULT_INITIAL_CAPACITY: usize = 50;

/// Largest slot count whose byte image is still addressable.
///
/// Anything above this cannot be a real capacity and is reported as
/// `CapacityInfinite`.
pub const MAX_CAPACITY: i64 = (isize::MAX as usize / std::mem::size_of::<Element>()) as i64;

/// Size written into the control block by `destroy()`.
pub const DESTROYED_SIZE: i64 = -1;

// =============================================================================
// CANARY
// =============================================================================

/// A boundary sentinel.
///
/// Two pairs exist per stack: one around the control block fields, one around
/// the data slots. Byte 0 is the least significant byte, so for a left canary
/// byte 7 is the one touching the guarded region and for a right canary it's
/// byte 0.
#[derive(Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Canary(u64);

impl Canary {
    pub const INTACT: Canary = Canary(CANARY_VALUE);

    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_intact(self) -> bool {
        self.0 == CANARY_VALUE
    }

    /// Replace the whole value.
    pub(crate) fn overwrite(&mut self, value: u64) {
        self.0 = value;
    }

    /// Overwrite a single byte of the canary's little-endian image.
    pub(crate) fn overwrite_byte(&mut self, index: usize, byte: u8) {
        let mut bytes = self.0.to_le_bytes();
        bytes[index % bytes.len()] = byte;
        self.0 = u64::from_le_bytes(bytes);
    }
}

impl Default for Canary {
    fn default() -> Self {
        Self::INTACT
    }
}

impl fmt::Debug for Canary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Canary({:#018x})", self.0)
    }
}

impl fmt::Display for Canary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

// =============================================================================
// PROVENANCE
// =============================================================================

/// Where an operation was called from.
///
/// Captured with `#[track_caller]`, so the location is the user's call site,
/// not somewhere inside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Site {
    pub operation: &'static str,
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl Site {
    /// Record the caller of the enclosing `#[track_caller]` function.
    #[track_caller]
    #[inline]
    pub fn caller(operation: &'static str) -> Self {
        let location = Location::caller();
        Self {
            operation,
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}() at {}:{}", self.operation, self.file, self.line)
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// `Uninitialized -> Live -> Destroyed`. No way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StackState {
    #[default]
    Uninitialized,
    Live,
    Destroyed,
}

impl StackState {
    /// Byte fed into the control-block checksum.
    #[inline]
    pub(crate) fn tag(self) -> u8 {
        match self {
            StackState::Uninitialized => 0,
            StackState::Live => 1,
            StackState::Destroyed => 2,
        }
    }
}

impl fmt::Display for StackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StackState::Uninitialized => "uninitialized",
            StackState::Live => "live",
            StackState::Destroyed => "destroyed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canary_overwrite_single_byte() {
        let mut canary = Canary::INTACT;
        assert!(canary.is_intact());

        canary.overwrite_byte(0, 0x00);
        assert!(!canary.is_intact());
        assert_eq!(canary.value() >> 8, CANARY_VALUE >> 8);
    }

    #[test]
    fn test_overwrite_with_same_byte_keeps_canary() {
        let mut canary = Canary::INTACT;
        let top = (CANARY_VALUE >> 56) as u8;
        canary.overwrite_byte(7, top);
        assert!(canary.is_intact());
    }

    #[test]
    fn test_site_captures_this_file() {
        let site = Site::caller("push");
        assert!(site.file.ends_with("types.rs"));
        assert_eq!(site.operation, "push");
        assert!(site.to_string().starts_with("push() at "));
    }

    #[test]
    fn test_poison_is_not_a_small_integer() {
        assert!(POISON > 1_000_000);
    }
}
