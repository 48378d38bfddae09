// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The integrity checker.
//!
//! # Priority (DO NOT REORDER)
//!
//! When several invariants are broken at once, exactly one is reported, and
//! it is always the first in this list:
//!
//! | # | Check              | Kinds                                           |
//! |---|--------------------|-------------------------------------------------|
//! | 1 | data liveness      | `StackFree`, `DataNull`                          |
//! | 2 | control canaries   | `LeftControlCanary`, `RightControlCanary`        |
//! | 3 | data canaries      | `LeftDataCanary`, `RightDataCanary`              |
//! |   | data boundary      | `RightDataCanary` (slot count != capacity)       |
//! | 4 | control checksum   | `ControlChecksumMismatch`                        |
//! | 5 | data checksum      | `DataChecksumMismatch`                           |
//! | 6 | capacity range     | `CapacityNegative`, `CapacityInfinite`           |
//! | 7 | size range         | `StackOverflow`, `StackUnderflow`                |
//!
//! Canaries before checksums, so that a write just past either end of the
//! data is reported as the boundary violation it is and not as a generic
//! checksum mismatch. The right data canary sits at `capacity`, so a
//! capacity field that disagrees with the slot count has moved that boundary
//! and is reported the same way. Out-of-range capacities are left to step 6.
//! Steps 2-3 run only when the protection level enables
//! canaries, steps 4-5 only when it enables checksums.
//!
//! Every function here is pure: checking twice with no mutation in between
//! gives the same verdict twice.

use crate::region::{ControlBlock, DataRegion};
use crate::stack::GuardedStack;
use crate::types::{StackState, MAX_CAPACITY};
use crate::verify::{ErrorKind, Verdict};

/// Check a stack handle that may be absent.
pub fn check_all(stack: Option<&GuardedStack>) -> Verdict {
    match stack {
        None => Verdict::Violated(ErrorKind::StackNull),
        Some(stack) => check_stack(stack),
    }
}

/// Run every enabled check in priority order.
pub fn check_stack(stack: &GuardedStack) -> Verdict {
    run_checks(stack).into()
}

fn run_checks(stack: &GuardedStack) -> Result<(), ErrorKind> {
    let level = stack.protection();
    let data = data_live(stack)?;

    if level.canaries() {
        control_canaries(&stack.control)?;
        data_canaries(data)?;
        data_boundary(&stack.control, data)?;
    }

    if level.checksums() {
        control_checksum(stack)?;
        data_checksum(stack, data)?;
    }

    capacity_ok(&stack.control)?;
    size_ok(&stack.control)
}

// ============================================================================
// REGION CHECKS
// ============================================================================

/// The data region exists and the stack has not been destroyed.
pub(crate) fn data_live(stack: &GuardedStack) -> Result<&DataRegion, ErrorKind> {
    if stack.control.state == StackState::Destroyed {
        return Err(ErrorKind::StackFree);
    }
    stack.data.as_ref().ok_or(ErrorKind::DataNull)
}

pub(crate) fn control_canaries(control: &ControlBlock) -> Result<(), ErrorKind> {
    if control.canaries_intact() {
        return Ok(());
    }
    if !control.left_canary.is_intact() {
        return Err(ErrorKind::LeftControlCanary);
    }
    if !control.right_canary.is_intact() {
        return Err(ErrorKind::RightControlCanary);
    }
    Ok(())
}

pub(crate) fn data_canaries(data: &DataRegion) -> Result<(), ErrorKind> {
    if data.canaries_intact() {
        return Ok(());
    }
    if !data.left_canary.is_intact() {
        return Err(ErrorKind::LeftDataCanary);
    }
    if !data.right_canary.is_intact() {
        return Err(ErrorKind::RightDataCanary);
    }
    Ok(())
}

/// The region holds exactly `capacity` slots.
pub(crate) fn data_boundary(control: &ControlBlock, data: &DataRegion) -> Result<(), ErrorKind> {
    let in_range = (0..=MAX_CAPACITY).contains(&control.capacity);
    if in_range && data.slots.len() as u64 != control.capacity as u64 {
        return Err(ErrorKind::RightDataCanary);
    }
    Ok(())
}

pub(crate) fn control_checksum(stack: &GuardedStack) -> Result<(), ErrorKind> {
    if stack.control.checksum() != stack.checksums.control {
        return Err(ErrorKind::ControlChecksumMismatch);
    }
    Ok(())
}

pub(crate) fn data_checksum(stack: &GuardedStack, data: &DataRegion) -> Result<(), ErrorKind> {
    if data.checksum() != stack.checksums.data {
        return Err(ErrorKind::DataChecksumMismatch);
    }
    Ok(())
}

// ============================================================================
// COMPOSITE CHECKS (used for per-region dump annotations)
// ============================================================================

/// Control canaries and control checksum, as far as the level enables them.
pub fn stack_control_ok(stack: &GuardedStack) -> Result<(), ErrorKind> {
    let level = stack.protection();
    if level.canaries() {
        control_canaries(&stack.control)?;
    }
    if level.checksums() {
        control_checksum(stack)?;
    }
    Ok(())
}

/// Liveness, data canaries, and data checksum, as far as the level enables them.
pub fn data_buffer_ok(stack: &GuardedStack) -> Result<(), ErrorKind> {
    let level = stack.protection();
    let data = data_live(stack)?;
    if level.canaries() {
        data_canaries(data)?;
        data_boundary(&stack.control, data)?;
    }
    if level.checksums() {
        data_checksum(stack, data)?;
    }
    Ok(())
}

pub(crate) fn capacity_ok(control: &ControlBlock) -> Result<(), ErrorKind> {
    if control.capacity < 0 {
        return Err(ErrorKind::CapacityNegative);
    }
    if control.capacity > MAX_CAPACITY {
        return Err(ErrorKind::CapacityInfinite);
    }
    Ok(())
}

pub(crate) fn size_ok(control: &ControlBlock) -> Result<(), ErrorKind> {
    if control.size > control.capacity {
        return Err(ErrorKind::StackOverflow);
    }
    if control.size < 0 {
        return Err(ErrorKind::StackUnderflow);
    }
    Ok(())
}
