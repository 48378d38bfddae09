// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The verification layer: the error taxonomy and the integrity checker.
//!
//! `types` says what a failure looks like. `checks` decides whether one has
//! happened. The stack calls `check_stack` before and after every mutation
//! and never trusts its own bookkeeping in between.

mod types;
pub mod checks;

pub use checks::{check_all, check_stack};
pub use types::*;
