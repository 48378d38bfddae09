// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! A stack that notices when it has been stepped on.
//!
//! `GuardedStack` is an ordinary growable LIFO stack of `i32`, wrapped in
//! redundant integrity checks: canaries bracketing the control block and the
//! data slots, a checksum over each, and a poison value in every vacant slot.
//! Every push and pop checks everything before it starts and again after it
//! finishes. A failed check produces a full diagnostic dump and then, by
//! default, aborts the process. A stack whose own bookkeeping is corrupt cannot
//! be trusted to unwind gracefully.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌────────────────┐
//! │ hash.rs  │──▶│ region.rs │──▶│ verify/checks  │──┐
//! │ poly_hash│   │ canaries, │   │ Verdict in     │  │
//! └──────────┘   │ checksums │   │ fixed priority │  │
//!                └───────────┘   └────────────────┘  ▼
//! ┌─────────────┐                             ┌──────────────┐   ┌─────────┐
//! │ capacity.rs │────────────────────────────▶│   stack.rs   │──▶│ dump.rs │
//! │ grow/shrink │                             │ GuardedStack │   │ report  │
//! └─────────────┘                             └──────────────┘   └─────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use guardstack::{FailurePolicy, GuardedStack, StackConfig};
//!
//! let config = StackConfig::default().with_failure_policy(FailurePolicy::Report);
//! let mut stack = GuardedStack::with_config("ints", config)?;
//!
//! for value in [5, 12, 17, 13] {
//!     stack.push(value)?;
//! }
//! assert_eq!(stack.pop()?, 13);
//! stack.destroy()?;
//! # Ok::<(), guardstack::StackError>(())
//! ```

pub mod capacity;
pub mod config;
pub mod dump;
pub mod hash;
mod region;
mod stack;
pub mod testing;
mod types;
pub mod verify;

pub use config::{FailurePolicy, ParseProtectionError, ProtectionLevel, StackConfig, PROTECTION_ENV};
pub use dump::{CanaryPair, ChecksumReport, DumpReport, FieldReport, SlotReport, SlotStatus};
pub use hash::{poly_hash, PolyHasher, HASH_BASE};
pub use region::Checksums;
pub use stack::GuardedStack;
pub use types::{
    Canary, Element, Site, StackState, CANARY_VALUE, DEFAULT_INITIAL_CAPACITY, DESTROYED_SIZE,
    MAX_CAPACITY, POISON,
};
pub use verify::{check_all, check_stack, ErrorKind, StackError, Verdict};
