// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! What can go wrong, and how it is reported.
//!
//! `ErrorKind` is the taxonomy: one variant per broken invariant, plus the
//! two conditions that are not corruption at all (an empty pop and a failed
//! allocation). `Verdict` is what the checker returns. `StackError` is what
//! public operations hand back, carrying the call site that tripped it.

use serde::Serialize;
use std::fmt;

use crate::types::Site;

/// Every way a stack can be found broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// There is no stack at all.
    StackNull,
    /// A stack that should be live has no data region.
    DataNull,
    /// The stack was destroyed and then used again.
    StackFree,
    CapacityNegative,
    /// Capacity larger than any addressable buffer.
    CapacityInfinite,
    /// `size > capacity`.
    StackOverflow,
    /// `size < 0`, or a pop from an empty stack.
    StackUnderflow,
    LeftControlCanary,
    RightControlCanary,
    LeftDataCanary,
    RightDataCanary,
    /// Control fields changed without a checksum refresh.
    ControlChecksumMismatch,
    /// A slot changed without a checksum refresh.
    DataChecksumMismatch,
    /// Resize could not obtain memory.
    AllocationFailed,
}

impl ErrorKind {
    /// Text used in dumps and the console message.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::StackNull => "Stack is null",
            ErrorKind::DataNull => "Data is null",
            ErrorKind::StackFree => "Stack is already free",
            ErrorKind::CapacityNegative => "Negative capacity",
            ErrorKind::CapacityInfinite => "Capacity is infinite",
            ErrorKind::StackOverflow => "Overflow",
            ErrorKind::StackUnderflow => "Underflow",
            ErrorKind::LeftControlCanary => "Someone irrupted left stack canary",
            ErrorKind::RightControlCanary => "Someone irrupted right stack canary",
            ErrorKind::LeftDataCanary => "Someone irrupted left data canary",
            ErrorKind::RightDataCanary => "Someone irrupted right data canary",
            ErrorKind::ControlChecksumMismatch => "Someone irrupted stack",
            ErrorKind::DataChecksumMismatch => "Someone irrupted data",
            ErrorKind::AllocationFailed => "Memory allocation failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of one integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "kind", rename_all = "snake_case")]
pub enum Verdict {
    Ok,
    Violated(ErrorKind),
}

impl Verdict {
    #[inline]
    pub fn is_ok(self) -> bool {
        matches!(self, Verdict::Ok)
    }

    #[inline]
    pub fn kind(self) -> Option<ErrorKind> {
        match self {
            Verdict::Ok => None,
            Verdict::Violated(kind) => Some(kind),
        }
    }

    /// Text used in per-field dump annotations.
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Ok => "Ok",
            Verdict::Violated(kind) => kind.message(),
        }
    }
}

impl From<Result<(), ErrorKind>> for Verdict {
    fn from(result: Result<(), ErrorKind>) -> Self {
        match result {
            Ok(()) => Verdict::Ok,
            Err(kind) => Verdict::Violated(kind),
        }
    }
}

/// Error returned by stack operations.
///
/// Only `Corrupted` means the stack can no longer be trusted. Under
/// `FailurePolicy::Abort` it never reaches the caller: the process is gone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    #[error("integrity check failed in {site}: {kind}")]
    Corrupted { kind: ErrorKind, site: Site },

    #[error("pop from empty stack in {site}")]
    EmptyPop { site: Site },

    #[error("could not allocate {requested} slots in {site}")]
    AllocationFailed { requested: usize, site: Site },
}

impl StackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StackError::Corrupted { kind, .. } => *kind,
            StackError::EmptyPop { .. } => ErrorKind::StackUnderflow,
            StackError::AllocationFailed { .. } => ErrorKind::AllocationFailed,
        }
    }

    pub fn site(&self) -> Site {
        match self {
            StackError::Corrupted { site, .. }
            | StackError::EmptyPop { site }
            | StackError::AllocationFailed { site, .. } => *site,
        }
    }

    /// True when the stack's own state is what broke.
    pub fn is_corruption(&self) -> bool {
        matches!(self, StackError::Corrupted { .. })
    }
}
