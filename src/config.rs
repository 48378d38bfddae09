// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! How much checking a stack does, and what happens when a check fails.
//!
//! # Protection levels
//!
//! | Level            | Canaries | Checksums | Cost per op          |
//! |------------------|----------|-----------|----------------------|
//! | `NoProtection`   | no       | no        | O(1) amortized       |
//! | `StructuralOnly` | yes      | no        | O(1) amortized       |
//! | `Full`           | yes      | yes       | O(capacity)          |
//!
//! Liveness, capacity range, and size range are checked at every level. They
//! are a handful of comparisons.
//!
//! # Selection order
//!
//! 1. `GUARDSTACK_PROTECTION` env var (`none`, `structural`, `full`)
//! 2. Cargo feature `protection-none` or `protection-structural`
//! 3. `Full`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::DEFAULT_INITIAL_CAPACITY;

/// Env var consulted by [`ProtectionLevel::from_env`].
pub const PROTECTION_ENV: &str = "GUARDSTACK_PROTECTION";

// ============================================================================
// PROTECTION LEVEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionLevel {
    /// Sentinels and checksums disabled. No corruption detection.
    NoProtection,
    /// Sentinels only.
    StructuralOnly,
    /// Sentinels and checksums.
    Full,
}

impl ProtectionLevel {
    /// Level chosen by cargo features at build time.
    pub const fn compiled_default() -> Self {
        if cfg!(feature = "protection-none") {
            ProtectionLevel::NoProtection
        } else if cfg!(feature = "protection-structural") {
            ProtectionLevel::StructuralOnly
        } else {
            ProtectionLevel::Full
        }
    }

    /// Level from `GUARDSTACK_PROTECTION`, or the compiled default.
    ///
    /// An unparseable value is logged and ignored rather than treated as fatal.
    pub fn from_env() -> Self {
        match std::env::var(PROTECTION_ENV) {
            Ok(raw) => raw.parse().unwrap_or_else(|err: ParseProtectionError| {
                tracing::warn!(value = %raw, error = %err, "ignoring {}", PROTECTION_ENV);
                Self::compiled_default()
            }),
            Err(_) => Self::compiled_default(),
        }
    }

    #[inline]
    pub fn canaries(self) -> bool {
        !matches!(self, ProtectionLevel::NoProtection)
    }

    #[inline]
    pub fn checksums(self) -> bool {
        matches!(self, ProtectionLevel::Full)
    }
}

impl Default for ProtectionLevel {
    fn default() -> Self {
        Self::compiled_default()
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProtectionLevel::NoProtection => "none",
            ProtectionLevel::StructuralOnly => "structural",
            ProtectionLevel::Full => "full",
        };
        f.write_str(s)
    }
}

/// Unrecognized protection level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown protection level '{0}' (expected none, structural, or full)")]
pub struct ParseProtectionError(pub String);

impl FromStr for ProtectionLevel {
    type Err = ParseProtectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" | "no-protection" => Ok(ProtectionLevel::NoProtection),
            "structural" | "canary" | "structural-only" => Ok(ProtectionLevel::StructuralOnly),
            "full" | "hash" => Ok(ProtectionLevel::Full),
            _ => Err(ParseProtectionError(s.to_string())),
        }
    }
}

// ============================================================================
// FAILURE POLICY
// ============================================================================

/// What to do after a failed integrity check has been dumped.
///
/// Neither policy applies to popping an empty stack. That is a caller mistake
/// on a healthy stack, and always comes back as `StackError::EmptyPop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Dump, then `std::process::abort()`.
    #[default]
    Abort,
    /// Dump, then return `StackError::Corrupted`. The caller must not keep
    /// using the stack for anything but diagnostics.
    Report,
}

// ============================================================================
// STACK CONFIG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackConfig {
    pub protection: ProtectionLevel,
    pub initial_capacity: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            protection: ProtectionLevel::default(),
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl StackConfig {
    /// Defaults, with the protection level taken from the environment.
    pub fn from_env() -> Self {
        Self {
            protection: ProtectionLevel::from_env(),
            ..Self::default()
        }
    }

    pub fn with_protection(mut self, protection: ProtectionLevel) -> Self {
        self.protection = protection;
        self
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
