// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the guardstack demonstrator.
//!
//! Three subcommands: `demo` runs the classic push/pop sequence, `corrupt`
//! damages a stack on purpose so you can see what the dump looks like, and
//! `stress` runs a long random push/pop sequence and reports how much the
//! chosen protection level cost.

pub mod display;

use clap::{Parser, Subcommand, ValueEnum};
use guardstack::testing::Corruption;
use guardstack::ProtectionLevel;

#[derive(Parser)]
#[command(
    name = "guardstack",
    about = "Self-verifying stack with canaries, checksums, and poisoned slots",
    version
)]
pub struct Cli {
    /// Log resizes and lifecycle events (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Push values, then pop them all back
    Demo {
        /// Values to push, in order
        #[arg(default_values_t = [5, 12, 17, 13], allow_negative_numbers = true)]
        values: Vec<i32>,

        /// Protection level: none, structural, or full (default: GUARDSTACK_PROTECTION or build default)
        #[arg(short, long)]
        protection: Option<ProtectionLevel>,

        /// Starting capacity
        #[arg(short, long, default_value = "50")]
        capacity: usize,
    },

    /// Corrupt a stack on purpose and print the diagnostic dump
    Corrupt {
        /// What to overwrite
        #[arg(value_enum)]
        target: CorruptTarget,

        /// Protection level: none, structural, or full
        #[arg(short, long, default_value = "full")]
        protection: ProtectionLevel,

        /// Print the dump as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Abort the process after the dump, as a production build would
        #[arg(long)]
        abort: bool,
    },

    /// Run random pushes and pops and report the cost of checking
    Stress {
        /// Number of operations
        #[arg(short = 'n', long, default_value = "100000")]
        ops: usize,

        /// Protection level: none, structural, or full
        #[arg(short, long, default_value = "full")]
        protection: ProtectionLevel,

        /// Seed for the operation sequence
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

/// Corruption targets exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CorruptTarget {
    LeftControlCanary,
    RightControlCanary,
    LeftDataCanary,
    RightDataCanary,
    /// One byte just past the last slot
    ByteAfterData,
    /// An interior slot, leaving both canaries alone
    Slot,
    /// The size field
    Size,
    /// The capacity field
    Capacity,
    /// Use the stack after destroying it
    UseAfterDestroy,
}

impl CorruptTarget {
    /// The stray write to apply, or `None` for targets that are not a write.
    pub fn corruption(self) -> Option<Corruption> {
        let corruption = match self {
            CorruptTarget::LeftControlCanary => Corruption::LeftControlCanary,
            CorruptTarget::RightControlCanary => Corruption::RightControlCanary,
            CorruptTarget::LeftDataCanary => Corruption::LeftDataCanary,
            CorruptTarget::RightDataCanary => Corruption::RightDataCanary,
            CorruptTarget::ByteAfterData => Corruption::ByteAfterData(0x00),
            CorruptTarget::Slot => Corruption::Slot {
                index: 1,
                value: 0x0BAD,
            },
            CorruptTarget::Size => Corruption::Size(1_000),
            CorruptTarget::Capacity => Corruption::Capacity(-7),
            CorruptTarget::UseAfterDestroy => return None,
        };
        Some(corruption)
    }
}
