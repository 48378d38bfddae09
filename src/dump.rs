// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic reports.
//!
//! A `DumpReport` is a snapshot of everything the checker looks at, with each
//! piece already annotated: size and capacity with their verdicts, both canary
//! pairs, stored and recomputed checksums, and every slot marked live,
//! poisoned, or vacant-but-not-poisoned. It renders as text (`Display`) and
//! serializes to JSON.
//!
//! ```text
//! Dump from push() at src/main.rs:12 in stack "ints": Someone irrupted left data canary
//! stack <i32> "ints" [live, protection: full] from construct() at src/main.rs:5 {
//! size     = 2 (Ok)
//! capacity = 50 (Ok)
//! ...
//! ```
//!
//! Canary and checksum sections are omitted when the protection level turns
//! them off.

use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

use crate::config::ProtectionLevel;
use crate::stack::GuardedStack;
use crate::types::{Canary, Element, Site, StackState, POISON};
use crate::verify::checks::{capacity_ok, data_buffer_ok, size_ok, stack_control_ok};
use crate::verify::{ErrorKind, Verdict};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpReport {
    pub name: String,
    pub element_type: &'static str,
    pub state: StackState,
    pub protection: ProtectionLevel,
    pub failure: Option<ErrorKind>,
    pub creation_site: Option<Site>,
    pub failing_site: Option<Site>,
    pub size: FieldReport,
    pub capacity: FieldReport,
    pub control: Verdict,
    pub data: Verdict,
    pub control_canaries: Option<CanaryPair>,
    pub data_canaries: Option<CanaryPair>,
    pub control_checksum: Option<ChecksumReport>,
    pub data_checksum: Option<ChecksumReport>,
    pub slots: Vec<SlotReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    pub value: i64,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanaryPair {
    pub left: Canary,
    pub right: Canary,
}

impl CanaryPair {
    fn new(left: Canary, right: Canary) -> Self {
        Self { left, right }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecksumReport {
    pub stored: u64,
    pub current: u64,
}

impl ChecksumReport {
    pub fn is_equal(&self) -> bool {
        self.stored == self.current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// Live slot holding an ordinary value.
    Ok,
    /// Live slot that happens to hold the poison value.
    MaybePoison,
    /// Vacant slot, poisoned as it should be.
    Poison,
    /// Vacant slot that is not poisoned.
    NotPoisoned,
}

impl SlotStatus {
    pub fn label(self) -> &'static str {
        match self {
            SlotStatus::Ok => "Ok",
            SlotStatus::MaybePoison => "MAYBE POISON",
            SlotStatus::Poison => "Poison",
            SlotStatus::NotPoisoned => "NOT POISON, BUT SHOULD BE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotReport {
    pub index: usize,
    pub value: Element,
    pub live: bool,
    pub status: SlotStatus,
}

impl DumpReport {
    /// Snapshot `stack`. `failure` is the kind that triggered the dump, if any.
    pub fn capture(stack: &GuardedStack, failure: Option<ErrorKind>) -> Self {
        let level = stack.protection();
        let control = &stack.control;
        let region = stack.data.as_ref();
        let stored = stack.checksums();

        let control_canaries = level
            .canaries()
            .then(|| CanaryPair::new(control.left_canary, control.right_canary));
        let data_canaries = region
            .filter(|_| level.canaries())
            .map(|data| CanaryPair::new(data.left_canary, data.right_canary));

        let control_checksum = level.checksums().then(|| ChecksumReport {
            stored: stored.control,
            current: control.checksum(),
        });
        let data_checksum = region
            .filter(|_| level.checksums())
            .map(|data| ChecksumReport {
                stored: stored.data,
                current: data.checksum(),
            });

        let live = stack.len();
        let slots = region
            .map(|data| {
                data.slots
                    .iter()
                    .enumerate()
                    .map(|(index, &value)| slot_report(index, value, index < live))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: stack.name().to_string(),
            element_type: std::any::type_name::<Element>(),
            state: stack.state(),
            protection: level,
            failure,
            creation_site: stack.creation_site(),
            failing_site: stack.last_check_site(),
            size: FieldReport {
                value: control.size,
                verdict: size_ok(control).into(),
            },
            capacity: FieldReport {
                value: control.capacity,
                verdict: capacity_ok(control).into(),
            },
            control: stack_control_ok(stack).into(),
            data: data_buffer_ok(stack).into(),
            control_canaries,
            data_canaries,
            control_checksum,
            data_checksum,
            slots,
        }
    }

    pub fn write_text(&self, sink: &mut dyn Write) -> io::Result<()> {
        write!(sink, "{}", self)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn slot_report(index: usize, value: Element, live: bool) -> SlotReport {
    let poisoned = value == POISON;
    let status = match (live, poisoned) {
        (true, false) => SlotStatus::Ok,
        (true, true) => SlotStatus::MaybePoison,
        (false, true) => SlotStatus::Poison,
        (false, false) => SlotStatus::NotPoisoned,
    };
    SlotReport {
        index,
        value,
        live,
        status,
    }
}

fn canary_label(canary: Canary) -> &'static str {
    if canary.is_intact() {
        "Ok"
    } else {
        "IRRUPTION"
    }
}

fn write_canaries(f: &mut fmt::Formatter<'_>, title: &str, pair: &CanaryPair) -> fmt::Result {
    writeln!(f, "{}:", title)?;
    writeln!(f, "    canaryLeft  = {} ({})", pair.left, canary_label(pair.left))?;
    writeln!(f, "    canaryRight = {} ({})", pair.right, canary_label(pair.right))
}

fn write_checksum(f: &mut fmt::Formatter<'_>, what: &str, sum: &ChecksumReport) -> fmt::Result {
    let title = if what == "stack" { "Stack hashes" } else { "Data hashes" };
    writeln!(f, "{}:", title)?;
    writeln!(f, "    Stored {} hash  = {}", what, sum.stored)?;
    writeln!(f, "    Current {} hash = {}", what, sum.current)?;
    let verdict = if sum.is_equal() {
        "(Hashes are equal)"
    } else {
        "(HASHES AREN'T EQUAL)"
    };
    writeln!(f, "    {}", verdict)
}

impl fmt::Display for DumpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failing = self
            .failing_site
            .map_or_else(|| "<no check yet>".to_string(), |site| site.to_string());
        let failure = self.failure.map_or("no failure", ErrorKind::message);
        writeln!(f, "Dump from {} in stack \"{}\": {}", failing, self.name, failure)?;

        let created = self
            .creation_site
            .map_or_else(|| "<never constructed>".to_string(), |site| site.to_string());
        writeln!(
            f,
            "stack <{}> \"{}\" [{}, protection: {}] from {} {{",
            self.element_type, self.name, self.state, self.protection, created
        )?;

        writeln!(f, "size     = {} ({})", self.size.value, self.size.verdict.label())?;
        writeln!(
            f,
            "capacity = {} ({})",
            self.capacity.value,
            self.capacity.verdict.label()
        )?;
        writeln!(f)?;

        if let Some(pair) = &self.control_canaries {
            write_canaries(f, "Stack canaries", pair)?;
        }
        if let Some(pair) = &self.data_canaries {
            write_canaries(f, "Data canaries", pair)?;
        }
        if self.control_canaries.is_some() || self.data_canaries.is_some() {
            writeln!(f)?;
        }

        if let Some(sum) = &self.control_checksum {
            write_checksum(f, "stack", sum)?;
        }
        if let Some(sum) = &self.data_checksum {
            write_checksum(f, "data", sum)?;
        }
        if self.control_checksum.is_some() || self.data_checksum.is_some() {
            writeln!(f)?;
        }

        writeln!(f, "control ({})", self.control.label())?;
        writeln!(f, "data ({})", self.data.label())?;
        if !self.slots.is_empty() {
            writeln!(f, "{{")?;
            for slot in &self.slots {
                let marker = if slot.live { '*' } else { ' ' };
                writeln!(
                    f,
                    "   {}[{}] = {} ({})",
                    marker,
                    slot.index,
                    slot.value,
                    slot.status.label()
                )?;
            }
            writeln!(f, "}}")?;
        }
        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FailurePolicy, StackConfig};

    fn stack(level: ProtectionLevel) -> GuardedStack {
        let config = StackConfig::default()
            .with_protection(level)
            .with_initial_capacity(3)
            .with_failure_policy(FailurePolicy::Report);
        let mut stack = GuardedStack::with_config("dumped", config).unwrap();
        stack.push(7).unwrap();
        stack
    }

    #[test]
    fn test_full_report_sections() {
        let text = stack(ProtectionLevel::Full).report().to_string();

        assert!(text.contains("in stack \"dumped\": no failure"));
        assert!(text.contains("size     = 1 (Ok)"));
        assert!(text.contains("capacity = 3 (Ok)"));
        assert!(text.contains("Stack canaries:"));
        assert!(text.contains("Data canaries:"));
        assert!(text.contains("(Hashes are equal)"));
        assert!(text.contains("*[0] = 7 (Ok)"));
        assert!(text.contains(&format!(" [2] = {} (Poison)", POISON)));
    }

    #[test]
    fn test_structural_report_has_no_hashes() {
        let report = stack(ProtectionLevel::StructuralOnly).report();
        assert!(report.control_checksum.is_none());
        assert!(report.data_checksum.is_none());
        assert!(report.data_canaries.is_some());
        assert!(!report.to_string().contains("hash"));
    }

    #[test]
    fn test_unpoisoned_vacant_slot_flagged() {
        let mut stack = stack(ProtectionLevel::NoProtection);
        if let Some(data) = stack.data.as_mut() {
            data.slots[2] = 0;
        }
        let report = stack.report();
        assert_eq!(report.slots[2].status, SlotStatus::NotPoisoned);
        assert!(report.to_string().contains("NOT POISON, BUT SHOULD BE"));
    }

    #[test]
    fn test_live_poison_value_flagged() {
        let mut stack = stack(ProtectionLevel::Full);
        stack.push(POISON).unwrap();
        assert_eq!(stack.report().slots[1].status, SlotStatus::MaybePoison);
    }

    #[test]
    fn test_checksum_mismatch_rendered() {
        let mut stack = stack(ProtectionLevel::Full);
        if let Some(data) = stack.data.as_mut() {
            data.slots[0] = 8;
        }
        let report = stack.report();
        assert_eq!(report.failure, Some(ErrorKind::DataChecksumMismatch));
        assert!(report.to_string().contains("(HASHES AREN'T EQUAL)"));
    }

    #[test]
    fn test_json_names_failure_and_slots() {
        let mut stack = stack(ProtectionLevel::Full);
        stack.control.right_canary.overwrite_byte(0, 0);
        let json = stack.report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["failure"], "right_control_canary");
        assert_eq!(value["slots"].as_array().unwrap().len(), 3);
        assert_eq!(value["protection"], "full");
    }
}
