// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Deliberate corruption and capture sinks, for tests and the CLI demo.
//!
//! Real corruption comes from stray pointers in unsafe code somewhere else in
//! the process. This crate forbids `unsafe`, so the stray writes are simulated
//! here instead: each `Corruption` variant pokes exactly one thing, without
//! refreshing any checksum, the way a wild write would.
//!
//! This module is always compiled but hidden from documentation.

#![doc(hidden)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use crate::config::{FailurePolicy, ProtectionLevel, StackConfig};
use crate::region::DataRegion;
use crate::stack::GuardedStack;
use crate::types::Element;

/// One stray write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    /// Zero the whole left control canary.
    LeftControlCanary,
    /// Zero the whole right control canary.
    RightControlCanary,
    /// Zero the whole left data canary.
    LeftDataCanary,
    /// Zero the whole right data canary.
    RightDataCanary,
    /// Write one byte immediately before slot 0.
    ByteBeforeData(u8),
    /// Write one byte immediately after the last slot.
    ByteAfterData(u8),
    /// Overwrite a slot without touching anything else.
    Slot { index: usize, value: Element },
    /// Overwrite the size field.
    Size(i64),
    /// Overwrite the capacity field.
    Capacity(i64),
    /// Overwrite the stored data checksum.
    StoredDataChecksum(u64),
    /// Drop the data region while leaving the stack marked live.
    DropData,
}

/// Apply `corruption` to `stack`.
///
/// Returns `false` if there was nothing to corrupt (no data region, or a slot
/// index out of range).
pub fn corrupt(stack: &mut GuardedStack, corruption: Corruption) -> bool {
    match corruption {
        Corruption::LeftControlCanary => stack.control.left_canary.overwrite(0),
        Corruption::RightControlCanary => stack.control.right_canary.overwrite(0),
        Corruption::Size(size) => stack.control.size = size,
        Corruption::Capacity(capacity) => stack.control.capacity = capacity,
        Corruption::StoredDataChecksum(sum) => stack.checksums.data = sum,
        Corruption::DropData => return stack.data.take().is_some(),
        _ => {
            return stack
                .data
                .as_mut()
                .is_some_and(|data| corrupt_data(data, corruption))
        }
    }
    true
}

fn corrupt_data(data: &mut DataRegion, corruption: Corruption) -> bool {
    match corruption {
        Corruption::LeftDataCanary => data.left_canary.overwrite(0),
        Corruption::RightDataCanary => data.right_canary.overwrite(0),
        // Byte 7 of the left canary touches slot 0; byte 0 of the right
        // canary touches the last slot.
        Corruption::ByteBeforeData(byte) => data.left_canary.overwrite_byte(7, byte),
        Corruption::ByteAfterData(byte) => data.right_canary.overwrite_byte(0, byte),
        Corruption::Slot { index, value } => match data.slots.get_mut(index) {
            Some(slot) => *slot = value,
            None => return false,
        },
        _ => return false,
    }
    true
}

/// Config that reports failures instead of aborting.
pub fn reporting_config(protection: ProtectionLevel, initial_capacity: usize) -> StackConfig {
    StackConfig::default()
        .with_protection(protection)
        .with_initial_capacity(initial_capacity)
        .with_failure_policy(FailurePolicy::Report)
}

/// In-memory sink whose contents stay readable after the stack takes a clone.
#[derive(Debug, Clone, Default)]
pub struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CANARY_VALUE, POISON};
    use crate::verify::{ErrorKind, Verdict};

    #[test]
    fn test_byte_after_data_changes_one_byte() {
        let mut stack =
            GuardedStack::with_config("t", reporting_config(ProtectionLevel::Full, 2)).unwrap();
        assert!(corrupt(&mut stack, Corruption::ByteAfterData(0x00)));

        let right = stack.data.as_ref().unwrap().right_canary.value();
        assert_eq!(right >> 8, CANARY_VALUE >> 8);
        assert_ne!(right, CANARY_VALUE);
        assert_eq!(
            stack.verify(),
            Verdict::Violated(ErrorKind::RightDataCanary)
        );
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut stack =
            GuardedStack::with_config("t", reporting_config(ProtectionLevel::Full, 2)).unwrap();
        assert!(!corrupt(&mut stack, Corruption::Slot { index: 9, value: 1 }));
        assert_eq!(stack.raw_slots(), Some(&[POISON, POISON][..]));
    }

    #[test]
    fn test_shared_sink_sees_writes_through_clone() {
        let sink = SharedSink::new();
        let mut writer = sink.clone();
        writer.write_all(b"dump").unwrap();
        assert_eq!(sink.contents(), "dump");
        sink.clear();
        assert!(sink.is_empty());
    }
}
