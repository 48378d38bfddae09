//! Shared test utilities and fixtures.

#![allow(dead_code)]

use guardstack::testing::{reporting_config, SharedSink};
use guardstack::{GuardedStack, ProtectionLevel, POISON};

pub const ALL_LEVELS: [ProtectionLevel; 3] = [
    ProtectionLevel::NoProtection,
    ProtectionLevel::StructuralOnly,
    ProtectionLevel::Full,
];

/// A live stack that reports failures into a readable sink.
pub fn reporting_stack(level: ProtectionLevel, capacity: usize) -> (GuardedStack, SharedSink) {
    let sink = SharedSink::new();
    let stack = GuardedStack::with_config("under-test", reporting_config(level, capacity))
        .expect("construct")
        .with_sink(sink.clone());
    (stack, sink)
}

/// Full protection, reporting policy, stderr-free.
pub fn full_stack(capacity: usize) -> GuardedStack {
    reporting_stack(ProtectionLevel::Full, capacity).0
}

/// Every slot in `[len, capacity)` holds the poison value.
pub fn assert_vacant_slots_poisoned(stack: &GuardedStack) {
    let slots = stack.raw_slots().expect("live stack has slots");
    assert_eq!(slots.len(), stack.capacity(), "slot count != capacity");
    for (index, &value) in slots.iter().enumerate().skip(stack.len()) {
        assert_eq!(value, POISON, "slot {} is vacant but not poisoned", index);
    }
}
