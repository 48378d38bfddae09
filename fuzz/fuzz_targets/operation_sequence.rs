// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for arbitrary push/pop/peek sequences.
//!
//! A healthy stack must never report corruption. Whatever the fuzzer throws
//! at it, the stack has to agree with a plain `Vec` and keep every vacant
//! slot poisoned.

#![no_main]

use arbitrary::Arbitrary;
use guardstack::{
    ErrorKind, FailurePolicy, GuardedStack, ProtectionLevel, StackConfig, Verdict, POISON,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Push(i32),
    Pop,
    Peek,
}

#[derive(Debug, Arbitrary)]
struct Input {
    level: u8,
    initial_capacity: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let level = match input.level % 3 {
        0 => ProtectionLevel::NoProtection,
        1 => ProtectionLevel::StructuralOnly,
        _ => ProtectionLevel::Full,
    };
    let config = StackConfig::default()
        .with_protection(level)
        .with_initial_capacity(usize::from(input.initial_capacity))
        .with_failure_policy(FailurePolicy::Report);

    let mut stack = GuardedStack::with_config("fuzz", config)
        .expect("small capacities always allocate")
        .with_sink(std::io::sink());
    let mut model: Vec<i32> = Vec::new();

    for op in input.ops {
        match op {
            Op::Push(value) => {
                stack.push(value).expect("push on a healthy stack");
                model.push(value);
            }
            Op::Pop => match stack.pop() {
                Ok(value) => assert_eq!(Some(value), model.pop()),
                Err(err) => {
                    // Property 1: the only pop failure is a benign empty pop
                    assert!(model.is_empty());
                    assert_eq!(err.kind(), ErrorKind::StackUnderflow);
                    assert!(!err.is_corruption());
                }
            },
            Op::Peek => match stack.peek() {
                Ok(value) => assert_eq!(Some(&value), model.last()),
                Err(_) => assert!(model.is_empty()),
            },
        }

        // Property 2: size tracks the model, capacity covers size
        assert_eq!(stack.len(), model.len());
        assert!(stack.capacity() >= stack.len());

        // Property 3: live slots match, vacant slots are poisoned
        let slots = stack.raw_slots().expect("live stack has data");
        assert_eq!(&slots[..model.len()], model.as_slice());
        assert!(slots[model.len()..].iter().all(|&slot| slot == POISON));
    }

    // Property 4: the stack still verifies and tears down cleanly
    assert_eq!(stack.verify(), Verdict::Ok);
    stack.destroy().expect("destroy a healthy stack");
    assert_eq!(stack.verify(), Verdict::Violated(ErrorKind::StackFree));
});
