//! Property-based tests using proptest.
//!
//! Random operation sequences against a `Vec` model: LIFO order, the poison
//! invariant, canaries staying intact, and checks being repeatable.

mod common;

use common::{assert_vacant_slots_poisoned, reporting_stack, ALL_LEVELS};
use guardstack::testing::{corrupt, Corruption};
use guardstack::{poly_hash, ErrorKind, PolyHasher, ProtectionLevel, Verdict, POISON};
use proptest::prelude::*;

// ============================================================================
// STRATEGIES
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Op {
    Push(i32),
    Pop,
}

/// Pushes outnumber pops two to one, so stacks actually grow.
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => any::<i32>().prop_map(Op::Push),
        1 => Just(Op::Pop),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 0..200)
}

fn level_strategy() -> impl Strategy<Value = ProtectionLevel> {
    prop::sample::select(ALL_LEVELS.to_vec())
}

// ============================================================================
// STACK PROPERTIES
// ============================================================================

proptest! {
    /// Property: the stack agrees with a Vec on every pop, at every level.
    #[test]
    fn prop_matches_vec_model(
        ops in ops_strategy(),
        level in level_strategy(),
        capacity in 0usize..8,
    ) {
        let (mut stack, sink) = reporting_stack(level, capacity);
        let mut model = Vec::new();

        for op in ops {
            match op {
                Op::Push(value) => {
                    stack.push(value).unwrap();
                    model.push(value);
                }
                Op::Pop => match stack.pop() {
                    Ok(value) => {
                        prop_assert_eq!(Some(value), model.pop());
                    }
                    Err(err) => {
                        prop_assert!(model.is_empty());
                        prop_assert_eq!(err.kind(), ErrorKind::StackUnderflow);
                    }
                },
            }
            prop_assert_eq!(stack.len(), model.len());
            prop_assert!(stack.capacity() >= stack.len());
        }

        prop_assert!(sink.is_empty());
    }

    /// Property: N pushes past the starting capacity come back reversed.
    #[test]
    fn prop_lifo_law(values in prop::collection::vec(any::<i32>(), 51..300)) {
        let (mut stack, _) = reporting_stack(ProtectionLevel::Full, 50);
        for &value in &values {
            stack.push(value).unwrap();
        }

        let popped: Vec<i32> = (0..values.len()).map(|_| stack.pop().unwrap()).collect();
        let reversed: Vec<i32> = values.iter().rev().copied().collect();
        prop_assert_eq!(popped, reversed);
    }

    /// Property: after every operation, vacant slots hold poison and the
    /// canaries and checksums still verify.
    #[test]
    fn prop_poison_and_sentinels_hold(ops in ops_strategy(), capacity in 0usize..8) {
        let (mut stack, _) = reporting_stack(ProtectionLevel::Full, capacity);

        for op in ops {
            match op {
                Op::Push(value) => stack.push(value).unwrap(),
                Op::Pop => {
                    let before = stack.len();
                    if stack.pop().is_ok() {
                        let slots = stack.raw_slots().unwrap();
                        prop_assert_eq!(slots.get(before - 1).copied().unwrap_or(POISON), POISON);
                    }
                }
            }
            assert_vacant_slots_poisoned(&stack);

            let report = stack.report();
            let control = report.control_canaries.unwrap();
            let data = report.data_canaries.unwrap();
            prop_assert!(control.left.is_intact() && control.right.is_intact());
            prop_assert!(data.left.is_intact() && data.right.is_intact());
            prop_assert_eq!(stack.verify(), Verdict::Ok);
        }
    }

    /// Property: checking twice without a mutation gives the same verdict.
    #[test]
    fn prop_check_idempotent(
        ops in ops_strategy(),
        level in level_strategy(),
        slot in 0usize..4,
        value in any::<i32>(),
    ) {
        let (mut stack, _) = reporting_stack(level, 4);
        for op in ops {
            match op {
                Op::Push(v) => stack.push(v).unwrap(),
                Op::Pop => { let _ = stack.pop(); }
            }
        }
        corrupt(&mut stack, Corruption::Slot { index: slot, value });

        let first = stack.verify();
        let second = stack.verify();
        prop_assert_eq!(first, second);
    }

    /// Property: a single-byte write just outside the data region is always
    /// reported as a boundary violation when canaries are on.
    #[test]
    fn prop_boundary_write_is_canary(
        pushes in 0usize..60,
        byte in any::<u8>(),
        after in any::<bool>(),
    ) {
        let (mut stack, _) = reporting_stack(ProtectionLevel::Full, 4);
        for value in 0..pushes {
            stack.push(value as i32).unwrap();
        }

        let corruption = if after {
            Corruption::ByteAfterData(byte)
        } else {
            Corruption::ByteBeforeData(byte)
        };
        corrupt(&mut stack, corruption);

        let report = stack.report();
        let data = report.data_canaries.unwrap();
        let verdict = stack.verify();
        if data.left.is_intact() && data.right.is_intact() {
            // The byte happened to match what was already there.
            prop_assert_eq!(verdict, Verdict::Ok);
        } else if after {
            prop_assert_eq!(verdict, Verdict::Violated(ErrorKind::RightDataCanary));
        } else {
            prop_assert_eq!(verdict, Verdict::Violated(ErrorKind::LeftDataCanary));
        }
    }
}

// ============================================================================
// HASH PROPERTIES
// ============================================================================

proptest! {
    /// Property: hashing is deterministic and splitting the input doesn't matter.
    #[test]
    fn prop_hash_split_invariant(bytes in prop::collection::vec(any::<u8>(), 0..512), split in 0usize..512) {
        let split = split.min(bytes.len());
        let mut hasher = PolyHasher::new();
        hasher.update(&bytes[..split]).update(&bytes[split..]);

        prop_assert_eq!(hasher.finish(), poly_hash(&bytes));
        prop_assert_eq!(poly_hash(&bytes), poly_hash(&bytes));
    }

    /// Property: changing any single byte changes the hash.
    #[test]
    fn prop_hash_sees_single_byte_change(
        bytes in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        delta in 1u8..=255,
    ) {
        let mut changed = bytes.clone();
        let i = index.index(bytes.len());
        changed[i] = changed[i].wrapping_add(delta);
        prop_assert_ne!(poly_hash(&bytes), poly_hash(&changed));
    }
}
