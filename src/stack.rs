// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! `GuardedStack`: a LIFO stack of `i32` that checks itself on every move.
//!
//! Every mutating operation runs the same shape:
//!
//! ```text
//! check ──▶ (grow | shrink)? ──▶ effect ──▶ refresh checksums ──▶ check
//! ```
//!
//! A failed check logs one line through `tracing`, writes a full `DumpReport`
//! to the stack's sink, and then either aborts the process or returns
//! `StackError::Corrupted`, depending on `FailurePolicy`. Popping an empty
//! stack is not corruption and never dumps: it returns `StackError::EmptyPop`
//! and the stack carries on.
//!
//! # Lifecycle
//!
//! `GuardedStack::default()` is `Uninitialized` (every operation reports
//! `DataNull`) until `init()` runs. `new`/`with_config` produce a `Live`
//! stack directly. `destroy()` releases the slots and leaves a `Destroyed`
//! husk that reports `StackFree` on any further use. Nothing moves backwards.
//!
//! # Threads
//!
//! One owner, one thread. The stack holds a `Box<dyn Write>` sink, so it is
//! neither `Send` nor `Sync`. Corruption is detected after the fact; it is not
//! prevented, and locks would not change that.

use std::cell::Cell;
use std::fmt;
use std::io::{self, Write};

use crate::capacity;
use crate::config::{FailurePolicy, ProtectionLevel, StackConfig};
use crate::dump::DumpReport;
use crate::region::{Checksums, ControlBlock, DataRegion};
use crate::types::{Element, Site, StackState, DESTROYED_SIZE, MAX_CAPACITY, POISON};
use crate::verify::{check_stack, ErrorKind, StackError, Verdict};

pub struct GuardedStack {
    pub(crate) control: ControlBlock,
    pub(crate) data: Option<DataRegion>,
    pub(crate) checksums: Checksums,
    config: StackConfig,
    name: String,
    creation_site: Option<Site>,
    last_check_site: Cell<Option<Site>>,
    sink: Box<dyn Write>,
}

impl Default for GuardedStack {
    /// An `Uninitialized` stack. Useful mostly to show what `DataNull` means.
    fn default() -> Self {
        Self::uninitialized(StackConfig::default())
    }
}

impl GuardedStack {
    /// Construct a live stack with the default configuration.
    #[track_caller]
    pub fn new(name: impl Into<String>) -> Result<Self, StackError> {
        Self::construct(name.into(), StackConfig::default(), Site::caller("construct"))
    }

    /// Construct a live stack.
    #[track_caller]
    pub fn with_config(name: impl Into<String>, config: StackConfig) -> Result<Self, StackError> {
        Self::construct(name.into(), config, Site::caller("construct"))
    }

    /// An `Uninitialized` stack with the given configuration.
    pub fn uninitialized(config: StackConfig) -> Self {
        Self {
            control: ControlBlock::default(),
            data: None,
            checksums: Checksums::default(),
            config,
            name: String::new(),
            creation_site: None,
            last_check_site: Cell::new(None),
            sink: Box::new(io::stderr()),
        }
    }

    /// Send diagnostic dumps to `sink` instead of stderr.
    pub fn with_sink(mut self, sink: impl Write + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    fn construct(name: String, config: StackConfig, site: Site) -> Result<Self, StackError> {
        let mut stack = Self::uninitialized(config);
        stack.init_at(name, site)?;
        Ok(stack)
    }

    /// Bring an `Uninitialized` stack to `Live` in place.
    ///
    /// A stack that is already live is only checked. A destroyed stack
    /// reports `StackFree`.
    #[track_caller]
    pub fn init(&mut self, name: impl Into<String>) -> Result<(), StackError> {
        let site = Site::caller("construct");
        match self.control.state {
            StackState::Uninitialized => self.init_at(name.into(), site),
            StackState::Live | StackState::Destroyed => self.guard(site),
        }
    }

    fn init_at(&mut self, name: String, site: Site) -> Result<(), StackError> {
        self.name = name;
        self.creation_site = Some(site);

        let requested = self.config.initial_capacity;
        let region = (requested as u64 <= MAX_CAPACITY as u64)
            .then(|| DataRegion::poisoned(requested))
            .flatten();
        let Some(region) = region else {
            return Err(self.fail(StackError::AllocationFailed { requested, site }));
        };

        self.control = ControlBlock::live(requested);
        self.data = Some(region);
        self.refresh_checksums();

        tracing::debug!(
            stack = %self.name,
            capacity = requested,
            protection = %self.config.protection,
            "constructed"
        );

        self.guard(site)
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    #[track_caller]
    pub fn push(&mut self, value: Element) -> Result<(), StackError> {
        let site = Site::caller("push");
        self.guard(site)?;

        if capacity::needs_grow(self.capacity(), self.len()) {
            self.grow(site)?;
        }

        let index = self.len();
        let slot = self.data.as_mut().and_then(|data| data.slots.get_mut(index));
        match slot {
            Some(slot) => *slot = value,
            None => return Err(self.corrupted(ErrorKind::StackOverflow, site)),
        }
        self.control.size += 1;
        self.refresh_checksums();

        self.guard(site)
    }

    #[track_caller]
    pub fn pop(&mut self) -> Result<Element, StackError> {
        let site = Site::caller("pop");
        self.guard(site)?;

        if capacity::needs_shrink(self.capacity(), self.len()) {
            self.shrink(site)?;
        }

        if self.control.size == 0 {
            tracing::debug!(stack = %self.name, %site, "pop from empty stack");
            return Err(StackError::EmptyPop { site });
        }

        self.control.size -= 1;
        let index = self.len();
        let slot = self.data.as_mut().and_then(|data| data.slots.get_mut(index));
        let value = match slot {
            Some(slot) => std::mem::replace(slot, POISON),
            None => return Err(self.corrupted(ErrorKind::StackOverflow, site)),
        };
        self.refresh_checksums();

        self.guard(site)?;
        Ok(value)
    }

    /// Top element, checked but not removed.
    #[track_caller]
    pub fn peek(&mut self) -> Result<Element, StackError> {
        let site = Site::caller("peek");
        self.guard(site)?;

        let top = self
            .len()
            .checked_sub(1)
            .and_then(|index| self.data.as_ref()?.slots.get(index).copied());
        top.ok_or(StackError::EmptyPop { site })
    }

    /// Release the slots. Any later operation reports `StackFree`.
    #[track_caller]
    pub fn destroy(&mut self) -> Result<(), StackError> {
        let site = Site::caller("destroy");
        self.guard(site)?;

        self.data = None;
        self.control.state = StackState::Destroyed;
        self.control.size = DESTROYED_SIZE;
        self.control.capacity = 0;

        tracing::debug!(stack = %self.name, %site, "destroyed");
        Ok(())
    }

    // ========================================================================
    // RESIZING
    // ========================================================================

    fn grow(&mut self, site: Site) -> Result<(), StackError> {
        let current = self.capacity();
        match capacity::grown_capacity(current) {
            Some(new_capacity) => self.resize_to(new_capacity, site),
            None => Err(self.fail(StackError::AllocationFailed {
                requested: usize::MAX,
                site,
            })),
        }
    }

    fn shrink(&mut self, site: Site) -> Result<(), StackError> {
        let new_capacity = capacity::shrunk_capacity(self.capacity(), self.len());
        self.resize_to(new_capacity, site)
    }

    fn resize_to(&mut self, new_capacity: usize, site: Site) -> Result<(), StackError> {
        self.guard(site)?;

        let size = self.len();
        let old_capacity = self.capacity();
        let resized = self
            .data
            .as_mut()
            .is_some_and(|data| capacity::resize_region(data, size, new_capacity));
        if !resized {
            return Err(self.fail(StackError::AllocationFailed {
                requested: new_capacity,
                site,
            }));
        }

        self.control.capacity = new_capacity as i64;
        self.refresh_checksums();

        tracing::debug!(
            stack = %self.name,
            from = old_capacity,
            to = new_capacity,
            size,
            "resized"
        );

        self.guard(site)
    }

    // ========================================================================
    // CHECKING
    // ========================================================================

    fn refresh_checksums(&mut self) {
        if !self.config.protection.checksums() {
            return;
        }
        self.checksums = Checksums {
            control: self.control.checksum(),
            data: self.data.as_ref().map_or(0, DataRegion::checksum),
        };
    }

    fn guard(&mut self, site: Site) -> Result<(), StackError> {
        self.last_check_site.set(Some(site));
        match check_stack(self) {
            Verdict::Ok => Ok(()),
            Verdict::Violated(kind) => Err(self.corrupted(kind, site)),
        }
    }

    fn corrupted(&mut self, kind: ErrorKind, site: Site) -> StackError {
        self.fail(StackError::Corrupted { kind, site })
    }

    /// Log, dump, then abort or hand the error back.
    fn fail(&mut self, error: StackError) -> StackError {
        self.last_check_site.set(Some(error.site()));
        tracing::error!(stack = %self.name, site = %error.site(), kind = %error.kind(), "stack integrity failure");

        let report = DumpReport::capture(self, Some(error.kind()));
        if let Err(err) = report.write_text(&mut self.sink).and_then(|()| self.sink.flush()) {
            tracing::warn!(error = %err, "could not write stack dump");
        }

        if self.config.failure_policy == FailurePolicy::Abort {
            std::process::abort();
        }
        error
    }

    /// Run every enabled check. Slots and fields are left as they are.
    ///
    /// Records the caller as the last check site, like any operation does.
    #[track_caller]
    pub fn verify(&self) -> Verdict {
        self.last_check_site.set(Some(Site::caller("verify")));
        check_stack(self)
    }

    // ========================================================================
    // REPORTING
    // ========================================================================

    /// Snapshot of the full internal state.
    pub fn report(&self) -> DumpReport {
        DumpReport::capture(self, check_stack(self).kind())
    }

    /// Write the human-readable report to `sink`.
    pub fn dump(&self, sink: &mut dyn Write) -> io::Result<()> {
        self.report().write_text(sink)
    }

    // ========================================================================
    // INTROSPECTION
    // ========================================================================

    /// Live element count. Zero for a stack whose size field is negative.
    pub fn len(&self) -> usize {
        usize::try_from(self.control.size).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocated slot count. Zero for a stack whose capacity field is negative.
    pub fn capacity(&self) -> usize {
        usize::try_from(self.control.capacity).unwrap_or(0)
    }

    pub fn state(&self) -> StackState {
        self.control.state
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn protection(&self) -> ProtectionLevel {
        self.config.protection
    }

    pub fn creation_site(&self) -> Option<Site> {
        self.creation_site
    }

    pub fn last_check_site(&self) -> Option<Site> {
        self.last_check_site.get()
    }

    pub fn checksums(&self) -> Checksums {
        self.checksums
    }

    /// Every slot, live and vacant, or `None` once there is no data region.
    pub fn raw_slots(&self) -> Option<&[Element]> {
        self.data.as_ref().map(|data| data.slots.as_slice())
    }
}

impl fmt::Debug for GuardedStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedStack")
            .field("name", &self.name)
            .field("state", &self.control.state)
            .field("size", &self.control.size)
            .field("capacity", &self.control.capacity)
            .field("protection", &self.config.protection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporting(capacity: usize) -> StackConfig {
        StackConfig::default()
            .with_protection(ProtectionLevel::Full)
            .with_initial_capacity(capacity)
            .with_failure_policy(FailurePolicy::Report)
    }

    #[test]
    fn test_new_stack_is_live_and_poisoned() {
        let stack = GuardedStack::with_config("s", reporting(3)).unwrap();
        assert_eq!(stack.state(), StackState::Live);
        assert_eq!(stack.len(), 0);
        assert_eq!(stack.capacity(), 3);
        assert_eq!(stack.raw_slots(), Some(&[POISON, POISON, POISON][..]));
        assert_eq!(stack.verify(), Verdict::Ok);
    }

    #[test]
    fn test_push_pop_lifo() {
        let mut stack = GuardedStack::with_config("s", reporting(50)).unwrap();
        for value in [5, 12, 17, 13] {
            stack.push(value).unwrap();
        }
        assert_eq!(stack.peek().unwrap(), 13);

        let popped: Vec<_> = (0..4).map(|_| stack.pop().unwrap()).collect();
        assert_eq!(popped, vec![13, 17, 12, 5]);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_zero_capacity_grows() {
        let mut stack = GuardedStack::with_config("s", reporting(0)).unwrap();
        stack.push(1).unwrap();
        assert_eq!(stack.capacity(), 1);
        stack.push(2).unwrap();
        assert_eq!(stack.capacity(), 2);
    }

    #[test]
    fn test_sites_are_callers() {
        let mut stack = GuardedStack::with_config("s", reporting(2)).unwrap();
        assert!(stack.creation_site().unwrap().file.ends_with("stack.rs"));

        stack.push(1).unwrap();
        let site = stack.last_check_site().unwrap();
        assert_eq!(site.operation, "push");
        assert!(site.file.ends_with("stack.rs"));
    }

    #[test]
    fn test_verify_records_its_site() {
        let mut stack = GuardedStack::with_config("s", reporting(2)).unwrap();
        stack.push(1).unwrap();
        assert_eq!(stack.last_check_site().unwrap().operation, "push");

        let line = line!() + 1;
        assert_eq!(stack.verify(), Verdict::Ok);
        let site = stack.last_check_site().unwrap();
        assert_eq!(site.operation, "verify");
        assert_eq!(site.line, line);
        assert!(site.file.ends_with("stack.rs"));
    }

    #[test]
    fn test_destroy_then_use_is_stack_free() {
        let mut stack = GuardedStack::with_config("s", reporting(2))
            .unwrap()
            .with_sink(io::sink());
        stack.destroy().unwrap();
        assert_eq!(stack.state(), StackState::Destroyed);
        assert_eq!(stack.raw_slots(), None);

        let err = stack.push(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StackFree);
        assert_eq!(stack.destroy().unwrap_err().kind(), ErrorKind::StackFree);
    }

    #[test]
    fn test_uninitialized_use_is_data_null() {
        let mut stack = GuardedStack::uninitialized(reporting(2)).with_sink(io::sink());
        assert_eq!(stack.pop().unwrap_err().kind(), ErrorKind::DataNull);
    }

    #[test]
    fn test_init_in_place() {
        let mut stack = GuardedStack::uninitialized(reporting(4));
        stack.init("late").unwrap();
        assert_eq!(stack.state(), StackState::Live);
        assert_eq!(stack.name(), "late");
        assert_eq!(stack.capacity(), 4);
        assert!(stack.creation_site().unwrap().file.ends_with("stack.rs"));

        stack.push(3).unwrap();
        stack.init("again").unwrap();
        assert_eq!(stack.name(), "late");
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_init_after_destroy_is_stack_free() {
        let mut stack = GuardedStack::with_config("s", reporting(2))
            .unwrap()
            .with_sink(io::sink());
        stack.destroy().unwrap();
        assert_eq!(stack.init("s").unwrap_err().kind(), ErrorKind::StackFree);
    }

    #[test]
    fn test_empty_peek() {
        let mut stack = GuardedStack::with_config("s", reporting(2)).unwrap();
        let err = stack.peek().unwrap_err();
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_no_protection_skips_checksums() {
        let config = reporting(2).with_protection(ProtectionLevel::NoProtection);
        let mut stack = GuardedStack::with_config("s", config).unwrap();
        stack.push(1).unwrap();
        assert_eq!(stack.checksums(), Checksums::default());
    }
}
