// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host timers and the single-slot timeout handle the engines use.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

/// Handle returned by [`Timers::set_timeout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// The host's timeout facility.
pub trait Timers {
    /// Run `callback` once, `delay_ms` milliseconds from now.
    fn set_timeout(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerId;

    /// Cancel a pending timeout. Unknown or fired ids are ignored.
    fn clear_timeout(&self, id: TimerId);
}

/// Holds at most one pending timeout.
///
/// Setting a new timeout clears the pending one first. Dropping the slot
/// clears it too, so a callback never outlives its owner.
pub struct TimeoutSlot {
    timers: Rc<dyn Timers>,
    pending: Rc<Cell<Option<TimerId>>>,
    token: Rc<Cell<u64>>,
}

impl fmt::Debug for TimeoutSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeoutSlot")
            .field("pending", &self.pending.get())
            .finish_non_exhaustive()
    }
}

impl TimeoutSlot {
    /// An empty slot.
    pub fn new(timers: Rc<dyn Timers>) -> Self {
        Self {
            timers,
            pending: Rc::new(Cell::new(None)),
            token: Rc::new(Cell::new(0)),
        }
    }

    /// Replace any pending timeout with `callback` after `delay_ms`.
    pub fn set(&self, delay_ms: u64, callback: impl FnOnce() + 'static) {
        self.clear();
        let token = self.token.get().wrapping_add(1);
        self.token.set(token);
        let pending = Rc::clone(&self.pending);
        let current = Rc::clone(&self.token);
        let id = self.timers.set_timeout(
            delay_ms,
            Box::new(move || {
                // A superseded timeout the host failed to cancel.
                if current.get() != token {
                    return;
                }
                // Marks the slot as fired, even before `set` returns.
                current.set(token.wrapping_add(1));
                pending.set(None);
                callback();
            }),
        );
        // A synchronous host may already have fired the callback.
        if self.token.get() == token {
            self.pending.set(Some(id));
        }
    }

    /// Cancel the pending timeout, if any.
    pub fn clear(&self) {
        if let Some(id) = self.pending.take() {
            self.timers.clear_timeout(id);
        }
    }

    /// Whether a timeout is pending.
    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl Drop for TimeoutSlot {
    fn drop(&mut self) {
        self.clear();
    }
}

/// A deterministic clock for tests and headless hosts.
///
/// Time only moves through [`ManualTimers::advance`]. Timeouts fire in due
/// order, ties in scheduling order.
#[derive(Default)]
pub struct ManualTimers {
    now: Cell<u64>,
    next_id: Cell<u64>,
    queue: RefCell<BTreeMap<(u64, u64), Box<dyn FnOnce()>>>,
}

impl fmt::Debug for ManualTimers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTimers")
            .field("now", &self.now.get())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl ManualTimers {
    /// A clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Number of pending timeouts.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Move time forward by `ms`, firing every timeout that comes due.
    ///
    /// Timeouts scheduled by a firing callback also fire if they come due
    /// within the window.
    pub fn advance(&self, ms: u64) {
        let target = self.now.get().saturating_add(ms);
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                match queue.first_key_value() {
                    Some((&(due, _), _)) if due <= target => queue.pop_first(),
                    _ => None,
                }
            };
            let Some(((due, _), callback)) = next else {
                break;
            };
            self.now.set(due);
            callback();
        }
        self.now.set(target);
    }

    /// Fire every timeout due now without moving time.
    pub fn run_due(&self) {
        self.advance(0);
    }

    /// Ids of pending timeouts, in due order.
    pub fn pending_ids(&self) -> Vec<TimerId> {
        self.queue
            .borrow()
            .keys()
            .map(|&(_, id)| TimerId(id))
            .collect()
    }
}

impl Timers for ManualTimers {
    fn set_timeout(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let due = self.now.get().saturating_add(delay_ms);
        self.queue.borrow_mut().insert((due, id), callback);
        TimerId(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        self.queue.borrow_mut().retain(|&(_, queued), _| queued != id.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_order() {
        let timers = ManualTimers::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (delay, tag) in [(20, 'b'), (10, 'a'), (20, 'c')] {
            let log = Rc::clone(&log);
            timers.set_timeout(delay, Box::new(move || log.borrow_mut().push(tag)));
        }
        timers.advance(15);
        assert_eq!(*log.borrow(), ['a']);
        timers.advance(5);
        assert_eq!(*log.borrow(), ['a', 'b', 'c']);
        assert_eq!(timers.now(), 20);
    }

    #[test]
    fn callbacks_may_schedule_more() {
        let timers = Rc::new(ManualTimers::new());
        let hits = Rc::new(Cell::new(0));
        let inner_timers = Rc::clone(&timers);
        let inner_hits = Rc::clone(&hits);
        timers.set_timeout(
            5,
            Box::new(move || {
                inner_hits.set(inner_hits.get() + 1);
                let hits = Rc::clone(&inner_hits);
                inner_timers.set_timeout(5, Box::new(move || hits.set(hits.get() + 1)));
            }),
        );
        timers.advance(10);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn slot_supersedes_and_clears() {
        let timers = Rc::new(ManualTimers::new());
        let slot = TimeoutSlot::new(timers.clone());
        let hits = Rc::new(Cell::new(0));

        let h = Rc::clone(&hits);
        slot.set(10, move || h.set(h.get() + 1));
        let h = Rc::clone(&hits);
        slot.set(10, move || h.set(h.get() + 10));
        assert_eq!(timers.pending(), 1);
        assert!(slot.is_pending());

        timers.advance(10);
        assert_eq!(hits.get(), 10);
        assert!(!slot.is_pending());

        let h = Rc::clone(&hits);
        slot.set(10, move || h.set(h.get() + 100));
        drop(slot);
        timers.advance(10);
        assert_eq!(hits.get(), 10);
    }

    /// A host whose `clear_timeout` does nothing.
    struct LeakyTimers(ManualTimers);

    impl Timers for LeakyTimers {
        fn set_timeout(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> TimerId {
            self.0.set_timeout(delay_ms, callback)
        }

        fn clear_timeout(&self, _id: TimerId) {}
    }

    #[test]
    fn superseded_callbacks_stay_silent_when_the_host_cannot_cancel() {
        let timers = Rc::new(LeakyTimers(ManualTimers::new()));
        let slot = TimeoutSlot::new(timers.clone());
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        slot.set(10, move || l.borrow_mut().push("old"));
        let l = Rc::clone(&log);
        slot.set(10, move || l.borrow_mut().push("new"));
        assert_eq!(timers.0.pending(), 2);

        timers.0.advance(10);
        assert_eq!(*log.borrow(), ["new"]);
        assert!(!slot.is_pending());
    }
}
