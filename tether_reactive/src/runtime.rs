// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The runtime handle: observer tracking and batch coalescing.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::effect::{Cleanup, Effect, EffectNode};
use crate::memo::Memo;
use crate::signal::Signal;

/// Owner of the observer stack and the pending-effect queue.
///
/// Cloning a `Runtime` yields another handle to the same runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

struct RuntimeInner {
    /// Effects currently running, innermost last. `None` marks an untracked scope.
    observers: RefCell<Vec<Option<Rc<EffectNode>>>>,
    batch_depth: Cell<u32>,
    /// Effects triggered inside a batch, in first-trigger order.
    pending: RefCell<Vec<Rc<EffectNode>>>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("batch_depth", &self.inner.batch_depth.get())
            .field("pending", &self.inner.pending.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                observers: RefCell::new(Vec::new()),
                batch_depth: Cell::new(0),
                pending: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Create a signal holding `value`.
    pub fn signal<T: Clone + PartialEq + 'static>(&self, value: T) -> Signal<T> {
        Signal::new(self.clone(), value)
    }

    /// Register an effect and run it once immediately.
    ///
    /// The closure may return a [`Cleanup`], which runs before the next run
    /// and when the returned [`Effect`] is disposed or dropped.
    pub fn effect(&self, f: impl FnMut() -> Option<Cleanup> + 'static) -> Effect {
        let node = EffectNode::new(f);
        node.execute(self);
        Effect::from_node(node)
    }

    /// Create a memoized derivation of other signals.
    pub fn memo<T: Clone + PartialEq + 'static>(&self, f: impl Fn() -> T + 'static) -> Memo<T> {
        Memo::new(self, f)
    }

    /// Apply every write made inside `f` as one atomic update.
    ///
    /// Values change immediately; dependent effects run once, after the
    /// outermost batch exits, and therefore never observe an intermediate
    /// combination of values.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.inner.batch_depth.set(self.inner.batch_depth.get() + 1);
        let result = f();
        let depth = self.inner.batch_depth.get() - 1;
        self.inner.batch_depth.set(depth);
        if depth == 0 {
            self.flush();
        }
        result
    }

    /// Run `f` without recording any signal reads as dependencies.
    pub fn untrack<R>(&self, f: impl FnOnce() -> R) -> R {
        self.push_observer(None);
        let result = f();
        self.pop_observer();
        result
    }

    /// Returns `true` while inside [`Runtime::batch`].
    pub fn is_batching(&self) -> bool {
        self.inner.batch_depth.get() > 0
    }

    pub(crate) fn current_observer(&self) -> Option<Rc<EffectNode>> {
        self.inner.observers.borrow().last().cloned().flatten()
    }

    pub(crate) fn push_observer(&self, node: Option<Rc<EffectNode>>) {
        self.inner.observers.borrow_mut().push(node);
    }

    pub(crate) fn pop_observer(&self) {
        self.inner.observers.borrow_mut().pop();
    }

    /// Run `node` now, or queue it if a batch is open.
    pub(crate) fn schedule(&self, node: Rc<EffectNode>) {
        if self.is_batching() {
            let mut pending = self.inner.pending.borrow_mut();
            if !pending.iter().any(|queued| Rc::ptr_eq(queued, &node)) {
                pending.push(node);
            }
            return;
        }
        node.execute(self);
    }

    fn flush(&self) {
        loop {
            let pending = core::mem::take(&mut *self.inner.pending.borrow_mut());
            if pending.is_empty() {
                break;
            }
            tracing::trace!(effects = pending.len(), "flushing batched effects");
            for node in pending {
                node.execute(self);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn batch_runs_each_dependent_effect_once() {
        let rt = Runtime::new();
        let a = rt.signal(0_u32);
        let b = rt.signal(0_u32);
        let log = Rc::new(RefCell::new(Vec::new()));

        let _effect = rt.effect({
            let (a, b, log) = (a.clone(), b.clone(), log.clone());
            move || {
                log.borrow_mut().push((a.get(), b.get()));
                None
            }
        });

        rt.batch(|| {
            a.set(1);
            b.set(2);
            a.set(3);
        });

        assert_eq!(*log.borrow(), vec![(0, 0), (3, 2)]);
    }

    #[test]
    fn nested_batches_flush_at_outermost_exit() {
        let rt = Runtime::new();
        let a = rt.signal(0_u32);
        let runs = Rc::new(Cell::new(0_u32));

        let _effect = rt.effect({
            let (a, runs) = (a.clone(), runs.clone());
            move || {
                a.get();
                runs.set(runs.get() + 1);
                None
            }
        });

        rt.batch(|| {
            rt.batch(|| a.set(1));
            assert_eq!(runs.get(), 1, "inner batch must not flush");
            assert!(rt.is_batching());
        });
        assert_eq!(runs.get(), 2);
        assert!(!rt.is_batching());
    }

    #[test]
    fn untracked_reads_are_not_dependencies() {
        let rt = Runtime::new();
        let a = rt.signal(0_u32);
        let runs = Rc::new(Cell::new(0_u32));

        let _effect = rt.effect({
            let (a, runs, rt) = (a.clone(), runs.clone(), rt.clone());
            move || {
                rt.untrack(|| a.get());
                runs.set(runs.get() + 1);
                None
            }
        });

        a.set(5);
        assert_eq!(runs.get(), 1);
    }
}
