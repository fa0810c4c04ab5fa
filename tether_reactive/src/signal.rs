// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observable cells.

use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::fmt;

use smallvec::SmallVec;

use crate::effect::EffectNode;
use crate::runtime::Runtime;

struct SignalInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    subscribers: RefCell<SmallVec<[Weak<EffectNode>; 4]>>,
}

/// A mutable, observable value.
///
/// Reading with [`Signal::get`] inside an effect subscribes that effect;
/// writing with [`Signal::set`] re-runs subscribers when the value actually
/// changed. Cloning shares the same cell.
pub struct Signal<T> {
    runtime: Runtime,
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    pub(crate) fn new(runtime: Runtime, value: T) -> Self {
        Self {
            runtime,
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                subscribers: RefCell::new(SmallVec::new()),
            }),
        }
    }

    /// Read the value and subscribe the running effect, if any.
    pub fn get(&self) -> T {
        self.track();
        self.inner.value.borrow().clone()
    }

    /// Read the value without subscribing.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the value for the duration of `f`, subscribing the running effect.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.value.borrow())
    }

    /// Replace the value. Equal values are ignored.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.inner.version.set(self.inner.version.get() + 1);
        self.notify();
    }

    /// Modify the value in place via a copy, then [`Signal::set`] it.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get_untracked();
        f(&mut next);
        self.set(next);
    }

    /// Number of effective writes so far.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// The runtime this signal belongs to.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// A read-only view of this signal.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            signal: self.clone(),
        }
    }

    fn track(&self) {
        let Some(observer) = self.runtime.current_observer() else {
            return;
        };
        let weak = Rc::downgrade(&observer);
        let mut subscribers = self.inner.subscribers.borrow_mut();
        if !subscribers.iter().any(|s| Weak::ptr_eq(s, &weak)) {
            subscribers.push(weak);
        }
    }

    fn notify(&self) {
        // Snapshot so effects may subscribe or write while we iterate.
        let live: SmallVec<[Rc<EffectNode>; 4]> = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            subscribers.retain(|s| s.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for node in live {
            self.runtime.schedule(node);
        }
    }
}

/// Read-only handle to a [`Signal`].
pub struct ReadSignal<T> {
    signal: Signal<T>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadSignal").field(&self.signal).finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReadSignal<T> {
    /// Read the value and subscribe the running effect, if any.
    pub fn get(&self) -> T {
        self.signal.get()
    }

    /// Read the value without subscribing.
    pub fn get_untracked(&self) -> T {
        self.signal.get_untracked()
    }

    /// Borrow the value for the duration of `f`, subscribing the running effect.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    /// Number of effective writes so far.
    pub fn version(&self) -> u64 {
        self.signal.version()
    }
}

impl<T: Clone + PartialEq + 'static> From<Signal<T>> for ReadSignal<T> {
    fn from(signal: Signal<T>) -> Self {
        Self { signal }
    }
}
