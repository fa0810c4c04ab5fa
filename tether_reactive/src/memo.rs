// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Memoized derivations.

use alloc::rc::Rc;
use core::fmt;

use crate::effect::Effect;
use crate::runtime::Runtime;
use crate::signal::{ReadSignal, Signal};

/// A value derived from other signals, recomputed when they change.
///
/// Downstream effects only re-run when the derived value differs from the
/// previous one.
pub struct Memo<T> {
    value: Signal<T>,
    _effect: Rc<Effect>,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _effect: Rc::clone(&self._effect),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + PartialEq + 'static> Memo<T> {
    pub(crate) fn new(runtime: &Runtime, f: impl Fn() -> T + 'static) -> Self {
        let value = runtime.signal(runtime.untrack(&f));
        let effect = runtime.effect({
            let value = value.clone();
            move || {
                value.set(f());
                None
            }
        });
        Self {
            value,
            _effect: Rc::new(effect),
        }
    }

    /// Read the derived value and subscribe the running effect, if any.
    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Read the derived value without subscribing.
    pub fn get_untracked(&self) -> T {
        self.value.get_untracked()
    }

    /// Borrow the derived value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.value.with(f)
    }

    /// A read-only view of the derived value.
    ///
    /// The view stops updating once every `Memo` handle has been dropped.
    pub fn read_only(&self) -> ReadSignal<T> {
        self.value.read_only()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::Cell;

    use crate::Runtime;

    #[test]
    fn recomputes_on_change_and_gates_downstream() {
        let rt = Runtime::new();
        let x = rt.signal(1_i32);
        let sign = rt.memo({
            let x = x.clone();
            move || x.get().signum()
        });
        let runs = Rc::new(Cell::new(0_u32));
        let _effect = rt.effect({
            let (sign, runs) = (sign.clone(), runs.clone());
            move || {
                sign.get();
                runs.set(runs.get() + 1);
                None
            }
        });

        x.set(5);
        assert_eq!(sign.get_untracked(), 1);
        assert_eq!(runs.get(), 1, "unchanged memo must not notify");

        x.set(-2);
        assert_eq!(sign.get_untracked(), -1);
        assert_eq!(runs.get(), 2);
    }
}
