// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effects: closures that re-run when the signals they read change.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::runtime::Runtime;

/// Teardown returned by an effect run.
pub type Cleanup = Box<dyn FnOnce()>;

type EffectFn = Box<dyn FnMut() -> Option<Cleanup>>;

/// Upper bound on back-to-back re-runs caused by an effect writing its own inputs.
const MAX_RERUNS: u32 = 64;

pub(crate) struct EffectNode {
    run: RefCell<EffectFn>,
    cleanup: RefCell<Option<Cleanup>>,
    running: Cell<bool>,
    dirty: Cell<bool>,
    disposed: Cell<bool>,
}

impl EffectNode {
    pub(crate) fn new(f: impl FnMut() -> Option<Cleanup> + 'static) -> Rc<Self> {
        Rc::new(Self {
            run: RefCell::new(Box::new(f)),
            cleanup: RefCell::new(None),
            running: Cell::new(false),
            dirty: Cell::new(false),
            disposed: Cell::new(false),
        })
    }

    pub(crate) fn execute(self: &Rc<Self>, runtime: &Runtime) {
        if self.disposed.get() {
            return;
        }
        if self.running.get() {
            self.dirty.set(true);
            return;
        }
        self.running.set(true);
        let mut runs = 0_u32;
        loop {
            self.dirty.set(false);
            self.run_cleanup();

            runtime.push_observer(Some(Rc::clone(self)));
            let cleanup = {
                let mut run = self.run.borrow_mut();
                let f: &mut dyn FnMut() -> Option<Cleanup> = &mut **run;
                f()
            };
            runtime.pop_observer();

            if self.disposed.get() {
                // Disposed from inside its own run: the fresh cleanup is due now.
                if let Some(cleanup) = cleanup {
                    cleanup();
                }
                break;
            }
            *self.cleanup.borrow_mut() = cleanup;

            runs += 1;
            if !self.dirty.get() {
                break;
            }
            if runs >= MAX_RERUNS {
                tracing::warn!(runs, "effect keeps re-triggering itself; stopping");
                break;
            }
        }
        self.running.set(false);
    }

    fn run_cleanup(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.run_cleanup();
    }
}

/// Handle to a registered effect.
///
/// Dropping the handle disposes the effect: its last cleanup runs and it never
/// runs again.
#[must_use = "dropping an Effect disposes it immediately"]
pub struct Effect {
    node: Rc<EffectNode>,
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("disposed", &self.node.disposed.get())
            .finish_non_exhaustive()
    }
}

impl Effect {
    pub(crate) fn from_node(node: Rc<EffectNode>) -> Self {
        Self { node }
    }

    /// Run the pending cleanup and stop reacting to changes.
    pub fn dispose(&self) {
        self.node.dispose();
    }

    /// Returns `true` once the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.node.disposed.get()
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        self.node.dispose();
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};

    use crate::Runtime;

    #[test]
    fn cleanup_runs_before_rerun_and_on_drop() {
        let rt = Runtime::new();
        let value = rt.signal(1_u32);
        let log = Rc::new(RefCell::new(Vec::new()));

        let effect = rt.effect({
            let (value, log) = (value.clone(), log.clone());
            move || {
                let v = value.get();
                log.borrow_mut().push(("run", v));
                let log = log.clone();
                Some(alloc::boxed::Box::new(move || log.borrow_mut().push(("cleanup", v))))
            }
        });

        value.set(2);
        drop(effect);
        value.set(3);

        assert_eq!(
            *log.borrow(),
            vec![("run", 1), ("cleanup", 1), ("run", 2), ("cleanup", 2)]
        );
    }

    #[test]
    fn equal_write_does_not_rerun() {
        let rt = Runtime::new();
        let value = rt.signal(7_u32);
        let runs = Rc::new(Cell::new(0_u32));

        let _effect = rt.effect({
            let (value, runs) = (value.clone(), runs.clone());
            move || {
                value.get();
                runs.set(runs.get() + 1);
                None
            }
        });

        value.set(7);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn self_write_reruns_instead_of_reentering() {
        let rt = Runtime::new();
        let value = rt.signal(0_u32);
        let runs = Rc::new(Cell::new(0_u32));

        let _effect = rt.effect({
            let (value, runs) = (value.clone(), runs.clone());
            move || {
                runs.set(runs.get() + 1);
                let v = value.get();
                if v < 3 {
                    value.set(v + 1);
                }
                None
            }
        });

        assert_eq!(value.get_untracked(), 3);
        assert_eq!(runs.get(), 4);
    }

    #[test]
    fn disposed_effect_ignores_changes() {
        let rt = Runtime::new();
        let value = rt.signal(0_u32);
        let runs = Rc::new(Cell::new(0_u32));

        let effect = rt.effect({
            let (value, runs) = (value.clone(), runs.clone());
            move || {
                value.get();
                runs.set(runs.get() + 1);
                None
            }
        });
        effect.dispose();
        assert!(effect.is_disposed());

        value.set(1);
        assert_eq!(runs.get(), 1);
    }
}
