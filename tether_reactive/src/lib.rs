// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tether Reactive: the minimal reactive substrate the Tether engines run on.
//!
//! ## Overview
//!
//! The interaction engines only need four primitives:
//!
//! 1. a mutable observable cell ([`Signal`]) with `get`/`set`,
//! 2. a side effect ([`Effect`]) that re-runs when a cell it read changes and
//!    may return a [`Cleanup`] that runs before the next run and on disposal,
//! 3. a memoized derivation ([`Memo`]),
//! 4. an atomic multi-write batch ([`Runtime::batch`]).
//!
//! All of them hang off an explicit [`Runtime`] handle instead of thread-local
//! state, so several independent runtimes can coexist and tests stay isolated.
//!
//! ## Example
//!
//! ```rust
//! use core::cell::Cell;
//! use std::rc::Rc;
//! use tether_reactive::Runtime;
//!
//! let rt = Runtime::new();
//! let open = rt.signal(false);
//! let reason = rt.signal("");
//!
//! let seen = Rc::new(Cell::new(0));
//! let _effect = rt.effect({
//!     let (open, reason, seen) = (open.clone(), reason.clone(), seen.clone());
//!     move || {
//!         // Reading subscribes the effect to both cells.
//!         let _ = (open.get(), reason.get());
//!         seen.set(seen.get() + 1);
//!         None
//!     }
//! });
//! assert_eq!(seen.get(), 1);
//!
//! // Both writes land before the effect observes them.
//! rt.batch(|| {
//!     open.set(true);
//!     reason.set("click");
//! });
//! assert_eq!(seen.get(), 2);
//! ```
//!
//! ## Semantics
//!
//! - Writes that compare equal (`PartialEq`) to the current value are no-ops.
//! - Dependencies are discovered by reading inside an effect. They accumulate
//!   for the lifetime of the effect; reads wrapped in [`Runtime::untrack`] are
//!   not recorded.
//! - Outside a batch, a write runs dependent effects synchronously, in
//!   subscription order. Inside a batch, each dependent effect runs once when
//!   the outermost batch exits.
//! - An effect that writes a cell it depends on is re-run after it returns,
//!   never re-entered.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod effect;
mod memo;
mod runtime;
mod signal;

pub use effect::{Cleanup, Effect};
pub use memo::Memo;
pub use runtime::Runtime;
pub use signal::{ReadSignal, Signal};
