// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tether Position: a reactive binding between a floating element, its
//! reference, and an external positioning engine.
//!
//! This crate does not compute geometry. It decides *when* to ask a
//! [`PositionEngine`] for coordinates, and *whether* an answer is still
//! wanted when it arrives, and publishes the result as reactive state.
//!
//! ## Key types
//!
//! - [`PositionBinding`]: owns the reference/floating cells, the published
//!   [`PositionData`], and the derived [`FloatingStyles`].
//! - [`PositionEngine`]: the geometry seam. Resolution is callback based and
//!   cannot be cancelled.
//! - [`ReferenceTarget`]: a real element or a [`VirtualElement`].
//! - [`Placement`], [`Strategy`], [`Middleware`]: request vocabulary.
//!
//! ## Update rules
//!
//! - `update()` with a missing element does nothing.
//! - A resolution is applied only if it answers the most recent request and
//!   the binding has not been disposed.
//! - `is_positioned` is `false` whenever `open` is `false`, even if no
//!   computation runs after the close.
//! - An engine error keeps the last good position, is published on
//!   [`PositionBinding::error`], and is logged at `warn` level.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod binding;
mod engine;
mod styles;
mod types;

pub use binding::{BindingOptions, PositionBinding, UpdateFn, WhileElementsMounted};
pub use engine::{PositionConfig, PositionEngine, PositionError, Resolve};
pub use styles::{FloatingStyles, WILL_CHANGE_DPR, round_by_dpr};
pub use types::{
    Alignment, ArrowData, Middleware, MiddlewareData, MiddlewareDatum, Placement,
    PositionData, PositionResult, ReferenceTarget, Side, Strategy, VirtualElement,
};
