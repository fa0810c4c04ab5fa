// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tether Interactions: behavior engines for floating elements.
//!
//! Every engine attaches to a [`FloatingContext`], reacts to host events, and
//! writes the open state through [`FloatingContext::set_open`]. What an engine
//! wants on the reference, floating, and item elements is returned from its
//! `props()` as an [`ElementProps`]; [`Interactions`] merges those contracts
//! with the caller's own props.
//!
//! ## Engines
//!
//! - [`Dismiss`]: Escape, outside presses, ancestor scrolls.
//! - [`Hover`]: open and close on pointer enter/leave, with delays, a rest
//!   threshold, and a pluggable [`HandleClose`].
//! - [`Focus`]: open while the reference has visible focus.
//! - [`Click`]: toggle on press, with keyboard activation for non-buttons.
//! - [`ListNavigation`] and [`Typeahead`]: an active item driven by arrow
//!   keys and by typed prefixes.
//! - [`Transition`] and [`TransitionStyles`]: a mount lifecycle for
//!   animating in and out.
//! - [`RoleProps`]: ARIA wiring for a [`Role`].
//! - [`ClientPoint`]: anchoring to the pointer.
//!
//! ## Host seams
//!
//! - [`Platform`]: DOM queries and listener registration.
//! - [`Timers`]: one-shot timeouts. [`ManualTimers`] is a deterministic clock.
//! - [`tether_position::PositionEngine`]: geometry.
//!
//! Engines release every listener and timer they own when dropped.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod click;
mod client_point;
mod context;
mod dismiss;
mod event;
mod focus;
mod hover;
mod id;
mod list_navigation;
mod merge;
mod platform;
mod props;
mod refs;
mod role;
mod timer;
mod transition;
mod tree;
mod typeahead;

#[cfg(test)]
mod test_support;

pub use click::{Click, ClickEvent, ClickOptions};
pub use client_point::{Axis, ClientPoint, ClientPointOptions};
pub use context::{ContextOptions, FloatingContext, OpenChangeCallback, OpenChangeReason};
pub use dismiss::{Dismiss, DismissOptions, OutsidePress, PhaseFlags, PressEvent};
pub use event::{Event, EventKind, Modifiers, PointerType, is_mouse_like};
pub use focus::{Focus, FocusOptions};
pub use hover::{Delay, HandleClose, Hover, HoverOptions, SafeCloseContext};
pub use id::IdGenerator;
pub use list_navigation::{
    FocusItemOnOpen, ListNavigation, ListNavigationOptions, NavigateCallback, Orientation, Step,
    is_cross_orientation_close_key, is_cross_orientation_open_key, is_main_orientation_key,
    is_main_orientation_to_end_key, navigate,
};
pub use merge::{Interactions, PropTarget, merge_props};
pub use platform::{
    BoxMetrics, ComputedStyle, Listener, ListenerId, ListenerOptions, ListenerSet,
    ListenerTarget, Overflow, Platform, is_event_target_within, is_typeable_element,
    root_ancestor,
};
pub use props::{
    ACTIVE_KEY, AttrValue, ElementProps, FOCUSABLE_ATTRIBUTE, Handler, HandlerChain, ItemProps,
    ListRef, PropValue, Props, SELECTED_KEY,
};
pub use refs::{RefSink, merge_refs};
pub use role::{Role, RoleOptions, RoleProps};
pub use timer::{ManualTimers, TimeoutSlot, TimerId, Timers};
pub use transition::{
    StyleMap, StyleSource, Transition, TransitionDuration, TransitionStatus, TransitionStyles,
    TransitionStylesOptions, camel_to_kebab,
};
pub use tree::{EventEmitter, FloatingTree, HandlerId, NodeFlags, NodeRecord, TreeEvent};
pub use typeahead::{FindMatch, Typeahead, TypeaheadOptions, allows_rapid_repeat, find_prefix_match};
