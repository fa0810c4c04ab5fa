// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typeahead: jumping to the item whose label starts with what was typed.
//!
//! Typed characters accumulate in a buffer that is cleared after `reset_ms`
//! without typing. Each keystroke searches the labels for a case-insensitive
//! prefix match, starting just after the previous match and wrapping around.
//!
//! Typing the same single character again restarts the search with just
//! that character, cycling through the items it starts. This is disabled
//! when a label begins with a doubled letter ("llama") or two labels share a
//! first letter, where the repeat may be part of the intended prefix.

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use hashbrown::HashSet;
use tether_reactive::{Effect, ReadSignal};

use crate::context::FloatingContext;
use crate::event::{Event, EventKind, Modifiers};
use crate::platform::Platform;
use crate::props::{ElementProps, ListRef, Props, bind};
use crate::timer::TimeoutSlot;

/// Whether typing the same character twice may cycle between matches.
pub fn allows_rapid_repeat(labels: &[Option<String>]) -> bool {
    let mut firsts = HashSet::new();
    for label in labels.iter().flatten() {
        let mut chars = label.chars().flat_map(char::to_lowercase);
        let (Some(first), second) = (chars.next(), chars.next()) else {
            continue;
        };
        if second == Some(first) || !firsts.insert(first) {
            return false;
        }
    }
    true
}

/// The first label, starting at `start` and wrapping around, that begins with
/// `query`, ignoring case.
pub fn find_prefix_match(labels: &[Option<String>], start: usize, query: &str) -> Option<usize> {
    let len = labels.len();
    if len == 0 {
        return None;
    }
    let query = query.to_lowercase();
    let start = if start >= len { 0 } else { start };
    (0..len).map(|k| (start + k) % len).find(|&i| {
        labels[i]
            .as_ref()
            .is_some_and(|label| label.to_lowercase().starts_with(&query))
    })
}

/// A custom matcher: given the labels in search order and the typed string,
/// returns the matching label.
pub type FindMatch = Rc<dyn Fn(&[Option<String>], &str) -> Option<String>>;

/// Options for [`Typeahead`].
pub struct TypeaheadOptions {
    /// Default: `true`.
    pub enabled: bool,
    /// Item labels, by index.
    pub labels: ListRef<String>,
    /// The active index to search after, kept in sync while not typing.
    pub active_index: Option<ReadSignal<Option<usize>>>,
    /// The selected item, preferred over the active one. Default: `None`.
    pub selected_index: Option<usize>,
    /// Replaces the prefix match. Default: `None`.
    pub find_match: Option<FindMatch>,
    /// Idle time that clears the buffer, in milliseconds. Default: `750`.
    pub reset_ms: u64,
    /// Keys that never start or extend a search. Default: empty.
    pub ignore_keys: Vec<String>,
    /// Called with each matching index. Default: `None`.
    pub on_match: Option<Rc<dyn Fn(usize)>>,
    /// Called when typing starts or stops. Default: `None`.
    pub on_typing_change: Option<Rc<dyn Fn(bool)>>,
}

impl Default for TypeaheadOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            labels: Rc::new(RefCell::new(Vec::new())),
            active_index: None,
            selected_index: None,
            find_match: None,
            reset_ms: 750,
            ignore_keys: Vec::new(),
            on_match: None,
            on_typing_change: None,
        }
    }
}

impl fmt::Debug for TypeaheadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeaheadOptions")
            .field("enabled", &self.enabled)
            .field("labels", &self.labels.borrow().len())
            .field("selected_index", &self.selected_index)
            .field("reset_ms", &self.reset_ms)
            .field("ignore_keys", &self.ignore_keys)
            .finish_non_exhaustive()
    }
}

/// Moves to items by typing the start of their label.
pub struct Typeahead<P: Platform> {
    state: Rc<TypeaheadState<P>>,
    _effects: Vec<Effect>,
}

struct TypeaheadState<P: Platform> {
    this: Weak<Self>,
    ctx: FloatingContext<P>,
    options: TypeaheadOptions,
    buffer: RefCell<String>,
    prev_index: Cell<Option<usize>>,
    match_index: Cell<Option<usize>>,
    typing: Cell<bool>,
    reset: TimeoutSlot,
}

impl<P: Platform> fmt::Debug for Typeahead<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typeahead")
            .field("options", &self.state.options)
            .field("buffer", &self.state.buffer.borrow())
            .field("match_index", &self.state.match_index.get())
            .finish_non_exhaustive()
    }
}

impl<P: Platform> Typeahead<P> {
    /// Attach to `ctx`.
    pub fn new(ctx: &FloatingContext<P>, options: TypeaheadOptions) -> Self {
        let enabled = options.enabled;
        let initial = options
            .selected_index
            .or_else(|| options.active_index.as_ref().and_then(ReadSignal::get_untracked));
        let state = Rc::new_cyclic(|this| TypeaheadState {
            this: this.clone(),
            ctx: ctx.clone(),
            options,
            buffer: RefCell::new(String::new()),
            prev_index: Cell::new(initial),
            match_index: Cell::new(None),
            typing: Cell::new(false),
            reset: TimeoutSlot::new(Rc::clone(ctx.timers())),
        });
        if !enabled {
            return Self {
                state,
                _effects: Vec::new(),
            };
        }

        let weak = Rc::downgrade(&state);
        let on_open = ctx.runtime().effect(move || {
            let state = weak.upgrade()?;
            if state.ctx.is_open() {
                state.reset.clear();
                state.match_index.set(None);
                state.buffer.borrow_mut().clear();
            }
            None
        });

        // Follows arrow-key navigation, but not its own matches.
        let weak = Rc::downgrade(&state);
        let sync = ctx.runtime().effect(move || {
            let state = weak.upgrade()?;
            let active = state.options.active_index.as_ref().and_then(ReadSignal::get);
            if state.ctx.is_open() && state.buffer.borrow().is_empty() {
                state
                    .prev_index
                    .set(state.options.selected_index.or(active));
            }
            None
        });

        Self {
            state,
            _effects: alloc::vec![on_open, sync],
        }
    }

    /// Whether a search is in progress.
    pub fn is_typing(&self) -> bool {
        self.state.typing.get()
    }

    /// This engine's contribution to the element props.
    pub fn props(&self) -> ElementProps<P::Element> {
        let state = &self.state;
        if !state.options.enabled {
            return ElementProps::empty();
        }
        let reference = Props::new().on_handler(
            EventKind::KeyDown.handler_name(false),
            bind(state, TypeaheadState::on_key_down),
        );
        let floating = Props::new()
            .on_handler(
                EventKind::KeyDown.handler_name(false),
                bind(state, TypeaheadState::on_key_down),
            )
            .on_handler(
                EventKind::KeyUp.handler_name(false),
                bind(state, |s: &TypeaheadState<P>, event| {
                    if event.key == " " {
                        s.set_typing(false);
                    }
                }),
            );
        ElementProps {
            reference: Some(reference),
            floating: Some(floating),
            item: None,
        }
    }
}

impl<P: Platform> TypeaheadState<P> {
    fn set_typing(&self, typing: bool) {
        if self.typing.replace(typing) == typing {
            return;
        }
        if let Some(callback) = &self.options.on_typing_change {
            callback(typing);
        }
    }

    fn matching_index(&self, labels: &[Option<String>], start: usize, query: &str) -> Option<usize> {
        match &self.options.find_match {
            Some(find_match) => {
                let len = labels.len();
                let ordered: Vec<Option<String>> = (0..len)
                    .map(|k| labels[(start + k) % len].clone())
                    .collect();
                let found = find_match(&ordered, query)?;
                labels
                    .iter()
                    .position(|label| label.as_deref() == Some(found.as_str()))
            }
            None => find_prefix_match(labels, start, query),
        }
    }

    fn on_key_down(&self, event: &Event<P::Element>) {
        let labels = self.options.labels.borrow().clone();
        let key = event.key.as_str();

        let pending = self.buffer.borrow().clone();
        if !pending.is_empty() && !pending.starts_with(' ') {
            if self.matching_index(&labels, 0, &pending).is_none() {
                self.set_typing(false);
            } else if key == " " {
                event.prevent_default();
            }
        }

        let mut chars = key.chars();
        let single = chars.next().is_some() && chars.next().is_none();
        if !single
            || self.options.ignore_keys.iter().any(|k| k == key)
            || event
                .modifiers
                .intersects(Modifiers::CTRL | Modifiers::META | Modifiers::ALT)
        {
            return;
        }

        if self.ctx.is_open_untracked() && key != " " {
            event.prevent_default();
            self.set_typing(true);
        }

        if allows_rapid_repeat(&labels) && *self.buffer.borrow() == key {
            self.buffer.borrow_mut().clear();
            self.prev_index.set(self.match_index.get());
        }
        self.buffer.borrow_mut().push_str(key);

        let this = self.this.clone();
        self.reset.set(self.options.reset_ms, move || {
            if let Some(state) = this.upgrade() {
                state.buffer.borrow_mut().clear();
                state.prev_index.set(state.match_index.get());
                state.set_typing(false);
            }
        });

        let start = self.prev_index.get().map_or(0, |i| i + 1);
        let query = self.buffer.borrow().clone();
        match self.matching_index(&labels, start % labels.len().max(1), &query) {
            Some(index) => {
                self.match_index.set(Some(index));
                if let Some(on_match) = &self.options.on_match {
                    on_match(index);
                }
            }
            None if key != " " => {
                self.buffer.borrow_mut().clear();
                self.set_typing(false);
            }
            None => {}
        }
    }
}
