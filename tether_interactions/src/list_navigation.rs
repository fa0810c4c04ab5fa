// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! List navigation: moving an active index over list items with arrow keys.
//!
//! Arrow keys on the main axis of the list move the active item (and open
//! the floating element from the reference); `Home` and `End` jump to the
//! ends. In a nested list, the cross-axis key pointing away from the parent
//! opens it and the one pointing back closes it.
//!
//! Disabled items are skipped. Without `wrap`, navigation stops at the ends;
//! with it, navigation wraps around, or leaves the list with no active item
//! first when `allow_escape` is set.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use tether_reactive::{Effect, ReadSignal, Signal};

use crate::context::{FloatingContext, OpenChangeReason};
use crate::event::{Event, EventKind};
use crate::platform::Platform;
use crate::props::{ACTIVE_KEY, ElementProps, Handler, ItemProps, ListRef, Props, SELECTED_KEY, bind};

/// The axis along which list items are laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Up and Down move.
    #[default]
    Vertical,
    /// Left and Right move.
    Horizontal,
    /// All four arrows move.
    Both,
}

impl Orientation {
    fn pick(self, vertical: bool, horizontal: bool) -> bool {
        match self {
            Self::Vertical => vertical,
            Self::Horizontal => horizontal,
            Self::Both => vertical || horizontal,
        }
    }
}

/// Whether `key` moves along the list.
pub fn is_main_orientation_key(key: &str, orientation: Orientation) -> bool {
    let vertical = key == "ArrowUp" || key == "ArrowDown";
    let horizontal = key == "ArrowLeft" || key == "ArrowRight";
    orientation.pick(vertical, horizontal)
}

/// Whether `key` moves toward the end of the list.
pub fn is_main_orientation_to_end_key(key: &str, orientation: Orientation, rtl: bool) -> bool {
    let vertical = key == "ArrowDown";
    let horizontal = if rtl { key == "ArrowLeft" } else { key == "ArrowRight" };
    orientation.pick(vertical, horizontal)
}

/// Whether `key` opens a nested list.
pub fn is_cross_orientation_open_key(key: &str, orientation: Orientation, rtl: bool) -> bool {
    let vertical = if rtl { key == "ArrowLeft" } else { key == "ArrowRight" };
    let horizontal = key == "ArrowDown";
    orientation.pick(vertical, horizontal)
}

/// Whether `key` closes a nested list.
pub fn is_cross_orientation_close_key(key: &str, orientation: Orientation, rtl: bool) -> bool {
    let vertical = if rtl { key == "ArrowRight" } else { key == "ArrowLeft" };
    let horizontal = key == "ArrowUp";
    orientation.pick(vertical, horizontal)
}

/// A navigation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// The next enabled item.
    Next,
    /// The previous enabled item.
    Prev,
    /// The first enabled item.
    First,
    /// The last enabled item.
    Last,
}

/// The index reached from `current` by `step` over `len` items.
///
/// From no active item, [`Step::Next`] reaches the first enabled item and
/// [`Step::Prev`] the last. At an end, `wrap` continues at the other end,
/// unless `allow_escape` is also set, which yields `None` first. Without
/// `wrap`, the current index is kept. Returns `None` when every item is
/// disabled.
pub fn navigate(
    len: usize,
    current: Option<usize>,
    step: Step,
    wrap: bool,
    allow_escape: bool,
    is_disabled: impl Fn(usize) -> bool,
) -> Option<usize> {
    let enabled: Vec<usize> = (0..len).filter(|&i| !is_disabled(i)).collect();
    let (&first, &last) = (enabled.first()?, enabled.last()?);
    let current = current.filter(|&i| i < len);

    match (step, current) {
        (Step::First, _) | (Step::Next, None) => Some(first),
        (Step::Last, _) | (Step::Prev, None) => Some(last),
        (Step::Next, Some(current)) => match enabled.iter().find(|&&i| i > current) {
            Some(&next) => Some(next),
            None if !wrap => Some(current),
            None if allow_escape => None,
            None => Some(first),
        },
        (Step::Prev, Some(current)) => match enabled.iter().rev().find(|&&i| i < current) {
            Some(&prev) => Some(prev),
            None if !wrap => Some(current),
            None if allow_escape => None,
            None => Some(last),
        },
    }
}

/// Whether to activate an item when the floating element opens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FocusItemOnOpen {
    /// Only when opened with the keyboard.
    #[default]
    Auto,
    /// Always.
    Always,
    /// Never.
    Never,
}

/// Called with each new active index.
pub type NavigateCallback = Rc<dyn Fn(Option<usize>)>;

/// Options for [`ListNavigation`].
pub struct ListNavigationOptions<E> {
    /// Default: `true`.
    pub enabled: bool,
    /// The rendered items, by index.
    pub list: ListRef<E>,
    /// The selected item, if any. Default: `None`.
    pub selected_index: Option<usize>,
    /// Notified when the active index changes. Default: `None`.
    pub on_navigate: Option<NavigateCallback>,
    /// Default: [`FocusItemOnOpen::Auto`].
    pub focus_item_on_open: FocusItemOnOpen,
    /// Moving the pointer over an item activates it. Default: `true`.
    pub focus_item_on_hover: bool,
    /// Main-axis arrows on the reference open the element. Default: `true`.
    pub open_on_arrow_key_down: bool,
    /// Disabled items. `None` asks the platform. Default: `None`.
    pub disabled_indices: Option<Vec<usize>>,
    /// Wrapping past an end leaves no active item first. Default: `false`.
    pub allow_escape: bool,
    /// Wrap around at the ends. Default: `false`.
    pub wrap: bool,
    /// The list is a submenu of another list. Default: `false`.
    pub nested: bool,
    /// Default: [`Orientation::Vertical`].
    pub orientation: Orientation,
    /// Right-to-left layout. Default: `false`.
    pub rtl: bool,
}

impl<E> Default for ListNavigationOptions<E> {
    fn default() -> Self {
        Self {
            enabled: true,
            list: Rc::new(RefCell::new(Vec::new())),
            selected_index: None,
            on_navigate: None,
            focus_item_on_open: FocusItemOnOpen::Auto,
            focus_item_on_hover: true,
            open_on_arrow_key_down: true,
            disabled_indices: None,
            allow_escape: false,
            wrap: false,
            nested: false,
            orientation: Orientation::Vertical,
            rtl: false,
        }
    }
}

impl<E> fmt::Debug for ListNavigationOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListNavigationOptions")
            .field("enabled", &self.enabled)
            .field("items", &self.list.borrow().len())
            .field("selected_index", &self.selected_index)
            .field("focus_item_on_open", &self.focus_item_on_open)
            .field("focus_item_on_hover", &self.focus_item_on_hover)
            .field("open_on_arrow_key_down", &self.open_on_arrow_key_down)
            .field("disabled_indices", &self.disabled_indices)
            .field("allow_escape", &self.allow_escape)
            .field("wrap", &self.wrap)
            .field("nested", &self.nested)
            .field("orientation", &self.orientation)
            .field("rtl", &self.rtl)
            .finish_non_exhaustive()
    }
}

/// Keyboard navigation over the items of the floating element.
pub struct ListNavigation<P: Platform> {
    state: Rc<ListState<P>>,
    _on_open: Option<Effect>,
}

struct ListState<P: Platform> {
    ctx: FloatingContext<P>,
    options: ListNavigationOptions<P::Element>,
    active: Signal<Option<usize>>,
    was_open: Cell<bool>,
    opened_with: Cell<Option<Step>>,
}

impl<P: Platform> fmt::Debug for ListNavigation<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListNavigation")
            .field("options", &self.state.options)
            .field("active", &self.state.active.get_untracked())
            .finish_non_exhaustive()
    }
}

impl<P: Platform> ListNavigation<P> {
    /// Attach to `ctx`.
    pub fn new(ctx: &FloatingContext<P>, options: ListNavigationOptions<P::Element>) -> Self {
        let enabled = options.enabled;
        let state = Rc::new(ListState {
            ctx: ctx.clone(),
            options,
            active: ctx.runtime().signal(None),
            was_open: Cell::new(false),
            opened_with: Cell::new(None),
        });
        let on_open = enabled.then(|| {
            let weak = Rc::downgrade(&state);
            ctx.runtime().effect(move || {
                let state = weak.upgrade()?;
                let open = state.ctx.is_open();
                if state.was_open.replace(open) != open {
                    state.ctx.runtime().untrack(|| state.sync_open(open));
                }
                None
            })
        });
        Self {
            state,
            _on_open: on_open,
        }
    }

    /// The active index.
    pub fn active_index(&self) -> ReadSignal<Option<usize>> {
        self.state.active.read_only()
    }

    /// Make `index` the active item.
    pub fn navigate_to(&self, index: Option<usize>) {
        self.state.set_active(index);
    }

    /// This engine's contribution to the element props.
    pub fn props(&self) -> ElementProps<P::Element> {
        let state = &self.state;
        if !state.options.enabled {
            return ElementProps::empty();
        }
        let reference = Props::new().on_handler(
            EventKind::KeyDown.handler_name(false),
            bind(state, ListState::reference_key_down),
        );
        let floating = Props::new().on_handler(
            EventKind::KeyDown.handler_name(false),
            bind(state, ListState::floating_key_down),
        );
        let hover: Option<Handler<P::Element>> = state
            .options
            .focus_item_on_hover
            .then(|| bind(state, ListState::hover_item));
        let item = ItemProps::Dynamic(Rc::new(move |user: &Props<P::Element>| {
            let active = user.flag(ACTIVE_KEY).unwrap_or(false);
            let selected = user.flag(SELECTED_KEY).unwrap_or(false);
            let mut props = Props::new().with_attr("role", "option");
            if active {
                props = props.with_attr("aria-selected", selected);
            }
            if let Some(hover) = &hover {
                props.push_handler(EventKind::MouseMove.handler_name(false), Rc::clone(hover));
            }
            props
        }));
        ElementProps {
            reference: Some(reference),
            floating: Some(floating),
            item: Some(item),
        }
    }
}

impl<P: Platform> ListState<P> {
    fn is_disabled(&self, index: usize) -> bool {
        if let Some(disabled) = &self.options.disabled_indices {
            return disabled.contains(&index);
        }
        match self.options.list.borrow().get(index) {
            Some(Some(item)) => self.ctx.platform().is_disabled(item),
            _ => true,
        }
    }

    fn step(&self, step: Step) {
        let len = self.options.list.borrow().len();
        let next = navigate(
            len,
            self.active.get_untracked(),
            step,
            self.options.wrap,
            self.options.allow_escape,
            |i| self.is_disabled(i),
        );
        self.set_active(next);
    }

    fn set_active(&self, index: Option<usize>) {
        if self.active.get_untracked() == index {
            return;
        }
        self.active.set(index);
        if let Some(on_navigate) = &self.options.on_navigate {
            on_navigate(index);
        }
    }

    fn selected_enabled(&self) -> Option<usize> {
        self.options
            .selected_index
            .filter(|&i| i < self.options.list.borrow().len() && !self.is_disabled(i))
    }

    fn sync_open(&self, open: bool) {
        if !open {
            self.opened_with.set(None);
            self.set_active(None);
            return;
        }
        let opened_with = self.opened_with.take();
        let target = match (self.options.focus_item_on_open, opened_with) {
            (FocusItemOnOpen::Never, _) => return,
            (FocusItemOnOpen::Auto, None) => {
                if let Some(selected) = self.selected_enabled() {
                    self.set_active(Some(selected));
                }
                return;
            }
            (FocusItemOnOpen::Always, None) => Step::First,
            (_, Some(step)) => step,
        };
        match self.selected_enabled() {
            Some(selected) => self.set_active(Some(selected)),
            None => self.step(target),
        }
    }

    fn open_with(&self, step: Step, event: &Event<P::Element>) {
        self.opened_with.set(Some(step));
        self.ctx
            .set_open_with_event(true, Some(OpenChangeReason::ListNavigation), event);
    }

    fn reference_key_down(&self, event: &Event<P::Element>) {
        let options = &self.options;
        let key = event.key.as_str();
        if self.ctx.is_open_untracked() {
            // Focus stays on the reference, e.g. in a combobox.
            if is_main_orientation_key(key, options.orientation) || key == "Home" || key == "End" {
                self.floating_key_down(event);
            }
            return;
        }
        if options.open_on_arrow_key_down && is_main_orientation_key(key, options.orientation) {
            event.prevent_default();
            let step = if is_main_orientation_to_end_key(key, options.orientation, options.rtl) {
                Step::First
            } else {
                Step::Last
            };
            self.open_with(step, event);
        } else if options.nested && is_cross_orientation_open_key(key, options.orientation, options.rtl)
        {
            event.prevent_default();
            self.open_with(Step::First, event);
        }
    }

    fn floating_key_down(&self, event: &Event<P::Element>) {
        let options = &self.options;
        if !self.ctx.is_open_untracked() {
            return;
        }
        let key = event.key.as_str();
        if options.nested && is_cross_orientation_close_key(key, options.orientation, options.rtl) {
            event.prevent_default();
            event.stop_propagation();
            self.ctx
                .set_open_with_event(false, Some(OpenChangeReason::ListNavigation), event);
            return;
        }
        if key == "Escape" {
            self.ctx
                .set_open_with_event(false, Some(OpenChangeReason::EscapeKey), event);
            return;
        }
        let step = match key {
            "Home" => Step::First,
            "End" => Step::Last,
            _ if is_main_orientation_key(key, options.orientation) => {
                if is_main_orientation_to_end_key(key, options.orientation, options.rtl) {
                    Step::Next
                } else {
                    Step::Prev
                }
            }
            _ => return,
        };
        event.prevent_default();
        self.step(step);
    }

    fn hover_item(&self, event: &Event<P::Element>) {
        let Some(target) = &event.target else {
            return;
        };
        let platform = self.ctx.platform();
        let index = self
            .options
            .list
            .borrow()
            .iter()
            .position(|item| item.as_ref().is_some_and(|item| platform.contains(item, target)));
        if let Some(index) = index.filter(|&i| !self.is_disabled(i)) {
            self.set_active(Some(index));
        }
    }
}
