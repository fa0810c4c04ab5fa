// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dismissal: closing on Escape, outside presses, and ancestor scrolls.
//!
//! The engine is armed exactly while it is enabled and the element is open.
//! While armed it listens on the document for Escape and for presses, and on
//! every overflow ancestor of both elements for scrolls.
//!
//! An outside press is ignored when:
//! - the custom predicate rejects it,
//! - inert markers exist and the pressed element's root contains none of
//!   them (it was injected after the floating element rendered),
//! - it hit a scrollbar,
//! - it is a `click` whose press started or ended inside the floating
//!   element (a drag out of, or into, the floating element),
//! - it landed inside either element, or inside the floating element of an
//!   open descendant in the [`FloatingTree`](crate::tree::FloatingTree),
//! - an open descendant does not let outside presses bubble.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;

use tether_reactive::Effect;
use tracing::debug;

use crate::context::{FloatingContext, OpenChangeReason};
use crate::event::{Event, EventKind};
use crate::platform::{
    ListenerOptions, ListenerSet, ListenerTarget, Platform, bind_listener,
    is_event_target_within, root_ancestor,
};
use crate::props::{ElementProps, Props, bind};
use crate::timer::TimeoutSlot;
use crate::tree::NodeFlags;

/// Which presses count as outside presses.
pub enum OutsidePress<E> {
    /// All of them, or none.
    Enabled(bool),
    /// Those for which the predicate returns `true`.
    Predicate(Rc<dyn Fn(&Event<E>) -> bool>),
}

impl<E> Clone for OutsidePress<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Enabled(b) => Self::Enabled(*b),
            Self::Predicate(f) => Self::Predicate(Rc::clone(f)),
        }
    }
}

impl<E> fmt::Debug for OutsidePress<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled(b) => f.debug_tuple("Enabled").field(b).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl<E> OutsidePress<E> {
    fn is_enabled(&self) -> bool {
        !matches!(self, Self::Enabled(false))
    }
}

/// The event that counts as a press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PressEvent {
    /// Eager on mouse and touch.
    #[default]
    PointerDown,
    /// Eager on mouse, lazy on touch.
    MouseDown,
    /// Lazy on both.
    Click,
}

impl PressEvent {
    /// The event kind.
    pub fn kind(self) -> EventKind {
        match self {
            Self::PointerDown => EventKind::PointerDown,
            Self::MouseDown => EventKind::MouseDown,
            Self::Click => EventKind::Click,
        }
    }
}

/// A flag per dismissal signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseFlags {
    /// Applies to Escape.
    pub escape_key: bool,
    /// Applies to outside presses.
    pub outside_press: bool,
}

impl Default for PhaseFlags {
    fn default() -> Self {
        Self {
            escape_key: false,
            outside_press: true,
        }
    }
}

impl PhaseFlags {
    /// The same value for both signals.
    pub fn both(value: bool) -> Self {
        Self {
            escape_key: value,
            outside_press: value,
        }
    }
}

/// Options for [`Dismiss`].
pub struct DismissOptions<E> {
    /// Default: `true`.
    pub enabled: bool,
    /// Close on Escape. Default: `true`.
    pub escape_key: bool,
    /// Close on outside presses. Default: enabled.
    pub outside_press: OutsidePress<E>,
    /// What counts as an outside press. Default: [`PressEvent::PointerDown`].
    pub outside_press_event: PressEvent,
    /// Close on a press on the reference. Default: `false`.
    pub reference_press: bool,
    /// What counts as a reference press. Default: [`PressEvent::PointerDown`].
    pub reference_press_event: PressEvent,
    /// Close when an overflow ancestor scrolls. Default: `false`.
    pub ancestor_scroll: bool,
    /// Whether each signal also dismisses ancestors in the tree.
    /// Default: Escape does not bubble, outside presses do.
    pub bubbles: PhaseFlags,
    /// Whether each document listener uses the capture phase.
    /// Default: Escape bubbles, outside presses capture.
    pub capture: PhaseFlags,
}

impl<E> Default for DismissOptions<E> {
    fn default() -> Self {
        Self {
            enabled: true,
            escape_key: true,
            outside_press: OutsidePress::Enabled(true),
            outside_press_event: PressEvent::PointerDown,
            reference_press: false,
            reference_press_event: PressEvent::PointerDown,
            ancestor_scroll: false,
            bubbles: PhaseFlags::default(),
            capture: PhaseFlags::default(),
        }
    }
}

impl<E> fmt::Debug for DismissOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DismissOptions")
            .field("enabled", &self.enabled)
            .field("escape_key", &self.escape_key)
            .field("outside_press", &self.outside_press)
            .field("outside_press_event", &self.outside_press_event)
            .field("reference_press", &self.reference_press)
            .field("reference_press_event", &self.reference_press_event)
            .field("ancestor_scroll", &self.ancestor_scroll)
            .field("bubbles", &self.bubbles)
            .field("capture", &self.capture)
            .finish()
    }
}

/// Closes the floating element when the user asks to dismiss it.
pub struct Dismiss<P: Platform> {
    state: Rc<DismissState<P>>,
    _armed: Option<Effect>,
}

struct DismissState<P: Platform> {
    ctx: FloatingContext<P>,
    options: DismissOptions<P::Element>,
    ended_or_started_inside: Cell<bool>,
    is_composing: Rc<Cell<bool>>,
    composition_end: TimeoutSlot,
}

impl<P: Platform> fmt::Debug for Dismiss<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dismiss")
            .field("options", &self.state.options)
            .field("is_composing", &self.state.is_composing.get())
            .finish_non_exhaustive()
    }
}

impl<P: Platform> Dismiss<P> {
    /// Attach to `ctx`.
    pub fn new(ctx: &FloatingContext<P>, options: DismissOptions<P::Element>) -> Self {
        ctx.flags()
            .set(options.bubbles.escape_key, options.bubbles.outside_press);
        let enabled = options.enabled;
        let state = Rc::new(DismissState {
            ctx: ctx.clone(),
            options,
            ended_or_started_inside: Cell::new(false),
            is_composing: Rc::new(Cell::new(false)),
            composition_end: TimeoutSlot::new(Rc::clone(ctx.timers())),
        });
        let armed = enabled.then(|| {
            let weak = Rc::downgrade(&state);
            ctx.runtime().effect(move || {
                let state = weak.upgrade()?;
                if !state.ctx.is_open() {
                    return None;
                }
                let floating = state.ctx.floating().get();
                let dom_reference = state.ctx.dom_reference();
                let set = state.arm(floating.as_ref(), dom_reference.as_ref());
                let weak = Rc::downgrade(&state);
                Some(Box::new(move || {
                    drop(set);
                    if let Some(state) = weak.upgrade() {
                        state.composition_end.clear();
                        state.is_composing.set(false);
                    }
                }))
            })
        });
        Self {
            state,
            _armed: armed,
        }
    }

    /// This engine's contribution to the element props.
    pub fn props(&self) -> ElementProps<P::Element> {
        let state = &self.state;
        if !state.options.enabled {
            return ElementProps::empty();
        }
        let mut reference = Props::new().on_handler(
            EventKind::KeyDown.handler_name(false),
            bind(state, DismissState::close_on_escape),
        );
        reference.push_handler(
            state.options.reference_press_event.kind().handler_name(false),
            bind(state, |s: &DismissState<P>, event| {
                if s.options.reference_press {
                    s.ctx
                        .set_open_with_event(false, Some(OpenChangeReason::ReferencePress), event);
                }
            }),
        );
        let press_inside = |s: &DismissState<P>, _: &Event<P::Element>| {
            s.ended_or_started_inside.set(true);
        };
        let floating = Props::new()
            .on_handler(
                EventKind::KeyDown.handler_name(false),
                bind(state, DismissState::close_on_escape),
            )
            .on_handler(EventKind::MouseDown.handler_name(false), bind(state, press_inside))
            .on_handler(EventKind::MouseUp.handler_name(false), bind(state, press_inside));
        ElementProps {
            reference: Some(reference),
            floating: Some(floating),
            item: None,
        }
    }
}

impl<P: Platform> DismissState<P> {
    fn arm(
        self: &Rc<Self>,
        floating: Option<&P::Element>,
        dom_reference: Option<&P::Element>,
    ) -> ListenerSet<P> {
        let platform = self.ctx.platform();
        let options = &self.options;
        let mut set = ListenerSet::new(Rc::clone(platform));

        if options.escape_key {
            set.add(
                ListenerTarget::Document,
                EventKind::KeyDown,
                ListenerOptions::capture(options.capture.escape_key),
                bind_listener(self, Self::close_on_escape),
            );
            set.add(
                ListenerTarget::Document,
                EventKind::CompositionStart,
                ListenerOptions::BUBBLE,
                bind_listener(self, |s: &Self, _| {
                    s.composition_end.clear();
                    s.is_composing.set(true);
                }),
            );
            set.add(
                ListenerTarget::Document,
                EventKind::CompositionEnd,
                ListenerOptions::BUBBLE,
                bind_listener(self, |s: &Self, _| {
                    // Safari fires `compositionend` before the Escape keydown.
                    let delay = if s.ctx.platform().is_webkit() { 5 } else { 0 };
                    let composing = Rc::clone(&s.is_composing);
                    s.composition_end.set(delay, move || composing.set(false));
                }),
            );
        }

        if options.outside_press.is_enabled() {
            set.add(
                ListenerTarget::Document,
                options.outside_press_event.kind(),
                ListenerOptions::capture(options.capture.outside_press),
                bind_listener(self, Self::close_on_press_outside),
            );
        }

        if options.ancestor_scroll {
            let mut ancestors: Vec<ListenerTarget<P::Element>> = Vec::new();
            for element in dom_reference.into_iter().chain(floating) {
                for ancestor in platform.overflow_ancestors(element) {
                    if ancestor != ListenerTarget::VisualViewport && !ancestors.contains(&ancestor) {
                        ancestors.push(ancestor);
                    }
                }
            }
            for ancestor in ancestors {
                set.add(
                    ancestor,
                    EventKind::Scroll,
                    ListenerOptions::BUBBLE,
                    bind_listener(self, |s: &Self, event| {
                        s.ctx
                            .set_open_with_event(false, Some(OpenChangeReason::AncestorScroll), event);
                    }),
                );
            }
        }
        set
    }

    fn close_on_escape(&self, event: &Event<P::Element>) {
        if !self.options.escape_key
            || event.key != "Escape"
            || !event.modifiers.is_empty()
            || !self.ctx.is_open_untracked()
        {
            return;
        }
        if self.is_composing.get() || event.is_composing {
            debug!("escape pressed during composition; not dismissing");
            return;
        }
        if !self.options.bubbles.escape_key {
            event.stop_propagation();
            if self.any_open_child(|flags| !flags.escape_key_bubbles()) {
                return;
            }
        }
        self.ctx
            .set_open_with_event(false, Some(OpenChangeReason::EscapeKey), event);
    }

    fn close_on_press_outside(&self, event: &Event<P::Element>) {
        let started_inside = self.ended_or_started_inside.replace(false);
        if self.options.outside_press_event == PressEvent::Click && started_inside {
            debug!("press started or ended inside the floating element; not dismissing");
            return;
        }
        if let OutsidePress::Predicate(accept) = &self.options.outside_press {
            if !accept(event) {
                return;
            }
        }

        let platform = &**self.ctx.platform();
        let floating = self.ctx.floating().get_untracked();
        let dom_reference = self.ctx.dom_reference_untracked();
        let target = event.target.as_ref();

        if let Some(target) = target {
            let markers = platform.inert_markers();
            let pressed_ancestor = floating
                .as_ref()
                .is_some_and(|floating| platform.contains(target, floating));
            if !markers.is_empty() && !pressed_ancestor {
                let root = root_ancestor(platform, target);
                if markers.iter().all(|marker| !platform.contains(&root, marker)) {
                    debug!("press landed on an element injected after mount; not dismissing");
                    return;
                }
            }
            if floating.is_some()
                && platform.is_html_element(target)
                && pressed_scrollbar(platform, target, event)
            {
                debug!("press landed on a scrollbar; not dismissing");
                return;
            }
        }

        if is_event_target_within(platform, target, floating.as_ref())
            || is_event_target_within(platform, target, dom_reference.as_ref())
        {
            return;
        }

        if let (Some(tree), Some(id)) = (self.ctx.tree(), self.ctx.node_id()) {
            let children = tree.children(id, true);
            if children.iter().any(|child| {
                is_event_target_within(platform, target, child.floating.get_untracked().as_ref())
            }) {
                return;
            }
            if children.iter().any(|child| !child.flags.outside_press_bubbles()) {
                return;
            }
        }

        self.ctx
            .set_open_with_event(false, Some(OpenChangeReason::OutsidePress), event);
    }

    fn any_open_child(&self, pred: impl Fn(&NodeFlags) -> bool) -> bool {
        match (self.ctx.tree(), self.ctx.node_id()) {
            (Some(tree), Some(id)) => tree.children(id, true).iter().any(|c| pred(&c.flags)),
            _ => false,
        }
    }
}

/// Whether `event` hit one of `target`'s scrollbars.
fn pressed_scrollbar<P: Platform + ?Sized>(
    platform: &P,
    target: &P::Element,
    event: &Event<P::Element>,
) -> bool {
    let last = platform.is_last_traversable(target);
    let style = platform.computed_style(target);
    let metrics = platform.box_metrics(target);

    let can_scroll_x = (last || style.overflow_x.is_scrollable())
        && metrics.client.width > 0.0
        && metrics.scroll.width > metrics.client.width;
    let can_scroll_y = (last || style.overflow_y.is_scrollable())
        && metrics.client.height > 0.0
        && metrics.scroll.height > metrics.client.height;

    let vertical = can_scroll_y
        && if style.rtl {
            event.offset.x <= metrics.offset.width - metrics.client.width
        } else {
            event.offset.x > metrics.client.width
        };
    let horizontal = can_scroll_x && event.offset.y > metrics.client.height;
    vertical || horizontal
}
