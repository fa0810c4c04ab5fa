// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hover: opening while the pointer is over the reference.
//!
//! Entering the reference opens after the open delay; leaving it closes after
//! the close delay. Entering the floating element cancels a pending close.
//! Delays are skipped for touch and other non-mouse pointers.
//!
//! With a `rest_ms` threshold and no open delay, opening waits instead until
//! the pointer has rested on the reference for that long.
//!
//! A [`HandleClose`] replaces the close-on-leave behavior: it receives the
//! point where the pointer left and decides, from the document's `mousemove`
//! events, when to close. This is how a safe area between the reference and
//! the floating element is implemented.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::Point;
use tether_reactive::Effect;

use crate::context::{FloatingContext, OpenChangeReason};
use crate::event::{Event, EventKind, PointerType, is_mouse_like};
use crate::platform::{
    Listener, ListenerOptions, ListenerSet, ListenerTarget, Platform, bind_listener,
    is_event_target_within,
};
use crate::props::{ElementProps, Props, bind};
use crate::timer::TimeoutSlot;

/// Open and close delays, in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Delay {
    /// Delay before opening.
    pub open: u64,
    /// Delay before closing.
    pub close: u64,
}

impl Delay {
    /// The same delay both ways.
    pub fn uniform(ms: u64) -> Self {
        Self { open: ms, close: ms }
    }

    /// The delay for opening (`open == true`) or closing.
    ///
    /// A known pointer type that is not mouse-like gets no delay.
    pub fn get(self, open: bool, pointer_type: Option<PointerType>) -> u64 {
        if pointer_type.is_some() && !is_mouse_like(pointer_type, false) {
            return 0;
        }
        if open { self.open } else { self.close }
    }
}

/// What a [`HandleClose`] factory receives when the pointer leaves the
/// reference.
#[derive(Clone)]
pub struct SafeCloseContext {
    /// Where the pointer left the reference, in client coordinates.
    pub origin: Point,
    /// Closes the floating element and unregisters the handler.
    pub on_close: Rc<dyn Fn()>,
}

impl fmt::Debug for SafeCloseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeCloseContext")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Builds the document `mousemove` listener that decides when to close.
pub type HandleClose<E> = Rc<dyn Fn(SafeCloseContext) -> Listener<E>>;

/// Options for [`Hover`].
pub struct HoverOptions<E> {
    /// Default: `true`.
    pub enabled: bool,
    /// Default: no delay.
    pub delay: Delay,
    /// Replaces close-on-leave. Default: `None`.
    pub handle_close: Option<HandleClose<E>>,
    /// Ignore touch and unknown pointers. Default: `false`.
    pub mouse_only: bool,
    /// Open once the pointer rests this long. `0` disables. Default: `0`.
    pub rest_ms: u64,
    /// Also open on the first `mousemove` over the reference. Default: `true`.
    pub move_to_open: bool,
}

impl<E> Default for HoverOptions<E> {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: Delay::default(),
            handle_close: None,
            mouse_only: false,
            rest_ms: 0,
            move_to_open: true,
        }
    }
}

impl<E> fmt::Debug for HoverOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HoverOptions")
            .field("enabled", &self.enabled)
            .field("delay", &self.delay)
            .field("handle_close", &self.handle_close.is_some())
            .field("mouse_only", &self.mouse_only)
            .field("rest_ms", &self.rest_ms)
            .field("move_to_open", &self.move_to_open)
            .finish()
    }
}

/// Opens the floating element while the reference is hovered.
pub struct Hover<P: Platform> {
    state: Rc<HoverState<P>>,
    _effects: Vec<Effect>,
}

struct HoverState<P: Platform> {
    this: Weak<Self>,
    ctx: FloatingContext<P>,
    options: HoverOptions<P::Element>,
    pointer_type: Cell<Option<PointerType>>,
    timeout: TimeoutSlot,
    rest_timeout: TimeoutSlot,
    rest_pending: Cell<bool>,
    block_mouse_move: Cell<bool>,
    safe_close: RefCell<Option<ListenerSet<P>>>,
}

impl<P: Platform> fmt::Debug for Hover<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hover")
            .field("options", &self.state.options)
            .field("pointer_type", &self.state.pointer_type.get())
            .field("pending", &self.state.timeout.is_pending())
            .finish_non_exhaustive()
    }
}

impl<P: Platform> Hover<P> {
    /// Attach to `ctx`.
    pub fn new(ctx: &FloatingContext<P>, options: HoverOptions<P::Element>) -> Self {
        let enabled = options.enabled;
        let state = Rc::new_cyclic(|this| HoverState {
            this: this.clone(),
            ctx: ctx.clone(),
            options,
            pointer_type: Cell::new(None),
            timeout: TimeoutSlot::new(Rc::clone(ctx.timers())),
            rest_timeout: TimeoutSlot::new(Rc::clone(ctx.timers())),
            rest_pending: Cell::new(false),
            block_mouse_move: Cell::new(true),
            safe_close: RefCell::new(None),
        });
        if !enabled {
            return Self {
                state,
                _effects: Vec::new(),
            };
        }

        let weak = Rc::downgrade(&state);
        let reset = ctx.runtime().effect(move || {
            let state = weak.upgrade()?;
            if !state.ctx.is_open() {
                state.pointer_type.set(None);
                state.rest_pending.set(false);
                state.cleanup_safe_close();
            }
            None
        });

        let weak = Rc::downgrade(&state);
        let listeners = ctx.runtime().effect(move || {
            let state = weak.upgrade()?;
            // Re-registers the one-shot `mousemove` after every change.
            let _ = state.ctx.is_open();
            let reference = state.ctx.dom_reference();
            let floating = state.ctx.floating().get();
            let set = state.listen(reference, floating);
            Some(Box::new(move || drop(set)))
        });

        Self {
            state,
            _effects: vec![reset, listeners],
        }
    }

    /// This engine's contribution to the element props.
    pub fn props(&self) -> ElementProps<P::Element> {
        let state = &self.state;
        if !state.options.enabled {
            return ElementProps::empty();
        }
        let record = |s: &HoverState<P>, event: &Event<P::Element>| {
            s.pointer_type.set(event.pointer_type);
        };
        let reference = Props::new()
            .on_handler(EventKind::PointerDown.handler_name(false), bind(state, record))
            .on_handler(EventKind::PointerEnter.handler_name(false), bind(state, record))
            .on_handler(
                EventKind::MouseMove.handler_name(false),
                bind(state, HoverState::rest_on_reference),
            );
        ElementProps {
            reference: Some(reference),
            floating: None,
            item: None,
        }
    }

    /// Whether an open or close is scheduled.
    pub fn is_pending(&self) -> bool {
        self.state.timeout.is_pending() || self.state.rest_timeout.is_pending()
    }
}

impl<P: Platform> HoverState<P> {
    fn listen(
        self: &Rc<Self>,
        reference: Option<P::Element>,
        floating: Option<P::Element>,
    ) -> ListenerSet<P> {
        let mut set = ListenerSet::new(Rc::clone(self.ctx.platform()));
        if let Some(reference) = reference {
            if self.options.move_to_open {
                set.add(
                    ListenerTarget::Element(reference.clone()),
                    EventKind::MouseMove,
                    ListenerOptions {
                        capture: false,
                        once: true,
                    },
                    bind_listener(self, Self::enter_reference),
                );
            }
            set.add(
                ListenerTarget::Element(reference.clone()),
                EventKind::MouseEnter,
                ListenerOptions::BUBBLE,
                bind_listener(self, Self::enter_reference),
            );
            set.add(
                ListenerTarget::Element(reference),
                EventKind::MouseLeave,
                ListenerOptions::BUBBLE,
                bind_listener(self, Self::leave_reference),
            );
        }
        if let Some(floating) = floating {
            set.add(
                ListenerTarget::Element(floating.clone()),
                EventKind::MouseEnter,
                ListenerOptions::BUBBLE,
                bind_listener(self, |s: &Self, _| s.timeout.clear()),
            );
            set.add(
                ListenerTarget::Element(floating),
                EventKind::MouseLeave,
                ListenerOptions::BUBBLE,
                bind_listener(self, |s: &Self, _| {
                    if !s.is_click_like_open() {
                        s.close_with_delay(false, OpenChangeReason::Hover);
                    }
                }),
            );
        }
        set
    }

    fn is_click_like_open(&self) -> bool {
        matches!(
            self.ctx.open_event(),
            Some(EventKind::Click | EventKind::MouseDown)
        )
    }

    fn enter_reference(&self, event: &Event<P::Element>) {
        self.timeout.clear();
        self.block_mouse_move.set(false);
        let pointer_type = self.pointer_type.get();
        if (self.options.mouse_only && !is_mouse_like(pointer_type, false))
            || (self.options.rest_ms > 0 && self.options.delay.get(true, None) == 0)
        {
            return;
        }
        let delay = self.options.delay.get(true, pointer_type);
        if delay > 0 {
            let ctx = self.ctx.clone();
            let kind = event.kind;
            self.timeout.set(delay, move || {
                if !ctx.is_open_untracked() {
                    ctx.set_open_from(true, Some(OpenChangeReason::Hover), Some(kind));
                }
            });
        } else if !self.ctx.is_open_untracked() {
            self.ctx
                .set_open_with_event(true, Some(OpenChangeReason::Hover), event);
        }
    }

    fn leave_reference(&self, event: &Event<P::Element>) {
        if self.is_click_like_open() {
            return;
        }
        self.cleanup_safe_close();
        self.rest_timeout.clear();
        self.rest_pending.set(false);

        if let Some(handle_close) = &self.options.handle_close {
            if !self.ctx.is_open_untracked() {
                self.timeout.clear();
            }
            let this = self.this.clone();
            let listener = handle_close(SafeCloseContext {
                origin: event.client,
                on_close: Rc::new(move || {
                    if let Some(state) = this.upgrade() {
                        state.cleanup_safe_close();
                        if !state.is_click_like_open() {
                            state
                                .ctx
                                .set_open(false, Some(OpenChangeReason::SafePolygon));
                        }
                    }
                }),
            });
            let mut set = ListenerSet::new(Rc::clone(self.ctx.platform()));
            set.add(
                ListenerTarget::Document,
                EventKind::MouseMove,
                ListenerOptions::BUBBLE,
                listener,
            );
            *self.safe_close.borrow_mut() = Some(set);
            return;
        }

        // Touch leaves fire when tapping into the floating element.
        let should_close = self.pointer_type.get() != Some(PointerType::Touch)
            || !is_event_target_within(
                &**self.ctx.platform(),
                event.related_target.as_ref(),
                self.ctx.floating().get_untracked().as_ref(),
            );
        if should_close {
            self.close_with_delay(true, OpenChangeReason::Hover);
        }
    }

    fn close_with_delay(&self, run_else: bool, reason: OpenChangeReason) {
        let delay = self.options.delay.get(false, self.pointer_type.get());
        if delay > 0 && self.safe_close.borrow().is_none() {
            let ctx = self.ctx.clone();
            self.timeout
                .set(delay, move || ctx.set_open(false, Some(reason)));
        } else if run_else {
            self.timeout.clear();
            self.ctx.set_open(false, Some(reason));
        }
    }

    fn rest_on_reference(&self, event: &Event<P::Element>) {
        let pointer_type = self.pointer_type.get();
        if self.options.mouse_only && !is_mouse_like(pointer_type, false) {
            return;
        }
        if self.ctx.is_open_untracked() || self.options.rest_ms == 0 {
            return;
        }
        if self.rest_pending.get() && event.movement.hypot2() < 2.0 {
            return;
        }
        self.rest_timeout.clear();
        if pointer_type == Some(PointerType::Touch) {
            self.open_after_rest(event.kind);
        } else {
            self.rest_pending.set(true);
            let this = self.this.clone();
            let kind = event.kind;
            self.rest_timeout.set(self.options.rest_ms, move || {
                if let Some(state) = this.upgrade() {
                    state.open_after_rest(kind);
                }
            });
        }
    }

    fn open_after_rest(&self, kind: EventKind) {
        if !self.block_mouse_move.get() && !self.ctx.is_open_untracked() {
            self.ctx
                .set_open_from(true, Some(OpenChangeReason::Hover), Some(kind));
        }
    }

    fn cleanup_safe_close(&self) {
        let set = self.safe_close.borrow_mut().take();
        drop(set);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, MockPlatform};
    use kurbo::Vec2;

    fn hover(h: &Harness, options: HoverOptions<u32>) -> Hover<MockPlatform> {
        Hover::new(&h.ctx, options)
    }

    fn enter(h: &Harness) {
        h.platform
            .dispatch_element(h.reference, &Event::new(EventKind::MouseEnter));
    }

    fn leave(h: &Harness) {
        h.platform
            .dispatch_element(h.reference, &Event::new(EventKind::MouseLeave));
    }

    #[test]
    fn enter_opens_immediately_without_delay() {
        let h = Harness::new();
        let _hover = hover(&h, HoverOptions::default());
        enter(&h);
        assert!(h.ctx.is_open_untracked());
        assert_eq!(h.ctx.reason(), Some(OpenChangeReason::Hover));
        leave(&h);
        assert!(!h.ctx.is_open_untracked());
    }

    #[test]
    fn open_delay_then_open() {
        let h = Harness::new();
        let _hover = hover(
            &h,
            HoverOptions {
                delay: Delay { open: 100, close: 0 },
                ..HoverOptions::default()
            },
        );
        enter(&h);
        h.timers.advance(99);
        assert!(!h.ctx.is_open_untracked());
        h.timers.advance(1);
        assert!(h.ctx.is_open_untracked());
        assert_eq!(h.ctx.open_event(), Some(EventKind::MouseEnter));
    }

    #[test]
    fn leaving_before_the_open_delay_cancels_it() {
        let h = Harness::new();
        let hover = hover(
            &h,
            HoverOptions {
                delay: Delay { open: 100, close: 0 },
                ..HoverOptions::default()
            },
        );
        enter(&h);
        h.timers.advance(50);
        leave(&h);
        assert!(!hover.is_pending());
        h.timers.advance(500);
        assert!(!h.ctx.is_open_untracked());
    }

    #[test]
    fn entering_floating_cancels_close_delay() {
        let h = Harness::new();
        let _hover = hover(
            &h,
            HoverOptions {
                delay: Delay { open: 0, close: 80 },
                ..HoverOptions::default()
            },
        );
        enter(&h);
        leave(&h);
        h.timers.advance(40);
        h.platform
            .dispatch_element(h.floating, &Event::new(EventKind::MouseEnter));
        h.timers.advance(200);
        assert!(h.ctx.is_open_untracked());

        h.platform
            .dispatch_element(h.floating, &Event::new(EventKind::MouseLeave));
        h.timers.advance(80);
        assert!(!h.ctx.is_open_untracked());
    }

    #[test]
    fn touch_pointers_skip_delays() {
        let h = Harness::new();
        let hover = hover(
            &h,
            HoverOptions {
                delay: Delay::uniform(300),
                ..HoverOptions::default()
            },
        );
        hover.props().reference.unwrap().call(
            &Event::new(EventKind::PointerEnter).with_pointer_type(PointerType::Touch),
        );
        enter(&h);
        assert!(h.ctx.is_open_untracked());
    }

    #[test]
    fn touch_leave_into_floating_keeps_open() {
        let h = Harness::new();
        let hover = hover(&h, HoverOptions::default());
        let reference = hover.props().reference.unwrap();
        reference.call(&Event::new(EventKind::PointerDown).with_pointer_type(PointerType::Touch));
        enter(&h);
        assert!(h.ctx.is_open_untracked());

        let inside = h.platform.child_of(h.floating, "span");
        h.platform.dispatch_element(
            h.reference,
            &Event::new(EventKind::MouseLeave).with_related_target(inside),
        );
        assert!(h.ctx.is_open_untracked());
    }

    #[test]
    fn mouse_only_ignores_unknown_pointers() {
        let h = Harness::new();
        let hover = hover(
            &h,
            HoverOptions {
                mouse_only: true,
                ..HoverOptions::default()
            },
        );
        enter(&h);
        assert!(!h.ctx.is_open_untracked());

        hover
            .props()
            .reference
            .unwrap()
            .call(&Event::new(EventKind::PointerEnter).with_pointer_type(PointerType::Mouse));
        enter(&h);
        assert!(h.ctx.is_open_untracked());
    }

    #[test]
    fn click_opened_elements_ignore_leave() {
        let h = Harness::new();
        let _hover = hover(&h, HoverOptions::default());
        h.ctx
            .set_open_with_event(true, Some(OpenChangeReason::Click), &Event::new(EventKind::Click));
        leave(&h);
        assert!(h.ctx.is_open_untracked());
    }

    #[test]
    fn handle_close_decides_when_to_close() {
        let h = Harness::new();
        let origins = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&origins);
        let handle_close: HandleClose<u32> = Rc::new(move |cx: SafeCloseContext| -> Listener<u32> {
            seen.borrow_mut().push(cx.origin);
            let on_close = cx.on_close;
            Rc::new(move |event: &Event<u32>| {
                if event.client.x > 100.0 {
                    on_close();
                }
            })
        });
        let _hover = hover(
            &h,
            HoverOptions {
                handle_close: Some(handle_close),
                ..HoverOptions::default()
            },
        );
        enter(&h);
        h.platform.dispatch_element(
            h.reference,
            &Event::new(EventKind::MouseLeave).with_client(Point::new(5.0, 5.0)),
        );
        assert!(h.ctx.is_open_untracked());
        assert_eq!(*origins.borrow(), [Point::new(5.0, 5.0)]);
        assert_eq!(h.platform.listeners_on(&ListenerTarget::Document, EventKind::MouseMove), 1);

        h.platform.dispatch_document(
            &Event::new(EventKind::MouseMove).with_client(Point::new(50.0, 5.0)),
        );
        assert!(h.ctx.is_open_untracked());
        h.platform.dispatch_document(
            &Event::new(EventKind::MouseMove).with_client(Point::new(150.0, 5.0)),
        );
        assert!(!h.ctx.is_open_untracked());
        assert_eq!(h.ctx.reason(), Some(OpenChangeReason::SafePolygon));
        assert_eq!(h.platform.listeners_on(&ListenerTarget::Document, EventKind::MouseMove), 0);
    }

    #[test]
    fn resting_pointer_opens() {
        let h = Harness::new();
        let hover = hover(
            &h,
            HoverOptions {
                rest_ms: 150,
                ..HoverOptions::default()
            },
        );
        let reference = hover.props().reference.unwrap();
        enter(&h);
        assert!(!h.ctx.is_open_untracked());

        let moving = Event::new(EventKind::MouseMove).with_movement(Vec2::new(5.0, 0.0));
        reference.call(&moving);
        h.timers.advance(100);
        // Small movements do not restart the wait.
        reference.call(&Event::new(EventKind::MouseMove).with_movement(Vec2::new(1.0, 0.0)));
        h.timers.advance(50);
        assert!(h.ctx.is_open_untracked());
    }

    #[test]
    fn large_movements_restart_the_rest_wait() {
        let h = Harness::new();
        let hover = hover(
            &h,
            HoverOptions {
                rest_ms: 150,
                ..HoverOptions::default()
            },
        );
        let reference = hover.props().reference.unwrap();
        enter(&h);
        let moving = Event::new(EventKind::MouseMove).with_movement(Vec2::new(5.0, 0.0));
        reference.call(&moving);
        h.timers.advance(100);
        reference.call(&moving);
        h.timers.advance(100);
        assert!(!h.ctx.is_open_untracked());
        h.timers.advance(50);
        assert!(h.ctx.is_open_untracked());
    }

    #[test]
    fn disabled_contributes_nothing() {
        let h = Harness::new();
        let hover = hover(
            &h,
            HoverOptions {
                enabled: false,
                ..HoverOptions::default()
            },
        );
        assert!(hover.props().is_empty());
        assert_eq!(h.platform.listener_count(), 0);
        enter(&h);
        assert!(!h.ctx.is_open_untracked());
    }
}
