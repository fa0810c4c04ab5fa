// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Focus: opening while the reference has keyboard focus.
//!
//! Focus that returns to the reference when the window regains focus, or
//! after the element was closed with Escape or a reference press, does not
//! reopen it until the pointer leaves or the reference blurs.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

use tether_reactive::Effect;

use crate::context::{FloatingContext, OpenChangeReason};
use crate::event::{Event, EventKind};
use crate::platform::{
    ListenerOptions, ListenerSet, ListenerTarget, Platform, bind_listener,
    is_event_target_within, is_typeable_element,
};
use crate::props::{ElementProps, Props, bind};
use crate::timer::TimeoutSlot;
use crate::tree::{HandlerId, TreeEvent};

/// Options for [`Focus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FocusOptions {
    /// Default: `true`.
    pub enabled: bool,
    /// Only open for focus that would show a focus ring. Default: `true`.
    pub visible_only: bool,
}

impl Default for FocusOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            visible_only: true,
        }
    }
}

/// Opens the floating element while the reference is focused.
pub struct Focus<P: Platform> {
    state: Rc<FocusState<P>>,
    open_change: Option<HandlerId>,
    _window: Option<Effect>,
}

struct FocusState<P: Platform> {
    ctx: FloatingContext<P>,
    options: FocusOptions,
    block_focus: Cell<bool>,
    keyboard_modality: Cell<bool>,
    blur_timeout: TimeoutSlot,
}

impl<P: Platform> fmt::Debug for Focus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Focus")
            .field("options", &self.state.options)
            .field("block_focus", &self.state.block_focus.get())
            .field("keyboard_modality", &self.state.keyboard_modality.get())
            .finish_non_exhaustive()
    }
}

impl<P: Platform> Focus<P> {
    /// Attach to `ctx`.
    pub fn new(ctx: &FloatingContext<P>, options: FocusOptions) -> Self {
        let state = Rc::new(FocusState {
            ctx: ctx.clone(),
            options,
            block_focus: Cell::new(false),
            keyboard_modality: Cell::new(true),
            blur_timeout: TimeoutSlot::new(Rc::clone(ctx.timers())),
        });
        if !options.enabled {
            return Self {
                state,
                open_change: None,
                _window: None,
            };
        }

        let weak = Rc::downgrade(&state);
        let open_change = ctx.events().on("openchange", move |event| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            if let TreeEvent::OpenChange {
                node_id, reason, ..
            } = event
            {
                if node_id.as_deref() == state.ctx.node_id()
                    && matches!(
                        reason,
                        Some(OpenChangeReason::ReferencePress | OpenChangeReason::EscapeKey)
                    )
                {
                    state.block_focus.set(true);
                }
            }
        });

        let weak = Rc::downgrade(&state);
        let window = ctx.runtime().effect(move || {
            let state = weak.upgrade()?;
            let dom_reference = state.ctx.dom_reference();
            let set = state.listen_window(dom_reference);
            Some(Box::new(move || drop(set)))
        });

        Self {
            state,
            open_change: Some(open_change),
            _window: Some(window),
        }
    }

    /// This engine's contribution to the element props.
    pub fn props(&self) -> ElementProps<P::Element> {
        let state = &self.state;
        if !state.options.enabled {
            return ElementProps::empty();
        }
        let reference = Props::new()
            .on_handler(
                EventKind::MouseLeave.handler_name(false),
                bind(state, |s: &FocusState<P>, _| s.block_focus.set(false)),
            )
            .on_handler(
                EventKind::Focus.handler_name(false),
                bind(state, FocusState::open_on_focus),
            )
            .on_handler(
                EventKind::Blur.handler_name(false),
                bind(state, FocusState::close_on_blur),
            );
        ElementProps {
            reference: Some(reference),
            floating: None,
            item: None,
        }
    }
}

impl<P: Platform> Drop for Focus<P> {
    fn drop(&mut self) {
        if let Some(id) = self.open_change.take() {
            self.state.ctx.events().off("openchange", id);
        }
    }
}

impl<P: Platform> FocusState<P> {
    fn listen_window(self: &Rc<Self>, dom_reference: Option<P::Element>) -> ListenerSet<P> {
        let platform = self.ctx.platform();
        let mut set = ListenerSet::new(Rc::clone(platform));
        if dom_reference.is_none() {
            return set;
        }
        set.add(
            ListenerTarget::Window,
            EventKind::Blur,
            ListenerOptions::BUBBLE,
            bind_listener(self, |s: &Self, _| {
                // Focus comes back to the reference when the window does.
                let reference = s.ctx.dom_reference_untracked();
                if !s.ctx.is_open_untracked()
                    && reference.is_some()
                    && s.ctx.platform().active_element() == reference
                {
                    s.block_focus.set(true);
                }
            }),
        );
        if platform.is_mac_safari() {
            set.add(
                ListenerTarget::Window,
                EventKind::KeyDown,
                ListenerOptions::CAPTURE,
                bind_listener(self, |s: &Self, _| s.keyboard_modality.set(true)),
            );
            set.add(
                ListenerTarget::Window,
                EventKind::PointerDown,
                ListenerOptions::CAPTURE,
                bind_listener(self, |s: &Self, _| s.keyboard_modality.set(false)),
            );
        }
        set
    }

    fn open_on_focus(&self, event: &Event<P::Element>) {
        if self.block_focus.get() {
            return;
        }
        let platform = &**self.ctx.platform();
        if self.options.visible_only {
            let Some(target) = event
                .target
                .clone()
                .or_else(|| self.ctx.dom_reference_untracked())
            else {
                return;
            };
            if platform.is_mac_safari() && event.related_target.is_none() {
                if !self.keyboard_modality.get() && !is_typeable_element(platform, &target) {
                    return;
                }
            } else if !platform.matches_focus_visible(&target) {
                return;
            }
        }
        self.ctx
            .set_open_with_event(true, Some(OpenChangeReason::Focus), event);
    }

    fn close_on_blur(&self, event: &Event<P::Element>) {
        self.block_focus.set(false);
        let related = event.related_target.clone();
        let ctx = self.ctx.clone();
        let kind = event.kind;
        self.blur_timeout.set(0, move || {
            let platform = &**ctx.platform();
            let active = platform.active_element();
            let reference = ctx.dom_reference_untracked();
            if related.is_none() && active.is_some() && active == reference {
                return;
            }
            let floating = ctx.floating().get_untracked();
            for moved_to in [active.as_ref(), related.as_ref()] {
                if is_event_target_within(platform, moved_to, floating.as_ref())
                    || is_event_target_within(platform, moved_to, reference.as_ref())
                {
                    return;
                }
            }
            ctx.set_open_from(false, Some(OpenChangeReason::Focus), Some(kind));
        });
    }
}
