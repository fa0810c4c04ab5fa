// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client point: anchoring the floating element to the pointer.
//!
//! The reference is replaced by a zero-size [`VirtualElement`] at the
//! pointer's client coordinates, keeping the real element as its context
//! element. While the floating element is shown, a window `mousemove`
//! listener keeps it following the cursor until the cursor enters it.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use kurbo::{Point, Rect, Size};
use tether_position::{ReferenceTarget, VirtualElement};
use tether_reactive::{Effect, Signal};

use crate::context::FloatingContext;
use crate::event::{Event, EventKind, PointerType, is_mouse_like};
use crate::platform::{
    ListenerOptions, ListenerSet, ListenerTarget, Platform, bind_listener, is_event_target_within,
};
use crate::props::{ElementProps, Props, bind};

/// Which coordinates follow the pointer. The other axis comes from the
/// reference element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal only.
    X,
    /// Vertical only.
    Y,
    /// Both.
    #[default]
    Both,
}

impl Axis {
    fn has_x(self) -> bool {
        self != Self::Y
    }

    fn has_y(self) -> bool {
        self != Self::X
    }
}

/// Options for [`ClientPoint`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClientPointOptions {
    /// Default: `true`.
    pub enabled: bool,
    /// Default: [`Axis::Both`].
    pub axis: Axis,
    /// A fixed `x` coordinate. Fixed coordinates disable following.
    pub x: Option<f64>,
    /// A fixed `y` coordinate.
    pub y: Option<f64>,
}

impl Default for ClientPointOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            axis: Axis::Both,
            x: None,
            y: None,
        }
    }
}

impl ClientPointOptions {
    fn is_fixed(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }
}

/// Positions the floating element at the pointer.
pub struct ClientPoint<P: Platform> {
    state: Rc<ClientPointState<P>>,
    _follow: Option<Effect>,
}

struct ClientPointState<P: Platform> {
    ctx: FloatingContext<P>,
    options: ClientPointOptions,
    pointer_type: Signal<Option<PointerType>>,
    follower: RefCell<Option<ListenerSet<P>>>,
}

impl<P: Platform> fmt::Debug for ClientPoint<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientPoint")
            .field("options", &self.state.options)
            .field("pointer_type", &self.state.pointer_type.get_untracked())
            .field("following", &self.is_following())
            .finish_non_exhaustive()
    }
}

impl<P: Platform> ClientPoint<P> {
    /// Attach to `ctx`. Fixed coordinates are applied immediately.
    pub fn new(ctx: &FloatingContext<P>, options: ClientPointOptions) -> Self {
        let state = Rc::new(ClientPointState {
            ctx: ctx.clone(),
            options,
            pointer_type: ctx.runtime().signal(None),
            follower: RefCell::new(None),
        });
        if !options.enabled {
            return Self {
                state,
                _follow: None,
            };
        }
        if options.is_fixed() {
            state.set_reference(options.x, options.y);
            return Self {
                state,
                _follow: None,
            };
        }

        let weak = Rc::downgrade(&state);
        let follow = ctx.runtime().effect(move || {
            let state = weak.upgrade()?;
            let shown = if is_mouse_like(state.pointer_type.get(), false) {
                // Keep following while a close transition runs.
                state.ctx.floating().with(Option::is_some)
            } else {
                state.ctx.is_open()
            };
            if !shown {
                return None;
            }
            state.ctx.runtime().untrack(|| state.follow());
            let weak = Rc::downgrade(&state);
            Some(Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    state.stop_following();
                }
            }))
        });

        Self {
            state,
            _follow: Some(follow),
        }
    }

    /// This engine's contribution to the element props.
    pub fn props(&self) -> ElementProps<P::Element> {
        let state = &self.state;
        if !state.options.enabled {
            return ElementProps::empty();
        }
        let record = |s: &ClientPointState<P>, event: &Event<P::Element>| {
            s.pointer_type.set(event.pointer_type);
        };
        let reference = Props::new()
            .on_handler(EventKind::PointerDown.handler_name(false), bind(state, record))
            .on_handler(EventKind::PointerEnter.handler_name(false), bind(state, record))
            .on_handler(
                EventKind::MouseMove.handler_name(false),
                bind(state, ClientPointState::on_reference_pointer),
            )
            .on_handler(
                EventKind::MouseEnter.handler_name(false),
                bind(state, ClientPointState::on_reference_pointer),
            );
        ElementProps {
            reference: Some(reference),
            floating: None,
            item: None,
        }
    }

    /// Whether the window listener is following the cursor.
    pub fn is_following(&self) -> bool {
        self.state.follower.borrow().is_some()
    }
}

impl<P: Platform> ClientPointState<P> {
    fn on_reference_pointer(&self, event: &Event<P::Element>) {
        if self.options.is_fixed() {
            return;
        }
        self.set_reference(Some(event.client.x), Some(event.client.y));
    }

    fn set_reference(&self, x: Option<f64>, y: Option<f64>) {
        let platform = Rc::clone(self.ctx.platform());
        let context = self.ctx.dom_reference_untracked();
        let axis = self.options.axis;
        let anchor = context.clone();
        let mut virtual_element = VirtualElement::new(move || {
            let bounds = anchor
                .as_ref()
                .map_or(Rect::ZERO, |element| platform.bounding_rect(element));
            point_rect(bounds, axis, x, y)
        });
        if let Some(element) = context {
            virtual_element = virtual_element.with_context_element(element);
        }
        self.ctx
            .set_reference(Some(ReferenceTarget::Virtual(virtual_element)));
        self.ctx.update();
    }

    fn follow(self: &Rc<Self>) {
        if self.follower.borrow().is_some() {
            return;
        }
        let mut set = ListenerSet::new(Rc::clone(self.ctx.platform()));
        set.add(
            ListenerTarget::Window,
            EventKind::MouseMove,
            ListenerOptions::BUBBLE,
            bind_listener(self, |s: &Self, event| {
                let floating = s.ctx.floating().get_untracked();
                let platform = &**s.ctx.platform();
                if is_event_target_within(platform, event.target.as_ref(), floating.as_ref()) {
                    s.stop_following();
                } else {
                    s.set_reference(Some(event.client.x), Some(event.client.y));
                }
            }),
        );
        *self.follower.borrow_mut() = Some(set);
    }

    fn stop_following(&self) {
        let set = self.follower.borrow_mut().take();
        drop(set);
    }
}

/// The rectangle of a client point on `axis`, taking the rest from `bounds`.
fn point_rect(bounds: Rect, axis: Axis, x: Option<f64>, y: Option<f64>) -> Rect {
    let origin = Point::new(
        x.filter(|_| axis.has_x()).unwrap_or(bounds.x0),
        y.filter(|_| axis.has_y()).unwrap_or(bounds.y0),
    );
    let size = Size::new(
        if axis == Axis::Y { bounds.width() } else { 0.0 },
        if axis == Axis::X { bounds.height() } else { 0.0 },
    );
    Rect::from_origin_size(origin, size)
}
