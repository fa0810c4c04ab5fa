// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-agnostic input events.
//!
//! The engines never see platform event objects. The host translates each
//! native event into an [`Event`] and either dispatches it to the listener the
//! engine registered through the [`Platform`](crate::Platform), or passes it to
//! a handler obtained from the merged props.

use alloc::string::String;
use core::cell::Cell;

use bitflags::bitflags;
use kurbo::{Point, Vec2};

/// Input device that produced a pointer event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerType {
    /// A mouse.
    Mouse,
    /// A stylus.
    Pen,
    /// A finger on a touch surface.
    Touch,
}

impl PointerType {
    /// The DOM `pointerType` string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mouse => "mouse",
            Self::Pen => "pen",
            Self::Touch => "touch",
        }
    }
}

/// Whether `pointer_type` behaves like a mouse.
///
/// Pens count as mouse-like unless `strict` is set. An unknown pointer type is
/// never mouse-like.
pub fn is_mouse_like(pointer_type: Option<PointerType>, strict: bool) -> bool {
    match pointer_type {
        Some(PointerType::Mouse) => true,
        Some(PointerType::Pen) => !strict,
        Some(PointerType::Touch) | None => false,
    }
}

bitflags! {
    /// Keyboard modifiers held during an event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT = 1 << 0;
        /// Control.
        const CTRL = 1 << 1;
        /// Alt / Option.
        const ALT = 1 << 2;
        /// Meta / Command.
        const META = 1 << 3;
    }
}

/// The kinds of events the engines consume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `pointerdown`
    PointerDown,
    /// `pointerenter`
    PointerEnter,
    /// `mousedown`
    MouseDown,
    /// `mouseup`
    MouseUp,
    /// `mouseenter`
    MouseEnter,
    /// `mouseleave`
    MouseLeave,
    /// `mousemove`
    MouseMove,
    /// `click`
    Click,
    /// `keydown`
    KeyDown,
    /// `keyup`
    KeyUp,
    /// `focus`
    Focus,
    /// `blur`
    Blur,
    /// `scroll`
    Scroll,
    /// `compositionstart`
    CompositionStart,
    /// `compositionend`
    CompositionEnd,
}

impl EventKind {
    /// The DOM event type, e.g. `"pointerdown"`.
    pub fn dom_name(self) -> &'static str {
        match self {
            Self::PointerDown => "pointerdown",
            Self::PointerEnter => "pointerenter",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseEnter => "mouseenter",
            Self::MouseLeave => "mouseleave",
            Self::MouseMove => "mousemove",
            Self::Click => "click",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Scroll => "scroll",
            Self::CompositionStart => "compositionstart",
            Self::CompositionEnd => "compositionend",
        }
    }

    /// The prop key for a handler of this event, e.g. `"onPointerDown"`, or
    /// `"onPointerDownCapture"` for the capture phase.
    pub fn handler_name(self, capture: bool) -> &'static str {
        let (bubble, capturing) = match self {
            Self::PointerDown => ("onPointerDown", "onPointerDownCapture"),
            Self::PointerEnter => ("onPointerEnter", "onPointerEnterCapture"),
            Self::MouseDown => ("onMouseDown", "onMouseDownCapture"),
            Self::MouseUp => ("onMouseUp", "onMouseUpCapture"),
            Self::MouseEnter => ("onMouseEnter", "onMouseEnterCapture"),
            Self::MouseLeave => ("onMouseLeave", "onMouseLeaveCapture"),
            Self::MouseMove => ("onMouseMove", "onMouseMoveCapture"),
            Self::Click => ("onClick", "onClickCapture"),
            Self::KeyDown => ("onKeyDown", "onKeyDownCapture"),
            Self::KeyUp => ("onKeyUp", "onKeyUpCapture"),
            Self::Focus => ("onFocus", "onFocusCapture"),
            Self::Blur => ("onBlur", "onBlurCapture"),
            Self::Scroll => ("onScroll", "onScrollCapture"),
            Self::CompositionStart => ("onCompositionStart", "onCompositionStartCapture"),
            Self::CompositionEnd => ("onCompositionEnd", "onCompositionEndCapture"),
        };
        if capture { capturing } else { bubble }
    }
}

/// One input event, as seen by the engines.
///
/// Fields that do not apply to a kind keep their defaults. The
/// default-prevented and propagation-stopped flags are interior-mutable so
/// handlers can set them through a shared reference; the host reads them back
/// after dispatch.
#[derive(Clone, Debug)]
pub struct Event<E> {
    /// What happened.
    pub kind: EventKind,
    /// The element the event was dispatched to.
    pub target: Option<E>,
    /// For enter/leave and focus/blur: the element on the other side.
    pub related_target: Option<E>,
    /// For pointer events: the input device.
    pub pointer_type: Option<PointerType>,
    /// For mouse events: the button (`0` is the primary button).
    pub button: u8,
    /// Pointer position in viewport coordinates.
    pub client: Point,
    /// Pointer position relative to the target's padding edge.
    pub offset: Point,
    /// Pointer movement since the previous move event.
    pub movement: Vec2,
    /// For keyboard events: the `key` value, e.g. `"Escape"` or `"a"`.
    pub key: String,
    /// Held modifiers.
    pub modifiers: Modifiers,
    /// For keyboard events: whether an IME composition is in progress.
    pub is_composing: bool,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl<E> Event<E> {
    /// An event of `kind` with every other field defaulted.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            target: None,
            related_target: None,
            pointer_type: None,
            button: 0,
            client: Point::ZERO,
            offset: Point::ZERO,
            movement: Vec2::ZERO,
            key: String::new(),
            modifiers: Modifiers::empty(),
            is_composing: false,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    /// A `keydown` for `key`.
    pub fn key_down(key: &str) -> Self {
        Self::new(EventKind::KeyDown).with_key(key)
    }

    /// A `keyup` for `key`.
    pub fn key_up(key: &str) -> Self {
        Self::new(EventKind::KeyUp).with_key(key)
    }

    /// Set the target.
    pub fn with_target(mut self, target: E) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the related target.
    pub fn with_related_target(mut self, related: E) -> Self {
        self.related_target = Some(related);
        self
    }

    /// Set the pointer type.
    pub fn with_pointer_type(mut self, pointer_type: PointerType) -> Self {
        self.pointer_type = Some(pointer_type);
        self
    }

    /// Set the mouse button.
    pub fn with_button(mut self, button: u8) -> Self {
        self.button = button;
        self
    }

    /// Set the viewport position.
    pub fn with_client(mut self, client: Point) -> Self {
        self.client = client;
        self
    }

    /// Set the target-relative position.
    pub fn with_offset(mut self, offset: Point) -> Self {
        self.offset = offset;
        self
    }

    /// Set the movement delta.
    pub fn with_movement(mut self, movement: Vec2) -> Self {
        self.movement = movement;
        self
    }

    /// Set the key.
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = String::from(key);
        self
    }

    /// Set the held modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Mark the event as part of an IME composition.
    pub fn with_composing(mut self, composing: bool) -> Self {
        self.is_composing = composing;
        self
    }

    /// Ask the host to skip the default action.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    /// Whether a handler called [`Event::prevent_default`].
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Ask the host not to propagate the event further.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Whether a handler called [`Event::stop_propagation`].
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}
