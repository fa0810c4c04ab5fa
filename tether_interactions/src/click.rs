// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Click: toggling on presses of the reference.
//!
//! Non-button references also respond to Enter (on key down) and Space (on
//! key up), the way a native button does.

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

use crate::context::{FloatingContext, OpenChangeReason};
use crate::event::{Event, EventKind, PointerType, is_mouse_like};
use crate::platform::{Platform, is_typeable_element};
use crate::props::{ElementProps, Props, bind};

/// The pointer event that toggles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClickEvent {
    /// A full click.
    #[default]
    Click,
    /// The press, without waiting for release.
    MouseDown,
}

/// Options for [`Click`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickOptions {
    /// Default: `true`.
    pub enabled: bool,
    /// Default: [`ClickEvent::Click`].
    pub event: ClickEvent,
    /// Close when pressed while open. Default: `true`.
    pub toggle: bool,
    /// Ignore mouse presses, e.g. when hover already opens. Default: `false`.
    pub ignore_mouse: bool,
    /// Handle Enter and Space on non-button references. Default: `true`.
    pub keyboard_handlers: bool,
    /// While opened by another kind of event, a press keeps the element open
    /// instead of toggling it. Default: `true`.
    pub stick_if_open: bool,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            event: ClickEvent::Click,
            toggle: true,
            ignore_mouse: false,
            keyboard_handlers: true,
            stick_if_open: true,
        }
    }
}

/// Toggles the floating element when the reference is pressed.
pub struct Click<P: Platform> {
    state: Rc<ClickState<P>>,
}

struct ClickState<P: Platform> {
    ctx: FloatingContext<P>,
    options: ClickOptions,
    pointer_type: Cell<Option<PointerType>>,
    did_key_down: Cell<bool>,
}

impl<P: Platform> fmt::Debug for Click<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Click")
            .field("options", &self.state.options)
            .field("pointer_type", &self.state.pointer_type.get())
            .finish_non_exhaustive()
    }
}

impl<P: Platform> Click<P> {
    /// Attach to `ctx`.
    pub fn new(ctx: &FloatingContext<P>, options: ClickOptions) -> Self {
        Self {
            state: Rc::new(ClickState {
                ctx: ctx.clone(),
                options,
                pointer_type: Cell::new(None),
                did_key_down: Cell::new(false),
            }),
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
                EventKind::PointerDown.handler_name(false),
                bind(state, |s: &ClickState<P>, event| {
                    s.pointer_type.set(event.pointer_type);
                }),
            )
            .on_handler(
                EventKind::MouseDown.handler_name(false),
                bind(state, ClickState::on_mouse_down),
            )
            .on_handler(
                EventKind::Click.handler_name(false),
                bind(state, ClickState::on_click),
            )
            .on_handler(
                EventKind::KeyDown.handler_name(false),
                bind(state, ClickState::on_key_down),
            )
            .on_handler(
                EventKind::KeyUp.handler_name(false),
                bind(state, ClickState::on_key_up),
            );
        ElementProps {
            reference: Some(reference),
            floating: None,
            item: None,
        }
    }
}

impl<P: Platform> ClickState<P> {
    fn ignores_pointer(&self) -> bool {
        self.options.ignore_mouse && is_mouse_like(self.pointer_type.get(), true)
    }

    /// Whether a press of `kind` closes the open element.
    fn closes(&self, kind: EventKind) -> bool {
        if !self.ctx.is_open_untracked() || !self.options.toggle {
            return false;
        }
        match self.ctx.open_event() {
            Some(opened_by) if self.options.stick_if_open => opened_by == kind,
            _ => true,
        }
    }

    fn press(&self, event: &Event<P::Element>) {
        let open = !self.closes(event.kind);
        if open && event.kind == EventKind::MouseDown {
            // Keeps focus from moving to the reference.
            event.prevent_default();
        }
        self.ctx
            .set_open_with_event(open, Some(OpenChangeReason::Click), event);
    }

    fn on_mouse_down(&self, event: &Event<P::Element>) {
        if event.button != 0 || self.options.event != ClickEvent::MouseDown || self.ignores_pointer()
        {
            return;
        }
        self.press(event);
    }

    fn on_click(&self, event: &Event<P::Element>) {
        if self.options.event == ClickEvent::MouseDown && self.pointer_type.take().is_some() {
            return;
        }
        if self.ignores_pointer() {
            return;
        }
        self.press(event);
    }

    fn skips_keys(&self, event: &Event<P::Element>) -> bool {
        event.is_default_prevented()
            || !self.options.keyboard_handlers
            || self.target_is(event, "button")
    }

    fn target_is(&self, event: &Event<P::Element>, tag: &str) -> bool {
        let platform = self.ctx.platform();
        event
            .target
            .as_ref()
            .is_some_and(|t| platform.is_html_element(t) && platform.tag_name(t) == tag)
    }

    fn space_ignored(&self) -> bool {
        self.ctx
            .dom_reference_untracked()
            .is_some_and(|r| is_typeable_element(&**self.ctx.platform(), &r))
    }

    fn toggle_by_key(&self, event: &Event<P::Element>) {
        let open = !(self.ctx.is_open_untracked() && self.options.toggle);
        self.ctx
            .set_open_with_event(open, Some(OpenChangeReason::Click), event);
    }

    fn on_key_down(&self, event: &Event<P::Element>) {
        self.pointer_type.set(None);
        if self.skips_keys(event) {
            return;
        }
        if event.key == " " && !self.space_ignored() {
            // Keeps the page from scrolling.
            event.prevent_default();
            self.did_key_down.set(true);
        }
        if self.target_is(event, "a") {
            return;
        }
        if event.key == "Enter" {
            self.toggle_by_key(event);
        }
    }

    fn on_key_up(&self, event: &Event<P::Element>) {
        if self.skips_keys(event) || self.space_ignored() {
            return;
        }
        if event.key == " " && self.did_key_down.replace(false) {
            self.toggle_by_key(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, MockPlatform};
    use tether_position::ReferenceTarget;

    fn click(h: &Harness, options: ClickOptions) -> (Click<MockPlatform>, Props<u32>) {
        let click = Click::new(&h.ctx, options);
        let reference = click.props().reference.unwrap();
        (click, reference)
    }

    fn div_reference(h: &Harness) -> u32 {
        let div = h.platform.child_of(h.body, "div");
        h.ctx.set_reference(Some(ReferenceTarget::Element(div)));
        div
    }

    #[test]
    fn click_toggles() {
        let h = Harness::new();
        let (_click, reference) = click(&h, ClickOptions::default());
        let press = Event::new(EventKind::Click).with_target(h.reference);

        reference.call(&press);
        assert!(h.ctx.is_open_untracked());
        assert_eq!(h.ctx.reason(), Some(OpenChangeReason::Click));

        reference.call(&press);
        assert!(!h.ctx.is_open_untracked());
        assert_eq!(h.ctx.reason(), Some(OpenChangeReason::Click));
    }

    #[test]
    fn without_toggle_click_only_opens() {
        let h = Harness::new();
        let (_click, reference) = click(
            &h,
            ClickOptions {
                toggle: false,
                ..ClickOptions::default()
            },
        );
        let press = Event::new(EventKind::Click);
        reference.call(&press);
        reference.call(&press);
        assert!(h.ctx.is_open_untracked());
    }

    #[test]
    fn mousedown_mode_ignores_the_following_click() {
        let h = Harness::new();
        let (_click, reference) = click(
            &h,
            ClickOptions {
                event: ClickEvent::MouseDown,
                ..ClickOptions::default()
            },
        );
        reference.call(&Event::new(EventKind::PointerDown).with_pointer_type(PointerType::Mouse));
        let down = Event::new(EventKind::MouseDown);
        reference.call(&down);
        assert!(down.is_default_prevented());
        assert!(h.ctx.is_open_untracked());
        reference.call(&Event::new(EventKind::Click));
        assert!(h.ctx.is_open_untracked());

        reference.call(&Event::new(EventKind::MouseDown).with_button(2));
        assert!(h.ctx.is_open_untracked());
    }

    #[test]
    fn ignore_mouse_skips_mouse_presses() {
        let h = Harness::new();
        let (_click, reference) = click(
            &h,
            ClickOptions {
                ignore_mouse: true,
                ..ClickOptions::default()
            },
        );
        reference.call(&Event::new(EventKind::PointerDown).with_pointer_type(PointerType::Mouse));
        reference.call(&Event::new(EventKind::Click));
        assert!(!h.ctx.is_open_untracked());

        reference.call(&Event::new(EventKind::PointerDown).with_pointer_type(PointerType::Touch));
        reference.call(&Event::new(EventKind::Click));
        assert!(h.ctx.is_open_untracked());
    }

    #[test]
    fn hover_opened_element_sticks_on_first_click() {
        let h = Harness::new();
        let (_click, reference) = click(&h, ClickOptions::default());
        h.ctx.set_open_with_event(
            true,
            Some(OpenChangeReason::Hover),
            &Event::new(EventKind::MouseEnter),
        );

        reference.call(&Event::new(EventKind::Click));
        assert!(h.ctx.is_open_untracked());
        assert_eq!(h.ctx.open_event(), Some(EventKind::Click));
        reference.call(&Event::new(EventKind::Click));
        assert!(!h.ctx.is_open_untracked());
    }

    #[test]
    fn enter_and_space_on_non_buttons() {
        let h = Harness::new();
        let div = div_reference(&h);
        let (_click, reference) = click(&h, ClickOptions::default());

        reference.call(&Event::key_down("Enter").with_target(div));
        assert!(h.ctx.is_open_untracked());

        let space = Event::key_down(" ").with_target(div);
        reference.call(&space);
        assert!(space.is_default_prevented());
        assert!(h.ctx.is_open_untracked());
        reference.call(&Event::key_up(" ").with_target(div));
        assert!(!h.ctx.is_open_untracked());
    }

    #[test]
    fn button_targets_rely_on_native_click() {
        let h = Harness::new();
        let (_click, reference) = click(&h, ClickOptions::default());
        reference.call(&Event::key_down("Enter").with_target(h.reference));
        reference.call(&Event::key_down(" ").with_target(h.reference));
        reference.call(&Event::key_up(" ").with_target(h.reference));
        assert!(!h.ctx.is_open_untracked());
    }

    #[test]
    fn space_in_text_fields_types() {
        let h = Harness::new();
        let input = h.platform.child_of(h.body, "input");
        h.ctx.set_reference(Some(ReferenceTarget::Element(input)));
        let (_click, reference) = click(&h, ClickOptions::default());

        let space = Event::key_down(" ").with_target(input);
        reference.call(&space);
        reference.call(&Event::key_up(" ").with_target(input));
        assert!(!space.is_default_prevented());
        assert!(!h.ctx.is_open_untracked());
    }

    #[test]
    fn enter_on_anchor_is_native() {
        let h = Harness::new();
        let anchor = h.platform.child_of(h.body, "a");
        h.ctx.set_reference(Some(ReferenceTarget::Element(anchor)));
        let (_click, reference) = click(&h, ClickOptions::default());
        reference.call(&Event::key_down("Enter").with_target(anchor));
        assert!(!h.ctx.is_open_untracked());
    }

    #[test]
    fn disabled_contributes_nothing() {
        let h = Harness::new();
        let click = Click::new(
            &h.ctx,
            ClickOptions {
                enabled: false,
                ..ClickOptions::default()
            },
        );
        assert!(click.props().is_empty());
    }
}
