// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host seam: DOM capability probes and listener registration.

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Rect, Size};
use smallvec::SmallVec;

use crate::event::{Event, EventKind};

/// Where a listener is attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenerTarget<E> {
    /// The owner document of the floating elements.
    Document,
    /// The window.
    Window,
    /// The window's visual viewport.
    VisualViewport,
    /// A specific element.
    Element(E),
}

/// Registration flags for [`Platform::add_listener`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Listen in the capture phase.
    pub capture: bool,
    /// Remove the listener after its first invocation.
    pub once: bool,
}

impl ListenerOptions {
    /// Bubble phase, persistent.
    pub const BUBBLE: Self = Self {
        capture: false,
        once: false,
    };

    /// Capture phase, persistent.
    pub const CAPTURE: Self = Self {
        capture: true,
        once: false,
    };

    /// Options with the given capture flag.
    pub fn capture(capture: bool) -> Self {
        Self {
            capture,
            once: false,
        }
    }
}

/// A registered event listener.
pub type Listener<E> = Rc<dyn Fn(&Event<E>)>;

/// Handle returned by [`Platform::add_listener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// A CSS `overflow` value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Overflow {
    /// `visible`
    #[default]
    Visible,
    /// `hidden`
    Hidden,
    /// `clip`
    Clip,
    /// `scroll`
    Scroll,
    /// `auto`
    Auto,
}

impl Overflow {
    /// Whether content overflowing on this axis can show a scrollbar.
    pub fn is_scrollable(self) -> bool {
        matches!(self, Self::Scroll | Self::Auto)
    }
}

/// The parts of an element's computed style the engines look at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComputedStyle {
    /// `overflow-x`
    pub overflow_x: Overflow,
    /// `overflow-y`
    pub overflow_y: Overflow,
    /// `direction: rtl`
    pub rtl: bool,
}

/// Box sizes of an element, in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxMetrics {
    /// `clientWidth` / `clientHeight`: padding box without scrollbars.
    pub client: Size,
    /// `scrollWidth` / `scrollHeight`: full scrollable content.
    pub scroll: Size,
    /// `offsetWidth` / `offsetHeight`: border box including scrollbars.
    pub offset: Size,
}

/// Everything the engines need from the host environment.
///
/// Implementations wrap a real DOM, or a model of one in tests. Probes are
/// pure: they must not dispatch events or mutate the tree.
pub trait Platform: 'static {
    /// Host element handle.
    type Element: Clone + PartialEq + 'static;

    /// Register `listener` for `kind` events on `target`.
    fn add_listener(
        &self,
        target: ListenerTarget<Self::Element>,
        kind: EventKind,
        options: ListenerOptions,
        listener: Listener<Self::Element>,
    ) -> ListenerId;

    /// Remove a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: &Self::Element, node: &Self::Element) -> bool;

    /// The parent element, if any.
    fn parent_element(&self, element: &Self::Element) -> Option<Self::Element>;

    /// Whether `element` is `html`, `body`, or a document root.
    fn is_last_traversable(&self, element: &Self::Element) -> bool;

    /// Whether `element` is an HTML element (as opposed to SVG or `MathML`).
    fn is_html_element(&self, element: &Self::Element) -> bool;

    /// Lowercase tag name, e.g. `"input"`.
    fn tag_name(&self, element: &Self::Element) -> String;

    /// The `type` of an `input` element, lowercase.
    fn input_type(&self, element: &Self::Element) -> Option<String>;

    /// Whether the element is editable through `contenteditable`.
    fn is_content_editable(&self, element: &Self::Element) -> bool;

    /// The computed style.
    fn computed_style(&self, element: &Self::Element) -> ComputedStyle;

    /// Box sizes.
    fn box_metrics(&self, element: &Self::Element) -> BoxMetrics;

    /// Every scroll container between `element` and the window, nearest first.
    ///
    /// May include [`ListenerTarget::Window`] and
    /// [`ListenerTarget::VisualViewport`].
    fn overflow_ancestors(&self, element: &Self::Element) -> Vec<ListenerTarget<Self::Element>>;

    /// The focused element of the owner document.
    fn active_element(&self) -> Option<Self::Element>;

    /// Elements currently marked inert by a focus manager.
    fn inert_markers(&self) -> Vec<Self::Element>;

    /// Border box in client coordinates.
    fn bounding_rect(&self, element: &Self::Element) -> Rect;

    /// Whether the element is disabled (`disabled` or `aria-disabled`).
    fn is_disabled(&self, _element: &Self::Element) -> bool {
        false
    }

    /// Whether the user agent is Safari on macOS.
    fn is_mac_safari(&self) -> bool {
        false
    }

    /// Whether the user agent is `WebKit`-based.
    fn is_webkit(&self) -> bool {
        false
    }

    /// Whether the element matches `:focus-visible`.
    fn matches_focus_visible(&self, _element: &Self::Element) -> bool {
        true
    }
}

/// `input` types that do not take typed text.
const NON_TEXT_INPUT_TYPES: [&str; 8] = [
    "checkbox", "radio", "file", "submit", "reset", "button", "image", "hidden",
];

/// Whether `element` accepts typed text: a text-like `input`, a `textarea`, or
/// a `contenteditable` element.
pub fn is_typeable_element<P: Platform + ?Sized>(platform: &P, element: &P::Element) -> bool {
    match platform.tag_name(element).as_str() {
        "textarea" => true,
        "input" => platform
            .input_type(element)
            .is_none_or(|ty| !NON_TEXT_INPUT_TYPES.contains(&ty.as_str())),
        _ => platform.is_content_editable(element),
    }
}

/// Whether `target` lies inside `container`.
pub fn is_event_target_within<P: Platform + ?Sized>(
    platform: &P,
    target: Option<&P::Element>,
    container: Option<&P::Element>,
) -> bool {
    match (target, container) {
        (Some(target), Some(container)) => platform.contains(container, target),
        _ => false,
    }
}

/// The outermost ancestor of `element` that is not the last traversable node.
pub fn root_ancestor<P: Platform + ?Sized>(platform: &P, element: &P::Element) -> P::Element {
    let mut current = element.clone();
    while let Some(parent) = platform.parent_element(&current) {
        if platform.is_last_traversable(&parent) {
            break;
        }
        current = parent;
    }
    current
}

/// A listener holding `state` weakly. It does nothing once `state` is gone.
pub(crate) fn bind_listener<S: 'static, E: 'static>(
    state: &Rc<S>,
    f: impl Fn(&S, &Event<E>) + 'static,
) -> Listener<E> {
    let weak: Weak<S> = Rc::downgrade(state);
    Rc::new(move |event: &Event<E>| {
        if let Some(state) = weak.upgrade() {
            f(&state, event);
        }
    })
}

/// Listeners registered together and removed together.
///
/// Dropping the set removes every listener it registered.
pub struct ListenerSet<P: Platform> {
    platform: Rc<P>,
    ids: SmallVec<[ListenerId; 4]>,
}

impl<P: Platform> fmt::Debug for ListenerSet<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl<P: Platform> ListenerSet<P> {
    /// An empty set on `platform`.
    pub fn new(platform: Rc<P>) -> Self {
        Self {
            platform,
            ids: SmallVec::new(),
        }
    }

    /// Register a listener and keep its id.
    pub fn add(
        &mut self,
        target: ListenerTarget<P::Element>,
        kind: EventKind,
        options: ListenerOptions,
        listener: Listener<P::Element>,
    ) {
        let id = self.platform.add_listener(target, kind, options, listener);
        self.ids.push(id);
    }

    /// Remove every listener registered so far.
    pub fn clear(&mut self) {
        for id in self.ids.drain(..) {
            self.platform.remove_listener(id);
        }
    }

    /// Number of listeners registered.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<P: Platform> Drop for ListenerSet<P> {
    fn drop(&mut self) {
        self.clear();
    }
}
