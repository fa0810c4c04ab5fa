// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The floating context shared by every engine.

use alloc::rc::Rc;
use alloc::string::String;
use core::cell::Cell;
use core::fmt;

use tether_position::{
    BindingOptions, FloatingStyles, PositionBinding, PositionData, PositionEngine, ReferenceTarget,
};
use tether_reactive::{Memo, ReadSignal, Runtime, Signal};
use tracing::debug;

use crate::event::{Event, EventKind};
use crate::platform::Platform;
use crate::timer::Timers;
use crate::tree::{EventEmitter, FloatingTree, NodeFlags, TreeEvent};

/// Why the open state last changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpenChangeReason {
    /// A press outside both elements.
    OutsidePress,
    /// The Escape key.
    EscapeKey,
    /// A scroll of an ancestor scroll container.
    AncestorScroll,
    /// A press on the reference element.
    ReferencePress,
    /// A click (or keyboard click) on the reference.
    Click,
    /// Pointer hover.
    Hover,
    /// Keyboard focus.
    Focus,
    /// Focus leaving both elements.
    FocusOut,
    /// List navigation keys.
    ListNavigation,
    /// The pointer left the safe area between reference and floating.
    SafePolygon,
}

impl OpenChangeReason {
    /// The kebab-case name, e.g. `"outside-press"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OutsidePress => "outside-press",
            Self::EscapeKey => "escape-key",
            Self::AncestorScroll => "ancestor-scroll",
            Self::ReferencePress => "reference-press",
            Self::Click => "click",
            Self::Hover => "hover",
            Self::Focus => "focus",
            Self::FocusOut => "focus-out",
            Self::ListNavigation => "list-navigation",
            Self::SafePolygon => "safe-polygon",
        }
    }
}

/// Called after every open-state change.
pub type OpenChangeCallback = Rc<dyn Fn(bool, Option<OpenChangeReason>)>;

/// Options for [`FloatingContext::new`].
pub struct ContextOptions<E> {
    /// Initial open state. Default: `false`.
    pub open: bool,
    /// Position binding options.
    pub position: BindingOptions<E>,
    /// Tree to register in.
    pub tree: Option<FloatingTree<E>>,
    /// This node's id in `tree`. Without it, nothing is registered.
    pub node_id: Option<String>,
    /// Logical parent in `tree`.
    pub parent_id: Option<String>,
    /// Notified after each open-state change.
    pub on_open_change: Option<OpenChangeCallback>,
}

impl<E> Default for ContextOptions<E> {
    fn default() -> Self {
        Self {
            open: false,
            position: BindingOptions::default(),
            tree: None,
            node_id: None,
            parent_id: None,
            on_open_change: None,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for ContextOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextOptions")
            .field("open", &self.open)
            .field("position", &self.position)
            .field("tree", &self.tree.is_some())
            .field("node_id", &self.node_id)
            .field("parent_id", &self.parent_id)
            .field("on_open_change", &self.on_open_change.is_some())
            .finish()
    }
}

/// Shared state of one floating element: open state, elements, position.
///
/// Engines hold a clone; cloning yields another handle to the same context.
/// [`FloatingContext::set_open`] is the single path for open-state writes.
pub struct FloatingContext<P: Platform> {
    inner: Rc<ContextInner<P>>,
}

struct ContextInner<P: Platform> {
    runtime: Runtime,
    platform: Rc<P>,
    timers: Rc<dyn Timers>,
    open: Signal<bool>,
    reason: Signal<Option<OpenChangeReason>>,
    position: PositionBinding<P::Element>,
    dom_reference: Memo<Option<P::Element>>,
    open_event: Cell<Option<EventKind>>,
    tree: Option<FloatingTree<P::Element>>,
    node_id: Option<String>,
    parent_id: Option<String>,
    flags: Rc<NodeFlags>,
    local_events: EventEmitter,
    on_open_change: Option<OpenChangeCallback>,
}

impl<P: Platform> Clone for FloatingContext<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: Platform> fmt::Debug for FloatingContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatingContext")
            .field("open", &self.inner.open.get_untracked())
            .field("reason", &self.inner.reason.get_untracked())
            .field("open_event", &self.inner.open_event.get())
            .field("node_id", &self.inner.node_id)
            .finish_non_exhaustive()
    }
}

impl<P: Platform> FloatingContext<P> {
    /// Create a context, registering it in `options.tree` when a node id is
    /// given.
    pub fn new(
        runtime: &Runtime,
        platform: Rc<P>,
        timers: Rc<dyn Timers>,
        engine: Rc<dyn PositionEngine<Element = P::Element>>,
        options: ContextOptions<P::Element>,
    ) -> Self {
        let open = runtime.signal(options.open);
        let reason = runtime.signal(None);
        let position = PositionBinding::new(
            runtime,
            engine,
            Some(open.read_only()),
            options.position,
        );
        let reference = position.reference();
        let dom_reference = runtime.memo(move || {
            reference.with(|r| r.as_ref().and_then(ReferenceTarget::context_element).cloned())
        });
        let flags = NodeFlags::new();

        if let (Some(tree), Some(id)) = (&options.tree, &options.node_id) {
            tree.add_node(
                id,
                options.parent_id.as_deref(),
                open.read_only(),
                position.floating().read_only(),
                Rc::clone(&flags),
            );
        }

        Self {
            inner: Rc::new(ContextInner {
                runtime: runtime.clone(),
                platform,
                timers,
                open,
                reason,
                position,
                dom_reference,
                open_event: Cell::new(None),
                tree: options.tree,
                node_id: options.node_id,
                parent_id: options.parent_id,
                flags,
                local_events: EventEmitter::new(),
                on_open_change: options.on_open_change,
            }),
        }
    }

    /// Change the open state.
    ///
    /// `open` and `reason` are written in one batch. Writing the current
    /// state is a no-op.
    pub fn set_open(&self, open: bool, reason: Option<OpenChangeReason>) {
        self.set_open_from(open, reason, None);
    }

    /// Change the open state in response to `event`.
    ///
    /// Opening records the event kind as the opening event, even when the
    /// element is already open.
    pub fn set_open_with_event(
        &self,
        open: bool,
        reason: Option<OpenChangeReason>,
        event: &Event<P::Element>,
    ) {
        self.set_open_from(open, reason, Some(event.kind));
    }

    /// Change the open state on behalf of an event of `kind` that is no
    /// longer at hand, e.g. from a timer.
    pub(crate) fn set_open_from(
        &self,
        open: bool,
        reason: Option<OpenChangeReason>,
        kind: Option<EventKind>,
    ) {
        let inner = &self.inner;
        let was_open = inner.open.get_untracked();
        if open {
            if kind.is_some() || !was_open {
                inner.open_event.set(kind);
            }
        } else {
            inner.open_event.set(None);
        }
        if was_open == open {
            return;
        }
        inner.runtime.batch(|| {
            inner.reason.set(reason);
            inner.open.set(open);
        });
        debug!(
            open,
            reason = reason.map(OpenChangeReason::as_str),
            node = inner.node_id.as_deref(),
            "open state changed"
        );
        self.events().emit(&TreeEvent::OpenChange {
            node_id: inner.node_id.clone(),
            open,
            reason,
        });
        if let Some(callback) = &inner.on_open_change {
            callback(open, reason);
        }
    }

    /// Current open state, tracked.
    pub fn is_open(&self) -> bool {
        self.inner.open.get()
    }

    /// Current open state, untracked.
    pub fn is_open_untracked(&self) -> bool {
        self.inner.open.get_untracked()
    }

    /// The open state as a read-only signal.
    pub fn open_signal(&self) -> ReadSignal<bool> {
        self.inner.open.read_only()
    }

    /// The reason for the last change, untracked.
    pub fn reason(&self) -> Option<OpenChangeReason> {
        self.inner.reason.get_untracked()
    }

    /// The reason as a read-only signal.
    pub fn reason_signal(&self) -> ReadSignal<Option<OpenChangeReason>> {
        self.inner.reason.read_only()
    }

    /// The kind of event that opened the element, while open.
    pub fn open_event(&self) -> Option<EventKind> {
        self.inner.open_event.get()
    }

    /// The reference cell.
    pub fn reference(&self) -> Signal<Option<ReferenceTarget<P::Element>>> {
        self.inner.position.reference()
    }

    /// The floating element cell.
    pub fn floating(&self) -> Signal<Option<P::Element>> {
        self.inner.position.floating()
    }

    /// Set the reference.
    pub fn set_reference(&self, reference: Option<ReferenceTarget<P::Element>>) {
        self.inner.position.set_reference(reference);
    }

    /// Set the floating element.
    pub fn set_floating(&self, floating: Option<P::Element>) {
        self.inner.position.set_floating(floating);
    }

    /// The reference's DOM element, tracked: the element itself, or a virtual
    /// reference's context element.
    pub fn dom_reference(&self) -> Option<P::Element> {
        self.inner.dom_reference.get()
    }

    /// [`FloatingContext::dom_reference`], untracked.
    pub fn dom_reference_untracked(&self) -> Option<P::Element> {
        self.inner.dom_reference.get_untracked()
    }

    /// The position binding.
    pub fn position(&self) -> &PositionBinding<P::Element> {
        &self.inner.position
    }

    /// The published position data.
    pub fn data(&self) -> ReadSignal<PositionData> {
        self.inner.position.data()
    }

    /// Ready-to-apply floating styles.
    pub fn floating_styles(&self) -> ReadSignal<FloatingStyles> {
        self.inner.position.floating_styles()
    }

    /// Recompute the position.
    pub fn update(&self) {
        self.inner.position.update();
    }

    /// The tree this context is registered in.
    pub fn tree(&self) -> Option<&FloatingTree<P::Element>> {
        self.inner.tree.as_ref()
    }

    /// This node's id.
    pub fn node_id(&self) -> Option<&str> {
        self.inner.node_id.as_deref()
    }

    /// The logical parent's id.
    pub fn parent_id(&self) -> Option<&str> {
        self.inner.parent_id.as_deref()
    }

    /// Dismissal flags published to the tree.
    pub fn flags(&self) -> &Rc<NodeFlags> {
        &self.inner.flags
    }

    /// The event channel: the tree's, or a private one without a tree.
    pub fn events(&self) -> &EventEmitter {
        match &self.inner.tree {
            Some(tree) => tree.events(),
            None => &self.inner.local_events,
        }
    }

    /// The reactive runtime.
    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    /// The host platform.
    pub fn platform(&self) -> &Rc<P> {
        &self.inner.platform
    }

    /// The host timers.
    pub fn timers(&self) -> &Rc<dyn Timers> {
        &self.inner.timers
    }
}

impl<P: Platform> Drop for ContextInner<P> {
    fn drop(&mut self) {
        if let (Some(tree), Some(id)) = (&self.tree, &self.node_id) {
            tree.remove_node(id);
        }
    }
}
