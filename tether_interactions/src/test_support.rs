// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A model DOM, an immediate positioning engine, and a test harness.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use hashbrown::{HashMap, HashSet};
use kurbo::Rect;
use tether_position::{
    PositionConfig, PositionEngine, PositionResult, ReferenceTarget, Resolve,
};
use tether_reactive::Runtime;

use crate::context::{ContextOptions, FloatingContext};
use crate::event::{Event, EventKind};
use crate::platform::{
    BoxMetrics, ComputedStyle, Listener, ListenerId, ListenerOptions, ListenerTarget, Platform,
};
use crate::timer::{ManualTimers, Timers};

struct Registered {
    id: ListenerId,
    target: ListenerTarget<u32>,
    kind: EventKind,
    options: ListenerOptions,
    listener: Listener<u32>,
}

/// Elements are `u32` ids; everything else lives in side tables.
#[derive(Default)]
pub(crate) struct MockPlatform {
    next_element: Cell<u32>,
    parents: RefCell<HashMap<u32, u32>>,
    tags: RefCell<HashMap<u32, String>>,
    input_types: RefCell<HashMap<u32, String>>,
    editable: RefCell<HashSet<u32>>,
    disabled: RefCell<HashSet<u32>>,
    styles: RefCell<HashMap<u32, ComputedStyle>>,
    metrics: RefCell<HashMap<u32, BoxMetrics>>,
    overflow: RefCell<HashMap<u32, Vec<ListenerTarget<u32>>>>,
    rects: RefCell<HashMap<u32, Rect>>,
    active: Cell<Option<u32>>,
    inert: RefCell<Vec<u32>>,
    mac_safari: Cell<bool>,
    webkit: Cell<bool>,
    no_focus_visible: Cell<bool>,
    next_listener: Cell<u64>,
    listeners: RefCell<Vec<Registered>>,
}

impl core::fmt::Debug for MockPlatform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MockPlatform")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

impl MockPlatform {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn element(&self, tag: &str) -> u32 {
        let id = self.next_element.get() + 1;
        self.next_element.set(id);
        self.tags.borrow_mut().insert(id, tag.into());
        id
    }

    pub(crate) fn child_of(&self, parent: u32, tag: &str) -> u32 {
        let id = self.element(tag);
        self.parents.borrow_mut().insert(id, parent);
        id
    }

    pub(crate) fn set_input_type(&self, element: u32, ty: &str) {
        self.input_types.borrow_mut().insert(element, ty.into());
    }

    pub(crate) fn set_content_editable(&self, element: u32) {
        self.editable.borrow_mut().insert(element);
    }

    pub(crate) fn set_disabled(&self, element: u32) {
        self.disabled.borrow_mut().insert(element);
    }

    pub(crate) fn set_style(&self, element: u32, style: ComputedStyle) {
        self.styles.borrow_mut().insert(element, style);
    }

    pub(crate) fn set_metrics(&self, element: u32, metrics: BoxMetrics) {
        self.metrics.borrow_mut().insert(element, metrics);
    }

    pub(crate) fn set_overflow_ancestors(&self, element: u32, ancestors: Vec<ListenerTarget<u32>>) {
        self.overflow.borrow_mut().insert(element, ancestors);
    }

    pub(crate) fn set_rect(&self, element: u32, rect: Rect) {
        self.rects.borrow_mut().insert(element, rect);
    }

    pub(crate) fn set_active(&self, element: Option<u32>) {
        self.active.set(element);
    }

    pub(crate) fn add_inert_marker(&self, element: u32) {
        self.inert.borrow_mut().push(element);
    }

    pub(crate) fn set_mac_safari(&self, value: bool) {
        self.mac_safari.set(value);
    }

    pub(crate) fn set_webkit(&self, value: bool) {
        self.webkit.set(value);
    }

    pub(crate) fn set_focus_visible(&self, value: bool) {
        self.no_focus_visible.set(!value);
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub(crate) fn listeners_on(&self, target: &ListenerTarget<u32>, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| &l.target == target && l.kind == kind)
            .count()
    }

    /// Deliver `event` to the listeners on `target`, capture phase first.
    ///
    /// Listeners removed by an earlier listener in the same dispatch are
    /// skipped; `once` listeners are removed before they run.
    pub(crate) fn dispatch(&self, target: &ListenerTarget<u32>, event: &Event<u32>) {
        let mut snapshot: Vec<(ListenerId, bool, bool, Listener<u32>)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| &l.target == target && l.kind == event.kind)
            .map(|l| (l.id, l.options.capture, l.options.once, Rc::clone(&l.listener)))
            .collect();
        snapshot.sort_by_key(|(_, capture, _, _)| !*capture);
        for (id, _, once, listener) in snapshot {
            let alive = self.listeners.borrow().iter().any(|l| l.id == id);
            if !alive {
                continue;
            }
            if once {
                self.remove_listener(id);
            }
            listener(event);
        }
    }

    pub(crate) fn dispatch_document(&self, event: &Event<u32>) {
        self.dispatch(&ListenerTarget::Document, event);
    }

    pub(crate) fn dispatch_window(&self, event: &Event<u32>) {
        self.dispatch(&ListenerTarget::Window, event);
    }

    pub(crate) fn dispatch_element(&self, element: u32, event: &Event<u32>) {
        self.dispatch(&ListenerTarget::Element(element), event);
    }
}

impl Platform for MockPlatform {
    type Element = u32;

    fn add_listener(
        &self,
        target: ListenerTarget<u32>,
        kind: EventKind,
        options: ListenerOptions,
        listener: Listener<u32>,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push(Registered {
            id,
            target,
            kind,
            options,
            listener,
        });
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|l| l.id != id);
    }

    fn contains(&self, ancestor: &u32, node: &u32) -> bool {
        let parents = self.parents.borrow();
        let mut current = Some(*node);
        while let Some(el) = current {
            if el == *ancestor {
                return true;
            }
            current = parents.get(&el).copied();
        }
        false
    }

    fn parent_element(&self, element: &u32) -> Option<u32> {
        self.parents.borrow().get(element).copied()
    }

    fn is_last_traversable(&self, element: &u32) -> bool {
        matches!(self.tag_name(element).as_str(), "html" | "body")
    }

    fn is_html_element(&self, _element: &u32) -> bool {
        true
    }

    fn tag_name(&self, element: &u32) -> String {
        self.tags
            .borrow()
            .get(element)
            .cloned()
            .unwrap_or_else(|| "div".into())
    }

    fn input_type(&self, element: &u32) -> Option<String> {
        self.input_types.borrow().get(element).cloned()
    }

    fn is_content_editable(&self, element: &u32) -> bool {
        self.editable.borrow().contains(element)
    }

    fn computed_style(&self, element: &u32) -> ComputedStyle {
        self.styles.borrow().get(element).copied().unwrap_or_default()
    }

    fn box_metrics(&self, element: &u32) -> BoxMetrics {
        self.metrics.borrow().get(element).copied().unwrap_or_default()
    }

    fn overflow_ancestors(&self, element: &u32) -> Vec<ListenerTarget<u32>> {
        self.overflow
            .borrow()
            .get(element)
            .cloned()
            .unwrap_or_else(|| vec![ListenerTarget::Window])
    }

    fn active_element(&self) -> Option<u32> {
        self.active.get()
    }

    fn inert_markers(&self) -> Vec<u32> {
        self.inert.borrow().clone()
    }

    fn bounding_rect(&self, element: &u32) -> Rect {
        self.rects.borrow().get(element).copied().unwrap_or(Rect::ZERO)
    }

    fn is_disabled(&self, element: &u32) -> bool {
        self.disabled.borrow().contains(element)
    }

    fn is_mac_safari(&self) -> bool {
        self.mac_safari.get()
    }

    fn is_webkit(&self) -> bool {
        self.webkit.get()
    }

    fn matches_focus_visible(&self, _element: &u32) -> bool {
        !self.no_focus_visible.get()
    }
}

/// Resolves every request synchronously at `(10, 20)`.
#[derive(Debug, Default)]
pub(crate) struct ImmediateEngine {
    pub(crate) calls: Cell<usize>,
    pub(crate) last_reference: RefCell<Option<ReferenceTarget<u32>>>,
}

impl PositionEngine for ImmediateEngine {
    type Element = u32;

    fn compute_position(
        &self,
        reference: &ReferenceTarget<u32>,
        _floating: &u32,
        config: &PositionConfig,
        resolve: Resolve,
    ) {
        self.calls.set(self.calls.get() + 1);
        *self.last_reference.borrow_mut() = Some(reference.clone());
        resolve(Ok(PositionResult {
            x: 10.0,
            y: 20.0,
            placement: config.placement,
            strategy: config.strategy,
            ..PositionResult::default()
        }));
    }
}

/// A runtime, a model DOM with `body > reference` and `body > floating`,
/// manual timers, and a context wired to them.
pub(crate) struct Harness {
    pub(crate) rt: Runtime,
    pub(crate) platform: Rc<MockPlatform>,
    pub(crate) timers: Rc<ManualTimers>,
    pub(crate) engine: Rc<ImmediateEngine>,
    pub(crate) body: u32,
    pub(crate) reference: u32,
    pub(crate) floating: u32,
    pub(crate) ctx: FloatingContext<MockPlatform>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_options(ContextOptions::default())
    }

    pub(crate) fn with_options(options: ContextOptions<u32>) -> Self {
        let rt = Runtime::new();
        let platform = Rc::new(MockPlatform::new());
        let timers = Rc::new(ManualTimers::new());
        let engine = Rc::new(ImmediateEngine::default());
        let body = platform.element("body");
        let reference = platform.child_of(body, "button");
        let floating = platform.child_of(body, "div");
        let ctx = build(&rt, &platform, &timers, &engine, reference, floating, options);
        Self {
            rt,
            platform,
            timers,
            engine,
            body,
            reference,
            floating,
            ctx,
        }
    }

    /// Another context on the same runtime, platform, and timers, with its
    /// own `body > button` and `body > div`.
    pub(crate) fn context(&self, options: ContextOptions<u32>) -> FloatingContext<MockPlatform> {
        let reference = self.platform.child_of(self.body, "button");
        let floating = self.platform.child_of(self.body, "div");
        build(
            &self.rt,
            &self.platform,
            &self.timers,
            &self.engine,
            reference,
            floating,
            options,
        )
    }

    /// A fresh element under `body`.
    pub(crate) fn outside(&self) -> u32 {
        self.platform.child_of(self.body, "div")
    }
}

fn build(
    rt: &Runtime,
    platform: &Rc<MockPlatform>,
    timers: &Rc<ManualTimers>,
    engine: &Rc<ImmediateEngine>,
    reference: u32,
    floating: u32,
    options: ContextOptions<u32>,
) -> FloatingContext<MockPlatform> {
    let timers: Rc<dyn Timers> = timers.clone();
    let engine: Rc<dyn PositionEngine<Element = u32>> = engine.clone();
    let ctx = FloatingContext::new(rt, Rc::clone(platform), timers, engine, options);
    ctx.set_reference(Some(ReferenceTarget::Element(reference)));
    ctx.set_floating(Some(floating));
    ctx
}
