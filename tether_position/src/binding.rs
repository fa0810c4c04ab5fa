// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The reactive position binding.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::Point;
use tether_reactive::{Cleanup, Effect, Memo, ReadSignal, Runtime, Signal};

use crate::engine::{PositionConfig, PositionEngine, PositionError};
use crate::styles::FloatingStyles;
use crate::types::{Middleware, Placement, PositionData, PositionResult, ReferenceTarget, Strategy};

/// A handle that re-runs [`PositionBinding::update`].
pub type UpdateFn = Rc<dyn Fn()>;

/// Auto-update hook, called while both elements are mounted.
///
/// Receives the elements and an [`UpdateFn`], and returns the teardown that
/// stops whatever it started. Typical implementations observe resize and
/// scroll and call the update handle.
pub type WhileElementsMounted<E> = Rc<dyn Fn(&ReferenceTarget<E>, &E, UpdateFn) -> Cleanup>;

/// Options for [`PositionBinding::new`].
pub struct BindingOptions<E> {
    /// Requested placement. Default: [`Placement::Bottom`].
    pub placement: Placement,
    /// Requested strategy. Default: [`Strategy::Absolute`].
    pub strategy: Strategy,
    /// Middleware passed to the engine.
    pub middleware: Vec<Middleware>,
    /// Position with `transform` rather than `top`/`left`. Default: `true`.
    pub transform: bool,
    /// Delegate all re-positioning to this hook while mounted.
    pub while_elements_mounted: Option<WhileElementsMounted<E>>,
}

impl<E> Default for BindingOptions<E> {
    fn default() -> Self {
        Self {
            placement: Placement::Bottom,
            strategy: Strategy::Absolute,
            middleware: Vec::new(),
            transform: true,
            while_elements_mounted: None,
        }
    }
}

impl<E> fmt::Debug for BindingOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingOptions")
            .field("placement", &self.placement)
            .field("strategy", &self.strategy)
            .field("middleware", &self.middleware)
            .field("transform", &self.transform)
            .field(
                "while_elements_mounted",
                &self.while_elements_mounted.is_some(),
            )
            .finish()
    }
}

/// Keeps a floating element's coordinates in sync with its reference.
///
/// The binding owns the reference and floating element cells, the published
/// [`PositionData`], and the derived [`FloatingStyles`]. It invokes the
/// [`PositionEngine`] whenever an element changes identity and, without a
/// [`WhileElementsMounted`] hook, whenever `open` changes.
///
/// Engine resolutions are never cancelled. Each request carries a generation
/// number; a resolution is applied only if it belongs to the latest request
/// and the binding is still alive.
pub struct PositionBinding<E: Clone + PartialEq + 'static> {
    inner: Rc<Inner<E>>,
}

struct Inner<E: Clone + PartialEq + 'static> {
    runtime: Runtime,
    engine: Rc<dyn PositionEngine<Element = E>>,
    open: Option<ReadSignal<bool>>,
    reference: Signal<Option<ReferenceTarget<E>>>,
    floating: Signal<Option<E>>,
    config: Signal<PositionConfig>,
    data: Signal<PositionData>,
    error: Signal<Option<PositionError>>,
    styles: Memo<FloatingStyles>,
    while_elements_mounted: Option<WhileElementsMounted<E>>,
    generation: Cell<u64>,
    mounted: Cell<bool>,
    effects: RefCell<Vec<Effect>>,
}

impl<E: Clone + PartialEq + 'static> Clone for PositionBinding<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for PositionBinding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionBinding")
            .field("reference", &self.inner.reference)
            .field("floating", &self.inner.floating)
            .field("data", &self.inner.data)
            .field("generation", &self.inner.generation.get())
            .field("mounted", &self.inner.mounted.get())
            .finish_non_exhaustive()
    }
}

impl<E: Clone + PartialEq + 'static> PositionBinding<E> {
    /// Create a binding.
    ///
    /// `open` is the floating element's visibility, if the caller tracks one.
    /// Without it, every resolution marks the data as positioned.
    pub fn new(
        runtime: &Runtime,
        engine: Rc<dyn PositionEngine<Element = E>>,
        open: Option<ReadSignal<bool>>,
        options: BindingOptions<E>,
    ) -> Self {
        let reference = runtime.signal(None);
        let floating: Signal<Option<E>> = runtime.signal(None);
        let config = runtime.signal(PositionConfig {
            placement: options.placement,
            strategy: options.strategy,
            middleware: options.middleware,
        });
        let data = runtime.signal(PositionData::initial(options.placement, options.strategy));

        let styles = runtime.memo({
            let (floating, config, data, engine) =
                (floating.clone(), config.clone(), data.clone(), Rc::clone(&engine));
            let transform = options.transform;
            move || {
                let strategy = config.with(|c| c.strategy);
                let Some(element) = floating.get() else {
                    return FloatingStyles::initial(strategy);
                };
                let dpr = engine.device_pixel_ratio(&element);
                let position = data.with(|d| Point::new(d.x, d.y));
                FloatingStyles::compute(strategy, transform, dpr, position)
            }
        });

        let inner = Rc::new(Inner {
            runtime: runtime.clone(),
            engine,
            open,
            reference,
            floating,
            config,
            data,
            error: runtime.signal(None),
            styles,
            while_elements_mounted: options.while_elements_mounted,
            generation: Cell::new(0),
            mounted: Cell::new(true),
            effects: RefCell::new(Vec::new()),
        });

        let closed_reset = runtime.effect({
            let inner = Rc::downgrade(&inner);
            move || {
                let inner = inner.upgrade()?;
                let open = inner.open.as_ref()?;
                if !open.get() && inner.data.get_untracked().is_positioned {
                    inner.data.update(|d| d.is_positioned = false);
                }
                None
            }
        });

        let main = runtime.effect({
            let weak = Rc::downgrade(&inner);
            move || {
                let inner = weak.upgrade()?;
                let reference = inner.reference.get();
                let floating = inner.floating.get();
                if inner.while_elements_mounted.is_none() {
                    if let Some(open) = &inner.open {
                        open.get();
                    }
                }
                let (Some(reference), Some(floating)) = (reference, floating) else {
                    return None;
                };
                if let Some(hook) = &inner.while_elements_mounted {
                    let update = update_fn(&weak);
                    return Some(inner.runtime.untrack(|| hook(&reference, &floating, update)));
                }
                inner.runtime.untrack(|| Inner::update(&inner));
                None
            }
        });

        inner.effects.borrow_mut().extend([closed_reset, main]);
        Self { inner }
    }

    /// Request a fresh computation from the engine.
    ///
    /// A no-op while either element is missing.
    pub fn update(&self) {
        Inner::update(&self.inner);
    }

    /// A detached handle to [`PositionBinding::update`], for auto-update hooks.
    pub fn update_fn(&self) -> UpdateFn {
        update_fn(&Rc::downgrade(&self.inner))
    }

    /// Mount or replace the reference.
    pub fn set_reference(&self, reference: Option<ReferenceTarget<E>>) {
        self.inner.reference.set(reference);
    }

    /// Mount or replace the floating element.
    pub fn set_floating(&self, floating: Option<E>) {
        self.inner.floating.set(floating);
    }

    /// The reference cell.
    pub fn reference(&self) -> Signal<Option<ReferenceTarget<E>>> {
        self.inner.reference.clone()
    }

    /// The floating element cell.
    pub fn floating(&self) -> Signal<Option<E>> {
        self.inner.floating.clone()
    }

    /// The published position.
    pub fn data(&self) -> ReadSignal<PositionData> {
        self.inner.data.read_only()
    }

    /// The last engine failure, cleared by the next successful resolution.
    pub fn error(&self) -> ReadSignal<Option<PositionError>> {
        self.inner.error.read_only()
    }

    /// Derived styles for the floating element.
    pub fn floating_styles(&self) -> ReadSignal<FloatingStyles> {
        self.inner.styles.read_only()
    }

    /// The configuration later requests use.
    pub fn config(&self) -> PositionConfig {
        self.inner.config.get_untracked()
    }

    /// Replace the middleware list. Structurally equal lists are ignored.
    pub fn set_middleware(&self, middleware: Vec<Middleware>) {
        self.inner.config.update(|c| c.middleware = middleware);
    }

    /// Change the requested placement.
    pub fn set_placement(&self, placement: Placement) {
        self.inner.config.update(|c| c.placement = placement);
    }

    /// Change the requested strategy.
    pub fn set_strategy(&self, strategy: Strategy) {
        self.inner.config.update(|c| c.strategy = strategy);
    }

    /// Stop reacting and ignore any in-flight resolution.
    ///
    /// Runs the auto-update teardown, if one is active. Also happens when the
    /// last handle is dropped.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Returns `false` once disposed.
    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }
}

fn update_fn<E: Clone + PartialEq + 'static>(weak: &Weak<Inner<E>>) -> UpdateFn {
    let weak = weak.clone();
    Rc::new(move || {
        if let Some(inner) = weak.upgrade() {
            Inner::update(&inner);
        }
    })
}

impl<E: Clone + PartialEq + 'static> Inner<E> {
    fn update(this: &Rc<Self>) {
        if !this.mounted.get() {
            return;
        }
        let (Some(reference), Some(floating)) = (
            this.reference.get_untracked(),
            this.floating.get_untracked(),
        ) else {
            return;
        };
        let config = this.config.get_untracked();
        let generation = this.generation.get() + 1;
        this.generation.set(generation);

        let weak = Rc::downgrade(this);
        let resolve = Box::new(move |result: Result<PositionResult, PositionError>| {
            match weak.upgrade() {
                Some(inner) => inner.resolve(generation, result),
                None => tracing::debug!(generation, "binding dropped; discarding position"),
            }
        });
        this.engine
            .compute_position(&reference, &floating, &config, resolve);
    }

    fn resolve(&self, generation: u64, result: Result<PositionResult, PositionError>) {
        let latest = self.generation.get();
        if !self.mounted.get() || generation != latest {
            tracing::debug!(
                generation,
                latest,
                mounted = self.mounted.get(),
                "discarding stale position resolution"
            );
            return;
        }
        match result {
            Ok(result) => {
                let is_positioned = self.open.as_ref().is_none_or(ReadSignal::get_untracked);
                let next = PositionData::from_result(result, is_positioned);
                self.runtime.batch(|| {
                    self.error.set(None);
                    self.data.set(next);
                });
            }
            Err(err) => {
                tracing::warn!(%err, "positioning engine rejected the request; keeping the last position");
                self.error.set(Some(err));
            }
        }
    }

    fn dispose(&self) {
        if !self.mounted.replace(false) {
            return;
        }
        let effects = core::mem::take(&mut *self.effects.borrow_mut());
        drop(effects);
    }
}

impl<E: Clone + PartialEq + 'static> Drop for Inner<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;

    use crate::types::VirtualElement;

    type Pending = Rc<RefCell<Vec<(Option<u32>, crate::engine::Resolve)>>>;

    /// Engine that parks every request until the test resolves it.
    struct ParkingEngine {
        pending: Pending,
        dpr: f64,
    }

    impl PositionEngine for ParkingEngine {
        type Element = u32;

        fn compute_position(
            &self,
            reference: &ReferenceTarget<u32>,
            _floating: &u32,
            _config: &PositionConfig,
            resolve: crate::engine::Resolve,
        ) {
            self.pending
                .borrow_mut()
                .push((reference.as_element().copied(), resolve));
        }

        fn device_pixel_ratio(&self, _floating: &u32) -> f64 {
            self.dpr
        }
    }

    fn at(x: f64, y: f64) -> Result<PositionResult, PositionError> {
        Ok(PositionResult {
            x,
            y,
            ..PositionResult::default()
        })
    }

    fn setup(
        options: BindingOptions<u32>,
    ) -> (Runtime, Signal<bool>, Pending, PositionBinding<u32>) {
        let rt = Runtime::new();
        let open = rt.signal(true);
        let pending: Pending = Rc::default();
        let engine = Rc::new(ParkingEngine {
            pending: pending.clone(),
            dpr: 1.0,
        });
        let binding = PositionBinding::new(&rt, engine, Some(open.read_only()), options);
        (rt, open, pending, binding)
    }

    fn take(pending: &Pending) -> Vec<(Option<u32>, crate::engine::Resolve)> {
        core::mem::take(&mut *pending.borrow_mut())
    }

    #[test]
    fn missing_elements_make_update_a_noop() {
        let (_rt, _open, pending, binding) = setup(BindingOptions::default());
        binding.update();
        binding.set_floating(Some(2));
        binding.update();
        assert!(pending.borrow().is_empty());
    }

    #[test]
    fn mounting_both_elements_requests_a_position() {
        let (_rt, _open, pending, binding) = setup(BindingOptions::default());
        binding.set_reference(Some(ReferenceTarget::Element(1)));
        binding.set_floating(Some(2));

        let mut requests = take(&pending);
        assert_eq!(requests.len(), 1);
        let (_, resolve) = requests.remove(0);
        resolve(at(10.0, 20.0));

        let data = binding.data().get_untracked();
        assert_eq!((data.x, data.y), (10.0, 20.0));
        assert!(data.is_positioned);
        assert_eq!(
            binding.floating_styles().get_untracked().transform.as_deref(),
            Some("translate(10px, 20px)")
        );
    }

    #[test]
    fn stale_resolution_is_discarded() {
        let (_rt, _open, pending, binding) = setup(BindingOptions::default());
        binding.set_reference(Some(ReferenceTarget::Element(1)));
        binding.set_floating(Some(2));
        binding.set_reference(Some(ReferenceTarget::Element(3)));

        let mut requests = take(&pending);
        assert_eq!(requests.len(), 2);
        let (newer_ref, newer) = requests.pop().unwrap();
        let (older_ref, older) = requests.pop().unwrap();
        assert_eq!((older_ref, newer_ref), (Some(1), Some(3)));

        newer(at(30.0, 30.0));
        older(at(10.0, 10.0));

        let data = binding.data().get_untracked();
        assert_eq!((data.x, data.y), (30.0, 30.0));
    }

    #[test]
    fn resolution_after_dispose_is_discarded() {
        let (_rt, _open, pending, binding) = setup(BindingOptions::default());
        binding.set_reference(Some(ReferenceTarget::Element(1)));
        binding.set_floating(Some(2));
        binding.dispose();
        assert!(!binding.is_mounted());

        let (_, resolve) = take(&pending).remove(0);
        resolve(at(5.0, 5.0));
        assert_eq!(binding.data().get_untracked().x, 0.0);
    }

    #[test]
    fn closing_resets_is_positioned_without_computation() {
        let (_rt, open, pending, binding) = setup(BindingOptions::default());
        binding.set_reference(Some(ReferenceTarget::Element(1)));
        binding.set_floating(Some(2));
        let (_, resolve) = take(&pending).remove(0);
        resolve(at(1.0, 1.0));
        assert!(binding.data().get_untracked().is_positioned);

        open.set(false);
        assert!(!binding.data().get_untracked().is_positioned);

        // The close also re-requested; resolving while closed keeps it false.
        let (_, resolve) = take(&pending).remove(0);
        resolve(at(2.0, 2.0));
        let data = binding.data().get_untracked();
        assert_eq!(data.x, 2.0);
        assert!(!data.is_positioned);
    }

    #[test]
    fn rejection_keeps_position_and_records_error() {
        let (_rt, _open, pending, binding) = setup(BindingOptions::default());
        binding.set_reference(Some(ReferenceTarget::Element(1)));
        binding.set_floating(Some(2));
        let (_, resolve) = take(&pending).remove(0);
        resolve(at(4.0, 4.0));

        binding.update();
        let (_, resolve) = take(&pending).remove(0);
        resolve(Err(PositionError::Rejected(String::from("detached"))));
        assert_eq!(binding.data().get_untracked().x, 4.0);
        assert_eq!(
            binding.error().get_untracked(),
            Some(PositionError::Rejected(String::from("detached")))
        );

        binding.update();
        let (_, resolve) = take(&pending).remove(0);
        resolve(at(6.0, 4.0));
        assert_eq!(binding.error().get_untracked(), None);
    }

    #[test]
    fn while_elements_mounted_owns_retriggering() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let update_handle: Rc<RefCell<Option<UpdateFn>>> = Rc::default();
        let hook: WhileElementsMounted<u32> = Rc::new({
            let (calls, update_handle) = (calls.clone(), update_handle.clone());
            move |reference: &ReferenceTarget<u32>, floating: &u32, update: UpdateFn| -> Cleanup {
                calls.borrow_mut().push(("mount", reference.as_element().copied(), *floating));
                *update_handle.borrow_mut() = Some(update);
                let calls = calls.clone();
                let floating = *floating;
                Box::new(move || calls.borrow_mut().push(("cleanup", None, floating)))
            }
        });
        let (_rt, open, pending, binding) = setup(BindingOptions {
            while_elements_mounted: Some(hook),
            ..BindingOptions::default()
        });

        binding.set_reference(Some(ReferenceTarget::Element(1)));
        binding.set_floating(Some(2));
        assert!(pending.borrow().is_empty(), "hook decides when to update");

        open.set(false);
        assert_eq!(calls.borrow().len(), 1, "open changes are not observed");

        let update = update_handle.borrow_mut().take().unwrap();
        update();
        assert_eq!(pending.borrow().len(), 1);

        binding.set_floating(Some(9));
        binding.dispose();
        assert_eq!(
            *calls.borrow(),
            vec![
                ("mount", Some(1), 2),
                ("cleanup", None, 2),
                ("mount", Some(1), 9),
                ("cleanup", None, 9),
            ]
        );
    }

    #[test]
    fn config_changes_are_structural() {
        let (_rt, _open, _pending, binding) = setup(BindingOptions::default());
        binding.set_middleware(vec![Middleware::offset(4.0)]);
        binding.set_placement(Placement::TopStart);
        binding.set_middleware(vec![Middleware::offset(4.0)]);
        let config = binding.config();
        assert_eq!(config.middleware, vec![Middleware::offset(4.0)]);
        assert_eq!(config.placement, Placement::TopStart);
    }

    #[test]
    fn virtual_reference_is_passed_through() {
        let (_rt, _open, pending, binding) = setup(BindingOptions::default());
        binding.set_reference(Some(
            VirtualElement::new(|| kurbo::Rect::new(5.0, 5.0, 5.0, 5.0)).into(),
        ));
        binding.set_floating(Some(2));
        let requests = take(&pending);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, None);
    }

    #[test]
    fn styles_before_mount_are_initial() {
        let (_rt, _open, _pending, binding) = setup(BindingOptions {
            strategy: Strategy::Fixed,
            ..BindingOptions::default()
        });
        assert_eq!(
            binding.floating_styles().get_untracked(),
            FloatingStyles::initial(Strategy::Fixed)
        );
    }
}
