// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine failures are logged and leave the last position in place.

use std::cell::RefCell;
use std::rc::Rc;

use tether_position::{
    BindingOptions, PositionBinding, PositionConfig, PositionEngine, PositionError,
    PositionResult, ReferenceTarget, Resolve,
};
use tether_reactive::Runtime;
use tracing_test::traced_test;

/// Resolves the first request and rejects every later one.
struct FlakyEngine {
    calls: RefCell<u32>,
}

impl PositionEngine for FlakyEngine {
    type Element = &'static str;

    fn compute_position(
        &self,
        _reference: &ReferenceTarget<&'static str>,
        _floating: &&'static str,
        _config: &PositionConfig,
        resolve: Resolve,
    ) {
        let mut calls = self.calls.borrow_mut();
        *calls += 1;
        if *calls == 1 {
            resolve(Ok(PositionResult {
                x: 12.0,
                y: 34.0,
                ..PositionResult::default()
            }));
        } else {
            resolve(Err(PositionError::Unmeasurable));
        }
    }
}

#[test]
#[traced_test]
fn rejection_is_logged_and_position_kept() {
    let rt = Runtime::new();
    let open = rt.signal(true);
    let engine = Rc::new(FlakyEngine {
        calls: RefCell::new(0),
    });
    let binding = PositionBinding::new(
        &rt,
        engine,
        Some(open.read_only()),
        BindingOptions::default(),
    );

    binding.set_reference(Some(ReferenceTarget::Element("button")));
    binding.set_floating(Some("tooltip"));
    assert_eq!(binding.data().get_untracked().x, 12.0);

    binding.update();

    let data = binding.data().get_untracked();
    assert_eq!((data.x, data.y), (12.0, 34.0));
    assert!(data.is_positioned);
    assert_eq!(
        binding.error().get_untracked(),
        Some(PositionError::Unmeasurable)
    );
    assert!(logs_contain("positioning engine rejected the request"));
    assert!(logs_contain("element could not be measured"));
}

#[test]
#[traced_test]
fn stale_resolution_is_logged_at_debug() {
    let rt = Runtime::new();
    let parked: Rc<RefCell<Vec<Resolve>>> = Rc::default();

    struct Parking(Rc<RefCell<Vec<Resolve>>>);
    impl PositionEngine for Parking {
        type Element = u8;
        fn compute_position(
            &self,
            _reference: &ReferenceTarget<u8>,
            _floating: &u8,
            _config: &PositionConfig,
            resolve: Resolve,
        ) {
            self.0.borrow_mut().push(resolve);
        }
    }

    let binding = PositionBinding::new(
        &rt,
        Rc::new(Parking(parked.clone())),
        None,
        BindingOptions::default(),
    );
    binding.set_reference(Some(ReferenceTarget::Element(1)));
    binding.set_floating(Some(2));
    binding.update();

    let mut resolvers = std::mem::take(&mut *parked.borrow_mut());
    assert_eq!(resolvers.len(), 2);
    let first = resolvers.remove(0);
    first(Ok(PositionResult::default()));

    assert!(logs_contain("discarding stale position resolution"));
    assert!(!binding.data().get_untracked().is_positioned);
}
