// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fanning one element-ref write out to several sinks.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use tether_reactive::Signal;

/// A destination for an element reference.
pub enum RefSink<T> {
    /// Write into a signal.
    Signal(Signal<Option<T>>),
    /// Call a function.
    Callback(Rc<dyn Fn(Option<T>)>),
}

impl<T: fmt::Debug> fmt::Debug for RefSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(s) => f.debug_tuple("Signal").field(s).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl<T: Clone + PartialEq + 'static> RefSink<T> {
    fn write(&self, value: Option<T>) {
        match self {
            Self::Signal(s) => s.set(value),
            Self::Callback(f) => f(value),
        }
    }
}

impl<T> From<Signal<Option<T>>> for RefSink<T> {
    fn from(signal: Signal<Option<T>>) -> Self {
        Self::Signal(signal)
    }
}

/// A setter writing every sink, or `None` when every sink is absent.
///
/// Sinks are written in order.
pub fn merge_refs<T: Clone + PartialEq + 'static>(
    sinks: Vec<Option<RefSink<T>>>,
) -> Option<Rc<dyn Fn(Option<T>)>> {
    let sinks: Vec<RefSink<T>> = sinks.into_iter().flatten().collect();
    if sinks.is_empty() {
        return None;
    }
    Some(Rc::new(move |value: Option<T>| {
        for sink in &sinks {
            sink.write(value.clone());
        }
    }))
}
