// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The positioning-engine seam.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

use crate::types::{Middleware, Placement, PositionResult, ReferenceTarget, Strategy};

/// Request parameters for one computation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionConfig {
    /// Requested placement.
    pub placement: Placement,
    /// Requested strategy.
    pub strategy: Strategy,
    /// Middleware, run by the engine in order.
    pub middleware: Vec<Middleware>,
}

/// Why a computation failed.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PositionError {
    /// The engine refused or failed the request.
    #[error("positioning engine rejected the request: {0}")]
    Rejected(String),
    /// An element had no measurable box.
    #[error("element could not be measured")]
    Unmeasurable,
}

/// Completion callback for [`PositionEngine::compute_position`].
///
/// Called at most once. There is no cancellation: callers must check whether
/// the result is still wanted when it arrives.
pub type Resolve = Box<dyn FnOnce(Result<PositionResult, PositionError>)>;

/// A geometry engine that computes floating-element coordinates.
///
/// The engine may call `resolve` synchronously or at any later point.
pub trait PositionEngine {
    /// Host element handle.
    type Element: Clone + PartialEq + 'static;

    /// Start a computation for `floating` relative to `reference`.
    fn compute_position(
        &self,
        reference: &ReferenceTarget<Self::Element>,
        floating: &Self::Element,
        config: &PositionConfig,
        resolve: Resolve,
    );

    /// Device pixel ratio of the window containing `floating`.
    fn device_pixel_ratio(&self, _floating: &Self::Element) -> f64 {
        1.0
    }
}
