// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement vocabulary, reference targets, and positioning results.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use kurbo::{Rect, Size, Vec2};

/// The side of the reference element the floating element is placed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Above the reference.
    Top,
    /// Right of the reference.
    Right,
    /// Below the reference.
    Bottom,
    /// Left of the reference.
    Left,
}

impl Side {
    /// Lowercase name, as used in placement strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }
}

/// Alignment along the side's cross axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Aligned to the start edge.
    Start,
    /// Aligned to the end edge.
    End,
}

/// Where the floating element sits relative to its reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Placement {
    /// `top`
    Top,
    /// `top-start`
    TopStart,
    /// `top-end`
    TopEnd,
    /// `right`
    Right,
    /// `right-start`
    RightStart,
    /// `right-end`
    RightEnd,
    /// `bottom`
    #[default]
    Bottom,
    /// `bottom-start`
    BottomStart,
    /// `bottom-end`
    BottomEnd,
    /// `left`
    Left,
    /// `left-start`
    LeftStart,
    /// `left-end`
    LeftEnd,
}

impl Placement {
    /// The placement string, e.g. `"bottom-start"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::TopStart => "top-start",
            Self::TopEnd => "top-end",
            Self::Right => "right",
            Self::RightStart => "right-start",
            Self::RightEnd => "right-end",
            Self::Bottom => "bottom",
            Self::BottomStart => "bottom-start",
            Self::BottomEnd => "bottom-end",
            Self::Left => "left",
            Self::LeftStart => "left-start",
            Self::LeftEnd => "left-end",
        }
    }

    /// The side component.
    pub fn side(self) -> Side {
        match self {
            Self::Top | Self::TopStart | Self::TopEnd => Side::Top,
            Self::Right | Self::RightStart | Self::RightEnd => Side::Right,
            Self::Bottom | Self::BottomStart | Self::BottomEnd => Side::Bottom,
            Self::Left | Self::LeftStart | Self::LeftEnd => Side::Left,
        }
    }

    /// The alignment component, if any.
    pub fn alignment(self) -> Option<Alignment> {
        match self {
            Self::TopStart | Self::RightStart | Self::BottomStart | Self::LeftStart => {
                Some(Alignment::Start)
            }
            Self::TopEnd | Self::RightEnd | Self::BottomEnd | Self::LeftEnd => {
                Some(Alignment::End)
            }
            _ => None,
        }
    }
}

/// CSS positioning strategy of the floating element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// `position: absolute`
    #[default]
    Absolute,
    /// `position: fixed`
    Fixed,
}

impl Strategy {
    /// The CSS keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Fixed => "fixed",
        }
    }
}

/// One value reported by, or configured on, a middleware.
#[derive(Clone, Debug, PartialEq)]
pub enum MiddlewareDatum {
    /// A 2D offset, e.g. arrow or shift coordinates.
    Coords(Vec2),
    /// A plain number.
    Scalar(f64),
    /// A boolean, e.g. `referenceHidden`.
    Flag(bool),
    /// Free-form text, e.g. a placement name.
    Text(String),
    /// Measured dimensions, e.g. of an arrow element.
    Size(Size),
}

impl MiddlewareDatum {
    /// The number, if this is a [`Scalar`](Self::Scalar).
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            _ => None,
        }
    }
}

/// Per-middleware data returned by the positioning engine, keyed by middleware name.
pub type MiddlewareData = HashMap<String, Vec<(String, MiddlewareDatum)>>;

/// An opaque middleware descriptor handed to the positioning engine.
///
/// Descriptors compare structurally, so replacing a list with an equal one is
/// a no-op for the binding.
#[derive(Clone, Debug, PartialEq)]
pub struct Middleware {
    /// Name the engine dispatches on, e.g. `"offset"`.
    pub name: Cow<'static, str>,
    /// Options, in declaration order.
    pub options: Vec<(Cow<'static, str>, MiddlewareDatum)>,
}

impl Middleware {
    /// A middleware with no options.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            options: Vec::new(),
        }
    }

    /// Add an option.
    pub fn with_option(mut self, key: impl Into<Cow<'static, str>>, value: MiddlewareDatum) -> Self {
        self.options.push((key.into(), value));
        self
    }

    /// Look up an option by key.
    pub fn option(&self, key: &str) -> Option<&MiddlewareDatum> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// `offset` along the main axis.
    pub fn offset(distance: f64) -> Self {
        Self::new("offset").with_option("mainAxis", MiddlewareDatum::Scalar(distance))
    }

    /// `flip` to the opposite side on overflow.
    pub fn flip() -> Self {
        Self::new("flip")
    }

    /// `shift` along the cross axis on overflow.
    pub fn shift(padding: f64) -> Self {
        Self::new("shift").with_option("padding", MiddlewareDatum::Scalar(padding))
    }

    /// `arrow` centering with edge padding.
    pub fn arrow(padding: f64) -> Self {
        Self::new("arrow").with_option("padding", MiddlewareDatum::Scalar(padding))
    }

    /// `arrow` for an arrow element of the given measured `size`.
    ///
    /// The engine reports the arrow's offsets, read back through
    /// [`PositionData::arrow`].
    pub fn arrow_element(size: Size, padding: f64) -> Self {
        Self::arrow(padding).with_option("element", MiddlewareDatum::Size(size))
    }
}

/// Arrow offsets reported by the `arrow` middleware.
///
/// Only the cross axis of the placement carries a coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ArrowData {
    /// Left offset within the floating element, for top and bottom placements.
    pub x: Option<f64>,
    /// Top offset within the floating element, for left and right placements.
    pub y: Option<f64>,
    /// How far the arrow is from the reference's center, after clamping.
    pub center_offset: f64,
}

/// What the positioning engine resolves with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionResult {
    /// Left coordinate in the strategy's containing block.
    pub x: f64,
    /// Top coordinate in the strategy's containing block.
    pub y: f64,
    /// Final placement, which middleware may have changed.
    pub placement: Placement,
    /// Strategy used for the computation.
    pub strategy: Strategy,
    /// Data reported by each middleware.
    pub middleware_data: MiddlewareData,
}

/// The binding's published position state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionData {
    /// Left coordinate.
    pub x: f64,
    /// Top coordinate.
    pub y: f64,
    /// Final placement.
    pub placement: Placement,
    /// Strategy in use.
    pub strategy: Strategy,
    /// Data reported by each middleware.
    pub middleware_data: MiddlewareData,
    /// `true` once a computation resolved while the element was open.
    ///
    /// Forced back to `false` whenever the element closes.
    pub is_positioned: bool,
}

impl PositionData {
    /// Initial data before any computation.
    pub fn initial(placement: Placement, strategy: Strategy) -> Self {
        Self {
            placement,
            strategy,
            ..Self::default()
        }
    }

    /// Offsets reported by the `arrow` middleware, if it ran.
    pub fn arrow(&self) -> Option<ArrowData> {
        let data = self.middleware_data.get("arrow")?;
        let scalar = |key: &str| {
            data.iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| v.as_scalar())
        };
        Some(ArrowData {
            x: scalar("x"),
            y: scalar("y"),
            center_offset: scalar("centerOffset").unwrap_or(0.0),
        })
    }

    /// Data published for a resolved computation.
    pub fn from_result(result: PositionResult, is_positioned: bool) -> Self {
        Self {
            x: result.x,
            y: result.y,
            placement: result.placement,
            strategy: result.strategy,
            middleware_data: result.middleware_data,
            is_positioned,
        }
    }
}

/// A reference that is not an element: a rectangle provider, for example the
/// cursor position or a text selection.
pub struct VirtualElement<E> {
    rect: Rc<dyn Fn() -> Rect>,
    context_element: Option<E>,
}

impl<E> VirtualElement<E> {
    /// A virtual element whose bounds come from `rect`.
    pub fn new(rect: impl Fn() -> Rect + 'static) -> Self {
        Self {
            rect: Rc::new(rect),
            context_element: None,
        }
    }

    /// Attach a real element whose scroll ancestors matter for dismissal.
    pub fn with_context_element(mut self, element: E) -> Self {
        self.context_element = Some(element);
        self
    }

    /// Current bounding rectangle in client coordinates.
    pub fn bounding_client_rect(&self) -> Rect {
        (self.rect)()
    }

    /// The attached context element.
    pub fn context_element(&self) -> Option<&E> {
        self.context_element.as_ref()
    }
}

impl<E: Clone> Clone for VirtualElement<E> {
    fn clone(&self) -> Self {
        Self {
            rect: Rc::clone(&self.rect),
            context_element: self.context_element.clone(),
        }
    }
}

impl<E: PartialEq> PartialEq for VirtualElement<E> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.rect, &other.rect) && self.context_element == other.context_element
    }
}

impl<E: fmt::Debug> fmt::Debug for VirtualElement<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualElement")
            .field("rect", &self.bounding_client_rect())
            .field("context_element", &self.context_element)
            .finish()
    }
}

/// What a floating element is anchored to.
#[derive(Clone, Debug, PartialEq)]
pub enum ReferenceTarget<E> {
    /// A real element.
    Element(E),
    /// A virtual rectangle provider.
    Virtual(VirtualElement<E>),
}

impl<E> ReferenceTarget<E> {
    /// The element, when this is a real element.
    pub fn as_element(&self) -> Option<&E> {
        match self {
            Self::Element(e) => Some(e),
            Self::Virtual(_) => None,
        }
    }

    /// The element whose DOM surroundings apply: the element itself, or a
    /// virtual reference's context element.
    pub fn context_element(&self) -> Option<&E> {
        match self {
            Self::Element(e) => Some(e),
            Self::Virtual(v) => v.context_element(),
        }
    }

    /// Returns `true` for virtual references.
    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual(_))
    }
}

impl<E> From<VirtualElement<E>> for ReferenceTarget<E> {
    fn from(v: VirtualElement<E>) -> Self {
        Self::Virtual(v)
    }
}
