// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positioning styles for the floating element.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;

use crate::types::Strategy;

/// Device pixel ratio from which `will-change: transform` is emitted.
pub const WILL_CHANGE_DPR: f64 = 1.5;

/// Round `value` to the device-pixel grid.
pub fn round_by_dpr(dpr: f64, value: f64) -> f64 {
    (value * dpr).round() / dpr
}

/// Ready-to-apply styles for the floating element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FloatingStyles {
    /// `position`
    pub position: Strategy,
    /// `left`, in CSS pixels.
    pub left: f64,
    /// `top`, in CSS pixels.
    pub top: f64,
    /// `transform`, when transform positioning is used.
    pub transform: Option<String>,
    /// `will-change`, on high-density displays with transform positioning.
    pub will_change: Option<&'static str>,
}

impl FloatingStyles {
    /// Styles before the floating element is mounted.
    pub fn initial(strategy: Strategy) -> Self {
        Self {
            position: strategy,
            ..Self::default()
        }
    }

    /// Styles placing the floating element at `position`.
    ///
    /// Coordinates are rounded to the `dpr` grid. With `transform`, the
    /// element stays at `0, 0` and is moved by `translate`.
    pub fn compute(strategy: Strategy, transform: bool, dpr: f64, position: Point) -> Self {
        let x = round_by_dpr(dpr, position.x);
        let y = round_by_dpr(dpr, position.y);
        if transform {
            Self {
                position: strategy,
                left: 0.0,
                top: 0.0,
                transform: Some(format!("translate({x}px, {y}px)")),
                will_change: (dpr >= WILL_CHANGE_DPR).then_some("transform"),
            }
        } else {
            Self {
                position: strategy,
                left: x,
                top: y,
                transform: None,
                will_change: None,
            }
        }
    }

    /// CSS declarations, in a stable order.
    pub fn to_css(&self) -> Vec<(&'static str, String)> {
        let mut css = Vec::with_capacity(5);
        css.push(("position", String::from(self.position.as_str())));
        css.push(("left", format!("{}px", self.left)));
        css.push(("top", format!("{}px", self.top)));
        if let Some(transform) = &self.transform {
            css.push(("transform", transform.clone()));
        }
        if let Some(will_change) = self.will_change {
            css.push(("will-change", String::from(will_change)));
        }
        css
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_device_pixels() {
        assert_eq!(round_by_dpr(1.0, 10.4), 10.0);
        assert_eq!(round_by_dpr(2.0, 10.3), 10.5);
    }

    #[test]
    fn transform_styles() {
        let styles = FloatingStyles::compute(Strategy::Absolute, true, 2.0, Point::new(10.3, 4.0));
        assert_eq!(styles.left, 0.0);
        assert_eq!(styles.transform.as_deref(), Some("translate(10.5px, 4px)"));
        assert_eq!(styles.will_change, Some("transform"));

        let low_dpr = FloatingStyles::compute(Strategy::Absolute, true, 1.0, Point::new(1.0, 2.0));
        assert_eq!(low_dpr.will_change, None);
    }

    #[test]
    fn top_left_styles() {
        let styles = FloatingStyles::compute(Strategy::Fixed, false, 1.0, Point::new(12.6, 3.0));
        assert_eq!(styles.position, Strategy::Fixed);
        assert_eq!((styles.left, styles.top), (13.0, 3.0));
        assert_eq!(styles.transform, None);
        assert_eq!(
            styles.to_css(),
            [
                ("position", String::from("fixed")),
                ("left", String::from("13px")),
                ("top", String::from("3px")),
            ]
        );
    }
}
