// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transition status and styles for animating the floating element.
//!
//! [`Transition`] derives a mount lifecycle from the open state:
//!
//! ```text
//! unmounted -> initial -> open        (opening; `open` one frame later)
//! open      -> close   -> unmounted   (closing; after the close duration)
//! ```
//!
//! The floating element stays mounted while closing, so a close transition
//! can run before it is removed. [`TransitionStyles`] turns the status into
//! inline styles, including `transitionProperty` and `transitionDuration`.

use alloc::borrow::Cow;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use tether_position::{Placement, Side};
use tether_reactive::{Effect, Memo, ReadSignal, Signal};

use crate::context::FloatingContext;
use crate::platform::Platform;
use crate::timer::TimeoutSlot;

/// Where the floating element is in its mount lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransitionStatus {
    /// Not rendered.
    #[default]
    Unmounted,
    /// Rendered with the initial styles, for one frame.
    Initial,
    /// Open.
    Open,
    /// Closing; still rendered.
    Close,
}

impl TransitionStatus {
    /// Lowercase name, e.g. `"initial"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unmounted => "unmounted",
            Self::Initial => "initial",
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

/// Transition durations, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionDuration {
    /// Opening duration.
    pub open: u64,
    /// Closing duration; the element unmounts after it.
    pub close: u64,
}

impl TransitionDuration {
    /// The same duration both ways.
    pub fn uniform(ms: u64) -> Self {
        Self { open: ms, close: ms }
    }
}

impl Default for TransitionDuration {
    fn default() -> Self {
        Self::uniform(250)
    }
}

/// Tracks the mount lifecycle of the floating element.
pub struct Transition<P: Platform> {
    status: Signal<TransitionStatus>,
    mounted: Signal<bool>,
    duration: TransitionDuration,
    _effect: Effect,
    _platform: PhantomData<P>,
}

impl<P: Platform> fmt::Debug for Transition<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("status", &self.status.get_untracked())
            .field("mounted", &self.mounted.get_untracked())
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

impl<P: Platform> Transition<P> {
    /// Attach to `ctx`.
    pub fn new(ctx: &FloatingContext<P>, duration: TransitionDuration) -> Self {
        let runtime = ctx.runtime();
        let initially_open = ctx.is_open_untracked();
        let status = runtime.signal(TransitionStatus::Unmounted);
        let mounted = runtime.signal(initially_open);
        let frame = TimeoutSlot::new(Rc::clone(ctx.timers()));
        let unmount = TimeoutSlot::new(Rc::clone(ctx.timers()));

        let effect = {
            let ctx = ctx.clone();
            let (status, mounted) = (status.clone(), mounted.clone());
            runtime.effect(move || {
                let open = ctx.is_open();
                let has_floating = ctx.floating().with(Option::is_some);
                ctx.runtime().untrack(|| {
                    if open {
                        unmount.clear();
                        mounted.set(true);
                        if has_floating {
                            status.set(TransitionStatus::Initial);
                            let status = status.clone();
                            frame.set(0, move || status.set(TransitionStatus::Open));
                        }
                        return;
                    }
                    frame.clear();
                    if !mounted.get_untracked() {
                        return;
                    }
                    if has_floating {
                        status.set(TransitionStatus::Close);
                    }
                    if !unmount.is_pending() {
                        let (status, mounted) = (status.clone(), mounted.clone());
                        unmount.set(duration.close, move || {
                            mounted.set(false);
                            status.set(TransitionStatus::Unmounted);
                        });
                    }
                });
                None
            })
        };

        Self {
            status,
            mounted,
            duration,
            _effect: effect,
            _platform: PhantomData,
        }
    }

    /// The current status.
    pub fn status(&self) -> ReadSignal<TransitionStatus> {
        self.status.read_only()
    }

    /// Whether the floating element should be rendered.
    pub fn is_mounted(&self) -> ReadSignal<bool> {
        self.mounted.read_only()
    }

    /// The durations.
    pub fn duration(&self) -> TransitionDuration {
        self.duration
    }
}

/// `backgroundColor` to `background-color`.
///
/// A run of capitals is one word unless its last capital starts a lowercase
/// word: `MSTransform` becomes `ms-transform`.
pub fn camel_to_kebab(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_uppercase() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let mut end = i;
        while end < chars.len() && chars[end].is_ascii_uppercase() {
            end += 1;
        }
        if end < chars.len() && chars[end].is_ascii_lowercase() && end - i > 1 {
            end -= 1;
        } else if end < chars.len() && chars[end].is_ascii_lowercase() {
            end = i + 1;
        }
        if i > 0 {
            out.push('-');
        }
        out.extend(chars[i..end].iter().map(char::to_ascii_lowercase));
        i = end;
    }
    out
}

/// Inline styles in insertion order, keyed by camelCase property name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleMap {
    entries: Vec<(Cow<'static, str>, Cow<'static, str>)>,
}

impl StyleMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a property.
    pub fn with(
        mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.set(key, value);
        self
    }

    /// Add or replace a property. A replaced property keeps its position.
    pub fn set(&mut self, key: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) {
        let (key, value) = (key.into(), value.into());
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Set every property of `other`.
    pub fn extend(&mut self, other: &Self) {
        for (key, value) in &other.entries {
            self.set(key.clone(), value.clone());
        }
    }

    /// Look up a property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_ref())
    }

    /// Property names, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_ref())
    }

    /// Every property, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_ref()))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn blanked(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(k, _)| (k.clone(), Cow::Borrowed("")))
                .collect(),
        }
    }

    fn transition_property(&self) -> String {
        self.keys().map(camel_to_kebab).collect::<Vec<_>>().join(",")
    }
}

/// Styles, fixed or depending on where the element was placed.
#[derive(Clone)]
pub enum StyleSource {
    /// The same styles for every placement.
    Static(StyleMap),
    /// Styles computed from the final side and placement.
    Derived(Rc<dyn Fn(Side, Placement) -> StyleMap>),
}

impl fmt::Debug for StyleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(map) => f.debug_tuple("Static").field(map).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl StyleSource {
    /// The styles for `placement`.
    pub fn resolve(&self, placement: Placement) -> StyleMap {
        match self {
            Self::Static(map) => map.clone(),
            Self::Derived(f) => f(placement.side(), placement),
        }
    }
}

impl From<StyleMap> for StyleSource {
    fn from(map: StyleMap) -> Self {
        Self::Static(map)
    }
}

/// Options for [`TransitionStyles`].
#[derive(Clone, Debug)]
pub struct TransitionStylesOptions {
    /// Default: 250 ms both ways.
    pub duration: TransitionDuration,
    /// Styles while mounting. Default: `opacity: 0`.
    pub initial: StyleSource,
    /// Styles while open. Default: the initial properties, unset.
    pub open: Option<StyleSource>,
    /// Styles while closing. Default: the initial styles.
    pub close: Option<StyleSource>,
    /// Styles in every status. Default: none.
    pub common: Option<StyleSource>,
}

impl Default for TransitionStylesOptions {
    fn default() -> Self {
        Self {
            duration: TransitionDuration::default(),
            initial: StyleSource::Static(StyleMap::new().with("opacity", "0")),
            open: None,
            close: None,
            common: None,
        }
    }
}

/// Inline styles that animate the floating element between statuses.
pub struct TransitionStyles<P: Platform> {
    transition: Transition<P>,
    styles: Memo<StyleMap>,
}

impl<P: Platform> fmt::Debug for TransitionStyles<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionStyles")
            .field("transition", &self.transition)
            .field("styles", &self.styles.get_untracked())
            .finish()
    }
}

impl<P: Platform> TransitionStyles<P> {
    /// Attach to `ctx`.
    pub fn new(ctx: &FloatingContext<P>, options: TransitionStylesOptions) -> Self {
        let transition = Transition::new(ctx, options.duration);
        let status = transition.status();
        let data = ctx.data();
        let styles = ctx.runtime().memo(move || {
            let placement = data.with(|d| d.placement);
            styles_for(&options, status.get(), placement)
        });
        Self { transition, styles }
    }

    /// The current styles.
    pub fn styles(&self) -> ReadSignal<StyleMap> {
        self.styles.read_only()
    }

    /// The underlying status.
    pub fn status(&self) -> ReadSignal<TransitionStatus> {
        self.transition.status()
    }

    /// Whether the floating element should be rendered.
    pub fn is_mounted(&self) -> ReadSignal<bool> {
        self.transition.is_mounted()
    }
}

fn styles_for(
    options: &TransitionStylesOptions,
    status: TransitionStatus,
    placement: Placement,
) -> StyleMap {
    let initial = options.initial.resolve(placement);
    let common = options
        .common
        .as_ref()
        .map(|c| c.resolve(placement))
        .unwrap_or_default();

    let (target, duration) = match status {
        TransitionStatus::Unmounted | TransitionStatus::Initial => {
            let mut styles = common;
            styles.extend(&initial);
            return styles;
        }
        TransitionStatus::Open => (
            options
                .open
                .as_ref()
                .map_or_else(|| initial.blanked(), |o| o.resolve(placement)),
            options.duration.open,
        ),
        TransitionStatus::Close => (
            options
                .close
                .as_ref()
                .map_or(initial, |c| c.resolve(placement)),
            options.duration.close,
        ),
    };

    let mut styles = StyleMap::new()
        .with("transitionProperty", target.transition_property())
        .with("transitionDuration", format!("{duration}ms"));
    styles.extend(&common);
    styles.extend(&target);
    styles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    #[test]
    fn kebab_case() {
        assert_eq!(camel_to_kebab("opacity"), "opacity");
        assert_eq!(camel_to_kebab("backgroundColor"), "background-color");
        assert_eq!(camel_to_kebab("WebkitTransform"), "webkit-transform");
        assert_eq!(camel_to_kebab("MSTransform"), "ms-transform");
        assert_eq!(camel_to_kebab("fooURL"), "foo-url");
    }

    #[test]
    fn lifecycle() {
        let h = Harness::new();
        let transition = Transition::new(&h.ctx, TransitionDuration::uniform(200));
        let status = transition.status();
        assert_eq!(status.get_untracked(), TransitionStatus::Unmounted);
        assert!(!transition.is_mounted().get_untracked());

        h.ctx.set_open(true, None);
        assert!(transition.is_mounted().get_untracked());
        assert_eq!(status.get_untracked(), TransitionStatus::Initial);
        h.timers.run_due();
        assert_eq!(status.get_untracked(), TransitionStatus::Open);

        h.ctx.set_open(false, None);
        assert_eq!(status.get_untracked(), TransitionStatus::Close);
        h.timers.advance(199);
        assert!(transition.is_mounted().get_untracked());
        h.timers.advance(1);
        assert!(!transition.is_mounted().get_untracked());
        assert_eq!(status.get_untracked(), TransitionStatus::Unmounted);
    }

    #[test]
    fn reopening_while_closing_stays_mounted() {
        let h = Harness::new();
        let transition = Transition::new(&h.ctx, TransitionDuration::default());
        h.ctx.set_open(true, None);
        h.timers.run_due();
        h.ctx.set_open(false, None);
        h.timers.advance(100);
        h.ctx.set_open(true, None);
        h.timers.advance(500);
        assert!(transition.is_mounted().get_untracked());
        assert_eq!(transition.status().get_untracked(), TransitionStatus::Open);
    }

    #[test]
    fn styles_per_status() {
        let h = Harness::new();
        let styles = TransitionStyles::new(
            &h.ctx,
            TransitionStylesOptions {
                initial: StyleMap::new()
                    .with("opacity", "0")
                    .with("transform", "scale(0.9)")
                    .into(),
                common: Some(StyleMap::new().with("transformOrigin", "top").into()),
                ..TransitionStylesOptions::default()
            },
        );
        let current = styles.styles();
        assert_eq!(current.get_untracked().get("opacity"), Some("0"));
        assert_eq!(current.get_untracked().get("transformOrigin"), Some("top"));

        h.ctx.set_open(true, None);
        h.timers.run_due();
        let open = current.get_untracked();
        assert_eq!(open.get("transitionProperty"), Some("opacity,transform"));
        assert_eq!(open.get("transitionDuration"), Some("250ms"));
        assert_eq!(open.get("opacity"), Some(""));

        h.ctx.set_open(false, None);
        let close = current.get_untracked();
        assert_eq!(close.get("opacity"), Some("0"));
        assert_eq!(close.get("transform"), Some("scale(0.9)"));
    }

    #[test]
    fn derived_styles_see_the_side() {
        let h = Harness::new();
        let styles = TransitionStyles::new(
            &h.ctx,
            TransitionStylesOptions {
                initial: StyleSource::Derived(Rc::new(|side, _| {
                    let shift = match side {
                        Side::Bottom => "translateY(-4px)",
                        _ => "none",
                    };
                    StyleMap::new().with("transform", shift)
                })),
                ..TransitionStylesOptions::default()
            },
        );
        assert_eq!(
            styles.styles().get_untracked().get("transform"),
            Some("translateY(-4px)")
        );
    }
}
