// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element props and interaction contracts.
//!
//! Every engine describes what it wants on the reference, floating, and item
//! elements as an [`ElementProps`]: attribute values plus event handlers keyed
//! by their prop name (`"onClick"`, `"aria-expanded"`, ...). A missing key
//! means the engine has no opinion about it.

use alloc::borrow::Cow;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::event::{Event, EventKind};

/// Item prop marking the item under keyboard or pointer focus.
pub const ACTIVE_KEY: &str = "active";

/// Item prop marking the selected item.
pub const SELECTED_KEY: &str = "selected";

/// Attribute marking floating elements, so focus management can find them.
pub const FOCUSABLE_ATTRIBUTE: &str = "data-floating-ui-focusable";

/// A non-handler prop value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    /// A string, e.g. an id or role.
    Str(Cow<'static, str>),
    /// A boolean, e.g. `aria-expanded`.
    Bool(bool),
    /// An integer, e.g. `tabIndex`.
    Int(i64),
}

impl AttrValue {
    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&'static str> for AttrValue {
    fn from(s: &'static str) -> Self {
        Self::Str(Cow::Borrowed(s))
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(Cow::Owned(s))
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// An event handler. A `Some` return is reported back to the caller of the
/// merged handler.
pub type Handler<E> = Rc<dyn Fn(&Event<E>) -> Option<AttrValue>>;

/// Handlers registered under one key, invoked in order.
pub struct HandlerChain<E> {
    handlers: SmallVec<[Handler<E>; 2]>,
}

impl<E> Clone for HandlerChain<E> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<E> Default for HandlerChain<E> {
    fn default() -> Self {
        Self {
            handlers: SmallVec::new(),
        }
    }
}

impl<E> fmt::Debug for HandlerChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("len", &self.handlers.len())
            .finish()
    }
}

/// Chains are equal when they hold the same handlers, in the same order.
impl<E> PartialEq for HandlerChain<E> {
    fn eq(&self, other: &Self) -> bool {
        self.handlers.len() == other.handlers.len()
            && self
                .handlers
                .iter()
                .zip(&other.handlers)
                .all(|(a, b)| Rc::ptr_eq(a, b))
    }
}

impl<E> HandlerChain<E> {
    /// A chain of one handler.
    pub fn single(handler: Handler<E>) -> Self {
        let mut chain = Self::default();
        chain.push(handler);
        chain
    }

    /// Append a handler.
    pub fn push(&mut self, handler: Handler<E>) {
        self.handlers.push(handler);
    }

    /// Append every handler of `other`.
    pub fn extend(&mut self, other: &Self) {
        self.handlers.extend(other.handlers.iter().cloned());
    }

    /// Number of handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if the chain has no handlers.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke every handler, in order, and return the first `Some` result.
    pub fn call(&self, event: &Event<E>) -> Option<AttrValue> {
        let mut first = None;
        for handler in &self.handlers {
            let result = handler(event);
            if first.is_none() {
                first = result;
            }
        }
        first
    }
}

/// One prop value.
pub enum PropValue<E> {
    /// An attribute.
    Attr(AttrValue),
    /// Event handlers.
    Handler(HandlerChain<E>),
}

impl<E> Clone for PropValue<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Attr(a) => Self::Attr(a.clone()),
            Self::Handler(h) => Self::Handler(h.clone()),
        }
    }
}

impl<E> PartialEq for PropValue<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Attr(a), Self::Attr(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => a == b,
            _ => false,
        }
    }
}

impl<E> fmt::Debug for PropValue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attr(a) => f.debug_tuple("Attr").field(a).finish(),
            Self::Handler(h) => f.debug_tuple("Handler").field(h).finish(),
        }
    }
}

/// A prop map for one element.
pub struct Props<E> {
    entries: HashMap<Cow<'static, str>, PropValue<E>>,
}

impl<E> Clone for Props<E> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<E> Default for Props<E> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<E> PartialEq for Props<E> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<E> fmt::Debug for Props<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        f.debug_map().entries(entries).finish()
    }
}

impl<E> Props<E> {
    /// Empty props.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler for `kind` in the bubble phase.
    pub fn on(self, kind: EventKind, handler: impl Fn(&Event<E>) + 'static) -> Self
    where
        E: 'static,
    {
        self.on_handler(
            kind.handler_name(false),
            Rc::new(move |event: &Event<E>| {
                handler(event);
                None
            }),
        )
    }

    /// Add a handler under an arbitrary `on*` key.
    ///
    /// A handler already present under `key` stays first in the chain.
    pub fn on_handler(mut self, key: impl Into<Cow<'static, str>>, handler: Handler<E>) -> Self {
        self.push_handler(key, handler);
        self
    }

    /// Add an attribute.
    pub fn with_attr(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<AttrValue>) -> Self {
        self.set(key, PropValue::Attr(value.into()));
        self
    }

    /// Append a handler to the chain under `key`, replacing a non-handler value.
    pub fn push_handler(&mut self, key: impl Into<Cow<'static, str>>, handler: Handler<E>) {
        let key = key.into();
        if let Some(PropValue::Handler(chain)) = self.entries.get_mut(&key) {
            chain.push(handler);
            return;
        }
        self.entries
            .insert(key, PropValue::Handler(HandlerChain::single(handler)));
    }

    /// Set a value, replacing whatever was there.
    pub fn set(&mut self, key: impl Into<Cow<'static, str>>, value: PropValue<E>) {
        self.entries.insert(key.into(), value);
    }

    /// Remove a key.
    pub fn remove(&mut self, key: &str) -> Option<PropValue<E>> {
        self.entries.remove(key)
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&PropValue<E>> {
        self.entries.get(key)
    }

    /// Look up an attribute.
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        match self.entries.get(key) {
            Some(PropValue::Attr(a)) => Some(a),
            _ => None,
        }
    }

    /// Look up a boolean attribute.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.attr(key).and_then(AttrValue::as_bool)
    }

    /// Look up a handler chain.
    pub fn handler(&self, key: &str) -> Option<&HandlerChain<E>> {
        match self.entries.get(key) {
            Some(PropValue::Handler(h)) => Some(h),
            _ => None,
        }
    }

    /// Invoke the bubble-phase handler for `event.kind`, if any.
    pub fn call(&self, event: &Event<E>) -> Option<AttrValue> {
        self.call_key(event.kind.handler_name(false), event)
    }

    /// Invoke the handler under `key`, if any.
    pub fn call_key(&self, key: &str, event: &Event<E>) -> Option<AttrValue> {
        self.handler(key).and_then(|h| h.call(event))
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Every key, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(|k| k.as_ref()).collect();
        keys.sort_unstable();
        keys
    }

    /// Every entry, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue<E>)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Item props, fixed or computed from the caller's item props.
pub enum ItemProps<E> {
    /// The same props for every item.
    Static(Props<E>),
    /// Props derived from the props the caller passes for one item,
    /// including [`ACTIVE_KEY`] and [`SELECTED_KEY`].
    Dynamic(Rc<dyn Fn(&Props<E>) -> Props<E>>),
}

impl<E> Clone for ItemProps<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(p) => Self::Static(p.clone()),
            Self::Dynamic(f) => Self::Dynamic(Rc::clone(f)),
        }
    }
}

impl<E> fmt::Debug for ItemProps<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(p) => f.debug_tuple("Static").field(p).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// What one engine contributes to each element.
pub struct ElementProps<E> {
    /// Props for the reference element.
    pub reference: Option<Props<E>>,
    /// Props for the floating element.
    pub floating: Option<Props<E>>,
    /// Props for list items inside the floating element.
    pub item: Option<ItemProps<E>>,
}

impl<E> Default for ElementProps<E> {
    fn default() -> Self {
        Self {
            reference: None,
            floating: None,
            item: None,
        }
    }
}

impl<E> Clone for ElementProps<E> {
    fn clone(&self) -> Self {
        Self {
            reference: self.reference.clone(),
            floating: self.floating.clone(),
            item: self.item.clone(),
        }
    }
}

impl<E> fmt::Debug for ElementProps<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementProps")
            .field("reference", &self.reference)
            .field("floating", &self.floating)
            .field("item", &self.item)
            .finish()
    }
}

impl<E> ElementProps<E> {
    /// A contract with no opinions, as contributed by a disabled engine.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` if the contract has no opinions.
    pub fn is_empty(&self) -> bool {
        self.reference.is_none() && self.floating.is_none() && self.item.is_none()
    }
}

/// Element slots indexed by item position, filled by the rendering layer.
pub type ListRef<T> = Rc<RefCell<Vec<Option<T>>>>;

/// A handler holding `state` weakly. It does nothing once `state` is gone.
pub(crate) fn bind<S: 'static, E: 'static>(
    state: &Rc<S>,
    f: impl Fn(&S, &Event<E>) + 'static,
) -> Handler<E> {
    let weak: Weak<S> = Rc::downgrade(state);
    Rc::new(move |event: &Event<E>| {
        if let Some(state) = weak.upgrade() {
            f(&state, event);
        }
        None
    })
}
