// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composing several engines' contracts into one prop map per element.
//!
//! Handlers never overwrite each other: every `on*` key defined by more than
//! one source becomes a single chain invoking each handler in registration
//! order (engines in the order given, the caller's own props last). All other
//! keys are last-write-wins.

use alloc::borrow::{Cow, ToOwned};
use alloc::vec::Vec;
use core::fmt;

use crate::props::{
    ACTIVE_KEY, AttrValue, ElementProps, FOCUSABLE_ATTRIBUTE, ItemProps, PropValue, Props,
    SELECTED_KEY,
};

/// Which element a merge is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropTarget {
    /// The reference element.
    Reference,
    /// The floating element.
    Floating,
    /// A list item.
    Item,
}

fn is_reserved_item_key(key: &str) -> bool {
    key == ACTIVE_KEY || key == SELECTED_KEY
}

fn is_handler_key(key: &str) -> bool {
    key.starts_with("on")
}

/// Merge `contracts` and the caller's `user` props for `target`.
///
/// - The floating element starts with `tabIndex = -1` and an empty
///   [`FOCUSABLE_ATTRIBUTE`].
/// - For items, [`ACTIVE_KEY`] and [`SELECTED_KEY`] are never forwarded.
///   Dynamic item contracts receive the caller's props, reserved keys
///   included, and are skipped when there are none.
/// - A non-handler value under an `on*` key is kept only if it comes from the
///   caller and no source registers a handler under that key.
pub fn merge_props<E>(
    user: Option<&Props<E>>,
    contracts: &[ElementProps<E>],
    target: PropTarget,
) -> Props<E> {
    let is_item = target == PropTarget::Item;
    let mut merged = Props::new();

    if target == PropTarget::Floating {
        merged.set("tabIndex", PropValue::Attr(AttrValue::Int(-1)));
        merged.set(FOCUSABLE_ATTRIBUTE, PropValue::Attr(AttrValue::from("")));
    }
    if let Some(user) = user {
        for (key, value) in user.iter() {
            if is_item && is_reserved_item_key(key) {
                continue;
            }
            merged.set(key.to_owned(), value.clone());
        }
    }

    let sources: Vec<Cow<'_, Props<E>>> = contracts
        .iter()
        .filter_map(|contract| match target {
            PropTarget::Reference => contract.reference.as_ref().map(Cow::Borrowed),
            PropTarget::Floating => contract.floating.as_ref().map(Cow::Borrowed),
            PropTarget::Item => match contract.item.as_ref()? {
                ItemProps::Static(props) => Some(Cow::Borrowed(props)),
                ItemProps::Dynamic(f) => user.map(|user| Cow::Owned(f(user))),
            },
        })
        .chain(user.map(Cow::Borrowed))
        .collect();

    let mut reduced: Props<E> = Props::new();
    for props in &sources {
        for (key, value) in props.iter() {
            if is_item && is_reserved_item_key(key) {
                continue;
            }
            if is_handler_key(key) {
                let PropValue::Handler(chain) = value else {
                    continue;
                };
                match reduced.get(key) {
                    Some(PropValue::Handler(existing)) => {
                        let mut existing = existing.clone();
                        existing.extend(chain);
                        reduced.set(key.to_owned(), PropValue::Handler(existing));
                    }
                    _ => reduced.set(key.to_owned(), PropValue::Handler(chain.clone())),
                }
            } else {
                reduced.set(key.to_owned(), value.clone());
            }
        }
    }

    for (key, value) in reduced.iter() {
        merged.set(key.to_owned(), value.clone());
    }
    merged
}

/// Prop getters over a fixed list of engine contracts.
pub struct Interactions<E> {
    contracts: Vec<ElementProps<E>>,
}

impl<E> fmt::Debug for Interactions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interactions")
            .field("contracts", &self.contracts)
            .finish()
    }
}

impl<E> Interactions<E> {
    /// Getters over `contracts`, merged in the given order.
    pub fn new(contracts: Vec<ElementProps<E>>) -> Self {
        Self { contracts }
    }

    /// Final props for the reference element.
    pub fn reference_props(&self, user: Option<&Props<E>>) -> Props<E> {
        merge_props(user, &self.contracts, PropTarget::Reference)
    }

    /// Final props for the floating element.
    pub fn floating_props(&self, user: Option<&Props<E>>) -> Props<E> {
        merge_props(user, &self.contracts, PropTarget::Floating)
    }

    /// Final props for one list item.
    pub fn item_props(&self, user: Option<&Props<E>>) -> Props<E> {
        merge_props(user, &self.contracts, PropTarget::Item)
    }
}
