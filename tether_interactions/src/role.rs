// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Role: screen reader attributes for a floating element's role.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;

use crate::context::FloatingContext;
use crate::id::IdGenerator;
use crate::platform::Platform;
use crate::props::{ACTIVE_KEY, ElementProps, ItemProps, Props, SELECTED_KEY};

/// The role of the floating element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    /// `tooltip`; the reference is described by the floating element.
    Tooltip,
    /// `dialog`.
    #[default]
    Dialog,
    /// `alertdialog`.
    AlertDialog,
    /// `menu`.
    Menu,
    /// `listbox`.
    Listbox,
    /// `grid`.
    Grid,
    /// `tree`.
    Tree,
    /// A select: a `listbox` whose reference is a non-editable combobox.
    Select,
    /// A label; the reference is labelled by the floating element.
    Label,
    /// An editable combobox with a `listbox` popup.
    Combobox,
}

impl Role {
    /// The ARIA role of the floating element, if any.
    pub fn aria_role(self) -> Option<&'static str> {
        Some(match self {
            Self::Tooltip => "tooltip",
            Self::Dialog => "dialog",
            Self::AlertDialog => "alertdialog",
            Self::Menu => "menu",
            Self::Listbox | Self::Select | Self::Combobox => "listbox",
            Self::Grid => "grid",
            Self::Tree => "tree",
            Self::Label => return None,
        })
    }

    fn describes_reference(self) -> bool {
        matches!(self, Self::Tooltip | Self::Label)
    }
}

/// Options for [`RoleProps`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleOptions {
    /// Default: `true`.
    pub enabled: bool,
    /// Default: [`Role::Dialog`].
    pub role: Role,
}

impl Default for RoleOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            role: Role::Dialog,
        }
    }
}

/// ARIA attributes linking the reference, floating element, and items.
///
/// `aria-expanded`, `aria-controls`, and the tooltip and label links reflect
/// the open state when [`props`](Self::props) is called; inside a reactive
/// scope the call subscribes to it.
pub struct RoleProps<P: Platform> {
    ctx: FloatingContext<P>,
    options: RoleOptions,
    reference_id: String,
    floating_id: String,
}

impl<P: Platform> fmt::Debug for RoleProps<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleProps")
            .field("options", &self.options)
            .field("reference_id", &self.reference_id)
            .field("floating_id", &self.floating_id)
            .finish_non_exhaustive()
    }
}

impl<P: Platform> RoleProps<P> {
    /// Attach to `ctx`, taking two ids from `ids`.
    pub fn new(ctx: &FloatingContext<P>, ids: &IdGenerator, options: RoleOptions) -> Self {
        Self {
            ctx: ctx.clone(),
            options,
            reference_id: ids.next_id(),
            floating_id: ids.next_id(),
        }
    }

    /// The id given to the reference of a menu.
    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    /// The id given to the floating element.
    pub fn floating_id(&self) -> &str {
        &self.floating_id
    }

    /// This engine's contribution to the element props.
    pub fn props(&self) -> ElementProps<P::Element> {
        if !self.options.enabled {
            return ElementProps::empty();
        }
        let role = self.options.role;
        ElementProps {
            reference: Some(self.reference_props()),
            floating: Some(self.floating_props()),
            item: Some(self.item_props(role)),
        }
    }

    fn reference_props(&self) -> Props<P::Element> {
        let role = self.options.role;
        let floating_id = self.floating_id.clone();
        let open = self.ctx.is_open();
        if role.describes_reference() {
            let key = if role == Role::Label {
                "aria-labelledby"
            } else {
                "aria-describedby"
            };
            // Only points at the floating element while it exists.
            return if open {
                Props::new().with_attr(key, floating_id)
            } else {
                Props::new()
            };
        }

        let aria_role = role.aria_role();
        let haspopup = if role == Role::AlertDialog {
            Some("dialog")
        } else {
            aria_role
        };
        let mut props = Props::new().with_attr("aria-expanded", open);
        if let Some(haspopup) = haspopup {
            props = props.with_attr("aria-haspopup", haspopup);
        }
        if open {
            props = props.with_attr("aria-controls", floating_id);
        }
        match aria_role {
            Some("listbox") => props = props.with_attr("role", "combobox"),
            Some("menu") => {
                props = props.with_attr("id", self.reference_id.clone());
                if self.ctx.parent_id().is_some() {
                    props = props.with_attr("role", "menuitem");
                }
            }
            _ => {}
        }
        match role {
            Role::Select => props.with_attr("aria-autocomplete", "none"),
            Role::Combobox => props.with_attr("aria-autocomplete", "list"),
            _ => props,
        }
    }

    fn floating_props(&self) -> Props<P::Element> {
        let role = self.options.role;
        let mut props = Props::new().with_attr("id", self.floating_id.clone());
        if let Some(aria_role) = role.aria_role() {
            props = props.with_attr("role", aria_role);
        }
        if role == Role::Menu {
            props = props.with_attr("aria-labelledby", self.reference_id.clone());
        }
        props
    }

    fn item_props(&self, role: Role) -> ItemProps<P::Element> {
        let option_id = format!("{}-option", self.floating_id);
        ItemProps::Dynamic(Rc::new(move |user: &Props<P::Element>| {
            if !matches!(role, Role::Select | Role::Combobox) {
                return Props::new();
            }
            let active = user.flag(ACTIVE_KEY).unwrap_or(false);
            let selected = user.flag(SELECTED_KEY).unwrap_or(false);
            let mut props = Props::new().with_attr("role", "option");
            if active {
                props = props.with_attr("id", option_id.clone());
            }
            let aria_selected = if role == Role::Select {
                active && selected
            } else {
                selected
            };
            props.with_attr("aria-selected", aria_selected)
        }))
    }
}
