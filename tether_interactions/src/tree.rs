// Copyright 2025 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Floating trees: a registry of nested floating elements plus a shared
//! event channel.
//!
//! Nested floating elements (a submenu inside a menu, a tooltip inside a
//! popover) are often not DOM descendants of each other. A [`FloatingTree`]
//! records their logical parent links so a parent can ask which of its
//! descendants are open, and where their floating elements are.
//!
//! ```
//! use tether_interactions::{FloatingTree, NodeFlags};
//! use tether_reactive::Runtime;
//!
//! let rt = Runtime::new();
//! let tree: FloatingTree<u32> = FloatingTree::new();
//! let menu_open = rt.signal(true);
//! let sub_open = rt.signal(false);
//!
//! tree.add_node("menu", None, menu_open.read_only(), rt.signal(None).read_only(), NodeFlags::new());
//! tree.add_node("sub", Some("menu"), sub_open.read_only(), rt.signal(None).read_only(), NodeFlags::new());
//!
//! assert_eq!(tree.children("menu", false).len(), 1);
//! assert!(tree.children("menu", true).is_empty());
//! sub_open.set(true);
//! assert_eq!(tree.children("menu", true)[0].id, "sub");
//! ```

use alloc::borrow::ToOwned;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;
use tether_reactive::ReadSignal;

use crate::context::OpenChangeReason;

/// Dismissal bubbling flags a node publishes to its ancestors.
#[derive(Debug)]
pub struct NodeFlags {
    escape_key_bubbles: Cell<bool>,
    outside_press_bubbles: Cell<bool>,
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self {
            escape_key_bubbles: Cell::new(false),
            outside_press_bubbles: Cell::new(true),
        }
    }
}

impl NodeFlags {
    /// Flags with the dismissal defaults: escape does not bubble, outside
    /// presses do.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Whether an escape press inside this node also reaches its ancestors.
    pub fn escape_key_bubbles(&self) -> bool {
        self.escape_key_bubbles.get()
    }

    /// Whether an outside press also dismisses this node's ancestors.
    pub fn outside_press_bubbles(&self) -> bool {
        self.outside_press_bubbles.get()
    }

    /// Publish both flags.
    pub fn set(&self, escape_key: bool, outside_press: bool) {
        self.escape_key_bubbles.set(escape_key);
        self.outside_press_bubbles.set(outside_press);
    }
}

/// One registered floating element.
#[derive(Clone)]
pub struct NodeRecord<E> {
    /// Node id.
    pub id: String,
    /// Logical parent, `None` for a root.
    pub parent_id: Option<String>,
    /// The node's open state.
    pub open: ReadSignal<bool>,
    /// The node's floating element.
    pub floating: ReadSignal<Option<E>>,
    /// The node's dismissal bubbling flags.
    pub flags: Rc<NodeFlags>,
}

impl<E: fmt::Debug + Clone + PartialEq + 'static> fmt::Debug for NodeRecord<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRecord")
            .field("id", &self.id)
            .field("parent_id", &self.parent_id)
            .field("open", &self.open.get_untracked())
            .field("floating", &self.floating.get_untracked())
            .field("flags", &self.flags)
            .finish()
    }
}

/// Something broadcast over a tree's event channel.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeEvent {
    /// A node opened or closed.
    OpenChange {
        /// The node, if it is registered.
        node_id: Option<String>,
        /// The new state.
        open: bool,
        /// What caused the change.
        reason: Option<OpenChangeReason>,
    },
    /// An application-defined message.
    Custom {
        /// Channel name.
        name: String,
        /// Free-form payload.
        payload: String,
    },
}

impl TreeEvent {
    /// Channel name handlers subscribe to: `"openchange"` or the custom name.
    pub fn name(&self) -> &str {
        match self {
            Self::OpenChange { .. } => "openchange",
            Self::Custom { name, .. } => name,
        }
    }
}

/// Handle returned by [`EventEmitter::on`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type TreeHandler = Rc<dyn Fn(&TreeEvent)>;

/// Named broadcast channels.
///
/// Handlers run in subscription order. A handler may subscribe or
/// unsubscribe during emission; the change applies from the next emission.
#[derive(Default)]
pub struct EventEmitter {
    next_id: Cell<u64>,
    handlers: RefCell<HashMap<String, SmallVec<[(HandlerId, TreeHandler); 2]>>>,
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("channels", &self.handlers.borrow().len())
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// An emitter with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to `name`.
    pub fn on(&self, name: &str, handler: impl Fn(&TreeEvent) + 'static) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .entry(name.to_owned())
            .or_default()
            .push((id, Rc::new(handler)));
        id
    }

    /// Unsubscribe a handler.
    pub fn off(&self, name: &str, id: HandlerId) {
        let mut handlers = self.handlers.borrow_mut();
        if let Some(list) = handlers.get_mut(name) {
            list.retain(|(h, _)| *h != id);
            if list.is_empty() {
                handlers.remove(name);
            }
        }
    }

    /// Deliver `event` to every handler of its channel.
    pub fn emit(&self, event: &TreeEvent) {
        let snapshot: SmallVec<[TreeHandler; 4]> = self
            .handlers
            .borrow()
            .get(event.name())
            .map(|list| list.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();
        for handler in snapshot {
            handler(event);
        }
    }
}

/// A registry of nested floating elements.
///
/// Cloning yields another handle to the same tree.
pub struct FloatingTree<E> {
    inner: Rc<TreeInner<E>>,
}

struct TreeInner<E> {
    nodes: RefCell<Vec<NodeRecord<E>>>,
    events: EventEmitter,
}

impl<E> Clone for FloatingTree<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for FloatingTree<E> {
    fn default() -> Self {
        Self {
            inner: Rc::new(TreeInner {
                nodes: RefCell::new(Vec::new()),
                events: EventEmitter::new(),
            }),
        }
    }
}

impl<E> fmt::Debug for FloatingTree<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.inner.nodes.borrow();
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        f.debug_struct("FloatingTree")
            .field("nodes", &ids)
            .field("events", &self.inner.events)
            .finish()
    }
}

impl<E: Clone + PartialEq + 'static> FloatingTree<E> {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. A node registered twice under the same id replaces
    /// the earlier record.
    pub fn add_node(
        &self,
        id: &str,
        parent_id: Option<&str>,
        open: ReadSignal<bool>,
        floating: ReadSignal<Option<E>>,
        flags: Rc<NodeFlags>,
    ) {
        let record = NodeRecord {
            id: id.to_owned(),
            parent_id: parent_id.map(ToOwned::to_owned),
            open,
            floating,
            flags,
        };
        let mut nodes = self.inner.nodes.borrow_mut();
        nodes.retain(|n| n.id != id);
        nodes.push(record);
    }

    /// Unregister a node. Its descendants stay registered.
    pub fn remove_node(&self, id: &str) {
        self.inner.nodes.borrow_mut().retain(|n| n.id != id);
    }

    /// A snapshot of every node, in registration order.
    pub fn nodes(&self) -> Vec<NodeRecord<E>> {
        self.inner.nodes.borrow().clone()
    }

    /// Look up a node.
    pub fn node(&self, id: &str) -> Option<NodeRecord<E>> {
        self.inner
            .nodes
            .borrow()
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    /// Every descendant of `id`, depth first.
    ///
    /// With `only_open`, closed nodes and everything below them are skipped.
    /// Open states are read untracked.
    pub fn children(&self, id: &str, only_open: bool) -> Vec<NodeRecord<E>> {
        let nodes = self.nodes();
        let mut out = Vec::new();
        collect_children(&nodes, id, only_open, &mut out);
        out
    }

    /// The tree-wide event channel.
    pub fn events(&self) -> &EventEmitter {
        &self.inner.events
    }
}

fn collect_children<E: Clone + PartialEq + 'static>(
    nodes: &[NodeRecord<E>],
    id: &str,
    only_open: bool,
    out: &mut Vec<NodeRecord<E>>,
) {
    for node in nodes {
        if node.parent_id.as_deref() != Some(id) {
            continue;
        }
        if only_open && !node.open.get_untracked() {
            continue;
        }
        out.push(node.clone());
        collect_children(nodes, &node.id, only_open, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_reactive::Runtime;

    #[test]
    fn nested_children_respect_open_state() {
        let rt = Runtime::new();
        let tree: FloatingTree<u32> = FloatingTree::new();
        let a = rt.signal(true);
        let b = rt.signal(true);
        let c = rt.signal(true);
        let none = || rt.signal(None).read_only();
        tree.add_node("a", None, a.read_only(), none(), NodeFlags::new());
        tree.add_node("b", Some("a"), b.read_only(), none(), NodeFlags::new());
        tree.add_node("c", Some("b"), c.read_only(), none(), NodeFlags::new());

        let ids = |v: Vec<NodeRecord<u32>>| v.into_iter().map(|n| n.id).collect::<Vec<_>>();
        assert_eq!(ids(tree.children("a", true)), ["b", "c"]);

        b.set(false);
        assert!(tree.children("a", true).is_empty());
        assert_eq!(ids(tree.children("a", false)), ["b", "c"]);

        tree.remove_node("b");
        assert!(tree.children("a", false).is_empty());
        assert!(tree.node("c").is_some());
    }

    #[test]
    fn emitter_delivers_by_channel() {
        let emitter = EventEmitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let id = emitter.on("openchange", move |e| {
            if let TreeEvent::OpenChange { open, .. } = e {
                s.borrow_mut().push(*open);
            }
        });
        emitter.emit(&TreeEvent::OpenChange {
            node_id: None,
            open: true,
            reason: None,
        });
        emitter.emit(&TreeEvent::Custom {
            name: "ping".into(),
            payload: String::new(),
        });
        emitter.off("openchange", id);
        emitter.emit(&TreeEvent::OpenChange {
            node_id: None,
            open: false,
            reason: None,
        });
        assert_eq!(*seen.borrow(), [true]);
    }

    #[test]
    fn flags_default_to_dismissal_defaults() {
        let flags = NodeFlags::new();
        assert!(!flags.escape_key_bubbles());
        assert!(flags.outside_press_bubbles());
        flags.set(true, false);
        assert!(flags.escape_key_bubbles());
        assert!(!flags.outside_press_bubbles());
    }
}
