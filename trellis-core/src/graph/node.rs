//! Graph Nodes
//!
//! This module defines the containers that live in the graph arena and the
//! reactive bookkeeping attached to them once they are wrapped.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::value::{AllowList, Key, Value};
use super::Graph;
use crate::error::Result;
use crate::reactive::{HandlerId, Tracker};

/// Stable handle of a container in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// # Panics
    ///
    /// Panics once the arena holds more nodes than a `u32` can address.
    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).expect("graph arena exhausted: node ids are u32"))
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// A `(node, key)` pair: the unit of subscription and notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub node: NodeId,
    pub key: Key,
}

/// The two container shapes. A diff across shapes replaces the whole
/// subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Insertion-ordered map of keys to slots.
    Keyed,
    /// Dense ordered list; missing entries read as [`Value::Absent`].
    Sequence,
}

/// Accessor getter. Receives the tracker of the read in progress and the
/// receiver the property was read through.
pub type Getter = Rc<dyn Fn(&Tracker<'_>, &Value) -> Result<Value>>;

/// Accessor setter. Receives the graph and the receiver the property was
/// assigned through; writes it performs are intercepted normally.
pub type Setter = Rc<dyn Fn(&mut Graph, &Value, Value) -> Result<()>>;

/// A computed property. Accessor slots never take part in diffing or
/// dependency tracking.
#[derive(Clone, Default)]
pub struct Accessor {
    pub(crate) get: Option<Getter>,
    pub(crate) set: Option<Setter>,
}

impl Accessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn getter<F>(mut self, get: F) -> Self
    where
        F: Fn(&Tracker<'_>, &Value) -> Result<Value> + 'static,
    {
        self.get = Some(Rc::new(get));
        self
    }

    pub fn setter<F>(mut self, set: F) -> Self
    where
        F: Fn(&mut Graph, &Value, Value) -> Result<()> + 'static,
    {
        self.set = Some(Rc::new(set));
        self
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .finish()
    }
}

/// A keyed container slot.
#[derive(Debug, Clone)]
pub enum Slot {
    Data(Value),
    Accessor(Accessor),
}

#[derive(Debug, Clone)]
pub(crate) enum Body {
    Keyed(IndexMap<Key, Slot>),
    Sequence(Vec<Value>),
}

/// Bookkeeping of a wrapped node.
#[derive(Debug)]
pub(crate) struct Reactive {
    /// Nodes holding this one in a data slot. Deduplicated.
    parents: SmallVec<[NodeId; 2]>,

    /// Handlers per edge, in registration order. Empty lists are removed.
    handlers: IndexMap<Key, SmallVec<[HandlerId; 2]>>,

    /// Allow-list captured at wrap time; used for everything assigned
    /// into this node later.
    allow: Rc<AllowList>,
}

impl Reactive {
    pub(crate) fn new(allow: Rc<AllowList>) -> Self {
        Self {
            parents: SmallVec::new(),
            handlers: IndexMap::new(),
            allow,
        }
    }

    pub(crate) fn allow(&self) -> &Rc<AllowList> {
        &self.allow
    }

    pub(crate) fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub(crate) fn add_parent(&mut self, parent: NodeId) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }

    pub(crate) fn remove_parent(&mut self, parent: NodeId) {
        self.parents.retain(|p| *p != parent);
    }

    pub(crate) fn handlers(&self, key: &Key) -> &[HandlerId] {
        self.handlers.get(key).map_or(&[], |list| list.as_slice())
    }

    pub(crate) fn handler_keys(&self) -> impl Iterator<Item = &Key> {
        self.handlers.keys()
    }

    pub(crate) fn add_handler(&mut self, key: Key, handler: HandlerId) {
        self.handlers.entry(key).or_default().push(handler);
    }

    /// Returns `false` if the handler was not on this edge.
    pub(crate) fn remove_handler(&mut self, key: &Key, handler: HandlerId) -> bool {
        let Some(list) = self.handlers.get_mut(key) else {
            return false;
        };
        let before = list.len();
        list.retain(|h| *h != handler);
        let removed = list.len() != before;
        if list.is_empty() {
            self.handlers.shift_remove(key);
        }
        removed
    }
}

/// A container in the graph arena.
#[derive(Debug)]
pub struct Node {
    pub(crate) class: Option<Rc<str>>,
    pub(crate) proto: Option<NodeId>,
    pub(crate) body: Body,
    pub(crate) reactive: Option<Reactive>,
}

impl Node {
    pub(crate) fn keyed(class: Option<Rc<str>>) -> Self {
        Self {
            class,
            proto: None,
            body: Body::Keyed(IndexMap::new()),
            reactive: None,
        }
    }

    pub(crate) fn sequence(items: Vec<Value>) -> Self {
        Self {
            class: None,
            proto: None,
            body: Body::Sequence(items),
            reactive: None,
        }
    }

    pub fn kind(&self) -> Kind {
        match self.body {
            Body::Keyed(_) => Kind::Keyed,
            Body::Sequence(_) => Kind::Sequence,
        }
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn is_reactive(&self) -> bool {
        self.reactive.is_some()
    }

    /// Own data value under `key`, without consulting the prototype chain.
    pub(crate) fn own_data(&self, key: &Key) -> Option<&Value> {
        match &self.body {
            Body::Keyed(map) => match map.get(key) {
                Some(Slot::Data(value)) => Some(value),
                _ => None,
            },
            Body::Sequence(items) => key.as_index().and_then(|i| items.get(i)),
        }
    }

    /// Whether `key` is an own slot (data or accessor) of this node.
    pub(crate) fn has_own(&self, key: &Key) -> bool {
        match &self.body {
            Body::Keyed(map) => map.contains_key(key),
            Body::Sequence(items) => key.as_index().is_some_and(|i| i < items.len()),
        }
    }

    pub(crate) fn own_slot(&self, key: &Key) -> Option<&Slot> {
        match &self.body {
            Body::Keyed(map) => map.get(key),
            Body::Sequence(_) => None,
        }
    }

    /// Own keys in order: indices for sequences, map keys otherwise.
    pub fn keys(&self) -> Vec<Key> {
        match &self.body {
            Body::Keyed(map) => map.keys().cloned().collect(),
            Body::Sequence(items) => (0..items.len()).map(Key::Index).collect(),
        }
    }

    /// Own data slots in order. Accessor slots are skipped.
    pub(crate) fn data_entries(&self) -> Box<dyn Iterator<Item = (Key, &Value)> + '_> {
        match &self.body {
            Body::Keyed(map) => Box::new(map.iter().filter_map(|(k, slot)| match slot {
                Slot::Data(v) => Some((k.clone(), v)),
                Slot::Accessor(_) => None,
            })),
            Body::Sequence(items) => {
                Box::new(items.iter().enumerate().map(|(i, v)| (Key::Index(i), v)))
            }
        }
    }

    /// Number of own slots (sequence length for sequences).
    pub fn len(&self) -> usize {
        match &self.body {
            Body::Keyed(map) => map.len(),
            Body::Sequence(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
