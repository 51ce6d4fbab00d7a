//! Object Graph
//!
//! This module implements the arena that owns every container the caller
//! builds, wrapped or not.
//!
//! # Overview
//!
//! Containers are addressed by [`NodeId`] handles that stay valid for the
//! lifetime of the [`Graph`]. Values reference containers by handle, so a
//! container may be shared between several slots and may (directly or
//! indirectly) contain itself.
//!
//! Wrapping a container attaches reactive bookkeeping to it: a parent set
//! and a handler table keyed by property. Parents are plain handles, never
//! owners; nothing is ever freed from the arena, a node that becomes
//! unreachable just stops receiving writes.
//!
//! Writes, change detection and notification live in [`crate::reactive`]
//! and in the [`diff`] and [`scheduler`] submodules. This module only
//! provides construction and untracked reads.

mod diff;
mod json;
mod node;
mod scheduler;
mod value;

use std::collections::HashMap;
use std::rc::Rc;

pub use node::{Accessor, Edge, Getter, Kind, Node, NodeId, Setter, Slot};
pub use value::{AllowList, Key, Value};
pub(crate) use value::INDEX_LIMIT;

pub(crate) use diff::MutationContext;
pub(crate) use node::{Body, Reactive};

use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::reactive::{Binding, HandlerId, Tracker};
use crate::sink::ErrorSink;

/// An arena of containers plus the reactive state layered over them.
///
/// All interaction goes through `&mut Graph`, which is also what handlers
/// and accessor setters receive.
pub struct Graph {
    pub(crate) nodes: Vec<Node>,

    /// Live subscriptions and the edge each is bound to.
    pub(crate) bindings: HashMap<HandlerId, Binding>,

    /// Handlers currently executing, innermost last.
    pub(crate) firing: Vec<HandlerId>,

    next_handler: u64,

    pub(crate) sink: Rc<dyn ErrorSink>,

    default_allow: Rc<AllowList>,
}

impl Graph {
    /// Create an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            nodes: Vec::new(),
            bindings: HashMap::new(),
            firing: Vec::new(),
            next_handler: 0,
            sink: config.sink.build(),
            default_allow: Rc::new(config.allow_list),
        }
    }

    /// Replace the error sink handlers report to.
    pub fn with_sink(mut self, sink: Rc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub(crate) fn default_allow(&self) -> &Rc<AllowList> {
        &self.default_allow
    }

    pub(crate) fn next_handler_id(&mut self) -> HandlerId {
        self.next_handler += 1;
        HandlerId::from(self.next_handler)
    }

    pub(crate) fn report(&self, error: &Error) {
        self.sink.report(error);
    }

    fn alloc(&mut self, node: Node) -> Value {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        Value::Object(id)
    }

    /// Create an empty plain keyed container.
    pub fn object(&mut self) -> Value {
        self.alloc(Node::keyed(None))
    }

    /// Create a plain sequence holding `items`.
    pub fn array(&mut self, items: impl IntoIterator<Item = Value>) -> Value {
        self.alloc(Node::sequence(items.into_iter().collect()))
    }

    /// Create an empty keyed container of a named class. It is only wrapped
    /// when the class is on the allow-list in effect.
    pub fn instance(&mut self, class: &str) -> Value {
        self.alloc(Node::keyed(Some(Rc::from(class))))
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// The container behind `value`, if it is one.
    pub fn node_of(&self, value: &Value) -> Option<&Node> {
        value.as_node().map(|id| self.node(id))
    }

    pub(crate) fn container(&self, value: &Value) -> Result<NodeId> {
        value.as_node().ok_or(Error::NotAContainer)
    }

    /// `key` in the form the slots of `id` are stored under.
    pub(crate) fn key_for(&self, id: NodeId, key: Key) -> Key {
        key.normalized(self.node(id).kind())
    }

    /// Install an accessor property on a keyed container.
    pub fn define_accessor(
        &mut self,
        target: &Value,
        key: impl Into<Key>,
        accessor: Accessor,
    ) -> Result<()> {
        let id = self.container(target)?;
        let key = self.key_for(id, key.into());
        match &mut self.node_mut(id).body {
            Body::Keyed(map) => {
                map.insert(key, Slot::Accessor(accessor));
                Ok(())
            }
            Body::Sequence(_) => Err(Error::InvalidKey { key }),
        }
    }

    /// Set the container properties are inherited from when not found on
    /// `target` itself.
    pub fn set_prototype(&mut self, target: &Value, proto: Option<&Value>) -> Result<()> {
        let id = self.container(target)?;
        let proto = proto.map(|p| self.container(p)).transpose()?;

        let mut cursor = proto;
        while let Some(p) = cursor {
            if p == id {
                return Err(Error::Cycle);
            }
            cursor = self.node(p).proto;
        }

        self.node_mut(id).proto = proto;
        Ok(())
    }

    /// Read a property without recording a dependency.
    pub fn get(&self, target: &Value, key: impl Into<Key>) -> Result<Value> {
        Tracker::new(self).get(target, key)
    }

    /// Follow `keys` from `root` without recording dependencies.
    pub fn get_path<I>(&self, root: &Value, keys: I) -> Result<Value>
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        Tracker::new(self).path(root, keys)
    }

    /// Own keys of a container, in order.
    pub fn keys(&self, target: &Value) -> Result<Vec<Key>> {
        Ok(self.node(self.container(target)?).keys())
    }

    /// Number of own slots of a container.
    pub fn len(&self, target: &Value) -> Result<usize> {
        Ok(self.node(self.container(target)?).len())
    }

    /// Whether `value` is a wrapped container.
    pub fn is_reactive(&self, value: &Value) -> bool {
        self.node_of(value).is_some_and(Node::is_reactive)
    }

    /// Wrapped containers currently holding `value` in a data slot.
    pub fn parents(&self, value: &Value) -> Vec<Value> {
        self.node_of(value)
            .and_then(|node| node.reactive.as_ref())
            .map(|meta| meta.parents().iter().copied().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// Number of handlers bound to the edge `(target, key)`.
    pub fn handler_count(&self, target: &Value, key: impl Into<Key>) -> usize {
        let key = key.into();
        self.node_of(target)
            .and_then(|node| {
                let key = key.normalized(node.kind());
                node.reactive.as_ref().map(|meta| meta.handlers(&key).len())
            })
            .unwrap_or(0)
    }

    /// Resolve `key` on `id`, walking the prototype chain. Accessor getters
    /// run against `receiver`.
    pub(crate) fn lookup(
        &self,
        tracker: &Tracker<'_>,
        receiver: &Value,
        id: NodeId,
        key: &Key,
    ) -> Result<Value> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current);
            match &node.body {
                Body::Keyed(map) => match map.get(key) {
                    Some(Slot::Data(value)) => return Ok(value.clone()),
                    Some(Slot::Accessor(accessor)) => {
                        return match &accessor.get {
                            Some(get) => get(tracker, receiver),
                            None => Ok(Value::Absent),
                        };
                    }
                    None => {}
                },
                Body::Sequence(items) => {
                    if let Some(value) = key.as_index().and_then(|i| items.get(i)) {
                        return Ok(value.clone());
                    }
                }
            }
            cursor = node.proto;
        }
        Ok(Value::Absent)
    }

    /// The accessor `key` resolves to on `id`, if the first slot found on
    /// the prototype chain is an accessor.
    pub(crate) fn find_accessor(&self, id: NodeId, key: &Key) -> Option<Accessor> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current);
            if let Some(slot) = node.own_slot(key) {
                return match slot {
                    Slot::Accessor(accessor) => Some(accessor.clone()),
                    Slot::Data(_) => None,
                };
            }
            if node.own_data(key).is_some() {
                return None;
            }
            cursor = node.proto;
        }
        None
    }

    /// Data value of `key` on `id` through the prototype chain, ignoring
    /// accessors. This is what the change detector compares.
    pub(crate) fn data_value(&self, id: NodeId, key: &Key) -> Value {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current);
            if let Some(value) = node.own_data(key) {
                return value.clone();
            }
            if node.own_slot(key).is_some() {
                return Value::Absent;
            }
            cursor = node.proto;
        }
        Value::Absent
    }

    /// The container behind `value` if it may be wrapped under `allow`.
    pub(crate) fn wrappable(&self, value: &Value, allow: &AllowList) -> Option<NodeId> {
        let id = value.as_node()?;
        allow.admits(self.node(id).class()).then_some(id)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("node_count", &self.nodes.len())
            .field("subscriptions", &self.bindings.len())
            .field("firing", &self.firing)
            .finish()
    }
}
