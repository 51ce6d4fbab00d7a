//! Read Tracking
//!
//! A [`Tracker`] is the read side of the graph. Every property read through
//! it on a wrapped container records `(node, key)` as the most recent read
//! edge. Subscriptions run their getter against a fresh tracker and bind to
//! whatever edge it saw last.
//!
//! # Implementation
//!
//! The log lives inside the tracker itself rather than in shared state, so
//! each getter evaluation has its own and nested or interleaved evaluations
//! cannot observe each other's reads. Untracked reads
//! ([`Graph::get`](crate::Graph::get)) simply use a throwaway tracker.

use std::cell::RefCell;

use crate::error::{Error, Result};
use crate::graph::{Edge, Graph, Key, Value};

/// Call-scoped read log over a graph.
pub struct Tracker<'g> {
    graph: &'g Graph,
    last: RefCell<Option<Edge>>,
}

impl<'g> Tracker<'g> {
    pub(crate) fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            last: RefCell::new(None),
        }
    }

    /// The graph being read.
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Read `key` from `target`.
    ///
    /// Fails with [`Error::Unresolved`] when `target` is not a container,
    /// which is how a getter reports that an intermediate segment of its
    /// path is currently absent. Missing keys read as [`Value::Absent`].
    pub fn get(&self, target: &Value, key: impl Into<Key>) -> Result<Value> {
        let key = key.into();
        let Some(id) = target.as_node() else {
            return Err(Error::Unresolved { key });
        };
        let key = self.graph.key_for(id, key);

        if self.graph.node(id).is_reactive() {
            *self.last.borrow_mut() = Some(Edge {
                node: id,
                key: key.clone(),
            });
        }

        self.graph.lookup(self, target, id, &key)
    }

    /// Follow `keys` from `root`, one [`get`](Self::get) per segment.
    pub fn path<I>(&self, root: &Value, keys: I) -> Result<Value>
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        keys.into_iter()
            .try_fold(root.clone(), |current, key| self.get(&current, key))
    }

    /// The most recent edge read so far.
    pub fn last_edge(&self) -> Option<Edge> {
        self.last.borrow().clone()
    }

    pub(crate) fn into_last_edge(self) -> Option<Edge> {
        self.last.into_inner()
    }
}
