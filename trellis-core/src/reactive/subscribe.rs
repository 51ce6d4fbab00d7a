//! Subscriptions
//!
//! A subscription watches the last edge its getter reads and re-resolves
//! that edge every time it fires, since the node at the end of the path may
//! have been replaced by the write that triggered it.
//!
//! # How It Works
//!
//! 1. `subscribe` runs the getter once against a fresh [`Tracker`]. Reading
//!    through an absent segment fails with [`Error::Unresolved`]; that is
//!    recorded as "not found" and the subscription binds to the deepest
//!    edge that did resolve.
//!
//! 2. When the bound edge is marked dirty the handler detaches, re-runs the
//!    getter, binds to the new last edge, and only then calls the user
//!    callback, provided the path resolved before or resolves now.
//!
//! 3. A write that replaces a wrapped node leaves handlers bound inside the
//!    old subtree. Those are re-pointed silently (no callback), children
//!    before parents.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};

use super::{Binding, HandlerId, Resolve, Subscription, Tracker, Unsubscribe};

impl Graph {
    /// Watch the edge `getter` reads last and run `callback` whenever it
    /// changes.
    ///
    /// The getter must read at least one wrapped container, otherwise there
    /// is nothing to watch and [`Error::Untracked`] is returned. Failures of
    /// the getter other than an unresolved path are returned as well.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    /// use trellis_core::{AllowList, Graph, Value};
    ///
    /// let mut graph = Graph::new();
    /// let raw = graph.insert_json(&serde_json::json!({"user": {"name": "ada"}}));
    /// let state = graph.wrap(&raw, &AllowList::new());
    ///
    /// let calls = Rc::new(Cell::new(0));
    /// let seen = Rc::clone(&calls);
    /// let root = state.clone();
    /// let subscription = graph
    ///     .subscribe(
    ///         move |t| t.path(&root, ["user", "name"]),
    ///         move |_| {
    ///             seen.set(seen.get() + 1);
    ///             Ok(())
    ///         },
    ///     )
    ///     .unwrap();
    ///
    /// let user = graph.get(&state, "user").unwrap();
    /// graph.set(&user, "name", Value::from("grace")).unwrap();
    /// assert_eq!(calls.get(), 1);
    ///
    /// subscription.unsubscribe(&mut graph);
    /// graph.set(&user, "name", Value::from("linus")).unwrap();
    /// assert_eq!(calls.get(), 1);
    /// ```
    pub fn subscribe<G, T, C>(&mut self, getter: G, callback: C) -> Result<Unsubscribe>
    where
        G: Fn(&Tracker<'_>) -> Result<T> + 'static,
        C: Fn(&mut Graph) -> Result<()> + 'static,
    {
        let resolve: Resolve = Rc::new(move |tracker: &Tracker<'_>| getter(tracker).map(drop));
        let subscription = Rc::new(Subscription {
            resolve,
            callback: Rc::new(callback),
        });

        let handler = self.next_handler_id();
        let found = self.bind(handler, subscription)?;
        debug!(%handler, found, "subscribed");

        Ok(Unsubscribe::new(handler))
    }

    /// Remove `handler` from the edge it occupies.
    ///
    /// Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, handler: HandlerId) -> bool {
        let removed = self.detach(handler).is_some();
        if removed {
            debug!(%handler, "unsubscribed");
        }
        removed
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.bindings.len()
    }

    /// Resolve the subscription's getter and bind `handler` to the last
    /// edge it read. Returns whether the path resolved.
    fn bind(&mut self, handler: HandlerId, subscription: Rc<Subscription>) -> Result<bool> {
        let (outcome, edge) = {
            let tracker = Tracker::new(self);
            let outcome = (subscription.resolve)(&tracker);
            (outcome, tracker.into_last_edge())
        };

        let found = match outcome {
            Ok(()) => true,
            Err(error) if error.is_unresolved() => false,
            Err(error) => return Err(error),
        };
        let edge = edge.ok_or(Error::Untracked)?;

        if let Some(meta) = self.node_mut(edge.node).reactive.as_mut() {
            meta.add_handler(edge.key.clone(), handler);
        }
        self.bindings.insert(
            handler,
            Binding {
                subscription,
                edge,
                found,
            },
        );
        Ok(found)
    }

    fn detach(&mut self, handler: HandlerId) -> Option<Binding> {
        let binding = self.bindings.remove(&handler)?;
        if let Some(meta) = self.node_mut(binding.edge.node).reactive.as_mut() {
            meta.remove_handler(&binding.edge.key, handler);
        }
        Some(binding)
    }

    /// Body of every subscription handler: re-point, then notify.
    ///
    /// A handler that was unsubscribed earlier in the same batch is a no-op.
    /// If re-resolution fails the subscription is dropped and the error
    /// returned to the scheduler.
    pub(crate) fn run_handler(&mut self, handler: HandlerId) -> Result<()> {
        let Some(previous) = self.detach(handler) else {
            return Ok(());
        };
        let subscription = Rc::clone(&previous.subscription);

        let found = self.bind(handler, Rc::clone(&subscription))?;
        if previous.found || found {
            (subscription.callback)(self)?;
        }
        Ok(())
    }

    /// Silently re-point every handler bound inside the subtree of `root`,
    /// which a write just replaced. Descendants go first.
    pub(crate) fn rebind_detached(&mut self, root: NodeId) {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        self.collect_subtree(root, &mut visited, &mut order);

        let mut moved = 0;
        for id in order {
            let handlers: Vec<HandlerId> = match &self.node(id).reactive {
                Some(meta) => meta
                    .handler_keys()
                    .flat_map(|key| meta.handlers(key))
                    .copied()
                    .collect(),
                None => continue,
            };
            for handler in handlers {
                self.repoint(handler);
                moved += 1;
            }
        }

        if moved > 0 {
            debug!(root = root.raw(), handlers = moved, "rebound detached subtree");
        }
    }

    /// Reactive nodes reachable from `id` through data slots, children
    /// before their parent.
    fn collect_subtree(&self, id: NodeId, visited: &mut HashSet<NodeId>, order: &mut Vec<NodeId>) {
        if !visited.insert(id) {
            return;
        }
        let node = self.node(id);
        if !node.is_reactive() {
            return;
        }
        for (_, child) in node.data_entries() {
            if let Some(child_id) = child.as_node() {
                self.collect_subtree(child_id, visited, order);
            }
        }
        order.push(id);
    }

    fn repoint(&mut self, handler: HandlerId) {
        let Some(previous) = self.detach(handler) else {
            return;
        };
        if let Err(error) = self.bind(handler, previous.subscription) {
            self.report(&error);
        }
    }
}
