//! Change detection and ancestor propagation.
//!
//! Given the old and new value of a slot, [`Graph::detect`] decides which
//! edges are dirty and schedules their handlers into a [`MutationContext`].
//! Descendant edges are scheduled before the edge that holds them, and
//! [`Graph::propagate_to_ancestors`] then extends dirtiness upward through
//! every parent path, so deeper handlers come first in the fire order.
//!
//! Both walks memoize by node identity, which bounds the work on cyclic and
//! shared structures to one visit per node per mutation.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexSet;
use tracing::trace;

use super::node::{Kind, Node, NodeId};
use super::value::{AllowList, Key, Value};
use super::Graph;
use crate::reactive::HandlerId;

/// Transient state of a single write.
///
/// Created when a write starts and dropped before it returns.
#[derive(Debug)]
pub(crate) struct MutationContext {
    /// Allow-list of the node being written.
    allow: Rc<AllowList>,

    /// Verdict per old container: `true` if it changed. An entry is
    /// inserted before recursing, which is what terminates cycles.
    changes: HashMap<NodeId, bool>,

    /// Nodes whose ancestors were already marked.
    ancestors: HashSet<NodeId>,

    /// Handlers to fire, deduplicated, in marking order.
    scheduled: IndexSet<HandlerId>,
}

impl MutationContext {
    pub(crate) fn new(allow: Rc<AllowList>) -> Self {
        Self {
            allow,
            changes: HashMap::new(),
            ancestors: HashSet::new(),
            scheduled: IndexSet::new(),
        }
    }

    /// Schedule every handler on the edge `(node, key)`.
    fn schedule(&mut self, id: NodeId, node: &Node, key: &Key) {
        let Some(meta) = &node.reactive else {
            return;
        };
        let handlers = meta.handlers(key);
        if !handlers.is_empty() {
            trace!(node = id.raw(), %key, handlers = handlers.len(), "edge dirty");
            self.scheduled.extend(handlers.iter().copied());
        }
    }

    /// Drop both memos and hand over the scheduled handlers.
    pub(crate) fn finish(self) -> IndexSet<HandlerId> {
        self.scheduled
    }

    #[cfg(test)]
    pub(crate) fn scheduled(&self) -> &IndexSet<HandlerId> {
        &self.scheduled
    }
}

impl Graph {
    fn schedule_edge(&self, ctx: &mut MutationContext, id: NodeId, key: &Key) {
        ctx.schedule(id, self.node(id), key);
    }

    /// Compare `old` (currently at `(owner, key)`) against `new` and
    /// schedule the handlers of every edge that must notify.
    ///
    /// Returns whether anything changed.
    pub(crate) fn detect(
        &self,
        ctx: &mut MutationContext,
        owner: NodeId,
        key: &Key,
        old: &Value,
        new: &Value,
    ) -> bool {
        let Some(old_id) = self.wrappable(old, &ctx.allow) else {
            if old.same(new) {
                return false;
            }
            self.schedule_edge(ctx, owner, key);
            return true;
        };

        if let Some(&changed) = ctx.changes.get(&old_id) {
            return changed;
        }

        let new_id = self
            .wrappable(new, &ctx.allow)
            .filter(|&id| self.node(id).kind() == self.node(old_id).kind());

        let Some(new_id) = new_id else {
            // Different kind or no longer a container: the whole old
            // subtree is gone.
            self.mark_subtree(ctx, old_id);
            self.schedule_edge(ctx, owner, key);
            ctx.changes.insert(old_id, true);
            return true;
        };

        ctx.changes.insert(old_id, false);

        let old_node = self.node(old_id);
        let new_node = self.node(new_id);
        let mut changed = false;

        for (child_key, old_child) in old_node.data_entries() {
            let new_child = self.data_value(new_id, &child_key);
            changed |= self.detect(ctx, old_id, &child_key, old_child, &new_child);
        }

        // Arrivals. For keyed containers a key that only exists in the new
        // value counts only if it holds something: optional properties that
        // are present but absent are the same as missing ones.
        let sequence = old_node.kind() == Kind::Sequence;
        for (child_key, new_child) in new_node.data_entries() {
            if old_node.has_own(&child_key) {
                continue;
            }
            if sequence || !new_child.is_absent() {
                self.schedule_edge(ctx, old_id, &child_key);
                changed = true;
            }
        }

        if changed {
            self.schedule_edge(ctx, owner, key);
        }
        ctx.changes.insert(old_id, changed);
        changed
    }

    /// Schedule every own and descendant edge of `id`, children first.
    fn mark_subtree(&self, ctx: &mut MutationContext, id: NodeId) {
        if ctx.changes.contains_key(&id) {
            return;
        }
        ctx.changes.insert(id, true);

        let node = self.node(id);
        for (key, child) in node.data_entries() {
            if let Some(child_id) = self.wrappable(child, &ctx.allow) {
                self.mark_subtree(ctx, child_id);
            }
            ctx.schedule(id, node, &key);
        }
    }

    /// Schedule every edge through which `id` is reachable from its
    /// parents, then recurse upward.
    pub(crate) fn propagate_to_ancestors(&self, ctx: &mut MutationContext, id: NodeId) {
        if !ctx.ancestors.insert(id) {
            return;
        }
        let Some(meta) = &self.node(id).reactive else {
            return;
        };

        for &parent_id in meta.parents() {
            let parent = self.node(parent_id);
            for (key, value) in parent.data_entries() {
                if value.as_node() == Some(id) {
                    ctx.schedule(parent_id, parent, &key);
                }
            }
            self.propagate_to_ancestors(ctx, parent_id);
        }
    }
}
