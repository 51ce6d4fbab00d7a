//! Write Interception
//!
//! Wrapping turns plain containers into reactive nodes; writes to reactive
//! nodes go through the pipeline below.
//!
//! # Write Pipeline
//!
//! 1. Capture the old value and whether it is a wrapped node.
//! 2. Wrap the new value (if eligible) with the target as its parent.
//! 3. Diff old against new, scheduling the handlers of dirty edges.
//! 4. Commit the assignment.
//! 5. Unlink the target from a superseded old node.
//! 6. Propagate dirtiness to the target's ancestors, fire the scheduled
//!    handlers, and finally rebind handlers left in the superseded subtree.
//!
//! Accessor properties skip all of this: the setter runs with the receiver
//! and any writes it makes are intercepted on their own.

use std::rc::Rc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::graph::{
    AllowList, Body, Graph, Key, MutationContext, NodeId, Reactive, Slot, Value, INDEX_LIMIT,
};

impl Graph {
    /// Make `root` reactive, wrapping every eligible container reachable
    /// through data slots.
    ///
    /// Idempotent: wrapping an already wrapped value returns it unchanged.
    /// Values that are not eligible under `allow` are returned as they are.
    pub fn wrap(&mut self, root: &Value, allow: &AllowList) -> Value {
        let allow = Rc::new(allow.clone());
        if let Some(id) = self.wrappable(root, &allow) {
            self.wrap_node(id, None, &allow);
        }
        root.clone()
    }

    /// [`wrap`](Self::wrap) using the allow-list from the graph's
    /// configuration.
    pub fn wrap_default(&mut self, root: &Value) -> Value {
        let allow = Rc::clone(self.default_allow());
        if let Some(id) = self.wrappable(root, &allow) {
            self.wrap_node(id, None, &allow);
        }
        root.clone()
    }

    fn wrap_node(&mut self, id: NodeId, parent: Option<NodeId>, allow: &Rc<AllowList>) {
        let node = self.node_mut(id);
        if let Some(meta) = node.reactive.as_mut() {
            if let Some(parent) = parent {
                meta.add_parent(parent);
            }
            return;
        }

        let mut meta = Reactive::new(Rc::clone(allow));
        if let Some(parent) = parent {
            meta.add_parent(parent);
        }
        node.reactive = Some(meta);
        trace!(node = id.raw(), "wrapped");

        let children: Vec<NodeId> = self
            .node(id)
            .data_entries()
            .filter_map(|(_, child)| self.wrappable(child, allow))
            .collect();
        for child in children {
            self.wrap_node(child, Some(id), allow);
        }
    }

    /// Assign `value` to `key` on `target`.
    ///
    /// On a wrapped target this diffs the old and new value and fires every
    /// affected handler before returning.
    pub fn set(&mut self, target: &Value, key: impl Into<Key>, value: Value) -> Result<()> {
        let id = self.container(target)?;
        let key = self.checked_key(id, key.into())?;

        if let Some(accessor) = self.find_accessor(id, &key) {
            return match accessor.set {
                Some(set) => set(self, target, value),
                None => Err(Error::ReadOnly { key }),
            };
        }

        match self.node(id).reactive.as_ref().map(|meta| Rc::clone(meta.allow())) {
            Some(allow) => self.write(id, key, value, allow),
            None => self.assign(id, key, value),
        }
    }

    /// Remove `key` from `target`.
    ///
    /// Notifies exactly like assigning [`Value::Absent`], then drops the key
    /// (keyed containers) or leaves an absent hole (sequences). Returns
    /// `false` without doing anything when the property is an accessor.
    pub fn delete(&mut self, target: &Value, key: impl Into<Key>) -> Result<bool> {
        let id = self.container(target)?;
        let key = self.checked_key(id, key.into())?;

        if self.find_accessor(id, &key).is_some() {
            return Ok(false);
        }
        if !self.node(id).has_own(&key) && matches!(self.node(id).body, Body::Sequence(_)) {
            return Ok(true);
        }

        if let Some(allow) = self.node(id).reactive.as_ref().map(|meta| Rc::clone(meta.allow())) {
            self.write(id, key.clone(), Value::Absent, allow)?;
        }

        match &mut self.node_mut(id).body {
            Body::Keyed(map) => {
                map.shift_remove(&key);
            }
            Body::Sequence(items) => {
                if let Some(slot) = key.as_index().and_then(|i| items.get_mut(i)) {
                    *slot = Value::Absent;
                }
            }
        }
        Ok(true)
    }

    /// Append `value` to a sequence.
    pub fn push(&mut self, target: &Value, value: Value) -> Result<()> {
        let id = self.container(target)?;
        let Body::Sequence(items) = &self.node(id).body else {
            return Err(Error::NotASequence);
        };
        let index = items.len();
        self.set(target, index, value)
    }

    /// Normalize `key` for `id` and reject keys no slot can have: names on
    /// sequences and indices past the array-index range.
    fn checked_key(&self, id: NodeId, key: Key) -> Result<Key> {
        let key = self.key_for(id, key);
        match (&self.node(id).body, &key) {
            (Body::Sequence(_), Key::Name(_)) => Err(Error::InvalidKey { key }),
            (Body::Sequence(_), Key::Index(i)) if *i >= INDEX_LIMIT => {
                Err(Error::InvalidKey { key })
            }
            _ => Ok(key),
        }
    }

    /// Plain assignment to an own data slot.
    fn assign(&mut self, id: NodeId, key: Key, value: Value) -> Result<()> {
        match &mut self.node_mut(id).body {
            Body::Keyed(map) => {
                map.insert(key, Slot::Data(value));
            }
            Body::Sequence(items) => {
                let Some(index) = key.as_index() else {
                    return Err(Error::InvalidKey { key });
                };
                let Some(len) = index.checked_add(1) else {
                    return Err(Error::InvalidKey { key });
                };
                if len > items.len() {
                    items.resize(len, Value::Absent);
                }
                items[index] = value;
            }
        }
        Ok(())
    }

    fn write(&mut self, id: NodeId, key: Key, value: Value, allow: Rc<AllowList>) -> Result<()> {
        let old = self.data_value(id, &key);
        let superseded = old
            .as_node()
            .filter(|&old_id| self.node(old_id).is_reactive())
            .filter(|&old_id| value.as_node() != Some(old_id));

        if let Some(new_id) = self.wrappable(&value, &allow) {
            self.wrap_node(new_id, Some(id), &allow);
        }

        let mut ctx = MutationContext::new(allow);
        let changed = self.detect(&mut ctx, id, &key, &old, &value);
        trace!(node = id.raw(), %key, changed, "write");

        self.assign(id, key, value)?;

        if let Some(old_id) = superseded {
            let still_held = self
                .node(id)
                .data_entries()
                .any(|(_, v)| v.as_node() == Some(old_id));
            if !still_held {
                if let Some(meta) = self.node_mut(old_id).reactive.as_mut() {
                    meta.remove_parent(id);
                }
            }
        }

        if changed {
            self.propagate_to_ancestors(&mut ctx, id);
        }
        self.fire(ctx.finish());

        if let Some(old_id) = superseded {
            self.rebind_detached(old_id);
        }
        Ok(())
    }
}
