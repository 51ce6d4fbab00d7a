//! JSON import and export of graph values.

use std::collections::HashSet;

use serde_json::{Map, Number};

use super::node::{Body, Node, NodeId, Slot};
use super::value::{Key, Value};
use super::Graph;
use crate::error::{Error, Result};

impl Graph {
    /// Build raw (unwrapped) containers mirroring `json`.
    ///
    /// Object keys keep their source order; numbers become `f64`.
    pub fn insert_json(&mut self, json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s.as_str()),
            serde_json::Value::Array(items) => {
                let items = items.iter().map(|item| self.insert_json(item)).collect::<Vec<_>>();
                self.array(items)
            }
            serde_json::Value::Object(map) => {
                let mut node = Node::keyed(None);
                if let Body::Keyed(slots) = &mut node.body {
                    for (key, item) in map {
                        let value = self.insert_json(item);
                        slots.insert(Key::from(key.as_str()), Slot::Data(value));
                    }
                }
                self.alloc(node)
            }
        }
    }

    /// Snapshot `value` as JSON.
    ///
    /// Absent entries are omitted from keyed containers and rendered as
    /// `null` inside sequences. Accessor properties are skipped. Shared
    /// containers are duplicated; a container reachable from itself fails
    /// with [`Error::Cycle`].
    pub fn to_json(&self, value: &Value) -> Result<serde_json::Value> {
        self.export(value, &mut HashSet::new())
    }

    fn export(&self, value: &Value, path: &mut HashSet<NodeId>) -> Result<serde_json::Value> {
        let id = match value {
            Value::Absent | Value::Null => return Ok(serde_json::Value::Null),
            Value::Bool(b) => return Ok(serde_json::Value::Bool(*b)),
            Value::Number(n) => return Ok(number(*n)),
            Value::String(s) => return Ok(serde_json::Value::String(s.to_string())),
            Value::Object(id) => *id,
        };

        if !path.insert(id) {
            return Err(Error::Cycle);
        }

        let node = self.node(id);
        let json = match &node.body {
            Body::Sequence(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| self.export(item, path))
                    .collect::<Result<_>>()?,
            ),
            Body::Keyed(_) => {
                let mut map = Map::new();
                for (key, item) in node.data_entries() {
                    if item.is_absent() {
                        continue;
                    }
                    map.insert(key.to_string(), self.export(item, path)?);
                }
                serde_json::Value::Object(map)
            }
        };

        path.remove(&id);
        Ok(json)
    }
}

/// Integral values inside the exactly representable range export as JSON
/// integers; non-finite values export as `null`.
fn number(n: f64) -> serde_json::Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() < MAX_SAFE {
        serde_json::Value::from(n as i64)
    } else {
        Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}
