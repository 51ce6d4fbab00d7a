//! Values stored in graph slots.
//!
//! Primitives are held inline; containers live in the [`Graph`](super::Graph)
//! arena and are referenced by [`NodeId`].

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use super::node::{Kind, NodeId};

/// Highest sequence index plus one. Writes at or past it are rejected.
pub(crate) const INDEX_LIMIT: usize = u32::MAX as usize;

/// Property key of a container slot.
///
/// Keyed containers store every key as [`Key::Name`], so `Index(0)` and
/// `Name("0")` address the same slot. Sequences store [`Key::Index`] and
/// accept a `Name` only when it is a canonical decimal index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Name(Rc<str>),
    Index(usize),
}

impl Key {
    /// The index, if this key addresses a sequence slot.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Name(_) => None,
        }
    }

    /// The form this key takes on a container of `kind`.
    pub(crate) fn normalized(self, kind: Kind) -> Self {
        match (kind, self) {
            (Kind::Keyed, Self::Index(i)) => Self::Name(Rc::from(i.to_string())),
            (Kind::Sequence, Self::Name(name)) => match canonical_index(&name) {
                Some(i) => Self::Index(i),
                None => Self::Name(name),
            },
            (_, key) => key,
        }
    }
}

fn canonical_index(name: &str) -> Option<usize> {
    let index: usize = name.parse().ok()?;
    (index < INDEX_LIMIT && index.to_string() == name).then_some(index)
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(Rc::from(name))
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(Rc::from(name))
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

/// A value held by a slot.
///
/// `PartialEq` is strict identity: primitives compare by value (so `NaN`
/// never equals itself) and containers compare by node handle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The missing-property sentinel.
    #[default]
    Absent,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Object(NodeId),
}

impl Value {
    /// Strict identity comparison.
    pub fn same(&self, other: &Value) -> bool {
        self == other
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The container handle, if this value is a container.
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Rc::from(s))
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Self::Object(id)
    }
}

/// Class names whose instances may be wrapped in addition to plain
/// (unnamed) containers.
///
/// Instances of any other named class are treated as opaque leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AllowList(Vec<String>);

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class name to the list.
    pub fn with(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.contains(&class) {
            self.0.push(class);
        }
        self
    }

    pub fn contains(&self, class: &str) -> bool {
        self.0.iter().any(|c| c == class)
    }

    /// Whether a container of the given class is eligible for wrapping.
    pub fn admits(&self, class: Option<&str>) -> bool {
        class.map_or(true, |c| self.contains(c))
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |list, class| list.with(class))
    }
}
