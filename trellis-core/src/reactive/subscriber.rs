//! Subscriber types for the reactive system.
//!
//! A subscription pairs a getter, which locates the edge being watched, with
//! the callback to run when that edge changes. The graph keeps one
//! [`Binding`] per live subscription recording which edge it currently
//! occupies.

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::graph::{Edge, Graph};

use super::Tracker;

/// Unique identifier for a handler.
///
/// Ids are handed out per graph and never reused. They are what the
/// scheduler deduplicates on and what the firing stack records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for HandlerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type-erased subscription getter.
pub(crate) type Resolve = Rc<dyn Fn(&Tracker<'_>) -> Result<()>>;

/// User callback run after the watched edge changed.
pub(crate) type Callback = Rc<dyn Fn(&mut Graph) -> Result<()>>;

/// The immutable half of a subscription.
pub(crate) struct Subscription {
    pub(crate) resolve: Resolve,
    pub(crate) callback: Callback,
}

/// A live subscription and the edge it is bound to.
pub(crate) struct Binding {
    pub(crate) subscription: Rc<Subscription>,
    pub(crate) edge: Edge,
    /// Whether the getter completed the last time it ran.
    pub(crate) found: bool,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("edge", &self.edge)
            .field("found", &self.found)
            .finish()
    }
}

/// Handle returned by [`Graph::subscribe`].
///
/// Dropping it does not end the subscription; call
/// [`unsubscribe`](Self::unsubscribe).
#[must_use = "the subscription stays active until `unsubscribe` is called"]
#[derive(Debug)]
pub struct Unsubscribe {
    handler: HandlerId,
}

impl Unsubscribe {
    pub(crate) fn new(handler: HandlerId) -> Self {
        Self { handler }
    }

    /// Id of the handler this subscription registered.
    pub fn handler(&self) -> HandlerId {
        self.handler
    }

    /// Remove the handler from whatever edge it occupies. The callback is
    /// never invoked again.
    pub fn unsubscribe(self, graph: &mut Graph) {
        graph.unsubscribe(self.handler);
    }
}
