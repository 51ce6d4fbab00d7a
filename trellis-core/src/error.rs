//! Error types shared by the whole crate.

use thiserror::Error;

use crate::graph::Key;
use crate::reactive::HandlerId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while reading, writing or notifying.
#[derive(Debug, Error)]
pub enum Error {
    /// A property was read on something that is not a container, e.g.
    /// `a.b.c` while `a.b` is absent.
    ///
    /// Subscriptions treat this as "path not found" and recover from it.
    #[error("cannot read property `{key}` of a non-container value")]
    Unresolved { key: Key },

    /// `set`/`delete` was called on something that is not a container.
    #[error("target is not a container")]
    NotAContainer,

    /// An append was attempted on a keyed container.
    #[error("target is not a sequence")]
    NotASequence,

    /// A named key was used to index a sequence.
    #[error("key `{key}` cannot index a sequence")]
    InvalidKey { key: Key },

    /// Assignment to an accessor property that has no setter.
    #[error("property `{key}` is a getter-only accessor")]
    ReadOnly { key: Key },

    /// A subscription getter finished without reading any reactive edge.
    #[error("subscription getter did not read any reactive property")]
    Untracked,

    /// A handler caused itself to be scheduled again while it was running.
    #[error("handler {handler} retriggered itself: infinite loop")]
    Reentrant { handler: HandlerId },

    /// A handler panicked while firing.
    #[error("handler {handler} panicked: {message}")]
    HandlerPanicked { handler: HandlerId, message: String },

    /// A cyclic value cannot be snapshotted to JSON.
    #[error("value contains a cycle and cannot be exported")]
    Cycle,

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Failure raised by caller-supplied code (getters, callbacks, setters).
    #[error(transparent)]
    External(Box<dyn std::error::Error + 'static>),
}

impl Error {
    /// Wrap an arbitrary error coming out of user code.
    pub fn external<E>(error: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::External(Box::new(error))
    }

    /// Build an external error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        #[derive(Debug, Error)]
        #[error("{0}")]
        struct Message(String);

        Self::External(Box::new(Message(message.into())))
    }

    /// Whether this error means "an intermediate path segment was absent".
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }
}
