//! Reactive Layer
//!
//! This module turns graph containers into reactive nodes and lets callers
//! subscribe to individual properties of them.
//!
//! # Concepts
//!
//! ## Wrapping
//!
//! Wrapping a container marks it, and every eligible container reachable
//! from it, as reactive. Each wrapped node remembers the nodes that hold it
//! (its parents), which is how a change deep in the structure reaches
//! handlers watching a shallower property.
//!
//! ## Edges
//!
//! An edge is a `(node, key)` pair. Handlers are registered per edge and a
//! write marks edges dirty: the written one, every descendant edge whose
//! value actually differs, and every edge on a path from an ancestor down to
//! the written node.
//!
//! ## Subscriptions
//!
//! A subscription is a getter plus a callback. The getter reads a path
//! through a [`Tracker`]; the last reactive edge it touched is the one the
//! subscription binds to. There is no global tracking context, the tracker
//! is passed to the getter explicitly.
//!
//! # Implementation Notes
//!
//! All of this is single-threaded and synchronous. A write detects, fires
//! and rebinds before returning, and handlers may write again, which
//! re-enters the pipeline.

mod context;
mod proxy;
mod subscribe;
mod subscriber;

pub use context::Tracker;
pub use subscriber::{HandlerId, Unsubscribe};

pub(crate) use subscriber::{Binding, Resolve, Subscription};
