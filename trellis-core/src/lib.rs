//! Trellis Core
//!
//! This crate provides reactive proxy state: an object graph whose
//! containers can be wrapped so that writes to them notify subscribers
//! watching exactly the properties that changed.
//!
//! It implements:
//!
//! - An arena of keyed containers and sequences with shared references,
//!   cycles, prototypes and accessor properties
//! - Structural change detection between old and new values
//! - Propagation of changes to every ancestor path of a written node
//! - Path subscriptions that follow their target across replacements
//! - A binding for host frameworks with effect/reducer hooks
//!
//! # Architecture
//!
//! - `graph`: the arena, untracked reads, change detection and the handler
//!   scheduler
//! - `reactive`: wrapping, intercepted writes, read tracking and
//!   subscriptions
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use trellis_core::{AllowList, Graph, Value};
//!
//! let mut graph = Graph::new();
//! let raw = graph.insert_json(&serde_json::json!({"a": {"b": {"c": 1}, "d": 1}}));
//! let state = graph.wrap(&raw, &AllowList::new());
//!
//! let fired = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&fired);
//! let root = state.clone();
//! let _subscription = graph
//!     .subscribe(
//!         move |t| t.path(&root, ["a", "b", "c"]),
//!         move |_| {
//!             counter.set(counter.get() + 1);
//!             Ok(())
//!         },
//!     )
//!     .unwrap();
//!
//! // Unrelated siblings do not notify.
//! let a = graph.get(&state, "a").unwrap();
//! graph.set(&a, "d", Value::from(2)).unwrap();
//! assert_eq!(fired.get(), 0);
//!
//! // Replacing `a.b` with a different `c` does.
//! let b = graph.insert_json(&serde_json::json!({"c": 2}));
//! graph.set(&a, "b", b).unwrap();
//! assert_eq!(fired.get(), 1);
//! ```

pub mod graph;
pub mod reactive;

mod config;
mod error;
mod hook;
mod sink;

pub use config::{GraphConfig, SinkKind};
pub use error::{Error, Result};
pub use graph::{Accessor, AllowList, Edge, Graph, Key, Kind, Node, NodeId, Value};
pub use hook::{
    create_use_subscribe_hook, EffectCleanup, EffectFn, ForceUpdate, Reducer, Rerender,
    SubscribeHook,
};
pub use reactive::{HandlerId, Tracker, Unsubscribe};
pub use sink::{CollectingSink, ErrorSink, SilentSink, StderrSink, TracingSink};
