//! Error sinks.
//!
//! Handler failures never propagate out of the write that triggered them.
//! They are handed to the graph's [`ErrorSink`] instead, together with
//! reentrant-handler reports and failed silent rebinds.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::error;

use crate::error::Error;

/// Receiver of errors raised while firing handlers.
pub trait ErrorSink {
    fn report(&self, error: &Error);
}

/// Emits each error as a `tracing` error event. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, err: &Error) {
        error!(error = %err, "reactive handler failed");
    }
}

/// Writes each error to standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl ErrorSink for StderrSink {
    fn report(&self, error: &Error) {
        eprintln!("trellis: {error}");
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl ErrorSink for SilentSink {
    fn report(&self, _error: &Error) {}
}

/// Keeps the rendered message of every reported error.
///
/// Clones share the same buffer, so one clone can be installed on a graph
/// and another kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    messages: Rc<RefCell<Vec<String>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages reported so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}

impl ErrorSink for CollectingSink {
    fn report(&self, error: &Error) {
        self.messages.borrow_mut().push(error.to_string());
    }
}
