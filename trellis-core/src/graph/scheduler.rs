//! Handler Scheduler
//!
//! Runs the handlers a write scheduled, after the write has committed.
//!
//! # Algorithm
//!
//! 1. The change detector and ancestor propagator collect handler ids into
//!    an insertion-ordered set, so a handler marked through several edges
//!    fires once, at the position it was first marked.
//! 2. Each handler is pushed onto the graph's firing stack, invoked, and
//!    popped again whatever the outcome.
//! 3. A handler that is already on the stack has retriggered itself through
//!    the data it observes. That invocation is skipped and reported instead
//!    of recursing forever.
//! 4. Failures (errors and panics) are reported to the sink; the rest of the
//!    batch still runs.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use indexmap::IndexSet;
use tracing::trace;

use super::Graph;
use crate::error::Error;
use crate::reactive::HandlerId;

impl Graph {
    /// Fire every handler in `scheduled`, in order.
    pub(crate) fn fire(&mut self, scheduled: IndexSet<HandlerId>) {
        if scheduled.is_empty() {
            return;
        }
        trace!(count = scheduled.len(), depth = self.firing.len(), "firing handlers");

        for handler in scheduled {
            if self.firing.contains(&handler) {
                self.report(&Error::Reentrant { handler });
                continue;
            }

            let depth = self.firing.len();
            self.firing.push(handler);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_handler(handler)));
            self.firing.truncate(depth);

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(error)) => self.report(&error),
                Err(payload) => self.report(&Error::HandlerPanicked {
                    handler,
                    message: panic_message(payload.as_ref()),
                }),
            }
        }
    }

    /// Whether `handler` is currently executing.
    pub fn is_firing(&self, handler: HandlerId) -> bool {
        self.firing.contains(&handler)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
