//! Graph configuration.
//!
//! Everything here has a default, so an empty JSON object is a valid
//! configuration:
//!
//! ```json
//! { "allow_list": ["Point", "Vector"], "sink": "stderr" }
//! ```

use std::rc::Rc;

use serde::Deserialize;

use crate::error::Result;
use crate::graph::AllowList;
use crate::sink::{ErrorSink, SilentSink, StderrSink, TracingSink};

/// Settings applied when a [`Graph`](crate::Graph) is created.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    /// Named classes `wrap_default` treats as wrappable, in addition to
    /// plain containers.
    #[serde(default)]
    pub allow_list: AllowList,

    /// Where handler failures are reported.
    #[serde(default)]
    pub sink: SinkKind,
}

impl GraphConfig {
    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The built-in error sinks, selectable by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Tracing,
    Stderr,
    Silent,
}

impl SinkKind {
    pub(crate) fn build(self) -> Rc<dyn ErrorSink> {
        match self {
            Self::Tracing => Rc::new(TracingSink),
            Self::Stderr => Rc::new(StderrSink),
            Self::Silent => Rc::new(SilentSink),
        }
    }
}
