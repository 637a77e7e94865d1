//! Event values and dispatch results

use dom_tree::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ListenerError;

pub const CLICK: &str = "click";
pub const MOUSEOVER: &str = "mouseover";

/// What a listener receives. Immutable for the duration of the dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Node the event was dispatched on
    pub target: NodeId,
    pub name: String,
    /// Opaque data from whoever triggered the event
    pub payload: Value,
}

/// Handle returned by `EventBus::add_listener`, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Outcome of one dispatch
///
/// Every registered listener runs even when an earlier one fails; failures
/// are collected here in invocation order.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub invoked: usize,
    pub failures: Vec<(ListenerId, ListenerError)>,
}

impl DispatchReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn first_failure(&self) -> Option<&ListenerError> {
        self.failures.first().map(|(_, err)| err)
    }

    /// Number of listeners run, or the first failure
    pub fn into_result(self) -> Result<usize, ListenerError> {
        match self.failures.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(self.invoked),
        }
    }
}
