//! Synchronous event listeners for `dom-tree`
//!
//! Listeners are registered per `(node, event name)` and run in registration
//! order when the pair is dispatched. Each listener gets the event (target,
//! name, opaque JSON payload) and a `DispatchContext` holding the tree, so
//! state lives in the tree rather than in closures.
//!
//! ```text
//! input device → EventBus::dispatch(tree, node, "click", payload)
//!                      │
//!                      ├─► listener 1 (ctx.tree_mut() → mutator)
//!                      ├─► listener 2 (ctx.dispatch(...) → nested chain runs to completion)
//!                      └─► DispatchReport { invoked, failures }
//! ```
//!
//! The tree never notifies the bus on its own: mutation and dispatch are
//! separate, and reactive behavior must be layered on explicitly.

pub mod bus;
pub mod error;
pub mod event;

pub use bus::{DispatchContext, EventBus, EventBusConfig, Listener};
pub use error::{ListenerError, ListenerResult};
pub use event::{DispatchReport, Event, ListenerId, CLICK, MOUSEOVER};
