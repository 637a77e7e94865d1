//! DOM-style node tree
//!
//! An arena-backed document tree with traversal, queries, mutation and a
//! cyclic sibling cursor. No rendering, no markup parsing: callers build
//! trees through `create_*` + `append_child`, or from a `NodeSnapshot`.
//!
//! ## Core Design
//!
//! ```text
//! NodeSnapshot / create_* → Tree (arena, owns every node) → query / traversal → NodeId
//!                                 ↑                ↓
//!                           mutator (validated, all-or-nothing)
//! ```
//!
//! - **Handles, not pointers**: nodes are addressed by `NodeId` (u32 index)
//! - **One owner**: the `Tree` owns all nodes; `parent_id` is a back-reference
//! - **Closed kinds**: `Element | Text | Comment`, matched exhaustively
//! - **Explicit tree**: there is no ambient document; every call names its `Tree`
//! - **Single-threaded**: no internal locking; serialize access externally

pub mod arena;
pub mod cursor;
pub mod error;
pub mod mutator;
pub mod serializer;
pub mod snapshot;
pub mod traversal;
pub mod types;
pub mod utils;

pub use arena::{Descendants, Tree, TreeConfig};
pub use cursor::{Cursor, CursorState, WrapPolicy};
pub use error::{DomError, Result};
pub use serializer::{DomSerializer, SerializerConfig};
pub use snapshot::NodeSnapshot;
pub use traversal::Ancestors;
pub use types::*;
pub use utils::text_content;
