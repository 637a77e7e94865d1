//! Cyclic sibling cursor
//!
//! Steps through a parent's element children one at a time ("show next /
//! previous item"). Two states:
//!
//! ```text
//!   Empty ──initialize(parent with elements)──► Positioned(0)
//!   Positioned(i) ──advance──► Positioned((i + 1) mod len)
//!   Positioned(i) ──retreat──► Positioned((i + len - 1) mod len)
//!   any ──initialize(parent without elements)──► Empty
//! ```
//!
//! The sequence is a snapshot taken at `initialize`; later mutations of the
//! parent are not seen until the cursor is initialized again.

use serde::{Deserialize, Serialize};

use crate::arena::Tree;
use crate::types::NodeId;

/// What happens when stepping past either end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WrapPolicy {
    /// Past the last element comes the first, and vice versa
    #[default]
    Wrap,
    /// Stay on the first/last element
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Empty,
    Positioned(usize),
}

#[derive(Debug, Clone)]
pub struct Cursor {
    sequence: Vec<NodeId>,
    state: CursorState,
    policy: WrapPolicy,
}

impl Cursor {
    /// Empty cursor with wraparound
    pub fn new() -> Self {
        Self::with_policy(WrapPolicy::Wrap)
    }

    pub fn with_policy(policy: WrapPolicy) -> Self {
        Self {
            sequence: Vec::new(),
            state: CursorState::Empty,
            policy,
        }
    }

    /// Cursor over `parent`'s element children, positioned on the first
    pub fn over(tree: &Tree, parent: NodeId) -> Self {
        let mut cursor = Self::new();
        cursor.initialize(tree, parent);
        cursor
    }

    /// Snapshot `parent`'s element children and move to the first one
    pub fn initialize(&mut self, tree: &Tree, parent: NodeId) {
        self.sequence = tree.element_children_of(parent);
        self.state = if self.sequence.is_empty() {
            CursorState::Empty
        } else {
            CursorState::Positioned(0)
        };
        tracing::trace!("Cursor over {} ({} elements)", parent, self.sequence.len());
    }

    /// Step forward; returns the new current element
    pub fn advance(&mut self) -> Option<NodeId> {
        if let CursorState::Positioned(position) = self.state {
            let len = self.sequence.len();
            let next = match self.policy {
                WrapPolicy::Wrap => (position + 1) % len,
                WrapPolicy::Clamp => (position + 1).min(len - 1),
            };
            self.state = CursorState::Positioned(next);
        }
        self.current()
    }

    /// Step backward; returns the new current element
    pub fn retreat(&mut self) -> Option<NodeId> {
        if let CursorState::Positioned(position) = self.state {
            let len = self.sequence.len();
            let previous = match self.policy {
                WrapPolicy::Wrap => (position + len - 1) % len,
                WrapPolicy::Clamp => position.saturating_sub(1),
            };
            self.state = CursorState::Positioned(previous);
        }
        self.current()
    }

    pub fn current(&self) -> Option<NodeId> {
        match self.state {
            CursorState::Positioned(position) => self.sequence.get(position).copied(),
            CursorState::Empty => None,
        }
    }

    /// Jump to `node_id` if it is part of the sequence
    pub fn seek(&mut self, node_id: NodeId) -> bool {
        match self.sequence.iter().position(|&id| id == node_id) {
            Some(position) => {
                self.state = CursorState::Positioned(position);
                true
            }
            None => false,
        }
    }

    pub fn position(&self) -> Option<usize> {
        match self.state {
            CursorState::Positioned(position) => Some(position),
            CursorState::Empty => None,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn policy(&self) -> WrapPolicy {
        self.policy
    }

    pub fn sequence(&self) -> &[NodeId] {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}
