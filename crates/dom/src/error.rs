//! Error types for tree operations
//!
//! Flat error hierarchy. Queries never produce these: absence is `None`.

use thiserror::Error;

use crate::types::{NodeId, NodeType};

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid node kind for {operation}: expected Element, got {actual}")]
    InvalidKind {
        operation: &'static str,
        actual: NodeType,
    },

    #[error("Node {child} is not a child of node {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Duplicate id: {0:?}")]
    DuplicateId(String),

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}
