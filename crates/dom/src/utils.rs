//! Utility functions for tree inspection

use crate::arena::Tree;
use crate::types::{NodeData, NodeId};

/// Cap text length (in characters) to keep debug output readable
pub fn cap_text_length(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Concatenated text of a node
///
/// Elements yield all descendant text nodes in document order (comments
/// excluded); text and comment nodes yield their own payload. Unknown
/// handles yield an empty string.
pub fn text_content(tree: &Tree, node_id: NodeId) -> String {
    let Some(node) = tree.node(node_id) else {
        return String::new();
    };

    match node.data() {
        NodeData::Text(text) | NodeData::Comment(text) => text.clone(),
        NodeData::Element(_) => tree
            .descendants(node_id)
            .filter_map(|node| node.text())
            .collect(),
    }
}
