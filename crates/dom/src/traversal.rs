//! Tree traversal
//!
//! Read-only navigation between parent, child and sibling nodes. Nothing here
//! fails: an unknown handle, a missing parent or an end of the sibling list
//! are all reported as `None` (or an empty list).

use crate::arena::Tree;
use crate::types::NodeId;

impl Tree {
    pub fn parent_of(&self, node_id: NodeId) -> Option<NodeId> {
        self.node(node_id)?.parent_id
    }

    /// All children, text and comment nodes included, as a snapshot
    pub fn child_nodes_of(&self, node_id: NodeId) -> Vec<NodeId> {
        self.node(node_id)
            .map(|node| node.children_ids.to_vec())
            .unwrap_or_default()
    }

    /// Element children only, as a snapshot
    pub fn element_children_of(&self, node_id: NodeId) -> Vec<NodeId> {
        self.child_nodes_of(node_id)
            .into_iter()
            .filter(|&id| self.is_element(id))
            .collect()
    }

    /// First child of any kind
    pub fn first_child(&self, node_id: NodeId) -> Option<NodeId> {
        self.node(node_id)?.children_ids.first().copied()
    }

    /// Last child of any kind
    pub fn last_child(&self, node_id: NodeId) -> Option<NodeId> {
        self.node(node_id)?.children_ids.last().copied()
    }

    pub fn first_element_child_of(&self, node_id: NodeId) -> Option<NodeId> {
        self.node(node_id)?
            .children_ids
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }

    pub fn last_element_child_of(&self, node_id: NodeId) -> Option<NodeId> {
        self.node(node_id)?
            .children_ids
            .iter()
            .rev()
            .copied()
            .find(|&id| self.is_element(id))
    }

    /// Next sibling of any kind
    pub fn next_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let (siblings, index) = self.sibling_position(node_id)?;
        siblings.get(index + 1).copied()
    }

    /// Previous sibling of any kind
    pub fn previous_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let (siblings, index) = self.sibling_position(node_id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    pub fn next_element_sibling_of(&self, node_id: NodeId) -> Option<NodeId> {
        let (siblings, index) = self.sibling_position(node_id)?;
        siblings[index + 1..]
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }

    pub fn previous_element_sibling_of(&self, node_id: NodeId) -> Option<NodeId> {
        let (siblings, index) = self.sibling_position(node_id)?;
        siblings[..index]
            .iter()
            .rev()
            .copied()
            .find(|&id| self.is_element(id))
    }

    /// Parent, grandparent, ... up to the top of whatever tree holds the node
    pub fn ancestors(&self, node_id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            current: self.parent_of(node_id),
        }
    }

    /// Index of `node_id` among its parent's children
    pub fn index_in_parent(&self, node_id: NodeId) -> Option<usize> {
        self.sibling_position(node_id).map(|(_, index)| index)
    }

    fn sibling_position(&self, node_id: NodeId) -> Option<(&[NodeId], usize)> {
        let parent = self.node(self.parent_of(node_id)?)?;
        let index = parent.children_ids.iter().position(|&id| id == node_id)?;
        Some((&parent.children_ids, index))
    }

    fn is_element(&self, node_id: NodeId) -> bool {
        self.node(node_id).is_some_and(|node| node.is_element())
    }
}

pub struct Ancestors<'a> {
    tree: &'a Tree,
    current: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.tree.parent_of(id);
        Some(id)
    }
}
