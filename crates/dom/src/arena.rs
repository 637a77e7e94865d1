//! Arena-based tree storage
//!
//! ## Memory Layout
//!
//! ```text
//! Tree: Vec<Option<Node>>
//!       [Root][Node1][None][Node3]...
//!        ↑ 4-byte index, not a pointer. `None` marks a released slot.
//! ```
//!
//! Every node of a tree lives in its arena, attached or not. "Connected"
//! means reachable from the root; only connected nodes are in the identity
//! index. Slots are never reused, so a stale `NodeId` just stops resolving.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{DomError, Result};
use crate::types::{ElementData, Node, NodeData, NodeId};

/// Tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Arena slots reserved up front
    pub initial_capacity: usize,
    /// Tag of the root element
    pub root_tag: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            root_tag: "html".to_string(),
        }
    }
}

/// A document tree
///
/// Design:
/// - Single Vec of slots for sequential allocation
/// - HashMap for id → NodeId lookup, covering connected nodes only
/// - The root is created with the tree and can never be moved or released
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
    id_index: AHashMap<String, NodeId>,
    root_id: NodeId,
}

impl Tree {
    /// Create a tree with the default config
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        let mut nodes = Vec::with_capacity(config.initial_capacity.max(1));
        nodes.push(Some(Node::new(
            0,
            NodeData::Element(ElementData::new(config.root_tag)),
        )));
        Self {
            nodes,
            id_index: AHashMap::with_capacity(config.initial_capacity),
            root_id: 0,
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn root(&self) -> &Node {
        match self.nodes.get(self.root_id as usize) {
            Some(Some(node)) => node,
            // Root slot is written in the constructor and never released.
            _ => unreachable!("tree root slot is always occupied"),
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(Some(Node::new(node_id, data)));
        node_id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(data.into()))
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&Node> {
        self.node(node_id).ok_or(DomError::NodeNotFound(node_id))
    }

    pub(crate) fn get_mut(&mut self, node_id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(node_id as usize)
            .and_then(Option::as_mut)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID, absence as `None`
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(node_id as usize).and_then(Option::as_ref)
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.node(node_id).is_some()
    }

    /// Number of live nodes, attached or not
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Always false: a tree has at least its root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Identity lookup over connected nodes
    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    /// Whether the node is reachable from the root
    pub fn is_connected(&self, node_id: NodeId) -> bool {
        let mut current = Some(node_id);
        while let Some(id) = current {
            if id == self.root_id {
                return true;
            }
            current = self.node(id).and_then(|node| node.parent_id);
        }
        false
    }

    /// Pre-order iterator over `start` and everything below it
    pub fn descendants(&self, start: NodeId) -> Descendants<'_> {
        let stack = if self.contains(start) {
            vec![start]
        } else {
            Vec::new()
        };
        Descendants { tree: self, stack }
    }

    /// All elements below the root matching `predicate`, in document order
    ///
    /// Text and comment nodes are never offered to the predicate. The result
    /// is a snapshot.
    pub fn query_all<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.descendants(self.root_id)
            .filter(|node| node.is_element() && predicate(node))
            .map(|node| node.node_id)
            .collect()
    }

    /// First element in document order matching `predicate`
    pub fn query_first<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.descendants(self.root_id)
            .find(|node| node.is_element() && predicate(node))
            .map(|node| node.node_id)
    }

    /// Elements carrying the class token
    pub fn elements_by_class(&self, token: &str) -> Vec<NodeId> {
        self.query_all(|node| node.has_class(token))
    }

    /// Elements with the tag name (ASCII case-insensitive)
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.query_all(|node| node.has_tag(tag))
    }

    /// Free a detached subtree
    ///
    /// Handles into the released subtree stop resolving. Listener
    /// registrations elsewhere are not touched.
    pub fn release(&mut self, node_id: NodeId) -> Result<()> {
        let node = self.get(node_id)?;
        if node_id == self.root_id || node.parent_id.is_some() {
            return Err(DomError::HierarchyRequest(format!(
                "node {node_id} is attached and cannot be released"
            )));
        }

        let subtree: Vec<NodeId> = self.subtree_ids(node_id);
        for id in &subtree {
            if let Some(slot) = self.nodes.get_mut(*id as usize) {
                *slot = None;
            }
        }
        tracing::debug!("Released subtree at {} ({} nodes)", node_id, subtree.len());
        Ok(())
    }

    pub(crate) fn subtree_ids(&self, start: NodeId) -> Vec<NodeId> {
        self.descendants(start).map(|node| node.node_id).collect()
    }

    // Identity index maintenance. Callers validate first, so these never fail.

    pub(crate) fn index_subtree(&mut self, start: NodeId) {
        let entries: Vec<(String, NodeId)> = self
            .descendants(start)
            .filter_map(|node| node.id.clone().map(|id| (id, node.node_id)))
            .collect();
        self.id_index.extend(entries);
    }

    pub(crate) fn unindex_subtree(&mut self, start: NodeId) {
        let entries: Vec<(String, NodeId)> = self
            .descendants(start)
            .filter_map(|node| node.id.clone().map(|id| (id, node.node_id)))
            .collect();
        for (id, node_id) in entries {
            if self.id_index.get(&id) == Some(&node_id) {
                self.id_index.remove(&id);
            }
        }
    }

    pub(crate) fn index_entry(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn set_index_entry(&mut self, id: String, node_id: NodeId) {
        self.id_index.insert(id, node_id);
    }

    pub(crate) fn remove_index_entry(&mut self, id: &str, node_id: NodeId) {
        if self.id_index.get(id) == Some(&node_id) {
            self.id_index.remove(id);
        }
    }

    #[cfg(test)]
    pub(crate) fn index_len(&self) -> usize {
        self.id_index.len()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first pre-order walk (iterative, no recursion)
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node_id) = self.stack.pop() {
            let Some(node) = self.tree.node(node_id) else {
                continue;
            };
            // Push children in reverse order (so they're visited left-to-right)
            self.stack.extend(node.children_ids.iter().rev().copied());
            return Some(node);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree_has_root_element() {
        let tree = Tree::new();

        assert_eq!(tree.root_id(), 0);
        assert!(tree.root().has_tag("html"));
        assert_eq!(tree.len(), 1);
        assert!(tree.is_connected(tree.root_id()));
    }

    #[test]
    fn test_created_nodes_are_detached() {
        let mut tree = Tree::new();
        let div = tree.create_element("div");
        let text = tree.create_text("hi");

        assert_eq!(tree.get(div).unwrap().parent_id(), None);
        assert!(!tree.is_connected(div));
        assert!(!tree.is_connected(text));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_query_all_document_order() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        let a = tree.create_element("section");
        let b = tree.create_element("p");
        let c = tree.create_element("p");
        let t = tree.create_text("skip me");
        tree.append_child(root, a).unwrap();
        tree.append_child(a, b).unwrap();
        tree.append_child(a, t).unwrap();
        tree.append_child(root, c).unwrap();

        assert_eq!(tree.query_all(|_| true), vec![root, a, b, c]);
        assert_eq!(tree.elements_by_tag("P"), vec![b, c]);
        assert_eq!(tree.query_first(|n| n.has_tag("p")), Some(b));
        assert_eq!(tree.query_all(|_| true), tree.query_all(|_| true));
    }

    #[test]
    fn test_query_ignores_detached_nodes() {
        let mut tree = Tree::new();
        let loose = tree.create_element("div");
        tree.add_class(loose, "x").unwrap();

        assert!(tree.elements_by_class("x").is_empty());
    }

    #[test]
    fn test_release_detached_subtree() {
        let mut tree = Tree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("span");
        tree.append_child(outer, inner).unwrap();

        tree.release(outer).unwrap();

        assert!(!tree.contains(outer));
        assert!(!tree.contains(inner));
        assert!(matches!(tree.get(inner), Err(DomError::NodeNotFound(_))));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_release_attached_node_fails() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        let div = tree.create_element("div");
        tree.append_child(root, div).unwrap();

        assert!(matches!(
            tree.release(div),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(
            tree.release(root),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(tree.contains(div));
    }

    #[test]
    fn test_config_root_tag() {
        let tree = Tree::with_config(TreeConfig {
            initial_capacity: 4,
            root_tag: "body".to_string(),
        });
        assert_eq!(tree.root().tag_name(), Some("body"));
    }
}
