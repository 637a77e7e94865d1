//! Core node types
//!
//! Key design principles:
//! 1. Nodes are addressed by `NodeId` (index into the tree arena), never by pointer
//! 2. `parent_id` is a back-reference only; ownership flows through `children_ids`
//! 3. The node kind is a closed enum, so kind checks are exhaustive matches
//! 4. SmallVec for children (most elements have few)

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Node identifier (index into the tree arena)
///
/// Handles are never reused within a tree, so a handle to a released node
/// simply stops resolving.
pub type NodeId = u32;

/// The closed set of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Element,
    Text,
    Comment,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Element => "Element",
            NodeType::Text => "Text",
            NodeType::Comment => "Comment",
        };
        f.write_str(name)
    }
}

/// Element payload: tag, attributes and class tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementData {
    pub(crate) tag: String,
    pub(crate) attributes: AHashMap<String, String>,
    pub(crate) classes: AHashSet<String>,
}

impl ElementData {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: AHashMap::new(),
            classes: AHashSet::new(),
        }
    }
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
    Comment(String),
}

impl NodeData {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
        }
    }
}

/// A node stored in the tree arena
///
/// Fields are crate-private: structural links may only change through the
/// mutator, which keeps `parent_id` and `children_ids` consistent.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) node_id: NodeId,
    pub(crate) id: Option<String>,
    pub(crate) parent_id: Option<NodeId>,
    pub(crate) children_ids: SmallVec<[NodeId; 4]>,
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) fn new(node_id: NodeId, data: NodeData) -> Self {
        Self {
            node_id,
            id: None,
            parent_id: None,
            children_ids: SmallVec::new(),
            data,
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Identity string, if any
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    pub fn children_ids(&self) -> &[NodeId] {
        &self.children_ids
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn node_type(&self) -> NodeType {
        self.data.node_type()
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element(element) => Some(&element.tag),
            _ => None,
        }
    }

    /// Tag comparison is ASCII case-insensitive
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_name()
            .is_some_and(|own| own.eq_ignore_ascii_case(tag))
    }

    /// Get attribute value. `"id"` reads the node identity.
    pub fn attr(&self, name: &str) -> Option<&str> {
        match &self.data {
            NodeData::Element(_) if name == "id" => self.id(),
            NodeData::Element(element) => element.attributes.get(name).map(|s| s.as_str()),
            _ => None,
        }
    }

    /// Attribute names and values, id excluded, in unspecified order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        let attributes = match &self.data {
            NodeData::Element(element) => Some(&element.attributes),
            _ => None,
        };
        attributes
            .into_iter()
            .flat_map(|map| map.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn has_class(&self, token: &str) -> bool {
        match &self.data {
            NodeData::Element(element) => element.classes.contains(token),
            _ => false,
        }
    }

    /// Class tokens in unspecified order
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        let classes = match &self.data {
            NodeData::Element(element) => Some(&element.classes),
            _ => None,
        };
        classes
            .into_iter()
            .flat_map(|set| set.iter().map(|s| s.as_str()))
    }

    /// Text payload, present only on text nodes
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Comment payload, present only on comment nodes
    pub fn comment(&self) -> Option<&str> {
        match &self.data {
            NodeData::Comment(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, operation: &'static str) -> crate::Result<&mut ElementData> {
        let actual = self.node_type();
        match &mut self.data {
            NodeData::Element(element) => Ok(element),
            _ => Err(crate::DomError::InvalidKind { operation, actual }),
        }
    }
}
