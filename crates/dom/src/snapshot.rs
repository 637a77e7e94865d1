//! Tree snapshots - build trees from, and dump them to, plain data
//!
//! This handles:
//! - Building a detached subtree from a `NodeSnapshot` (content replacement
//!   without a markup parser)
//! - Building a whole `Tree` from a snapshot or its JSON form
//! - Dumping any subtree back to a snapshot
//!
//! JSON format:
//! ```json
//! {
//!   "type": "element",
//!   "tag": "ul",
//!   "id": "items",
//!   "classes": ["menu"],
//!   "attributes": { "role": "list" },
//!   "children": [
//!     { "type": "element", "tag": "li", "children": [{ "type": "text", "text": "Item 1" }] },
//!     { "type": "comment", "text": "more later" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::arena::{Tree, TreeConfig};
use crate::error::{DomError, Result};
use crate::types::{NodeData, NodeId};

/// Plain-data description of a subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeSnapshot {
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        classes: BTreeSet<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeSnapshot>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    Comment {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl NodeSnapshot {
    /// Element with no id, attributes or classes
    pub fn element(tag: impl Into<String>, children: Vec<NodeSnapshot>) -> Self {
        NodeSnapshot::Element {
            tag: tag.into(),
            id: None,
            attributes: BTreeMap::new(),
            classes: BTreeSet::new(),
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        NodeSnapshot::Text {
            text: text.into(),
            id: None,
        }
    }
}

impl Tree {
    /// Allocate a detached subtree from a snapshot and return its top node
    ///
    /// Identities are checked only once the subtree is attached.
    pub fn build(&mut self, snapshot: &NodeSnapshot) -> NodeId {
        match snapshot {
            NodeSnapshot::Element {
                tag,
                id,
                attributes,
                classes,
                children,
            } => {
                let node_id = self.create_element(tag.clone());
                let child_ids: Vec<NodeId> =
                    children.iter().map(|child| self.build(child)).collect();
                if let Ok(node) = self.get_mut(node_id) {
                    node.id = id.clone().filter(|id| !id.is_empty());
                    if let NodeData::Element(element) = &mut node.data {
                        element.attributes.extend(
                            attributes
                                .iter()
                                .filter(|(name, _)| name.as_str() != "id")
                                .map(|(k, v)| (k.clone(), v.clone())),
                        );
                        element.classes.extend(classes.iter().cloned());
                    }
                    node.children_ids.extend(child_ids.iter().copied());
                }
                for child_id in child_ids {
                    if let Ok(child) = self.get_mut(child_id) {
                        child.parent_id = Some(node_id);
                    }
                }
                node_id
            }
            NodeSnapshot::Text { text, id } => {
                let node_id = self.create_text(text.clone());
                self.set_detached_id(node_id, id);
                node_id
            }
            NodeSnapshot::Comment { text, id } => {
                let node_id = self.create_comment(text.clone());
                self.set_detached_id(node_id, id);
                node_id
            }
        }
    }

    fn set_detached_id(&mut self, node_id: NodeId, id: &Option<String>) {
        if let Ok(node) = self.get_mut(node_id) {
            node.id = id.clone().filter(|id| !id.is_empty());
        }
    }

    /// Build a whole tree; the snapshot's top node becomes the root
    pub fn from_snapshot(snapshot: &NodeSnapshot) -> Result<Self> {
        Self::from_snapshot_with_config(snapshot, TreeConfig::default())
    }

    pub fn from_snapshot_with_config(snapshot: &NodeSnapshot, config: TreeConfig) -> Result<Self> {
        let NodeSnapshot::Element {
            tag,
            id,
            attributes,
            classes,
            children,
        } = snapshot
        else {
            let actual = match snapshot {
                NodeSnapshot::Text { .. } => crate::NodeType::Text,
                _ => crate::NodeType::Comment,
            };
            return Err(DomError::InvalidKind {
                operation: "from_snapshot",
                actual,
            });
        };

        let mut tree = Tree::with_config(TreeConfig {
            root_tag: tag.clone(),
            ..config
        });
        let root = tree.root_id();
        for (name, value) in attributes.iter().filter(|(name, _)| name.as_str() != "id") {
            tree.set_attribute(root, name, value)?;
        }
        for token in classes {
            tree.add_class(root, token)?;
        }
        tree.set_id(root, id.as_deref())?;

        let child_ids: Vec<NodeId> = children.iter().map(|child| tree.build(child)).collect();
        tree.replace_children(root, &child_ids)?;

        tracing::debug!("Built tree from snapshot ({} nodes)", tree.len());
        Ok(tree)
    }

    /// Parse a JSON snapshot into a tree
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: NodeSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(&snapshot)
    }

    /// Dump the subtree rooted at `node_id`
    pub fn snapshot(&self, node_id: NodeId) -> Result<NodeSnapshot> {
        let node = self.get(node_id)?;
        let id = node.id.clone();

        Ok(match &node.data {
            NodeData::Element(element) => NodeSnapshot::Element {
                tag: element.tag.clone(),
                id,
                attributes: element
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                classes: element.classes.iter().cloned().collect(),
                children: node
                    .children_ids
                    .iter()
                    .map(|&child| self.snapshot(child))
                    .collect::<Result<_>>()?,
            },
            NodeData::Text(text) => NodeSnapshot::Text {
                text: text.clone(),
                id,
            },
            NodeData::Comment(text) => NodeSnapshot::Comment {
                text: text.clone(),
                id,
            },
        })
    }

    pub fn to_json(&self, node_id: NodeId) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot(node_id)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({
            "type": "element",
            "tag": "body",
            "children": [
                { "type": "element", "tag": "h1", "id": "heading",
                  "children": [{ "type": "text", "text": "Hello, World!" }] },
                { "type": "element", "tag": "ul", "id": "items", "classes": ["menu"],
                  "attributes": { "role": "list" },
                  "children": [
                      { "type": "element", "tag": "li" },
                      { "type": "comment", "text": "spacer" },
                      { "type": "element", "tag": "li" }
                  ] }
            ]
        });

        let tree = Tree::from_json(&json.to_string()).unwrap();

        assert!(tree.root().has_tag("body"));
        let heading = tree.lookup("heading").unwrap();
        assert_eq!(crate::utils::text_content(&tree, heading), "Hello, World!");
        let items = tree.lookup("items").unwrap();
        assert_eq!(tree.get(items).unwrap().attr("role"), Some("list"));
        assert!(tree.get(items).unwrap().has_class("menu"));
        assert_eq!(tree.element_children_of(items).len(), 2);
        assert_eq!(tree.elements_by_tag("li").len(), 2);
    }

    #[test]
    fn test_from_json_rejects_duplicates_and_garbage() {
        let json = r#"{"type":"element","tag":"div","children":[
            {"type":"element","tag":"p","id":"x"},
            {"type":"element","tag":"p","id":"x"}]}"#;
        assert!(matches!(Tree::from_json(json), Err(DomError::DuplicateId(_))));

        assert!(matches!(
            Tree::from_json("{not json"),
            Err(DomError::ParseError(_))
        ));
        assert!(matches!(
            Tree::from_json(r#"{"type":"text","text":"lonely"}"#),
            Err(DomError::InvalidKind { .. })
        ));
    }

    #[test]
    fn test_build_is_detached_until_attached() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        let content = NodeSnapshot::element(
            "div",
            vec![
                NodeSnapshot::element("h2", vec![NodeSnapshot::text("New Content")]),
                NodeSnapshot::element("p", vec![NodeSnapshot::text("This is the updated content.")]),
            ],
        );

        let div = tree.build(&content);
        assert!(!tree.is_connected(div));
        assert_eq!(tree.element_children_of(div).len(), 2);

        tree.append_child(root, div).unwrap();
        assert_eq!(tree.elements_by_tag("h2").len(), 1);
    }

    #[test]
    fn test_snapshot_matches_input() {
        let snapshot = NodeSnapshot::Element {
            tag: "section".to_string(),
            id: Some("s".to_string()),
            attributes: BTreeMap::from([("title".to_string(), "t".to_string())]),
            classes: BTreeSet::from(["a".to_string(), "b".to_string()]),
            children: vec![NodeSnapshot::Comment {
                text: "c".to_string(),
                id: None,
            }],
        };

        let tree = Tree::from_snapshot(&snapshot).unwrap();
        assert_eq!(tree.snapshot(tree.root_id()).unwrap(), snapshot);

        let json = tree.to_json(tree.root_id()).unwrap();
        assert!(json.contains("\"type\":\"element\""));
    }
}
