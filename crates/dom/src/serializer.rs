//! Tree serializer - render a subtree as indented markup-like text
//!
//! Meant for logs, debugging and test assertions. Attributes and class
//! tokens are sorted so output is deterministic; this is not a wire format
//! and nothing parses it back.

use serde::{Deserialize, Serialize};

use crate::arena::Tree;
use crate::error::Result;
use crate::types::{NodeData, NodeId};
use crate::utils;

/// Serializer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    pub indent: String,
    pub max_text_length: usize,
    pub include_comments: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            max_text_length: 200,
            include_comments: true,
        }
    }
}

pub struct DomSerializer {
    config: SerializerConfig,
}

impl DomSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Serialize the subtree rooted at `node_id`
    pub fn serialize(&self, tree: &Tree, node_id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(1024);
        self.serialize_node(tree, node_id, 0, &mut output)?;
        Ok(output)
    }

    fn serialize_node(
        &self,
        tree: &Tree,
        node_id: NodeId,
        depth: usize,
        output: &mut String,
    ) -> Result<()> {
        let node = tree.get(node_id)?;
        let indent = self.config.indent.repeat(depth);

        match node.data() {
            NodeData::Element(element) => {
                // Format: <tag id="x" class="a b" name="value">
                output.push_str(&indent);
                output.push('<');
                output.push_str(&element.tag);

                if let Some(id) = node.id() {
                    output.push_str(&format!(" id=\"{}\"", id));
                }

                let mut classes: Vec<&str> = node.classes().collect();
                if !classes.is_empty() {
                    classes.sort_unstable();
                    output.push_str(&format!(" class=\"{}\"", classes.join(" ")));
                }

                let mut attributes: Vec<(&str, &str)> = node.attributes().collect();
                attributes.sort_unstable();
                for (name, value) in attributes {
                    output.push_str(&format!(" {}=\"{}\"", name, value));
                }

                output.push_str(">\n");

                for &child_id in node.children_ids() {
                    self.serialize_node(tree, child_id, depth + 1, output)?;
                }

                output.push_str(&indent);
                output.push_str("</");
                output.push_str(&element.tag);
                output.push_str(">\n");
            }
            NodeData::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    output.push_str(&indent);
                    output.push_str(&utils::cap_text_length(text, self.config.max_text_length));
                    output.push('\n');
                }
            }
            NodeData::Comment(data) => {
                if self.config.include_comments {
                    output.push_str(&indent);
                    output.push_str("<!--");
                    output.push_str(data);
                    output.push_str("-->\n");
                }
            }
        }

        Ok(())
    }
}

impl Default for DomSerializer {
    fn default() -> Self {
        Self::new()
    }
}
