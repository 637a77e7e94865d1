//! Structural and state mutation
//!
//! Every operation validates completely before touching the arena, so a
//! returned error always means "nothing changed". After any call returns,
//! each child's `parent_id` names the node whose `children_ids` holds it, and
//! the identity index covers exactly the connected identified nodes.

use ahash::{AHashMap, AHashSet};

use crate::arena::Tree;
use crate::error::{DomError, Result};
use crate::types::{NodeData, NodeId};

impl Tree {
    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_child(parent, child, None, "append_child")
    }

    /// Insert `child` before `reference` (a current child of `parent`).
    /// `None` appends.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.insert_child(parent, child, reference, "insert_before")
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
        operation: &'static str,
    ) -> Result<()> {
        self.check_insertable(parent, child, operation)?;
        if let Some(reference) = reference {
            self.get(reference)?;
            if self.parent_of(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }
        // Inserting a node before itself means "keep it where it is".
        let reference = if reference == Some(child) {
            self.next_sibling(child)
        } else {
            reference
        };

        let was_connected = self.is_connected(child);
        let will_connect = self.is_connected(parent);
        if will_connect && !was_connected {
            self.check_incoming_ids(&[child], &AHashSet::new())?;
        }

        if was_connected && !will_connect {
            self.unindex_subtree(child);
        }
        self.unlink(child)?;

        let parent_node = self.get_mut(parent)?;
        let position = reference
            .and_then(|r| parent_node.children_ids.iter().position(|&id| id == r))
            .unwrap_or(parent_node.children_ids.len());
        parent_node.children_ids.insert(position, child);
        self.get_mut(child)?.parent_id = Some(parent);

        if will_connect && !was_connected {
            self.index_subtree(child);
        }

        tracing::debug!("{}: node {} under {} at {}", operation, child, parent, position);
        Ok(())
    }

    /// Remove `child` from `parent`. The child and its subtree stay alive,
    /// detached, and leave the identity index.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?;
        self.get(child)?;
        if self.parent_of(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }

        self.unindex_subtree(child);
        self.unlink(child)?;

        tracing::debug!("remove_child: node {} from {}", child, parent);
        Ok(())
    }

    /// Remove a node from whatever parent it has. No-op when already detached.
    pub fn detach(&mut self, node_id: NodeId) -> Result<()> {
        match self.get(node_id)?.parent_id {
            Some(parent) => self.remove_child(parent, node_id),
            None => Ok(()),
        }
    }

    /// Replace all children of `node_id` with `new_children`, in order
    ///
    /// Previous children end up detached. Fails without changes when an
    /// incoming identity would collide with a connected node that stays
    /// connected.
    pub fn replace_children(&mut self, node_id: NodeId, new_children: &[NodeId]) -> Result<()> {
        const OPERATION: &str = "replace_children";

        let target = self.get(node_id)?;
        if !target.is_element() {
            return Err(DomError::InvalidKind {
                operation: OPERATION,
                actual: target.node_type(),
            });
        }
        let old_children = target.children_ids.to_vec();

        for (i, &child) in new_children.iter().enumerate() {
            self.check_insertable(node_id, child, OPERATION)?;
            if new_children[..i].contains(&child) {
                return Err(DomError::HierarchyRequest(format!(
                    "node {child} listed twice"
                )));
            }
        }

        let will_connect = self.is_connected(node_id);
        if will_connect {
            let incoming: AHashSet<NodeId> = new_children
                .iter()
                .flat_map(|&child| self.subtree_ids(child))
                .collect();
            let leaving: AHashSet<NodeId> = old_children
                .iter()
                .flat_map(|&child| self.subtree_ids(child))
                .filter(|id| !incoming.contains(id))
                .collect();
            self.check_incoming_ids(new_children, &leaving)?;
        }

        for &old in &old_children {
            self.unindex_subtree(old);
        }
        for &child in new_children {
            self.unindex_subtree(child);
        }

        for &old in &old_children {
            self.get_mut(old)?.parent_id = None;
        }
        self.get_mut(node_id)?.children_ids.clear();
        for &child in new_children {
            self.unlink(child)?;
        }
        for &child in new_children {
            self.get_mut(child)?.parent_id = Some(node_id);
        }
        self.get_mut(node_id)?
            .children_ids
            .extend(new_children.iter().copied());

        if will_connect {
            for &child in new_children {
                self.index_subtree(child);
            }
        }

        tracing::debug!(
            "replace_children: node {} ({} out, {} in)",
            node_id,
            old_children.len(),
            new_children.len()
        );
        Ok(())
    }

    /// Set or clear the node identity. Empty strings clear it.
    pub fn set_id(&mut self, node_id: NodeId, id: Option<&str>) -> Result<()> {
        let id = id.filter(|id| !id.is_empty());
        let current = self.get(node_id)?.id.clone();
        let connected = self.is_connected(node_id);

        if connected {
            if let Some(new_id) = id {
                if let Some(existing) = self.index_entry(new_id) {
                    if existing != node_id {
                        return Err(DomError::DuplicateId(new_id.to_string()));
                    }
                }
            }
            if let Some(old_id) = &current {
                self.remove_index_entry(old_id, node_id);
            }
            if let Some(new_id) = id {
                self.set_index_entry(new_id.to_string(), node_id);
            }
        }

        self.get_mut(node_id)?.id = id.map(str::to_string);
        tracing::trace!("set_id: node {} {:?} -> {:?}", node_id, current, id);
        Ok(())
    }

    /// Set an attribute. `"id"` renames the node identity.
    pub fn set_attribute(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        self.get_mut(node_id)?.element_mut("set_attribute")?;
        if name == "id" {
            return self.set_id(node_id, Some(value));
        }

        self.get_mut(node_id)?
            .element_mut("set_attribute")?
            .attributes
            .insert(name.to_string(), value.to_string());
        tracing::trace!("set_attribute: node {} {}={:?}", node_id, name, value);
        Ok(())
    }

    /// Remove an attribute, returning whether it was present
    pub fn remove_attribute(&mut self, node_id: NodeId, name: &str) -> Result<bool> {
        self.get_mut(node_id)?.element_mut("remove_attribute")?;
        if name == "id" {
            let had_id = self.get(node_id)?.id.is_some();
            self.set_id(node_id, None)?;
            return Ok(had_id);
        }

        let removed = self
            .get_mut(node_id)?
            .element_mut("remove_attribute")?
            .attributes
            .remove(name)
            .is_some();
        tracing::trace!("remove_attribute: node {} {} ({})", node_id, name, removed);
        Ok(removed)
    }

    pub fn add_class(&mut self, node_id: NodeId, token: &str) -> Result<()> {
        let element = self.get_mut(node_id)?.element_mut("add_class")?;
        element.classes.insert(token.to_string());
        tracing::trace!("add_class: node {} {:?}", node_id, token);
        Ok(())
    }

    pub fn remove_class(&mut self, node_id: NodeId, token: &str) -> Result<()> {
        let element = self.get_mut(node_id)?.element_mut("remove_class")?;
        element.classes.remove(token);
        tracing::trace!("remove_class: node {} {:?}", node_id, token);
        Ok(())
    }

    /// Flip membership of `token`; returns the new membership
    pub fn toggle_class(&mut self, node_id: NodeId, token: &str) -> Result<bool> {
        let element = self.get_mut(node_id)?.element_mut("toggle_class")?;
        let present = if element.classes.remove(token) {
            false
        } else {
            element.classes.insert(token.to_string());
            true
        };
        tracing::trace!("toggle_class: node {} {:?} -> {}", node_id, token, present);
        Ok(present)
    }

    /// Replace the text of a node
    ///
    /// Elements get their children replaced by a single text node (none for
    /// an empty string); text and comment nodes get their payload replaced.
    pub fn set_text_content(&mut self, node_id: NodeId, text: &str) -> Result<()> {
        if let NodeData::Text(current) | NodeData::Comment(current) =
            &mut self.get_mut(node_id)?.data
        {
            *current = text.to_string();
            return Ok(());
        }

        let replacement = if text.is_empty() {
            Vec::new()
        } else {
            vec![self.create_text(text)]
        };
        self.replace_children(node_id, &replacement)
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId, operation: &'static str) -> Result<()> {
        let parent_node = self.get(parent)?;
        if !parent_node.is_element() {
            return Err(DomError::InvalidKind {
                operation,
                actual: parent_node.node_type(),
            });
        }
        self.get(child)?;
        if child == self.root_id() {
            return Err(DomError::HierarchyRequest(
                "the root cannot be moved".to_string(),
            ));
        }
        if child == parent || self.ancestors(parent).any(|id| id == child) {
            return Err(DomError::HierarchyRequest(format!(
                "node {child} contains node {parent}"
            )));
        }
        Ok(())
    }

    /// Identities in the incoming subtrees must be unique among themselves and
    /// must not name a connected node outside `leaving`.
    fn check_incoming_ids(&self, incoming: &[NodeId], leaving: &AHashSet<NodeId>) -> Result<()> {
        let mut seen: AHashMap<&str, NodeId> = AHashMap::new();
        for &root in incoming {
            for node in self.descendants(root) {
                let Some(id) = node.id() else {
                    continue;
                };
                if let Some(previous) = seen.insert(id, node.node_id) {
                    if previous != node.node_id {
                        return Err(DomError::DuplicateId(id.to_string()));
                    }
                }
                if let Some(existing) = self.index_entry(id) {
                    if existing != node.node_id && !leaving.contains(&existing) {
                        return Err(DomError::DuplicateId(id.to_string()));
                    }
                }
            }
        }
        Ok(())
    }

    fn unlink(&mut self, child: NodeId) -> Result<()> {
        if let Some(parent) = self.get_mut(child)?.parent_id.take() {
            self.get_mut(parent)?.children_ids.retain(|id| *id != child);
        }
        Ok(())
    }
}
