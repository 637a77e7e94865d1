//! Event Bus - per-node listener registry with synchronous dispatch
//!
//! Design decisions:
//! 1. The bus does not own the tree. `dispatch` borrows it mutably and lends
//!    it to each listener through a `DispatchContext`.
//! 2. Listeners run in registration order, one at a time, to completion.
//! 3. A listener may dispatch again through its context; the nested chain
//!    finishes before the outer loop moves on.
//! 4. Failures never stop the loop. They are logged and reported.
//! 5. No bubbling: only listeners on the target node run.

use ahash::AHashMap;
use dom_tree::{NodeId, Tree};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{ListenerError, ListenerResult};
use crate::event::{DispatchReport, Event, ListenerId};

/// Listener callback
pub type Listener = Rc<dyn Fn(&mut DispatchContext<'_>, &Event) -> ListenerResult>;

/// Event bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Deepest allowed chain of dispatches started from listeners
    pub max_dispatch_depth: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            max_dispatch_depth: 32,
        }
    }
}

/// Handed to each listener for the duration of its call
pub struct DispatchContext<'a> {
    tree: &'a mut Tree,
    bus: &'a EventBus,
    depth: usize,
}

impl<'a> DispatchContext<'a> {
    pub fn tree(&self) -> &Tree {
        &*self.tree
    }

    /// Mutations are visible to the rest of this dispatch immediately
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut *self.tree
    }

    /// The bus running this dispatch, for adding or removing listeners
    pub fn bus(&self) -> &EventBus {
        self.bus
    }

    /// 0 for a top-level dispatch
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Dispatch another event and run its listeners before returning
    pub fn dispatch(
        &mut self,
        node_id: NodeId,
        event_name: &str,
        payload: Value,
    ) -> Result<DispatchReport, ListenerError> {
        self.bus
            .dispatch_at(&mut *self.tree, node_id, event_name, payload, self.depth + 1)
    }
}

type Registry = AHashMap<NodeId, AHashMap<String, Vec<(ListenerId, Listener)>>>;

pub struct EventBus {
    config: EventBusConfig,
    listeners: RefCell<Registry>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            config,
            listeners: RefCell::new(AHashMap::new()),
            next_id: Cell::new(1),
        }
    }

    /// Register `handler` for `event_name` on `node_id`
    ///
    /// The same closure may be registered several times; each registration
    /// gets its own id and runs separately.
    pub fn add_listener<F>(
        &self,
        node_id: NodeId,
        event_name: impl Into<String>,
        handler: F,
    ) -> ListenerId
    where
        F: Fn(&mut DispatchContext<'_>, &Event) -> ListenerResult + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let event_name = event_name.into();

        tracing::debug!("Registered {} for {:?} on node {}", id, event_name, node_id);
        let listener: Listener = Rc::new(handler);
        self.listeners
            .borrow_mut()
            .entry(node_id)
            .or_default()
            .entry(event_name)
            .or_default()
            .push((id, listener));
        id
    }

    /// Unregister a listener. Returns false (and does nothing) if it was not
    /// registered for that node and event.
    pub fn remove_listener(&self, node_id: NodeId, event_name: &str, id: ListenerId) -> bool {
        let mut registry = self.listeners.borrow_mut();
        let Some(by_name) = registry.get_mut(&node_id) else {
            return false;
        };
        let Some(list) = by_name.get_mut(event_name) else {
            return false;
        };

        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        let removed = list.len() != before;

        if list.is_empty() {
            by_name.remove(event_name);
        }
        if by_name.is_empty() {
            registry.remove(&node_id);
        }
        if removed {
            tracing::debug!("Removed {} for {:?} on node {}", id, event_name, node_id);
        }
        removed
    }

    /// Drop every listener on a node, returning how many there were
    pub fn clear_node(&self, node_id: NodeId) -> usize {
        let removed = self
            .listeners
            .borrow_mut()
            .remove(&node_id)
            .map(|by_name| by_name.values().map(Vec::len).sum::<usize>())
            .unwrap_or(0);
        tracing::debug!("Cleared {} listeners on node {}", removed, node_id);
        removed
    }

    pub fn listener_count(&self, node_id: NodeId, event_name: &str) -> usize {
        self.listeners
            .borrow()
            .get(&node_id)
            .and_then(|by_name| by_name.get(event_name))
            .map_or(0, Vec::len)
    }

    /// Run every listener registered for `event_name` on `node_id`, in order
    ///
    /// Listeners added during the dispatch wait for the next one; listeners
    /// removed during the dispatch are skipped if they have not run yet.
    pub fn dispatch(
        &self,
        tree: &mut Tree,
        node_id: NodeId,
        event_name: &str,
        payload: Value,
    ) -> DispatchReport {
        match self.dispatch_at(tree, node_id, event_name, payload, 0) {
            Ok(report) => report,
            // Depth 0 never exceeds the limit.
            Err(err) => DispatchReport {
                invoked: 0,
                failures: vec![(ListenerId(0), err)],
            },
        }
    }

    fn dispatch_at(
        &self,
        tree: &mut Tree,
        node_id: NodeId,
        event_name: &str,
        payload: Value,
        depth: usize,
    ) -> Result<DispatchReport, ListenerError> {
        if depth > self.config.max_dispatch_depth {
            tracing::warn!(
                "Dropping {:?} on node {}: dispatch depth {} > {}",
                event_name,
                node_id,
                depth,
                self.config.max_dispatch_depth
            );
            return Err(ListenerError::DispatchDepthExceeded {
                current: depth,
                max: self.config.max_dispatch_depth,
            });
        }

        let snapshot = self.snapshot(node_id, event_name);
        let event = Event {
            target: node_id,
            name: event_name.to_string(),
            payload,
        };
        let mut context = DispatchContext {
            tree,
            bus: self,
            depth,
        };
        let mut report = DispatchReport::default();

        for (id, listener) in snapshot {
            if !self.is_registered(node_id, event_name, id) {
                continue;
            }
            tracing::trace!("Invoking {} for {:?} on node {}", id, event_name, node_id);
            report.invoked += 1;
            if let Err(err) = listener(&mut context, &event) {
                tracing::warn!("{} failed on {:?} for node {}: {}", id, event_name, node_id, err);
                report.failures.push((id, err));
            }
        }

        Ok(report)
    }

    fn snapshot(&self, node_id: NodeId, event_name: &str) -> Vec<(ListenerId, Listener)> {
        self.listeners
            .borrow()
            .get(&node_id)
            .and_then(|by_name| by_name.get(event_name))
            .cloned()
            .unwrap_or_default()
    }

    fn is_registered(&self, node_id: NodeId, event_name: &str, id: ListenerId) -> bool {
        self.listeners
            .borrow()
            .get(&node_id)
            .and_then(|by_name| by_name.get(event_name))
            .is_some_and(|list| list.iter().any(|(listener_id, _)| *listener_id == id))
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CLICK;
    use serde_json::json;

    fn tree_with_button() -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.root_id();
        let button = tree.create_element("button");
        tree.append_child(root, button).unwrap();
        (tree, button)
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let (mut tree, button) = tree_with_button();
        let bus = EventBus::new();
        for label in ["first", "second", "third"] {
            bus.add_listener(button, CLICK, move |ctx, event| {
                let target = event.target;
                let seen = ctx.tree().get(target)?.attr("log").unwrap_or("").to_string();
                ctx.tree_mut()
                    .set_attribute(target, "log", &format!("{seen}{label};"))?;
                Ok(())
            });
        }

        let report = bus.dispatch(&mut tree, button, CLICK, Value::Null);

        assert_eq!(report.invoked, 3);
        assert!(report.is_ok());
        assert_eq!(
            tree.get(button).unwrap().attr("log"),
            Some("first;second;third;")
        );
    }

    #[test]
    fn test_payload_and_target_reach_listener() {
        let (mut tree, button) = tree_with_button();
        let bus = EventBus::new();
        bus.add_listener(button, CLICK, |ctx, event| {
            let label = event.payload["label"].as_str().unwrap_or_default().to_string();
            ctx.tree_mut().set_text_content(event.target, &label)?;
            Ok(())
        });

        bus.dispatch(&mut tree, button, CLICK, json!({ "label": "I'm Freddy" }));

        assert_eq!(dom_tree::text_content(&tree, button), "I'm Freddy");
    }

    #[test]
    fn test_only_matching_node_and_name_run() {
        let (mut tree, button) = tree_with_button();
        let root = tree.root_id();
        let bus = EventBus::new();
        bus.add_listener(button, "mouseover", |_, _| {
            Err(ListenerError::Failed("wrong event".to_string()))
        });
        bus.add_listener(root, CLICK, |_, _| {
            Err(ListenerError::Failed("no bubbling".to_string()))
        });

        let report = bus.dispatch(&mut tree, button, CLICK, Value::Null);

        assert_eq!(report.invoked, 0);
        assert!(report.is_ok());
    }

    #[test]
    fn test_failure_does_not_stop_later_listeners() {
        let (mut tree, button) = tree_with_button();
        let bus = EventBus::new();
        let failing = bus.add_listener(button, CLICK, |ctx, _| {
            // Text nodes cannot take classes: InvalidKind
            let text = ctx.tree_mut().create_text("x");
            ctx.tree_mut().add_class(text, "nope")?;
            Ok(())
        });
        bus.add_listener(button, CLICK, |ctx, event| {
            ctx.tree_mut().add_class(event.target, "clicked")?;
            Ok(())
        });

        let report = bus.dispatch(&mut tree, button, CLICK, Value::Null);

        assert_eq!(report.invoked, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, failing);
        assert!(matches!(
            report.first_failure(),
            Some(ListenerError::Dom(dom_tree::DomError::InvalidKind { .. }))
        ));
        assert!(tree.get(button).unwrap().has_class("clicked"));
    }

    #[test]
    fn test_reentrant_dispatch_completes_before_outer_continues() {
        let (mut tree, button) = tree_with_button();
        let root = tree.root_id();
        let bus = EventBus::new();
        fn append(ctx: &mut DispatchContext<'_>, tag: &str) -> ListenerResult {
            let node = ctx.tree_mut().create_element(tag);
            let root = ctx.tree().root_id();
            ctx.tree_mut().append_child(root, node)?;
            Ok(())
        }

        bus.add_listener(button, CLICK, move |ctx, _| {
            append(ctx, "outer-1")?;
            let inner = ctx.dispatch(root, "inner", Value::Null)?;
            assert_eq!(inner.invoked, 2);
            assert_eq!(ctx.depth(), 0);
            Ok(())
        });
        bus.add_listener(button, CLICK, move |ctx, _| append(ctx, "outer-2"));
        bus.add_listener(root, "inner", move |ctx, _| {
            assert_eq!(ctx.depth(), 1);
            append(ctx, "inner-1")
        });
        bus.add_listener(root, "inner", move |ctx, _| append(ctx, "inner-2"));

        let report = bus.dispatch(&mut tree, button, CLICK, Value::Null);
        assert!(report.is_ok());

        let tags: Vec<&str> = tree
            .child_nodes_of(root)
            .into_iter()
            .filter_map(|id| tree.node(id).and_then(|n| n.tag_name()))
            .collect();
        assert_eq!(tags, vec!["button", "outer-1", "inner-1", "inner-2", "outer-2"]);
    }

    #[test]
    fn test_runaway_recursion_hits_depth_limit() {
        let (mut tree, button) = tree_with_button();
        let bus = EventBus::with_config(EventBusConfig {
            max_dispatch_depth: 3,
        });
        bus.add_listener(button, CLICK, move |ctx, event| {
            ctx.tree_mut().toggle_class(event.target, "flip")?;
            ctx.dispatch(event.target, CLICK, Value::Null)?
                .into_result()?;
            Ok(())
        });

        let report = bus.dispatch(&mut tree, button, CLICK, Value::Null);

        assert!(matches!(
            report.first_failure(),
            Some(ListenerError::DispatchDepthExceeded { max: 3, .. })
        ));
        // Depths 0..=3 each toggled once
        assert!(!tree.get(button).unwrap().has_class("flip"));
    }

    #[test]
    fn test_remove_listener() {
        let (mut tree, button) = tree_with_button();
        let bus = EventBus::new();
        let id = bus.add_listener(button, CLICK, |ctx, event| {
            ctx.tree_mut().add_class(event.target, "clicked")?;
            Ok(())
        });

        assert!(bus.remove_listener(button, CLICK, id));
        assert!(!bus.remove_listener(button, CLICK, id));
        assert!(!bus.remove_listener(button, "unknown", id));
        assert_eq!(bus.listener_count(button, CLICK), 0);

        let report = bus.dispatch(&mut tree, button, CLICK, Value::Null);
        assert_eq!(report.invoked, 0);
        assert!(!tree.get(button).unwrap().has_class("clicked"));
    }

    #[test]
    fn test_listener_removed_mid_dispatch_is_skipped() {
        let (mut tree, button) = tree_with_button();
        let bus = EventBus::new();
        let second = Rc::new(Cell::new(None));
        let handle = second.clone();
        bus.add_listener(button, CLICK, move |ctx, event| {
            if let Some(id) = handle.get() {
                ctx.bus().remove_listener(event.target, CLICK, id);
            }
            Ok(())
        });
        second.set(Some(bus.add_listener(button, CLICK, |_, _| {
            Err(ListenerError::Failed("should have been removed".to_string()))
        })));

        let report = bus.dispatch(&mut tree, button, CLICK, Value::Null);

        assert_eq!(report.invoked, 1);
        assert!(report.is_ok());
        assert_eq!(bus.listener_count(button, CLICK), 1);
    }

    #[test]
    fn test_listener_added_mid_dispatch_waits() {
        let (mut tree, button) = tree_with_button();
        let bus = EventBus::new();
        bus.add_listener(button, CLICK, |ctx, event| {
            ctx.bus().add_listener(event.target, CLICK, |ctx, event| {
                ctx.tree_mut().add_class(event.target, "late")?;
                Ok(())
            });
            Ok(())
        });

        let first = bus.dispatch(&mut tree, button, CLICK, Value::Null);
        assert_eq!(first.invoked, 1);
        assert!(!tree.get(button).unwrap().has_class("late"));

        let second = bus.dispatch(&mut tree, button, CLICK, Value::Null);
        assert_eq!(second.invoked, 2);
        assert!(tree.get(button).unwrap().has_class("late"));
    }

    #[test]
    fn test_clear_node() {
        let (_, button) = tree_with_button();
        let bus = EventBus::new();
        bus.add_listener(button, CLICK, |_, _| Ok(()));
        bus.add_listener(button, "mouseover", |_, _| Ok(()));

        assert_eq!(bus.clear_node(button), 2);
        assert_eq!(bus.listener_count(button, CLICK), 0);
    }
}
