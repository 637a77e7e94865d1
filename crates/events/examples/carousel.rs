//! Next/previous carousel driven by click events
//!
//! Run with `RUST_LOG` unset; the fmt subscriber prints INFO and above.

use dom_events::{DispatchContext, EventBus, ListenerResult, CLICK};
use dom_tree::{Cursor, DomSerializer, NodeId, NodeSnapshot, Tree};
use serde_json::{json, Value};

/// Hide the shown item and reveal its neighbour, wrapping at the ends
fn step(ctx: &mut DispatchContext<'_>, list: NodeId, forward: bool) -> ListenerResult {
    let mut cursor = Cursor::over(ctx.tree(), list);
    let shown = cursor
        .sequence()
        .iter()
        .copied()
        .find(|&id| ctx.tree().node(id).is_some_and(|n| !n.has_class("hidden")));

    if let Some(shown) = shown {
        cursor.seek(shown);
        ctx.tree_mut().add_class(shown, "hidden")?;
    }
    let target = if forward {
        cursor.advance()
    } else {
        cursor.retreat()
    };
    if let Some(target) = target {
        ctx.tree_mut().remove_class(target, "hidden")?;
        tracing::info!(
            "Showing {:?}",
            dom_tree::text_content(ctx.tree(), target)
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let page = json!({
        "type": "element",
        "tag": "body",
        "children": [
            { "type": "element", "tag": "ul", "id": "MyItemList", "children": [
                { "type": "element", "tag": "li", "children": [{ "type": "text", "text": "Item 1" }] },
                { "type": "element", "tag": "li", "classes": ["hidden"], "children": [{ "type": "text", "text": "Item 2" }] },
                { "type": "element", "tag": "li", "classes": ["hidden"], "children": [{ "type": "text", "text": "Item 3" }] }
            ] },
            { "type": "element", "tag": "button", "id": "prevButton" },
            { "type": "element", "tag": "button", "id": "nextButton" }
        ]
    });
    let snapshot: NodeSnapshot = serde_json::from_value(page)?;
    let mut tree = Tree::from_snapshot(&snapshot)?;

    let list = tree.lookup("MyItemList").ok_or("missing list")?;
    let prev = tree.lookup("prevButton").ok_or("missing prev button")?;
    let next = tree.lookup("nextButton").ok_or("missing next button")?;

    let bus = EventBus::new();
    bus.add_listener(next, CLICK, move |ctx, _| step(ctx, list, true));
    bus.add_listener(prev, CLICK, move |ctx, _| step(ctx, list, false));

    for button in [next, next, next, prev] {
        let report = bus.dispatch(&mut tree, button, CLICK, Value::Null);
        if let Some(err) = report.first_failure() {
            tracing::error!("Click failed: {}", err);
        }
    }

    println!("{}", DomSerializer::new().serialize(&tree, tree.root_id())?);
    Ok(())
}
