//! Render-target behaviour of the in-memory document.

use anyhow::Result;
use leaf_dom::{DOMSubscriber, DOMUpdate, Document, DomError, Event, EventListener, RenderTarget};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct Recorder {
        seen: Rc<RefCell<Vec<DOMUpdate>>>,
    }

    impl DOMSubscriber for Recorder {
        fn apply_update(&mut self, update: &DOMUpdate) -> Result<()> {
            self.seen.borrow_mut().push(update.clone());
            Ok(())
        }
    }

    struct Failing;

    impl DOMSubscriber for Failing {
        fn apply_update(&mut self, _update: &DOMUpdate) -> Result<()> {
            Err(anyhow::anyhow!("mirror offline"))
        }
    }

    /// Tests that `insert_before` respects the reference node and appends without one
    #[test]
    fn test_insert_before_orders_children() -> Result<()> {
        init_logging();
        let mut doc = Document::new();
        let root = doc.root();
        let list = doc.create_element("ul");
        doc.append_child(root, list)?;
        let first = doc.create_text_node("a");
        let third = doc.create_text_node("c");
        let second = doc.create_text_node("b");
        doc.append_child(list, first)?;
        doc.append_child(list, third)?;
        doc.insert_before(list, second, Some(third))?;

        assert_eq!(doc.children(list), vec![first, second, third]);
        assert_eq!(doc.text_content(root), "abc");
        assert_eq!(doc.to_html(), "<ul>abc</ul>");
        Ok(())
    }

    /// Tests that inserting against a reference under another parent fails
    #[test]
    fn test_insert_before_foreign_reference_is_rejected() -> Result<()> {
        let mut doc = Document::new();
        let root = doc.root();
        let left = doc.create_element("div");
        let right = doc.create_element("div");
        doc.append_child(root, left)?;
        doc.append_child(root, right)?;
        let inner = doc.create_element("span");
        doc.append_child(right, inner)?;
        let orphan = doc.create_element("p");

        let result = doc.insert_before(left, orphan, Some(inner));
        assert_eq!(
            result,
            Err(DomError::NotAChild {
                parent: left,
                child: inner
            })
        );
        Ok(())
    }

    /// Tests that removing a subtree drops its listeners and journals one removal
    #[test]
    fn test_remove_child_drops_subtree_and_listeners() -> Result<()> {
        let mut doc = Document::new();
        let root = doc.root();
        let section = doc.create_element("section");
        let button = doc.create_element("button");
        doc.append_child(root, section)?;
        doc.append_child(section, button)?;
        let listener: EventListener = Rc::new(|_event: &Event| {});
        doc.add_event_listener(button, "click", listener)?;
        assert_eq!(doc.listener_count(button), 1);
        let _setup = doc.take_updates();

        doc.remove_child(root, section)?;

        assert!(!doc.contains(button));
        assert_eq!(doc.listener_count(button), 0);
        assert_eq!(
            doc.take_updates(),
            vec![DOMUpdate::RemoveChild {
                parent: root,
                node: section
            }]
        );
        Ok(())
    }

    /// Tests that events bubble from the target towards the root
    #[test]
    fn test_dispatch_bubbles_to_ancestors() -> Result<()> {
        let mut doc = Document::new();
        let root = doc.root();
        let outer = doc.create_element("div");
        let inner = doc.create_element("button");
        doc.append_child(root, outer)?;
        doc.append_child(outer, inner)?;

        let order = Rc::new(RefCell::new(Vec::new()));
        let inner_order = Rc::clone(&order);
        doc.add_event_listener(
            inner,
            "click",
            Rc::new(move |event: &Event| inner_order.borrow_mut().push(("inner", event.current_target))),
        )?;
        let outer_order = Rc::clone(&order);
        doc.add_event_listener(
            outer,
            "click",
            Rc::new(move |event: &Event| outer_order.borrow_mut().push(("outer", event.current_target))),
        )?;

        assert_eq!(doc.dispatch_event(inner, "click"), 2);
        assert_eq!(*order.borrow(), vec![("inner", inner), ("outer", outer)]);
        assert_eq!(doc.dispatch_event(inner, "keydown"), 0);
        Ok(())
    }

    /// Tests that replacing a listener for the same event keeps a single handler
    #[test]
    fn test_listener_replacement() -> Result<()> {
        let mut doc = Document::new();
        let button = doc.create_element("button");
        let hits = Rc::new(RefCell::new(Vec::new()));
        let first_hits = Rc::clone(&hits);
        doc.add_event_listener(button, "click", Rc::new(move |_event: &Event| first_hits.borrow_mut().push(1)))?;
        let second_hits = Rc::clone(&hits);
        doc.add_event_listener(button, "click", Rc::new(move |_event: &Event| second_hits.borrow_mut().push(2)))?;

        assert_eq!(doc.listener_count(button), 1);
        doc.dispatch_event(button, "click");
        assert_eq!(*hits.borrow(), vec![2]);

        doc.remove_event_listener(button, "click")?;
        assert_eq!(doc.dispatch_event(button, "click"), 0);
        Ok(())
    }

    /// Tests that text operations are rejected on elements and vice versa
    #[test]
    fn test_kind_mismatches() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let text = doc.create_text_node("x");
        assert_eq!(doc.set_text(div, "y"), Err(DomError::NotText(div)));
        assert_eq!(doc.set_attribute(text, "id", "y"), Err(DomError::NotAnElement(text)));
        assert!(doc.is_known_event(div, "click"));
        assert!(!doc.is_known_event(text, "click"));
        assert!(!doc.is_known_event(div, "teleport"));
    }

    /// Tests that subscribers mirror every update and failing ones do not block the document
    #[test]
    fn test_subscribers_mirror_updates() -> Result<()> {
        init_logging();
        let mut doc = Document::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        doc.subscribe(Box::new(Failing));
        doc.subscribe(Box::new(Recorder {
            seen: Rc::clone(&seen),
        }));

        let div = doc.create_element("div");
        doc.set_attribute(div, "id", "main")?;
        doc.append_child(doc.root(), div)?;

        assert_eq!(*seen.borrow(), doc.take_updates());
        assert_eq!(doc.update_count(), 3);
        assert_eq!(doc.attribute(div, "id"), Some("main"));
        Ok(())
    }

    /// Tests the JSON snapshot merges adjacent text and sorts attributes
    #[test]
    fn test_json_snapshot() -> Result<()> {
        let mut doc = Document::new();
        let root = doc.root();
        let para = doc.create_element("p");
        doc.set_attribute(para, "title", "t")?;
        doc.set_attribute(para, "class", "c")?;
        doc.append_child(root, para)?;
        let label = doc.create_text_node("Count: ");
        let value = doc.create_text_node("1");
        doc.append_child(para, label)?;
        doc.append_child(para, value)?;

        assert_eq!(
            doc.to_json(),
            json!({
                "type": "document",
                "children": [{
                    "type": "element",
                    "tag": "p",
                    "attrs": { "class": "c", "title": "t" },
                    "children": [{ "type": "text", "text": "Count: 1" }],
                }],
            })
        );
        assert_eq!(doc.outer_html(para), "<p class=\"c\" title=\"t\">Count: 1</p>");
        Ok(())
    }
}
