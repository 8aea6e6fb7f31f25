//! End-to-end reconciliation against the in-memory document.

use anyhow::{Result, anyhow};
use leaf::{Classification, Cleanup, Component, Element, LeafConfig, Node, Root, Setter, deps};
use leaf_dom::{DOMUpdate, Document, NodeKey};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[cfg(test)]
mod tests {
    use super::*;

    type SetterSlot<T> = Rc<RefCell<Option<Setter<T>>>>;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn mount() -> Root<Document> {
        init_logging();
        let document = Document::new();
        let container = document.root();
        Root::with_config(document, container, LeafConfig::new(true, false, 0))
    }

    fn setter<T>(slot: &SetterSlot<T>) -> Result<Setter<T>> {
        slot.borrow().clone().ok_or_else(|| anyhow!("component never rendered"))
    }

    fn first_child(root: &Root<Document>, node: NodeKey) -> Result<NodeKey> {
        root.target()
            .children(node)
            .first()
            .copied()
            .ok_or_else(|| anyhow!("{node} has no children"))
    }

    fn counter(slot: &SetterSlot<i32>) -> Component {
        let slot = Rc::clone(slot);
        Component::new("Counter", move |scope, _props| {
            let (count, set_count) = scope.use_state(0)?;
            *slot.borrow_mut() = Some(set_count);
            Ok(Element::native("p").child(format!("Count: {count}")).into())
        })
    }

    /// Tests that re-rendering an unchanged tree classifies everything unchanged and touches nothing
    #[test]
    fn test_rerender_is_idempotent() -> Result<()> {
        let root = mount();
        let slot = SetterSlot::default();
        let counter = counter(&slot);
        root.render(move || {
            Element::native("div")
                .attr("className", "app")
                .child(Element::native("h1").child("Title"))
                .child(Element::component(counter.clone()))
                .child(
                    Element::native("ul")
                        .children(["a", "b"].map(|item| Element::native("li").key(item).child(item))),
                )
                .into()
        })?;
        let first = root.last_report().ok_or_else(|| anyhow!("no first pass"))?;
        assert!(first.fibers.iter().all(|(_, class)| *class == Classification::Placement));
        let _initial = root.target_mut().take_updates();

        root.request_render()?;

        let report = root.last_report().ok_or_else(|| anyhow!("no second pass"))?;
        assert!(report.is_noop());
        assert!(report.fibers.iter().all(|(_, class)| *class == Classification::None));
        assert_eq!(report.fibers.len(), first.fibers.len());
        assert!(root.target_mut().take_updates().is_empty());
        assert_eq!(
            root.target().to_html(),
            "<div class=\"app\"><h1>Title</h1><p>Count: 0</p><ul><li>a</li><li>b</li></ul></div>"
        );
        Ok(())
    }

    /// Tests that a state change updates the existing text node in place
    #[test]
    fn test_counter_updates_text_in_place() -> Result<()> {
        let root = mount();
        let slot = SetterSlot::default();
        let counter = counter(&slot);
        root.render(move || Element::component(counter.clone()).into())?;

        let container = root.container();
        let paragraph = first_child(&root, container)?;
        let text = first_child(&root, paragraph)?;
        let _initial = root.target_mut().take_updates();

        setter(&slot)?.set(1)?;

        let report = root.last_report().ok_or_else(|| anyhow!("no pass"))?;
        assert_eq!(
            report.classification("root-0:Counter-0:p-0:#text"),
            Some(Classification::Update)
        );
        assert_eq!(report.classification("root-0:Counter-0:p"), Some(Classification::None));
        assert_eq!(first_child(&root, paragraph)?, text);
        assert_eq!(
            root.target_mut().take_updates(),
            vec![DOMUpdate::SetText {
                node: text,
                text: "Count: 1".to_owned()
            }]
        );
        Ok(())
    }

    /// Tests that dropping a keyed child deletes only that child and runs its cleanup once
    #[test]
    fn test_keyed_removal_keeps_siblings() -> Result<()> {
        let root = mount();
        let cleanups = Rc::new(RefCell::new(Vec::new()));
        let item_cleanups = Rc::clone(&cleanups);
        let item = Component::new("ListItem", move |scope, props| {
            let label = props.get_str("label").unwrap_or_default().to_owned();
            let log = Rc::clone(&item_cleanups);
            let owner = label.clone();
            scope.use_effect(deps![], move || {
                Some(Cleanup::new(move || log.borrow_mut().push(owner)))
            })?;
            Ok(Element::native("li").child(label).into())
        });
        let slot: SetterSlot<Vec<&'static str>> = SetterSlot::default();
        let list_slot = Rc::clone(&slot);
        let list = Component::new("List", move |scope, _props| {
            let (items, set_items) = scope.use_state(vec!["a", "b", "c"])?;
            *list_slot.borrow_mut() = Some(set_items);
            Ok(Element::native("ul")
                .children(
                    items
                        .iter()
                        .map(|name| Element::component(item.clone()).key(*name).prop("label", *name)),
                )
                .into())
        });
        root.render(move || Element::component(list.clone()).into())?;

        let ul = first_child(&root, root.container())?;
        let before = root.target().children(ul);
        assert_eq!(before.len(), 3);

        setter(&slot)?.set(vec!["a", "c"])?;

        let report = root.last_report().ok_or_else(|| anyhow!("no pass"))?;
        assert_eq!(
            report.classification("root-0:List-0:ul-@a:ListItem"),
            Some(Classification::None)
        );
        assert_eq!(
            report.classification("root-0:List-0:ul-@c:ListItem"),
            Some(Classification::None)
        );
        assert_eq!(report.classification("root-0:List-0:ul-@b:ListItem"), None);
        assert_eq!(report.deletions, 1);
        assert_eq!(*cleanups.borrow(), vec!["b".to_owned()]);
        assert_eq!(root.target().children(ul), vec![before[0], before[2]]);
        assert_eq!(root.target().outer_html(ul), "<ul><li>a</li><li>c</li></ul>");
        assert!(!root.context().hooks().contains("root-0:List-0:ul-@b:ListItem"));
        assert!(root.context().hooks().contains("root-0:List-0:ul-@a:ListItem"));
        Ok(())
    }

    /// Tests that toggling a component off runs its cleanup and toggling it back mounts it before its sibling
    #[test]
    fn test_conditional_child_unmounts_and_remounts_in_order() -> Result<()> {
        let root = mount();
        let mounts = Rc::new(Cell::new(0_u32));
        let unmounts = Rc::new(Cell::new(0_u32));
        let (mount_count, unmount_count) = (Rc::clone(&mounts), Rc::clone(&unmounts));
        let header = Component::new("Header", move |scope, _props| {
            let (mount_count, unmount_count) = (Rc::clone(&mount_count), Rc::clone(&unmount_count));
            scope.use_effect(deps![], move || {
                mount_count.set(mount_count.get() + 1);
                Some(Cleanup::new(move || unmount_count.set(unmount_count.get() + 1)))
            })?;
            Ok(Element::native("h1").child("Header").into())
        });
        let slot: SetterSlot<bool> = SetterSlot::default();
        let app_slot = Rc::clone(&slot);
        let app = Component::new("App", move |scope, _props| {
            let (show, set_show) = scope.use_state(true)?;
            *app_slot.borrow_mut() = Some(set_show);
            Ok(Element::native("div")
                .child(show.then(|| Element::component(header.clone())))
                .child(Element::native("main").child("body"))
                .into())
        });
        root.render(move || Element::component(app.clone()).into())?;
        assert_eq!(mounts.get(), 1);

        setter(&slot)?.set(false)?;
        assert_eq!(unmounts.get(), 1);
        assert!(!root.context().hooks().contains("root-0:App-0:div-0:Header"));
        assert_eq!(root.target().to_html(), "<div><main>body</main></div>");

        setter(&slot)?.set(true)?;
        assert_eq!(mounts.get(), 2);
        assert_eq!(unmounts.get(), 1);
        assert_eq!(
            root.target().to_html(),
            "<div><h1>Header</h1><main>body</main></div>"
        );
        Ok(())
    }

    /// Tests that prop changes issue exactly the attribute delta
    #[test]
    fn test_prop_delta() -> Result<()> {
        let root = mount();
        let slot: SetterSlot<bool> = SetterSlot::default();
        let app_slot = Rc::clone(&slot);
        let app = Component::new("App", move |scope, _props| {
            let (active, set_active) = scope.use_state(false)?;
            *app_slot.borrow_mut() = Some(set_active);
            let element = Element::native("div")
                .attr("className", if active { "on" } else { "off" })
                .attr("hidden", !active)
                .style(leaf::style! { color: "red" });
            Ok(if active {
                element.into()
            } else {
                element.attr("title", "idle").into()
            })
        });
        root.render(move || Element::component(app.clone()).into())?;
        let div = first_child(&root, root.container())?;
        assert_eq!(root.target().attribute(div, "style"), Some("color: red;"));
        assert_eq!(root.target().attribute(div, "hidden"), Some(""));
        let _initial = root.target_mut().take_updates();

        setter(&slot)?.set(true)?;

        assert_eq!(
            root.target_mut().take_updates(),
            vec![
                DOMUpdate::RemoveAttr {
                    node: div,
                    name: "title".to_owned()
                },
                DOMUpdate::SetAttr {
                    node: div,
                    name: "class".to_owned(),
                    value: "on".to_owned()
                },
                DOMUpdate::RemoveAttr {
                    node: div,
                    name: "hidden".to_owned()
                },
            ]
        );
        Ok(())
    }

    /// Tests that handlers for unrecognized events are still attached
    #[test]
    fn test_unknown_event_is_attached() -> Result<()> {
        let root = mount();
        let hits = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&hits);
        root.render(move || {
            let counter = Rc::clone(&counter);
            Element::native("div")
                .on("teleport", move |_event| counter.set(counter.get() + 1))
                .into()
        })?;
        let div = first_child(&root, root.container())?;
        assert_eq!(root.target().listener_count(div), 1);
        assert_eq!(root.dispatch_event(div, "teleport"), 1);
        assert_eq!(hits.get(), 1);
        Ok(())
    }

    /// Tests that a node appearing between fragment children and a later sibling lands in document order
    #[test]
    fn test_insertion_respects_sibling_order() -> Result<()> {
        let root = mount();
        let slot: SetterSlot<bool> = SetterSlot::default();
        let app_slot = Rc::clone(&slot);
        let app = Component::new("App", move |scope, _props| {
            let (extra, set_extra) = scope.use_state(false)?;
            *app_slot.borrow_mut() = Some(set_extra);
            Ok(Element::native("section")
                .child(Element::fragment().child(Element::native("b").child("1")).child("2"))
                .child(extra.then(|| Element::fragment().child(Element::native("i").child("3"))))
                .child(Element::native("p").child("4"))
                .into())
        });
        root.render(move || Element::component(app.clone()).into())?;
        assert_eq!(
            root.target().to_html(),
            "<section><b>1</b>2<p>4</p></section>"
        );

        setter(&slot)?.set(true)?;

        assert_eq!(
            root.target().to_html(),
            "<section><b>1</b>2<i>3</i><p>4</p></section>"
        );
        let report = root.last_report().ok_or_else(|| anyhow!("no pass"))?;
        assert_eq!(report.inserted_nodes, 2);
        assert_eq!(report.removed_nodes, 0);
        Ok(())
    }

    /// Tests that changing the tag at a position replaces the node
    #[test]
    fn test_kind_change_replaces_node() -> Result<()> {
        let root = mount();
        let slot: SetterSlot<bool> = SetterSlot::default();
        let app_slot = Rc::clone(&slot);
        let app = Component::new("App", move |scope, _props| {
            let (emphasis, set_emphasis) = scope.use_state(false)?;
            *app_slot.borrow_mut() = Some(set_emphasis);
            let tag = if emphasis { "em" } else { "span" };
            Ok(Node::from(Element::native(tag).child("text")))
        });
        root.render(move || Element::component(app.clone()).into())?;
        let before = first_child(&root, root.container())?;

        setter(&slot)?.set(true)?;

        let after = first_child(&root, root.container())?;
        assert_ne!(before, after);
        assert!(!root.target().contains(before));
        assert_eq!(root.target().to_html(), "<em>text</em>");
        let report = root.last_report().ok_or_else(|| anyhow!("no pass"))?;
        assert_eq!(report.deletions, 1);
        assert_eq!(report.classification("root-0:App-0:em"), Some(Classification::Placement));
        Ok(())
    }

    /// Tests that siblings sharing a key are matched one to one instead of accumulating
    #[test]
    fn test_duplicate_keys_do_not_accumulate() -> Result<()> {
        let root = mount();
        let slot: SetterSlot<i32> = SetterSlot::default();
        let keep = Rc::clone(&slot);
        let app = Component::new("App", move |scope, _props| {
            let (tick, set_tick) = scope.use_state(0)?;
            *keep.borrow_mut() = Some(set_tick);
            Ok(Element::native("ul")
                .child(Element::native("li").key("dup").child(format!("x{tick}")))
                .child(Element::native("li").key("dup").child(format!("y{tick}")))
                .into())
        });
        root.render(move || Element::component(app.clone()).into())?;
        let list = first_child(&root, root.container())?;

        let set_tick = setter(&slot)?;
        for tick in 1..=3 {
            set_tick.set(tick)?;
            let report = root.last_report().ok_or_else(|| anyhow!("no pass"))?;
            assert_eq!(report.placements, 0);
            assert_eq!(report.deletions, 0);
            assert_eq!(root.target().children(list).len(), 2);
        }
        assert_eq!(root.target().to_html(), "<ul><li>x3</li><li>y3</li></ul>");
        Ok(())
    }
}
