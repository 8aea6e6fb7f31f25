//! Demo application: a home page with a header, a clock and a list that can
//! each be toggled, plus a second page reached through the router.
//!
//! Run with `RUST_LOG=info cargo run -p leaf --example demo`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::{Result, anyhow};
use leaf::{Cleanup, Component, Element, Location, Node, Root, Router, Setter, deps, style};
use leaf_dom::{Document, NodeKey, NodeKind};
use log::{error, info};

/// Drives every mounted clock, standing in for a one-second interval timer.
#[derive(Clone, Default)]
struct Ticker {
    clocks: Rc<RefCell<Vec<(u64, Setter<u64>)>>>,
    next_id: Rc<Cell<u64>>,
}

impl Ticker {
    fn subscribe(&self, setter: Setter<u64>) -> Cleanup {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.clocks.borrow_mut().push((id, setter));
        let clocks = Rc::clone(&self.clocks);
        Cleanup::new(move || clocks.borrow_mut().retain(|(clock, _)| *clock != id))
    }

    fn tick(&self) -> Result<()> {
        let setters: Vec<_> = self.clocks.borrow().iter().map(|(_, setter)| setter.clone()).collect();
        for setter in setters {
            setter.update(|seconds| seconds + 1)?;
        }
        Ok(())
    }
}

fn report(result: Result<(), leaf::RenderError>) {
    if let Err(err) = result {
        error!("render failed: {err}");
    }
}

fn header() -> Component {
    Component::new("Header", |scope, _props| {
        scope.use_effect(deps![], || {
            info!("Header mount");
            Some(Cleanup::new(|| info!("Header unmount")))
        })?;
        Ok(Element::native("header")
            .style(style! {
                background_color: "#80e0e0",
                padding: "10px",
                text_align: "center",
                margin_bottom: "2rem",
            })
            .child(Element::native("h1").child("Welcome to leaf"))
            .into())
    })
}

fn clock(ticker: Ticker) -> Component {
    Component::new("Clock", move |scope, _props| {
        let (seconds, set_seconds) = scope.use_state(0_u64)?;
        let ticker = ticker.clone();
        scope.use_effect(deps![], move || Some(ticker.subscribe(set_seconds)))?;
        Ok(Element::native("div")
            .style(style! { font_size: "1.2rem", margin: "10px 0" })
            .child(format!("Elapsed: {seconds}s"))
            .into())
    })
}

fn list_item() -> Component {
    Component::new("ListItem", |scope, props| {
        let (selected, set_selected) = scope.use_state(false)?;
        let label = props.get_str("item").unwrap_or_default().to_owned();
        Ok(Element::native("li")
            .on("click", move |_event| report(set_selected.set(!selected)))
            .style(
                style! { cursor: "pointer", padding: "4px", margin_bottom: "4px" }
                    .color(if selected { "blue" } else { "black" }),
            )
            .child(label)
            .child(if selected { " (selected)" } else { "" })
            .into())
    })
}

fn list() -> Component {
    let item = list_item();
    Component::new("List", move |scope, _props| {
        let (items, set_items) = scope.use_state(vec![
            "Item 1".to_owned(),
            "Item 2".to_owned(),
            "Item 3".to_owned(),
        ])?;
        let current = items.clone();
        scope.use_effect(deps![], move || {
            let mut next = current;
            next.push("Item 4".to_owned());
            report(set_items.set(next));
            None
        })?;
        Ok(Element::native("ul")
            .style(style! { list_style: "circle", padding: "0 20px" })
            .children(items.iter().enumerate().map(|(index, label)| {
                Element::component(item.clone())
                    .key(index.to_string())
                    .prop("item", label)
            }))
            .into())
    })
}

fn nav_button(location: Location, url: &'static str) -> Element {
    Element::native("div").child(
        Element::native("button")
            .style(style! { margin: "0.5rem", padding: "8px 16px", cursor: "pointer" })
            .on("click", move |_event| {
                info!("navigating to {url}");
                report(location.navigate(url));
            })
            .child(format!("Go to {url}")),
    )
}

fn toggle(label: &str, setter: Setter<bool>, shown: bool) -> Element {
    Element::native("button")
        .style(style! { margin: "0.5rem", padding: "0.5rem 1rem", cursor: "pointer" })
        .on("click", move |_event| report(setter.set(!shown)))
        .child(format!("Toggle {label}"))
}

fn home(location: Location, ticker: Ticker) -> Component {
    let (header, clock, list) = (header(), clock(ticker), list());
    Component::new("Home", move |scope, _props| {
        let (show_header, set_show_header) = scope.use_state(true)?;
        let (show_clock, set_show_clock) = scope.use_state(true)?;
        let (show_list, set_show_list) = scope.use_state(true)?;
        scope.use_effect(deps![show_header, show_clock, show_list], || {
            info!("visible sections changed");
            Some(Cleanup::new(|| info!("cleaning up before the next visibility change")))
        })?;
        Ok(Element::fragment()
            .child(show_header.then(|| Element::component(header.clone())))
            .child(show_clock.then(|| Element::component(clock.clone())))
            .child(show_list.then(|| Element::component(list.clone())))
            .child(toggle("Header", set_show_header, show_header))
            .child(toggle("Timer", set_show_clock, show_clock))
            .child(toggle("List", set_show_list, show_list))
            .child(nav_button(location.clone(), "/page2"))
            .into())
    })
}

fn page2(location: Location) -> Component {
    Component::new("Page2", move |_scope, _props| {
        Ok(Element::native("div")
            .attr("className", "second-page")
            .child(Element::native("h2").child("Welcome to the Second Page"))
            .child(nav_button(location.clone(), "/home"))
            .into())
    })
}

/// First element with `tag` whose text contains `text`, in document order.
fn find(document: &Document, node: NodeKey, tag: &str, text: &str) -> Option<NodeKey> {
    let matches = document.get(node).is_some_and(|entry| {
        matches!(&entry.kind, NodeKind::Element { tag: found } if found == tag)
    }) && document.text_content(node).contains(text);
    if matches {
        return Some(node);
    }
    document
        .children(node)
        .into_iter()
        .find_map(|child| find(document, child, tag, text))
}

fn click(root: &Root<Document>, tag: &str, text: &str) -> Result<()> {
    let node = find(&root.target(), root.container(), tag, text)
        .ok_or_else(|| anyhow!("no <{tag}> containing {text:?}"))?;
    root.dispatch_event(node, "click");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let document = Document::new();
    let container = document.root();
    let root = Root::new(document, container);
    let location = Location::new("/home", root.scheduler().clone());
    let ticker = Ticker::default();

    let router = Router::new(location.clone())
        .route("/home", home(location.clone(), ticker.clone()))
        .route("/page2", page2(location))
        .fallback(Component::new("NotFound", |_scope, _props| {
            Ok(Node::from(Element::native("p").child("Page not found")))
        }))
        .into_component();
    root.render(move || Element::component(router.clone()).into())?;
    info!("mounted: {}", root.target().to_html());

    ticker.tick()?;
    ticker.tick()?;
    click(&root, "li", "Item 2")?;
    info!("after selecting: {}", root.target().to_html());

    click(&root, "button", "Toggle Header")?;
    click(&root, "button", "Toggle Timer")?;
    ticker.tick()?;
    info!("after toggles: {}", root.target().to_html());

    click(&root, "button", "Go to /page2")?;
    info!("page 2: {}", root.target().to_html());
    click(&root, "button", "Go to /home")?;
    info!("back home: {}", root.target().to_html());

    if let Some(report) = root.last_report() {
        info!("last pass: {}", serde_json::to_string(&report)?);
    }
    Ok(())
}
