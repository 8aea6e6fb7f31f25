//! Immutable element descriptions produced by component render functions.

use core::fmt;
use std::rc::Rc;

use leaf_dom::Event;

use crate::error::RenderError;
use crate::hooks::Scope;
use crate::props::{Props, Value};
use crate::style::Style;

/// Render function of a component.
pub type RenderFn = dyn Fn(&Scope, &Props) -> Result<Node, RenderError>;

/// A user-defined component: a stable name plus a render function.
///
/// The name is the type discriminator of instance keys, so two components
/// sharing a name share hook state at the same position.
#[derive(Clone)]
pub struct Component {
    name: &'static str,
    render: Rc<RenderFn>,
}

impl Component {
    pub fn new<F>(name: &'static str, render: F) -> Self
    where
        F: Fn(&Scope, &Props) -> Result<Node, RenderError> + 'static,
    {
        Self {
            name,
            render: Rc::new(render),
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, scope: &Scope, props: &Props) -> Result<Node, RenderError> {
        (self.render)(scope, props)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind {
    /// A host element identified by its tag.
    Native(String),
    Component(Component),
    /// Children spliced into the parent without a host node of their own.
    Fragment,
}

#[derive(Clone, Debug)]
pub struct Element {
    pub kind: ElementKind,
    pub props: Props,
    /// Ignored for component elements.
    pub children: Vec<Node>,
    pub key: Option<String>,
}

/// A child of an element.
#[derive(Clone, Debug, Default)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Renders nothing.
    #[default]
    Empty,
}

/// Build an element, lifting a `key` prop out of `props`.
pub fn make_element(kind: ElementKind, mut props: Props, children: Vec<Node>) -> Element {
    let key = props.remove("key").and_then(|key| key.to_attribute());
    Element {
        kind,
        props,
        children,
        key,
    }
}

impl Element {
    pub fn native(tag: impl Into<String>) -> Self {
        make_element(ElementKind::Native(tag.into()), Props::new(), Vec::new())
    }

    pub fn component(component: Component) -> Self {
        make_element(ElementKind::Component(component), Props::new(), Vec::new())
    }

    pub fn fragment() -> Self {
        make_element(ElementKind::Fragment, Props::new(), Vec::new())
    }

    /// Set a prop. Setting `key` sets the element key instead.
    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        if name == "key" {
            self.key = value.into().to_attribute();
        } else {
            self.props.set(name, value);
        }
        self
    }

    #[must_use]
    pub fn attr(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.prop(name, value)
    }

    /// Attach a handler for `event` (`"click"` becomes the `onClick` prop).
    #[must_use]
    pub fn on(self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
        let mut chars = event.chars();
        let name = chars.next().map_or_else(String::new, |first| {
            format!("on{}{}", first.to_ascii_uppercase(), chars.as_str())
        });
        self.prop(name, Value::handler(handler))
    }

    #[must_use]
    pub fn style(self, style: Style) -> Self {
        self.prop("style", style)
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    #[must_use]
    pub fn children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<&String> for Node {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

impl From<i32> for Node {
    fn from(int: i32) -> Self {
        Self::Text(int.to_string())
    }
}

impl From<i64> for Node {
    fn from(int: i64) -> Self {
        Self::Text(int.to_string())
    }
}

impl From<u32> for Node {
    fn from(int: u32) -> Self {
        Self::Text(int.to_string())
    }
}

impl From<usize> for Node {
    fn from(int: usize) -> Self {
        Self::Text(int.to_string())
    }
}

impl From<f64> for Node {
    fn from(float: f64) -> Self {
        Self::Text(float.to_string())
    }
}

/// Booleans render nothing, so `flag.then(..)`-style children can be written inline.
impl From<bool> for Node {
    fn from(_flag: bool) -> Self {
        Self::Empty
    }
}

impl<T: Into<Self>> From<Option<T>> for Node {
    fn from(node: Option<T>) -> Self {
        node.map_or(Self::Empty, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_prop_is_lifted_out_of_props() {
        let element = make_element(
            ElementKind::Native("li".to_owned()),
            Props::new().with("key", 7).with("class", "row"),
            vec![],
        );
        assert_eq!(element.key.as_deref(), Some("7"));
        assert!(element.props.get("key").is_none());
        assert_eq!(element.props.get_str("class"), Some("row"));
    }

    #[test]
    fn on_builds_handler_prop() {
        let element = Element::native("button").on("click", |_event| {}).prop("key", "b");
        assert!(matches!(element.props.get("onClick"), Some(Value::Handler(_))));
        assert_eq!(element.key.as_deref(), Some("b"));
    }

    #[test]
    fn conversions() {
        assert!(matches!(Node::from(false), Node::Empty));
        assert!(matches!(Node::from(None::<&str>), Node::Empty));
        assert!(matches!(Node::from(Some(3)), Node::Text(ref text) if text == "3"));
    }
}
