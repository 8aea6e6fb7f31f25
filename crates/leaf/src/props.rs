//! Prop values, prop maps and the mapping of props onto native host nodes.

use core::fmt;
use std::rc::Rc;

use leaf_dom::{Event, EventListener};
use smallvec::SmallVec;

use crate::style::Style;

/// A prop or effect-dependency value.
///
/// Equality is shallow: scalars and strings compare by value, floats by bit
/// pattern, styles by their declarations and handlers by pointer identity.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Style(Style),
    Handler(EventListener),
}

impl Value {
    /// Wrap a closure as an event handler value.
    pub fn handler(handler: impl Fn(&Event) + 'static) -> Self {
        Self::Handler(Rc::new(handler))
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(int) => Some(*int),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text),
            _ => None,
        }
    }

    /// Attribute text for this value, or `None` when the attribute should be absent.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            Self::Null | Self::Bool(false) | Self::Handler(_) => None,
            Self::Bool(true) => Some(String::new()),
            Self::Int(int) => Some(int.to_string()),
            Self::Float(float) => Some(float.to_string()),
            Self::Str(text) => Some(text.to_string()),
            Self::Style(style) => Some(style.to_inline()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(lhs), Self::Bool(rhs)) => lhs == rhs,
            (Self::Int(lhs), Self::Int(rhs)) => lhs == rhs,
            (Self::Float(lhs), Self::Float(rhs)) => lhs.to_bits() == rhs.to_bits(),
            (Self::Str(lhs), Self::Str(rhs)) => lhs == rhs,
            (Self::Style(lhs), Self::Style(rhs)) => lhs == rhs,
            (Self::Handler(lhs), Self::Handler(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Int(int) => write!(f, "{int}"),
            Self::Float(float) => write!(f, "{float}"),
            Self::Str(text) => write!(f, "{text:?}"),
            Self::Style(style) => write!(f, "style({style})"),
            Self::Handler(_) => f.write_str("<handler>"),
        }
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<i32> for Value {
    fn from(int: i32) -> Self {
        Self::Int(i64::from(int))
    }
}

impl From<i64> for Value {
    fn from(int: i64) -> Self {
        Self::Int(int)
    }
}

impl From<u32> for Value {
    fn from(int: u32) -> Self {
        Self::Int(i64::from(int))
    }
}

impl From<usize> for Value {
    fn from(int: usize) -> Self {
        Self::Int(int as i64)
    }
}

impl From<f64> for Value {
    fn from(float: f64) -> Self {
        Self::Float(float)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Str(Rc::from(text))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Str(Rc::from(text))
    }
}

impl From<&String> for Value {
    fn from(text: &String) -> Self {
        Self::Str(Rc::from(text.as_str()))
    }
}

impl From<Style> for Value {
    fn from(style: Style) -> Self {
        Self::Style(style)
    }
}

impl From<EventListener> for Value {
    fn from(listener: EventListener) -> Self {
        Self::Handler(listener)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// An ordered prop map. The reserved `key` prop is never stored here.
#[derive(Clone, Debug, Default)]
pub struct Props {
    entries: SmallVec<[(String, Value); 4]>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Props::set`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set `name`, replacing an earlier value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(prop, _)| *prop == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Remove `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(prop, _)| prop == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, value)| value)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Same set of names with pairwise equal values, regardless of order.
    pub fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, value)| other.get(name).is_some_and(|theirs| theirs == value))
    }
}

/// How a single prop lands on a native host node.
pub(crate) enum HostProp<'a> {
    /// An `on<Event>` handler: attach under the lowercased event name.
    Listener {
        event: String,
        listener: &'a EventListener,
    },
    /// A plain attribute; `None` means the attribute must be absent.
    Attribute {
        name: &'a str,
        value: Option<String>,
    },
}

impl fmt::Debug for HostProp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listener { event, .. } => write!(f, "Listener({event}, <handler>)"),
            Self::Attribute { name, value } => write!(f, "Attribute({name}, {value:?})"),
        }
    }
}

/// Map one prop onto its host representation.
pub(crate) fn host_prop<'a>(name: &'a str, value: &'a Value) -> HostProp<'a> {
    if let Value::Handler(listener) = value
        && let Some(event) = listener_event(name)
    {
        return HostProp::Listener { event, listener };
    }
    let name = match name {
        "className" => "class",
        "htmlFor" => "for",
        other => other,
    };
    HostProp::Attribute {
        name,
        value: value.to_attribute(),
    }
}

/// `onClick` -> `click`; `None` for names that do not follow the `on<Event>` shape.
pub(crate) fn listener_event(name: &str) -> Option<String> {
    let rest = name.strip_prefix("on")?;
    rest.chars()
        .next()
        .filter(char::is_ascii_uppercase)
        .map(|_| rest.to_ascii_lowercase())
}
