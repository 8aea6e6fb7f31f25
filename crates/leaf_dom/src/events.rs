//! Event values and listener handles.

use std::rc::Rc;

use crate::document::NodeKey;

/// An event delivered to a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// The event type (e.g., "click", "input")
    pub kind: String,
    /// The node the event was dispatched on
    pub target: NodeKey,
    /// The node whose listener is currently running (differs from `target` while bubbling)
    pub current_target: NodeKey,
}

/// Type-erased event listener. Listeners are compared by pointer identity.
pub type EventListener = Rc<dyn Fn(&Event)>;

/// Event names an element node understands. Listeners for other names are still
/// attached, but callers are expected to warn about them.
pub const KNOWN_EVENTS: &[&str] = &[
    "blur",
    "change",
    "click",
    "contextmenu",
    "dblclick",
    "dragend",
    "dragstart",
    "drop",
    "error",
    "focus",
    "input",
    "keydown",
    "keypress",
    "keyup",
    "load",
    "mousedown",
    "mouseenter",
    "mouseleave",
    "mousemove",
    "mouseout",
    "mouseover",
    "mouseup",
    "pointerdown",
    "pointermove",
    "pointerup",
    "resize",
    "scroll",
    "submit",
    "touchend",
    "touchmove",
    "touchstart",
    "wheel",
];

/// Returns true if `name` is one of [`KNOWN_EVENTS`].
#[inline]
pub fn is_known_event_name(name: &str) -> bool {
    KNOWN_EVENTS.binary_search(&name).is_ok()
}
