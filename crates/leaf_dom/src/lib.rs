//! In-memory document used as the render target of the leaf reconciler.
//!
//! The reconciler never talks to a concrete document directly. It issues the
//! primitive operations of [`RenderTarget`] (create, set/remove attribute,
//! add/remove listener, insert, remove) and [`Document`] is the arena-backed
//! implementation used by applications and tests. Every applied mutation is
//! journaled as a [`DOMUpdate`] and mirrored to registered [`DOMSubscriber`]s.

#![allow(
    clippy::missing_errors_doc,
    reason = "Every fallible operation fails with the same DomError taxonomy"
)]

pub mod document;
pub mod error;
pub mod events;
pub mod target;

pub use document::{DOMNode, DOMSubscriber, DOMUpdate, Document, NodeKey, NodeKind};
pub use error::DomError;
pub use events::{Event, EventListener, KNOWN_EVENTS, is_known_event_name};
pub use target::RenderTarget;
