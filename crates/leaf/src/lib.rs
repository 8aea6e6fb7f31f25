//! Leaf: a minimal reactive UI rendering engine.
//!
//! Applications describe their interface as a tree of [`Node`]s built from
//! native elements, fragments and [`Component`]s. Every render pass rebuilds
//! that description, diffs it against the previous pass and applies only the
//! differences to a [`RenderTarget`]. Components keep state between passes
//! through hooks on their [`Scope`]; state changes request a pass from the
//! [`Scheduler`], which collapses bursts of requests into one follow-up pass.
//!
//! ```no_run
//! use leaf::{Component, Element, Root};
//! use leaf_dom::Document;
//!
//! let counter = Component::new("Counter", |scope, _props| {
//!     let (count, _set_count) = scope.use_state(0)?;
//!     Ok(Element::native("p").child(format!("Count: {count}")).into())
//! });
//! let document = Document::new();
//! let container = document.root();
//! let root = Root::new(document, container);
//! root.render(move || Element::component(counter.clone()).into())?;
//! # Ok::<(), leaf::RenderError>(())
//! ```

#![allow(
    clippy::missing_errors_doc,
    reason = "Fallible operations share the RenderError taxonomy documented on the type"
)]

pub mod config;
pub mod effects;
pub mod element;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod props;
pub mod reconciler;
pub mod root;
pub mod router;
pub mod scheduler;
pub mod style;

pub use config::LeafConfig;
pub use effects::Cleanup;
pub use element::{Component, Element, ElementKind, Node, make_element};
pub use error::RenderError;
pub use fiber::{Classification, FiberKind, FiberTree, InstanceKey};
pub use hooks::{HookRegistry, RefHandle, Scope, Setter};
pub use leaf_dom::{Document, Event, NodeKey, RenderTarget};
pub use props::{Props, Value};
pub use reconciler::{PassReport, PendingEffects, RenderContext};
pub use root::Root;
pub use router::{Location, Router};
pub use scheduler::{Scheduler, SchedulerState};
pub use style::Style;

/// Effect dependency list: `deps![a, b]` compares `a` and `b` between builds,
/// `deps![]` runs once. Pass `None` to run after every build.
#[macro_export]
macro_rules! deps {
    ($($dep:expr),* $(,)?) => {
        ::core::option::Option::Some(::std::vec![$($crate::Value::from($dep)),*])
    };
}
