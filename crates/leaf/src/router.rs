//! Path-based navigation built on the public component API.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::deps;
use crate::element::{Component, Element, Node};
use crate::error::RenderError;
use crate::scheduler::Scheduler;

/// Shared current-path handle. Navigating requests a render.
#[derive(Clone, Debug)]
pub struct Location {
    path: Rc<RefCell<String>>,
    scheduler: Scheduler,
}

impl Location {
    pub fn new(initial: impl Into<String>, scheduler: Scheduler) -> Self {
        Self {
            path: Rc::new(RefCell::new(initial.into())),
            scheduler,
        }
    }

    pub fn path(&self) -> String {
        self.path.borrow().clone()
    }

    /// Switch to `path` and request a render. Navigating to the current path does nothing.
    pub fn navigate(&self, path: impl Into<String>) -> Result<(), RenderError> {
        let path = path.into();
        if *self.path.borrow() == path {
            return Ok(());
        }
        debug!(target: "leaf::router", "navigating to {path}");
        *self.path.borrow_mut() = path;
        self.scheduler.request_render()
    }
}

/// Maps paths to page components.
#[derive(Debug)]
pub struct Router {
    location: Location,
    routes: Vec<(String, Component)>,
    fallback: Option<Component>,
}

impl Router {
    pub const fn new(location: Location) -> Self {
        Self {
            location,
            routes: Vec::new(),
            fallback: None,
        }
    }

    #[must_use]
    pub fn route(mut self, path: impl Into<String>, page: Component) -> Self {
        self.routes.push((path.into(), page));
        self
    }

    /// Page rendered when no route matches.
    #[must_use]
    pub fn fallback(mut self, page: Component) -> Self {
        self.fallback = Some(page);
        self
    }

    fn resolve(&self, path: &str) -> Option<&Component> {
        self.routes
            .iter()
            .find(|(route, _)| route == path)
            .map(|(_, page)| page)
            .or(self.fallback.as_ref())
    }

    /// A component rendering the page of the current path.
    ///
    /// The page is keyed by the path, so two routes never share hook state even
    /// when they render the same component.
    pub fn into_component(self) -> Component {
        let router = Rc::new(self);
        Component::new("Router", move |scope, _props| {
            let path = router.location.path();
            let logged = path.clone();
            scope.use_effect(deps![path.as_str()], move || {
                debug!(target: "leaf::router", "route {logged} active");
                None
            })?;
            Ok(router.resolve(&path).map_or(Node::Empty, |page| {
                Element::component(page.clone()).key(path).into()
            }))
        })
    }
}
