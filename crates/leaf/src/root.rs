//! Application entry point tying a render target, a render context and a
//! scheduler together.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use leaf_dom::{Document, Event, NodeKey, RenderTarget};
use log::trace;

use crate::config::LeafConfig;
use crate::element::Node;
use crate::error::RenderError;
use crate::reconciler::{PassReport, RenderContext};
use crate::scheduler::Scheduler;

/// A mounted application.
///
/// The render function passed to [`Root::render`] is called once per pass to
/// produce the root element; passes themselves are driven by the scheduler.
pub struct Root<T: RenderTarget + 'static> {
    target: Rc<RefCell<T>>,
    context: Rc<RefCell<RenderContext>>,
    last_report: Rc<RefCell<Option<PassReport>>>,
    scheduler: Scheduler,
    container: NodeKey,
}

impl<T: RenderTarget + 'static> Root<T> {
    /// Mount into `container` of `target` with configuration read from the environment.
    pub fn new(target: T, container: NodeKey) -> Self {
        Self::with_config(target, container, LeafConfig::from_env())
    }

    pub fn with_config(target: T, container: NodeKey, config: LeafConfig) -> Self {
        let scheduler = Scheduler::new().with_chained_pass_limit(config.chained_pass_limit());
        Self {
            target: Rc::new(RefCell::new(target)),
            context: Rc::new(RefCell::new(RenderContext::new(scheduler.clone(), config))),
            last_report: Rc::new(RefCell::new(None)),
            scheduler,
            container,
        }
    }

    /// Register `app` as the render function and run the first pass.
    pub fn render<F>(&self, app: F) -> Result<(), RenderError>
    where
        F: Fn() -> Node + 'static,
    {
        let target = Rc::clone(&self.target);
        let context = Rc::clone(&self.context);
        let last_report = Rc::clone(&self.last_report);
        let container = self.container;
        self.scheduler.set_render_function(move || {
            let node = app();
            let (mut report, pending) = {
                let mut target = target.borrow_mut();
                let mut context = context.borrow_mut();
                let report = context.render_pass(&node, &mut *target, container)?;
                (report, context.pending_effects())
            };
            // Effects may read the target and the context.
            pending.flush(&mut report);
            *last_report.borrow_mut() = Some(report);
            Ok(())
        });
        self.scheduler.request_render()
    }

    pub fn request_render(&self) -> Result<(), RenderError> {
        self.scheduler.request_render()
    }

    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub const fn container(&self) -> NodeKey {
        self.container
    }

    /// Report of the most recent successful pass.
    pub fn last_report(&self) -> Option<PassReport> {
        self.last_report.borrow().clone()
    }

    pub fn target(&self) -> Ref<'_, T> {
        self.target.borrow()
    }

    /// Mutable access to the target between passes.
    pub fn target_mut(&self) -> RefMut<'_, T> {
        self.target.borrow_mut()
    }

    pub fn context(&self) -> Ref<'_, RenderContext> {
        self.context.borrow()
    }
}

impl Root<Document> {
    /// Dispatch `event` at `node`, bubbling to its ancestors.
    ///
    /// Listeners run with no document borrow held, so they may update state
    /// and trigger passes. Returns how many listeners ran.
    pub fn dispatch_event(&self, node: NodeKey, event: &str) -> usize {
        let listeners = self.target.borrow().listeners_for(node, event);
        trace!(target: "leaf_dom", "dispatching {event} at {node} to {} listeners", listeners.len());
        for (current_target, listener) in &listeners {
            listener(&Event {
                kind: event.to_owned(),
                target: node,
                current_target: *current_target,
            });
        }
        listeners.len()
    }
}
