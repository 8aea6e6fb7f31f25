//! Render scheduler: collapses render requests and serializes passes.
//!
//! Requests that arrive while a pass is running (from effects, setters or
//! listeners) only set a flag. When the pass finishes, the flag triggers exactly
//! one follow-up pass, however many requests were made.

use core::fmt;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, error, trace, warn};

use crate::error::RenderError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchedulerState {
    #[default]
    Idle,
    Rendering,
}

/// The function that executes one render pass.
pub type PassFn = Rc<dyn Fn() -> Result<(), RenderError>>;

#[derive(Default)]
struct SchedulerInner {
    state: Cell<SchedulerState>,
    queued: Cell<bool>,
    render: RefCell<Option<PassFn>>,
    passes: Cell<u64>,
    max_chained: Cell<Option<u32>>,
}

/// Cheaply cloneable handle to a shared scheduler.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

/// Returns the scheduler to idle when a pass ends, including by unwinding.
struct PassGuard<'sched>(&'sched SchedulerInner);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.state.set(SchedulerState::Idle);
        self.0.passes.set(self.0.passes.get().saturating_add(1));
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the number of follow-up passes one drain may chain.
    #[must_use]
    pub fn with_chained_pass_limit(self, limit: Option<u32>) -> Self {
        self.inner.max_chained.set(limit);
        self
    }

    /// Register the pass function, replacing any earlier one.
    pub fn set_render_function(&self, render: impl Fn() -> Result<(), RenderError> + 'static) {
        *self.inner.render.borrow_mut() = Some(Rc::new(render));
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.state.get()
    }

    pub fn is_rendering(&self) -> bool {
        self.state() == SchedulerState::Rendering
    }

    /// Whether a follow-up pass is pending.
    pub fn is_queued(&self) -> bool {
        self.inner.queued.get()
    }

    /// Number of passes executed so far, failed ones included.
    pub fn passes(&self) -> u64 {
        self.inner.passes.get()
    }

    /// Run a pass now, or queue one if a pass is already running.
    ///
    /// When idle, runs passes back to back until no request arrived during the
    /// last one. A failing pass returns the scheduler to idle, drops any queued
    /// follow-up and reports the error to the caller.
    pub fn request_render(&self) -> Result<(), RenderError> {
        let inner = &*self.inner;
        if inner.state.get() == SchedulerState::Rendering {
            if !inner.queued.replace(true) {
                trace!(target: "leaf::scheduler", "render requested during a pass; queued");
            }
            return Ok(());
        }
        let render = inner
            .render
            .borrow()
            .clone()
            .ok_or(RenderError::SchedulerNotConfigured)?;

        let mut chained = 0_u32;
        loop {
            inner.queued.set(false);
            inner.state.set(SchedulerState::Rendering);
            let outcome = {
                let _guard = PassGuard(inner);
                render()
            };
            if let Err(err) = outcome {
                if inner.queued.replace(false) {
                    warn!(target: "leaf::scheduler", "dropping queued pass after failure: {err}");
                }
                return Err(err);
            }
            if !inner.queued.get() {
                debug!(target: "leaf::scheduler", "idle after {} chained passes", chained + 1);
                return Ok(());
            }
            chained += 1;
            if let Some(limit) = inner.max_chained.get()
                && chained > limit
            {
                inner.queued.set(false);
                error!(target: "leaf::scheduler", "stopping after {limit} follow-up passes");
                return Err(RenderError::ChainedPassLimit { limit });
            }
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state())
            .field("queued", &self.is_queued())
            .field("passes", &self.passes())
            .field("configured", &self.inner.render.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_scheduler_errors() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.request_render(), Err(RenderError::SchedulerNotConfigured));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn requests_during_a_pass_collapse_into_one_follow_up() {
        let scheduler = Scheduler::new();
        let runs = Rc::new(Cell::new(0_u32));
        let handle = scheduler.clone();
        let counter = Rc::clone(&runs);
        scheduler.set_render_function(move || {
            counter.set(counter.get() + 1);
            if counter.get() == 1 {
                for _ in 0..5 {
                    handle.request_render()?;
                }
            }
            Ok(())
        });
        assert_eq!(scheduler.request_render(), Ok(()));
        assert_eq!(runs.get(), 2);
        assert_eq!(scheduler.passes(), 2);
        assert!(!scheduler.is_queued());
    }

    #[test]
    fn failure_returns_to_idle_and_drops_queue() {
        let scheduler = Scheduler::new();
        let handle = scheduler.clone();
        let runs = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&runs);
        scheduler.set_render_function(move || {
            counter.set(counter.get() + 1);
            handle.request_render()?;
            Err(RenderError::StructuralInvariant("boom".to_owned()))
        });
        assert!(scheduler.request_render().is_err());
        assert_eq!(runs.get(), 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(!scheduler.is_queued());
    }

    #[test]
    fn chained_pass_limit() {
        let scheduler = Scheduler::new().with_chained_pass_limit(Some(3));
        let handle = scheduler.clone();
        scheduler.set_render_function(move || handle.request_render());
        assert_eq!(
            scheduler.request_render(),
            Err(RenderError::ChainedPassLimit { limit: 3 })
        );
        assert_eq!(scheduler.passes(), 4);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }
}
