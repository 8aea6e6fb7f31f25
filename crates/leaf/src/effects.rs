//! Pending effects and their isolated execution.
//!
//! Effects are queued while components build and flushed once the commit has
//! finished. Every callback and cleanup runs inside `catch_unwind`: a failing
//! one is logged and the remaining ones still run.

use core::fmt;
use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use log::{error, trace};

use crate::fiber::InstanceKey;
use crate::hooks::HookStore;
use crate::props::Value;

/// Teardown returned by an effect, run before the effect reruns or when its instance is deleted.
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self(Box::new(cleanup))
    }

    fn run(self) {
        (self.0)();
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup")
    }
}

pub(crate) type EffectFn = Box<dyn FnOnce() -> Option<Cleanup>>;

/// An effect whose dependencies changed during the current build.
pub(crate) struct EffectRecord {
    pub(crate) instance: InstanceKey,
    pub(crate) index: usize,
    pub(crate) store: Weak<RefCell<HookStore>>,
    pub(crate) callback: EffectFn,
}

/// Dependencies an effect slot held before the pass in progress overwrote them.
struct DepsSnapshot {
    store: Weak<RefCell<HookStore>>,
    index: usize,
    deps: Option<Vec<Value>>,
}

/// Effects queued by the pass in progress, shared with the hook scope.
#[derive(Clone, Default)]
pub(crate) struct EffectQueue {
    pending: Rc<RefCell<Vec<EffectRecord>>>,
    overwritten: Rc<RefCell<Vec<DepsSnapshot>>>,
}

impl EffectQueue {
    pub(crate) fn push(&self, record: EffectRecord) {
        self.pending.borrow_mut().push(record);
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub(crate) fn clear(&self) {
        self.pending.borrow_mut().clear();
    }

    fn take(&self) -> Vec<EffectRecord> {
        core::mem::take(&mut *self.pending.borrow_mut())
    }

    /// Remember the dependencies a build is about to replace.
    pub(crate) fn record_deps(
        &self,
        store: Weak<RefCell<HookStore>>,
        index: usize,
        deps: Option<Vec<Value>>,
    ) {
        self.overwritten
            .borrow_mut()
            .push(DepsSnapshot { store, index, deps });
    }

    /// The pass committed: the new dependencies stay.
    pub(crate) fn keep_deps(&self) {
        self.overwritten.borrow_mut().clear();
    }

    /// The pass aborted: put the previous dependencies back, newest first.
    pub(crate) fn restore_deps(&self) {
        let snapshots = core::mem::take(&mut *self.overwritten.borrow_mut());
        for snapshot in snapshots.into_iter().rev() {
            if let Some(store) = snapshot.store.upgrade() {
                store.borrow_mut().restore_deps(snapshot.index, snapshot.deps);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct FlushStats {
    pub(crate) ran: usize,
    pub(crate) failed: usize,
}

/// Run every queued effect in queue order. The queue is empty afterwards.
///
/// For each record the previous cleanup of its slot runs first, then the
/// callback; a returned cleanup is stored back into the slot. No hook store is
/// borrowed while user code runs.
pub(crate) fn flush(queue: &EffectQueue) -> FlushStats {
    let records = queue.take();
    let mut stats = FlushStats::default();
    for record in records {
        let store = record.store.upgrade();
        let prior = store
            .as_ref()
            .and_then(|store| store.borrow_mut().take_cleanup(record.index));
        if let Some(prior) = prior
            && isolate("cleanup", &record.instance, || prior.run()).is_none()
        {
            stats.failed += 1;
        }
        trace!(target: "leaf::effects", "running effect {} of {}", record.index, record.instance);
        match isolate("effect", &record.instance, record.callback) {
            Some(Some(cleanup)) => {
                if let Some(store) = store {
                    store.borrow_mut().store_cleanup(record.index, cleanup);
                }
                stats.ran += 1;
            }
            Some(None) => stats.ran += 1,
            None => stats.failed += 1,
        }
    }
    stats
}

/// Run the cleanups of a deleted instance, returning how many failed.
pub(crate) fn run_cleanups(instance: &str, cleanups: Vec<Cleanup>) -> usize {
    cleanups
        .into_iter()
        .map(|cleanup| isolate("cleanup", instance, || cleanup.run()))
        .filter(Option::is_none)
        .count()
}

/// Run user code, converting a panic into a logged `EffectCleanupFailure`.
fn isolate<R>(what: &str, instance: &str, work: impl FnOnce() -> R) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(value) => Some(value),
        Err(payload) => {
            error!(
                target: "leaf::effects",
                "EffectCleanupFailure: {what} of {instance} panicked: {}",
                panic_message(payload.as_ref())
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
