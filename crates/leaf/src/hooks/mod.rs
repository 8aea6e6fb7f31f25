//! Per-instance hook storage.
//!
//! Every component instance owns a [`HookStore`]: an ordered list of slots
//! addressed by call order within one build. The registry maps instance keys to
//! stores and lives as long as the instance stays in the tree.

mod scope;

use core::fmt;
use core::marker::PhantomData;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use log::{trace, warn};

pub use scope::Scope;

use crate::effects::Cleanup;
use crate::error::RenderError;
use crate::fiber::InstanceKey;
use crate::props::Value;
use crate::scheduler::Scheduler;

pub(crate) enum HookSlot {
    State(Box<dyn Any>),
    Ref(Rc<dyn Any>),
    Effect {
        deps: Option<Vec<Value>>,
        cleanup: Option<Cleanup>,
    },
}

impl HookSlot {
    const fn name(&self) -> &'static str {
        match self {
            Self::State(_) => "use_state",
            Self::Ref(_) => "use_ref",
            Self::Effect { .. } => "use_effect",
        }
    }
}

/// Hook slots of one component instance.
pub struct HookStore {
    instance: InstanceKey,
    slots: Vec<HookSlot>,
    cursor: usize,
    builds: u64,
}

impl HookStore {
    fn new(instance: InstanceKey) -> Self {
        Self {
            instance,
            slots: Vec::new(),
            cursor: 0,
            builds: 0,
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn begin_build(&mut self) {
        self.cursor = 0;
    }

    /// Close a build, warning when the number of hook calls drifted.
    pub(crate) fn finish_build(&mut self, check_drift: bool) {
        if check_drift && self.builds > 0 && self.cursor != self.slots.len() {
            warn!(
                target: "leaf::hooks",
                "{} called {} hooks but has {} slots; hooks must run unconditionally and in order",
                self.instance,
                self.cursor,
                self.slots.len()
            );
        }
        self.builds += 1;
    }

    fn next_index(&mut self) -> usize {
        let index = self.cursor;
        self.cursor += 1;
        index
    }

    fn mismatch(&self, index: usize, expected: &'static str, found: &'static str) -> RenderError {
        RenderError::HookSlotMismatch {
            instance: self.instance.to_string(),
            index,
            expected,
            found,
        }
    }

    fn write_state<T: 'static>(&mut self, index: usize, value: T) -> Result<(), RenderError> {
        let found = match self.slots.get_mut(index) {
            Some(HookSlot::State(boxed)) if boxed.is::<T>() => {
                *boxed = Box::new(value);
                return Ok(());
            }
            Some(HookSlot::State(_)) => "use_state of another type",
            Some(other) => other.name(),
            None => "an empty slot",
        };
        Err(self.mismatch(index, "use_state", found))
    }

    fn read_state<T: Clone + 'static>(&self, index: usize) -> Result<T, RenderError> {
        match self.slots.get(index) {
            Some(HookSlot::State(boxed)) => boxed
                .downcast_ref::<T>()
                .cloned()
                .ok_or_else(|| self.mismatch(index, "use_state", "use_state of another type")),
            Some(other) => Err(self.mismatch(index, "use_state", other.name())),
            None => Err(self.mismatch(index, "use_state", "an empty slot")),
        }
    }

    pub(crate) fn take_cleanup(&mut self, index: usize) -> Option<Cleanup> {
        match self.slots.get_mut(index) {
            Some(HookSlot::Effect { cleanup, .. }) => cleanup.take(),
            _ => None,
        }
    }

    pub(crate) fn store_cleanup(&mut self, index: usize, next: Cleanup) {
        if let Some(HookSlot::Effect { cleanup, .. }) = self.slots.get_mut(index) {
            *cleanup = Some(next);
        }
    }

    pub(crate) fn restore_deps(&mut self, index: usize, previous: Option<Vec<Value>>) {
        if let Some(HookSlot::Effect { deps, .. }) = self.slots.get_mut(index) {
            *deps = previous;
        }
    }

    /// Drain every stored cleanup in slot order.
    pub(crate) fn take_all_cleanups(&mut self) -> Vec<Cleanup> {
        self.slots
            .iter_mut()
            .filter_map(|slot| match slot {
                HookSlot::Effect { cleanup, .. } => cleanup.take(),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Debug for HookStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookStore")
            .field("instance", &self.instance)
            .field(
                "slots",
                &self.slots.iter().map(HookSlot::name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Hook stores of all mounted component instances.
#[derive(Debug, Default)]
pub struct HookRegistry {
    stores: HashMap<InstanceKey, Rc<RefCell<HookStore>>>,
}

impl HookRegistry {
    /// Store for `instance`, created empty on first use.
    pub(crate) fn fetch_or_create(&mut self, instance: &InstanceKey) -> Rc<RefCell<HookStore>> {
        let store = self.stores.entry(Rc::clone(instance)).or_insert_with(|| {
            trace!(target: "leaf::hooks", "creating hook store for {instance}");
            Rc::new(RefCell::new(HookStore::new(Rc::clone(instance))))
        });
        Rc::clone(store)
    }

    pub(crate) fn remove(&mut self, instance: &str) -> Option<Rc<RefCell<HookStore>>> {
        self.stores.remove(instance)
    }

    pub fn contains(&self, instance: &str) -> bool {
        self.stores.contains_key(instance)
    }

    /// Number of slots held for `instance`.
    pub fn slot_count(&self, instance: &str) -> Option<usize> {
        self.stores.get(instance).map(|store| store.borrow().len())
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(AsRef::as_ref)
    }
}

/// Writes a state slot and requests a render.
///
/// Holds its store weakly: once the instance is deleted, writes are ignored.
pub struct Setter<T> {
    store: Weak<RefCell<HookStore>>,
    index: usize,
    instance: InstanceKey,
    scheduler: Scheduler,
    marker: PhantomData<fn(T)>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            store: Weak::clone(&self.store),
            index: self.index,
            instance: Rc::clone(&self.instance),
            scheduler: self.scheduler.clone(),
            marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Setter({}#{})", self.instance, self.index)
    }
}

impl<T: Clone + 'static> Setter<T> {
    /// Replace the state value, then request a render.
    pub fn set(&self, value: T) -> Result<(), RenderError> {
        let Some(store) = self.live_store() else {
            return Ok(());
        };
        store.borrow_mut().write_state(self.index, value)?;
        drop(store);
        self.scheduler.request_render()
    }

    /// Compute the next value from the current one, then request a render.
    pub fn update(&self, next: impl FnOnce(&T) -> T) -> Result<(), RenderError> {
        let Some(store) = self.live_store() else {
            return Ok(());
        };
        let current = store.borrow().read_state::<T>(self.index)?;
        let value = next(&current);
        store.borrow_mut().write_state(self.index, value)?;
        drop(store);
        self.scheduler.request_render()
    }

    /// Current stored value, `None` once the instance is gone.
    pub fn get(&self) -> Option<T> {
        let store = self.store.upgrade()?;
        let value = store.borrow().read_state::<T>(self.index).ok();
        value
    }

    fn live_store(&self) -> Option<Rc<RefCell<HookStore>>> {
        let store = self.store.upgrade();
        if store.is_none() {
            warn!(
                target: "leaf::hooks",
                "state update for unmounted instance {} ignored",
                self.instance
            );
        }
        store
    }
}

/// A mutable cell that persists across builds; writes never trigger a render.
pub struct RefHandle<T>(Rc<RefCell<T>>);

impl<T> Clone for RefHandle<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> RefHandle<T> {
    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.0.borrow())
    }

    pub fn with_mut<R>(&self, write: impl FnOnce(&mut T) -> R) -> R {
        write(&mut self.0.borrow_mut())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> RefHandle<T> {
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for RefHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefHandle").field(&self.0.borrow()).finish()
    }
}

/// Dependencies of an effect changed when either side is absent or the lists differ.
fn deps_changed(previous: Option<&[Value]>, next: Option<&[Value]>) -> bool {
    match (previous, next) {
        (Some(previous), Some(next)) => previous != next,
        _ => true,
    }
}
