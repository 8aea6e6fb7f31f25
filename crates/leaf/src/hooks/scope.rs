use core::fmt;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use super::{HookSlot, HookStore, RefHandle, Setter, deps_changed};
use crate::effects::{Cleanup, EffectQueue, EffectRecord};
use crate::error::RenderError;
use crate::fiber::InstanceKey;
use crate::props::Value;
use crate::scheduler::Scheduler;

#[derive(Clone)]
struct Binding {
    instance: InstanceKey,
    store: Rc<RefCell<HookStore>>,
}

struct ScopeInner {
    binding: RefCell<Option<Binding>>,
    effects: EffectQueue,
    scheduler: Scheduler,
}

/// Hook entry point handed to component render functions.
///
/// A scope is bound to one component instance only while that instance builds.
/// Calling a hook on an unbound scope (for example a clone kept past the render
/// function) fails with [`RenderError::InvalidHookContext`].
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    pub(crate) fn new(scheduler: Scheduler, effects: EffectQueue) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                binding: RefCell::new(None),
                effects,
                scheduler,
            }),
        }
    }

    pub(crate) fn bind(&self, instance: InstanceKey, store: Rc<RefCell<HookStore>>) {
        *self.inner.binding.borrow_mut() = Some(Binding { instance, store });
    }

    pub(crate) fn unbind(&self) {
        self.inner.binding.borrow_mut().take();
    }

    /// Key of the instance currently building.
    pub fn instance_key(&self) -> Option<InstanceKey> {
        self.inner
            .binding
            .borrow()
            .as_ref()
            .map(|binding| Rc::clone(&binding.instance))
    }

    /// Scheduler the setters of this scope report to.
    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    fn current(&self, hook: &'static str) -> Result<Binding, RenderError> {
        self.inner
            .binding
            .borrow()
            .clone()
            .ok_or(RenderError::InvalidHookContext { hook })
    }

    /// State that persists across builds of this instance.
    ///
    /// Returns the current value and a setter. `initial` is only used on the first build.
    pub fn use_state<T: Clone + 'static>(&self, initial: T) -> Result<(T, Setter<T>), RenderError> {
        self.use_state_with(|| initial)
    }

    /// Like [`Scope::use_state`], computing the initial value only when the slot is created.
    pub fn use_state_with<T, F>(&self, init: F) -> Result<(T, Setter<T>), RenderError>
    where
        T: Clone + 'static,
        F: FnOnce() -> T,
    {
        let binding = self.current("use_state")?;
        let (index, existing) = {
            let mut hooks = binding.store.borrow_mut();
            let index = hooks.next_index();
            let existing = (index < hooks.slots.len())
                .then(|| hooks.read_state::<T>(index))
                .transpose()?;
            (index, existing)
        };
        let value = match existing {
            Some(value) => value,
            None => {
                let value = init();
                binding
                    .store
                    .borrow_mut()
                    .slots
                    .push(HookSlot::State(Box::new(value.clone())));
                trace!(target: "leaf::hooks", "{} state slot {index} created", binding.instance);
                value
            }
        };
        let setter = Setter {
            store: Rc::downgrade(&binding.store),
            index,
            instance: binding.instance,
            scheduler: self.inner.scheduler.clone(),
            marker: core::marker::PhantomData,
        };
        Ok((value, setter))
    }

    /// A mutable cell that persists across builds. Writes never request a render.
    pub fn use_ref<T: 'static>(&self, initial: T) -> Result<RefHandle<T>, RenderError> {
        let binding = self.current("use_ref")?;
        let mut hooks = binding.store.borrow_mut();
        let index = hooks.next_index();
        let found = match hooks.slots.get(index) {
            None => {
                let cell = Rc::new(RefCell::new(initial));
                let erased: Rc<dyn Any> = Rc::<RefCell<T>>::clone(&cell);
                hooks.slots.push(HookSlot::Ref(erased));
                return Ok(RefHandle(cell));
            }
            Some(HookSlot::Ref(erased)) => match Rc::clone(erased).downcast::<RefCell<T>>() {
                Ok(cell) => return Ok(RefHandle(cell)),
                Err(_) => "use_ref of another type",
            },
            Some(other) => other.name(),
        };
        Err(hooks.mismatch(index, "use_ref", found))
    }

    /// Run `effect` after the commit of this build when its dependencies changed.
    ///
    /// `None` dependencies run the effect after every build; an empty list runs
    /// it once, after the first build. A cleanup returned by the effect runs
    /// before the next run and when the instance is deleted.
    pub fn use_effect<F>(&self, deps: Option<Vec<Value>>, effect: F) -> Result<(), RenderError>
    where
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        let binding = self.current("use_effect")?;
        let (index, changed) = {
            let mut hooks = binding.store.borrow_mut();
            let index = hooks.next_index();
            let found = match hooks.slots.get_mut(index) {
                None => None,
                Some(HookSlot::Effect { deps: previous, .. }) => {
                    let changed = deps_changed(previous.as_deref(), deps.as_deref());
                    let replaced = core::mem::replace(previous, deps.clone());
                    self.inner
                        .effects
                        .record_deps(Rc::downgrade(&binding.store), index, replaced);
                    Some(Ok(changed))
                }
                Some(other) => Some(Err(other.name())),
            };
            let changed = match found {
                None => {
                    hooks.slots.push(HookSlot::Effect {
                        deps,
                        cleanup: None,
                    });
                    true
                }
                Some(Ok(changed)) => changed,
                Some(Err(found)) => return Err(hooks.mismatch(index, "use_effect", found)),
            };
            (index, changed)
        };
        if changed {
            trace!(target: "leaf::hooks", "{} effect {index} queued", binding.instance);
            self.inner.effects.push(EffectRecord {
                instance: binding.instance,
                index,
                store: Rc::downgrade(&binding.store),
                callback: Box::new(effect),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("instance", &self.instance_key())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_scope_rejects_hooks() {
        let scope = Scope::new(Scheduler::new(), EffectQueue::default());
        assert_eq!(
            scope.use_state(0).map(|(value, _)| value),
            Err(RenderError::InvalidHookContext { hook: "use_state" })
        );
        assert!(matches!(
            scope.use_ref(0),
            Err(RenderError::InvalidHookContext { hook: "use_ref" })
        ));
        assert_eq!(
            scope.use_effect(None, || None),
            Err(RenderError::InvalidHookContext { hook: "use_effect" })
        );
    }

    #[test]
    fn slots_persist_across_builds() -> Result<(), RenderError> {
        let effects = EffectQueue::default();
        let scope = Scope::new(Scheduler::new(), effects.clone());
        let instance: InstanceKey = Rc::from("root-0:Counter");
        let store = Rc::new(RefCell::new(HookStore::new(Rc::clone(&instance))));

        let mut refs = Vec::new();
        for build in 0..3 {
            store.borrow_mut().begin_build();
            scope.bind(Rc::clone(&instance), Rc::clone(&store));
            let (count, _set) = scope.use_state(build * 10)?;
            refs.push(scope.use_ref(String::new())?);
            scope.use_effect(Some(vec![]), || None)?;
            scope.unbind();
            store.borrow_mut().finish_build(true);
            assert_eq!(count, 0);
        }
        assert_eq!(store.borrow().len(), 3);
        assert!(refs[0].ptr_eq(&refs[2]));
        assert_eq!(effects.len(), 1);
        Ok(())
    }
}
