use crate::core::callback::{CallbackDecorator, Listeners};
use crate::core::mutation_guard::MutationGuard;
use crate::domain::model::{CollectionEvent, ListenerHandle, Shared};
use crate::utils::error::Result;
use std::rc::Rc;

/// Guard, decorator and listeners shared by every collection type.
pub(crate) struct EventHub<T> {
    guard: MutationGuard,
    decorator: Rc<CallbackDecorator>,
    listeners: Listeners<T>,
}

impl<T> EventHub<T> {
    pub(crate) fn new(guard: MutationGuard, decorator: Rc<CallbackDecorator>) -> Self {
        Self {
            guard,
            decorator,
            listeners: Listeners::default(),
        }
    }

    pub(crate) fn owner(&self) -> &str {
        self.guard.owner()
    }

    pub(crate) fn guard(&self) -> &MutationGuard {
        &self.guard
    }

    pub(crate) fn listen<F>(&self, event: CollectionEvent, label: Option<String>, listener: F) -> ListenerHandle
    where
        F: Fn(&Shared<T>) -> anyhow::Result<()> + 'static,
    {
        let decorated = match label {
            Some(label) => self.decorator.decorate_labeled(label, listener),
            None => self.decorator.decorate(listener),
        };
        self.listeners.register(event, decorated)
    }

    pub(crate) fn unlisten(&self, handle: ListenerHandle) -> bool {
        self.listeners.unregister(handle)
    }

    pub(crate) fn listener_count(&self, event: CollectionEvent) -> usize {
        self.listeners.count(event)
    }

    /// Runs `mutate` inside a dispatch scope, then fires `event` for every
    /// element it returns. The scope is entered first so a depth overflow
    /// fails before anything changes.
    pub(crate) fn mutate_and_fire<R>(
        &self,
        event: CollectionEvent,
        mutate: impl FnOnce() -> (R, Vec<Shared<T>>),
    ) -> Result<R> {
        let _scope = self.guard.enter_dispatch()?;
        let (result, affected) = mutate();
        if affected.is_empty() {
            return Ok(result);
        }

        let listeners = self.listeners.snapshot(event);
        let mut failures = Vec::new();
        for element in &affected {
            self.decorator.invoke(&listeners, element, &mut failures);
        }
        self.decorator.raise(self.owner(), event, failures)?;
        Ok(result)
    }

    /// Registers `action` for future additions and runs it for `existing` now.
    /// The registration stands even when some of the immediate runs fail.
    pub(crate) fn all<F>(&self, existing: Vec<Shared<T>>, action: F) -> Result<ListenerHandle>
    where
        F: Fn(&Shared<T>) -> anyhow::Result<()> + 'static,
    {
        let _scope = self.guard.enter_dispatch()?;
        let decorated = self.decorator.decorate(action);
        let handle = self.listeners.register(CollectionEvent::Added, decorated.clone());

        let mut failures = Vec::new();
        for element in &existing {
            self.decorator
                .invoke(std::slice::from_ref(&decorated), element, &mut failures);
        }
        self.decorator
            .raise(self.owner(), CollectionEvent::Added, failures)?;
        Ok(handle)
    }
}
