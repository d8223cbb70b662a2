use crate::domain::model::{CollectionEvent, ListenerHandle, ListenerId, Shared};
use crate::domain::ports::FailureReporter;
use crate::utils::error::{ListenerDispatchError, ListenerFailure};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Callback<T> = Rc<dyn Fn(&Shared<T>) -> anyhow::Result<()>>;

/// A listener after decoration: the callback plus its registration metadata.
pub struct DecoratedListener<T> {
    id: ListenerId,
    label: Option<String>,
    callback: Callback<T>,
}

impl<T> Clone for DecoratedListener<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            label: self.label.clone(),
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<T> DecoratedListener<T> {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Wraps listeners so every dispatch follows the same rules: registration
/// order, every listener runs, failures are collected and raised once.
pub struct CallbackDecorator {
    next_id: Cell<u64>,
    reporter: Option<Rc<dyn FailureReporter>>,
}

impl Default for CallbackDecorator {
    fn default() -> Self {
        Self::new(Some(Rc::new(TracingReporter)))
    }
}

impl CallbackDecorator {
    pub fn new(reporter: Option<Rc<dyn FailureReporter>>) -> Self {
        Self {
            next_id: Cell::new(1),
            reporter,
        }
    }

    /// Decorator that only raises failures, without reporting them.
    pub fn silent() -> Self {
        Self::new(None)
    }

    pub fn is_reporting(&self) -> bool {
        self.reporter.is_some()
    }

    pub fn decorate<T, F>(&self, listener: F) -> DecoratedListener<T>
    where
        F: Fn(&Shared<T>) -> anyhow::Result<()> + 'static,
    {
        self.wrap(None, listener)
    }

    pub fn decorate_labeled<T, F>(&self, label: impl Into<String>, listener: F) -> DecoratedListener<T>
    where
        F: Fn(&Shared<T>) -> anyhow::Result<()> + 'static,
    {
        self.wrap(Some(label.into()), listener)
    }

    fn wrap<T, F>(&self, label: Option<String>, listener: F) -> DecoratedListener<T>
    where
        F: Fn(&Shared<T>) -> anyhow::Result<()> + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        DecoratedListener {
            id,
            label,
            callback: Rc::new(listener),
        }
    }

    /// Fires every listener in order, then raises one error if any failed.
    pub fn dispatch<T>(
        &self,
        container: &str,
        event: CollectionEvent,
        listeners: &[DecoratedListener<T>],
        element: &Shared<T>,
    ) -> Result<(), ListenerDispatchError> {
        let mut failures = Vec::new();
        self.invoke(listeners, element, &mut failures);
        self.raise(container, event, failures)
    }

    /// Runs `listeners` against `element`, recording failures without stopping.
    pub fn invoke<T>(
        &self,
        listeners: &[DecoratedListener<T>],
        element: &Shared<T>,
        failures: &mut Vec<ListenerFailure>,
    ) {
        for listener in listeners {
            if let Err(source) = (listener.callback)(element) {
                failures.push(ListenerFailure {
                    listener: listener.id,
                    label: listener.label.clone(),
                    source,
                });
            }
        }
    }

    /// Turns collected failures into a single reported error.
    pub fn raise(
        &self,
        container: &str,
        event: CollectionEvent,
        failures: Vec<ListenerFailure>,
    ) -> Result<(), ListenerDispatchError> {
        if failures.is_empty() {
            return Ok(());
        }

        let error = ListenerDispatchError {
            container: container.to_string(),
            event,
            failures,
        };
        if let Some(reporter) = &self.reporter {
            reporter.report(&error);
        }
        Err(error)
    }
}

/// Default reporting sink: one warning per aggregated failure.
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, error: &ListenerDispatchError) {
        tracing::warn!(
            container = %error.container,
            event = %error.event,
            failed = error.failures.len(),
            "{}",
            error
        );
    }
}

/// Registered listeners of one container, split by event.
pub struct Listeners<T> {
    added: RefCell<Vec<DecoratedListener<T>>>,
    removed: RefCell<Vec<DecoratedListener<T>>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            added: RefCell::new(Vec::new()),
            removed: RefCell::new(Vec::new()),
        }
    }
}

impl<T> Listeners<T> {
    fn slot(&self, event: CollectionEvent) -> &RefCell<Vec<DecoratedListener<T>>> {
        match event {
            CollectionEvent::Added => &self.added,
            CollectionEvent::Removed => &self.removed,
        }
    }

    pub fn register(&self, event: CollectionEvent, listener: DecoratedListener<T>) -> ListenerHandle {
        let handle = ListenerHandle {
            id: listener.id,
            event,
        };
        self.slot(event).borrow_mut().push(listener);
        handle
    }

    pub fn unregister(&self, handle: ListenerHandle) -> bool {
        let mut slot = self.slot(handle.event).borrow_mut();
        let before = slot.len();
        slot.retain(|l| l.id != handle.id);
        slot.len() != before
    }

    /// Copy of the listeners for `event`. Dispatch runs on the copy, so
    /// registrations made by a running listener only see later events.
    pub fn snapshot(&self, event: CollectionEvent) -> Vec<DecoratedListener<T>> {
        self.slot(event).borrow().clone()
    }

    pub fn count(&self, event: CollectionEvent) -> usize {
        self.slot(event).borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn element() -> Shared<String> {
        Rc::new(RefCell::new("x".to_string()))
    }

    #[derive(Default)]
    struct CountingReporter {
        reports: Cell<usize>,
    }

    impl FailureReporter for CountingReporter {
        fn report(&self, _error: &ListenerDispatchError) {
            self.reports.set(self.reports.get() + 1);
        }
    }

    #[test]
    fn test_ids_follow_registration_order() {
        let decorator = CallbackDecorator::silent();
        let a = decorator.decorate(|_: &Shared<String>| Ok(()));
        let b = decorator.decorate_labeled("b", |_: &Shared<String>| Ok(()));

        assert!(a.id() < b.id());
        assert_eq!(b.label(), Some("b"));
    }

    #[test]
    fn test_fire_all_then_raise_once() {
        let reporter = Rc::new(CountingReporter::default());
        let decorator = CallbackDecorator::new(Some(reporter.clone() as Rc<dyn FailureReporter>));
        let calls = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let calls = calls.clone();
            decorator.decorate(move |_: &Shared<String>| {
                calls.borrow_mut().push(1);
                anyhow::bail!("first failed")
            })
        };
        let second = {
            let calls = calls.clone();
            decorator.decorate(move |_: &Shared<String>| {
                calls.borrow_mut().push(2);
                Ok(())
            })
        };

        let err = decorator
            .dispatch("c", CollectionEvent::Added, &[first.clone(), second], &element())
            .unwrap_err();

        assert_eq!(*calls.borrow(), vec![1, 2]);
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].listener, first.id());
        assert_eq!(reporter.reports.get(), 1);
    }

    #[test]
    fn test_listeners_register_and_unregister() {
        let decorator = CallbackDecorator::silent();
        let listeners: Listeners<String> = Listeners::default();

        let handle = listeners.register(
            CollectionEvent::Added,
            decorator.decorate(|_: &Shared<String>| Ok(())),
        );
        assert_eq!(listeners.count(CollectionEvent::Added), 1);
        assert_eq!(listeners.count(CollectionEvent::Removed), 0);

        assert!(listeners.unregister(handle));
        assert!(!listeners.unregister(handle));
        assert!(listeners.snapshot(CollectionEvent::Added).is_empty());
    }
}
