use crate::core::callback::CallbackDecorator;
use crate::core::events::EventHub;
use crate::core::instantiator::{Decoration, InjectionContext};
use crate::core::mutation_guard::MutationGuard;
use crate::domain::model::{CollectionEvent, ListenerHandle, Named, Shared};
use crate::domain::ports::{ElementFactory, Instantiable};
use crate::utils::error::{CollectionError, ConstructionError, Result};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

/// Everything the collection factory wires into a new container.
pub struct ContainerParts<T> {
    pub display_name: String,
    pub factory: Box<dyn ElementFactory<T>>,
    pub guard: MutationGuard,
    pub decorator: Rc<CallbackDecorator>,
}

/// Ordered, name-keyed container of configuration objects.
///
/// Names are unique and iteration follows insertion order. A duplicate
/// `add`/`create` fails before any factory runs or listener fires, and a
/// listener failure never rolls the mutation back. Cloning shares state, so
/// listeners can capture the container.
pub struct NamedContainer<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    display_name: String,
    elements: RefCell<IndexMap<String, Shared<T>>>,
    factory: Box<dyn ElementFactory<T>>,
    events: EventHub<T>,
    trace_lookups: Cell<bool>,
}

impl<T> Clone for NamedContainer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for NamedContainer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedContainer")
            .field("name", &self.inner.display_name)
            .field("names", &self.inner.elements.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: Named + 'static> Instantiable for NamedContainer<T> {
    type Args = ContainerParts<T>;

    fn instantiate(
        parts: ContainerParts<T>,
        ctx: &InjectionContext<'_>,
    ) -> std::result::Result<Self, ConstructionError> {
        if parts.guard.max_depth() == 0 {
            return Err(ConstructionError::Rejected {
                target: ctx.target(),
                reason: "maximum dispatch depth must be at least 1".to_string(),
            });
        }

        Ok(Self {
            inner: Rc::new(Inner {
                display_name: parts.display_name,
                elements: RefCell::new(IndexMap::new()),
                factory: parts.factory,
                events: EventHub::new(parts.guard, parts.decorator),
                trace_lookups: Cell::new(false),
            }),
        })
    }

    fn decorate(&mut self, decoration: &Decoration) {
        tracing::trace!(
            container = %self.inner.display_name,
            public_type = decoration.public_type,
            "decorating container"
        );
        self.inner.trace_lookups.set(true);
    }
}

impl<T: Named + 'static> NamedContainer<T> {
    pub fn display_name(&self) -> &str {
        &self.inner.display_name
    }

    pub fn guard(&self) -> &MutationGuard {
        self.inner.events.guard()
    }

    pub fn is_decorated(&self) -> bool {
        self.inner.trace_lookups.get()
    }

    /// Inserts `element` under `name` and fires the on-added listeners.
    ///
    /// When a listener fails the element stays in the container and the
    /// aggregated error is returned.
    pub fn add(&self, name: impl Into<String>, element: T) -> Result<Shared<T>> {
        let name = name.into();
        self.guard().with_mutations_allowed("add", || {
            self.ensure_vacant(&name)?;
            if element.name() != name {
                return Err(CollectionError::NameMismatch {
                    requested: name,
                    actual: element.name().to_string(),
                });
            }
            self.insert(name, element)
        })
    }

    /// Builds an element with the element factory and adds it.
    pub fn create(&self, name: &str) -> Result<Shared<T>> {
        self.guard().with_mutations_allowed("create", || {
            self.ensure_vacant(name)?;
            let element = self.inner.factory.create(name)?;
            self.insert(name.to_string(), element)
        })
    }

    /// Returns the element called `name`, creating it first if needed.
    pub fn maybe_create(&self, name: &str) -> Result<Shared<T>> {
        match self.get(name) {
            Some(existing) => Ok(existing),
            None => self.create(name),
        }
    }

    /// Removes `name`. `Ok(None)` means there was nothing to remove.
    pub fn remove(&self, name: &str) -> Result<Option<Shared<T>>> {
        self.guard().with_mutations_allowed("remove", || {
            if !self.contains(name) {
                return Ok(None);
            }

            self.inner
                .events
                .mutate_and_fire(CollectionEvent::Removed, || {
                    let removed = self.inner.elements.borrow_mut().shift_remove(name);
                    if removed.is_some() {
                        tracing::debug!(container = %self.inner.display_name, name, "element removed");
                    }
                    let affected = removed.iter().cloned().collect();
                    (removed, affected)
                })
        })
    }

    /// Removes every element, firing on-removed once per element in order.
    pub fn clear(&self) -> Result<usize> {
        self.guard().with_mutations_allowed("clear", || {
            self.inner
                .events
                .mutate_and_fire(CollectionEvent::Removed, || {
                    let drained: Vec<Shared<T>> =
                        std::mem::take(&mut *self.inner.elements.borrow_mut())
                            .into_values()
                            .collect();
                    tracing::debug!(
                        container = %self.inner.display_name,
                        count = drained.len(),
                        "container cleared"
                    );
                    (drained.len(), drained)
                })
        })
    }

    pub fn get(&self, name: &str) -> Option<Shared<T>> {
        let found = self.inner.elements.borrow().get(name).cloned();
        if self.inner.trace_lookups.get() {
            tracing::trace!(
                container = %self.inner.display_name,
                name,
                found = found.is_some(),
                "lookup by name"
            );
        }
        found
    }

    /// Like [`get`](Self::get), but a missing name is an error.
    pub fn get_by_name(&self, name: &str) -> Result<Shared<T>> {
        self.get(name).ok_or_else(|| CollectionError::UnknownElement {
            container: self.inner.display_name.clone(),
            name: name.to_string(),
        })
    }

    /// Applies `action` to the element called `name`.
    ///
    /// The element stays filed under its original name; `action` must not
    /// rename it. While `action` runs the element is exclusively borrowed:
    /// siblings can be read, but reading the element itself (directly or via
    /// [`matching`](Self::matching)) fails with `ElementBusy`.
    pub fn configure(&self, name: &str, action: impl FnOnce(&mut T)) -> Result<Shared<T>> {
        let element = self.get_by_name(name)?;
        {
            let mut target = element.try_borrow_mut().map_err(|_| self.busy())?;
            action(&mut *target);
        }
        Ok(element)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.elements.borrow().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.elements.borrow().is_empty()
    }

    /// Sorted element names.
    pub fn names(&self) -> BTreeSet<String> {
        self.inner.elements.borrow().keys().cloned().collect()
    }

    /// Elements in insertion order.
    ///
    /// The iterator walks a snapshot taken at call time, so it can be started
    /// from inside a listener and is unaffected by later mutation. Call again
    /// to restart.
    pub fn iter(&self) -> std::vec::IntoIter<Shared<T>> {
        self.inner
            .elements
            .borrow()
            .values()
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Elements accepted by `predicate`, in insertion order.
    pub fn matching(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<Shared<T>>> {
        let mut matched = Vec::new();
        for element in self.iter() {
            let accepted = predicate(&*element.try_borrow().map_err(|_| self.busy())?);
            if accepted {
                matched.push(element);
            }
        }
        Ok(matched)
    }

    pub fn on_added<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&Shared<T>) -> anyhow::Result<()> + 'static,
    {
        self.inner.events.listen(CollectionEvent::Added, None, listener)
    }

    pub fn on_removed<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&Shared<T>) -> anyhow::Result<()> + 'static,
    {
        self.inner.events.listen(CollectionEvent::Removed, None, listener)
    }

    /// Registers a listener whose label shows up in dispatch errors.
    pub fn on<F>(&self, event: CollectionEvent, label: impl Into<String>, listener: F) -> ListenerHandle
    where
        F: Fn(&Shared<T>) -> anyhow::Result<()> + 'static,
    {
        self.inner.events.listen(event, Some(label.into()), listener)
    }

    /// Runs `action` for every current element and every element added later.
    pub fn all<F>(&self, action: F) -> Result<ListenerHandle>
    where
        F: Fn(&Shared<T>) -> anyhow::Result<()> + 'static,
    {
        self.inner.events.all(self.iter().collect(), action)
    }

    pub fn remove_listener(&self, handle: ListenerHandle) -> bool {
        self.inner.events.unlisten(handle)
    }

    pub fn listener_count(&self, event: CollectionEvent) -> usize {
        self.inner.events.listener_count(event)
    }

    fn busy(&self) -> CollectionError {
        CollectionError::ElementBusy {
            container: self.inner.display_name.clone(),
        }
    }

    fn ensure_vacant(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(CollectionError::DuplicateName {
                container: self.inner.display_name.clone(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&self, name: String, element: T) -> Result<Shared<T>> {
        let shared = Rc::new(RefCell::new(element));
        self.inner
            .events
            .mutate_and_fire(CollectionEvent::Added, || {
                let mut elements = self.inner.elements.borrow_mut();
                if elements.contains_key(&name) {
                    return (
                        Err(CollectionError::DuplicateName {
                            container: self.inner.display_name.clone(),
                            name: name.clone(),
                        }),
                        Vec::new(),
                    );
                }
                elements.insert(name.clone(), Rc::clone(&shared));
                tracing::debug!(container = %self.inner.display_name, name = %name, "element added");
                (Ok(()), vec![Rc::clone(&shared)])
            })??;
        Ok(shared)
    }
}

impl<T: Named + 'static> IntoIterator for &NamedContainer<T> {
    type Item = Shared<T>;
    type IntoIter = std::vec::IntoIter<Shared<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
