use crate::core::callback::CallbackDecorator;
use crate::core::events::EventHub;
use crate::core::instantiator::{Decoration, InjectionContext};
use crate::core::mutation_guard::MutationGuard;
use crate::domain::model::{CollectionEvent, ListenerHandle, Shared};
use crate::domain::ports::Instantiable;
use crate::utils::error::{CollectionError, ConstructionError, Result};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub struct SetParts {
    pub display_name: String,
    pub guard: MutationGuard,
    pub decorator: Rc<CallbackDecorator>,
}

/// Insertion-ordered collection without names. Equal values may be added
/// twice; removal is by identity of the shared handle.
pub struct DomainObjectSet<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    display_name: String,
    elements: RefCell<Vec<Shared<T>>>,
    events: EventHub<T>,
}

impl<T> Clone for DomainObjectSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for DomainObjectSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainObjectSet")
            .field("name", &self.inner.display_name)
            .field("len", &self.inner.elements.borrow().len())
            .finish()
    }
}

impl<T: 'static> Instantiable for DomainObjectSet<T> {
    type Args = SetParts;

    fn instantiate(parts: SetParts, ctx: &InjectionContext<'_>) -> std::result::Result<Self, ConstructionError> {
        if parts.guard.max_depth() == 0 {
            return Err(ConstructionError::Rejected {
                target: ctx.target(),
                reason: "maximum dispatch depth must be at least 1".to_string(),
            });
        }

        Ok(Self {
            inner: Rc::new(Inner {
                display_name: parts.display_name,
                elements: RefCell::new(Vec::new()),
                events: EventHub::new(parts.guard, parts.decorator),
            }),
        })
    }

    fn decorate(&mut self, decoration: &Decoration) {
        tracing::trace!(
            set = %self.inner.display_name,
            public_type = decoration.public_type,
            "decorating set"
        );
    }
}

impl<T: 'static> DomainObjectSet<T> {
    pub fn display_name(&self) -> &str {
        &self.inner.display_name
    }

    pub fn guard(&self) -> &MutationGuard {
        self.inner.events.guard()
    }

    /// Appends `element` and fires the on-added listeners.
    pub fn add(&self, element: T) -> Result<Shared<T>> {
        self.guard().with_mutations_allowed("add", || {
            let shared = Rc::new(RefCell::new(element));
            self.inner
                .events
                .mutate_and_fire(CollectionEvent::Added, || {
                    self.inner.elements.borrow_mut().push(Rc::clone(&shared));
                    ((), vec![Rc::clone(&shared)])
                })?;
            Ok(shared)
        })
    }

    /// Appends every element, then fires on-added for each in order.
    pub fn add_all(&self, elements: impl IntoIterator<Item = T>) -> Result<Vec<Shared<T>>> {
        self.guard().with_mutations_allowed("add_all", || {
            let added: Vec<Shared<T>> = elements
                .into_iter()
                .map(|e| Rc::new(RefCell::new(e)))
                .collect();
            self.inner
                .events
                .mutate_and_fire(CollectionEvent::Added, || {
                    self.inner.elements.borrow_mut().extend(added.iter().cloned());
                    ((), added.clone())
                })?;
            Ok(added)
        })
    }

    /// Removes `element` (by identity). Returns `false` if it was not present.
    pub fn remove(&self, element: &Shared<T>) -> Result<bool> {
        self.guard().with_mutations_allowed("remove", || {
            let position = self
                .inner
                .elements
                .borrow()
                .iter()
                .position(|e| Rc::ptr_eq(e, element));
            let Some(position) = position else {
                return Ok(false);
            };

            self.inner
                .events
                .mutate_and_fire(CollectionEvent::Removed, || {
                    let removed = self.inner.elements.borrow_mut().remove(position);
                    (true, vec![removed])
                })
        })
    }

    /// Removes every element accepted by `predicate`, returning them.
    pub fn remove_where(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<Shared<T>>> {
        self.guard().with_mutations_allowed("remove_where", || {
            let doomed = self.matching(predicate)?;
            if doomed.is_empty() {
                return Ok(doomed);
            }

            self.inner
                .events
                .mutate_and_fire(CollectionEvent::Removed, || {
                    self.inner
                        .elements
                        .borrow_mut()
                        .retain(|e| !doomed.iter().any(|d| Rc::ptr_eq(d, e)));
                    (doomed.clone(), doomed)
                })
        })
    }

    pub fn contains(&self, element: &Shared<T>) -> bool {
        self.inner
            .elements
            .borrow()
            .iter()
            .any(|e| Rc::ptr_eq(e, element))
    }

    pub fn len(&self) -> usize {
        self.inner.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.elements.borrow().is_empty()
    }

    /// Elements in insertion order, from a snapshot taken at call time.
    pub fn iter(&self) -> std::vec::IntoIter<Shared<T>> {
        self.inner.elements.borrow().clone().into_iter()
    }

    /// Elements accepted by `predicate`. Fails with `ElementBusy` if one of
    /// them is mutably borrowed by the caller.
    pub fn matching(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<Shared<T>>> {
        let mut matched = Vec::new();
        for element in self.iter() {
            let accepted = predicate(&*element.try_borrow().map_err(|_| {
                CollectionError::ElementBusy {
                    container: self.inner.display_name.clone(),
                }
            })?);
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

    pub fn on<F>(&self, event: CollectionEvent, label: impl Into<String>, listener: F) -> ListenerHandle
    where
        F: Fn(&Shared<T>) -> anyhow::Result<()> + 'static,
    {
        self.inner.events.listen(event, Some(label.into()), listener)
    }

    pub fn all<F>(&self, action: F) -> Result<ListenerHandle>
    where
        F: Fn(&Shared<T>) -> anyhow::Result<()> + 'static,
    {
        self.inner.events.all(self.iter().collect(), action)
    }

    pub fn remove_listener(&self, handle: ListenerHandle) -> bool {
        self.inner.events.unlisten(handle)
    }
}

impl<T: 'static> IntoIterator for &DomainObjectSet<T> {
    type Item = Shared<T>;
    type IntoIter = std::vec::IntoIter<Shared<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
