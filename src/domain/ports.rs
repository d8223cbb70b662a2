use crate::core::instantiator::{Decoration, InjectionContext};
use crate::utils::error::{ConstructionError, ListenerDispatchError, Result};

/// A type the instantiator knows how to build.
///
/// `Args` is the single constructor signature the type exposes. Element types
/// created reflectively by a named container use `Args = String` (the name).
pub trait Instantiable: Sized {
    type Args;

    fn instantiate(
        args: Self::Args,
        ctx: &InjectionContext<'_>,
    ) -> std::result::Result<Self, ConstructionError>;

    /// Called by the decorated strategy after construction.
    fn decorate(&mut self, _decoration: &Decoration) {}
}

/// Produces a new element for a given name. Must not touch any container.
pub trait ElementFactory<T> {
    fn create(&self, name: &str) -> Result<T>;
}

/// Sink for aggregated listener failures.
pub trait FailureReporter {
    fn report(&self, error: &ListenerDispatchError);
}
