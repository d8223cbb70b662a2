pub mod callback;
pub mod domain_set;
pub mod element_factory;
mod events;
pub mod factory;
pub mod instantiator;
pub mod mutation_guard;
pub mod named_container;

pub use crate::domain::model::{Named, Shared};
pub use crate::domain::ports::{ElementFactory, FailureReporter, Instantiable};
pub use crate::utils::error::Result;
