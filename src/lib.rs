pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use config::CollectionConfig;
pub use crate::core::{
    domain_set::DomainObjectSet, factory::CollectionFactory, instantiator::ServiceRegistry,
    named_container::NamedContainer,
};
pub use domain::model::{CollectionEvent, ListenerHandle, MutationPolicy, Named, Shared};
pub use utils::error::{CollectionError, ConstructionError, ListenerDispatchError, Result};
