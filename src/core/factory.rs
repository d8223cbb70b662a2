use crate::config::CollectionConfig;
use crate::core::callback::CallbackDecorator;
use crate::core::domain_set::{DomainObjectSet, SetParts};
use crate::core::element_factory::{FnElementFactory, ReflectiveElementFactory};
use crate::core::instantiator::{short_type_name, Instantiator, ServiceRegistry};
use crate::core::mutation_guard::MutationGuard;
use crate::core::named_container::{ContainerParts, NamedContainer};
use crate::domain::model::{MutationPolicy, Named};
use crate::domain::ports::{ElementFactory, Instantiable};
use crate::utils::error::Result;
use std::any::type_name;
use std::rc::Rc;

/// Single entry point for building guarded collections.
///
/// Containers are built with the decorated strategy. Elements created
/// reflectively go through the lenient strategy; every container gets its own
/// mutation guard and shares this factory's callback decorator.
pub struct CollectionFactory {
    services: Rc<ServiceRegistry>,
    decorator: Rc<CallbackDecorator>,
    policy: MutationPolicy,
    max_dispatch_depth: usize,
}

impl CollectionFactory {
    pub fn new(
        services: Rc<ServiceRegistry>,
        decorator: Rc<CallbackDecorator>,
        config: &CollectionConfig,
    ) -> Self {
        Self {
            services,
            decorator,
            policy: config.mutation_policy,
            max_dispatch_depth: config.max_dispatch_depth,
        }
    }

    pub fn from_config(config: &CollectionConfig, services: ServiceRegistry) -> Self {
        let decorator = if config.report_listener_failures {
            CallbackDecorator::default()
        } else {
            CallbackDecorator::silent()
        };
        Self::new(Rc::new(services), Rc::new(decorator), config)
    }

    pub fn policy(&self) -> MutationPolicy {
        self.policy
    }

    /// Whether aggregated listener failures go to a reporting sink before
    /// they are returned.
    pub fn reports_failures(&self) -> bool {
        self.decorator.is_reporting()
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Container whose elements are built from their name by the instantiator.
    pub fn new_named_container<T>(&self) -> Result<NamedContainer<T>>
    where
        T: Instantiable<Args = String> + Named + 'static,
    {
        let elements = ReflectiveElementFactory::<T>::new(Instantiator::lenient(Rc::clone(&self.services)));
        self.build_container(Box::new(elements))
    }

    /// Container whose elements come from `factory`.
    pub fn new_named_container_with<T, F>(&self, factory: F) -> Result<NamedContainer<T>>
    where
        T: Named + 'static,
        F: Fn(&str) -> anyhow::Result<T> + 'static,
    {
        self.build_container(Box::new(FnElementFactory::new(factory)))
    }

    pub fn new_domain_object_set<T: 'static>(&self) -> Result<DomainObjectSet<T>> {
        let display_name = format!("{} set", short_type_name(type_name::<T>()));
        let parts = SetParts {
            guard: self.guard_for(&display_name),
            display_name,
            decorator: Rc::clone(&self.decorator),
        };
        let set: DomainObjectSet<T> = self.container_instantiator().new_instance(parts)?;
        tracing::debug!(set = %set.display_name(), "domain object set created");
        Ok(set)
    }

    fn build_container<T: Named + 'static>(
        &self,
        factory: Box<dyn ElementFactory<T>>,
    ) -> Result<NamedContainer<T>> {
        let display_name = format!("{} container", short_type_name(type_name::<T>()));
        let parts = ContainerParts {
            guard: self.guard_for(&display_name),
            display_name,
            factory,
            decorator: Rc::clone(&self.decorator),
        };
        let container: NamedContainer<T> = self.container_instantiator().new_instance(parts)?;
        tracing::debug!(
            container = %container.display_name(),
            policy = ?self.policy,
            "named container created"
        );
        Ok(container)
    }

    fn guard_for(&self, owner: &str) -> MutationGuard {
        MutationGuard::new(owner, self.policy, self.max_dispatch_depth)
    }

    fn container_instantiator(&self) -> Instantiator {
        Instantiator::decorated(Rc::clone(&self.services))
    }
}

impl Default for CollectionFactory {
    fn default() -> Self {
        Self::from_config(&CollectionConfig::default(), ServiceRegistry::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instantiator::InjectionContext;
    use crate::utils::error::{CollectionError, ConstructionError};

    struct Widget {
        name: String,
    }

    impl Named for Widget {
        fn name(&self) -> &str {
            &self.name
        }
    }

    impl Instantiable for Widget {
        type Args = String;

        fn instantiate(name: String, _: &InjectionContext<'_>) -> std::result::Result<Self, ConstructionError> {
            Ok(Self { name })
        }
    }

    #[test]
    fn test_display_names_use_element_type() {
        let factory = CollectionFactory::default();
        let widgets = factory.new_named_container::<Widget>().unwrap();
        let numbers = factory.new_domain_object_set::<u32>().unwrap();

        assert_eq!(widgets.display_name(), "Widget container");
        assert_eq!(numbers.display_name(), "u32 set");
        assert!(widgets.is_decorated());
    }

    #[test]
    fn test_guards_are_per_container() {
        let factory = CollectionFactory::default();
        let a = factory.new_named_container::<Widget>().unwrap();
        let b = factory.new_named_container::<Widget>().unwrap();

        let _scope = a.guard().enter_dispatch().unwrap();
        assert!(a.guard().is_dispatching());
        assert!(!b.guard().is_dispatching());
    }

    #[test]
    fn test_invalid_depth_fails_construction() {
        let config = CollectionConfig {
            max_dispatch_depth: 0,
            ..CollectionConfig::default()
        };
        let factory = CollectionFactory::from_config(&config, ServiceRegistry::new());

        assert!(matches!(
            factory.new_named_container::<Widget>(),
            Err(CollectionError::Construction(ConstructionError::Rejected { .. }))
        ));
        assert!(matches!(
            factory.new_domain_object_set::<u32>(),
            Err(CollectionError::Construction(_))
        ));
    }
}
