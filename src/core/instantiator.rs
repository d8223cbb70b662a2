use crate::domain::model::ConstructionStrategy;
use crate::domain::ports::Instantiable;
use crate::utils::error::ConstructionError;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

/// Services available for injection, keyed by type.
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<TypeId, Rc<dyn Any>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service`, replacing any earlier registration of the same type.
    pub fn register<S: 'static>(&mut self, service: S) -> &mut Self {
        self.services.insert(TypeId::of::<S>(), Rc::new(service));
        self
    }

    pub fn with<S: 'static>(mut self, service: S) -> Self {
        self.register(service);
        self
    }

    pub fn get<S: 'static>(&self) -> Option<Rc<S>> {
        self.services
            .get(&TypeId::of::<S>())
            .and_then(|service| Rc::clone(service).downcast::<S>().ok())
    }

    pub fn contains<S: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<S>())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.services.len())
            .finish()
    }
}

/// What a constructor sees while the instantiator builds `target`.
pub struct InjectionContext<'a> {
    services: &'a ServiceRegistry,
    target: &'static str,
}

impl<'a> InjectionContext<'a> {
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Looks up an optional dependency. Unsatisfied dependencies stay unset.
    pub fn service<S: 'static>(&self) -> Option<Rc<S>> {
        let service = self.services.get::<S>();
        if service.is_none() {
            tracing::trace!(
                target_type = self.target,
                service = type_name::<S>(),
                "service not available, leaving unset"
            );
        }
        service
    }

    pub fn require_service<S: 'static>(&self) -> Result<Rc<S>, ConstructionError> {
        self.services
            .get::<S>()
            .ok_or(ConstructionError::MissingService {
                target: self.target,
                service: type_name::<S>(),
            })
    }
}

/// Metadata handed to [`Instantiable::decorate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub public_type: &'static str,
}

/// Builds instances according to a [`ConstructionStrategy`].
#[derive(Debug, Clone)]
pub struct Instantiator {
    strategy: ConstructionStrategy,
    services: Rc<ServiceRegistry>,
}

impl Instantiator {
    pub fn new(strategy: ConstructionStrategy, services: Rc<ServiceRegistry>) -> Self {
        Self { strategy, services }
    }

    pub fn lenient(services: Rc<ServiceRegistry>) -> Self {
        Self::new(ConstructionStrategy::Lenient, services)
    }

    pub fn decorated(services: Rc<ServiceRegistry>) -> Self {
        Self::new(ConstructionStrategy::Decorated, services)
    }

    pub fn strategy(&self) -> ConstructionStrategy {
        self.strategy
    }

    pub fn new_instance<T: Instantiable>(&self, args: T::Args) -> Result<T, ConstructionError> {
        let target = type_name::<T>();
        let ctx = InjectionContext {
            services: &self.services,
            target,
        };
        let mut instance = T::instantiate(args, &ctx)?;

        match self.strategy {
            ConstructionStrategy::Lenient => {}
            ConstructionStrategy::Decorated => {
                instance.decorate(&Decoration {
                    public_type: short_type_name(target),
                });
            }
        }

        Ok(instance)
    }
}

/// `a::b::Widget<c::D>` -> `Widget`
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clock(u64);

    struct Probe {
        name: String,
        clock: Option<Rc<Clock>>,
        decorated_as: Option<&'static str>,
    }

    impl Instantiable for Probe {
        type Args = String;

        fn instantiate(name: String, ctx: &InjectionContext<'_>) -> Result<Self, ConstructionError> {
            Ok(Self {
                name,
                clock: ctx.service::<Clock>(),
                decorated_as: None,
            })
        }

        fn decorate(&mut self, decoration: &Decoration) {
            self.decorated_as = Some(decoration.public_type);
        }
    }

    #[derive(Debug)]
    struct NeedsClock;

    impl Instantiable for NeedsClock {
        type Args = ();

        fn instantiate(_: (), ctx: &InjectionContext<'_>) -> Result<Self, ConstructionError> {
            ctx.require_service::<Clock>()?;
            Ok(Self)
        }
    }

    #[test]
    fn test_lenient_leaves_missing_services_unset() {
        let instantiator = Instantiator::lenient(Rc::new(ServiceRegistry::new()));
        let probe: Probe = instantiator.new_instance("a".to_string()).unwrap();

        assert_eq!(probe.name, "a");
        assert!(probe.clock.is_none());
        assert!(probe.decorated_as.is_none());
    }

    #[test]
    fn test_injects_registered_services() {
        let services = Rc::new(ServiceRegistry::new().with(Clock(42)));
        let instantiator = Instantiator::lenient(services);
        let probe: Probe = instantiator.new_instance("a".to_string()).unwrap();

        assert_eq!(probe.clock.map(|c| c.0), Some(42));
    }

    #[test]
    fn test_decorated_strategy_decorates() {
        let instantiator = Instantiator::decorated(Rc::new(ServiceRegistry::new()));
        let probe: Probe = instantiator.new_instance("a".to_string()).unwrap();

        assert_eq!(probe.decorated_as, Some("Probe"));
    }

    #[test]
    fn test_required_service_missing() {
        let instantiator = Instantiator::lenient(Rc::new(ServiceRegistry::new()));
        let err = instantiator.new_instance::<NeedsClock>(()).unwrap_err();

        assert!(matches!(err, ConstructionError::MissingService { .. }));
        assert!(err.to_string().contains("Clock"));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Widget"), "Widget");
        assert_eq!(short_type_name("a::Container<b::Widget>"), "Container");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
