use crate::core::instantiator::Instantiator;
use crate::domain::model::Named;
use crate::domain::ports::{ElementFactory, Instantiable};
use crate::utils::error::{CollectionError, Result};
use std::marker::PhantomData;

/// Builds elements through the instantiator, passing the name as the only argument.
pub struct ReflectiveElementFactory<T> {
    instantiator: Instantiator,
    _element: PhantomData<fn() -> T>,
}

impl<T> ReflectiveElementFactory<T> {
    pub fn new(instantiator: Instantiator) -> Self {
        Self {
            instantiator,
            _element: PhantomData,
        }
    }
}

impl<T> ElementFactory<T> for ReflectiveElementFactory<T>
where
    T: Instantiable<Args = String> + Named,
{
    fn create(&self, name: &str) -> Result<T> {
        let element = self.instantiator.new_instance::<T>(name.to_string())?;
        ensure_name(name, &element)?;
        Ok(element)
    }
}

/// Delegates to a caller-provided `(name) -> element` function.
pub struct FnElementFactory<F> {
    create: F,
}

impl<F> FnElementFactory<F> {
    pub fn new(create: F) -> Self {
        Self { create }
    }
}

impl<T, F> ElementFactory<T> for FnElementFactory<F>
where
    T: Named,
    F: Fn(&str) -> anyhow::Result<T>,
{
    fn create(&self, name: &str) -> Result<T> {
        let element = (self.create)(name).map_err(|source| CollectionError::Factory {
            name: name.to_string(),
            source,
        })?;
        ensure_name(name, &element)?;
        Ok(element)
    }
}

fn ensure_name<T: Named>(requested: &str, element: &T) -> Result<()> {
    if element.name() != requested {
        return Err(CollectionError::NameMismatch {
            requested: requested.to_string(),
            actual: element.name().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instantiator::{InjectionContext, ServiceRegistry};
    use crate::utils::error::ConstructionError;
    use std::rc::Rc;

    #[derive(Debug)]
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
            if name.is_empty() {
                return Err(ConstructionError::Rejected {
                    target: "Widget",
                    reason: "name must not be empty".to_string(),
                });
            }
            Ok(Self { name })
        }
    }

    fn reflective() -> ReflectiveElementFactory<Widget> {
        ReflectiveElementFactory::new(Instantiator::lenient(Rc::new(ServiceRegistry::new())))
    }

    #[test]
    fn test_reflective_binds_name() {
        let widget = reflective().create("main").unwrap();
        assert_eq!(widget.name(), "main");
    }

    #[test]
    fn test_reflective_construction_failure() {
        let err = reflective().create("").unwrap_err();
        assert!(matches!(err, CollectionError::Construction(_)));
    }

    #[test]
    fn test_user_factory_error_keeps_cause() {
        let factory = FnElementFactory::new(|_: &str| -> anyhow::Result<Widget> {
            Err(anyhow::anyhow!("disk on fire"))
        });

        match factory.create("a").unwrap_err() {
            CollectionError::Factory { name, source } => {
                assert_eq!(name, "a");
                assert_eq!(source.to_string(), "disk on fire");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_name_mismatch_is_rejected() {
        let factory = FnElementFactory::new(|_: &str| -> anyhow::Result<Widget> {
            Ok(Widget {
                name: "other".to_string(),
            })
        });

        let err = factory.create("a").unwrap_err();
        assert!(matches!(err, CollectionError::NameMismatch { .. }));
    }
}
