use crate::config::{parse_toml, CollectionConfig};
use crate::core::factory::CollectionFactory;
use crate::core::instantiator::{InjectionContext, ServiceRegistry};
use crate::domain::model::{CollectionEvent, Named, Shared};
use crate::domain::ports::Instantiable;
use crate::utils::error::{ConstructionError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::rc::Rc;

pub type Properties = BTreeMap<String, toml::Value>;

/// A TOML declaration script: `[config]`, `[defaults]` and a list of
/// `[[container]]` tables with `[[container.element]]` entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptFile {
    #[serde(default)]
    pub config: CollectionConfig,
    #[serde(default)]
    pub defaults: Properties,
    #[serde(default, rename = "container")]
    pub containers: Vec<ContainerDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerDecl {
    pub name: String,
    #[serde(default, rename = "element")]
    pub elements: Vec<ElementDecl>,
    #[serde(default)]
    pub remove: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDecl {
    pub name: String,
    #[serde(default)]
    pub properties: Properties,
}

/// Properties every declaration starts with, injected as a service.
#[derive(Debug, Clone, Default)]
pub struct DefaultProperties(pub Properties);

/// Element type produced by scripts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub properties: Properties,
}

impl Named for Declaration {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Instantiable for Declaration {
    type Args = String;

    fn instantiate(name: String, ctx: &InjectionContext<'_>) -> std::result::Result<Self, ConstructionError> {
        let properties = ctx
            .service::<DefaultProperties>()
            .map(|defaults| defaults.0.clone())
            .unwrap_or_default();
        Ok(Self { name, properties })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub container: String,
    pub event: CollectionEvent,
    pub element: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerReport {
    pub name: String,
    pub elements: Vec<Declaration>,
    pub removed: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
    pub containers: Vec<ContainerReport>,
    pub events: Vec<EventRecord>,
}

impl ScriptFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_toml(content)
    }

    pub fn element_count(&self) -> usize {
        self.containers.iter().map(|c| c.elements.len()).sum()
    }
}

impl Validate for ScriptFile {
    fn validate(&self) -> Result<()> {
        self.config.validate()?;
        validation::validate_unique("container.name", self.containers.iter().map(|c| c.name.as_str()))?;

        for container in &self.containers {
            validation::validate_non_empty_string("container.name", &container.name)?;
            for element in &container.elements {
                validation::validate_non_empty_string(
                    &format!("{}.element.name", container.name),
                    &element.name,
                )?;
            }
        }
        Ok(())
    }
}

/// Evaluates `script` and reports the resulting containers and events.
pub fn evaluate(script: &ScriptFile) -> Result<ScriptReport> {
    script.validate()?;

    let mut services = ServiceRegistry::new();
    if !script.defaults.is_empty() {
        services.register(DefaultProperties(script.defaults.clone()));
    }
    let factory = CollectionFactory::from_config(&script.config, services);
    let events = Rc::new(RefCell::new(Vec::new()));

    let mut containers = Vec::with_capacity(script.containers.len());
    for decl in &script.containers {
        tracing::info!(container = %decl.name, elements = decl.elements.len(), "evaluating container");
        let container = factory.new_named_container::<Declaration>()?;
        container.on_added(recorder(&events, &decl.name, CollectionEvent::Added));
        container.on_removed(recorder(&events, &decl.name, CollectionEvent::Removed));

        for element in &decl.elements {
            container.create(&element.name)?;
            container.configure(&element.name, |d| {
                d.properties
                    .extend(element.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
            })?;
        }

        let mut removed = Vec::new();
        let mut missing = Vec::new();
        for name in &decl.remove {
            match container.remove(name)? {
                Some(_) => removed.push(name.clone()),
                None => {
                    tracing::warn!(container = %decl.name, name = %name, "nothing to remove");
                    missing.push(name.clone());
                }
            }
        }

        containers.push(ContainerReport {
            name: decl.name.clone(),
            elements: container.iter().map(|e| e.borrow().clone()).collect(),
            removed,
            missing,
        });
    }

    let events = events.borrow().clone();
    Ok(ScriptReport { containers, events })
}

fn recorder(
    log: &Rc<RefCell<Vec<EventRecord>>>,
    container: &str,
    event: CollectionEvent,
) -> impl Fn(&Shared<Declaration>) -> anyhow::Result<()> + 'static {
    let log = Rc::clone(log);
    let container = container.to_string();
    move |element| {
        log.borrow_mut().push(EventRecord {
            container: container.clone(),
            event,
            element: element.borrow().name.clone(),
        });
        Ok(())
    }
}

impl ScriptReport {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for container in &self.containers {
            let _ = writeln!(out, "{} ({} elements)", container.name, container.elements.len());
            for element in &container.elements {
                if element.properties.is_empty() {
                    let _ = writeln!(out, "  - {}", element.name);
                } else {
                    let props = element
                        .properties
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let _ = writeln!(out, "  - {} [{}]", element.name, props);
                }
            }
            if !container.missing.is_empty() {
                let _ = writeln!(out, "  not found: {}", container.missing.join(", "));
            }
        }
        out
    }
}
