use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to an element owned by a collection.
///
/// Elements are configuration objects: listeners and callers receive the
/// same handle and may configure the element in place through `borrow_mut`.
pub type Shared<T> = Rc<RefCell<T>>;

/// Capability required of every element held in a named container.
pub trait Named {
    fn name(&self) -> &str;
}

/// Structural change that triggers listener dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionEvent {
    Added,
    Removed,
}

impl fmt::Display for CollectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Removed => f.write_str("removed"),
        }
    }
}

/// Registration sequence number assigned by the callback decorator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Returned by `on_added`/`on_removed`; pass it back to `remove_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    pub id: ListenerId,
    pub event: CollectionEvent,
}

/// Selects how the instantiator builds objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructionStrategy {
    /// Missing services are left unset.
    #[default]
    Lenient,
    /// Lenient injection, then the instance is decorated.
    Decorated,
}

/// Guard policy applied while listeners are running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationPolicy {
    /// Reject every structural mutation while a dispatch is in progress.
    #[default]
    Strict,
    /// Allow nested mutation; nesting is bounded only by the dispatch depth limit.
    Permissive,
}

impl std::str::FromStr for MutationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            other => Err(format!("unknown mutation policy '{}'", other)),
        }
    }
}
