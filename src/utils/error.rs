use crate::domain::model::{CollectionEvent, ListenerId};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("Cannot add '{name}' to {container}: an element with that name already exists")]
    DuplicateName { container: String, name: String },

    #[error("{container} has no element named '{name}'")]
    UnknownElement { container: String, name: String },

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error("Element factory failed to create '{name}'")]
    Factory {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Element factory was asked for '{requested}' but produced '{actual}'")]
    NameMismatch { requested: String, actual: String },

    #[error("{container}#{operation} cannot be executed while listeners of {container} are running")]
    ConcurrentMutation {
        container: String,
        operation: &'static str,
    },

    #[error("An element of {container} is in use by a running configure action")]
    ElementBusy { container: String },

    #[error("Listener dispatch on {container} exceeded the maximum depth of {limit}")]
    DispatchDepthExceeded { container: String, limit: usize },

    #[error(transparent)]
    ListenerDispatch(#[from] ListenerDispatchError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConstructionError {
    #[error("Cannot construct {target}: required service {service} is not available")]
    MissingService {
        target: &'static str,
        service: &'static str,
    },

    #[error("Cannot construct {target}: {reason}")]
    Rejected {
        target: &'static str,
        reason: String,
    },
}

/// A single listener that failed during one dispatch.
#[derive(Debug)]
pub struct ListenerFailure {
    pub listener: ListenerId,
    pub label: Option<String>,
    pub source: anyhow::Error,
}

impl fmt::Display for ListenerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "listener {} ({}): {:#}", self.listener, label, self.source),
            None => write!(f, "listener {}: {:#}", self.listener, self.source),
        }
    }
}

/// Raised once after every listener for an event has run and at least one failed.
#[derive(Error, Debug)]
#[error("{} {event} listener(s) failed on {container}: {}", .failures.len(), summarize(.failures))]
pub struct ListenerDispatchError {
    pub container: String,
    pub event: CollectionEvent,
    pub failures: Vec<ListenerFailure>,
}

impl ListenerDispatchError {
    pub fn causes(&self) -> impl Iterator<Item = &anyhow::Error> {
        self.failures.iter().map(|f| &f.source)
    }
}

fn summarize(failures: &[ListenerFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Naming,
    Construction,
    Reentrancy,
    Listener,
    Configuration,
}

impl CollectionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateName { .. } | Self::UnknownElement { .. } => ErrorCategory::Naming,
            Self::Construction(_) | Self::Factory { .. } | Self::NameMismatch { .. } => {
                ErrorCategory::Construction
            }
            Self::ConcurrentMutation { .. }
            | Self::DispatchDepthExceeded { .. }
            | Self::ElementBusy { .. } => {
                ErrorCategory::Reentrancy
            }
            Self::ListenerDispatch(_) => ErrorCategory::Listener,
            Self::Config { .. } | Self::InvalidConfigValue { .. } | Self::Io(_) => {
                ErrorCategory::Configuration
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CollectionError>;
