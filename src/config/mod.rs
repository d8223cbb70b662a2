#[cfg(feature = "cli")]
pub mod cli;
pub mod script;

use crate::core::mutation_guard::DEFAULT_MAX_DISPATCH_DEPTH;
use crate::domain::model::MutationPolicy;
use crate::utils::error::{CollectionError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MAX_DISPATCH_DEPTH_LIMIT: usize = 1024;

/// Settings applied by the collection factory to every collection it builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub mutation_policy: MutationPolicy,
    pub max_dispatch_depth: usize,
    pub report_listener_failures: bool,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            mutation_policy: MutationPolicy::Strict,
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            report_listener_failures: true,
        }
    }
}

impl CollectionConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parses the configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_toml(content)
    }
}

impl Validate for CollectionConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_range(
            "max_dispatch_depth",
            self.max_dispatch_depth,
            1,
            MAX_DISPATCH_DEPTH_LIMIT,
        )
    }
}

/// Parses TOML after substituting `${VAR}` references from the environment.
pub(crate) fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T> {
    let processed = substitute_env_vars(content)?;
    toml::from_str(&processed).map_err(|e| CollectionError::Config {
        message: format!("TOML parsing error: {}", e),
    })
}

/// Replaces `${VAR}` with the environment value; unset variables are left as is.
fn substitute_env_vars(content: &str) -> Result<String> {
    use regex::Regex;
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CollectionError::Config {
        message: format!("invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_when_empty() {
        let config = CollectionConfig::from_toml_str("").unwrap();
        assert_eq!(config, CollectionConfig::default());
        assert_eq!(config.mutation_policy, MutationPolicy::Strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_policy_and_depth() {
        let config = CollectionConfig::from_toml_str(
            r#"
mutation_policy = "permissive"
max_dispatch_depth = 4
report_listener_failures = false
"#,
        )
        .unwrap();

        assert_eq!(config.mutation_policy, MutationPolicy::Permissive);
        assert_eq!(config.max_dispatch_depth, 4);
        assert!(!config.report_listener_failures);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DOMAIN_COLLECTIONS_TEST_DEPTH", "7");

        let config =
            CollectionConfig::from_toml_str("max_dispatch_depth = ${DOMAIN_COLLECTIONS_TEST_DEPTH}")
                .unwrap();
        assert_eq!(config.max_dispatch_depth, 7);

        std::env::remove_var("DOMAIN_COLLECTIONS_TEST_DEPTH");
    }

    #[test]
    fn test_config_validation() {
        let config = CollectionConfig {
            max_dispatch_depth: 0,
            ..CollectionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_policy_is_a_config_error() {
        let err = CollectionConfig::from_toml_str(r#"mutation_policy = "yolo""#).unwrap_err();
        assert!(matches!(err, CollectionError::Config { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"max_dispatch_depth = 9\n")
            .unwrap();

        let config = CollectionConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.max_dispatch_depth, 9);
    }
}
