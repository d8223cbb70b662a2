use crate::utils::error::{CollectionError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CollectionError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(CollectionError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Fails on the first name that appears twice.
pub fn validate_unique<'a>(field_name: &str, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(CollectionError::InvalidConfigValue {
                field: field_name.to_string(),
                value: name.to_string(),
                reason: "Name is declared more than once".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert!(validate_range("max_dispatch_depth", 5, 1, 10).is_ok());
        assert!(validate_range("max_dispatch_depth", 0, 1, 10).is_err());
        assert!(validate_range("max_dispatch_depth", 11, 1, 10).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("container.name", "widgets").is_ok());
        assert!(validate_non_empty_string("container.name", "   ").is_err());
    }

    #[test]
    fn test_validate_unique() {
        assert!(validate_unique("container.name", ["a", "b"]).is_ok());

        let err = validate_unique("container.name", ["a", "b", "a"]).unwrap_err();
        assert!(err.to_string().contains("'a'"));
    }
}
