//! Parsed `"module:action"` permission key

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionKey {
    pub module: String,
    pub action: String,
}

impl PermissionKey {
    pub fn new(module: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            action: action.into(),
        }
    }
}

impl FromStr for PermissionKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(module), Some(action), None)
                if !module.trim().is_empty() && !action.trim().is_empty() =>
            {
                Ok(Self::new(module.trim(), action.trim()))
            }
            _ => Err(DomainError::MalformedPermissionKey(s.to_string())),
        }
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_key() {
        let key: PermissionKey = "objetivos:create".parse().unwrap();
        assert_eq!(key.module, "objetivos");
        assert_eq!(key.action, "create");
        assert_eq!(key.to_string(), "objetivos:create");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for raw in ["objetivos", "objetivos:", ":create", "a:b:c", ""] {
            assert!(
                matches!(raw.parse::<PermissionKey>(), Err(DomainError::MalformedPermissionKey(_))),
                "expected '{}' to be rejected",
                raw
            );
        }
    }
}
