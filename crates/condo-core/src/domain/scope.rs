// ============================================================================
// Condo Core - Permission Scope
// File: crates/condo-core/src/domain/scope.rs
// Description: Breadth of a granular grant and the request context it is
//              matched against
// ============================================================================

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Scope enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionScope {
    /// Caller's own records only; ownership is verified downstream
    Own,
    /// A single tenant (condominium) named by the grant's scope id
    Tenant,
    /// Unrestricted
    All,
}

impl PermissionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionScope::Own => "OWN",
            PermissionScope::Tenant => "TENANT",
            PermissionScope::All => "ALL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "OWN" => Some(PermissionScope::Own),
            "TENANT" => Some(PermissionScope::Tenant),
            "ALL" => Some(PermissionScope::All),
            _ => None,
        }
    }

    /// A scope id is required for TENANT and forbidden otherwise.
    pub fn validate_scope_id(&self, scope_id: Option<&str>) -> Result<(), DomainError> {
        match (self, scope_id) {
            (PermissionScope::Tenant, None) => Err(DomainError::TenantScopeIdRequired),
            (PermissionScope::Tenant, Some(id)) if id.trim().is_empty() => {
                Err(DomainError::TenantScopeIdRequired)
            }
            (PermissionScope::Tenant, Some(_)) => Ok(()),
            (scope, Some(_)) => Err(DomainError::ScopeIdNotAllowed(scope.as_str().to_string())),
            (_, None) => Ok(()),
        }
    }
}

/// Resource context assembled by the caller for a permission check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionContext {
    pub tenant_id: Option<String>,
    pub owner_id: Option<Uuid>,
    pub resource_id: Option<String>,
}

impl PermissionContext {
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tenant_id.is_none() && self.owner_id.is_none() && self.resource_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_scope_requires_id() {
        assert!(matches!(
            PermissionScope::Tenant.validate_scope_id(None),
            Err(DomainError::TenantScopeIdRequired)
        ));
        assert!(matches!(
            PermissionScope::Tenant.validate_scope_id(Some("  ")),
            Err(DomainError::TenantScopeIdRequired)
        ));
        assert!(PermissionScope::Tenant.validate_scope_id(Some("condo-1")).is_ok());
    }

    #[test]
    fn test_non_tenant_scope_rejects_id() {
        assert!(matches!(
            PermissionScope::All.validate_scope_id(Some("condo-1")),
            Err(DomainError::ScopeIdNotAllowed(_))
        ));
        assert!(PermissionScope::Own.validate_scope_id(None).is_ok());
    }

    #[test]
    fn test_scope_serializes_uppercase() {
        let json = serde_json::to_string(&PermissionScope::Tenant).unwrap();
        assert_eq!(json, "\"TENANT\"");
        assert_eq!(PermissionScope::from_str("OWN"), Some(PermissionScope::Own));
    }
}
