//! Scope matching for granular grants
//!
//! OWN always matches here: whether a specific record belongs to the caller
//! is decided by the resource query downstream, not by this layer.

use crate::domain::{PermissionContext, PermissionScope};

pub fn matches(
    scope: PermissionScope,
    scope_id: Option<&str>,
    context: Option<&PermissionContext>,
) -> bool {
    match scope {
        PermissionScope::All => true,
        PermissionScope::Own => true,
        PermissionScope::Tenant => match context {
            // List-style checks with no resource identified yet
            None => true,
            Some(ctx) => match (ctx.tenant_id.as_deref(), scope_id) {
                (Some(tenant_id), Some(granted)) => tenant_id == granted,
                _ => false,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_all_matches_anything() {
        assert!(matches(PermissionScope::All, None, None));
        assert!(matches(PermissionScope::All, None, Some(&PermissionContext::for_tenant("condo-9"))));
        assert!(matches(PermissionScope::All, None, Some(&PermissionContext::default())));
    }

    #[test]
    fn test_tenant_matches_same_tenant_only() {
        let granted = Some("condo-1");
        assert!(matches(PermissionScope::Tenant, granted, Some(&PermissionContext::for_tenant("condo-1"))));
        assert!(!matches(PermissionScope::Tenant, granted, Some(&PermissionContext::for_tenant("condo-2"))));
    }

    #[test]
    fn test_tenant_without_context_matches() {
        assert!(matches(PermissionScope::Tenant, Some("condo-1"), None));
    }

    #[test]
    fn test_tenant_with_context_missing_tenant_does_not_match() {
        let ctx = PermissionContext {
            owner_id: Some(Uuid::new_v4()),
            ..PermissionContext::default()
        };
        assert!(!matches(PermissionScope::Tenant, Some("condo-1"), Some(&ctx)));
        assert!(!matches(PermissionScope::Tenant, Some("condo-1"), Some(&PermissionContext::default())));
    }

    #[test]
    fn test_own_is_deferred_to_caller() {
        let ctx = PermissionContext {
            owner_id: Some(Uuid::new_v4()),
            ..PermissionContext::default()
        };
        assert!(matches(PermissionScope::Own, None, Some(&ctx)));
        assert!(matches(PermissionScope::Own, None, None));
    }
}
