// ============================================================================
// Condo Core - User Permission Grant Entity
// File: crates/condo-core/src/domain/user_permission_grant.rs
// Description: Scoped granular permission for a user
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scope::PermissionScope;

/// User Permission Grant entity, unique on (user, permission, scope, scope_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPermissionGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_permission_id: Uuid,
    pub scope: PermissionScope,
    pub scope_id: Option<String>,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
}

impl UserPermissionGrant {
    pub fn new(
        user_id: Uuid,
        module_permission_id: Uuid,
        scope: PermissionScope,
        scope_id: Option<String>,
        granted_by: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: condo_shared::new_id(),
            user_id,
            module_permission_id,
            scope,
            scope_id,
            granted_by,
            granted_at: now,
            expires_at,
            is_active: true,
            created_at: now,
            modified_at: None,
            modified_by: None,
        }
    }

    pub fn reactivate(&mut self, granted_by: Uuid, expires_at: Option<DateTime<Utc>>) {
        let now = Utc::now();
        self.is_active = true;
        self.granted_by = granted_by;
        self.granted_at = now;
        self.expires_at = expires_at;
        self.modified_at = Some(now);
        self.modified_by = Some(granted_by);
    }

    pub fn deactivate(&mut self, revoked_by: Uuid) {
        self.is_active = false;
        self.modified_at = Some(Utc::now());
        self.modified_by = Some(revoked_by);
    }

    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |at| at > now)
    }

    /// Same (scope, scope_id) target
    pub fn targets(&self, scope: PermissionScope, scope_id: Option<&str>) -> bool {
        self.scope == scope && self.scope_id.as_deref() == scope_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_compares_scope_and_id() {
        let grant = UserPermissionGrant::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            PermissionScope::Tenant,
            Some("condo-1".to_string()),
            Uuid::new_v4(),
            None,
        );
        assert!(grant.targets(PermissionScope::Tenant, Some("condo-1")));
        assert!(!grant.targets(PermissionScope::Tenant, Some("condo-2")));
        assert!(!grant.targets(PermissionScope::All, None));
    }
}
