// ============================================================================
// Condo Core - Pool Grant Entities
// File: crates/condo-core/src/domain/pool_grant.rs
// Description: Module access and scoped permissions held by a pool
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scope::PermissionScope;

/// Pool Module Grant entity, one row per (pool, module)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolModuleGrant {
    pub id: Uuid,
    pub pool_id: Uuid,
    pub module_id: Uuid,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub is_active: bool,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
}

impl PoolModuleGrant {
    pub fn new(pool_id: Uuid, module_id: Uuid, granted_by: Uuid) -> Self {
        Self {
            id: condo_shared::new_id(),
            pool_id,
            module_id,
            granted_by,
            granted_at: Utc::now(),
            is_active: true,
            modified_at: None,
            modified_by: None,
        }
    }

    pub fn reactivate(&mut self, granted_by: Uuid) {
        let now = Utc::now();
        self.is_active = true;
        self.granted_by = granted_by;
        self.granted_at = now;
        self.modified_at = Some(now);
        self.modified_by = Some(granted_by);
    }

    pub fn deactivate(&mut self, revoked_by: Uuid) {
        self.is_active = false;
        self.modified_at = Some(Utc::now());
        self.modified_by = Some(revoked_by);
    }
}

/// Pool Permission Grant entity, unique on (pool, permission, scope, scope_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolPermissionGrant {
    pub id: Uuid,
    pub pool_id: Uuid,
    pub module_permission_id: Uuid,
    pub scope: PermissionScope,
    pub scope_id: Option<String>,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub is_active: bool,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
}

impl PoolPermissionGrant {
    pub fn new(
        pool_id: Uuid,
        module_permission_id: Uuid,
        scope: PermissionScope,
        scope_id: Option<String>,
        granted_by: Uuid,
    ) -> Self {
        Self {
            id: condo_shared::new_id(),
            pool_id,
            module_permission_id,
            scope,
            scope_id,
            granted_by,
            granted_at: Utc::now(),
            is_active: true,
            modified_at: None,
            modified_by: None,
        }
    }

    pub fn reactivate(&mut self, granted_by: Uuid) {
        let now = Utc::now();
        self.is_active = true;
        self.granted_by = granted_by;
        self.granted_at = now;
        self.modified_at = Some(now);
        self.modified_by = Some(granted_by);
    }

    pub fn deactivate(&mut self, revoked_by: Uuid) {
        self.is_active = false;
        self.modified_at = Some(Utc::now());
        self.modified_by = Some(revoked_by);
    }

    pub fn targets(&self, scope: PermissionScope, scope_id: Option<&str>) -> bool {
        self.scope == scope && self.scope_id.as_deref() == scope_id
    }
}
