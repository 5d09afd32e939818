// ============================================================================
// Condo Infrastructure - Row Types
// File: crates/condo-infrastructure/src/database/postgres/rows.rs
// ============================================================================

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use condo_core::domain::{
    GrantSource, Module, ModulePermission, ModuleType, PermissionScope, Pool, PoolMember,
    PoolModuleGrant, PoolPermissionGrant, ScopedPermission, UserAccount, UserModuleGrant,
    UserPermissionGrant,
};
use condo_core::error::DomainError;

/// Scope columns are CHECK-constrained; anything else is a corrupt row and
/// must not widen access.
pub(crate) fn parse_scope(value: &str) -> Result<PermissionScope, DomainError> {
    PermissionScope::from_str(value)
        .ok_or_else(|| DomainError::DatabaseError(format!("unknown scope value: {}", value)))
}

#[derive(Debug, FromRow)]
pub(crate) struct UserAccountRow {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub is_active: bool,
    pub is_super_admin: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl From<UserAccountRow> for UserAccount {
    fn from(row: UserAccountRow) -> Self {
        UserAccount {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            is_active: row.is_active,
            is_super_admin: row.is_super_admin,
            created_at: row.created_at,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ModuleRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub module_type: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl From<ModuleRow> for Module {
    fn from(row: ModuleRow) -> Self {
        Module {
            id: row.id,
            code: row.code,
            name: row.name,
            description: row.description,
            module_type: ModuleType::from_str(&row.module_type).unwrap_or_default(),
            is_active: row.is_active,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            modified_by: row.modified_by,
            removed_at: row.removed_at,
            removed_by: row.removed_by,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ModulePermissionRow {
    pub id: Uuid,
    pub module_id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl From<ModulePermissionRow> for ModulePermission {
    fn from(row: ModulePermissionRow) -> Self {
        ModulePermission {
            id: row.id,
            module_id: row.module_id,
            code: row.code,
            name: row.name,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            modified_by: row.modified_by,
            removed_at: row.removed_at,
            removed_by: row.removed_by,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct UserModuleGrantRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
}

impl From<UserModuleGrantRow> for UserModuleGrant {
    fn from(row: UserModuleGrantRow) -> Self {
        UserModuleGrant {
            id: row.id,
            user_id: row.user_id,
            module_id: row.module_id,
            granted_by: row.granted_by,
            granted_at: row.granted_at,
            expires_at: row.expires_at,
            is_active: row.is_active,
            created_at: row.created_at,
            modified_at: row.modified_at,
            modified_by: row.modified_by,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct UserPermissionGrantRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_permission_id: Uuid,
    pub scope: String,
    pub scope_id: Option<String>,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
}

impl TryFrom<UserPermissionGrantRow> for UserPermissionGrant {
    type Error = DomainError;

    fn try_from(row: UserPermissionGrantRow) -> Result<Self, Self::Error> {
        Ok(UserPermissionGrant {
            id: row.id,
            user_id: row.user_id,
            module_permission_id: row.module_permission_id,
            scope: parse_scope(&row.scope)?,
            scope_id: row.scope_id,
            granted_by: row.granted_by,
            granted_at: row.granted_at,
            expires_at: row.expires_at,
            is_active: row.is_active,
            created_at: row.created_at,
            modified_at: row.modified_at,
            modified_by: row.modified_by,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PoolRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl From<PoolRow> for Pool {
    fn from(row: PoolRow) -> Self {
        Pool {
            id: row.id,
            name: row.name,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            modified_by: row.modified_by,
            removed_at: row.removed_at,
            removed_by: row.removed_by,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PoolMemberRow {
    pub id: Uuid,
    pub pool_id: Uuid,
    pub user_id: Uuid,
    pub added_by: Uuid,
    pub added_at: DateTime<Utc>,
    pub is_active: bool,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
}

impl From<PoolMemberRow> for PoolMember {
    fn from(row: PoolMemberRow) -> Self {
        PoolMember {
            id: row.id,
            pool_id: row.pool_id,
            user_id: row.user_id,
            added_by: row.added_by,
            added_at: row.added_at,
            is_active: row.is_active,
            modified_at: row.modified_at,
            modified_by: row.modified_by,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PoolModuleGrantRow {
    pub id: Uuid,
    pub pool_id: Uuid,
    pub module_id: Uuid,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub is_active: bool,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
}

impl From<PoolModuleGrantRow> for PoolModuleGrant {
    fn from(row: PoolModuleGrantRow) -> Self {
        PoolModuleGrant {
            id: row.id,
            pool_id: row.pool_id,
            module_id: row.module_id,
            granted_by: row.granted_by,
            granted_at: row.granted_at,
            is_active: row.is_active,
            modified_at: row.modified_at,
            modified_by: row.modified_by,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PoolPermissionGrantRow {
    pub id: Uuid,
    pub pool_id: Uuid,
    pub module_permission_id: Uuid,
    pub scope: String,
    pub scope_id: Option<String>,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub is_active: bool,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
}

impl TryFrom<PoolPermissionGrantRow> for PoolPermissionGrant {
    type Error = DomainError;

    fn try_from(row: PoolPermissionGrantRow) -> Result<Self, Self::Error> {
        Ok(PoolPermissionGrant {
            id: row.id,
            pool_id: row.pool_id,
            module_permission_id: row.module_permission_id,
            scope: parse_scope(&row.scope)?,
            scope_id: row.scope_id,
            granted_by: row.granted_by,
            granted_at: row.granted_at,
            is_active: row.is_active,
            modified_at: row.modified_at,
            modified_by: row.modified_by,
        })
    }
}

/// Joined read model. `pool_id` is NULL for direct grants.
#[derive(Debug, FromRow)]
pub(crate) struct ScopedPermissionRow {
    pub module_code: String,
    pub code: String,
    pub scope: String,
    pub scope_id: Option<String>,
    pub pool_id: Option<Uuid>,
}

impl TryFrom<ScopedPermissionRow> for ScopedPermission {
    type Error = DomainError;

    fn try_from(row: ScopedPermissionRow) -> Result<Self, Self::Error> {
        Ok(ScopedPermission {
            module_code: row.module_code,
            code: row.code,
            scope: parse_scope(&row.scope)?,
            scope_id: row.scope_id,
            source: row.pool_id.map_or(GrantSource::Direct, GrantSource::Pool),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_scope_is_rejected() {
        assert_eq!(parse_scope("TENANT").unwrap(), PermissionScope::Tenant);
        assert!(matches!(parse_scope("EVERYONE"), Err(DomainError::DatabaseError(_))));
        assert!(parse_scope("all").is_err());
    }

    #[test]
    fn test_scoped_row_source() {
        let pool_id = Uuid::new_v4();
        let row = ScopedPermissionRow {
            module_code: "reportes".to_string(),
            code: "export".to_string(),
            scope: "TENANT".to_string(),
            scope_id: Some("condo-1".to_string()),
            pool_id: Some(pool_id),
        };
        let permission = ScopedPermission::try_from(row).unwrap();
        assert_eq!(permission.source, GrantSource::Pool(pool_id));
        assert_eq!(permission.scope_id.as_deref(), Some("condo-1"));
    }
}
