// ============================================================================
// Condo API - Access DTOs
// File: crates/condo-api/src/dto/access.rs
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use condo_core::domain::{
    EffectivePermission, PermissionContext, PermissionScope, PoolPermissionGrant,
    UserPermissionGrant,
};
use condo_core::services::{PermissionGrantOutcome, PoolPermissionGrantOutcome};

/// POST /api/v1/access/users/{user_id}/modules
#[derive(Debug, Deserialize, Validate)]
pub struct GrantModuleRequest {
    pub module_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /api/v1/access/users/{user_id}/permissions
#[derive(Debug, Deserialize, Validate)]
pub struct GrantPermissionRequest {
    pub module_permission_id: Uuid,
    pub scope: PermissionScope,
    #[validate(length(min = 1, max = 100, message = "Scope id must be between 1 and 100 characters"))]
    pub scope_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePoolRequest {
    #[validate(length(min = 2, max = 100, message = "Pool name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 1000, message = "Description too long"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddPoolMemberRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GrantPoolModuleRequest {
    pub module_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GrantPoolPermissionRequest {
    pub module_permission_id: Uuid,
    pub scope: PermissionScope,
    #[validate(length(min = 1, max = 100, message = "Scope id must be between 1 and 100 characters"))]
    pub scope_id: Option<String>,
}

/// Query of GET /api/v1/access/users/{user_id}/permissions
#[derive(Debug, Deserialize)]
pub struct ModuleQuery {
    pub module: String,
}

/// POST /api/v1/access/check
#[derive(Debug, Deserialize)]
pub struct CheckAccessRequest {
    pub user_id: Uuid,
    pub module: Option<String>,
    pub permission: Option<String>,
    #[serde(default)]
    pub context: Option<PermissionContext>,
}

#[derive(Debug, Serialize)]
pub struct CheckAccessResponse {
    pub allowed: bool,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub revoked: bool,
    /// Permission grants deactivated together with a module grant
    pub cascaded: u64,
}

#[derive(Debug, Serialize)]
pub struct PermissionGrantResponse {
    pub grant: UserPermissionGrant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companion: Option<UserPermissionGrant>,
}

impl From<PermissionGrantOutcome> for PermissionGrantResponse {
    fn from(outcome: PermissionGrantOutcome) -> Self {
        Self {
            grant: outcome.grant,
            companion: outcome.companion,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PoolPermissionGrantResponse {
    pub grant: PoolPermissionGrant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companion: Option<PoolPermissionGrant>,
}

impl From<PoolPermissionGrantOutcome> for PoolPermissionGrantResponse {
    fn from(outcome: PoolPermissionGrantOutcome) -> Self {
        Self {
            grant: outcome.grant,
            companion: outcome.companion,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserAccessResponse {
    pub user_id: Uuid,
    pub is_super_admin: bool,
    pub modules: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ModulePermissionsResponse {
    pub module: String,
    pub permissions: Vec<EffectivePermission>,
}
