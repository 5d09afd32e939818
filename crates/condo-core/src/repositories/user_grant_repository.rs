//! Direct user grant repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::{Module, PermissionScope, ScopedPermission, UserModuleGrant, UserPermissionGrant};
use crate::error::DomainError;

#[async_trait]
pub trait UserGrantRepository: Send + Sync {
    /// Modules reachable through active, unexpired direct grants on active modules.
    async fn list_user_granted_modules(
        &self,
        user_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Module>, DomainError>;

    /// Active, unexpired direct permission grants on active permissions of
    /// active modules, joined with their codes.
    async fn list_user_granted_permissions(
        &self,
        user_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScopedPermission>, DomainError>;

    /// The (user, module) row in any state.
    async fn find_user_module_grant(
        &self,
        user_id: &Uuid,
        module_id: &Uuid,
    ) -> Result<Option<UserModuleGrant>, DomainError>;

    /// The (user, permission, scope, scope_id) row in any state.
    async fn find_user_permission_grant(
        &self,
        user_id: &Uuid,
        module_permission_id: &Uuid,
        scope: PermissionScope,
        scope_id: Option<&str>,
    ) -> Result<Option<UserPermissionGrant>, DomainError>;

    async fn find_user_permission_grant_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<UserPermissionGrant>, DomainError>;

    /// Insert or update by id.
    async fn save_user_module_grant(
        &self,
        grant: &UserModuleGrant,
    ) -> Result<UserModuleGrant, DomainError>;

    /// Insert or update every row by id as one atomic unit.
    async fn save_user_permission_grants(
        &self,
        grants: &[UserPermissionGrant],
    ) -> Result<Vec<UserPermissionGrant>, DomainError>;

    /// Persist an already deactivated module grant and deactivate, in the
    /// same unit of work, every active permission grant of that user under
    /// that module. Returns how many permission grants were cascaded.
    async fn revoke_user_module_grant(
        &self,
        grant: &UserModuleGrant,
    ) -> Result<u64, DomainError>;
}
