//! Pool repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::{
    Module, PermissionScope, Pool, PoolMember, PoolModuleGrant, PoolPermissionGrant,
    ScopedPermission,
};
use crate::error::DomainError;

#[async_trait]
pub trait PoolRepository: Send + Sync {
    async fn find_pool(&self, id: &Uuid) -> Result<Option<Pool>, DomainError>;
    async fn create_pool(&self, pool: &Pool) -> Result<Pool, DomainError>;

    /// Active pools where the user is an active member.
    async fn list_user_pools(&self, user_id: &Uuid) -> Result<Vec<Pool>, DomainError>;

    async fn find_pool_member(
        &self,
        pool_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<PoolMember>, DomainError>;
    async fn save_pool_member(&self, member: &PoolMember) -> Result<PoolMember, DomainError>;
    async fn list_active_member_ids(&self, pool_id: &Uuid) -> Result<Vec<Uuid>, DomainError>;

    /// Active modules held through active pool module grants.
    async fn list_pool_modules(&self, pool_id: &Uuid) -> Result<Vec<Module>, DomainError>;

    /// Active pool permission grants joined with their codes.
    async fn list_pool_permissions(&self, pool_id: &Uuid) -> Result<Vec<ScopedPermission>, DomainError>;

    async fn find_pool_module_grant(
        &self,
        pool_id: &Uuid,
        module_id: &Uuid,
    ) -> Result<Option<PoolModuleGrant>, DomainError>;
    async fn find_pool_permission_grant(
        &self,
        pool_id: &Uuid,
        module_permission_id: &Uuid,
        scope: PermissionScope,
        scope_id: Option<&str>,
    ) -> Result<Option<PoolPermissionGrant>, DomainError>;
    async fn find_pool_permission_grant_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<PoolPermissionGrant>, DomainError>;

    async fn save_pool_module_grant(
        &self,
        grant: &PoolModuleGrant,
    ) -> Result<PoolModuleGrant, DomainError>;
    async fn save_pool_permission_grants(
        &self,
        grants: &[PoolPermissionGrant],
    ) -> Result<Vec<PoolPermissionGrant>, DomainError>;

    /// Same contract as the user variant: persist the deactivated module
    /// grant and cascade to the pool's permission grants under that module.
    async fn revoke_pool_module_grant(&self, grant: &PoolModuleGrant) -> Result<u64, DomainError>;
}
