//! Decision contract consumed by the enforcement guard

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::PermissionContext;
use crate::error::DomainError;

#[async_trait]
pub trait AccessChecker: Send + Sync {
    async fn is_super_admin(&self, user_id: Uuid) -> Result<bool, DomainError>;

    async fn has_module_access(&self, user_id: Uuid, module_code: &str) -> Result<bool, DomainError>;

    /// `permission_key` is the raw `"module:action"` string; malformed keys
    /// resolve to `Ok(false)`.
    async fn has_permission(
        &self,
        user_id: Uuid,
        permission_key: &str,
        context: Option<PermissionContext>,
    ) -> Result<bool, DomainError>;
}
