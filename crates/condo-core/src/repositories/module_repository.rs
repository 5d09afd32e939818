//! Module catalogue repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::{Module, ModulePermission};
use crate::error::DomainError;

#[async_trait]
pub trait ModuleRepository: Send + Sync {
    async fn find_module(&self, id: &Uuid) -> Result<Option<Module>, DomainError>;
    async fn find_module_by_code(&self, code: &str) -> Result<Option<Module>, DomainError>;
    /// Active, non-deleted modules
    async fn list_active_modules(&self) -> Result<Vec<Module>, DomainError>;
    async fn find_module_permission(&self, id: &Uuid) -> Result<Option<ModulePermission>, DomainError>;
    async fn find_module_permission_by_code(
        &self,
        module_id: &Uuid,
        code: &str,
    ) -> Result<Option<ModulePermission>, DomainError>;
    /// Active permissions of one module
    async fn list_module_permissions(&self, module_id: &Uuid) -> Result<Vec<ModulePermission>, DomainError>;
}
