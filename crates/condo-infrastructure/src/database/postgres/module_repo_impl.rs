// ============================================================================
// Condo Infrastructure - PostgreSQL Module Repository
// File: crates/condo-infrastructure/src/database/postgres/module_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use uuid::Uuid;

use condo_core::domain::{Module, ModulePermission};
use condo_core::error::DomainError;
use condo_core::repositories::ModuleRepository;

use super::rows::{ModulePermissionRow, ModuleRow};
use super::{db_error, PgAccessStore};

#[async_trait]
impl ModuleRepository for PgAccessStore {
    async fn find_module(&self, id: &Uuid) -> Result<Option<Module>, DomainError> {
        let row: Option<ModuleRow> = sqlx::query_as(
            r#"
            SELECT
                id, code, name, description, module_type, is_active,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            FROM modules
            WHERE id = $1 AND removed_at IS NULL
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding module by id"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_module_by_code(&self, code: &str) -> Result<Option<Module>, DomainError> {
        let row: Option<ModuleRow> = sqlx::query_as(
            r#"
            SELECT
                id, code, name, description, module_type, is_active,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            FROM modules
            WHERE code = $1 AND removed_at IS NULL
            "#
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding module by code"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_active_modules(&self) -> Result<Vec<Module>, DomainError> {
        let rows: Vec<ModuleRow> = sqlx::query_as(
            r#"
            SELECT
                id, code, name, description, module_type, is_active,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            FROM modules
            WHERE is_active AND removed_at IS NULL
            ORDER BY code
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing active modules"))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn find_module_permission(&self, id: &Uuid) -> Result<Option<ModulePermission>, DomainError> {
        let row: Option<ModulePermissionRow> = sqlx::query_as(
            r#"
            SELECT
                id, module_id, code, name, description, is_active,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            FROM module_permissions
            WHERE id = $1 AND removed_at IS NULL
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding module permission by id"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_module_permission_by_code(
        &self,
        module_id: &Uuid,
        code: &str,
    ) -> Result<Option<ModulePermission>, DomainError> {
        let row: Option<ModulePermissionRow> = sqlx::query_as(
            r#"
            SELECT
                id, module_id, code, name, description, is_active,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            FROM module_permissions
            WHERE module_id = $1 AND code = $2 AND removed_at IS NULL
            "#
        )
        .bind(module_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding module permission by code"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_module_permissions(&self, module_id: &Uuid) -> Result<Vec<ModulePermission>, DomainError> {
        let rows: Vec<ModulePermissionRow> = sqlx::query_as(
            r#"
            SELECT
                id, module_id, code, name, description, is_active,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            FROM module_permissions
            WHERE module_id = $1 AND is_active AND removed_at IS NULL
            ORDER BY code
            "#
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing module permissions"))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
