// ============================================================================
// Condo Infrastructure - PostgreSQL User Grant Repository
// File: crates/condo-infrastructure/src/database/postgres/user_grant_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use condo_core::domain::{Module, PermissionScope, ScopedPermission, UserModuleGrant, UserPermissionGrant};
use condo_core::error::DomainError;
use condo_core::repositories::UserGrantRepository;

use super::rows::{ModuleRow, ScopedPermissionRow, UserModuleGrantRow, UserPermissionGrantRow};
use super::{db_error, PgAccessStore};

async fn upsert_user_permission_grant(
    tx: &mut Transaction<'_, Postgres>,
    grant: &UserPermissionGrant,
) -> Result<UserPermissionGrant, DomainError> {
    let row: UserPermissionGrantRow = sqlx::query_as(
        r#"
        INSERT INTO user_permission_grants (
            id, user_id, module_permission_id, scope, scope_id,
            granted_by, granted_at, expires_at, is_active,
            created_at, modified_at, modified_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO UPDATE SET
            granted_by = EXCLUDED.granted_by,
            granted_at = EXCLUDED.granted_at,
            expires_at = EXCLUDED.expires_at,
            is_active = EXCLUDED.is_active,
            modified_at = EXCLUDED.modified_at,
            modified_by = EXCLUDED.modified_by
        RETURNING
            id, user_id, module_permission_id, scope, scope_id,
            granted_by, granted_at, expires_at, is_active,
            created_at, modified_at, modified_by
        "#
    )
    .bind(grant.id)
    .bind(grant.user_id)
    .bind(grant.module_permission_id)
    .bind(grant.scope.as_str())
    .bind(&grant.scope_id)
    .bind(grant.granted_by)
    .bind(grant.granted_at)
    .bind(grant.expires_at)
    .bind(grant.is_active)
    .bind(grant.created_at)
    .bind(grant.modified_at)
    .bind(grant.modified_by)
    .fetch_one(&mut **tx)
    .await
    .map_err(db_error("saving user permission grant"))?;

    row.try_into()
}

#[async_trait]
impl UserGrantRepository for PgAccessStore {
    async fn list_user_granted_modules(
        &self,
        user_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Module>, DomainError> {
        let rows: Vec<ModuleRow> = sqlx::query_as(
            r#"
            SELECT
                m.id, m.code, m.name, m.description, m.module_type, m.is_active,
                m.created_at, m.created_by, m.modified_at, m.modified_by,
                m.removed_at, m.removed_by
            FROM user_module_grants g
            JOIN modules m ON m.id = g.module_id
            WHERE g.user_id = $1
              AND g.is_active
              AND (g.expires_at IS NULL OR g.expires_at > $2)
              AND m.is_active AND m.removed_at IS NULL
            "#
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing user granted modules"))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_user_granted_permissions(
        &self,
        user_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScopedPermission>, DomainError> {
        let rows: Vec<ScopedPermissionRow> = sqlx::query_as(
            r#"
            SELECT
                m.code AS module_code, p.code, g.scope, g.scope_id,
                NULL::uuid AS pool_id
            FROM user_permission_grants g
            JOIN module_permissions p ON p.id = g.module_permission_id
            JOIN modules m ON m.id = p.module_id
            WHERE g.user_id = $1
              AND g.is_active
              AND (g.expires_at IS NULL OR g.expires_at > $2)
              AND p.is_active AND p.removed_at IS NULL
              AND m.is_active AND m.removed_at IS NULL
            "#
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing user granted permissions"))?;

        rows.into_iter().map(ScopedPermission::try_from).collect()
    }

    async fn find_user_module_grant(
        &self,
        user_id: &Uuid,
        module_id: &Uuid,
    ) -> Result<Option<UserModuleGrant>, DomainError> {
        let row: Option<UserModuleGrantRow> = sqlx::query_as(
            r#"
            SELECT
                id, user_id, module_id, granted_by, granted_at, expires_at,
                is_active, created_at, modified_at, modified_by
            FROM user_module_grants
            WHERE user_id = $1 AND module_id = $2
            "#
        )
        .bind(user_id)
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding user module grant"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_user_permission_grant(
        &self,
        user_id: &Uuid,
        module_permission_id: &Uuid,
        scope: PermissionScope,
        scope_id: Option<&str>,
    ) -> Result<Option<UserPermissionGrant>, DomainError> {
        let row: Option<UserPermissionGrantRow> = sqlx::query_as(
            r#"
            SELECT
                id, user_id, module_permission_id, scope, scope_id,
                granted_by, granted_at, expires_at, is_active,
                created_at, modified_at, modified_by
            FROM user_permission_grants
            WHERE user_id = $1
              AND module_permission_id = $2
              AND scope = $3
              AND scope_id IS NOT DISTINCT FROM $4
            "#
        )
        .bind(user_id)
        .bind(module_permission_id)
        .bind(scope.as_str())
        .bind(scope_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding user permission grant"))?;

        row.map(UserPermissionGrant::try_from).transpose()
    }

    async fn find_user_permission_grant_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<UserPermissionGrant>, DomainError> {
        let row: Option<UserPermissionGrantRow> = sqlx::query_as(
            r#"
            SELECT
                id, user_id, module_permission_id, scope, scope_id,
                granted_by, granted_at, expires_at, is_active,
                created_at, modified_at, modified_by
            FROM user_permission_grants
            WHERE id = $1
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding user permission grant by id"))?;

        row.map(UserPermissionGrant::try_from).transpose()
    }

    async fn save_user_module_grant(
        &self,
        grant: &UserModuleGrant,
    ) -> Result<UserModuleGrant, DomainError> {
        let row: UserModuleGrantRow = sqlx::query_as(
            r#"
            INSERT INTO user_module_grants (
                id, user_id, module_id, granted_by, granted_at, expires_at,
                is_active, created_at, modified_at, modified_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                granted_by = EXCLUDED.granted_by,
                granted_at = EXCLUDED.granted_at,
                expires_at = EXCLUDED.expires_at,
                is_active = EXCLUDED.is_active,
                modified_at = EXCLUDED.modified_at,
                modified_by = EXCLUDED.modified_by
            RETURNING
                id, user_id, module_id, granted_by, granted_at, expires_at,
                is_active, created_at, modified_at, modified_by
            "#
        )
        .bind(grant.id)
        .bind(grant.user_id)
        .bind(grant.module_id)
        .bind(grant.granted_by)
        .bind(grant.granted_at)
        .bind(grant.expires_at)
        .bind(grant.is_active)
        .bind(grant.created_at)
        .bind(grant.modified_at)
        .bind(grant.modified_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("saving user module grant"))?;

        Ok(row.into())
    }

    async fn save_user_permission_grants(
        &self,
        grants: &[UserPermissionGrant],
    ) -> Result<Vec<UserPermissionGrant>, DomainError> {
        // All rows commit together or not at all
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("starting user permission grant transaction"))?;

        let mut saved = Vec::with_capacity(grants.len());
        for grant in grants {
            saved.push(upsert_user_permission_grant(&mut tx, grant).await?);
        }

        tx.commit()
            .await
            .map_err(db_error("committing user permission grants"))?;
        Ok(saved)
    }

    async fn revoke_user_module_grant(&self, grant: &UserModuleGrant) -> Result<u64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("starting module revoke transaction"))?;

        let updated = sqlx::query(
            r#"
            UPDATE user_module_grants
            SET is_active = $2, modified_at = $3, modified_by = $4
            WHERE id = $1
            "#
        )
        .bind(grant.id)
        .bind(grant.is_active)
        .bind(grant.modified_at)
        .bind(grant.modified_by)
        .execute(&mut *tx)
        .await
        .map_err(db_error("revoking user module grant"))?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::GrantNotFound(grant.id.to_string()));
        }

        let cascaded = sqlx::query(
            r#"
            UPDATE user_permission_grants g
            SET is_active = FALSE, modified_at = $3, modified_by = $4
            FROM module_permissions p
            WHERE p.id = g.module_permission_id
              AND p.module_id = $2
              AND g.user_id = $1
              AND g.is_active
            "#
        )
        .bind(grant.user_id)
        .bind(grant.module_id)
        .bind(grant.modified_at.unwrap_or_else(Utc::now))
        .bind(grant.modified_by.unwrap_or(grant.granted_by))
        .execute(&mut *tx)
        .await
        .map_err(db_error("cascading user module revoke"))?
        .rows_affected();

        tx.commit()
            .await
            .map_err(db_error("committing module revoke"))?;

        info!(
            "Module grant {} revoked, {} permission grants deactivated",
            grant.id, cascaded
        );
        Ok(cascaded)
    }
}
