// ============================================================================
// Condo Infrastructure - PostgreSQL Pool Repository
// File: crates/condo-infrastructure/src/database/postgres/pool_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Postgres, Transaction};
use tracing::{error, info};
use uuid::Uuid;

use condo_core::domain::{
    Module, PermissionScope, Pool, PoolMember, PoolModuleGrant, PoolPermissionGrant,
    ScopedPermission,
};
use condo_core::error::DomainError;
use condo_core::repositories::PoolRepository;

use super::rows::{
    ModuleRow, PoolMemberRow, PoolModuleGrantRow, PoolPermissionGrantRow, PoolRow,
    ScopedPermissionRow,
};
use super::{db_error, is_unique_violation, PgAccessStore};

async fn upsert_pool_permission_grant(
    tx: &mut Transaction<'_, Postgres>,
    grant: &PoolPermissionGrant,
) -> Result<PoolPermissionGrant, DomainError> {
    let row: PoolPermissionGrantRow = sqlx::query_as(
        r#"
        INSERT INTO pool_permission_grants (
            id, pool_id, module_permission_id, scope, scope_id,
            granted_by, granted_at, is_active, modified_at, modified_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO UPDATE SET
            granted_by = EXCLUDED.granted_by,
            granted_at = EXCLUDED.granted_at,
            is_active = EXCLUDED.is_active,
            modified_at = EXCLUDED.modified_at,
            modified_by = EXCLUDED.modified_by
        RETURNING
            id, pool_id, module_permission_id, scope, scope_id,
            granted_by, granted_at, is_active, modified_at, modified_by
        "#
    )
    .bind(grant.id)
    .bind(grant.pool_id)
    .bind(grant.module_permission_id)
    .bind(grant.scope.as_str())
    .bind(&grant.scope_id)
    .bind(grant.granted_by)
    .bind(grant.granted_at)
    .bind(grant.is_active)
    .bind(grant.modified_at)
    .bind(grant.modified_by)
    .fetch_one(&mut **tx)
    .await
    .map_err(db_error("saving pool permission grant"))?;

    row.try_into()
}

#[async_trait]
impl PoolRepository for PgAccessStore {
    async fn find_pool(&self, id: &Uuid) -> Result<Option<Pool>, DomainError> {
        let row: Option<PoolRow> = sqlx::query_as(
            r#"
            SELECT
                id, name, description, is_active,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            FROM pools
            WHERE id = $1 AND removed_at IS NULL
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding pool by id"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn create_pool(&self, pool: &Pool) -> Result<Pool, DomainError> {
        info!("Creating pool: {}", pool.name);

        let row: PoolRow = sqlx::query_as(
            r#"
            INSERT INTO pools (
                id, name, description, is_active,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING
                id, name, description, is_active,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            "#
        )
        .bind(pool.id)
        .bind(&pool.name)
        .bind(&pool.description)
        .bind(pool.is_active)
        .bind(pool.created_at)
        .bind(pool.created_by)
        .bind(pool.modified_at)
        .bind(pool.modified_by)
        .bind(pool.removed_at)
        .bind(pool.removed_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating pool: {}", e);
            if is_unique_violation(&e) {
                DomainError::PoolNameAlreadyExists(pool.name.clone())
            } else {
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        Ok(row.into())
    }

    async fn list_user_pools(&self, user_id: &Uuid) -> Result<Vec<Pool>, DomainError> {
        let rows: Vec<PoolRow> = sqlx::query_as(
            r#"
            SELECT
                p.id, p.name, p.description, p.is_active,
                p.created_at, p.created_by, p.modified_at, p.modified_by,
                p.removed_at, p.removed_by
            FROM pool_members pm
            JOIN pools p ON p.id = pm.pool_id
            WHERE pm.user_id = $1
              AND pm.is_active
              AND p.is_active AND p.removed_at IS NULL
            ORDER BY p.name
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing user pools"))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn find_pool_member(
        &self,
        pool_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<PoolMember>, DomainError> {
        let row: Option<PoolMemberRow> = sqlx::query_as(
            r#"
            SELECT
                id, pool_id, user_id, added_by, added_at,
                is_active, modified_at, modified_by
            FROM pool_members
            WHERE pool_id = $1 AND user_id = $2
            "#
        )
        .bind(pool_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding pool member"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn save_pool_member(&self, member: &PoolMember) -> Result<PoolMember, DomainError> {
        let row: PoolMemberRow = sqlx::query_as(
            r#"
            INSERT INTO pool_members (
                id, pool_id, user_id, added_by, added_at,
                is_active, modified_at, modified_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                added_by = EXCLUDED.added_by,
                added_at = EXCLUDED.added_at,
                is_active = EXCLUDED.is_active,
                modified_at = EXCLUDED.modified_at,
                modified_by = EXCLUDED.modified_by
            RETURNING
                id, pool_id, user_id, added_by, added_at,
                is_active, modified_at, modified_by
            "#
        )
        .bind(member.id)
        .bind(member.pool_id)
        .bind(member.user_id)
        .bind(member.added_by)
        .bind(member.added_at)
        .bind(member.is_active)
        .bind(member.modified_at)
        .bind(member.modified_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("saving pool member"))?;

        Ok(row.into())
    }

    async fn list_active_member_ids(&self, pool_id: &Uuid) -> Result<Vec<Uuid>, DomainError> {
        sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM pool_members
            WHERE pool_id = $1 AND is_active
            "#
        )
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing active pool members"))
    }

    async fn list_pool_modules(&self, pool_id: &Uuid) -> Result<Vec<Module>, DomainError> {
        let rows: Vec<ModuleRow> = sqlx::query_as(
            r#"
            SELECT
                m.id, m.code, m.name, m.description, m.module_type, m.is_active,
                m.created_at, m.created_by, m.modified_at, m.modified_by,
                m.removed_at, m.removed_by
            FROM pool_module_grants g
            JOIN modules m ON m.id = g.module_id
            WHERE g.pool_id = $1
              AND g.is_active
              AND m.is_active AND m.removed_at IS NULL
            "#
        )
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing pool modules"))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_pool_permissions(&self, pool_id: &Uuid) -> Result<Vec<ScopedPermission>, DomainError> {
        let rows: Vec<ScopedPermissionRow> = sqlx::query_as(
            r#"
            SELECT
                m.code AS module_code, p.code, g.scope, g.scope_id, g.pool_id
            FROM pool_permission_grants g
            JOIN module_permissions p ON p.id = g.module_permission_id
            JOIN modules m ON m.id = p.module_id
            WHERE g.pool_id = $1
              AND g.is_active
              AND p.is_active AND p.removed_at IS NULL
              AND m.is_active AND m.removed_at IS NULL
            "#
        )
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing pool permissions"))?;

        rows.into_iter().map(ScopedPermission::try_from).collect()
    }

    async fn find_pool_module_grant(
        &self,
        pool_id: &Uuid,
        module_id: &Uuid,
    ) -> Result<Option<PoolModuleGrant>, DomainError> {
        let row: Option<PoolModuleGrantRow> = sqlx::query_as(
            r#"
            SELECT
                id, pool_id, module_id, granted_by, granted_at,
                is_active, modified_at, modified_by
            FROM pool_module_grants
            WHERE pool_id = $1 AND module_id = $2
            "#
        )
        .bind(pool_id)
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding pool module grant"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_pool_permission_grant(
        &self,
        pool_id: &Uuid,
        module_permission_id: &Uuid,
        scope: PermissionScope,
        scope_id: Option<&str>,
    ) -> Result<Option<PoolPermissionGrant>, DomainError> {
        let row: Option<PoolPermissionGrantRow> = sqlx::query_as(
            r#"
            SELECT
                id, pool_id, module_permission_id, scope, scope_id,
                granted_by, granted_at, is_active, modified_at, modified_by
            FROM pool_permission_grants
            WHERE pool_id = $1
              AND module_permission_id = $2
              AND scope = $3
              AND scope_id IS NOT DISTINCT FROM $4
            "#
        )
        .bind(pool_id)
        .bind(module_permission_id)
        .bind(scope.as_str())
        .bind(scope_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding pool permission grant"))?;

        row.map(PoolPermissionGrant::try_from).transpose()
    }

    async fn find_pool_permission_grant_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<PoolPermissionGrant>, DomainError> {
        let row: Option<PoolPermissionGrantRow> = sqlx::query_as(
            r#"
            SELECT
                id, pool_id, module_permission_id, scope, scope_id,
                granted_by, granted_at, is_active, modified_at, modified_by
            FROM pool_permission_grants
            WHERE id = $1
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding pool permission grant by id"))?;

        row.map(PoolPermissionGrant::try_from).transpose()
    }

    async fn save_pool_module_grant(
        &self,
        grant: &PoolModuleGrant,
    ) -> Result<PoolModuleGrant, DomainError> {
        let row: PoolModuleGrantRow = sqlx::query_as(
            r#"
            INSERT INTO pool_module_grants (
                id, pool_id, module_id, granted_by, granted_at,
                is_active, modified_at, modified_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                granted_by = EXCLUDED.granted_by,
                granted_at = EXCLUDED.granted_at,
                is_active = EXCLUDED.is_active,
                modified_at = EXCLUDED.modified_at,
                modified_by = EXCLUDED.modified_by
            RETURNING
                id, pool_id, module_id, granted_by, granted_at,
                is_active, modified_at, modified_by
            "#
        )
        .bind(grant.id)
        .bind(grant.pool_id)
        .bind(grant.module_id)
        .bind(grant.granted_by)
        .bind(grant.granted_at)
        .bind(grant.is_active)
        .bind(grant.modified_at)
        .bind(grant.modified_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("saving pool module grant"))?;

        Ok(row.into())
    }

    async fn save_pool_permission_grants(
        &self,
        grants: &[PoolPermissionGrant],
    ) -> Result<Vec<PoolPermissionGrant>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("starting pool permission grant transaction"))?;

        let mut saved = Vec::with_capacity(grants.len());
        for grant in grants {
            saved.push(upsert_pool_permission_grant(&mut tx, grant).await?);
        }

        tx.commit()
            .await
            .map_err(db_error("committing pool permission grants"))?;
        Ok(saved)
    }

    async fn revoke_pool_module_grant(&self, grant: &PoolModuleGrant) -> Result<u64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("starting pool module revoke transaction"))?;

        let updated = sqlx::query(
            r#"
            UPDATE pool_module_grants
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
        .map_err(db_error("revoking pool module grant"))?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::GrantNotFound(grant.id.to_string()));
        }

        let cascaded = sqlx::query(
            r#"
            UPDATE pool_permission_grants g
            SET is_active = FALSE, modified_at = $3, modified_by = $4
            FROM module_permissions p
            WHERE p.id = g.module_permission_id
              AND p.module_id = $2
              AND g.pool_id = $1
              AND g.is_active
            "#
        )
        .bind(grant.pool_id)
        .bind(grant.module_id)
        .bind(grant.modified_at.unwrap_or_else(Utc::now))
        .bind(grant.modified_by.unwrap_or(grant.granted_by))
        .execute(&mut *tx)
        .await
        .map_err(db_error("cascading pool module revoke"))?
        .rows_affected();

        tx.commit()
            .await
            .map_err(db_error("committing pool module revoke"))?;

        info!(
            "Pool module grant {} revoked, {} permission grants deactivated",
            grant.id, cascaded
        );
        Ok(cascaded)
    }
}
