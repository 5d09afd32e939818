// ============================================================================
// Condo Infrastructure - PostgreSQL User Account Repository
// File: crates/condo-infrastructure/src/database/postgres/user_account_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use uuid::Uuid;

use condo_core::domain::UserAccount;
use condo_core::error::DomainError;
use condo_core::repositories::UserAccountRepository;

use super::rows::UserAccountRow;
use super::{db_error, PgAccessStore};

#[async_trait]
impl UserAccountRepository for PgAccessStore {
    async fn find_user(&self, id: &Uuid) -> Result<Option<UserAccount>, DomainError> {
        let row: Option<UserAccountRow> = sqlx::query_as(
            r#"
            SELECT
                id, email, display_name, is_active, is_super_admin,
                created_at, modified_at, removed_at
            FROM user_accounts
            WHERE id = $1 AND removed_at IS NULL
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding user account by id"))?;

        Ok(row.map(|r| r.into()))
    }
}
