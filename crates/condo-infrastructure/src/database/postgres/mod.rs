//! PostgreSQL repository implementations
//!
//! `PgAccessStore` implements every access-control port over one pool, one
//! file per port. Port calls that must be atomic run in a single transaction.

pub mod rows;
pub mod user_account_repo_impl;
pub mod module_repo_impl;
pub mod user_grant_repo_impl;
pub mod pool_repo_impl;

use condo_core::error::DomainError;
use sqlx::PgPool;
use tracing::error;

#[derive(Clone)]
pub struct PgAccessStore {
    pool: PgPool,
}

impl PgAccessStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Log and wrap a driver error.
pub(crate) fn db_error(action: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        error!("Database error {}: {}", action, e);
        DomainError::DatabaseError(e.to_string())
    }
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map_or(false, |db| db.is_unique_violation())
}
