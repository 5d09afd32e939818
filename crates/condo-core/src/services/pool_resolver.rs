// ============================================================================
// Condo Core - Pool Resolver
// File: crates/condo-core/src/services/pool_resolver.rs
// ============================================================================
//! Pool membership and pool-held grants. Pools do not nest, so inheritance
//! is a single join; nothing here is cached.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Module, PermissionContext, PermissionKey, Pool, ScopedPermission};
use crate::error::DomainError;
use crate::repositories::PoolRepository;
use super::scope_matcher;

pub struct PoolResolver<R: PoolRepository> {
    pool_repo: Arc<R>,
}

impl<R: PoolRepository> PoolResolver<R> {
    pub fn new(pool_repo: Arc<R>) -> Self {
        Self { pool_repo }
    }

    /// Active pools where the user is an active member
    pub async fn user_pools(&self, user_id: &Uuid) -> Result<Vec<Pool>, DomainError> {
        self.pool_repo.list_user_pools(user_id).await
    }

    pub async fn pool_modules(&self, pool_id: &Uuid) -> Result<Vec<Module>, DomainError> {
        self.pool_repo.list_pool_modules(pool_id).await
    }

    pub async fn pool_permissions(&self, pool_id: &Uuid) -> Result<Vec<ScopedPermission>, DomainError> {
        self.pool_repo.list_pool_permissions(pool_id).await
    }

    /// Uncached point check against the store. Grant preconditions use it;
    /// access decisions go through the resolver's cached merge instead.
    pub async fn has_module_access_via_pool(
        &self,
        user_id: &Uuid,
        module_code: &str,
    ) -> Result<bool, DomainError> {
        for pool in self.user_pools(user_id).await? {
            let modules = self.pool_modules(&pool.id).await?;
            if modules.iter().any(|m| m.code == module_code) {
                debug!("User {} reaches module {} through pool {}", user_id, module_code, pool.name);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Uncached point check against the store, for callers that must not see
    /// a cached decision. Every candidate of every pool is scope-checked; first
    /// match wins. `PermissionResolver` folds the same pool grants into its
    /// cached access set and must agree with this.
    pub async fn has_permission_via_pool(
        &self,
        user_id: &Uuid,
        key: &PermissionKey,
        context: Option<&PermissionContext>,
    ) -> Result<bool, DomainError> {
        for pool in self.user_pools(user_id).await? {
            let permissions = self.pool_permissions(&pool.id).await?;
            let granted = permissions
                .iter()
                .filter(|p| p.module_code == key.module && p.code == key.action)
                .any(|p| scope_matcher::matches(p.scope, p.scope_id.as_deref(), context));
            if granted {
                debug!("User {} holds {} through pool {}", user_id, key, pool.name);
                return Ok(true);
            }
        }
        Ok(false)
    }
}
