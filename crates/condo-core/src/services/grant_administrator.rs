// ============================================================================
// Condo Core - Grant Administrator
// File: crates/condo-core/src/services/grant_administrator.rs
// Description: Grant/revoke state machine for users and pools. Each grant row
//              moves absent -> active -> inactive -> active and is never
//              deleted. Every mutation invalidates the affected cache entries
//              once the store has committed it.
// ============================================================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::DecisionCache;
use crate::domain::{
    actions, Module, ModulePermission, PermissionScope, Pool, PoolMember, PoolModuleGrant,
    PoolPermissionGrant, UserAccount, UserModuleGrant, UserPermissionGrant,
};
use crate::error::DomainError;
use crate::repositories::{
    AccessStore, ModuleRepository, PoolRepository, UserAccountRepository, UserGrantRepository,
};
use super::pool_resolver::PoolResolver;

/// Result of a user permission grant. `companion` carries the `read` grant
/// created or reactivated alongside a mutating CRUD action, if any.
#[derive(Debug, Clone)]
pub struct PermissionGrantOutcome {
    pub grant: UserPermissionGrant,
    pub companion: Option<UserPermissionGrant>,
}

#[derive(Debug, Clone)]
pub struct PoolPermissionGrantOutcome {
    pub grant: PoolPermissionGrant,
    pub companion: Option<PoolPermissionGrant>,
}

pub struct GrantAdministrator<S: AccessStore> {
    store: Arc<S>,
    pools: PoolResolver<S>,
    cache: Arc<DecisionCache>,
}

impl<S: AccessStore> GrantAdministrator<S> {
    pub fn new(store: Arc<S>, cache: Arc<DecisionCache>) -> Self {
        Self {
            pools: PoolResolver::new(store.clone()),
            store,
            cache,
        }
    }

    // ------------------------------------------------------------------
    // Direct user grants
    // ------------------------------------------------------------------

    pub async fn grant_module_access(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        module_id: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<UserModuleGrant, DomainError> {
        let now = Utc::now();
        ensure_future(expires_at, now)?;
        self.load_user(&user_id).await?;
        let module = self.load_active_module(&module_id).await?;

        let grant = match self.store.find_user_module_grant(&user_id, &module_id).await? {
            Some(existing) if existing.is_effective(now) => {
                return Err(DomainError::AlreadyGranted(format!(
                    "module {} for user {}",
                    module.code, user_id
                )));
            }
            Some(mut existing) => {
                existing.reactivate(admin_id, expires_at);
                existing
            }
            None => UserModuleGrant::new(user_id, module_id, admin_id, expires_at),
        };

        let saved = self.store.save_user_module_grant(&grant).await?;
        self.cache.invalidate(&user_id);

        info!(
            "Module access to {} granted to user {} by {}",
            module.code, user_id, admin_id
        );
        Ok(saved)
    }

    /// Returns how many permission grants under the module were deactivated
    /// along with the module grant.
    pub async fn revoke_module_access(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        module_id: Uuid,
    ) -> Result<u64, DomainError> {
        let mut grant = self
            .store
            .find_user_module_grant(&user_id, &module_id)
            .await?
            .filter(|g| g.is_active)
            .ok_or_else(|| {
                DomainError::GrantNotFound(format!("module {} for user {}", module_id, user_id))
            })?;

        grant.deactivate(admin_id);
        let cascaded = self.store.revoke_user_module_grant(&grant).await?;
        self.cache.invalidate(&user_id);

        info!(
            "Module access {} revoked from user {} by {} ({} permission grants cascaded)",
            module_id, user_id, admin_id, cascaded
        );
        Ok(cascaded)
    }

    pub async fn grant_permission(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        module_permission_id: Uuid,
        scope: PermissionScope,
        scope_id: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<PermissionGrantOutcome, DomainError> {
        let now = Utc::now();
        scope.validate_scope_id(scope_id.as_deref())?;
        ensure_future(expires_at, now)?;
        self.load_user(&user_id).await?;
        let (module, permission) = self.load_active_permission(&module_permission_id).await?;

        if !self.user_has_module_access(&user_id, &module, now).await? {
            warn!(
                "Permission {}:{} refused for user {}: no module access",
                module.code, permission.code, user_id
            );
            return Err(DomainError::ModuleAccessRequired(module.code));
        }

        let grant = match self
            .store
            .find_user_permission_grant(&user_id, &permission.id, scope, scope_id.as_deref())
            .await?
        {
            Some(existing) if existing.is_effective(now) => {
                return Err(DomainError::AlreadyGranted(format!(
                    "{}:{} ({}) for user {}",
                    module.code,
                    permission.code,
                    scope.as_str(),
                    user_id
                )));
            }
            Some(mut existing) => {
                existing.reactivate(admin_id, expires_at);
                existing
            }
            None => UserPermissionGrant::new(
                user_id,
                permission.id,
                scope,
                scope_id.clone(),
                admin_id,
                expires_at,
            ),
        };

        let mut companion = None;
        if let Some(read) = self.companion_read_permission(&module, &permission).await? {
            companion = match self
                .store
                .find_user_permission_grant(&user_id, &read.id, scope, scope_id.as_deref())
                .await?
            {
                Some(existing) if existing.is_effective(now) => None,
                Some(mut existing) => {
                    existing.reactivate(admin_id, expires_at);
                    Some(existing)
                }
                None => Some(UserPermissionGrant::new(
                    user_id,
                    read.id,
                    scope,
                    scope_id.clone(),
                    admin_id,
                    expires_at,
                )),
            };
        }

        let mut batch = vec![grant];
        batch.extend(companion);
        let mut saved = self.store.save_user_permission_grants(&batch).await?.into_iter();
        self.cache.invalidate(&user_id);

        let grant = saved
            .next()
            .ok_or_else(|| DomainError::InternalError("permission grant was not persisted".to_string()))?;
        let companion = saved.next();

        info!(
            "Permission {}:{} ({}) granted to user {} by {}{}",
            module.code,
            permission.code,
            scope.as_str(),
            user_id,
            admin_id,
            if companion.is_some() { " with companion read" } else { "" }
        );
        Ok(PermissionGrantOutcome { grant, companion })
    }

    /// Deactivates exactly one grant. A companion `read` stays in place.
    pub async fn revoke_permission(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        grant_id: Uuid,
    ) -> Result<UserPermissionGrant, DomainError> {
        let mut grant = self
            .store
            .find_user_permission_grant_by_id(&grant_id)
            .await?
            .filter(|g| g.user_id == user_id && g.is_active)
            .ok_or_else(|| DomainError::GrantNotFound(grant_id.to_string()))?;

        grant.deactivate(admin_id);
        let mut saved = self.store.save_user_permission_grants(&[grant]).await?;
        self.cache.invalidate(&user_id);

        info!("Permission grant {} revoked from user {} by {}", grant_id, user_id, admin_id);
        saved
            .pop()
            .ok_or_else(|| DomainError::InternalError("permission grant was not persisted".to_string()))
    }

    // ------------------------------------------------------------------
    // Pools
    // ------------------------------------------------------------------

    pub async fn create_pool(
        &self,
        admin_id: Uuid,
        name: String,
        description: Option<String>,
    ) -> Result<Pool, DomainError> {
        let pool = Pool::new(name, description, Some(admin_id))?;
        let created = self.store.create_pool(&pool).await?;
        info!("Pool {} ({}) created by {}", created.name, created.id, admin_id);
        Ok(created)
    }

    pub async fn add_pool_member(
        &self,
        admin_id: Uuid,
        pool_id: Uuid,
        user_id: Uuid,
    ) -> Result<PoolMember, DomainError> {
        let pool = self.load_active_pool(&pool_id).await?;
        self.load_user(&user_id).await?;

        let member = match self.store.find_pool_member(&pool_id, &user_id).await? {
            Some(existing) if existing.is_active => {
                return Err(DomainError::AlreadyGranted(format!(
                    "membership of user {} in pool {}",
                    user_id, pool.name
                )));
            }
            Some(mut existing) => {
                existing.reactivate(admin_id);
                existing
            }
            None => PoolMember::new(pool_id, user_id, admin_id),
        };

        let saved = self.store.save_pool_member(&member).await?;
        self.cache.invalidate(&user_id);

        info!("User {} added to pool {} by {}", user_id, pool.name, admin_id);
        Ok(saved)
    }

    pub async fn remove_pool_member(
        &self,
        admin_id: Uuid,
        pool_id: Uuid,
        user_id: Uuid,
    ) -> Result<PoolMember, DomainError> {
        self.load_pool(&pool_id).await?;
        let mut member = self
            .store
            .find_pool_member(&pool_id, &user_id)
            .await?
            .filter(|m| m.is_active)
            .ok_or(DomainError::PoolMemberNotFound { pool_id, user_id })?;

        member.deactivate(admin_id);
        let saved = self.store.save_pool_member(&member).await?;
        self.cache.invalidate(&user_id);

        info!("User {} removed from pool {} by {}", user_id, pool_id, admin_id);
        Ok(saved)
    }

    pub async fn grant_pool_module_access(
        &self,
        admin_id: Uuid,
        pool_id: Uuid,
        module_id: Uuid,
    ) -> Result<PoolModuleGrant, DomainError> {
        let pool = self.load_active_pool(&pool_id).await?;
        let module = self.load_active_module(&module_id).await?;

        let grant = match self.store.find_pool_module_grant(&pool_id, &module_id).await? {
            Some(existing) if existing.is_active => {
                return Err(DomainError::AlreadyGranted(format!(
                    "module {} for pool {}",
                    module.code, pool.name
                )));
            }
            Some(mut existing) => {
                existing.reactivate(admin_id);
                existing
            }
            None => PoolModuleGrant::new(pool_id, module_id, admin_id),
        };

        let saved = self.store.save_pool_module_grant(&grant).await?;
        let affected = self.invalidate_pool_members(&pool_id).await?;

        info!(
            "Module access to {} granted to pool {} by {} ({} members affected)",
            module.code, pool.name, admin_id, affected
        );
        Ok(saved)
    }

    pub async fn revoke_pool_module_access(
        &self,
        admin_id: Uuid,
        pool_id: Uuid,
        module_id: Uuid,
    ) -> Result<u64, DomainError> {
        self.load_pool(&pool_id).await?;
        let mut grant = self
            .store
            .find_pool_module_grant(&pool_id, &module_id)
            .await?
            .filter(|g| g.is_active)
            .ok_or_else(|| {
                DomainError::GrantNotFound(format!("module {} for pool {}", module_id, pool_id))
            })?;

        grant.deactivate(admin_id);
        let cascaded = self.store.revoke_pool_module_grant(&grant).await?;
        let affected = self.invalidate_pool_members(&pool_id).await?;

        info!(
            "Module access {} revoked from pool {} by {} ({} permission grants cascaded, {} members affected)",
            module_id, pool_id, admin_id, cascaded, affected
        );
        Ok(cascaded)
    }

    pub async fn grant_pool_permission(
        &self,
        admin_id: Uuid,
        pool_id: Uuid,
        module_permission_id: Uuid,
        scope: PermissionScope,
        scope_id: Option<String>,
    ) -> Result<PoolPermissionGrantOutcome, DomainError> {
        scope.validate_scope_id(scope_id.as_deref())?;
        let pool = self.load_active_pool(&pool_id).await?;
        let (module, permission) = self.load_active_permission(&module_permission_id).await?;

        let holds_module = self
            .store
            .find_pool_module_grant(&pool_id, &module.id)
            .await?
            .map_or(false, |g| g.is_active);
        if !holds_module {
            warn!(
                "Permission {}:{} refused for pool {}: no module access",
                module.code, permission.code, pool.name
            );
            return Err(DomainError::ModuleAccessRequired(module.code));
        }

        let grant = match self
            .store
            .find_pool_permission_grant(&pool_id, &permission.id, scope, scope_id.as_deref())
            .await?
        {
            Some(existing) if existing.is_active => {
                return Err(DomainError::AlreadyGranted(format!(
                    "{}:{} ({}) for pool {}",
                    module.code,
                    permission.code,
                    scope.as_str(),
                    pool.name
                )));
            }
            Some(mut existing) => {
                existing.reactivate(admin_id);
                existing
            }
            None => PoolPermissionGrant::new(pool_id, permission.id, scope, scope_id.clone(), admin_id),
        };

        let mut companion = None;
        if let Some(read) = self.companion_read_permission(&module, &permission).await? {
            companion = match self
                .store
                .find_pool_permission_grant(&pool_id, &read.id, scope, scope_id.as_deref())
                .await?
            {
                Some(existing) if existing.is_active => None,
                Some(mut existing) => {
                    existing.reactivate(admin_id);
                    Some(existing)
                }
                None => Some(PoolPermissionGrant::new(
                    pool_id,
                    read.id,
                    scope,
                    scope_id.clone(),
                    admin_id,
                )),
            };
        }

        let mut batch = vec![grant];
        batch.extend(companion);
        let mut saved = self.store.save_pool_permission_grants(&batch).await?.into_iter();
        let affected = self.invalidate_pool_members(&pool_id).await?;

        let grant = saved
            .next()
            .ok_or_else(|| DomainError::InternalError("pool permission grant was not persisted".to_string()))?;
        let companion = saved.next();

        info!(
            "Permission {}:{} ({}) granted to pool {} by {} ({} members affected)",
            module.code,
            permission.code,
            scope.as_str(),
            pool.name,
            admin_id,
            affected
        );
        Ok(PoolPermissionGrantOutcome { grant, companion })
    }

    pub async fn revoke_pool_permission(
        &self,
        admin_id: Uuid,
        pool_id: Uuid,
        grant_id: Uuid,
    ) -> Result<PoolPermissionGrant, DomainError> {
        let mut grant = self
            .store
            .find_pool_permission_grant_by_id(&grant_id)
            .await?
            .filter(|g| g.pool_id == pool_id && g.is_active)
            .ok_or_else(|| DomainError::GrantNotFound(grant_id.to_string()))?;

        grant.deactivate(admin_id);
        let mut saved = self.store.save_pool_permission_grants(&[grant]).await?;
        self.invalidate_pool_members(&pool_id).await?;

        info!("Pool permission grant {} revoked from pool {} by {}", grant_id, pool_id, admin_id);
        saved
            .pop()
            .ok_or_else(|| DomainError::InternalError("pool permission grant was not persisted".to_string()))
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn load_user(&self, user_id: &Uuid) -> Result<UserAccount, DomainError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(*user_id))
    }

    async fn load_active_module(&self, module_id: &Uuid) -> Result<Module, DomainError> {
        let module = self
            .store
            .find_module(module_id)
            .await?
            .ok_or_else(|| DomainError::ModuleNotFound(module_id.to_string()))?;
        if !module.is_available() {
            return Err(DomainError::ModuleNotActive(module.code));
        }
        Ok(module)
    }

    async fn load_active_permission(
        &self,
        module_permission_id: &Uuid,
    ) -> Result<(Module, ModulePermission), DomainError> {
        let permission = self
            .store
            .find_module_permission(module_permission_id)
            .await?
            .filter(|p| p.is_available())
            .ok_or(DomainError::ModulePermissionNotFound(*module_permission_id))?;
        let module = self.load_active_module(&permission.module_id).await?;
        Ok((module, permission))
    }

    async fn load_pool(&self, pool_id: &Uuid) -> Result<Pool, DomainError> {
        self.store
            .find_pool(pool_id)
            .await?
            .ok_or(DomainError::PoolNotFound(*pool_id))
    }

    async fn load_active_pool(&self, pool_id: &Uuid) -> Result<Pool, DomainError> {
        let pool = self.load_pool(pool_id).await?;
        if !pool.is_available() {
            return Err(DomainError::PoolNotActive(*pool_id));
        }
        Ok(pool)
    }

    /// Reads the store directly; the decision cache may lag behind a grant
    /// made moments earlier.
    async fn user_has_module_access(
        &self,
        user_id: &Uuid,
        module: &Module,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let direct = self
            .store
            .find_user_module_grant(user_id, &module.id)
            .await?
            .map_or(false, |g| g.is_effective(now));
        if direct {
            return Ok(true);
        }
        self.pools.has_module_access_via_pool(user_id, &module.code).await
    }

    /// The `read` permission implied by a mutating action on a CRUD module.
    async fn companion_read_permission(
        &self,
        module: &Module,
        permission: &ModulePermission,
    ) -> Result<Option<ModulePermission>, DomainError> {
        if !module.is_crud() || !actions::implies_read(&permission.code) {
            return Ok(None);
        }

        let read = self
            .store
            .find_module_permission_by_code(&module.id, actions::READ)
            .await?
            .filter(|p| p.is_available());
        if read.is_none() {
            warn!("CRUD module {} has no active read permission to pair with {}", module.code, permission.code);
        }
        Ok(read)
    }

    async fn invalidate_pool_members(&self, pool_id: &Uuid) -> Result<usize, DomainError> {
        let members = self.store.list_active_member_ids(pool_id).await?;
        self.cache.invalidate_many(&members);
        Ok(members.len())
    }
}

fn ensure_future(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<(), DomainError> {
    match expires_at {
        Some(at) if at <= now => Err(DomainError::ExpiryInPast),
        _ => Ok(()),
    }
}
