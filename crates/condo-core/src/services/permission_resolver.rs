// ============================================================================
// Condo Core - Permission Resolver
// File: crates/condo-core/src/services/permission_resolver.rs
// ============================================================================
//! Access decisions: super-admin bypass, module access, granular permission
//! and scope matching over direct and pool-inherited grants.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::DecisionCache;
use crate::domain::{
    EffectivePermission, PermissionContext, PermissionKey, PermissionScope, ResolvedAccess,
};
use crate::error::DomainError;
use crate::repositories::{AccessStore, ModuleRepository, UserAccountRepository, UserGrantRepository};
use super::access_checker::AccessChecker;
use super::pool_resolver::PoolResolver;
use super::scope_matcher;

pub struct PermissionResolver<S: AccessStore> {
    store: Arc<S>,
    pools: PoolResolver<S>,
    cache: Arc<DecisionCache>,
}

impl<S: AccessStore> PermissionResolver<S> {
    pub fn new(store: Arc<S>, cache: Arc<DecisionCache>) -> Self {
        Self {
            pools: PoolResolver::new(store.clone()),
            store,
            cache,
        }
    }

    /// Reads the privileged flag on the user record; unknown or disabled
    /// accounts are not privileged.
    pub async fn is_super_admin(&self, user_id: &Uuid) -> Result<bool, DomainError> {
        let user = self.store.find_user(user_id).await?;
        Ok(user.map_or(false, |u| u.is_active && u.is_super_admin))
    }

    /// The user's merged access set, served from the decision cache when fresh.
    pub async fn resolve(&self, user_id: &Uuid) -> Result<Arc<ResolvedAccess>, DomainError> {
        if let Some(access) = self.cache.get(user_id) {
            debug!("Decision cache hit for user {}", user_id);
            return Ok(access);
        }

        debug!("Decision cache miss for user {}, resolving from store", user_id);
        let ticket = self.cache.ticket(user_id);
        let now = Utc::now();
        let mut access = ResolvedAccess::default();

        // Direct grants first so they win identical (code, scope, scope_id) tuples
        for module in self.store.list_user_granted_modules(user_id, now).await? {
            access.add_module(module.code);
        }
        for permission in self.store.list_user_granted_permissions(user_id, now).await? {
            access.add_permission(permission);
        }

        for pool in self.pools.user_pools(user_id).await? {
            for module in self.pools.pool_modules(&pool.id).await? {
                access.add_module(module.code);
            }
            for permission in self.pools.pool_permissions(&pool.id).await? {
                access.add_permission(permission);
            }
        }

        let access = Arc::new(access);
        // Skipped when a grant change invalidated the user mid-resolution
        self.cache.set_if_current(*user_id, access.clone(), ticket);
        Ok(access)
    }

    pub async fn has_module_access(&self, user_id: &Uuid, module_code: &str) -> Result<bool, DomainError> {
        if self.is_super_admin(user_id).await? {
            return Ok(true);
        }

        let granted = self.resolve(user_id).await?.has_module(module_code);
        if !granted {
            debug!("User {} has no access to module {}", user_id, module_code);
        }
        Ok(granted)
    }

    /// Malformed keys are a denial, never an error.
    pub async fn has_permission(
        &self,
        user_id: &Uuid,
        permission_key: &str,
        context: Option<&PermissionContext>,
    ) -> Result<bool, DomainError> {
        if self.is_super_admin(user_id).await? {
            return Ok(true);
        }

        let key: PermissionKey = match permission_key.parse() {
            Ok(key) => key,
            Err(e) => {
                warn!("Permission check for user {} denied: {}", user_id, e);
                return Ok(false);
            }
        };

        let access = self.resolve(user_id).await?;
        if !access.has_module(&key.module) {
            debug!("User {} lacks module access for {}", user_id, key);
            return Ok(false);
        }

        // Every candidate is checked; source order must not cause false negatives
        let granted = access
            .candidates(&key)
            .iter()
            .any(|g| scope_matcher::matches(g.scope, g.scope_id.as_deref(), context));

        if !granted {
            debug!("User {} has no matching grant for {}", user_id, key);
        }
        Ok(granted)
    }

    /// Module codes reachable by the user; every active module for a super-admin.
    pub async fn user_module_codes(&self, user_id: &Uuid) -> Result<BTreeSet<String>, DomainError> {
        if self.is_super_admin(user_id).await? {
            let modules = self.store.list_active_modules().await?;
            return Ok(modules.into_iter().map(|m| m.code).collect());
        }

        let access = self.resolve(user_id).await?;
        Ok(access.module_codes.iter().cloned().collect())
    }

    /// Deduplicated permissions the user holds under one module.
    pub async fn user_module_permissions(
        &self,
        user_id: &Uuid,
        module_code: &str,
    ) -> Result<Vec<EffectivePermission>, DomainError> {
        if self.is_super_admin(user_id).await? {
            let module = match self.store.find_module_by_code(module_code).await? {
                Some(module) if module.is_available() => module,
                _ => return Ok(Vec::new()),
            };
            let permissions = self.store.list_module_permissions(&module.id).await?;
            return Ok(permissions
                .into_iter()
                .map(|p| EffectivePermission {
                    code: p.code,
                    scope: PermissionScope::All,
                    scope_id: None,
                })
                .collect());
        }

        let access = self.resolve(user_id).await?;
        if !access.has_module(module_code) {
            return Ok(Vec::new());
        }
        Ok(access.module_permissions(module_code))
    }
}

#[async_trait]
impl<S: AccessStore> AccessChecker for PermissionResolver<S> {
    async fn is_super_admin(&self, user_id: Uuid) -> Result<bool, DomainError> {
        PermissionResolver::is_super_admin(self, &user_id).await
    }

    async fn has_module_access(&self, user_id: Uuid, module_code: &str) -> Result<bool, DomainError> {
        PermissionResolver::has_module_access(self, &user_id, module_code).await
    }

    async fn has_permission(
        &self,
        user_id: Uuid,
        permission_key: &str,
        context: Option<PermissionContext>,
    ) -> Result<bool, DomainError> {
        PermissionResolver::has_permission(self, &user_id, permission_key, context.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::domain::UserModuleGrant;
    use crate::services::test_support::Fixture;

    #[tokio::test]
    async fn test_super_admin_bypasses_every_check() {
        let fx = Fixture::new();
        fx.crud_module("objetivos");

        for key in ["objetivos:create", "reportes:export", "inexistente:manage", "sin-formato"] {
            assert!(fx.resolver.has_permission(&fx.root, key, None).await.unwrap());
            let ctx = PermissionContext::for_tenant("condo-7");
            assert!(fx.resolver.has_permission(&fx.root, key, Some(&ctx)).await.unwrap());
        }
        assert!(fx.resolver.has_module_access(&fx.root, "objetivos").await.unwrap());
        assert!(fx.resolver.has_module_access(&fx.root, "no-existe").await.unwrap());
    }

    #[tokio::test]
    async fn test_super_admin_lists_all_active_modules() {
        let fx = Fixture::new();
        fx.crud_module("objetivos");
        fx.specialized_module("reportes", &["export"]);

        let codes = fx.resolver.user_module_codes(&fx.root).await.unwrap();
        assert_eq!(codes.into_iter().collect::<Vec<_>>(), vec!["objetivos", "reportes"]);

        let perms = fx.resolver.user_module_permissions(&fx.root, "objetivos").await.unwrap();
        assert_eq!(perms.len(), 4);
        assert!(perms.iter().all(|p| p.scope == PermissionScope::All));
    }

    #[tokio::test]
    async fn test_unknown_user_is_denied() {
        let fx = Fixture::new();
        fx.crud_module("objetivos");
        let ghost = Uuid::new_v4();

        assert!(!fx.resolver.is_super_admin(&ghost).await.unwrap());
        assert!(!fx.resolver.has_module_access(&ghost, "objetivos").await.unwrap());
        assert!(!fx.resolver.has_permission(&ghost, "objetivos:read", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_key_is_denied_without_error() {
        let fx = Fixture::new();
        let user = fx.user("residente@condo.test");
        for key in ["objetivos", "objetivos:create:extra", ":", ""] {
            assert!(!fx.resolver.has_permission(&user.id, key, None).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_permission_requires_module_access() {
        let fx = Fixture::new();
        let user = fx.user("residente@condo.test");
        let (module, perms) = fx.crud_module("objetivos");
        fx.admin.grant_module_access(fx.root, user.id, module.id, None).await.unwrap();
        fx.admin
            .grant_permission(fx.root, user.id, perms["read"].id, PermissionScope::All, None, None)
            .await
            .unwrap();
        assert!(fx.resolver.has_permission(&user.id, "objetivos:read", None).await.unwrap());

        // Deactivate the module itself: neither module access nor permissions survive
        let mut disabled = module.clone();
        disabled.deactivate(fx.root);
        fx.store.insert_module(disabled);
        fx.cache.clear();

        assert!(!fx.resolver.has_module_access(&user.id, "objetivos").await.unwrap());
        assert!(!fx.resolver.has_permission(&user.id, "objetivos:read", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_direct_grant_is_ignored() {
        let fx = Fixture::new();
        let user = fx.user("temporal@condo.test");
        let (module, _) = fx.crud_module("objetivos");

        let expired = UserModuleGrant::new(
            user.id,
            module.id,
            fx.root,
            Some(Utc::now() - Duration::minutes(5)),
        );
        fx.store.save_user_module_grant(&expired).await.unwrap();

        assert!(!fx.resolver.has_module_access(&user.id, "objetivos").await.unwrap());
        assert!(fx.resolver.user_module_codes(&user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scenario_a_auto_granted_read() {
        let fx = Fixture::new();
        let user = fx.user("u@condo.test");
        let (module, perms) = fx.crud_module("objetivos");
        fx.admin.grant_module_access(fx.root, user.id, module.id, None).await.unwrap();
        fx.admin
            .grant_permission(fx.root, user.id, perms["create"].id, PermissionScope::All, None, None)
            .await
            .unwrap();

        assert!(fx.resolver.has_permission(&user.id, "objetivos:create", None).await.unwrap());
        assert!(fx.resolver.has_permission(&user.id, "objetivos:read", None).await.unwrap());
        assert!(!fx.resolver.has_permission(&user.id, "objetivos:delete", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_scenario_b_pool_tenant_scope() {
        let fx = Fixture::new();
        let user = fx.user("u@condo.test");
        let (module, perms) = fx.specialized_module("reportes", &["export"]);
        let pool = fx.pool("Administradores").await;
        fx.admin.add_pool_member(fx.root, pool.id, user.id).await.unwrap();
        fx.admin.grant_pool_module_access(fx.root, pool.id, module.id).await.unwrap();
        fx.admin
            .grant_pool_permission(
                fx.root,
                pool.id,
                perms["export"].id,
                PermissionScope::Tenant,
                Some("condo-1".to_string()),
            )
            .await
            .unwrap();

        assert!(fx.resolver.has_module_access(&user.id, "reportes").await.unwrap());
        let same = PermissionContext::for_tenant("condo-1");
        let other = PermissionContext::for_tenant("condo-2");
        assert!(fx.resolver.has_permission(&user.id, "reportes:export", Some(&same)).await.unwrap());
        assert!(!fx.resolver.has_permission(&user.id, "reportes:export", Some(&other)).await.unwrap());
    }

    #[tokio::test]
    async fn test_direct_and_pool_scopes_are_both_candidates() {
        let fx = Fixture::new();
        let user = fx.user("u@condo.test");
        let (module, perms) = fx.specialized_module("reportes", &["export"]);
        fx.admin.grant_module_access(fx.root, user.id, module.id, None).await.unwrap();
        fx.admin
            .grant_permission(
                fx.root,
                user.id,
                perms["export"].id,
                PermissionScope::Tenant,
                Some("condo-1".to_string()),
                None,
            )
            .await
            .unwrap();

        let pool = fx.pool("Contadores").await;
        fx.admin.add_pool_member(fx.root, pool.id, user.id).await.unwrap();
        fx.admin.grant_pool_module_access(fx.root, pool.id, module.id).await.unwrap();
        fx.admin
            .grant_pool_permission(
                fx.root,
                pool.id,
                perms["export"].id,
                PermissionScope::Tenant,
                Some("condo-2".to_string()),
            )
            .await
            .unwrap();

        for tenant in ["condo-1", "condo-2"] {
            let ctx = PermissionContext::for_tenant(tenant);
            assert!(fx.resolver.has_permission(&user.id, "reportes:export", Some(&ctx)).await.unwrap());
        }
        let ctx = PermissionContext::for_tenant("condo-3");
        assert!(!fx.resolver.has_permission(&user.id, "reportes:export", Some(&ctx)).await.unwrap());

        let listed = fx.resolver.user_module_permissions(&user.id, "reportes").await.unwrap();
        let scope_ids: Vec<_> = listed.iter().map(|p| p.scope_id.as_deref()).collect();
        assert_eq!(scope_ids, vec![Some("condo-1"), Some("condo-2")]);
    }

    #[tokio::test]
    async fn test_identical_direct_and_pool_grant_listed_once() {
        let fx = Fixture::new();
        let user = fx.user("u@condo.test");
        let (module, perms) = fx.specialized_module("reportes", &["export"]);
        fx.admin.grant_module_access(fx.root, user.id, module.id, None).await.unwrap();
        fx.admin
            .grant_permission(fx.root, user.id, perms["export"].id, PermissionScope::All, None, None)
            .await
            .unwrap();
        let pool = fx.pool("Directiva").await;
        fx.admin.add_pool_member(fx.root, pool.id, user.id).await.unwrap();
        fx.admin.grant_pool_module_access(fx.root, pool.id, module.id).await.unwrap();
        fx.admin
            .grant_pool_permission(fx.root, pool.id, perms["export"].id, PermissionScope::All, None)
            .await
            .unwrap();

        let listed = fx.resolver.user_module_permissions(&user.id, "reportes").await.unwrap();
        assert_eq!(listed.len(), 1);
        let codes = fx.resolver.user_module_codes(&user.id).await.unwrap();
        assert_eq!(codes.len(), 1);
    }

    #[tokio::test]
    async fn test_resolution_is_cached_until_invalidated() {
        let fx = Fixture::new();
        let user = fx.user("u@condo.test");
        let (module, _) = fx.crud_module("objetivos");

        assert!(!fx.resolver.has_module_access(&user.id, "objetivos").await.unwrap());
        assert!(fx.cache.get(&user.id).is_some());

        // A write that bypasses the administrator is invisible until the entry goes away
        let grant = UserModuleGrant::new(user.id, module.id, fx.root, None);
        fx.store.save_user_module_grant(&grant).await.unwrap();
        assert!(!fx.resolver.has_module_access(&user.id, "objetivos").await.unwrap());

        fx.cache.invalidate(&user.id);
        assert!(fx.resolver.has_module_access(&user.id, "objetivos").await.unwrap());
    }
}
