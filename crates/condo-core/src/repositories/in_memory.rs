// ============================================================================
// Condo Core - In-Memory Access Store
// File: crates/condo-core/src/repositories/in_memory.rs
// Description: Single-process adapter for every access-control port. Backs
//              the `memory` storage mode and the test suites.
// ============================================================================

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::{
    GrantSource, Module, ModulePermission, PermissionScope, Pool, PoolMember, PoolModuleGrant,
    PoolPermissionGrant, ScopedPermission, UserAccount, UserModuleGrant, UserPermissionGrant,
};
use crate::error::DomainError;
use super::{ModuleRepository, PoolRepository, UserAccountRepository, UserGrantRepository};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserAccount>,
    modules: HashMap<Uuid, Module>,
    module_permissions: HashMap<Uuid, ModulePermission>,
    user_module_grants: HashMap<Uuid, UserModuleGrant>,
    user_permission_grants: HashMap<Uuid, UserPermissionGrant>,
    pools: HashMap<Uuid, Pool>,
    pool_members: HashMap<Uuid, PoolMember>,
    pool_module_grants: HashMap<Uuid, PoolModuleGrant>,
    pool_permission_grants: HashMap<Uuid, PoolPermissionGrant>,
}

impl Tables {
    /// Join a permission id with its module when both are available.
    fn available_permission(&self, module_permission_id: &Uuid) -> Option<(&Module, &ModulePermission)> {
        let permission = self
            .module_permissions
            .get(module_permission_id)
            .filter(|p| p.is_available())?;
        let module = self
            .modules
            .get(&permission.module_id)
            .filter(|m| m.is_available())?;
        Some((module, permission))
    }

    fn permission_module_id(&self, module_permission_id: &Uuid) -> Option<Uuid> {
        self.module_permissions
            .get(module_permission_id)
            .map(|p| p.module_id)
    }
}

/// Every table lives behind one lock, so each port call is atomic.
#[derive(Default)]
pub struct InMemoryAccessStore {
    tables: RwLock<Tables>,
}

impl InMemoryAccessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: UserAccount) -> UserAccount {
        self.tables.write().users.insert(user.id, user.clone());
        user
    }

    pub fn insert_module(&self, module: Module) -> Module {
        self.tables.write().modules.insert(module.id, module.clone());
        module
    }

    pub fn insert_module_permission(&self, permission: ModulePermission) -> ModulePermission {
        self.tables
            .write()
            .module_permissions
            .insert(permission.id, permission.clone());
        permission
    }

    /// Insert or replace a pool row directly, bypassing the name check.
    pub fn insert_pool(&self, pool: Pool) -> Pool {
        self.tables.write().pools.insert(pool.id, pool.clone());
        pool
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<UserAccount> {
        let email = email.trim().to_lowercase();
        self.tables
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
    }
}

fn duplicate(what: &str) -> DomainError {
    DomainError::DatabaseError(format!("duplicate key value violates unique constraint on {}", what))
}

#[async_trait]
impl UserAccountRepository for InMemoryAccessStore {
    async fn find_user(&self, id: &Uuid) -> Result<Option<UserAccount>, DomainError> {
        Ok(self
            .tables
            .read()
            .users
            .get(id)
            .filter(|u| !u.is_deleted())
            .cloned())
    }
}

#[async_trait]
impl ModuleRepository for InMemoryAccessStore {
    async fn find_module(&self, id: &Uuid) -> Result<Option<Module>, DomainError> {
        Ok(self
            .tables
            .read()
            .modules
            .get(id)
            .filter(|m| !m.is_deleted())
            .cloned())
    }

    async fn find_module_by_code(&self, code: &str) -> Result<Option<Module>, DomainError> {
        Ok(self
            .tables
            .read()
            .modules
            .values()
            .find(|m| m.code == code && !m.is_deleted())
            .cloned())
    }

    async fn list_active_modules(&self) -> Result<Vec<Module>, DomainError> {
        let mut modules: Vec<Module> = self
            .tables
            .read()
            .modules
            .values()
            .filter(|m| m.is_available())
            .cloned()
            .collect();
        modules.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(modules)
    }

    async fn find_module_permission(&self, id: &Uuid) -> Result<Option<ModulePermission>, DomainError> {
        Ok(self
            .tables
            .read()
            .module_permissions
            .get(id)
            .filter(|p| p.removed_at.is_none())
            .cloned())
    }

    async fn find_module_permission_by_code(
        &self,
        module_id: &Uuid,
        code: &str,
    ) -> Result<Option<ModulePermission>, DomainError> {
        Ok(self
            .tables
            .read()
            .module_permissions
            .values()
            .find(|p| p.module_id == *module_id && p.code == code && p.removed_at.is_none())
            .cloned())
    }

    async fn list_module_permissions(&self, module_id: &Uuid) -> Result<Vec<ModulePermission>, DomainError> {
        let mut permissions: Vec<ModulePermission> = self
            .tables
            .read()
            .module_permissions
            .values()
            .filter(|p| p.module_id == *module_id && p.is_available())
            .cloned()
            .collect();
        permissions.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(permissions)
    }
}

#[async_trait]
impl UserGrantRepository for InMemoryAccessStore {
    async fn list_user_granted_modules(
        &self,
        user_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Module>, DomainError> {
        let tables = self.tables.read();
        Ok(tables
            .user_module_grants
            .values()
            .filter(|g| g.user_id == *user_id && g.is_effective(now))
            .filter_map(|g| tables.modules.get(&g.module_id))
            .filter(|m| m.is_available())
            .cloned()
            .collect())
    }

    async fn list_user_granted_permissions(
        &self,
        user_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScopedPermission>, DomainError> {
        let tables = self.tables.read();
        Ok(tables
            .user_permission_grants
            .values()
            .filter(|g| g.user_id == *user_id && g.is_effective(now))
            .filter_map(|g| {
                let (module, permission) = tables.available_permission(&g.module_permission_id)?;
                Some(ScopedPermission {
                    module_code: module.code.clone(),
                    code: permission.code.clone(),
                    scope: g.scope,
                    scope_id: g.scope_id.clone(),
                    source: GrantSource::Direct,
                })
            })
            .collect())
    }

    async fn find_user_module_grant(
        &self,
        user_id: &Uuid,
        module_id: &Uuid,
    ) -> Result<Option<UserModuleGrant>, DomainError> {
        Ok(self
            .tables
            .read()
            .user_module_grants
            .values()
            .find(|g| g.user_id == *user_id && g.module_id == *module_id)
            .cloned())
    }

    async fn find_user_permission_grant(
        &self,
        user_id: &Uuid,
        module_permission_id: &Uuid,
        scope: PermissionScope,
        scope_id: Option<&str>,
    ) -> Result<Option<UserPermissionGrant>, DomainError> {
        Ok(self
            .tables
            .read()
            .user_permission_grants
            .values()
            .find(|g| {
                g.user_id == *user_id
                    && g.module_permission_id == *module_permission_id
                    && g.targets(scope, scope_id)
            })
            .cloned())
    }

    async fn find_user_permission_grant_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<UserPermissionGrant>, DomainError> {
        Ok(self.tables.read().user_permission_grants.get(id).cloned())
    }

    async fn save_user_module_grant(
        &self,
        grant: &UserModuleGrant,
    ) -> Result<UserModuleGrant, DomainError> {
        let mut tables = self.tables.write();
        let clash = tables.user_module_grants.values().any(|g| {
            g.id != grant.id && g.user_id == grant.user_id && g.module_id == grant.module_id
        });
        if clash {
            return Err(duplicate("user_module_grants(user_id, module_id)"));
        }
        tables.user_module_grants.insert(grant.id, grant.clone());
        Ok(grant.clone())
    }

    async fn save_user_permission_grants(
        &self,
        grants: &[UserPermissionGrant],
    ) -> Result<Vec<UserPermissionGrant>, DomainError> {
        let mut tables = self.tables.write();
        for grant in grants {
            let clash = tables.user_permission_grants.values().any(|g| {
                g.id != grant.id
                    && g.user_id == grant.user_id
                    && g.module_permission_id == grant.module_permission_id
                    && g.targets(grant.scope, grant.scope_id.as_deref())
            });
            if clash {
                return Err(duplicate("user_permission_grants(user_id, module_permission_id, scope, scope_id)"));
            }
        }
        for grant in grants {
            tables.user_permission_grants.insert(grant.id, grant.clone());
        }
        Ok(grants.to_vec())
    }

    async fn revoke_user_module_grant(&self, grant: &UserModuleGrant) -> Result<u64, DomainError> {
        let mut tables = self.tables.write();
        if !tables.user_module_grants.contains_key(&grant.id) {
            return Err(DomainError::GrantNotFound(grant.id.to_string()));
        }
        let revoked_by = grant.modified_by.unwrap_or(grant.granted_by);
        let cascaded: Vec<Uuid> = tables
            .user_permission_grants
            .values()
            .filter(|g| {
                g.user_id == grant.user_id
                    && g.is_active
                    && tables.permission_module_id(&g.module_permission_id) == Some(grant.module_id)
            })
            .map(|g| g.id)
            .collect();
        for id in &cascaded {
            if let Some(g) = tables.user_permission_grants.get_mut(id) {
                g.deactivate(revoked_by);
            }
        }
        tables.user_module_grants.insert(grant.id, grant.clone());
        Ok(cascaded.len() as u64)
    }
}

#[async_trait]
impl PoolRepository for InMemoryAccessStore {
    async fn find_pool(&self, id: &Uuid) -> Result<Option<Pool>, DomainError> {
        Ok(self
            .tables
            .read()
            .pools
            .get(id)
            .filter(|p| p.removed_at.is_none())
            .cloned())
    }

    async fn create_pool(&self, pool: &Pool) -> Result<Pool, DomainError> {
        let mut tables = self.tables.write();
        let clash = tables
            .pools
            .values()
            .any(|p| p.removed_at.is_none() && p.name.eq_ignore_ascii_case(&pool.name));
        if clash {
            return Err(DomainError::PoolNameAlreadyExists(pool.name.clone()));
        }
        tables.pools.insert(pool.id, pool.clone());
        Ok(pool.clone())
    }

    async fn list_user_pools(&self, user_id: &Uuid) -> Result<Vec<Pool>, DomainError> {
        let tables = self.tables.read();
        Ok(tables
            .pool_members
            .values()
            .filter(|m| m.user_id == *user_id && m.is_active)
            .filter_map(|m| tables.pools.get(&m.pool_id))
            .filter(|p| p.is_available())
            .cloned()
            .collect())
    }

    async fn find_pool_member(
        &self,
        pool_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<PoolMember>, DomainError> {
        Ok(self
            .tables
            .read()
            .pool_members
            .values()
            .find(|m| m.pool_id == *pool_id && m.user_id == *user_id)
            .cloned())
    }

    async fn save_pool_member(&self, member: &PoolMember) -> Result<PoolMember, DomainError> {
        let mut tables = self.tables.write();
        let clash = tables.pool_members.values().any(|m| {
            m.id != member.id && m.pool_id == member.pool_id && m.user_id == member.user_id
        });
        if clash {
            return Err(duplicate("pool_members(pool_id, user_id)"));
        }
        tables.pool_members.insert(member.id, member.clone());
        Ok(member.clone())
    }

    async fn list_active_member_ids(&self, pool_id: &Uuid) -> Result<Vec<Uuid>, DomainError> {
        Ok(self
            .tables
            .read()
            .pool_members
            .values()
            .filter(|m| m.pool_id == *pool_id && m.is_active)
            .map(|m| m.user_id)
            .collect())
    }

    async fn list_pool_modules(&self, pool_id: &Uuid) -> Result<Vec<Module>, DomainError> {
        let tables = self.tables.read();
        Ok(tables
            .pool_module_grants
            .values()
            .filter(|g| g.pool_id == *pool_id && g.is_active)
            .filter_map(|g| tables.modules.get(&g.module_id))
            .filter(|m| m.is_available())
            .cloned()
            .collect())
    }

    async fn list_pool_permissions(&self, pool_id: &Uuid) -> Result<Vec<ScopedPermission>, DomainError> {
        let tables = self.tables.read();
        Ok(tables
            .pool_permission_grants
            .values()
            .filter(|g| g.pool_id == *pool_id && g.is_active)
            .filter_map(|g| {
                let (module, permission) = tables.available_permission(&g.module_permission_id)?;
                Some(ScopedPermission {
                    module_code: module.code.clone(),
                    code: permission.code.clone(),
                    scope: g.scope,
                    scope_id: g.scope_id.clone(),
                    source: GrantSource::Pool(g.pool_id),
                })
            })
            .collect())
    }

    async fn find_pool_module_grant(
        &self,
        pool_id: &Uuid,
        module_id: &Uuid,
    ) -> Result<Option<PoolModuleGrant>, DomainError> {
        Ok(self
            .tables
            .read()
            .pool_module_grants
            .values()
            .find(|g| g.pool_id == *pool_id && g.module_id == *module_id)
            .cloned())
    }

    async fn find_pool_permission_grant(
        &self,
        pool_id: &Uuid,
        module_permission_id: &Uuid,
        scope: PermissionScope,
        scope_id: Option<&str>,
    ) -> Result<Option<PoolPermissionGrant>, DomainError> {
        Ok(self
            .tables
            .read()
            .pool_permission_grants
            .values()
            .find(|g| {
                g.pool_id == *pool_id
                    && g.module_permission_id == *module_permission_id
                    && g.targets(scope, scope_id)
            })
            .cloned())
    }

    async fn find_pool_permission_grant_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<PoolPermissionGrant>, DomainError> {
        Ok(self.tables.read().pool_permission_grants.get(id).cloned())
    }

    async fn save_pool_module_grant(
        &self,
        grant: &PoolModuleGrant,
    ) -> Result<PoolModuleGrant, DomainError> {
        let mut tables = self.tables.write();
        let clash = tables.pool_module_grants.values().any(|g| {
            g.id != grant.id && g.pool_id == grant.pool_id && g.module_id == grant.module_id
        });
        if clash {
            return Err(duplicate("pool_module_grants(pool_id, module_id)"));
        }
        tables.pool_module_grants.insert(grant.id, grant.clone());
        Ok(grant.clone())
    }

    async fn save_pool_permission_grants(
        &self,
        grants: &[PoolPermissionGrant],
    ) -> Result<Vec<PoolPermissionGrant>, DomainError> {
        let mut tables = self.tables.write();
        for grant in grants {
            let clash = tables.pool_permission_grants.values().any(|g| {
                g.id != grant.id
                    && g.pool_id == grant.pool_id
                    && g.module_permission_id == grant.module_permission_id
                    && g.targets(grant.scope, grant.scope_id.as_deref())
            });
            if clash {
                return Err(duplicate("pool_permission_grants(pool_id, module_permission_id, scope, scope_id)"));
            }
        }
        for grant in grants {
            tables.pool_permission_grants.insert(grant.id, grant.clone());
        }
        Ok(grants.to_vec())
    }

    async fn revoke_pool_module_grant(&self, grant: &PoolModuleGrant) -> Result<u64, DomainError> {
        let mut tables = self.tables.write();
        if !tables.pool_module_grants.contains_key(&grant.id) {
            return Err(DomainError::GrantNotFound(grant.id.to_string()));
        }
        let revoked_by = grant.modified_by.unwrap_or(grant.granted_by);
        let cascaded: Vec<Uuid> = tables
            .pool_permission_grants
            .values()
            .filter(|g| {
                g.pool_id == grant.pool_id
                    && g.is_active
                    && tables.permission_module_id(&g.module_permission_id) == Some(grant.module_id)
            })
            .map(|g| g.id)
            .collect();
        for id in &cascaded {
            if let Some(g) = tables.pool_permission_grants.get_mut(id) {
                g.deactivate(revoked_by);
            }
        }
        tables.pool_module_grants.insert(grant.id, grant.clone());
        Ok(cascaded.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModuleType;

    #[tokio::test]
    async fn test_duplicate_module_grant_rejected() {
        let store = InMemoryAccessStore::new();
        let user_id = Uuid::new_v4();
        let module_id = Uuid::new_v4();
        let admin = Uuid::new_v4();

        store
            .save_user_module_grant(&UserModuleGrant::new(user_id, module_id, admin, None))
            .await
            .unwrap();
        let second = store
            .save_user_module_grant(&UserModuleGrant::new(user_id, module_id, admin, None))
            .await;
        assert!(matches!(second, Err(DomainError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_batch_save_is_all_or_nothing() {
        let store = InMemoryAccessStore::new();
        let user_id = Uuid::new_v4();
        let permission_id = Uuid::new_v4();
        let admin = Uuid::new_v4();

        let existing = UserPermissionGrant::new(user_id, permission_id, PermissionScope::All, None, admin, None);
        store.save_user_permission_grants(&[existing]).await.unwrap();

        let fresh = UserPermissionGrant::new(user_id, Uuid::new_v4(), PermissionScope::All, None, admin, None);
        let clashing = UserPermissionGrant::new(user_id, permission_id, PermissionScope::All, None, admin, None);
        let result = store
            .save_user_permission_grants(&[fresh.clone(), clashing])
            .await;
        assert!(result.is_err());
        assert!(store
            .find_user_permission_grant_by_id(&fresh.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_inactive_module_hidden_from_granted_modules() {
        let store = InMemoryAccessStore::new();
        let admin = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let mut module = store.insert_module(
            Module::new("objetivos".to_string(), "Objetivos".to_string(), None, ModuleType::Crud, None).unwrap(),
        );
        store
            .save_user_module_grant(&UserModuleGrant::new(user_id, module.id, admin, None))
            .await
            .unwrap();
        assert_eq!(store.list_user_granted_modules(&user_id, Utc::now()).await.unwrap().len(), 1);

        module.deactivate(admin);
        store.insert_module(module);
        assert!(store.list_user_granted_modules(&user_id, Utc::now()).await.unwrap().is_empty());
    }
}
