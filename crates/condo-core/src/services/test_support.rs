//! Shared fixture for the service tests

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::cache::DecisionCache;
use crate::domain::{Module, ModulePermission, ModuleType, Pool, UserAccount};
use crate::repositories::in_memory::InMemoryAccessStore;
use super::{GrantAdministrator, PermissionResolver};

pub(crate) struct Fixture {
    pub store: Arc<InMemoryAccessStore>,
    pub cache: Arc<DecisionCache>,
    pub resolver: PermissionResolver<InMemoryAccessStore>,
    pub admin: GrantAdministrator<InMemoryAccessStore>,
    /// Seeded super-admin, used as the granting admin
    pub root: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryAccessStore::new());
        let cache = Arc::new(DecisionCache::default());
        let root = store
            .insert_user(UserAccount::new_super_admin("root@condo.test".to_string(), "Root".to_string()).unwrap())
            .id;

        Self {
            resolver: PermissionResolver::new(store.clone(), cache.clone()),
            admin: GrantAdministrator::new(store.clone(), cache.clone()),
            store,
            cache,
            root,
        }
    }

    pub fn user(&self, email: &str) -> UserAccount {
        self.store
            .insert_user(UserAccount::new(email.to_string(), "Vecino".to_string()).unwrap())
    }

    pub fn crud_module(&self, code: &str) -> (Module, HashMap<String, ModulePermission>) {
        self.module(code, ModuleType::Crud, &["create", "read", "update", "delete"])
    }

    pub fn specialized_module(&self, code: &str, codes: &[&str]) -> (Module, HashMap<String, ModulePermission>) {
        self.module(code, ModuleType::Specialized, codes)
    }

    fn module(
        &self,
        code: &str,
        module_type: ModuleType,
        codes: &[&str],
    ) -> (Module, HashMap<String, ModulePermission>) {
        let module = self.store.insert_module(
            Module::new(code.to_string(), code.to_uppercase(), None, module_type, Some(self.root)).unwrap(),
        );
        let permissions = codes
            .iter()
            .map(|c| {
                let permission = ModulePermission::new(
                    module.id,
                    c.to_string(),
                    format!("{} {}", c, code),
                    None,
                    Some(self.root),
                )
                .unwrap();
                (c.to_string(), self.store.insert_module_permission(permission))
            })
            .collect();
        (module, permissions)
    }

    pub async fn pool(&self, name: &str) -> Pool {
        self.admin
            .create_pool(self.root, name.to_string(), None)
            .await
            .unwrap()
    }

    /// Overwrites a pool row and drops cached decisions built on the old one.
    pub fn replace_pool(&self, pool: Pool) {
        self.store.insert_pool(pool);
        self.cache.clear();
    }
}
