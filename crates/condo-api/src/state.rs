use std::sync::Arc;

use condo_core::cache::DecisionCache;
use condo_core::repositories::AccessStore;
use condo_core::services::{AccessChecker, GrantAdministrator, PermissionResolver};
use condo_security::JwtService;

/// Shared handler state. The guard only sees the `AccessChecker` seam.
pub struct AppState<S: AccessStore> {
    pub resolver: Arc<PermissionResolver<S>>,
    pub admin: Arc<GrantAdministrator<S>>,
    pub checker: Arc<dyn AccessChecker>,
    pub cache: Arc<DecisionCache>,
    pub jwt: Arc<JwtService>,
}

impl<S: AccessStore> AppState<S> {
    pub fn new(store: Arc<S>, cache: Arc<DecisionCache>, jwt: Arc<JwtService>) -> Self {
        let resolver = Arc::new(PermissionResolver::new(store.clone(), cache.clone()));
        Self {
            checker: resolver.clone(),
            admin: Arc::new(GrantAdministrator::new(store, cache.clone())),
            resolver,
            cache,
            jwt,
        }
    }
}

impl<S: AccessStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            admin: self.admin.clone(),
            checker: self.checker.clone(),
            cache: self.cache.clone(),
            jwt: self.jwt.clone(),
        }
    }
}
