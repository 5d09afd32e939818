//! Resolved access read models

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permission_key::PermissionKey;
use super::scope::PermissionScope;

/// Where a grant comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pool_id", rename_all = "lowercase")]
pub enum GrantSource {
    Direct,
    Pool(Uuid),
}

/// An effective (active, unexpired) granular grant joined with its module
/// and action codes. Returned by the store read models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedPermission {
    pub module_code: String,
    pub code: String,
    pub scope: PermissionScope,
    pub scope_id: Option<String>,
    pub source: GrantSource,
}

impl ScopedPermission {
    pub fn key(&self) -> PermissionKey {
        PermissionKey::new(self.module_code.clone(), self.code.clone())
    }
}

/// One scope candidate for a permission key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeGrant {
    pub scope: PermissionScope,
    pub scope_id: Option<String>,
    pub source: GrantSource,
}

/// Public view of a module permission held by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermission {
    pub code: String,
    pub scope: PermissionScope,
    pub scope_id: Option<String>,
}

/// Everything a user can reach, merged from direct and pool grants.
/// This is the payload held by the decision cache.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAccess {
    pub module_codes: HashSet<String>,
    pub permissions: HashMap<PermissionKey, Vec<ScopeGrant>>,
}

impl ResolvedAccess {
    pub fn add_module(&mut self, code: impl Into<String>) {
        self.module_codes.insert(code.into());
    }

    /// Keeps the first grant seen for an identical (scope, scope_id), so
    /// direct grants must be added before pool grants to take precedence.
    pub fn add_permission(&mut self, permission: ScopedPermission) {
        let key = permission.key();
        let candidates = self.permissions.entry(key).or_default();
        let duplicate = candidates
            .iter()
            .any(|c| c.scope == permission.scope && c.scope_id == permission.scope_id);
        if !duplicate {
            candidates.push(ScopeGrant {
                scope: permission.scope,
                scope_id: permission.scope_id,
                source: permission.source,
            });
        }
    }

    pub fn has_module(&self, module_code: &str) -> bool {
        self.module_codes.contains(module_code)
    }

    pub fn candidates(&self, key: &PermissionKey) -> &[ScopeGrant] {
        self.permissions.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Permissions under one module, ordered by code then scope.
    pub fn module_permissions(&self, module_code: &str) -> Vec<EffectivePermission> {
        let mut result: Vec<EffectivePermission> = self
            .permissions
            .iter()
            .filter(|(key, _)| key.module == module_code)
            .flat_map(|(key, grants)| {
                grants.iter().map(move |g| EffectivePermission {
                    code: key.action.clone(),
                    scope: g.scope,
                    scope_id: g.scope_id.clone(),
                })
            })
            .collect();
        result.sort_by(|a, b| {
            a.code
                .cmp(&b.code)
                .then(a.scope.cmp(&b.scope))
                .then(a.scope_id.cmp(&b.scope_id))
        });
        result
    }
}
