//! # Condo Core - Domain Module
//! 
//! Entities of the access-control data model.

pub mod module;
pub mod module_permission;
pub mod user_account;
pub mod scope;
pub mod permission_key;
pub mod user_module_grant;
pub mod user_permission_grant;
pub mod pool;
pub mod pool_grant;
pub mod access;

// Re-export all entities and enums
pub use module::{Module, ModuleType};
pub use module_permission::{actions, ModulePermission};
pub use user_account::UserAccount;
pub use scope::{PermissionContext, PermissionScope};
pub use permission_key::PermissionKey;
pub use user_module_grant::UserModuleGrant;
pub use user_permission_grant::UserPermissionGrant;
pub use pool::{Pool, PoolMember};
pub use pool_grant::{PoolModuleGrant, PoolPermissionGrant};
pub use access::{EffectivePermission, GrantSource, ResolvedAccess, ScopeGrant, ScopedPermission};
