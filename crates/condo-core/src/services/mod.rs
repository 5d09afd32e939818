//! Access-control services

pub mod scope_matcher;
pub mod pool_resolver;
pub mod permission_resolver;
pub mod grant_administrator;
pub mod access_checker;

pub use pool_resolver::PoolResolver;
pub use permission_resolver::PermissionResolver;
pub use grant_administrator::{GrantAdministrator, PermissionGrantOutcome, PoolPermissionGrantOutcome};
pub use access_checker::AccessChecker;

#[cfg(test)]
pub(crate) mod test_support;
