//! Domain errors

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Module permission not found: {0}")]
    ModulePermissionNotFound(Uuid),

    #[error("Pool not found: {0}")]
    PoolNotFound(Uuid),

    #[error("Pool member not found: user {user_id} in pool {pool_id}")]
    PoolMemberNotFound { pool_id: Uuid, user_id: Uuid },

    #[error("Grant not found: {0}")]
    GrantNotFound(String),

    #[error("Module not active: {0}")]
    ModuleNotActive(String),

    #[error("Pool not active: {0}")]
    PoolNotActive(Uuid),

    #[error("Already granted: {0}")]
    AlreadyGranted(String),

    #[error("Pool name already exists: {0}")]
    PoolNameAlreadyExists(String),

    #[error("Module access required before granting permissions on module {0}")]
    ModuleAccessRequired(String),

    #[error("TENANT scope requires a scope id")]
    TenantScopeIdRequired,

    #[error("Scope {0} does not take a scope id")]
    ScopeIdNotAllowed(String),

    #[error("Expiry must be in the future")]
    ExpiryInPast,

    #[error("Malformed permission key: {0}")]
    MalformedPermissionKey(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Coarse classification used by the boundary layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    PreconditionFailed,
    BadRequest,
    Internal,
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::UserNotFound(_)
            | DomainError::ModuleNotFound(_)
            | DomainError::ModulePermissionNotFound(_)
            | DomainError::PoolNotFound(_)
            | DomainError::PoolMemberNotFound { .. }
            | DomainError::GrantNotFound(_) => ErrorKind::NotFound,
            DomainError::AlreadyGranted(_) | DomainError::PoolNameAlreadyExists(_) => {
                ErrorKind::Conflict
            }
            DomainError::ModuleAccessRequired(_)
            | DomainError::ModuleNotActive(_)
            | DomainError::PoolNotActive(_) => ErrorKind::PreconditionFailed,
            DomainError::TenantScopeIdRequired
            | DomainError::ScopeIdNotAllowed(_)
            | DomainError::ExpiryInPast
            | DomainError::MalformedPermissionKey(_)
            | DomainError::ValidationError(_) => ErrorKind::BadRequest,
            DomainError::DatabaseError(_) | DomainError::InternalError(_) => ErrorKind::Internal,
        }
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::ValidationError(errors.to_string())
    }
}
