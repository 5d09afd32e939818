//! Request middleware: bearer authentication and the access guard

pub mod auth;
pub mod guard;

pub use auth::{require_auth, AuthenticatedUser};
pub use guard::{enforce, AccessGuard, AccessRequirement, GuardDecision, OwnershipFilter};
