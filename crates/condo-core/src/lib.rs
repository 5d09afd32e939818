//! # Condo Core
//! 
//! Access-control kernel of the condo platform: domain entities, repository
//! ports, the permission resolution services, and the decision cache.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod cache;
pub mod error;

// Re-export domain entities
pub use domain::*;
pub use error::{DomainError, ErrorKind};
