//! # Condo Security
//! 
//! Bearer token issuing and validation for the access-control API.

pub mod jwt;

pub use jwt::{Claims, JwtError, JwtService};
