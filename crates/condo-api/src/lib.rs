//! # Condo API
//! 
//! HTTP surface of the access-control engine: bearer authentication, the
//! enforcement guard, administrative grant routes and self-inspection.

pub mod handlers;
pub mod middleware;
pub mod dto;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
