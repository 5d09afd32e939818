//! # Condo Shared
//! 
//! Shared configuration, constants, types, and telemetry for the condo platform.

pub mod constants;
pub mod types;
pub mod telemetry;
pub mod config;
pub mod error;

pub use types::*;
pub use error::AppError;
