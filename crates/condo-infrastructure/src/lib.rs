//! # Condo Infrastructure
//! 
//! PostgreSQL adapters for the access-control ports.

pub mod database;

pub use database::{create_pool, run_migrations, PgAccessStore};
