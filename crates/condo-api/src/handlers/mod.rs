//! HTTP handlers

pub mod access;
pub mod health;
pub mod me;
pub mod pools;
