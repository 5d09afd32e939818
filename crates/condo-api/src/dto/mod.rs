//! Request and response payloads

pub mod access;

pub use access::*;
