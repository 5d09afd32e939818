//! Application-wide constants

pub const DEFAULT_CACHE_TTL_MS: u64 = 300_000;
pub const DEFAULT_CACHE_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 900;
pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const MAX_GUARDED_BODY_BYTES: usize = 1024 * 1024;
