// lib/src/config/config_defaults.rs

use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/pronto.yaml";
pub const DEFAULT_DATA_DIRECTORY: &str = "./data/pronto";
pub const DEFAULT_REST_API_PORT: u16 = 8082;
pub const DEFAULT_SESSION_SECRET: &str = "change-me-in-production";

pub fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_port() -> u16 {
    DEFAULT_REST_API_PORT
}

pub fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

pub fn default_data_directory() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIRECTORY)
}

pub fn default_cache_capacity() -> u64 {
    256 * 1024 * 1024
}

pub fn default_flush_every_ms() -> Option<u64> {
    Some(500)
}

pub fn default_session_secret() -> String {
    DEFAULT_SESSION_SECRET.to_string()
}

pub fn default_session_ttl_hours() -> i64 {
    12
}

/// One year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

pub fn default_secure_cookies() -> bool {
    false
}

pub fn default_triage_timeout_secs() -> u64 {
    10
}
