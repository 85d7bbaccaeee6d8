// lib/src/config/config_structs.rs

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::config_defaults::*;

/// Top level of `pronto.yaml`. Every section and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub triage: TriageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Browser origins allowed to send credentialed requests.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Sled database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    #[serde(default = "default_flush_every_ms")]
    pub flush_every_ms: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_directory: default_data_directory(),
            cache_capacity: default_cache_capacity(),
            flush_every_ms: default_flush_every_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HS256 key for session tokens.
    #[serde(default = "default_session_secret")]
    pub session_secret: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Adds `Secure` to the session and CSRF cookies.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        SecurityConfig {
            session_secret: default_session_secret(),
            session_ttl_hours: default_session_ttl_hours(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

/// External triage advisor. Without an endpoint the local heuristic answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_triage_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        TriageConfig {
            endpoint: None,
            api_key: None,
            timeout_secs: default_triage_timeout_secs(),
        }
    }
}
