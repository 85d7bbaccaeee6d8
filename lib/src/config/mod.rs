// lib/src/config/mod.rs
//
// Configuration is read from YAML, then overridden by `PRONTO_*`
// environment variables. Command line flags are applied by the server on
// top of the result.

pub mod config_defaults;
pub mod config_structs;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};

pub use config_defaults::*;
pub use config_structs::{AppConfig, SecurityConfig, ServerConfig, StorageConfig, TriageConfig};

impl AppConfig {
    /// Parses a YAML document. Blank and comment lines are dropped first.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let cleaned = content
            .lines()
            .filter(|line| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !trimmed.starts_with('#')
            })
            .collect::<Vec<&str>>()
            .join("\n");
        if cleaned.is_empty() {
            return Ok(AppConfig::default());
        }
        serde_yaml2::from_str::<AppConfig>(&cleaned)
            .map_err(|e| anyhow::anyhow!("Failed to parse configuration: {}", e))
    }

    pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Resolves the configuration file (`explicit`, then `PRONTO_CONFIG`,
    /// then the default path when it exists) and applies environment
    /// overrides. A missing default file yields built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = env::var("PRONTO_CONFIG").ok().map(PathBuf::from);
        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load_from_yaml(&path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load_from_yaml(&default_path)?
                } else {
                    debug!("No configuration file found, using defaults");
                    AppConfig::default()
                }
            }
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        if config.security.session_secret == DEFAULT_SESSION_SECRET {
            warn!("Using the built-in session secret; set PRONTO_SESSION_SECRET in production");
        }
        Ok(config)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        let ttl = self.security.session_ttl_hours;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&ttl) {
            anyhow::bail!(
                "security.session_ttl_hours must be between 1 and {}, got {}",
                MAX_SESSION_TTL_HOURS,
                ttl
            );
        }
        Ok(())
    }

    /// Applies `PRONTO_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("PRONTO_DATA_DIR") {
            self.storage.data_directory = PathBuf::from(dir);
        }
        if let Some(host) = lookup("PRONTO_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PRONTO_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PRONTO_PORT is not a valid port: {}", port))?;
        }
        if let Some(secret) = lookup("PRONTO_SESSION_SECRET") {
            self.security.session_secret = secret;
        }
        if let Some(endpoint) = lookup("PRONTO_TRIAGE_ENDPOINT") {
            self.triage.endpoint = Some(endpoint).filter(|e| !e.is_empty());
        }
        if let Some(key) = lookup("PRONTO_TRIAGE_API_KEY") {
            self.triage.api_key = Some(key).filter(|k| !k.is_empty());
        }
        Ok(())
    }
}
