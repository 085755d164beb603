//! Service configuration
//!
//! Read from `AGENDA__*` environment variables, e.g. `AGENDA__BIND_ADDRESS`,
//! `AGENDA__STORE=memory`, `AGENDA__VERSIONS=redis`,
//! `AGENDA__JWT_PUBLIC_KEY=/path/to/public.pem`. Database and Redis
//! connection settings come from `common`.

use config::{Config, Environment};
use serde::Deserialize;
use std::fs;

/// Which entity store backs the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

/// Where collection versions live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub store: StoreBackend,
    #[serde(default)]
    pub versions: VersionBackend,
    /// PEM text, or a path to a PEM file, holding the RS256 public key
    pub jwt_public_key: Option<String>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("AGENDA").separator("__"))
            .build()?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        Ok(config.try_deserialize()?)
    }

    /// Resolve the configured key to PEM text
    pub fn jwt_public_key_pem(&self) -> anyhow::Result<Option<String>> {
        match &self.jwt_public_key {
            None => Ok(None),
            Some(key) if key.starts_with("-----BEGIN") => Ok(Some(key.clone())),
            Some(path) => {
                let pem = fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("Failed to read public key file {}: {}", path, e))?;
                Ok(Some(pem.trim().to_string()))
            }
        }
    }
}
