//! Service configuration
//!
//! Loaded from a TOML file; every section is optional and falls back to
//! the defaults below. CLI/env overrides are applied in `main`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::VideoEntry;
use crate::error::{ArchiveError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Origins allowed by CORS (empty = any)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Base URL clients reach this server at (default `http://localhost:{http_port}`)
    #[serde(default)]
    pub public_url: Option<String>,
}

/// Where uploaded screenshots go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Remote object storage REST API
    Remote,
    /// In-process store (development only, lost on restart)
    #[default]
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Project URL of the object store, e.g. "https://abc.supabase.co"
    #[serde(default)]
    pub base_url: Option<String>,

    /// Service key sent as bearer token and `apikey` header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Bucket that receives screenshots
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Upload request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Largest accepted image
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// Total bytes the memory backend may hold
    #[serde(default = "default_memory_capacity_bytes")]
    pub memory_capacity_bytes: usize,
}

/// Which identity provider checks passwords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProviderKind {
    /// Remote password-grant endpoint
    Remote,
    /// Argon2 hashes listed in this file
    #[default]
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub provider: AuthProviderKind,

    /// Identity provider URL (remote provider only)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Public API key for the identity provider (remote provider only)
    #[serde(default)]
    pub api_key: Option<String>,

    /// The single identity allowed to change the catalog
    #[serde(default)]
    pub admin_email: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Accounts for the local provider
    #[serde(default)]
    pub users: Vec<LocalUser>,
}

/// Local account with an Argon2 PHC hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalUser {
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Entries every new session starts with
    #[serde(default)]
    pub seed: Vec<VideoEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions idle for longer than this are dropped
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_secs: u64,
}

// Defaults
fn default_http_port() -> u16 { 8080 }
fn default_bucket() -> String { "screenshots".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_max_image_bytes() -> usize { 10 * 1024 * 1024 } // 10MB
fn default_memory_capacity_bytes() -> usize { 256 * 1024 * 1024 }
fn default_idle_ttl() -> u64 { 24 * 60 * 60 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            allowed_origins: Vec::new(),
            public_url: None,
        }
    }
}

impl ServerConfig {
    /// Base URL used to build links to objects this server serves
    pub fn public_base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.http_port),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            base_url: None,
            api_key: None,
            bucket: default_bucket(),
            timeout_secs: default_timeout_secs(),
            max_image_bytes: default_max_image_bytes(),
            memory_capacity_bytes: default_memory_capacity_bytes(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider: AuthProviderKind::default(),
            base_url: None,
            api_key: None,
            admin_email: String::new(),
            timeout_secs: default_timeout_secs(),
            users: Vec::new(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ArchiveError::Config(e.to_string()))
    }

    /// Read a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ArchiveError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.admin_email.trim().is_empty() {
            return Err(config_err("auth.admin_email is required"));
        }

        match self.auth.provider {
            AuthProviderKind::Remote => {
                if self.auth.base_url.is_none() {
                    return Err(config_err("auth.base_url is required for the remote provider"));
                }
            }
            AuthProviderKind::Local => {
                if self.auth.users.is_empty() {
                    return Err(config_err("auth.users must list at least one local account"));
                }
            }
        }

        if self.storage.backend == StorageBackend::Remote {
            if self.storage.base_url.is_none() {
                return Err(config_err("storage.base_url is required for the remote backend"));
            }
            if self.storage.api_key.is_none() {
                return Err(config_err("storage.api_key is required for the remote backend"));
            }
        }

        if self.storage.bucket.trim().is_empty() {
            return Err(config_err("storage.bucket must not be empty"));
        }

        if self.storage.max_image_bytes == 0 {
            return Err(config_err("storage.max_image_bytes must be greater than zero"));
        }

        if self.storage.timeout_secs == 0 || self.auth.timeout_secs == 0 {
            return Err(config_err("timeouts must be greater than zero"));
        }

        Ok(())
    }
}

fn config_err(message: &str) -> ArchiveError {
    ArchiveError::Config(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.bucket, "screenshots");
        assert_eq!(config.auth.provider, AuthProviderKind::Local);
        assert_eq!(config.session.idle_ttl_secs, 86_400);
        assert!(config.catalog.seed.is_empty());
        assert_eq!(config.server.public_base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_public_url_override() {
        let config = Config::from_toml_str(
            "[server]\nhttp_port = 9000\npublic_url = \"https://archive.example.com/\"\n",
        )
        .unwrap();
        assert_eq!(config.server.public_base_url(), "https://archive.example.com");
    }

    #[test]
    fn test_default_config_needs_admin() {
        let err = Config::default().validate().unwrap_err();
        assert_eq!(err, ArchiveError::Config("auth.admin_email is required".to_string()));
    }

    #[test]
    fn test_remote_backends_need_urls() {
        let mut config = Config::default();
        config.auth.admin_email = "admin@example.com".to_string();
        config.auth.provider = AuthProviderKind::Remote;
        assert!(config.validate().is_err());

        config.auth.base_url = Some("https://id.example.com".to_string());
        assert!(config.validate().is_ok());

        config.storage.backend = StorageBackend::Remote;
        config.storage.base_url = Some("https://store.example.com".to_string());
        assert!(config.validate().is_err());

        config.storage.api_key = Some("key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.auth.admin_email = "admin@example.com".to_string();
        config.auth.provider = AuthProviderKind::Remote;
        config.auth.base_url = Some("https://id.example.com".to_string());
        config.storage.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
