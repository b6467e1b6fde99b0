//! Shim Configuration
//!
//! Bind address, backing store selection and request policy. Loaded from a
//! JSON file; every field has a default.

use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Backing store selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// In-process store, lost on exit
    Memory,
    /// MongoDB at `db_url`
    Mongo,
}

/// Shim configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShimConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 4000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name inside the store (default: "mobile-project")
    #[serde(default = "default_db_name")]
    pub db_name: String,

    /// Store connection URL (default: "mongodb://127.0.0.1:27017")
    #[serde(default = "default_db_url")]
    pub db_url: String,

    /// Backing store (default: memory)
    #[serde(default = "default_store")]
    pub store: StoreKind,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Per-request timeout in milliseconds (default: 30000)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// `get` with an unparsable key reads the whole collection
    #[serde(default)]
    pub legacy_key_fallback: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_db_name() -> String {
    "mobile-project".to_string()
}

fn default_db_url() -> String {
    "mongodb://127.0.0.1:27017".to_string()
}

fn default_store() -> StoreKind {
    StoreKind::Memory
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_name: default_db_name(),
            db_url: default_db_url(),
            store: default_store(),
            cors_origins: Vec::new(),
            request_timeout_ms: default_request_timeout_ms(),
            legacy_key_fallback: false,
        }
    }
}

impl ShimConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: ShimConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check field values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }

        if self.db_name.trim().is_empty() {
            return Err(ConfigError::Invalid("db_name must not be empty".to_string()));
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("request_timeout_ms must be > 0".to_string()));
        }

        if self.store == StoreKind::Mongo {
            if !cfg!(feature = "mongo") {
                return Err(ConfigError::Invalid(
                    "store 'mongo' requires building with the `mongo` feature".to_string(),
                ));
            }
            if !self.db_url.starts_with("mongodb://") && !self.db_url.starts_with("mongodb+srv://") {
                return Err(ConfigError::Invalid(format!(
                    "db_url must be a mongodb:// URL, got '{}'",
                    self.db_url
                )));
            }
        }

        Ok(())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ShimConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 4000);
        assert_eq!(config.db_name, "mobile-project");
        assert_eq!(config.store, StoreKind::Memory);
        assert!(config.cors_origins.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = ShimConfig::with_port(8080);
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_load_applies_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"db_name": "movie-app", "port": 5000}}"#).unwrap();

        let config = ShimConfig::load(file.path()).unwrap();
        assert_eq!(config.db_name, "movie-app");
        assert_eq!(config.port, 5000);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            ShimConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ShimConfig::load(&missing),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ShimConfig {
            request_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_kind_serde() {
        let config: ShimConfig = serde_json::from_str(r#"{"store": "memory"}"#).unwrap();
        assert_eq!(config.store, StoreKind::Memory);
    }

    #[cfg(not(feature = "mongo"))]
    #[test]
    fn test_mongo_requires_feature() {
        let config = ShimConfig {
            store: StoreKind::Mongo,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
