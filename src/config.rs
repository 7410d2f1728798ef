//! Configuration loading from TOML with environment overrides.
//!
//! Every field has a default, so an empty or missing `config.toml` still
//! yields a runnable service. `DATABASE_URL` overrides the configured
//! database location.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Env var naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "PARLAY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_url: "sqlite://parlays.db".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "parlay_ledger=info".into(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid config TOML")
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    /// A file that exists but doesn't parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Config path from `PARLAY_CONFIG`, or `config.toml`.
    pub fn path_from_env() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Apply `DATABASE_URL` and `PARLAY_LOG_JSON` from the environment.
    pub fn apply_env(&mut self) {
        self.override_database_url(std::env::var("DATABASE_URL").ok());
        if std::env::var("PARLAY_LOG_JSON").is_ok() {
            self.logging.json = true;
        }
    }

    /// Replace the database URL unless `url` is missing or blank.
    pub fn override_database_url(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.storage.database_url = url;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = AppConfig::parse("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.server.addr(), "127.0.0.1:3000");
        assert_eq!(cfg.storage.backend, StorageBackend::Sqlite);
        assert_eq!(cfg.logging.filter, "parlay_ledger=info");
    }

    #[test]
    fn test_partial_config() {
        let cfg = AppConfig::parse(
            r#"
            [server]
            port = 8080

            [storage]
            backend = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.storage.database_url, "sqlite://parlays.db");
        assert!(!cfg.logging.json);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(AppConfig::parse("[storage]\nbackend = \"postgres\"").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let cfg = AppConfig::load_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(AppConfig::load("definitely/not/here.toml").is_err());
    }

    #[test]
    fn test_database_url_override() {
        let mut cfg = AppConfig::default();
        cfg.override_database_url(Some("   ".into()));
        assert_eq!(cfg.storage.database_url, "sqlite://parlays.db");
        cfg.override_database_url(None);
        assert_eq!(cfg.storage.database_url, "sqlite://parlays.db");
        cfg.override_database_url(Some("sqlite::memory:".into()));
        assert_eq!(cfg.storage.database_url, "sqlite::memory:");
    }

    #[test]
    fn test_repo_config_parses() {
        // Present when run from the crate root.
        if let Ok(cfg) = AppConfig::load("config.toml") {
            assert!(cfg.server.port > 0);
            assert!(!cfg.logging.filter.is_empty());
        }
    }
}
