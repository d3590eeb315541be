//! Configuration for todo-api

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Document store settings
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on reading and handling a single request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long in-flight requests may run after an interrupt
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file backing the document store
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Database name inside the store
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection holding todo documents
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            database: default_database(),
            collection: default_collection(),
        }
    }
}

impl Config {
    /// Load config from an explicit file, or from the user config dir when present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// `<config_dir>/todo-api/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("todo-api").join("config.toml"))
    }

    /// Address the listener binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

// Default value functions

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_shutdown_timeout_secs() -> u64 {
    5
}

fn default_store_path() -> PathBuf {
    PathBuf::from("todo.db")
}

fn default_database() -> String {
    "demo_todo".to_string()
}

fn default_collection() -> String {
    "todo".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.server.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(config.store.database, "demo_todo");
        assert_eq!(config.store.collection, "todo");
        assert_eq!(config.listen_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 8080\n\n[store]\ncollection = \"tasks\"\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.store.collection, "tasks");
        assert_eq!(config.store.database, "demo_todo");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(dir.path().join("nope.toml").as_path()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        assert!(matches!(Config::load(Some(path.as_path())), Err(Error::Toml(_))));
    }
}
