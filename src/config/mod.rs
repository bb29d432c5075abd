//! Configuration module for the DevFest backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Which persistence backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Single JSON document on disk
    File,
    /// SQLite database
    Sqlite,
}

impl StorageBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "file" | "json" => Some(StorageBackend::File),
            "sqlite" | "sql" => Some(StorageBackend::Sqlite),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::File => "file",
            StorageBackend::Sqlite => "sqlite",
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Persistence backend selection
    pub storage: StorageBackend,
    /// Path to the JSON data file (file backend)
    pub data_path: PathBuf,
    /// Path to the SQLite database file (sqlite backend)
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Shared secret guarding the migration endpoint (endpoint disabled when unset)
    pub migrate_secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let storage = env::var("DEVFEST_STORAGE")
            .ok()
            .and_then(|s| StorageBackend::from_str(&s))
            .unwrap_or(StorageBackend::File);

        let data_path = env::var("DEVFEST_DATA_PATH")
            .unwrap_or_else(|_| "./data/devfest.json".to_string())
            .into();

        let db_path = env::var("DEVFEST_DB_PATH")
            .unwrap_or_else(|_| "./data/devfest.sqlite".to_string())
            .into();

        let bind_addr = env::var("DEVFEST_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid DEVFEST_BIND_ADDR format");

        let log_level = env::var("DEVFEST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let migrate_secret = env::var("DEVFEST_MIGRATE_SECRET").ok();

        Self {
            storage,
            data_path,
            db_path,
            bind_addr,
            log_level,
            migrate_secret,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("DEVFEST_STORAGE");
        env::remove_var("DEVFEST_DATA_PATH");
        env::remove_var("DEVFEST_DB_PATH");
        env::remove_var("DEVFEST_BIND_ADDR");
        env::remove_var("DEVFEST_LOG_LEVEL");
        env::remove_var("DEVFEST_MIGRATE_SECRET");

        let config = Config::from_env();

        assert_eq!(config.storage, StorageBackend::File);
        assert_eq!(config.data_path, PathBuf::from("./data/devfest.json"));
        assert_eq!(config.db_path, PathBuf::from("./data/devfest.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(config.migrate_secret.is_none());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!(StorageBackend::from_str("file"), Some(StorageBackend::File));
        assert_eq!(StorageBackend::from_str("JSON"), Some(StorageBackend::File));
        assert_eq!(
            StorageBackend::from_str("sqlite"),
            Some(StorageBackend::Sqlite)
        );
        assert_eq!(StorageBackend::from_str("bogus"), None);
    }
}
