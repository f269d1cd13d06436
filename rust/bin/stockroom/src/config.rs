//! Client-side configuration.
//!
//! Reads/writes `~/.stockroom/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stockroom_core::{StoreConfig, DEFAULT_OFFLINE_FLOOR};

/// Where the authoritative catalog lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Backend URL (e.g. "http://localhost:8080").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    /// Bearer token sent with catalog requests.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
}

/// Client configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub remote: RemoteConfig,
}

impl ClientConfig {
    /// Default config file path: ~/.stockroom/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Offline codes must stay out of the server-assigned range.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.offline_floor < DEFAULT_OFFLINE_FLOOR {
            anyhow::bail!(
                "store.offline_floor {} is below {}, offline codes would collide with server codes",
                self.store.offline_floor,
                DEFAULT_OFFLINE_FLOOR
            );
        }
        Ok(())
    }

    /// Save config to disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Replica location: `--db` wins, then `[store]`, then `~/.stockroom/catalog.redb`.
    pub fn resolve_db_path(&self, db_override: Option<&Path>) -> PathBuf {
        if let Some(path) = db_override {
            return path.to_path_buf();
        }
        if self.store.db_path.is_none() && self.store.data_dir.is_none() {
            return dirs_path().join("catalog.redb");
        }
        self.store.resolve_db_path()
    }
}

/// Return the stockroom config directory (~/.stockroom).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".stockroom")
}
