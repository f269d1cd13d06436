use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Codes at or above this value are reserved for records created offline.
/// The backend assigns codes below it.
pub const DEFAULT_OFFLINE_FLOOR: i64 = 9000;

/// Local replica configuration shared by the library and the CLI.
///
/// Deserialized from the `[store]` table of the client config file; every
/// field is optional there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the replica.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Path to the redb database file.
    /// Defaults to `{data_dir}/catalog.redb` if not specified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,

    /// Lowest code the offline allocator may hand out.
    pub offline_floor: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_path: None,
            offline_floor: DEFAULT_OFFLINE_FLOOR,
        }
    }
}

impl StoreConfig {
    /// Resolve the redb database path, falling back to `{data_dir}/catalog.redb`.
    pub fn resolve_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("catalog.redb"))
    }

    fn resolve_data_subpath(&self, name: &str) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(|d| d.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let config = StoreConfig {
            data_dir: Some(PathBuf::from("/data")),
            ..Default::default()
        };
        assert_eq!(config.resolve_db_path(), PathBuf::from("/data/catalog.redb"));
        assert_eq!(config.offline_floor, 9000);

        assert_eq!(
            StoreConfig::default().resolve_db_path(),
            PathBuf::from("catalog.redb")
        );
    }

    #[test]
    fn test_explicit_db_path_wins() {
        let config = StoreConfig {
            data_dir: Some(PathBuf::from("/data")),
            db_path: Some(PathBuf::from("/tmp/other.redb")),
            ..Default::default()
        };
        assert_eq!(config.resolve_db_path(), PathBuf::from("/tmp/other.redb"));
    }

    #[test]
    fn test_partial_toml() {
        let config: StoreConfig = toml::from_str(r#"data_dir = "/var/lib/stockroom""#).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/stockroom")));
        assert_eq!(config.offline_floor, DEFAULT_OFFLINE_FLOOR);
    }
}
