//! Configuration
//!
//! Remote store selection and screen settings, persisted as JSON and
//! overridable from the environment.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::commands::EchoStrategy;
use crate::domain::GenreCatalog;
use crate::repository::{FirestoreSettings, FirestoreStore, MemoryStore, RemoteCollection};

pub const DEFAULT_COLLECTION: &str = "inventoryItems";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Where the inventory collection lives
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Backend {
    /// Process-local collection, lost on exit
    #[default]
    Memory,
    Firestore {
        project_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        #[serde(default = "default_database")]
        database: String,
        /// Emulator or proxy endpoint
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
}

fn default_database() -> String {
    "(default)".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub backend: Backend,
    pub collection: String,
    pub poll_interval_ms: u64,
    pub genres: GenreCatalog,
    pub echo: EchoStrategy,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            collection: DEFAULT_COLLECTION.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            genres: GenreCatalog::default(),
            echo: EchoStrategy::default(),
        }
    }
}

impl InventoryConfig {
    pub const FILE_NAME: &'static str = "inventory_config.json";

    /// Read a config file; `None` when it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// File config (or defaults) with environment overrides applied
    pub fn resolve(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?.unwrap_or_default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_error)?;
        info!("Saved inventory config to {}", path.display());
        Ok(())
    }

    /// Apply `INVENTORY_*` environment overrides
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(project) = lookup("INVENTORY_FIRESTORE_PROJECT") {
            match &mut self.backend {
                Backend::Firestore { project_id, .. } => *project_id = project,
                Backend::Memory => {
                    self.backend = Backend::Firestore {
                        project_id: project,
                        api_key: None,
                        database: default_database(),
                        base_url: None,
                    }
                }
            }
        }

        if let Some(key) = lookup("INVENTORY_FIRESTORE_API_KEY") {
            match &mut self.backend {
                Backend::Firestore { api_key, .. } => *api_key = Some(key),
                Backend::Memory => warn!("INVENTORY_FIRESTORE_API_KEY ignored: no Firestore project configured"),
            }
        }

        if let Some(collection) = lookup("INVENTORY_COLLECTION") {
            self.collection = collection;
        }

        if let Some(raw) = lookup("INVENTORY_POLL_INTERVAL_MS") {
            self.poll_interval_ms = raw
                .parse()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::InvalidEnv {
                    name: "INVENTORY_POLL_INTERVAL_MS",
                    value: raw,
                })?;
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Build the configured remote collection
    pub fn remote(&self) -> Arc<dyn RemoteCollection> {
        match &self.backend {
            Backend::Memory => {
                info!("Using in-memory inventory collection");
                Arc::new(MemoryStore::new())
            }
            Backend::Firestore {
                project_id,
                api_key,
                database,
                base_url,
            } => {
                let mut settings = FirestoreSettings::new(project_id.clone(), self.collection.clone());
                settings.api_key = api_key.clone();
                settings.database = database.clone();
                settings.poll_interval = self.poll_interval();
                if let Some(url) = base_url {
                    settings.base_url = url.clone();
                }
                info!("Using Firestore project {} collection {}", project_id, self.collection);
                Arc::new(FirestoreStore::new(settings))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = InventoryConfig::load(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(InventoryConfig::FILE_NAME);

        let config = InventoryConfig {
            backend: Backend::Firestore {
                project_id: "inventoryadd".to_string(),
                api_key: Some("key".to_string()),
                database: default_database(),
                base_url: None,
            },
            echo: EchoStrategy::AwaitSnapshot,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = InventoryConfig::load(&path).unwrap().expect("saved file");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "backend": { "kind": "firestore", "project_id": "p" }, "echo": "await-snapshot" }"#).unwrap();

        let config = InventoryConfig::load(&path).unwrap().unwrap();
        assert_eq!(config.collection, DEFAULT_COLLECTION);
        assert_eq!(config.poll_interval(), Duration::from_millis(2000));
        assert_eq!(config.genres, GenreCatalog::default());
        assert_eq!(config.echo, EchoStrategy::AwaitSnapshot);
        assert!(matches!(config.backend, Backend::Firestore { ref database, .. } if database == "(default)"));
    }

    #[test]
    fn test_custom_genres_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "genres": ["シューズ", "バッグ"] }"#).unwrap();

        let config = InventoryConfig::load(&path).unwrap().unwrap();
        assert_eq!(config.genres.stock_code("バッグ"), "バッグ-002");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(InventoryConfig::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = InventoryConfig::default();
        config
            .apply_overrides(lookup(&[
                ("INVENTORY_FIRESTORE_PROJECT", "proj"),
                ("INVENTORY_FIRESTORE_API_KEY", "secret"),
                ("INVENTORY_COLLECTION", "stock"),
                ("INVENTORY_POLL_INTERVAL_MS", "500"),
            ]))
            .unwrap();

        assert_eq!(
            config.backend,
            Backend::Firestore {
                project_id: "proj".to_string(),
                api_key: Some("secret".to_string()),
                database: default_database(),
                base_url: None,
            }
        );
        assert_eq!(config.collection, "stock");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_poll_interval_env() {
        let mut config = InventoryConfig::default();
        let err = config
            .apply_overrides(lookup(&[("INVENTORY_POLL_INTERVAL_MS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "INVENTORY_POLL_INTERVAL_MS", .. }));
    }

    #[test]
    fn test_api_key_without_project_is_ignored() {
        let mut config = InventoryConfig::default();
        config
            .apply_overrides(lookup(&[("INVENTORY_FIRESTORE_API_KEY", "secret")]))
            .unwrap();
        assert_eq!(config.backend, Backend::Memory);
    }
}
