//! Storage backend selection.

use std::path::PathBuf;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::trait_::{Result, Storage, StorageError};

/// Which backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per record under a directory
    #[default]
    Json,
    /// A single SQLite database file
    Sqlite,
}

impl std::str::FromStr for StorageBackend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(StorageError::Other(format!("unknown storage backend: {}", other))),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend to use
    pub backend: StorageBackend,

    /// Directory (json) or database file (sqlite)
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            path: PathBuf::from(".coursetrack"),
        }
    }
}

/// Open the configured backend.
pub async fn open_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>> {
    info!(backend = ?config.backend, path = %config.path.display(), "Opening storage");
    match config.backend {
        #[cfg(feature = "json")]
        StorageBackend::Json => {
            let storage: Arc<dyn Storage> = Arc::new(super::JsonStorage::new(&config.path).await?);
            Ok(storage)
        }
        #[cfg(feature = "sqlite")]
        StorageBackend::Sqlite => {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            let storage: Arc<dyn Storage> =
                Arc::new(super::SqliteStorage::new_from_path(&config.path).await?);
            Ok(storage)
        }
        #[allow(unreachable_patterns)]
        other => Err(StorageError::Other(format!(
            "storage backend {:?} is not compiled in",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("json".parse::<StorageBackend>().unwrap(), StorageBackend::Json);
        assert_eq!("SQLite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert!("postgres".parse::<StorageBackend>().is_err());
    }

    #[cfg(feature = "json")]
    #[tokio::test]
    async fn test_open_json_storage() {
        use crate::{CatalogStore, EnrollmentStore};
        use coursetrack_core::{Course, UserId};

        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Json,
            path: dir.path().join("store"),
        };
        let storage = open_storage(&config).await.unwrap();

        let course = Course::new("Opened");
        storage.save_course(&course).await.unwrap();
        let (_, created) = storage.enroll(&UserId::new("u"), course.id).await.unwrap();
        assert!(created);
    }
}
