// src/storage/mod.rs — Local key-value persistence
//
// The session store only ever needs string keys mapped to JSON text, the same
// contract a browser's localStorage offers. Backends implement `KeyValueStore`.

pub mod schema;
pub mod sqlite;

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::infra::config::{StorageBackend, StorageConfig};
use crate::infra::errors::ChronosError;

pub use sqlite::SqliteStore;

/// Synchronous string key-value storage.
pub trait KeyValueStore: Send {
    /// `None` when the key is absent; absence is never an error.
    fn get_item(&self, key: &str) -> Result<Option<String>, ChronosError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), ChronosError>;

    /// Removing an absent key succeeds.
    fn remove_item(&self, key: &str) -> Result<(), ChronosError>;

    /// All stored keys, sorted.
    fn keys(&self) -> Result<Vec<String>, ChronosError>;
}

/// Process-local store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still a valid map.
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, ChronosError> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), ChronosError> {
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), ChronosError> {
        self.items().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, ChronosError> {
        Ok(self.items().keys().cloned().collect())
    }
}

/// Open the backend selected in config.
pub fn open(config: &StorageConfig) -> Result<Box<dyn KeyValueStore>, ChronosError> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::debug!("Using in-memory session storage");
            Ok(Box::new(MemoryStore::new()))
        }
        StorageBackend::Sqlite => {
            let path = config.db_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            tracing::debug!("Opening session database at {}", path.display());
            Ok(Box::new(SqliteStore::open(&path)?))
        }
    }
}
