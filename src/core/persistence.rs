//! Node position persistence
//!
//! Layout is cosmetic state: every storage failure is logged and swallowed,
//! reads fall back to an empty layout and writes become no-ops.

use crate::core::config::DEFAULT_STORAGE_PREFIX;
use crate::core::error::StoreError;
use crate::core::graph::NodeLayout;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Minimal string key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-process store, used by tests and when no storage is configured
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/<hex(key)>.json`, one file per distinct key
    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// Browser `localStorage`
#[cfg(feature = "hydrate")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

#[cfg(feature = "hydrate")]
impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".to_string()))?
            .local_storage()
            .map_err(|_| StoreError::Unavailable("failed to get localStorage".to_string()))?
            .ok_or_else(|| StoreError::Unavailable("localStorage not available".to_string()))
    }
}

#[cfg(feature = "hydrate")]
impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|_| StoreError::Unavailable(format!("failed to read '{key}'")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|_| StoreError::Unavailable(format!("failed to write '{key}'")))
    }
}

/// Per-connection node layout on top of a [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct PositionStore<S> {
    store: S,
    prefix: String,
}

impl<S: KeyValueStore> PositionStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_prefix(store, DEFAULT_STORAGE_PREFIX)
    }

    pub fn with_prefix(store: S, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, connection_id: &str) -> String {
        format!("{}{}", self.prefix, connection_id)
    }

    /// Stored layout, or an empty one when missing or unreadable
    pub fn load(&self, connection_id: &str) -> NodeLayout {
        match self.try_load(connection_id) {
            Ok(layout) => layout,
            Err(e) => {
                tracing::warn!("Failed to load node positions for '{}': {}", connection_id, e);
                NodeLayout::new()
            }
        }
    }

    /// Overwrite the stored layout; failures are logged and ignored
    pub fn save(&mut self, connection_id: &str, positions: &NodeLayout) {
        if let Err(e) = self.try_save(connection_id, positions) {
            tracing::warn!("Failed to save node positions for '{}': {}", connection_id, e);
        }
    }

    pub fn try_load(&self, connection_id: &str) -> Result<NodeLayout, StoreError> {
        match self.store.get(&self.key(connection_id))? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(NodeLayout::new()),
        }
    }

    pub fn try_save(
        &mut self,
        connection_id: &str,
        positions: &NodeLayout,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(positions)?;
        let key = self.key(connection_id);
        self.store.set(&key, &raw)
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
