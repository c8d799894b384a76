//! Durable key-value store interface
//!
//! The remote cache tier talks to storage only through [`KvStore`]. Two
//! implementations ship with the crate:
//!
//! - [`MemoryKvStore`] - a map behind a mutex, for tests and local runs
//! - [`JsonFileKvStore`] - a single JSON document on disk

use crate::error::CacheError;
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Key-value storage consumed by [`crate::RemoteTier`]
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn has(&self, key: &str) -> Result<bool, CacheError>;

    /// Every key with its value, used by the cleanup sweep
    async fn get_all(&self) -> Result<HashMap<String, Value>, CacheError>;
}

/// In-process key-value store
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryKvStore {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CacheError> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries().remove(key);
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries().contains_key(key))
    }

    async fn get_all(&self) -> Result<HashMap<String, Value>, CacheError> {
        Ok(self.entries().clone())
    }
}

/// Key-value store persisted as one JSON object in a file
///
/// Every operation reads the file; mutations rewrite it through a temporary
/// file and a rename. A missing file is an empty store.
#[derive(Debug)]
pub struct JsonFileKvStore {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl JsonFileKvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<HashMap<String, Value>, CacheError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, entries: &HashMap<String, Value>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(
            "Wrote {} entries to key-value file {:?}",
            entries.len(),
            self.path
        );
        Ok(())
    }
}

#[async_trait]
impl KvStore for JsonFileKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CacheError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;
        entries.insert(key.to_string(), value);
        self.write(&entries).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;
        if entries.remove(key).is_some() {
            self.write(&entries).await?;
        }
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.contains_key(key))
    }

    async fn get_all(&self) -> Result<HashMap<String, Value>, CacheError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }
}
