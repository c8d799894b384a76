//! Cache tiers
//!
//! A tier stores JSON values with an expiry. [`crate::CacheManager`] keeps
//! an ordered list of tiers and asks the next one whenever a tier errors.

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::store::KvStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use lru::LruCache;
use serde_json::Value;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One cache backend
///
/// `get` treats an expired entry as a miss and removes it.
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Value>, CacheError>;

    async fn set(
        &self,
        key: &str,
        value: Value,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every expired entry, returning how many were removed
    async fn cleanup(&self, now: DateTime<Utc>) -> Result<usize, CacheError>;
}

/// Tier backed by a durable [`KvStore`]
///
/// Keys are prefixed with the namespace so the cleanup sweep only touches
/// this cache's entries. Every store call is bounded by `timeout`.
pub struct RemoteTier {
    store: Arc<dyn KvStore>,
    namespace: String,
    timeout: Duration,
}

impl RemoteTier {
    pub fn new(store: Arc<dyn KvStore>, namespace: impl Into<String>, timeout: Duration) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            timeout,
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| CacheError::Timeout(self.timeout.as_millis()))?
    }
}

#[async_trait]
impl CacheTier for RemoteTier {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Value>, CacheError> {
        let full_key = self.namespaced(key);
        let Some(raw) = self.bounded(self.store.get(&full_key)).await? else {
            return Ok(None);
        };

        let entry: CacheEntry<Value> = serde_json::from_value(raw)?;
        if entry.is_expired(now) {
            debug!("Remote cache entry {} expired, deleting", full_key);
            if let Err(e) = self.bounded(self.store.delete(&full_key)).await {
                debug!("Failed to delete expired entry {}: {}", full_key, e);
            }
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    async fn set(
        &self,
        key: &str,
        value: Value,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let envelope = serde_json::to_value(CacheEntry::new(value, expiry, now))?;
        self.bounded(self.store.set(&self.namespaced(key), envelope))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.bounded(self.store.delete(&self.namespaced(key))).await
    }

    async fn cleanup(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let all = self.bounded(self.store.get_all()).await?;
        let mut removed = 0;

        for (key, raw) in all {
            if !key.starts_with(&self.namespace) {
                continue;
            }

            let expired = match serde_json::from_value::<CacheEntry<Value>>(raw) {
                Ok(entry) => entry.is_expired(now),
                Err(e) => {
                    warn!("Skipping malformed remote cache entry {}: {}", key, e);
                    false
                }
            };

            if expired {
                match self.bounded(self.store.delete(&key)).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("Failed to delete expired cache entry {}: {}", key, e),
                }
            }
        }

        Ok(removed)
    }
}

/// Bounded in-process LRU tier
///
/// When full, inserting a new key evicts the least recently accessed entry.
pub struct MemoryTier {
    entries: Mutex<LruCache<String, CacheEntry<Value>>>,
}

impl MemoryTier {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, CacheEntry<Value>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Whether `key` is present, without touching its recency
    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains(key)
    }
}

#[async_trait]
impl CacheTier for MemoryTier {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Value>, CacheError> {
        let mut entries = self.entries();
        match entries.get_mut(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => {
                entry.last_accessed = now;
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => {}
        }

        entries.pop(key);
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: Value,
        expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let mut entries = self.entries();
        if let Some((evicted, _)) = entries.push(key.to_string(), CacheEntry::new(value, expiry, now))
        {
            if evicted != key {
                debug!("Memory cache full, evicted {}", evicted);
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries().pop(key);
        Ok(())
    }

    async fn cleanup(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let mut entries = self.entries();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }

        Ok(expired.len())
    }
}
