//! Cache manager
//!
//! Owns the ordered tier list, converts typed values to and from JSON and
//! records hit/miss metrics.

use crate::clock::Clock;
use crate::metrics::CacheMetrics;
use crate::store::KvStore;
use crate::tier::{CacheTier, MemoryTier, RemoteTier};
use crate::DEFAULT_CAPACITY;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Two-tier cache with TTL expiry
///
/// Without a remote store only the in-process LRU is used. With one, the
/// remote store is authoritative and the LRU answers whenever the remote
/// store errors or times out. None of the methods ever fail: an unusable
/// cache behaves like an empty one.
pub struct CacheManager {
    tiers: Vec<Box<dyn CacheTier>>,
    metrics: Arc<CacheMetrics>,
    clock: Arc<dyn Clock>,
    has_remote: bool,
}

impl CacheManager {
    /// Create an in-process cache with the default capacity
    pub fn new(metrics: Arc<CacheMetrics>, clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, metrics, clock)
    }

    /// Create an in-process cache holding at most `capacity` entries
    pub fn with_capacity(capacity: usize, metrics: Arc<CacheMetrics>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tiers: vec![Box::new(MemoryTier::new(capacity))],
            metrics,
            clock,
            has_remote: false,
        }
    }

    /// Put a durable store in front of the in-process tier
    pub fn with_remote(
        mut self,
        store: Arc<dyn KvStore>,
        namespace: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let namespace = namespace.into();
        info!("Cache using remote store with namespace '{}'", namespace);
        self.tiers
            .insert(0, Box::new(RemoteTier::new(store, namespace, timeout)));
        self.has_remote = true;
        self
    }

    pub fn has_remote(&self) -> bool {
        self.has_remote
    }

    pub fn metrics(&self) -> &Arc<CacheMetrics> {
        &self.metrics
    }

    /// Look up `key`, returning `None` on a miss, an expired entry, or a
    /// value that does not decode as `T`
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = self.clock.now();

        for tier in &self.tiers {
            match tier.get(key, now).await {
                Ok(Some(value)) => {
                    return match serde_json::from_value::<T>(value) {
                        Ok(decoded) => {
                            debug!("Cache HIT for {} ({} tier)", key, tier.name());
                            self.metrics.record_hit();
                            Some(decoded)
                        }
                        Err(e) => {
                            warn!("Cached value for {} has unexpected shape: {}", key, e);
                            self.metrics.record_miss();
                            None
                        }
                    };
                }
                Ok(None) => {
                    debug!("Cache MISS for {} ({} tier)", key, tier.name());
                    self.metrics.record_miss();
                    return None;
                }
                Err(e) => {
                    warn!(
                        "Cache tier '{}' failed reading {}: {}, falling back",
                        tier.name(),
                        key,
                        e
                    );
                }
            }
        }

        self.metrics.record_miss();
        None
    }

    /// Store `value` under `key` for `ttl`
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to serialize cache value for {}: {}", key, e);
                return;
            }
        };

        let now = self.clock.now();
        let expiry = expiry_after(now, ttl);

        for tier in &self.tiers {
            match tier.set(key, value.clone(), expiry, now).await {
                Ok(()) => return,
                Err(e) => {
                    warn!(
                        "Cache tier '{}' failed writing {}: {}, falling back",
                        tier.name(),
                        key,
                        e
                    );
                }
            }
        }
    }

    /// Remove `key` from every tier
    pub async fn delete(&self, key: &str) {
        for tier in &self.tiers {
            if let Err(e) = tier.delete(key).await {
                warn!("Cache tier '{}' failed deleting {}: {}", tier.name(), key, e);
            }
        }
    }

    /// Sweep every tier for expired entries, returning the number removed
    pub async fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;

        for tier in &self.tiers {
            match tier.cleanup(now).await {
                Ok(count) => {
                    debug!("Cache tier '{}' removed {} expired entries", tier.name(), count);
                    removed += count;
                }
                Err(e) => warn!("Cache tier '{}' cleanup failed: {}", tier.name(), e),
            }
        }

        info!("Cache cleanup removed {} expired entries", removed);
        removed
    }
}

fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
