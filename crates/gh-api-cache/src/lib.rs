//! Two-tier cache for GitHub API responses
//!
//! This crate provides the cache used by `gh-client` to avoid redundant
//! upstream calls. Values are stored as JSON with a per-entry expiry.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 CacheManager                     │
//! │  - get::<T>(key)                                 │
//! │  - set::<T>(key, value, ttl)                     │
//! │  - cleanup()                                     │
//! └─────────────────────────────────────────────────┘
//!                        │ tiers, tried in order
//!        ┌───────────────┴───────────────┐
//!        ▼                               ▼
//! ┌─────────────────┐         ┌─────────────────────┐
//! │ RemoteTier      │  error  │ MemoryTier          │
//! │ (KvStore)       │────────►│ (bounded LRU)       │
//! └─────────────────┘         └─────────────────────┘
//! ```
//!
//! A tier that errors is logged and skipped; the next tier answers the
//! call. Cache failures never reach the caller, they only degrade to a miss.
//!
//! # Example
//!
//! ```rust,no_run
//! use gh_api_cache::{CacheManager, CacheMetrics, MemoryKvStore, SystemClock};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let metrics = Arc::new(CacheMetrics::default());
//! let cache = CacheManager::new(metrics.clone(), Arc::new(SystemClock))
//!     .with_remote(Arc::new(MemoryKvStore::default()), "gh-card:", Duration::from_secs(2));
//!
//! cache.set("user:octocat", &42u64, Duration::from_secs(60)).await;
//! let value: Option<u64> = cache.get("user:octocat").await;
//! assert_eq!(value, Some(42));
//! # }
//! ```

pub mod clock;
pub mod entry;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod store;
pub mod tier;

/// Default capacity of the in-process LRU tier
pub const DEFAULT_CAPACITY: usize = 1000;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use error::CacheError;
pub use manager::CacheManager;
pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use store::{JsonFileKvStore, KvStore, MemoryKvStore};
pub use tier::{CacheTier, MemoryTier, RemoteTier};
