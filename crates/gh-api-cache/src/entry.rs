//! Cache entry type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached value with its expiry
///
/// The serialized form only carries `value` and `expiry` (milliseconds since
/// the epoch); that is the envelope written to the durable store.
/// `last_accessed` is tracked by the in-process tier only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expiry: DateTime<Utc>,

    #[serde(skip)]
    pub last_accessed: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, expiry: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            value,
            expiry,
            last_accessed: now,
        }
    }

    /// An entry is expired once `now` reaches its expiry
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}
