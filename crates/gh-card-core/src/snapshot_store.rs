use crate::error::StoreError;
use crate::snapshot::GitHubSnapshot;
use crate::store::{RowStore, StoredSnapshot};
use chrono::Duration;
use gh_api_cache::Clock;
use log::debug;
use std::sync::Arc;

/// Snapshots older than this are refetched
pub const DEFAULT_SNAPSHOT_MAX_AGE_HOURS: i64 = 24;

/// Durable per-user snapshots with a freshness gate
pub struct PersistentSnapshotStore {
    rows: Arc<dyn RowStore>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
}

impl PersistentSnapshotStore {
    pub fn new(rows: Arc<dyn RowStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            rows,
            clock,
            max_age: Duration::hours(DEFAULT_SNAPSHOT_MAX_AGE_HOURS),
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Stored snapshot regardless of age
    pub fn load_any(&self, username: &str) -> Result<Option<StoredSnapshot>, StoreError> {
        self.rows.load_snapshot(username)
    }

    /// Stored snapshot if it is younger than the max age
    pub fn load(&self, username: &str) -> Result<Option<GitHubSnapshot>, StoreError> {
        Ok(self
            .load_any(username)?
            .filter(|stored| {
                let fresh = self.is_fresh(stored);
                if !fresh {
                    debug!(
                        "Snapshot for {} from {} is stale",
                        username, stored.last_updated
                    );
                }
                fresh
            })
            .map(|stored| stored.snapshot))
    }

    pub fn is_fresh(&self, stored: &StoredSnapshot) -> bool {
        self.clock.now() - stored.last_updated < self.max_age
    }

    /// Write the snapshot stamped with the current time
    pub fn save(&self, username: &str, snapshot: &GitHubSnapshot) -> Result<(), StoreError> {
        self.rows
            .upsert_snapshot(username, snapshot, self.clock.now())
    }
}
