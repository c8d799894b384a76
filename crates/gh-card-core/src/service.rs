//! Outward service interface
//!
//! [`GitHubDataService`] ties the cached upstream client, the snapshot store
//! and the leaderboard ranker together. Callers only see finished snapshots:
//! a snapshot is either written completely or not at all, so dropping a
//! request future midway leaves the snapshot store and the ranks untouched.
//! Endpoint responses that completed before the drop stay in the API cache;
//! each of those entries is a whole, valid response that later lookups may
//! reuse until it expires.
//!
//! A failed profile request never overwrites stored data. The last stored
//! snapshot is served instead, however old, and without one the lookup
//! fails with [`ServiceError::Upstream`]. An unknown user is not a failure
//! and yields a zero snapshot.

use crate::error::ServiceError;
use crate::leaderboard::{LeaderboardEntry, LeaderboardRanker};
use crate::snapshot::GitHubSnapshot;
use crate::snapshot_store::{PersistentSnapshotStore, DEFAULT_SNAPSHOT_MAX_AGE_HOURS};
use crate::store::RowStore;
use chrono::{DateTime, Duration, Utc};
use gh_api_cache::{Clock, MetricsSnapshot};
use gh_client::fetcher::DEFAULT_COMMIT_WINDOW_DAYS;
use gh_client::{CacheMode, CachedGitHubClient, GitHubClient, ProfileFetcher};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_USERNAME_LEN: usize = 39;

/// Tunables of [`GitHubDataService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub snapshot_max_age: Duration,
    /// Minimum age of the leaderboard before a user lookup recomputes it
    pub leaderboard_refresh_interval: Duration,
    pub default_leaderboard_limit: usize,
    pub commit_window: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            snapshot_max_age: Duration::hours(DEFAULT_SNAPSHOT_MAX_AGE_HOURS),
            leaderboard_refresh_interval: Duration::hours(1),
            default_leaderboard_limit: 100,
            commit_window: Duration::days(DEFAULT_COMMIT_WINDOW_DAYS),
        }
    }
}

/// Result envelope of a user lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDataResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<GitHubSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<GitHubSnapshot, ServiceError>> for UserDataResponse {
    fn from(result: Result<GitHubSnapshot, ServiceError>) -> Self {
        match result {
            Ok(snapshot) => Self {
                success: true,
                data: Some(snapshot),
                error: None,
            },
            Err(e) => Self {
                success: false,
                data: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullLeaderboard {
    pub leaderboard: Vec<LeaderboardEntry>,
    /// The requesting user's row, when ranked
    pub current_user: Option<LeaderboardEntry>,
    pub total_users: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub affected_rows: usize,
}

/// GitHub profile data, contribution scores and the leaderboard
pub struct GitHubDataService<C: GitHubClient + Clone> {
    client: CachedGitHubClient<C>,
    rows: Arc<dyn RowStore>,
    clock: Arc<dyn Clock>,
    snapshots: PersistentSnapshotStore,
    ranker: LeaderboardRanker,
    settings: ServiceSettings,
}

impl<C: GitHubClient + Clone> GitHubDataService<C> {
    pub fn new(
        client: CachedGitHubClient<C>,
        rows: Arc<dyn RowStore>,
        clock: Arc<dyn Clock>,
        settings: ServiceSettings,
    ) -> Self {
        let snapshots = PersistentSnapshotStore::new(Arc::clone(&rows), Arc::clone(&clock))
            .with_max_age(settings.snapshot_max_age);
        let ranker = LeaderboardRanker::new(Arc::clone(&rows), Arc::clone(&clock));

        Self {
            client,
            rows,
            clock,
            snapshots,
            ranker,
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn ranker(&self) -> &LeaderboardRanker {
        &self.ranker
    }

    pub fn snapshots(&self) -> &PersistentSnapshotStore {
        &self.snapshots
    }

    /// Snapshot for `username`, served from the store while fresh
    pub async fn get_user_github_data(&self, username: &str) -> UserDataResponse {
        self.user_snapshot(username, false).await.into()
    }

    /// Like [`Self::get_user_github_data`] but skips the store and cache reads
    pub async fn refresh_user_github_data(&self, username: &str) -> UserDataResponse {
        self.user_snapshot(username, true).await.into()
    }

    pub async fn user_snapshot(
        &self,
        username: &str,
        force: bool,
    ) -> Result<GitHubSnapshot, ServiceError> {
        let username = validate_username(username)?;

        if !force {
            if let Some(snapshot) = self.snapshots.load(username)? {
                debug!("Serving stored snapshot for {}", username);
                return Ok(snapshot);
            }
        }

        info!(
            "Fetching GitHub data for {}{}",
            username,
            if force { " (forced)" } else { "" }
        );
        let (profile, contributions) = self.fetcher(force).fetch_all(username).await;
        let profile = match profile {
            Ok(profile) => profile,
            Err(e) => return self.last_known_snapshot(username, format!("{:#}", e)),
        };
        let snapshot = GitHubSnapshot::compute(profile, contributions, self.clock.now());

        self.snapshots.save(username, &snapshot)?;
        self.refresh_leaderboard_if_due();

        Ok(snapshot)
    }

    /// Top `limit` rows plus the current user's row
    pub fn get_full_leaderboard(
        &self,
        limit: Option<usize>,
        current_user_id: Option<i64>,
    ) -> Result<FullLeaderboard, ServiceError> {
        let limit = limit.unwrap_or(self.settings.default_leaderboard_limit);
        let leaderboard = self.ranker.list(limit, 0)?;

        let current_user = match current_user_id {
            Some(id) => match leaderboard.iter().find(|entry| entry.user_id == id) {
                Some(entry) => Some(entry.clone()),
                None => self.ranker.entry(id)?,
            },
            None => None,
        };

        Ok(FullLeaderboard {
            leaderboard,
            current_user,
            total_users: self.ranker.total_ranked()?,
            last_updated: self.ranker.last_refreshed()?,
        })
    }

    pub fn refresh_leaderboard(&self) -> Result<RefreshSummary, ServiceError> {
        let affected_rows = self.ranker.refresh()?;
        Ok(RefreshSummary { affected_rows })
    }

    /// Drop expired entries from every cache tier
    pub async fn cleanup_expired_cache(&self) -> usize {
        self.client.cache().cleanup().await
    }

    pub fn get_cache_metrics(&self) -> MetricsSnapshot {
        self.client.cache().metrics().snapshot()
    }

    pub fn reset_cache_metrics(&self) {
        self.client.cache().metrics().reset();
    }

    /// Add `username` to the leaderboard population and return its id
    pub fn register_user(&self, username: &str) -> Result<i64, ServiceError> {
        let username = validate_username(username)?;
        let id = self.rows.register_user(username, self.clock.now())?;
        debug!("Registered {} as user {}", username, id);
        Ok(id)
    }

    fn fetcher(&self, force: bool) -> ProfileFetcher<CachedGitHubClient<C>> {
        let client = if force {
            self.client.with_mode(CacheMode::WriteOnly)
        } else {
            self.client.clone()
        };
        ProfileFetcher::new(client, Arc::clone(&self.clock))
            .with_commit_window(self.settings.commit_window)
    }

    /// Stored snapshot regardless of age, used when GitHub cannot be reached
    fn last_known_snapshot(
        &self,
        username: &str,
        cause: String,
    ) -> Result<GitHubSnapshot, ServiceError> {
        match self.snapshots.load_any(username)? {
            Some(stored) => {
                warn!(
                    "GitHub unreachable for {}, serving snapshot from {}",
                    username, stored.last_updated
                );
                Ok(stored.snapshot)
            }
            None => Err(ServiceError::Upstream(cause)),
        }
    }

    /// Recompute ranks when the last refresh is older than the interval.
    /// Failures are logged only; the lookup that triggered this already
    /// succeeded.
    fn refresh_leaderboard_if_due(&self) {
        let due = match self.ranker.last_refreshed() {
            Ok(Some(at)) => self.clock.now() - at >= self.settings.leaderboard_refresh_interval,
            Ok(None) => true,
            Err(e) => {
                warn!("Cannot read leaderboard refresh time: {}", e);
                false
            }
        };

        if due {
            if let Err(e) = self.ranker.refresh() {
                error!("Opportunistic leaderboard refresh failed: {}", e);
            }
        }
    }
}

/// Accept GitHub login syntax only: ASCII letters, digits and `-`
fn validate_username(username: &str) -> Result<&str, ServiceError> {
    let trimmed = username.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= MAX_USERNAME_LEN
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');

    if valid {
        Ok(trimmed)
    } else {
        Err(ServiceError::InvalidUsername(username.to_string()))
    }
}
