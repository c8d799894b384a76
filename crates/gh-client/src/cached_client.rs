//! Cached GitHub API client (decorator pattern)
//!
//! Wraps any `GitHubClient` implementation to add caching behavior.
//! The cache mode determines whether to read from cache, write to cache, or both.

use crate::client::{CacheMode, GitHubClient};
use crate::types::{RepoResponse, SearchQuery, UserResponse};
use async_trait::async_trait;
use gh_api_cache::CacheManager;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Time-to-live per endpoint family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub profile: Duration,
    pub repos: Duration,
    pub search: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            profile: Duration::from_secs(60 * 60),
            repos: Duration::from_secs(60 * 60),
            search: Duration::from_secs(30 * 60),
        }
    }
}

/// Cached GitHub API client using the decorator pattern
///
/// Wraps an inner `GitHubClient` and adds caching behavior based on the configured
/// `CacheMode`. This allows transparent caching without the caller needing to be
/// aware of the cache. Only successful responses are cached; a "not found"
/// answer is a successful response.
///
/// # Cache Modes
///
/// - `CacheMode::None` - Pass through to inner client (no caching)
/// - `CacheMode::WriteOnly` - Skip cache reads, but write responses (force refresh)
/// - `CacheMode::ReadOnly` - Read from cache only, don't update cache
/// - `CacheMode::ReadWrite` - Full caching (default, most efficient)
#[derive(Clone)]
pub struct CachedGitHubClient<C: GitHubClient + Clone> {
    inner: C,
    cache: Arc<CacheManager>,
    mode: CacheMode,
    ttls: CacheTtls,
}

impl<C: GitHubClient + Clone> CachedGitHubClient<C> {
    /// Create a new cached client
    ///
    /// # Arguments
    ///
    /// * `inner` - The inner client to delegate API calls to
    /// * `cache` - Shared cache instance
    /// * `mode` - Cache behavior mode
    pub fn new(inner: C, cache: Arc<CacheManager>, mode: CacheMode) -> Self {
        Self {
            inner,
            cache,
            mode,
            ttls: CacheTtls::default(),
        }
    }

    pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
        self.ttls = ttls;
        self
    }

    /// Get the current cache mode
    pub fn cache_mode(&self) -> CacheMode {
        self.mode
    }

    /// Create a new client with a different cache mode
    ///
    /// This is useful for creating a "force refresh" client without
    /// constructing a new inner client.
    pub fn with_mode(&self, mode: CacheMode) -> CachedGitHubClient<C> {
        CachedGitHubClient {
            inner: self.inner.clone(),
            cache: Arc::clone(&self.cache),
            mode,
            ttls: self.ttls,
        }
    }

    /// Get a reference to the inner client
    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    /// Try to get data from cache
    async fn try_cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.mode.should_read() {
            return None;
        }

        self.cache.get(key).await
    }

    /// Write data to cache
    async fn cache_set<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Duration) {
        if !self.mode.should_write() {
            return;
        }

        self.cache.set(key, value, ttl).await;
    }
}

fn user_key(username: &str) -> String {
    format!("user:{}", username.to_lowercase())
}

fn repos_key(username: &str) -> String {
    format!("repos:{}", username.to_lowercase())
}

fn search_key(query: &SearchQuery) -> String {
    format!("search:{}?q={}", query.route(), query.q().to_lowercase())
}

#[async_trait]
impl<C: GitHubClient + Clone> GitHubClient for CachedGitHubClient<C> {
    async fn fetch_user(&self, username: &str) -> anyhow::Result<Option<UserResponse>> {
        let key = user_key(username);

        // A cached `null` is a remembered "no such user"
        if let Some(user) = self.try_cache_get::<Option<UserResponse>>(&key).await {
            debug!("Cache HIT for profile of {}", username);
            return Ok(user);
        }

        let user = self.inner.fetch_user(username).await?;
        self.cache_set(&key, &user, self.ttls.profile).await;

        Ok(user)
    }

    async fn fetch_repos(&self, username: &str) -> anyhow::Result<Vec<RepoResponse>> {
        let key = repos_key(username);

        if let Some(repos) = self.try_cache_get::<Vec<RepoResponse>>(&key).await {
            debug!("Cache HIT for {}: {} repositories", username, repos.len());
            return Ok(repos);
        }

        let repos = self.inner.fetch_repos(username).await?;
        self.cache_set(&key, &repos, self.ttls.repos).await;

        Ok(repos)
    }

    async fn search_count(&self, query: &SearchQuery) -> anyhow::Result<u64> {
        let key = search_key(query);

        if let Some(count) = self.try_cache_get::<u64>(&key).await {
            debug!("Cache HIT for {} search: {}", query.label(), count);
            return Ok(count);
        }

        let count = self.inner.search_count(query).await?;
        self.cache_set(&key, &count, self.ttls.search).await;

        Ok(count)
    }
}
