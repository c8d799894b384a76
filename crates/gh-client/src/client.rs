//! The [`GitHubClient`] seam and the [`CacheMode`] of its caching decorator

use crate::types::{RepoResponse, SearchQuery, UserResponse};
use async_trait::async_trait;

/// How a [`crate::CachedGitHubClient`] uses its cache
///
/// Fixed per client instance; derive a client with another mode through
/// [`crate::CachedGitHubClient::with_mode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Bypass the cache entirely
    None,

    /// Always go upstream, then store the answer (forced refresh)
    WriteOnly,

    /// Serve cached answers but never store new ones
    ReadOnly,

    /// Serve cached answers and store fresh ones
    #[default]
    ReadWrite,
}

impl CacheMode {
    pub fn should_read(&self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    pub fn should_write(&self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }
}

/// One method per GitHub endpoint the profile fetcher needs
///
/// [`crate::OctocrabClient`] talks to the API, [`crate::CachedGitHubClient`]
/// decorates any implementation with the cache.
///
/// "Not found" is not an error: `fetch_user` returns `Ok(None)`, the list
/// and search endpoints return an empty list or a zero count. Every other
/// failure is an `Err` and is the caller's to absorb.
#[async_trait]
pub trait GitHubClient: Send + Sync {
    /// Fetch a user's public profile
    ///
    /// # Returns
    ///
    /// `None` when GitHub has no such user.
    async fn fetch_user(&self, username: &str) -> anyhow::Result<Option<UserResponse>>;

    /// Fetch the first page (up to 100) of a user's owned repositories
    async fn fetch_repos(&self, username: &str) -> anyhow::Result<Vec<RepoResponse>>;

    /// Run a search query and return its `total_count`
    async fn search_count(&self, query: &SearchQuery) -> anyhow::Result<u64>;
}
