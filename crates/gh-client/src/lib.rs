//! GitHub API client with caching support
//!
//! This crate provides a trait-based GitHub API client with optional caching,
//! plus the [`ProfileFetcher`] that turns the individual endpoints into a
//! user's profile and contribution counters.
//! The design follows the decorator pattern, allowing caching behavior to be
//! composed with the base client.
//!
//! # Architecture
//!
//! ```text
//!                ┌──────────────────────┐
//!                │   ProfileFetcher     │
//!                │  - fetch_profile()   │
//!                │  - fetch_contributions()
//!                └──────────────────────┘
//!                           │
//! ┌─────────────────────────────────────────────────┐
//! │              GitHubClient trait                  │
//! │  - fetch_user()                                  │
//! │  - fetch_repos()                                 │
//! │  - search_count()                                │
//! └─────────────────────────────────────────────────┘
//!                        │
//!        ┌───────────────┴───────────────┐
//!        ▼                               ▼
//! ┌─────────────────┐         ┌─────────────────────┐
//! │ OctocrabClient  │         │ CachedGitHubClient  │
//! │ (direct API)    │◄────────│ (decorator)         │
//! └─────────────────┘         └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use gh_client::{CacheMode, CachedGitHubClient, ConnectionSettings, OctocrabClient, ProfileFetcher};
//! use gh_api_cache::{CacheManager, CacheMetrics, SystemClock};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let direct = OctocrabClient::connect("token".to_string(), &ConnectionSettings::default())?;
//!
//! let cache = Arc::new(CacheManager::new(
//!     Arc::new(CacheMetrics::default()),
//!     Arc::new(SystemClock),
//! ));
//! let cached = CachedGitHubClient::new(direct, cache, CacheMode::ReadWrite);
//!
//! let fetcher = ProfileFetcher::new(cached, Arc::new(SystemClock));
//! let (profile, contributions) = fetcher.fetch_all("octocat").await;
//! println!("{} has {} stars", profile?.login, contributions.total_stars);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cached_client;
pub mod client;
pub mod fetcher;
pub mod octocrab_client;
pub mod types;

/// Default REST API base URL (public GitHub)
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// REST API version sent with every request
pub const DEFAULT_API_VERSION: &str = "2022-11-28";

pub use auth::TokenResolver;
pub use cached_client::{CacheTtls, CachedGitHubClient};
pub use client::{CacheMode, GitHubClient};
pub use fetcher::ProfileFetcher;
pub use octocrab_client::{ConnectionSettings, OctocrabClient};
pub use types::{
    ContributionFields, ProfileFields, RepoResponse, SearchQuery, SearchResponse, UserResponse,
};
