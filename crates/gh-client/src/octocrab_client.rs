//! Octocrab-based GitHub API client
//!
//! Direct implementation of the `GitHubClient` trait using the octocrab library.
//! This client makes real API calls without any caching. Each call is made
//! once and bounded by a timeout.

use crate::client::GitHubClient;
use crate::types::{RepoResponse, SearchQuery, SearchResponse, UserResponse};
use crate::{DEFAULT_API_URL, DEFAULT_API_VERSION};
use anyhow::{Context, Result};
use async_trait::async_trait;
use http::header::{HeaderName, ACCEPT};
use http::StatusCode;
use log::debug;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Number of repositories read for the star sum
const REPOS_PER_PAGE: u8 = 100;

/// Connection settings for [`OctocrabClient::connect`]
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// REST API base URL
    pub api_url: String,
    /// Value of the `X-GitHub-Api-Version` header
    pub api_version: String,
    /// Upper bound for a single request
    pub timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct RepoParams {
    per_page: u8,
}

#[derive(Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    per_page: u8,
}

/// Direct GitHub API client using octocrab
///
/// This is the base implementation that makes actual API calls.
/// It can be wrapped by `CachedGitHubClient` to add caching behavior.
#[derive(Debug, Clone)]
pub struct OctocrabClient {
    octocrab: Arc<Octocrab>,
    timeout: Duration,
}

impl OctocrabClient {
    /// Create a new client with the given octocrab instance
    pub fn new(octocrab: Arc<Octocrab>) -> Self {
        Self {
            octocrab,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build an authenticated client
    ///
    /// The token is sent as a bearer credential; every request also carries
    /// the JSON accept header and the pinned API version.
    pub fn connect(token: String, settings: &ConnectionSettings) -> Result<Self> {
        let mut builder = Octocrab::builder()
            .personal_token(token)
            .add_header(ACCEPT, "application/vnd.github+json".to_string())
            .add_header(
                HeaderName::from_static("x-github-api-version"),
                settings.api_version.clone(),
            );

        if settings.api_url.trim_end_matches('/') != DEFAULT_API_URL {
            builder = builder
                .base_uri(settings.api_url.as_str())
                .context("Failed to set base URI")?;
        }

        let octocrab = builder.build().context("Failed to build Octocrab client")?;
        Ok(Self::new(Arc::new(octocrab)).with_timeout(settings.timeout))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// GET `route`, mapping "not found" answers to `None`
    async fn get_json<T, P>(&self, route: &str, params: Option<&P>) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized + Sync,
    {
        let request = self.octocrab.get::<T, _, P>(route, params);
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .with_context(|| format!("GET {} timed out after {:?}", route, self.timeout))?;

        match response {
            Ok(body) => Ok(Some(body)),
            Err(e) if is_not_found(&e) => {
                debug!("GET {} answered not found", route);
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("GET {} failed", route)),
        }
    }
}

#[async_trait]
impl GitHubClient for OctocrabClient {
    async fn fetch_user(&self, username: &str) -> Result<Option<UserResponse>> {
        debug!("Fetching profile for {}", username);
        let route = format!("/users/{}", username);
        self.get_json::<UserResponse, ()>(&route, None).await
    }

    async fn fetch_repos(&self, username: &str) -> Result<Vec<RepoResponse>> {
        debug!("Fetching repositories for {}", username);
        let route = format!("/users/{}/repos", username);
        let params = RepoParams {
            per_page: REPOS_PER_PAGE,
        };

        let repos = self
            .get_json::<Vec<RepoResponse>, _>(&route, Some(&params))
            .await?
            .unwrap_or_default();

        debug!("Fetched {} repositories for {}", repos.len(), username);
        Ok(repos)
    }

    async fn search_count(&self, query: &SearchQuery) -> Result<u64> {
        let q = query.q();
        debug!("Searching {} with q={}", query.route(), q);
        let params = SearchParams {
            q: &q,
            per_page: 1,
        };

        let count = self
            .get_json::<SearchResponse, _>(query.route(), Some(&params))
            .await?
            .map(|r| r.total_count)
            .unwrap_or(0);

        Ok(count)
    }
}

/// GitHub answers 404 for unknown users and 422 for searches qualified by
/// an unknown user
fn is_not_found(err: &octocrab::Error) -> bool {
    match err {
        octocrab::Error::GitHub { source, .. } => matches!(
            source.status_code,
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ConnectionSettings::default();
        assert_eq!(settings.api_url, "https://api.github.com");
        assert_eq!(settings.api_version, "2022-11-28");
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_search_params_encoding() {
        let params = SearchParams {
            q: "author:octocat type:pr",
            per_page: 1,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["q"], "author:octocat type:pr");
        assert_eq!(json["per_page"], 1);
    }

    #[tokio::test]
    async fn test_connect_with_enterprise_url() {
        let settings = ConnectionSettings {
            api_url: "https://ghe.example.com/api/v3".to_string(),
            timeout: Duration::from_secs(3),
            ..ConnectionSettings::default()
        };
        let client = OctocrabClient::connect("token".to_string(), &settings).unwrap();
        assert_eq!(client.timeout, Duration::from_secs(3));
    }
}
