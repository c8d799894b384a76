//! Profile and contribution fetching
//!
//! Fans out to every endpoint at once. A failed contribution endpoint only
//! zeroes its own counter; a failed profile request is reported to the
//! caller, since it cannot be told apart from real data otherwise.

use crate::client::GitHubClient;
use crate::types::{ContributionFields, ProfileFields, SearchQuery};
use chrono::Duration;
use gh_api_cache::Clock;
use log::{debug, error, info};
use std::sync::Arc;

/// How far back the commit search looks by default
pub const DEFAULT_COMMIT_WINDOW_DAYS: i64 = 365;

/// Collects a user's profile and contribution counters
#[derive(Clone)]
pub struct ProfileFetcher<C: GitHubClient> {
    client: C,
    clock: Arc<dyn Clock>,
    commit_window: Duration,
}

impl<C: GitHubClient> ProfileFetcher<C> {
    pub fn new(client: C, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            clock,
            commit_window: Duration::days(DEFAULT_COMMIT_WINDOW_DAYS),
        }
    }

    pub fn with_commit_window(mut self, window: Duration) -> Self {
        self.commit_window = window;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch the user's profile
    ///
    /// An unknown user yields [`ProfileFields::fallback`]; only a failed
    /// request is an error.
    pub async fn fetch_profile(&self, username: &str) -> anyhow::Result<ProfileFields> {
        match self.client.fetch_user(username).await {
            Ok(Some(user)) => Ok(ProfileFields::from(user)),
            Ok(None) => {
                info!("GitHub user {} not found, using empty profile", username);
                Ok(ProfileFields::fallback(username))
            }
            Err(e) => {
                error!("Failed to fetch profile for {}: {:#}", username, e);
                Err(e)
            }
        }
    }

    /// Fetch star, commit, PR, issue and review counts
    ///
    /// Never fails: each counter whose endpoint failed is zero.
    pub async fn fetch_contributions(&self, username: &str) -> ContributionFields {
        let since = (self.clock.now() - self.commit_window).date_naive();
        let commits = SearchQuery::Commits {
            author: username.to_string(),
            since,
        };
        let pull_requests = SearchQuery::PullRequests {
            author: username.to_string(),
        };
        let issues = SearchQuery::Issues {
            author: username.to_string(),
        };
        let reviews = SearchQuery::Reviews {
            reviewer: username.to_string(),
        };

        let (total_stars, commits, pull_requests, issues, reviews) = tokio::join!(
            self.total_stars(username),
            self.count(username, &commits),
            self.count(username, &pull_requests),
            self.count(username, &issues),
            self.count(username, &reviews),
        );

        let fields = ContributionFields {
            total_stars,
            commits,
            pull_requests,
            issues,
            reviews,
        };
        debug!("Contributions for {}: {:?}", username, fields);
        fields
    }

    /// Fetch profile and contributions concurrently
    pub async fn fetch_all(
        &self,
        username: &str,
    ) -> (anyhow::Result<ProfileFields>, ContributionFields) {
        tokio::join!(
            self.fetch_profile(username),
            self.fetch_contributions(username)
        )
    }

    async fn total_stars(&self, username: &str) -> u64 {
        match self.client.fetch_repos(username).await {
            Ok(repos) => repos.iter().map(|r| r.stargazers_count).sum(),
            Err(e) => {
                error!("Failed to fetch repositories for {}: {:#}", username, e);
                0
            }
        }
    }

    async fn count(&self, username: &str, query: &SearchQuery) -> u64 {
        match self.client.search_count(query).await {
            Ok(count) => count,
            Err(e) => {
                error!(
                    "Failed to count {} for {}: {:#}",
                    query.label(),
                    username,
                    e
                );
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RepoResponse, UserResponse};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use gh_api_cache::ManualClock;
    use std::sync::Mutex;

    /// Mock client with a failure switch per endpoint
    #[derive(Default)]
    struct MockClient {
        user: Option<UserResponse>,
        fail_user: bool,
        fail_repos: bool,
        fail_commits: bool,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GitHubClient for MockClient {
        async fn fetch_user(&self, _username: &str) -> anyhow::Result<Option<UserResponse>> {
            if self.fail_user {
                anyhow::bail!("timed out");
            }
            Ok(self.user.clone())
        }

        async fn fetch_repos(&self, _username: &str) -> anyhow::Result<Vec<RepoResponse>> {
            if self.fail_repos {
                anyhow::bail!("500 Internal Server Error");
            }
            Ok(vec![
                RepoResponse {
                    name: "a".to_string(),
                    stargazers_count: 10,
                },
                RepoResponse {
                    name: "b".to_string(),
                    stargazers_count: 32,
                },
            ])
        }

        async fn search_count(&self, query: &SearchQuery) -> anyhow::Result<u64> {
            self.queries.lock().unwrap().push(query.q());
            match query {
                SearchQuery::Commits { .. } if self.fail_commits => {
                    anyhow::bail!("403 rate limited")
                }
                SearchQuery::Commits { .. } => Ok(250),
                SearchQuery::PullRequests { .. } => Ok(40),
                SearchQuery::Issues { .. } => Ok(12),
                SearchQuery::Reviews { .. } => Ok(7),
            }
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap(),
        ))
    }

    fn user() -> UserResponse {
        serde_json::from_str(
            r#"{"login": "octocat", "name": "The Octocat", "public_repos": 2,
                "followers": 50, "following": 3, "created_at": "2014-06-30T00:00:00Z"}"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_all_endpoints_succeed() {
        let fetcher = ProfileFetcher::new(
            MockClient {
                user: Some(user()),
                ..Default::default()
            },
            clock(),
        );

        let (profile, contributions) = fetcher.fetch_all("octocat").await;
        let profile = profile.unwrap();
        assert_eq!(profile.name, "The Octocat");
        assert_eq!(profile.followers, 50);
        assert_eq!(
            contributions,
            ContributionFields {
                total_stars: 42,
                commits: 250,
                pull_requests: 40,
                issues: 12,
                reviews: 7,
            }
        );
    }

    #[tokio::test]
    async fn test_commit_search_failure_zeroes_only_commits() {
        let fetcher = ProfileFetcher::new(
            MockClient {
                fail_commits: true,
                ..Default::default()
            },
            clock(),
        );

        let contributions = fetcher.fetch_contributions("octocat").await;
        assert_eq!(contributions.commits, 0);
        assert_eq!(contributions.total_stars, 42);
        assert_eq!(contributions.pull_requests, 40);
        assert_eq!(contributions.issues, 12);
        assert_eq!(contributions.reviews, 7);
    }

    #[tokio::test]
    async fn test_repo_failure_zeroes_stars() {
        let fetcher = ProfileFetcher::new(
            MockClient {
                fail_repos: true,
                ..Default::default()
            },
            clock(),
        );

        let contributions = fetcher.fetch_contributions("octocat").await;
        assert_eq!(contributions.total_stars, 0);
        assert_eq!(contributions.commits, 250);
    }

    #[tokio::test]
    async fn test_missing_user_gets_fallback_profile() {
        let fetcher = ProfileFetcher::new(MockClient::default(), clock());

        let profile = fetcher.fetch_profile("nobody-here").await.unwrap();
        assert_eq!(profile, ProfileFields::fallback("nobody-here"));
    }

    #[tokio::test]
    async fn test_profile_error_is_not_a_missing_user() {
        let fetcher = ProfileFetcher::new(
            MockClient {
                user: Some(user()),
                fail_user: true,
                ..Default::default()
            },
            clock(),
        );

        let (profile, contributions) = fetcher.fetch_all("octocat").await;
        let err = profile.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert_eq!(contributions.total_stars, 42);
        assert_eq!(contributions.commits, 250);
    }

    #[tokio::test]
    async fn test_commit_window_sets_search_date() {
        let fetcher = ProfileFetcher::new(MockClient::default(), clock())
            .with_commit_window(Duration::days(30));

        fetcher.fetch_contributions("octocat").await;

        let queries = fetcher.client().queries.lock().unwrap().clone();
        assert!(queries.contains(&"author:octocat author-date:>=2024-05-31".to_string()));
        assert_eq!(queries.len(), 4);
    }
}
