//! GitHub API data transfer objects
//!
//! Response structs mirror the subset of each endpoint's JSON this crate
//! reads; they are narrowed into [`ProfileFields`] and
//! [`ContributionFields`] right after fetching.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// `GET /users/{username}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub login: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub avatar_url: String,

    #[serde(default)]
    pub bio: Option<String>,

    /// Website; GitHub sends an empty string when unset
    #[serde(default)]
    pub blog: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub twitter_username: Option<String>,

    #[serde(default)]
    pub public_repos: u64,

    #[serde(default)]
    pub followers: u64,

    #[serde(default)]
    pub following: u64,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One item of `GET /users/{username}/repos`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoResponse {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub stargazers_count: u64,
}

/// Envelope of the search endpoints; only the count is used
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total_count: u64,
}

/// A counting query against one of the search endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Commits authored since a date
    Commits { author: String, since: NaiveDate },
    /// Pull requests opened by the user
    PullRequests { author: String },
    /// Issues opened by the user
    Issues { author: String },
    /// Pull requests reviewed by the user
    Reviews { reviewer: String },
}

impl SearchQuery {
    /// API route for this query
    pub fn route(&self) -> &'static str {
        match self {
            SearchQuery::Commits { .. } => "/search/commits",
            _ => "/search/issues",
        }
    }

    /// Value of the `q` parameter
    pub fn q(&self) -> String {
        match self {
            SearchQuery::Commits { author, since } => {
                format!("author:{} author-date:>={}", author, since.format("%Y-%m-%d"))
            }
            SearchQuery::PullRequests { author } => format!("author:{} type:pr", author),
            SearchQuery::Issues { author } => format!("author:{} type:issue", author),
            SearchQuery::Reviews { reviewer } => format!("reviewed-by:{} type:pr", reviewer),
        }
    }

    /// Short label for log lines
    pub fn label(&self) -> &'static str {
        match self {
            SearchQuery::Commits { .. } => "commits",
            SearchQuery::PullRequests { .. } => "pull requests",
            SearchQuery::Issues { .. } => "issues",
            SearchQuery::Reviews { .. } => "reviews",
        }
    }
}

/// Profile part of a user's GitHub data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub login: String,
    pub name: String,
    pub avatar_url: String,
    pub bio: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub twitter_username: Option<String>,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
    pub created_at: Option<DateTime<Utc>>,
}

impl ProfileFields {
    /// Zero-valued profile used when the user is missing or the profile
    /// endpoint failed
    pub fn fallback(username: &str) -> Self {
        Self {
            login: username.to_string(),
            name: username.to_string(),
            avatar_url: String::new(),
            bio: None,
            blog: None,
            location: None,
            twitter_username: None,
            public_repos: 0,
            followers: 0,
            following: 0,
            created_at: None,
        }
    }
}

impl From<UserResponse> for ProfileFields {
    fn from(user: UserResponse) -> Self {
        let name = user
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| user.login.clone());

        Self {
            login: user.login,
            name,
            avatar_url: user.avatar_url,
            bio: non_empty(user.bio),
            blog: non_empty(user.blog),
            location: non_empty(user.location),
            twitter_username: non_empty(user.twitter_username),
            public_repos: user.public_repos,
            followers: user.followers,
            following: user.following,
            created_at: user.created_at,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Activity counters of a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionFields {
    /// Sum of stargazers over the first page of owned repositories
    pub total_stars: u64,
    pub commits: u64,
    pub pull_requests: u64,
    pub issues: u64,
    pub reviews: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_tolerates_missing_fields() {
        let json = r#"{"login": "octocat", "public_repos": 8}"#;
        let user: UserResponse = serde_json::from_str(json).unwrap();
        assert_eq!(user.login, "octocat");
        assert_eq!(user.public_repos, 8);
        assert_eq!(user.followers, 0);
        assert!(user.created_at.is_none());
    }

    #[test]
    fn test_profile_from_user_normalizes_blank_fields() {
        let json = r#"{
            "login": "octocat",
            "name": null,
            "avatar_url": "https://avatars.githubusercontent.com/u/583231",
            "bio": "",
            "blog": "https://github.blog",
            "location": "San Francisco",
            "twitter_username": null,
            "public_repos": 8,
            "followers": 20000,
            "following": 9,
            "created_at": "2011-01-25T18:44:36Z"
        }"#;
        let user: UserResponse = serde_json::from_str(json).unwrap();
        let profile = ProfileFields::from(user);

        assert_eq!(profile.name, "octocat");
        assert!(profile.bio.is_none());
        assert_eq!(profile.blog.as_deref(), Some("https://github.blog"));
        assert_eq!(profile.followers, 20000);
        assert!(profile.created_at.is_some());
    }

    #[test]
    fn test_fallback_profile_echoes_username() {
        let profile = ProfileFields::fallback("ghost-user");
        assert_eq!(profile.login, "ghost-user");
        assert_eq!(profile.name, "ghost-user");
        assert_eq!(profile.public_repos, 0);
        assert_eq!(profile.followers, 0);
        assert_eq!(profile.following, 0);
    }

    #[test]
    fn test_search_query_strings() {
        let since = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let commits = SearchQuery::Commits {
            author: "octocat".to_string(),
            since,
        };
        assert_eq!(commits.route(), "/search/commits");
        assert_eq!(commits.q(), "author:octocat author-date:>=2024-01-15");

        let prs = SearchQuery::PullRequests {
            author: "octocat".to_string(),
        };
        assert_eq!(prs.route(), "/search/issues");
        assert_eq!(prs.q(), "author:octocat type:pr");

        let issues = SearchQuery::Issues {
            author: "octocat".to_string(),
        };
        assert_eq!(issues.q(), "author:octocat type:issue");

        let reviews = SearchQuery::Reviews {
            reviewer: "octocat".to_string(),
        };
        assert_eq!(reviews.q(), "reviewed-by:octocat type:pr");
    }
}
