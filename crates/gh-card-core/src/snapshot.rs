use crate::score::{contribution_score, Grade, ScoreInputs};
use chrono::{DateTime, Utc};
use gh_client::{ContributionFields, ProfileFields};
use serde::{Deserialize, Serialize};

/// Everything known about one user at one point in time
///
/// Stored as a JSON document; the score is also kept in its own column so
/// the leaderboard can sort without decoding documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubSnapshot {
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
    pub total_stars: u64,
    pub contribution_score: u64,
    pub contribution_grade: Grade,
    pub commits: u64,
    pub pull_requests: u64,
    pub issues: u64,
    pub reviews: u64,
}

impl GitHubSnapshot {
    /// Assemble a snapshot and score it as of `now`
    pub fn compute(
        profile: ProfileFields,
        contributions: ContributionFields,
        now: DateTime<Utc>,
    ) -> Self {
        let score = contribution_score(&ScoreInputs::from_fields(&profile, &contributions, now));

        Self {
            login: profile.login,
            name: profile.name,
            avatar_url: profile.avatar_url,
            bio: profile.bio,
            blog: profile.blog,
            location: profile.location,
            twitter_username: profile.twitter_username,
            public_repos: profile.public_repos,
            followers: profile.followers,
            following: profile.following,
            created_at: profile.created_at,
            total_stars: contributions.total_stars,
            contribution_score: score,
            contribution_grade: Grade::from_score(score),
            commits: contributions.commits,
            pull_requests: contributions.pull_requests,
            issues: contributions.issues,
            reviews: contributions.reviews,
        }
    }
}
