//! Contribution score and grade
//!
//! The score is a weighted sum of raw counters plus a few normalized terms
//! (stars per repository, pull requests per repository, followers per year
//! of account age, overall activity). The grade buckets the score.

use chrono::{DateTime, Utc};
use gh_client::{ContributionFields, ProfileFields};
use serde::{Deserialize, Serialize};
use std::fmt;

const STARS_WEIGHT: f64 = 1.5;
const COMMITS_WEIGHT: f64 = 0.2;
const PULL_REQUESTS_WEIGHT: f64 = 5.0;
const ISSUES_WEIGHT: f64 = 1.5;
const REVIEWS_WEIGHT: f64 = 3.0;
const FOLLOWERS_WEIGHT: f64 = 1.0;
const FOLLOWING_WEIGHT: f64 = 0.5;
const PUBLIC_REPOS_WEIGHT: f64 = 2.0;
const ACCOUNT_AGE_WEIGHT: f64 = 20.0;
const REPO_QUALITY_WEIGHT: f64 = 10.0;
const COLLABORATION_WEIGHT: f64 = 15.0;
const FOLLOWER_IMPACT_WEIGHT: f64 = 2.0;
const ACTIVITY_WEIGHT: f64 = 0.5;

const MAX_ACCOUNT_AGE_YEARS: f64 = 10.0;
const MAX_REPO_QUALITY: f64 = 20.0;
const MAX_COLLABORATION: f64 = 5.0;
const MAX_FOLLOWER_IMPACT: f64 = 50.0;

const DAYS_PER_YEAR: f64 = 365.25;

/// Counters the score is computed from
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
    pub stars: u64,
    pub commits: u64,
    pub pull_requests: u64,
    pub issues: u64,
    pub reviews: u64,
    pub followers: u64,
    pub following: u64,
    pub public_repos: u64,
    pub account_age_years: f64,
}

impl ScoreInputs {
    pub fn from_fields(
        profile: &ProfileFields,
        contributions: &ContributionFields,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            stars: contributions.total_stars,
            commits: contributions.commits,
            pull_requests: contributions.pull_requests,
            issues: contributions.issues,
            reviews: contributions.reviews,
            followers: profile.followers,
            following: profile.following,
            public_repos: profile.public_repos,
            account_age_years: account_age_years(profile.created_at, now),
        }
    }
}

/// Years between account creation and `now`; zero when unknown or in the future
pub fn account_age_years(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    created_at
        .map(|created| (now - created).num_seconds() as f64 / (DAYS_PER_YEAR * 86_400.0))
        .unwrap_or(0.0)
        .max(0.0)
}

/// Weighted contribution score, rounded to the nearest integer
pub fn contribution_score(inputs: &ScoreInputs) -> u64 {
    let stars = inputs.stars as f64;
    let commits = inputs.commits as f64;
    let pull_requests = inputs.pull_requests as f64;
    let issues = inputs.issues as f64;
    let reviews = inputs.reviews as f64;
    let followers = inputs.followers as f64;
    let following = inputs.following as f64;
    let public_repos = inputs.public_repos as f64;
    let age = inputs.account_age_years.max(0.0);

    // Ratios divide by at least one repository / one year
    let repo_divisor = public_repos.max(1.0);
    let age_divisor = age.max(1.0);

    let repo_quality = (stars / repo_divisor).min(MAX_REPO_QUALITY);
    let collaboration = (pull_requests / repo_divisor).min(MAX_COLLABORATION);
    let follower_impact = (followers / age_divisor).min(MAX_FOLLOWER_IMPACT);
    let activity = commits + 5.0 * pull_requests + 2.0 * issues + 3.0 * reviews;

    let score = stars * STARS_WEIGHT
        + commits * COMMITS_WEIGHT
        + pull_requests * PULL_REQUESTS_WEIGHT
        + issues * ISSUES_WEIGHT
        + reviews * REVIEWS_WEIGHT
        + followers * FOLLOWERS_WEIGHT
        + following * FOLLOWING_WEIGHT
        + public_repos * PUBLIC_REPOS_WEIGHT
        + age.min(MAX_ACCOUNT_AGE_YEARS) * ACCOUNT_AGE_WEIGHT
        + repo_quality * REPO_QUALITY_WEIGHT
        + collaboration * COLLABORATION_WEIGHT
        + follower_impact * FOLLOWER_IMPACT_WEIGHT
        + activity * ACTIVITY_WEIGHT;

    score.round().max(0.0) as u64
}

/// Letter grade of a contribution score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "S+")]
    SPlus,
    S,
    A,
    B,
    C,
    D,
    E,
}

/// Lower bound of each band, highest first
const GRADE_BANDS: [(u64, Grade); 6] = [
    (3000, Grade::SPlus),
    (1500, Grade::S),
    (800, Grade::A),
    (400, Grade::B),
    (200, Grade::C),
    (100, Grade::D),
];

impl Grade {
    pub fn from_score(score: u64) -> Self {
        GRADE_BANDS
            .iter()
            .find(|(threshold, _)| score >= *threshold)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::E)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::SPlus => "S+",
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
