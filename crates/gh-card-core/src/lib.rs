//! Contribution scoring and leaderboard for GitHub profiles
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              GitHubDataService                │
//! │  - get_user_github_data()                     │
//! │  - get_full_leaderboard()                     │
//! │  - refresh_leaderboard()                      │
//! │  - cleanup_expired_cache() / metrics          │
//! └───────────────────────────────────────────────┘
//!        │                  │                 │
//!        ▼                  ▼                 ▼
//! ┌──────────────┐ ┌─────────────────┐ ┌──────────────────┐
//! │ProfileFetcher│ │PersistentSnapshot│ │LeaderboardRanker │
//! │ (gh-client)  │ │     Store        │ │                  │
//! └──────────────┘ └─────────────────┘ └──────────────────┘
//!                           │                 │
//!                           └────────┬────────┘
//!                                    ▼
//!                           ┌─────────────────┐
//!                           │  RowStore trait │
//!                           │ (SqliteRowStore)│
//!                           └─────────────────┘
//! ```
//!
//! Upstream and cache failures degrade to zero-valued fields or cache
//! misses. Only row store failures reach the caller, as [`StoreError`].

pub mod error;
pub mod leaderboard;
pub mod score;
pub mod service;
pub mod snapshot;
pub mod snapshot_store;
pub mod store;

pub use error::{ServiceError, StoreError};
pub use leaderboard::{LeaderboardEntry, LeaderboardRanker};
pub use score::{contribution_score, Grade, ScoreInputs};
pub use service::{
    FullLeaderboard, GitHubDataService, RefreshSummary, ServiceSettings, UserDataResponse,
};
pub use snapshot::GitHubSnapshot;
pub use snapshot_store::PersistentSnapshotStore;
pub use store::{RankedUser, RowStore, ScoredUser, SqliteRowStore, StoredSnapshot};
