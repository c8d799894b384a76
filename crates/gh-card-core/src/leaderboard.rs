//! Leaderboard ranking
//!
//! Ranks are recomputed in one pass over all scored users: highest score
//! first, equal scores in registration order, ranks `1..=N` without gaps or
//! duplicates. Between two refreshes a rank can lag behind the score.

use crate::error::StoreError;
use crate::score::Grade;
use crate::store::{RankedUser, RowStore};
use chrono::{DateTime, Utc};
use gh_api_cache::Clock;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const LAST_REFRESH_KEY: &str = "leaderboard_last_refresh";

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub rank: u64,
    pub contribution_score: u64,
    pub contribution_grade: Grade,
}

impl From<RankedUser> for LeaderboardEntry {
    fn from(user: RankedUser) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            rank: user.rank,
            contribution_score: user.contribution_score,
            contribution_grade: Grade::from_score(user.contribution_score),
        }
    }
}

pub struct LeaderboardRanker {
    rows: Arc<dyn RowStore>,
    clock: Arc<dyn Clock>,
}

impl LeaderboardRanker {
    pub fn new(rows: Arc<dyn RowStore>, clock: Arc<dyn Clock>) -> Self {
        Self { rows, clock }
    }

    /// Recompute every rank and return the number of users ranked
    pub fn refresh(&self) -> Result<usize, StoreError> {
        let mut users = self.rows.scored_users()?;
        // The store already orders rows; a stable sort keeps that order for ties
        users.sort_by(|a, b| b.contribution_score.cmp(&a.contribution_score));

        let ranks: Vec<(i64, u64)> = users
            .iter()
            .enumerate()
            .map(|(index, user)| (user.user_id, index as u64 + 1))
            .collect();

        let updated = self.rows.assign_ranks(&ranks)?;
        let now = self.clock.now();
        self.rows
            .set_metadata(LAST_REFRESH_KEY, &now.timestamp_millis().to_string())?;

        info!("Leaderboard refreshed: {} users ranked", updated);
        Ok(updated)
    }

    pub fn get_rank(&self, user_id: i64) -> Result<Option<u64>, StoreError> {
        Ok(self.rows.ranked_user(user_id)?.map(|user| user.rank))
    }

    pub fn entry(&self, user_id: i64) -> Result<Option<LeaderboardEntry>, StoreError> {
        Ok(self.rows.ranked_user(user_id)?.map(LeaderboardEntry::from))
    }

    /// Ranked users ordered by rank
    pub fn list(&self, limit: usize, offset: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        Ok(self
            .rows
            .ranked_page(limit, offset)?
            .into_iter()
            .map(LeaderboardEntry::from)
            .collect())
    }

    pub fn total_ranked(&self) -> Result<u64, StoreError> {
        self.rows.count_ranked()
    }

    /// Time of the last completed refresh
    pub fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let Some(raw) = self.rows.get_metadata(LAST_REFRESH_KEY)? else {
            return Ok(None);
        };

        match raw.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis) {
            Some(at) => Ok(Some(at)),
            None => {
                warn!("Ignoring malformed leaderboard refresh time: {:?}", raw);
                Ok(None)
            }
        }
    }
}
