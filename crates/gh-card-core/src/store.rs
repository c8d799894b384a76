//! Durable row store
//!
//! Holds registered users with their score and rank, the latest snapshot
//! per username and a small key/value metadata table. [`RowStore`] is the
//! seam the snapshot store and the ranker program against; [`SqliteRowStore`]
//! is the production implementation.

use crate::error::StoreError;
use crate::snapshot::GitHubSnapshot;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DB_SCHEMA_VERSION: i64 = 1;

/// A snapshot together with the time it was written
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub snapshot: GitHubSnapshot,
    pub last_updated: DateTime<Utc>,
}

/// A registered user that has a score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredUser {
    pub user_id: i64,
    pub username: String,
    pub contribution_score: u64,
}

/// A ranked user as shown on the leaderboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedUser {
    pub user_id: i64,
    pub username: String,
    pub rank: u64,
    pub contribution_score: u64,
}

/// Row-oriented persistence for users, snapshots and metadata
pub trait RowStore: Send + Sync {
    /// Insert the user if unknown and return its id
    fn register_user(&self, username: &str, now: DateTime<Utc>) -> Result<i64, StoreError>;

    fn load_snapshot(&self, username: &str) -> Result<Option<StoredSnapshot>, StoreError>;

    /// Write the snapshot and copy its score to the matching user row
    fn upsert_snapshot(
        &self,
        username: &str,
        snapshot: &GitHubSnapshot,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Users with a score, highest first, ties in registration order
    fn scored_users(&self) -> Result<Vec<ScoredUser>, StoreError>;

    /// Replace the rank of every listed user; returns the number of rows written
    fn assign_ranks(&self, ranks: &[(i64, u64)]) -> Result<usize, StoreError>;

    fn ranked_page(&self, limit: usize, offset: usize) -> Result<Vec<RankedUser>, StoreError>;

    fn ranked_user(&self, user_id: i64) -> Result<Option<RankedUser>, StoreError>;

    fn count_ranked(&self) -> Result<u64, StoreError>;

    fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// SQLite-backed [`RowStore`]
pub struct SqliteRowStore {
    conn: Mutex<Connection>,
}

impl SqliteRowStore {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::InvalidData(format!(
                        "cannot create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Self::with_connection(conn)
    }

    /// Private in-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a half-applied write:
        // every multi-statement write runs in a transaction.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        warn!(
            "Database schema version {} is newer than supported version {}",
            version, DB_SCHEMA_VERSION
        );
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE COLLATE NOCASE,
            contribution_score INTEGER,
            rank INTEGER,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS github_snapshots (
            username TEXT PRIMARY KEY COLLATE NOCASE,
            data TEXT NOT NULL,
            contribution_score INTEGER NOT NULL,
            last_updated INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_users_score ON users(contribution_score DESC, id ASC);
        CREATE INDEX IF NOT EXISTS idx_users_rank ON users(rank);
        ",
    )
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::InvalidData(format!("timestamp out of range: {}", ms)))
}

fn to_score(value: i64) -> u64 {
    value.max(0) as u64
}

fn from_score(score: u64) -> i64 {
    i64::try_from(score).unwrap_or(i64::MAX)
}

fn ranked_user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RankedUser> {
    Ok(RankedUser {
        user_id: row.get(0)?,
        username: row.get(1)?,
        rank: to_score(row.get(2)?),
        contribution_score: to_score(row.get::<_, Option<i64>>(3)?.unwrap_or(0)),
    })
}

impl RowStore for SqliteRowStore {
    fn register_user(&self, username: &str, now: DateTime<Utc>) -> Result<i64, StoreError> {
        let conn = self.conn();
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO users (username, created_at) VALUES (?1, ?2)
             ON CONFLICT(username) DO NOTHING",
            params![username, to_millis(now)],
        )?;

        // Users looked up before they registered already have a snapshot
        tx.execute(
            "UPDATE users
             SET contribution_score = (
                 SELECT contribution_score FROM github_snapshots WHERE username = ?1
             )
             WHERE username = ?1
               AND contribution_score IS NULL",
            params![username],
        )?;

        let id: i64 = tx.query_row(
            "SELECT id FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )?;

        tx.commit()?;
        Ok(id)
    }

    fn load_snapshot(&self, username: &str) -> Result<Option<StoredSnapshot>, StoreError> {
        let row: Option<(String, i64)> = self
            .conn()
            .query_row(
                "SELECT data, last_updated FROM github_snapshots WHERE username = ?1",
                params![username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(data, last_updated)| -> Result<StoredSnapshot, StoreError> {
            Ok(StoredSnapshot {
                snapshot: serde_json::from_str(&data)?,
                last_updated: from_millis(last_updated)?,
            })
        })
        .transpose()
    }

    fn upsert_snapshot(
        &self,
        username: &str,
        snapshot: &GitHubSnapshot,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let data = serde_json::to_string(snapshot)?;
        let score = from_score(snapshot.contribution_score);

        let conn = self.conn();
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO github_snapshots (username, data, contribution_score, last_updated)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(username) DO UPDATE SET
                data = excluded.data,
                contribution_score = excluded.contribution_score,
                last_updated = excluded.last_updated",
            params![username, data, score, to_millis(updated_at)],
        )?;

        tx.execute(
            "UPDATE users SET contribution_score = ?1 WHERE username = ?2",
            params![score, username],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn scored_users(&self) -> Result<Vec<ScoredUser>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, username, contribution_score
             FROM users
             WHERE contribution_score IS NOT NULL
             ORDER BY contribution_score DESC, id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ScoredUser {
                user_id: row.get(0)?,
                username: row.get(1)?,
                contribution_score: to_score(row.get(2)?),
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn assign_ranks(&self, ranks: &[(i64, u64)]) -> Result<usize, StoreError> {
        let conn = self.conn();
        let tx = conn.unchecked_transaction()?;

        // Users that lost their score must not keep a stale rank
        tx.execute(
            "UPDATE users SET rank = NULL WHERE contribution_score IS NULL",
            [],
        )?;

        let mut updated = 0;
        {
            let mut stmt = tx.prepare("UPDATE users SET rank = ?1 WHERE id = ?2")?;
            for (user_id, rank) in ranks {
                updated += stmt.execute(params![from_score(*rank), user_id])?;
            }
        }

        tx.commit()?;
        Ok(updated)
    }

    fn ranked_page(&self, limit: usize, offset: usize) -> Result<Vec<RankedUser>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, username, rank, contribution_score
             FROM users
             WHERE rank IS NOT NULL
             ORDER BY rank ASC
             LIMIT ?1 OFFSET ?2",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit, offset], ranked_user_from_row)?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn ranked_user(&self, user_id: i64) -> Result<Option<RankedUser>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, username, rank, contribution_score
                 FROM users
                 WHERE id = ?1 AND rank IS NOT NULL",
                params![user_id],
                ranked_user_from_row,
            )
            .optional()?)
    }

    fn count_ranked(&self) -> Result<u64, StoreError> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM users WHERE rank IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(to_score(count))
    }

    fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gh_client::{ContributionFields, ProfileFields};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn snapshot(login: &str, stars: u64) -> GitHubSnapshot {
        GitHubSnapshot::compute(
            ProfileFields::fallback(login),
            ContributionFields {
                total_stars: stars,
                ..Default::default()
            },
            now(),
        )
    }

    #[test]
    fn test_schema_version_is_set() {
        let store = SqliteRowStore::open_in_memory().unwrap();
        let version: i64 = store
            .conn()
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, DB_SCHEMA_VERSION);
    }

    #[test]
    fn test_register_user_is_idempotent() {
        let store = SqliteRowStore::open_in_memory().unwrap();
        let first = store.register_user("octocat", now()).unwrap();
        let second = store.register_user("OctoCat", now()).unwrap();
        assert_eq!(first, second);

        let other = store.register_user("hubot", now()).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_snapshot_roundtrip_and_overwrite() {
        let store = SqliteRowStore::open_in_memory().unwrap();
        assert!(store.load_snapshot("octocat").unwrap().is_none());

        store
            .upsert_snapshot("octocat", &snapshot("octocat", 10), now())
            .unwrap();
        let later = now() + chrono::Duration::hours(1);
        store
            .upsert_snapshot("octocat", &snapshot("octocat", 20), later)
            .unwrap();

        let stored = store.load_snapshot("octocat").unwrap().unwrap();
        assert_eq!(stored.snapshot.total_stars, 20);
        assert_eq!(stored.last_updated, later);
    }

    #[test]
    fn test_snapshot_updates_user_score() {
        let store = SqliteRowStore::open_in_memory().unwrap();
        let id = store.register_user("octocat", now()).unwrap();
        assert!(store.scored_users().unwrap().is_empty());

        let snap = snapshot("octocat", 100);
        store.upsert_snapshot("octocat", &snap, now()).unwrap();

        let scored = store.scored_users().unwrap();
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].user_id, id);
        assert_eq!(scored[0].contribution_score, snap.contribution_score);
    }

    #[test]
    fn test_register_after_snapshot_adopts_score() {
        let store = SqliteRowStore::open_in_memory().unwrap();
        let snap = snapshot("octocat", 100);
        store.upsert_snapshot("octocat", &snap, now()).unwrap();

        store.register_user("octocat", now()).unwrap();
        let scored = store.scored_users().unwrap();
        assert_eq!(scored[0].contribution_score, snap.contribution_score);
    }

    #[test]
    fn test_scored_users_order_breaks_ties_by_id() {
        let store = SqliteRowStore::open_in_memory().unwrap();
        for (name, stars) in [("a", 10), ("b", 50), ("c", 10)] {
            store.register_user(name, now()).unwrap();
            store.upsert_snapshot(name, &snapshot(name, stars), now()).unwrap();
        }

        let names: Vec<String> = store
            .scored_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_ranks_and_pages() {
        let store = SqliteRowStore::open_in_memory().unwrap();
        let a = store.register_user("a", now()).unwrap();
        let b = store.register_user("b", now()).unwrap();
        let unscored = store.register_user("c", now()).unwrap();
        store.upsert_snapshot("a", &snapshot("a", 1), now()).unwrap();
        store.upsert_snapshot("b", &snapshot("b", 2), now()).unwrap();

        assert_eq!(store.assign_ranks(&[(b, 1), (a, 2)]).unwrap(), 2);
        assert_eq!(store.count_ranked().unwrap(), 2);

        let page = store.ranked_page(1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].user_id, a);
        assert_eq!(page[0].rank, 2);

        assert_eq!(store.ranked_user(b).unwrap().unwrap().rank, 1);
        assert!(store.ranked_user(unscored).unwrap().is_none());
    }

    #[test]
    fn test_metadata_upsert() {
        let store = SqliteRowStore::open_in_memory().unwrap();
        assert!(store.get_metadata("k").unwrap().is_none());
        store.set_metadata("k", "1").unwrap();
        store.set_metadata("k", "2").unwrap();
        assert_eq!(store.get_metadata("k").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_open_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gh-card.db");

        {
            let store = SqliteRowStore::open(&path).unwrap();
            store.register_user("octocat", now()).unwrap();
        }

        let store = SqliteRowStore::open(&path).unwrap();
        let id = store.register_user("octocat", now()).unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() {
        let store = SqliteRowStore::open_in_memory().unwrap();
        store
            .conn()
            .execute(
                "INSERT INTO github_snapshots (username, data, contribution_score, last_updated)
                 VALUES ('broken', 'not json', 0, 0)",
                [],
            )
            .unwrap();

        assert!(matches!(
            store.load_snapshot("broken"),
            Err(StoreError::Serialization(_))
        ));
    }
}
