use thiserror::Error;

/// Failure of the durable row store
///
/// Unlike upstream and cache failures these reach the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored snapshot is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

/// Errors returned by the outward service interface
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid GitHub username: {0:?}")]
    InvalidUsername(String),

    #[error("GitHub data unavailable: {0}")]
    Store(#[from] StoreError),

    /// The profile request failed and no earlier snapshot exists
    #[error("GitHub data unavailable: {0}")]
    Upstream(String),
}
