use thiserror::Error;

/// Errors raised by a cache tier or key-value store
///
/// These never escape [`crate::CacheManager`]; they only decide whether the
/// next tier is tried.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store failed or is unreachable
    #[error("cache backend error: {0}")]
    Backend(String),

    /// The backing store did not answer in time
    #[error("cache backend timed out after {0} ms")]
    Timeout(u128),

    /// A stored value could not be encoded or decoded
    #[error("malformed cache entry: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Backend(err.to_string())
    }
}
