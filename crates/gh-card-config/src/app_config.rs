//! Application configuration
//!
//! Configuration loaded from .gh-card.toml file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from .gh-card.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// GitHub REST API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Value sent in the `X-GitHub-Api-Version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Environment variable holding the GitHub token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Upper bound for a single upstream request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// SQLite database path (defaults to the platform data directory)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Age after which a stored snapshot is refetched
    #[serde(default = "default_snapshot_max_age_hours")]
    pub snapshot_max_age_hours: u64,

    /// Minimum time between opportunistic leaderboard recomputes
    #[serde(default = "default_leaderboard_refresh_minutes")]
    pub leaderboard_refresh_minutes: u64,

    /// Rows returned when no leaderboard limit is given
    #[serde(default = "default_leaderboard_default_limit")]
    pub leaderboard_default_limit: usize,

    /// How far back the commit search looks
    #[serde(default = "default_commit_window_days")]
    pub commit_window_days: u64,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// `[cache]` section
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheConfig {
    /// Capacity of the in-process LRU tier
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Key prefix for entries in the durable store
    #[serde(default = "default_cache_namespace")]
    pub namespace: String,

    /// Enables the durable tier at the platform cache directory
    #[serde(default)]
    pub persistent: bool,

    /// Enables the durable tier at this file, overriding the default location
    #[serde(default)]
    pub remote_path: Option<PathBuf>,

    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,

    #[serde(default = "default_profile_ttl_secs")]
    pub profile_ttl_secs: u64,

    #[serde(default = "default_repos_ttl_secs")]
    pub repos_ttl_secs: u64,

    #[serde(default = "default_search_ttl_secs")]
    pub search_ttl_secs: u64,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_api_version() -> String {
    "2022-11-28".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_request_timeout_secs() -> u64 {
    8
}

fn default_snapshot_max_age_hours() -> u64 {
    24
}

fn default_leaderboard_refresh_minutes() -> u64 {
    60
}

fn default_leaderboard_default_limit() -> usize {
    100
}

fn default_commit_window_days() -> u64 {
    365
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_cache_namespace() -> String {
    "gh-card:".to_string()
}

fn default_remote_timeout_ms() -> u64 {
    2000
}

fn default_profile_ttl_secs() -> u64 {
    60 * 60
}

fn default_repos_ttl_secs() -> u64 {
    60 * 60
}

fn default_search_ttl_secs() -> u64 {
    30 * 60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_version: default_api_version(),
            token_env: default_token_env(),
            request_timeout_secs: default_request_timeout_secs(),
            database_path: None,
            snapshot_max_age_hours: default_snapshot_max_age_hours(),
            leaderboard_refresh_minutes: default_leaderboard_refresh_minutes(),
            leaderboard_default_limit: default_leaderboard_default_limit(),
            commit_window_days: default_commit_window_days(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            namespace: default_cache_namespace(),
            persistent: false,
            remote_path: None,
            remote_timeout_ms: default_remote_timeout_ms(),
            profile_ttl_secs: default_profile_ttl_secs(),
            repos_ttl_secs: default_repos_ttl_secs(),
            search_ttl_secs: default_search_ttl_secs(),
        }
    }
}

impl AppConfig {
    /// Load config from CWD first, then home directory, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match Self::parse(&content) {
                Ok(config) => {
                    log::info!("Loaded app config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}", e);
                }
            }
        }

        log::debug!("Using default app config");
        Self::default()
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn snapshot_max_age(&self) -> Duration {
        Duration::from_secs(self.snapshot_max_age_hours * 60 * 60)
    }

    pub fn leaderboard_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.leaderboard_refresh_minutes * 60)
    }

    /// Configured database path, or the platform default
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => crate::default_database_path(),
        }
    }
}

impl CacheConfig {
    /// File backing the durable tier, `None` when the tier is disabled
    pub fn remote_store_path(&self) -> anyhow::Result<Option<PathBuf>> {
        match &self.remote_path {
            Some(path) => Ok(Some(path.clone())),
            None if self.persistent => crate::default_remote_cache_path().map(Some),
            None => Ok(None),
        }
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }

    pub fn repos_ttl(&self) -> Duration {
        Duration::from_secs(self.repos_ttl_secs)
    }

    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_secs)
    }
}
