//! Service wiring from configuration

use anyhow::{Context, Result};
use gh_api_cache::{CacheManager, CacheMetrics, Clock, JsonFileKvStore, SystemClock};
use gh_card_config::AppConfig;
use gh_card_core::{GitHubDataService, ServiceSettings, SqliteRowStore};
use gh_client::{
    CacheMode, CacheTtls, CachedGitHubClient, ConnectionSettings, OctocrabClient, TokenResolver,
};
use log::{debug, info};
use std::sync::Arc;

pub type Service = GitHubDataService<OctocrabClient>;

/// Build the production service: octocrab behind the two-tier cache,
/// SQLite for snapshots and ranks, wall-clock time
pub async fn build_service(config: &AppConfig) -> Result<Service> {
    let resolver = TokenResolver::new(config.token_env.clone());
    if resolver.env_token().is_none() {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded .env file from: {:?}", path),
            Err(_) => debug!(".env file not found, will rely on environment variables"),
        }
    }
    let token = resolver.get_token().await?;

    let direct = OctocrabClient::connect(token, &connection_settings(config))
        .context("Failed to initialize GitHub client")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = build_cache(config, Arc::clone(&clock))?;
    let client = CachedGitHubClient::new(direct, Arc::new(cache), CacheMode::ReadWrite)
        .with_ttls(cache_ttls(config));

    let database_path = config.database_path()?;
    info!("Using database {}", database_path.display());
    let rows = SqliteRowStore::open(&database_path)
        .with_context(|| format!("Failed to open database {}", database_path.display()))?;

    Ok(GitHubDataService::new(
        client,
        Arc::new(rows),
        clock,
        service_settings(config)?,
    ))
}

fn build_cache(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<CacheManager> {
    let metrics = Arc::new(CacheMetrics::default());
    let cache = CacheManager::with_capacity(config.cache.capacity, metrics, clock);

    Ok(match config.cache.remote_store_path()? {
        Some(path) => cache.with_remote(
            Arc::new(JsonFileKvStore::new(path)),
            config.cache.namespace.clone(),
            config.cache.remote_timeout(),
        ),
        None => cache,
    })
}

pub fn connection_settings(config: &AppConfig) -> ConnectionSettings {
    ConnectionSettings {
        api_url: config.api_url.clone(),
        api_version: config.api_version.clone(),
        timeout: config.request_timeout(),
    }
}

pub fn cache_ttls(config: &AppConfig) -> CacheTtls {
    CacheTtls {
        profile: config.cache.profile_ttl(),
        repos: config.cache.repos_ttl(),
        search: config.cache.search_ttl(),
    }
}

pub fn service_settings(config: &AppConfig) -> Result<ServiceSettings> {
    let to_chrono = |d: std::time::Duration, what: &str| {
        chrono::Duration::from_std(d).with_context(|| format!("{} is out of range", what))
    };

    Ok(ServiceSettings {
        snapshot_max_age: to_chrono(config.snapshot_max_age(), "snapshot_max_age_hours")?,
        leaderboard_refresh_interval: to_chrono(
            config.leaderboard_refresh_interval(),
            "leaderboard_refresh_minutes",
        )?,
        default_leaderboard_limit: config.leaderboard_default_limit,
        commit_window: chrono::Duration::days(
            i64::try_from(config.commit_window_days).context("commit_window_days is out of range")?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_service_settings_from_defaults() {
        let settings = service_settings(&AppConfig::default()).unwrap();
        assert_eq!(settings, ServiceSettings::default());
    }

    #[test]
    fn test_service_settings_from_custom_config() {
        let config = AppConfig::parse(
            r#"
            snapshot_max_age_hours = 6
            leaderboard_refresh_minutes = 5
            leaderboard_default_limit = 10
            commit_window_days = 30
            "#,
        )
        .unwrap();

        let settings = service_settings(&config).unwrap();
        assert_eq!(settings.snapshot_max_age, chrono::Duration::hours(6));
        assert_eq!(settings.leaderboard_refresh_interval, chrono::Duration::minutes(5));
        assert_eq!(settings.default_leaderboard_limit, 10);
        assert_eq!(settings.commit_window, chrono::Duration::days(30));
    }

    #[test]
    fn test_cache_ttls_and_connection() {
        let config = AppConfig::parse(
            r#"
            api_url = "https://ghe.example.com/api/v3"
            request_timeout_secs = 3

            [cache]
            search_ttl_secs = 60
            "#,
        )
        .unwrap();

        let ttls = cache_ttls(&config);
        assert_eq!(ttls.search, Duration::from_secs(60));
        assert_eq!(ttls.profile, Duration::from_secs(3600));

        let settings = connection_settings(&config);
        assert_eq!(settings.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(settings.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_remote_tier_enabled_by_config() {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let config = AppConfig::default();
        assert!(!build_cache(&config, Arc::clone(&clock)).unwrap().has_remote());

        let mut config = AppConfig::default();
        config.cache.remote_path = Some("/tmp/gh-card-test-cache.json".into());
        assert!(build_cache(&config, Arc::clone(&clock)).unwrap().has_remote());

        let mut config = AppConfig::default();
        config.cache.persistent = true;
        assert!(build_cache(&config, clock).unwrap().has_remote());
    }
}
