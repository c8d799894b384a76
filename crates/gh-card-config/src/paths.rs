//! Data and cache file locations
//!
//! Uses XDG directories via `dirs` crate.
//!
//! Platform-specific locations:
//! - Linux: `~/.local/share/gh-card/`, `~/.cache/gh-card/`
//! - macOS: `~/Library/Application Support/gh-card/`, `~/Library/Caches/gh-card/`
//! - Windows: `%APPDATA%\gh-card\`, `%LOCALAPPDATA%\gh-card\`

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_NAME: &str = "gh-card";

/// Get the application data directory, creating it if needed
pub fn data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("Could not determine data directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the application cache directory, creating it if needed
pub fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// SQLite database holding snapshots and leaderboard ranks
pub fn default_database_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("gh-card.db"))
}

/// JSON file used as the durable cache store
pub fn default_remote_cache_path() -> Result<PathBuf> {
    Ok(cache_dir()?.join("api-cache.json"))
}
