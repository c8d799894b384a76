//! GitHub token resolution
//!
//! The upstream client authenticates every request with a bearer token.
//! [`TokenResolver`] finds that token.

use anyhow::{Context, Result};
use log::debug;

/// Fallback environment variable checked after the configured one
const FALLBACK_TOKEN_ENV: &str = "GH_TOKEN";

/// Resolves the GitHub token
///
/// Tries multiple sources in order:
/// 1. The configured env var (default `GITHUB_TOKEN`)
/// 2. `GH_TOKEN`
/// 3. `gh auth token` command
#[derive(Debug, Clone)]
pub struct TokenResolver {
    token_env: String,
}

impl Default for TokenResolver {
    fn default() -> Self {
        Self::new("GITHUB_TOKEN")
    }
}

impl TokenResolver {
    pub fn new(token_env: impl Into<String>) -> Self {
        Self {
            token_env: token_env.into(),
        }
    }

    /// Name of the primary token variable
    pub fn token_env(&self) -> &str {
        &self.token_env
    }

    /// Token from the environment only, without spawning `gh`
    pub fn env_token(&self) -> Option<String> {
        [self.token_env.as_str(), FALLBACK_TOKEN_ENV]
            .into_iter()
            .find_map(|key| {
                std::env::var(key)
                    .ok()
                    .filter(|token| !token.trim().is_empty())
                    .inspect(|_| debug!("Using token from env var {}", key))
            })
    }

    /// Get a token, falling back to the gh CLI
    pub async fn get_token(&self) -> Result<String> {
        if let Some(token) = self.env_token() {
            return Ok(token);
        }

        debug!("Trying gh auth token");
        let output = tokio::process::Command::new("gh")
            .args(["auth", "token"])
            .output()
            .await
            .context("Failed to run 'gh auth token'")?;

        if output.status.success() {
            let token = String::from_utf8(output.stdout)
                .context("Invalid UTF-8 in gh auth token output")?
                .trim()
                .to_string();
            if !token.is_empty() {
                debug!("Using token from gh CLI");
                return Ok(token);
            }
        }

        Err(anyhow::anyhow!(
            "No GitHub token found. Set {} or run 'gh auth login'",
            self.token_env
        ))
    }
}
