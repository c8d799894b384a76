mod app;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gh_card_config::AppConfig;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "gh-card", about = "GitHub contribution scores and leaderboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a user's GitHub snapshot, fetching it when stale
    Fetch {
        username: String,
        /// Ignore stored snapshots and cached responses
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Print the leaderboard
    Leaderboard {
        #[arg(long)]
        limit: Option<usize>,
        /// Include this user id's row even when outside the limit
        #[arg(long)]
        user: Option<i64>,
    },
    /// Recompute all leaderboard ranks
    RefreshLeaderboard,
    /// Remove expired cache entries
    CleanupCache,
    /// Print cache hit/miss counters
    Metrics,
    /// Add a user to the leaderboard
    Register { username: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::load();
    let service = app::build_service(&config).await?;

    match cli.command {
        Command::Fetch { username, force } => {
            let response = if force {
                service.refresh_user_github_data(&username).await
            } else {
                service.get_user_github_data(&username).await
            };
            print_json(&response)?;
            log::debug!("Cache metrics: {:?}", service.get_cache_metrics());
            if !response.success {
                std::process::exit(1);
            }
        }
        Command::Leaderboard { limit, user } => {
            print_json(&service.get_full_leaderboard(limit, user)?)?;
        }
        Command::RefreshLeaderboard => {
            print_json(&service.refresh_leaderboard()?)?;
        }
        Command::CleanupCache => {
            let removed = service.cleanup_expired_cache().await;
            print_json(&serde_json::json!({ "removed": removed }))?;
        }
        Command::Metrics => {
            print_json(&service.get_cache_metrics())?;
        }
        Command::Register { username } => {
            let user_id = service.register_user(&username)?;
            print_json(&serde_json::json!({ "userId": user_id, "username": username }))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch_with_force() {
        let cli = Cli::try_parse_from(["gh-card", "fetch", "octocat", "--force"]).unwrap();
        match cli.command {
            Command::Fetch { username, force } => {
                assert_eq!(username, "octocat");
                assert!(force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_leaderboard_options() {
        let cli =
            Cli::try_parse_from(["gh-card", "leaderboard", "--limit", "5", "--user", "42"]).unwrap();
        match cli.command {
            Command::Leaderboard { limit, user } => {
                assert_eq!(limit, Some(5));
                assert_eq!(user, Some(42));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_kebab_case_subcommands() {
        assert!(Cli::try_parse_from(["gh-card", "refresh-leaderboard"]).is_ok());
        assert!(Cli::try_parse_from(["gh-card", "cleanup-cache"]).is_ok());
        assert!(Cli::try_parse_from(["gh-card", "metrics"]).is_ok());
        assert!(Cli::try_parse_from(["gh-card", "fetch"]).is_err());
    }
}
