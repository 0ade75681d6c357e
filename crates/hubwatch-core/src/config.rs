//! Shared configuration for Hubwatch.
//!
//! Provides the directory layout used for secrets and the runtime settings
//! read from the environment.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.hubwatch/
//! └── config/
//!     └── .env.local    # GITHUB_TOKEN, TELEGRAM_BOT_TOKEN
//! ```
//!
//! Nothing else is written to disk: subscriptions and commit cursors live in
//! memory for the lifetime of the process.
//!
//! # Environment Variables
//!
//! - `GITHUB_TOKEN`: GitHub personal access token (required)
//! - `TELEGRAM_BOT_TOKEN`: Telegram bot token
//! - `HUBWATCH_POLL_INTERVAL_SECS`: Seconds between poll ticks (default: 60)
//! - `GITHUB_API_URL`: GitHub REST API base URL (default: https://api.github.com)
//! - `HUBWATCH_STATE_DIR`: Override the base directory
//! - `HUBWATCH_CONFIG_DIR`: Override the config directory

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "HUBWATCH_STATE_DIR";

/// Environment variable for custom config directory.
pub const CONFIG_DIR_ENV: &str = "HUBWATCH_CONFIG_DIR";

/// Environment variable holding the GitHub personal access token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable holding the Telegram bot token.
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable for the poll interval in seconds.
pub const POLL_INTERVAL_ENV: &str = "HUBWATCH_POLL_INTERVAL_SECS";

/// Environment variable for the GitHub API base URL.
pub const GITHUB_API_URL_ENV: &str = "GITHUB_API_URL";

/// Default GitHub REST API endpoint.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default seconds between poll ticks.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".hubwatch";

const CONFIG_SUBDIR: &str = "config";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The GitHub token is required for every operation.
    #[error("GitHub token not set. Set the GITHUB_TOKEN environment variable.")]
    MissingGithubToken,

    /// The poll interval could not be parsed or was zero.
    #[error("Invalid poll interval '{0}': expected a positive number of seconds")]
    InvalidPollInterval(String),
}

/// Get the Hubwatch state directory.
///
/// The state directory is determined by:
/// 1. `HUBWATCH_STATE_DIR` environment variable if set
/// 2. `~/.hubwatch` if home directory is available
/// 3. `.hubwatch` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the config directory.
///
/// Defaults to `~/.hubwatch/config/` or `HUBWATCH_CONFIG_DIR` env var.
pub fn config_dir() -> PathBuf {
    std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(CONFIG_SUBDIR))
}

/// Get the .env.local file path.
///
/// Environment file for secrets (API keys, tokens).
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Load secrets into the process environment.
///
/// The config directory's `.env.local` is read first, then `.env.local` or
/// `.env` in the working directory. Variables already set win.
pub fn load_env_files() {
    let env_path = env_file();
    if env_path.exists() {
        match dotenvy::from_path(&env_path) {
            Ok(()) => debug!(path = %env_path.display(), "Loaded env file"),
            Err(e) => debug!(path = %env_path.display(), error = %e, "Could not load env file"),
        }
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());
}

/// Runtime settings for the bot.
#[derive(Clone)]
pub struct Config {
    /// GitHub personal access token.
    pub github_token: String,
    /// Telegram bot token; the bot does not start without it.
    pub telegram_token: Option<String>,
    /// Time between poll ticks.
    pub poll_interval: Duration,
    /// Base URL of the GitHub REST API.
    pub github_api_url: String,
}

impl Config {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let github_token = non_empty(GITHUB_TOKEN_ENV).ok_or(ConfigError::MissingGithubToken)?;
        let telegram_token = non_empty(TELEGRAM_TOKEN_ENV);

        let poll_interval = match non_empty(POLL_INTERVAL_ENV) {
            Some(raw) => parse_interval(&raw)?,
            None => Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        };

        let github_api_url =
            non_empty(GITHUB_API_URL_ENV).unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string());

        Ok(Self {
            github_token,
            telegram_token,
            poll_interval,
            github_api_url,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("telegram_token", &self.telegram_token.as_ref().map(|_| "<set>"))
            .field("poll_interval", &self.poll_interval)
            .field("github_api_url", &self.github_api_url)
            .finish_non_exhaustive()
    }
}

/// Parse a poll interval given in whole seconds.
pub fn parse_interval(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidPollInterval(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_github_token_fails() {
        let result = Config::from_lookup(lookup(&[(TELEGRAM_TOKEN_ENV, "123:abc")]));
        assert!(matches!(result, Err(ConfigError::MissingGithubToken)));
    }

    #[test]
    fn test_blank_github_token_fails() {
        let result = Config::from_lookup(lookup(&[(GITHUB_TOKEN_ENV, "  ")]));
        assert!(matches!(result, Err(ConfigError::MissingGithubToken)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[(GITHUB_TOKEN_ENV, "ghp_x")])).unwrap();
        assert_eq!(config.github_token, "ghp_x");
        assert!(config.telegram_token.is_none());
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.github_api_url, DEFAULT_GITHUB_API_URL);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (GITHUB_TOKEN_ENV, "ghp_x"),
            (TELEGRAM_TOKEN_ENV, "123:abc"),
            (POLL_INTERVAL_ENV, "15"),
            (GITHUB_API_URL_ENV, "https://ghe.example.com/api/v3"),
        ]))
        .unwrap();
        assert_eq!(config.telegram_token.as_deref(), Some("123:abc"));
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.github_api_url, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn test_invalid_interval() {
        for raw in ["0", "-5", "soon"] {
            let result = Config::from_lookup(lookup(&[
                (GITHUB_TOKEN_ENV, "ghp_x"),
                (POLL_INTERVAL_ENV, raw),
            ]));
            assert!(
                matches!(result, Err(ConfigError::InvalidPollInterval(_))),
                "interval {raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_debug_hides_tokens() {
        let config = Config::from_lookup(lookup(&[
            (GITHUB_TOKEN_ENV, "ghp_secret"),
            (TELEGRAM_TOKEN_ENV, "123:secret"),
        ]))
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_env_file_name() {
        let file = env_file();
        assert!(file.ends_with(".env.local"));
    }
}
