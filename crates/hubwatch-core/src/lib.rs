//! Hubwatch Core - GitHub access and shared plumbing for the bot.
//!
//! - **attachment**: Scoped temporary files for attachment delivery
//! - **config**: Configuration paths and environment settings
//! - **fetch**: Fetch a single file from a repository URL
//! - **github**: The `CodeHost` trait and its GitHub REST client
//! - **repo_url**: Validation of github.com repository URLs

pub mod attachment;
pub mod config;
pub mod fetch;
pub mod github;
pub mod repo_url;

// Re-export commonly used items for convenience
pub use attachment::StagedFile;
pub use config::{config_dir, env_file, load_env_files, state_dir, Config, ConfigError};
pub use fetch::{fetch_file, fetch_file_in, FetchFileError};
pub use github::{CodeHost, GitHubClient, GitHubError};
pub use repo_url::{parse_repo_url, RepoUrlError, GITHUB_HOST};
