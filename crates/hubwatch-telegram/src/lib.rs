//! Telegram bot for Hubwatch.
//!
//! This crate provides a Telegram bot that posts new commits from watched
//! GitHub accounts to chats and serves repository files as documents.
//!
//! # Features
//!
//! - Watch a GitHub account's repositories from any chat the bot can post to
//! - New default-branch commits are posted once per change, never on first sight
//! - Download single files from github.com repositories
//!
//! # Environment Variables
//!
//! Required:
//! - `GITHUB_TOKEN`: GitHub personal access token
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//!
//! Optional:
//! - `HUBWATCH_POLL_INTERVAL_SECS`: Seconds between update checks (default: 60)
//! - `GITHUB_API_URL`: GitHub REST API base URL
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hubwatch_core::{Config, GitHubClient};
//! use hubwatch_telegram::HubwatchBot;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let host = Arc::new(GitHubClient::new(&config.github_token)?);
//!     let bot = HubwatchBot::new(&config, host)?;
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Commands
//!
//! - `/start` - Welcome message
//! - `/help` - Show available commands
//! - `/setup_github_updates <channel|here> <username>` - Watch an account
//! - `/get_file <repo_url> <file_path>` - Download a file
//! - `/ping` - Report round-trip latency
//! - `/status` - List watched accounts

pub mod bot;
pub mod error;
pub mod handlers;
pub mod notifications;
pub mod poller;
pub mod state;

pub use bot::HubwatchBot;
pub use error::{BotError, Result};
pub use handlers::{Command, HandlerContext};
pub use notifications::{render_notification, ChannelSink, ChannelTarget, TelegramSink};
pub use poller::{TickReport, UpdatePoller};
pub use state::{create_shared_state, decide, CursorDecision, WatchState};
