//! Error types for the bot.

use hubwatch_models::ChannelId;
use thiserror::Error;

/// Errors that can occur in the bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// A registered channel could not be resolved (deleted, or the bot was removed).
    #[error("Channel {channel} unavailable: {reason}")]
    ChannelUnavailable { channel: ChannelId, reason: String },

    /// A channel argument that is not a chat id, @username or `here`.
    #[error("Invalid channel '{0}'. Use a chat id, @channelname or 'here'.")]
    InvalidChannel(String),

    /// A watched account that is not a valid GitHub username.
    #[error("Invalid GitHub username '{0}'. Use letters, digits and hyphens only.")]
    InvalidAccount(String),

    /// Telegram API request error.
    #[error("Telegram error: {0}")]
    Request(String),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

impl From<teloxide::RequestError> for BotError {
    fn from(e: teloxide::RequestError) -> Self {
        BotError::Request(e.to_string())
    }
}
