//! Main bot implementation.

use std::sync::Arc;
use std::time::Duration;

use hubwatch_core::{CodeHost, Config};
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

use crate::error::{BotError, Result};
use crate::handlers::{handle_command, unknown_command_reply, Command, HandlerContext};
use crate::notifications::TelegramSink;
use crate::poller::UpdatePoller;
use crate::state::{create_shared_state, WatchState};

/// The Hubwatch Telegram bot.
pub struct HubwatchBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Subscriptions and commit cursors.
    state: Arc<WatchState>,
    /// Code-hosting client shared by the poller and /get_file.
    host: Arc<dyn CodeHost>,
    /// Time between poll ticks.
    poll_interval: Duration,
}

impl HubwatchBot {
    /// Create a new bot from configuration.
    ///
    /// Fails with [`BotError::NoToken`] when no Telegram token is configured.
    pub fn new(config: &Config, host: Arc<dyn CodeHost>) -> Result<Self> {
        let token = config.telegram_token.clone().ok_or(BotError::NoToken)?;

        Ok(Self {
            bot: Bot::new(token),
            state: create_shared_state(),
            host,
            poll_interval: config.poll_interval,
        })
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| BotError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Connect, start the update poller and dispatch commands until Ctrl+C.
    pub async fn run(&self) -> Result<()> {
        info!("Starting Hubwatch bot...");

        // Polling starts only once the Bot API answers.
        let username = self.get_me().await?;
        info!(username = %username, "Bot connected");

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "Failed to publish command list");
        }

        let poller = UpdatePoller::new(
            Arc::clone(&self.state),
            Arc::clone(&self.host),
            Arc::new(TelegramSink::new(self.bot.clone())),
            self.poll_interval,
        )
        .spawn();

        let ctx = Arc::new(HandlerContext {
            state: Arc::clone(&self.state),
            host: Arc::clone(&self.host),
            poll_interval: self.poll_interval,
        });

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let ctx = Arc::clone(&ctx);
                        info!(chat_id = %msg.chat.id, "Command matched: {:?}", cmd);
                        async move { handle_command(bot, msg, cmd, ctx).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        // Commands that start with / but didn't parse
                        msg.text().map(|t| t.starts_with('/')).unwrap_or(false)
                    })
                    .endpoint(|bot: Bot, msg: Message| async move {
                        if let Some(text) = msg.text() {
                            info!(cmd = %text, "Unrecognized command - sending response");
                            bot.send_message(msg.chat.id, unknown_command_reply(text))
                                .await?;
                        }
                        Ok(())
                    }),
            );

        info!("Bot is running! Send /start to begin.");

        Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|_upd| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        poller.abort();
        info!("Bot stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubwatch_core::GitHubClient;

    fn config(telegram_token: Option<&str>) -> Config {
        Config {
            github_token: "ghp_test".to_string(),
            telegram_token: telegram_token.map(str::to_string),
            poll_interval: Duration::from_secs(30),
            github_api_url: "https://api.github.com".to_string(),
        }
    }

    #[test]
    fn test_new_requires_telegram_token() {
        let host = Arc::new(GitHubClient::new("ghp_test").unwrap());
        let result = HubwatchBot::new(&config(None), host);
        assert!(matches!(result, Err(BotError::NoToken)));
    }

    #[tokio::test]
    async fn test_new_starts_with_empty_state() {
        let host = Arc::new(GitHubClient::new("ghp_test").unwrap());
        let bot = HubwatchBot::new(&config(Some("123:abc")), host).unwrap();
        assert_eq!(bot.poll_interval, Duration::from_secs(30));
        assert_eq!(bot.state.subscription_count().await, 0);
    }
}
