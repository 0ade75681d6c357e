//! Command handlers for the bot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hubwatch_core::{fetch_file, CodeHost, FetchFileError, RepoUrlError};
use hubwatch_models::ChannelId;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, ParseMode, Recipient};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use crate::error::BotError;
use crate::notifications::{chat_display_name, html_escape};
use crate::state::WatchState;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and get help")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(
        description = "Post new commits of a GitHub user to a channel: /setup_github_updates <channel|here> <username>",
        parse_with = "split"
    )]
    SetupGithubUpdates {
        channel: String,
        github_username: String,
    },

    #[command(
        description = "Get a file from a repository: /get_file <repo_url> <file_path>",
        parse_with = "split"
    )]
    GetFile { repo_url: String, file_path: String },

    #[command(description = "Check the bot's latency")]
    Ping,

    #[command(description = "Show configured GitHub updates")]
    Status,
}

/// Everything the handlers need besides the bot itself.
pub struct HandlerContext {
    pub state: Arc<WatchState>,
    pub host: Arc<dyn CodeHost>,
    pub poll_interval: Duration,
}

/// A parsed channel argument of `/setup_github_updates`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelArg {
    /// The chat the command was sent from.
    Here,
    /// A numeric chat id (channels and groups are negative).
    Id(i64),
    /// A public `@channelusername`.
    Username(String),
}

impl ChannelArg {
    fn recipient(&self, current: ChatId) -> Recipient {
        match self {
            ChannelArg::Here => Recipient::Id(current),
            ChannelArg::Id(id) => Recipient::Id(ChatId(*id)),
            ChannelArg::Username(name) => Recipient::ChannelUsername(name.clone()),
        }
    }
}

/// Parse the channel argument of `/setup_github_updates`.
pub fn parse_channel_arg(arg: &str) -> Result<ChannelArg, BotError> {
    let arg = arg.trim();

    if arg.eq_ignore_ascii_case("here") {
        return Ok(ChannelArg::Here);
    }

    if let Ok(id) = arg.parse::<i64>() {
        return Ok(ChannelArg::Id(id));
    }

    if let Some(name) = arg.strip_prefix('@') {
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            return Ok(ChannelArg::Username(arg.to_string()));
        }
    }

    Err(BotError::InvalidChannel(arg.to_string()))
}

/// GitHub caps usernames at this length.
const MAX_GITHUB_USERNAME_LEN: usize = 39;

/// Validate the account argument of `/setup_github_updates`.
///
/// GitHub usernames are ASCII letters, digits and hyphens and never start
/// with a hyphen.
pub fn parse_github_username(arg: &str) -> Result<String, BotError> {
    let name = arg.trim();
    let valid = !name.is_empty()
        && name.len() <= MAX_GITHUB_USERNAME_LEN
        && !name.starts_with('-')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

    if valid {
        Ok(name.to_string())
    } else {
        Err(BotError::InvalidAccount(name.to_string()))
    }
}

/// Latency reply for /ping.
pub fn format_latency(latency: Duration) -> String {
    format!("Pong! Latency: {:.2} ms", latency.as_secs_f64() * 1000.0)
}

/// User-facing reply for a failed /get_file.
pub fn fetch_error_reply(e: &FetchFileError) -> String {
    match e {
        FetchFileError::Url(RepoUrlError::InvalidUrl(_)) => "Invalid GitHub URL.".to_string(),
        other => format!("Error: {}", other),
    }
}

/// Reply for a /command that did not parse.
///
/// Known commands with missing or extra arguments get their usage line.
pub fn unknown_command_reply(text: &str) -> String {
    let first = text.split_whitespace().next().unwrap_or(text);
    let name = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or_default();

    match name {
        "setup_github_updates" => {
            "Usage: /setup_github_updates <channel|here> <github_username>".to_string()
        }
        "get_file" => "Usage: /get_file <repo_url> <file_path>".to_string(),
        _ => format!(
            "Unknown command: {}\n\nUse /help to see available commands.",
            first
        ),
    }
}

/// Handle the /start command.
pub async fn handle_start(bot: Bot, msg: Message, ctx: Arc<HandlerContext>) -> ResponseResult<()> {
    let welcome = format!(
        "Welcome to Hubwatch! 🛰\n\n\
        I post new commits from GitHub accounts to your chats and fetch files from repositories.\n\n\
        <b>Getting Started:</b>\n\
        1. <code>/setup_github_updates here &lt;username&gt;</code> to watch an account\n\
        2. <code>/get_file &lt;repo_url&gt; &lt;path&gt;</code> to download a file\n\
        3. /status to see what is watched\n\n\
        Repositories are checked every {} seconds.\n\n\
        Type /help for all commands.",
        ctx.poll_interval.as_secs()
    );

    bot.send_message(msg.chat.id, welcome)
        .parse_mode(ParseMode::Html)
        .await?;

    info!(chat_id = %msg.chat.id, user = ?msg.from.as_ref().map(|u| &u.username), "User started bot");
    Ok(())
}

/// Handle the /help command.
pub async fn handle_help(bot: Bot, msg: Message) -> ResponseResult<()> {
    let help_text = Command::descriptions().to_string();
    bot.send_message(msg.chat.id, help_text).await?;
    Ok(())
}

/// Handle the /setup_github_updates command.
pub async fn handle_setup_github_updates(
    bot: Bot,
    msg: Message,
    ctx: Arc<HandlerContext>,
    channel: String,
    github_username: String,
) -> ResponseResult<()> {
    let channel_arg = match parse_channel_arg(&channel) {
        Ok(arg) => arg,
        Err(e) => {
            bot.send_message(msg.chat.id, format!("❌ {}", e)).await?;
            return Ok(());
        }
    };

    let github_username = match parse_github_username(&github_username) {
        Ok(name) => name,
        Err(e) => {
            bot.send_message(msg.chat.id, format!("❌ {}", e)).await?;
            return Ok(());
        }
    };

    let chat = match bot.get_chat(channel_arg.recipient(msg.chat.id)).await {
        Ok(chat) => chat,
        Err(e) => {
            warn!(channel = %channel, error = %e, "Could not resolve channel");
            bot.send_message(
                msg.chat.id,
                format!(
                    "❌ Could not find channel {}: {}\n\nMake sure the bot is a member of it.",
                    channel, e
                ),
            )
            .await?;
            return Ok(());
        }
    };

    let channel_name = chat_display_name(&chat);
    ctx.state
        .register(ChannelId(chat.id.0), github_username.clone())
        .await;

    bot.send_message(
        msg.chat.id,
        format!(
            "GitHub updates for <b>{}</b> will be posted in {}",
            html_escape(&github_username),
            html_escape(&channel_name)
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;

    info!(
        chat_id = %msg.chat.id,
        channel_id = %chat.id,
        account = %github_username,
        "GitHub updates configured"
    );
    Ok(())
}

/// Handle the /get_file command - send a repository file as a document.
pub async fn handle_get_file(
    bot: Bot,
    msg: Message,
    ctx: Arc<HandlerContext>,
    repo_url: String,
    file_path: String,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    let staged = match fetch_file(ctx.host.as_ref(), &repo_url, &file_path).await {
        Ok(staged) => staged,
        Err(e) => {
            warn!(chat_id = %chat_id, repo_url = %repo_url, path = %file_path, error = %e, "File fetch failed");
            bot.send_message(chat_id, fetch_error_reply(&e)).await?;
            return Ok(());
        }
    };

    if let Err(e) = bot.send_chat_action(chat_id, ChatAction::UploadDocument).await {
        debug!(chat_id = %chat_id, error = %e, "Failed to send upload action");
    }

    let sender = bot.clone();
    let sent = staged
        .deliver(|path, name| async move {
            sender
                .send_document(chat_id, InputFile::file(path).file_name(name))
                .await
        })
        .await;

    match sent {
        Ok(_) => {
            info!(chat_id = %chat_id, repo_url = %repo_url, path = %file_path, "File sent");
        }
        Err(e) => {
            error!(chat_id = %chat_id, path = %file_path, error = %e, "Failed to send file");
            bot.send_message(chat_id, format!("Error: {}", e)).await?;
        }
    }

    Ok(())
}

/// Handle the /ping command.
pub async fn handle_ping(bot: Bot, msg: Message) -> ResponseResult<()> {
    let started = Instant::now();
    bot.get_me().await?;
    let latency = started.elapsed();

    bot.send_message(msg.chat.id, format_latency(latency)).await?;
    Ok(())
}

/// Handle the /status command.
pub async fn handle_status(bot: Bot, msg: Message, ctx: Arc<HandlerContext>) -> ResponseResult<()> {
    let subscriptions = ctx.state.list_all().await;
    let tracked = ctx.state.tracked_repository_count().await;

    let mut text = String::new();
    if subscriptions.is_empty() {
        text.push_str("No GitHub updates configured.\n\n");
        text.push_str("Use <code>/setup_github_updates here &lt;username&gt;</code> to start.");
    } else {
        text.push_str("<b>GitHub updates:</b>\n");
        for sub in &subscriptions {
            let marker = if sub.channel_id.0 == msg.chat.id.0 { "📍" } else { "•" };
            text.push_str(&format!(
                "{} <b>{}</b> → <code>{}</code>\n",
                marker,
                html_escape(&sub.watched_account),
                sub.channel_id
            ));
        }
        text.push_str(&format!(
            "\nTracking {} repositories, checked every {} seconds.",
            tracked,
            ctx.poll_interval.as_secs()
        ));
    }

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Dispatch commands to appropriate handlers.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<HandlerContext>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => handle_start(bot, msg, ctx).await,
        Command::Help => handle_help(bot, msg).await,
        Command::SetupGithubUpdates {
            channel,
            github_username,
        } => handle_setup_github_updates(bot, msg, ctx, channel, github_username).await,
        Command::GetFile {
            repo_url,
            file_path,
        } => handle_get_file(bot, msg, ctx, repo_url, file_path).await,
        Command::Ping => handle_ping(bot, msg).await,
        Command::Status => handle_status(bot, msg, ctx).await,
    }
}
