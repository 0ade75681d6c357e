//! Commit notification rendering and delivery.
//!
//! The poller talks to chats through the [`ChannelSink`] trait so that it can
//! be exercised without Telegram. [`TelegramSink`] is the production sink.

use async_trait::async_trait;
use hubwatch_models::{ChannelId, CommitNotification};
use teloxide::prelude::*;
use teloxide::types::{Chat, ParseMode};
use tracing::debug;

use crate::error::{BotError, Result};

/// Marker shown in front of every notification title.
pub const ACCENT_MARKER: &str = "🟢";

/// Commit messages longer than this are cut to stay under Telegram's
/// 4096 character message limit.
const MAX_DESCRIPTION_CHARS: usize = 3500;

/// A chat resolved to a live send target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTarget {
    pub id: ChannelId,
    /// Human-readable chat name for logs and replies.
    pub name: String,
}

/// Where commit notifications go.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    /// Resolve a registered channel to a send target.
    ///
    /// Fails when the chat no longer exists or the bot lost access to it.
    async fn resolve(&self, channel: ChannelId) -> Result<ChannelTarget>;

    /// Post a notification to a resolved target.
    async fn deliver(&self, target: &ChannelTarget, notification: &CommitNotification) -> Result<()>;
}

/// Delivers notifications as HTML messages through the Bot API.
#[derive(Clone)]
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChannelSink for TelegramSink {
    async fn resolve(&self, channel: ChannelId) -> Result<ChannelTarget> {
        let chat = self
            .bot
            .get_chat(ChatId(channel.0))
            .await
            .map_err(|e| BotError::ChannelUnavailable {
                channel,
                reason: e.to_string(),
            })?;

        Ok(ChannelTarget {
            id: channel,
            name: chat_display_name(&chat),
        })
    }

    async fn deliver(&self, target: &ChannelTarget, notification: &CommitNotification) -> Result<()> {
        self.bot
            .send_message(ChatId(target.id.0), render_notification(notification))
            .parse_mode(ParseMode::Html)
            .await?;
        debug!(channel_id = %target.id, repo = %notification.repository, "Notification delivered");
        Ok(())
    }
}

/// Name used when referring to a chat in replies: `@username`, else the title.
pub fn chat_display_name(chat: &Chat) -> String {
    if let Some(username) = chat.username() {
        format!("@{}", username)
    } else if let Some(title) = chat.title() {
        title.to_string()
    } else if let Some(first_name) = chat.first_name() {
        first_name.to_string()
    } else {
        chat.id.to_string()
    }
}

/// Render a notification as Telegram HTML.
///
/// Layout: linked title with the accent marker, author and short hash, then
/// the raw commit message.
pub fn render_notification(notification: &CommitNotification) -> String {
    let description = truncate_chars(&notification.description, MAX_DESCRIPTION_CHARS);

    format!(
        "{} <b><a href=\"{}\">{}</a></b>\n{} · <code>{}</code>\n\n{}",
        ACCENT_MARKER,
        html_escape(&notification.url),
        html_escape(&notification.title),
        html_escape(&notification.author),
        html_escape(notification.short_sha()),
        html_escape(&description),
    )
}

/// Escape text for Telegram's HTML parse mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubwatch_models::CommitInfo;

    fn notification(message: &str) -> CommitNotification {
        CommitNotification::new(
            "octocat/Hello-World",
            &CommitInfo {
                sha: "6dcb09b5b57875f334f61aebed695e2e4193db5e".to_string(),
                html_url: "https://github.com/octocat/Hello-World/commit/6dcb09b".to_string(),
                message: message.to_string(),
                author_name: "Mona <Octocat>".to_string(),
            },
        )
    }

    #[test]
    fn test_render_notification() {
        let text = render_notification(&notification("Fix <script> & stuff"));

        assert!(text.starts_with(ACCENT_MARKER));
        assert!(text.contains(
            "<a href=\"https://github.com/octocat/Hello-World/commit/6dcb09b\">New Commit in octocat/Hello-World</a>"
        ));
        assert!(text.contains("Mona &lt;Octocat&gt;"));
        assert!(text.contains("<code>6dcb09b</code>"));
        assert!(text.ends_with("Fix &lt;script&gt; &amp; stuff"));
    }

    #[test]
    fn test_long_message_truncated() {
        let long = "x".repeat(MAX_DESCRIPTION_CHARS + 100);
        let text = render_notification(&notification(&long));
        assert!(text.chars().count() < 4096);
        assert!(text.ends_with('…'));
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé…");
        assert_eq!(truncate_chars("héllo", 5), "héllo");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
