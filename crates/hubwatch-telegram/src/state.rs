//! Shared state for the bot.
//!
//! [`WatchState`] owns the two in-memory maps: channel subscriptions and the
//! last-seen default-branch head of every repository the poller has looked
//! at. Both are lost on restart.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use hubwatch_models::{ChannelId, Subscription};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// What the poller should do with a freshly read head commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorDecision {
    /// First observation of the repository: store the head, do not notify.
    Seed,
    /// The head moved since the last observation: notify, then store it.
    Changed { previous: String },
    /// Same head as last time.
    Unchanged,
}

impl CursorDecision {
    /// Returns true if the cursor must be written.
    pub fn advances_cursor(&self) -> bool {
        !matches!(self, CursorDecision::Unchanged)
    }
}

/// Compares a stored cursor with the head just observed.
pub fn decide(cursor: Option<&str>, head: &str) -> CursorDecision {
    match cursor {
        None => CursorDecision::Seed,
        Some(previous) if previous == head => CursorDecision::Unchanged,
        Some(previous) => CursorDecision::Changed {
            previous: previous.to_string(),
        },
    }
}

/// Subscriptions and commit cursors shared by the handlers and the poller.
#[derive(Debug, Default)]
pub struct WatchState {
    /// Watched GitHub account per channel.
    subscriptions: RwLock<BTreeMap<ChannelId, String>>,
    /// Last-seen head commit per repository full name.
    cursors: RwLock<HashMap<String, String>>,
}

impl WatchState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Subscription registry ---

    /// Point `channel` at `account`, replacing any previous account.
    ///
    /// Returns the account the channel watched before, if any.
    pub async fn register(&self, channel: ChannelId, account: impl Into<String>) -> Option<String> {
        let account = account.into();
        let previous = self
            .subscriptions
            .write()
            .await
            .insert(channel, account.clone());

        match &previous {
            Some(old) if *old != account => {
                info!(channel_id = %channel, from = %old, to = %account, "Subscription replaced")
            }
            Some(_) => debug!(channel_id = %channel, account = %account, "Subscription unchanged"),
            None => info!(channel_id = %channel, account = %account, "Subscription added"),
        }
        previous
    }

    /// All subscriptions, ordered by channel id.
    pub async fn list_all(&self) -> Vec<Subscription> {
        self.subscriptions
            .read()
            .await
            .iter()
            .map(|(channel, account)| Subscription::new(*channel, account.clone()))
            .collect()
    }

    /// The account watched by `channel`.
    pub async fn subscription(&self, channel: ChannelId) -> Option<String> {
        self.subscriptions.read().await.get(&channel).cloned()
    }

    /// Number of registered channels.
    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    // --- Commit cursors ---

    /// Decide how to handle `head` for `repository` without modifying anything.
    pub async fn check_head(&self, repository: &str, head: &str) -> CursorDecision {
        let cursors = self.cursors.read().await;
        decide(cursors.get(repository).map(String::as_str), head)
    }

    /// Store `head` as the last-seen commit of `repository`.
    pub async fn record_head(&self, repository: &str, head: &str) {
        self.cursors
            .write()
            .await
            .insert(repository.to_string(), head.to_string());
        debug!(repo = %repository, sha = %head, "Cursor updated");
    }

    /// The last-seen commit of `repository`.
    pub async fn cursor(&self, repository: &str) -> Option<String> {
        self.cursors.read().await.get(repository).cloned()
    }

    /// Number of repositories with a cursor.
    pub async fn tracked_repository_count(&self) -> usize {
        self.cursors.read().await.len()
    }
}

/// Create a shared state wrapped in Arc for use across handlers.
pub fn create_shared_state() -> Arc<WatchState> {
    Arc::new(WatchState::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide() {
        assert_eq!(decide(None, "a"), CursorDecision::Seed);
        assert_eq!(decide(Some("a"), "a"), CursorDecision::Unchanged);
        assert_eq!(
            decide(Some("a"), "b"),
            CursorDecision::Changed {
                previous: "a".to_string()
            }
        );
    }

    #[test]
    fn test_advances_cursor() {
        assert!(CursorDecision::Seed.advances_cursor());
        assert!(CursorDecision::Changed {
            previous: "a".into()
        }
        .advances_cursor());
        assert!(!CursorDecision::Unchanged.advances_cursor());
    }

    #[tokio::test]
    async fn test_register_last_write_wins() {
        let state = WatchState::new();
        let channel = ChannelId(42);

        assert_eq!(state.register(channel, "alice").await, None);
        assert_eq!(state.register(channel, "bob").await, Some("alice".to_string()));

        assert_eq!(state.subscription(channel).await.as_deref(), Some("bob"));
        assert_eq!(state.subscription_count().await, 1);
        assert_eq!(state.list_all().await, vec![Subscription::new(channel, "bob")]);
    }

    #[tokio::test]
    async fn test_list_all_ordered_by_channel() {
        let state = WatchState::new();
        state.register(ChannelId(3), "c").await;
        state.register(ChannelId(-1), "a").await;
        state.register(ChannelId(2), "b").await;

        let accounts: Vec<_> = state
            .list_all()
            .await
            .into_iter()
            .map(|s| s.watched_account)
            .collect();
        assert_eq!(accounts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_cursor_roundtrip() {
        let state = WatchState::new();
        assert_eq!(state.check_head("o/r", "a").await, CursorDecision::Seed);
        assert_eq!(state.cursor("o/r").await, None);

        state.record_head("o/r", "a").await;
        assert_eq!(state.check_head("o/r", "a").await, CursorDecision::Unchanged);
        assert_eq!(state.cursor("o/r").await.as_deref(), Some("a"));
        assert_eq!(state.tracked_repository_count().await, 1);
    }
}
