//! Channel subscriptions.

use serde::{Deserialize, Serialize};

use crate::ids::ChannelId;

/// A channel watching the repositories of one GitHub account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub channel_id: ChannelId,
    /// GitHub username whose repositories are polled.
    pub watched_account: String,
}

impl Subscription {
    pub fn new(channel_id: ChannelId, watched_account: impl Into<String>) -> Self {
        Self {
            channel_id,
            watched_account: watched_account.into(),
        }
    }
}
