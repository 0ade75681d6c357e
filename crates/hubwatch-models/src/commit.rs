//! Commits and the notifications posted for them.

use serde::{Deserialize, Serialize};

/// Head commit of a repository's default branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    /// Link to the commit on the hosting platform.
    pub html_url: String,
    /// Raw commit message, including the body.
    pub message: String,
    /// Display name of the commit author.
    pub author_name: String,
}

/// A new-commit notification ready to be rendered for a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitNotification {
    /// Repository full name (`owner/name`).
    pub repository: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub author: String,
    pub sha: String,
}

impl CommitNotification {
    /// Builds the notification for a new head commit of `repository`.
    pub fn new(repository: impl Into<String>, commit: &CommitInfo) -> Self {
        let repository = repository.into();
        Self {
            title: format!("New Commit in {}", repository),
            repository,
            description: commit.message.clone(),
            url: commit.html_url.clone(),
            author: commit.author_name.clone(),
            sha: commit.sha.clone(),
        }
    }

    /// Abbreviated commit hash for display.
    pub fn short_sha(&self) -> &str {
        let end = self
            .sha
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.sha.len());
        &self.sha[..end]
    }
}
