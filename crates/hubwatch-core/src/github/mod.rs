//! Read-only access to the code-hosting platform.
//!
//! The [`CodeHost`] trait is the seam between the bot and GitHub: the poller
//! and the file fetcher only see the trait, so they can run against
//! in-memory fakes in tests. [`GitHubClient`] is the REST implementation.

mod client;
mod error;

use async_trait::async_trait;
use hubwatch_models::{CommitInfo, RepoId, Repository};

pub use client::GitHubClient;
pub use error::{GitHubError, Result};

/// Operations the bot needs from a code-hosting platform.
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Lists every repository owned by `account`, in API order.
    async fn list_repositories(&self, account: &str) -> Result<Vec<Repository>>;

    /// Looks up a single repository.
    async fn repository(&self, repo: &RepoId) -> Result<Repository>;

    /// Reads the commit `reference` (a branch name or SHA) points at.
    async fn commit(&self, repo: &RepoId, reference: &str) -> Result<CommitInfo>;

    /// Reads the decoded bytes of the file at `path` on the default branch.
    async fn file_content(&self, repo: &RepoId, path: &str) -> Result<Vec<u8>>;

    /// Reads the head commit of the repository's default branch.
    async fn head_commit(&self, repo: &Repository) -> Result<CommitInfo> {
        self.commit(&repo.id(), &repo.default_branch).await
    }
}
