//! Repository metadata as returned by the GitHub REST API.

use serde::{Deserialize, Serialize};

use crate::ids::RepoId;

/// Owner of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

/// A repository owned by a watched account.
///
/// Only the fields the poller and the file fetcher need are kept; unknown
/// fields in API payloads are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// `owner/name`, used as the commit cursor key.
    pub full_name: String,
    pub name: String,
    pub owner: RepositoryOwner,
    /// Branch polled for new commits.
    pub default_branch: String,
    #[serde(default)]
    pub html_url: String,
}

impl Repository {
    /// Returns the owner/name identifier of this repository.
    pub fn id(&self) -> RepoId {
        RepoId::new(&self.owner.login, &self.name)
    }
}
