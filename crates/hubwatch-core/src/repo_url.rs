//! Parsing of repository URLs given to the file fetch command.

use hubwatch_models::RepoId;
use thiserror::Error;
use url::Url;

/// Host every repository URL must point at.
pub const GITHUB_HOST: &str = "github.com";

/// Reasons a repository URL is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoUrlError {
    /// Not a URL at all, or a URL for another host.
    #[error("Invalid GitHub URL.")]
    InvalidUrl(String),

    /// A github.com URL whose path is not `/owner/repo`.
    #[error("Expected a repository URL like https://github.com/owner/repo, got '{0}'")]
    MalformedPath(String),
}

/// Parses `https://github.com/owner/repo` into a repository identifier.
///
/// The path must consist of exactly an owner and a repository name; a
/// trailing slash and a `.git` suffix are accepted.
pub fn parse_repo_url(raw: &str) -> Result<RepoId, RepoUrlError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|_| RepoUrlError::InvalidUrl(raw.to_string()))?;

    if url.host_str() != Some(GITHUB_HOST) {
        return Err(RepoUrlError::InvalidUrl(raw.to_string()));
    }

    let segments: Vec<&str> = url.path().trim_matches('/').split('/').collect();
    match segments.as_slice() {
        [owner, name] if !owner.is_empty() && !name.is_empty() => {
            let name = name.strip_suffix(".git").unwrap_or(name);
            if name.is_empty() {
                return Err(RepoUrlError::MalformedPath(raw.to_string()));
            }
            Ok(RepoId::new(*owner, name))
        }
        _ => Err(RepoUrlError::MalformedPath(raw.to_string())),
    }
}
