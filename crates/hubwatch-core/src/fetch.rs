//! Single-file retrieval for the file fetch command.
//!
//! Each step returns an explicit error so the command handler can turn any
//! failure into a message for the user:
//!
//! 1. validate the repository URL (no network access on failure)
//! 2. resolve the repository
//! 3. read the file's decoded content
//! 4. check the content is text
//! 5. stage it in a temporary file

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::attachment::StagedFile;
use crate::github::{CodeHost, GitHubError};
use crate::repo_url::{parse_repo_url, RepoUrlError};

/// Errors reported back to the user by the file fetch command.
#[derive(Debug, Error)]
pub enum FetchFileError {
    /// The repository URL was rejected before any request was made.
    #[error(transparent)]
    Url(#[from] RepoUrlError),

    /// No file path was given.
    #[error("Please provide the path of a file in the repository")]
    EmptyPath,

    /// The path contains `.` or `..` segments.
    #[error("Invalid file path '{0}': '.' and '..' are not allowed")]
    InvalidPath(String),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("File '{path}' not found in {repo}")]
    FileNotFound { repo: String, path: String },

    /// The file is binary or not valid UTF-8.
    #[error("File '{0}' is not a text file")]
    NotText(String),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// The temporary file could not be written.
    #[error("Failed to write temporary file: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches `file_path` from the repository at `repo_url` into a temporary file.
pub async fn fetch_file(
    host: &dyn CodeHost,
    repo_url: &str,
    file_path: &str,
) -> Result<StagedFile, FetchFileError> {
    fetch_file_in(host, repo_url, file_path, &std::env::temp_dir()).await
}

/// Like [`fetch_file`], staging the file in `dir`.
pub async fn fetch_file_in(
    host: &dyn CodeHost,
    repo_url: &str,
    file_path: &str,
    dir: &Path,
) -> Result<StagedFile, FetchFileError> {
    let repo_id = parse_repo_url(repo_url)?;

    let path = file_path.trim().trim_matches('/');
    if path.is_empty() {
        return Err(FetchFileError::EmptyPath);
    }
    if path.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(FetchFileError::InvalidPath(path.to_string()));
    }

    let repo = host.repository(&repo_id).await.map_err(|e| match e {
        GitHubError::NotFound(_) => FetchFileError::RepositoryNotFound(repo_id.full_name()),
        other => FetchFileError::GitHub(other),
    })?;

    let bytes = host
        .file_content(&repo.id(), path)
        .await
        .map_err(|e| match e {
            GitHubError::NotFound(_) => FetchFileError::FileNotFound {
                repo: repo.full_name.clone(),
                path: path.to_string(),
            },
            other => FetchFileError::GitHub(other),
        })?;
    debug!(repo = %repo.full_name, path = %path, bytes = bytes.len(), "Fetched file");

    if std::str::from_utf8(&bytes).is_err() {
        return Err(FetchFileError::NotText(path.to_string()));
    }

    let file_name = path.rsplit('/').next().unwrap_or(path);
    let staged = StagedFile::write_in(dir, file_name, &bytes)?;

    info!(repo = %repo.full_name, path = %path, "File staged for delivery");
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::Result as GitHubResult;
    use async_trait::async_trait;
    use hubwatch_models::{CommitInfo, RepoId, Repository, RepositoryOwner};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeHost {
        files: HashMap<(String, String), Vec<u8>>,
        calls: AtomicUsize,
    }

    impl FakeHost {
        fn with_file(mut self, repo: &str, path: &str, bytes: &[u8]) -> Self {
            self.files
                .insert((repo.to_string(), path.to_string()), bytes.to_vec());
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CodeHost for FakeHost {
        async fn list_repositories(&self, _account: &str) -> GitHubResult<Vec<Repository>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn repository(&self, repo: &RepoId) -> GitHubResult<Repository> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let known = self.files.keys().any(|(r, _)| *r == repo.full_name());
            if !known {
                return Err(GitHubError::NotFound(repo.full_name()));
            }
            Ok(Repository {
                full_name: repo.full_name(),
                name: repo.name.clone(),
                owner: RepositoryOwner {
                    login: repo.owner.clone(),
                },
                default_branch: "main".to_string(),
                html_url: String::new(),
            })
        }

        async fn commit(&self, repo: &RepoId, _reference: &str) -> GitHubResult<CommitInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GitHubError::NotFound(repo.full_name()))
        }

        async fn file_content(&self, repo: &RepoId, path: &str) -> GitHubResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.files
                .get(&(repo.full_name(), path.to_string()))
                .cloned()
                .ok_or_else(|| GitHubError::NotFound(path.to_string()))
        }
    }

    #[tokio::test]
    async fn test_foreign_host_makes_no_request() {
        let host = FakeHost::default().with_file("owner/repo", "a.txt", b"a");
        let dir = tempfile::tempdir().unwrap();

        let err = fetch_file_in(&host, "https://example.com/owner/repo", "a.txt", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchFileError::Url(RepoUrlError::InvalidUrl(_))));
        assert_eq!(err.to_string(), "Invalid GitHub URL.");
        assert_eq!(host.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_path_makes_no_request() {
        let host = FakeHost::default();
        let dir = tempfile::tempdir().unwrap();

        let err = fetch_file_in(&host, "https://github.com/owner", "a.txt", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchFileError::Url(RepoUrlError::MalformedPath(_))));
        assert_eq!(host.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetches_exact_bytes() {
        let content = "[package]\nname = \"demo\"\n# ünïcödé\n";
        let host = FakeHost::default().with_file("owner/repo", "Cargo.toml", content.as_bytes());
        let dir = tempfile::tempdir().unwrap();

        let staged = fetch_file_in(
            &host,
            "https://github.com/owner/repo",
            "/Cargo.toml",
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(staged.file_name(), "Cargo.toml");
        assert_eq!(std::fs::read(staged.path()).unwrap(), content.as_bytes());
    }

    #[tokio::test]
    async fn test_nested_path_uses_base_name() {
        let host = FakeHost::default().with_file("owner/repo", "src/lib.rs", b"pub fn f() {}");
        let dir = tempfile::tempdir().unwrap();

        let staged = fetch_file_in(&host, "https://github.com/owner/repo", "src/lib.rs", dir.path())
            .await
            .unwrap();
        assert_eq!(staged.file_name(), "lib.rs");
    }

    #[tokio::test]
    async fn test_no_residual_file_when_send_fails() {
        let host = FakeHost::default().with_file("owner/repo", "a.txt", b"hello");
        let dir = tempfile::tempdir().unwrap();

        let staged = fetch_file_in(&host, "https://github.com/owner/repo", "a.txt", dir.path())
            .await
            .unwrap();
        let result: Result<(), &str> = staged.deliver(|_, _| async { Err("send failed") }).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_repository() {
        let host = FakeHost::default();
        let dir = tempfile::tempdir().unwrap();

        let err = fetch_file_in(&host, "https://github.com/owner/gone", "a.txt", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchFileError::RepositoryNotFound(ref r) if r == "owner/gone"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let host = FakeHost::default().with_file("owner/repo", "a.txt", b"a");
        let dir = tempfile::tempdir().unwrap();

        let err = fetch_file_in(&host, "https://github.com/owner/repo", "b.txt", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchFileError::FileNotFound { ref path, .. } if path == "b.txt"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_binary_content_rejected() {
        let host = FakeHost::default().with_file("owner/repo", "logo.png", &[0x89, 0x50, 0xff, 0xfe]);
        let dir = tempfile::tempdir().unwrap();

        let err = fetch_file_in(&host, "https://github.com/owner/repo", "logo.png", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchFileError::NotText(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_path_rejected() {
        let host = FakeHost::default();
        let dir = tempfile::tempdir().unwrap();

        let err = fetch_file_in(&host, "https://github.com/owner/repo", " / ", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchFileError::EmptyPath));
        assert_eq!(host.calls(), 0);
    }

    #[tokio::test]
    async fn test_dot_segments_rejected() {
        let host = FakeHost::default().with_file("owner/repo", "b.txt", b"b");
        let dir = tempfile::tempdir().unwrap();

        for path in ["a/../b.txt", "../../user", "./b.txt"] {
            let err = fetch_file_in(&host, "https://github.com/owner/repo", path, dir.path())
                .await
                .unwrap_err();
            assert!(matches!(err, FetchFileError::InvalidPath(_)), "{path}");
        }
        assert_eq!(host.calls(), 0);
    }
}
