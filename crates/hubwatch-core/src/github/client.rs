//! GitHub REST v3 client built on reqwest.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use hubwatch_models::{CommitInfo, RepoId, Repository};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace, warn};
use url::Url;

use super::error::{GitHubError, Result};
use super::CodeHost;
use crate::config::DEFAULT_GITHUB_API_URL;

/// Page size used when listing repositories (the API maximum).
const PER_PAGE: usize = 100;

/// Upper bound on pages fetched for a single account.
const MAX_PAGES: usize = 50;

const USER_AGENT: &str = concat!("hubwatch/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: String,
    html_url: String,
    commit: ApiCommitDetail,
    author: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
    message: String,
    author: Option<ApiGitAuthor>,
}

#[derive(Debug, Deserialize)]
struct ApiGitAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl From<ApiCommit> for CommitInfo {
    fn from(api: ApiCommit) -> Self {
        let author_name = api
            .commit
            .author
            .map(|a| a.name)
            .filter(|n| !n.is_empty())
            .or_else(|| api.author.map(|u| u.login))
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            sha: api.sha,
            html_url: api.html_url,
            message: api.commit.message,
            author_name,
        }
    }
}

/// A GitHub API client authenticated with a personal access token.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: Url,
    token: String,
}

impl GitHubClient {
    /// Creates a client for github.com.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_api_url(token, DEFAULT_GITHUB_API_URL)
    }

    /// Creates a client for a custom API base URL (GitHub Enterprise, test servers).
    pub fn with_api_url(token: impl Into<String>, api_url: &str) -> Result<Self> {
        let api_url =
            Url::parse(api_url).map_err(|e| GitHubError::InvalidApiUrl(format!("{api_url}: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(GitHubError::InvalidApiUrl(api_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url,
            token: token.into(),
        })
    }

    /// Builds an endpoint URL from path segments, escaping each one.
    fn endpoint<'a, I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| GitHubError::InvalidApiUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends an authenticated GET and decodes the JSON body.
    ///
    /// `what` names the requested object in `NotFound` errors.
    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        trace!(url = %url, "GitHub GET");

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| GitHubError::Decode(e.to_string()));
        }

        let rate_limited = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "0")
            .unwrap_or(false);

        match status {
            StatusCode::NOT_FOUND => Err(GitHubError::NotFound(what.to_string())),
            StatusCode::UNAUTHORIZED => Err(GitHubError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(GitHubError::RateLimited),
            StatusCode::FORBIDDEN if rate_limited => Err(GitHubError::RateLimited),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(GitHubError::Api {
                    status: status.as_u16(),
                    message: api_message(&body),
                })
            }
        }
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn list_repositories(&self, account: &str) -> Result<Vec<Repository>> {
        let mut repos = Vec::new();
        let mut complete = false;

        for page in 1..=MAX_PAGES {
            let mut url = self.endpoint(["users", account, "repos"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let batch: Vec<Repository> = self
                .get_json(url, &format!("GitHub user '{}'", account))
                .await?;
            complete = batch.len() < PER_PAGE;
            repos.extend(batch);
            if complete {
                break;
            }
        }

        if !complete {
            warn!(
                account = %account,
                count = repos.len(),
                max_pages = MAX_PAGES,
                "Repository listing truncated at page limit"
            );
        }

        debug!(account = %account, count = repos.len(), "Listed repositories");
        Ok(repos)
    }

    async fn repository(&self, repo: &RepoId) -> Result<Repository> {
        let url = self.endpoint(["repos", repo.owner.as_str(), repo.name.as_str()])?;
        self.get_json(url, &format!("repository {}", repo)).await
    }

    async fn commit(&self, repo: &RepoId, reference: &str) -> Result<CommitInfo> {
        let url = self.endpoint([
            "repos",
            repo.owner.as_str(),
            repo.name.as_str(),
            "commits",
            reference,
        ])?;
        let commit: ApiCommit = self
            .get_json(url, &format!("commit '{}' in {}", reference, repo))
            .await?;
        Ok(commit.into())
    }

    async fn file_content(&self, repo: &RepoId, path: &str) -> Result<Vec<u8>> {
        let mut segments = vec!["repos", repo.owner.as_str(), repo.name.as_str(), "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let url = self.endpoint(segments)?;

        let body: serde_json::Value = self
            .get_json(url, &format!("file '{}' in {}", path, repo))
            .await?;

        // Directories come back as an array of entries.
        if body.is_array() {
            return Err(GitHubError::NotAFile(path.to_string()));
        }

        let content: ApiContent =
            serde_json::from_value(body).map_err(|e| GitHubError::Decode(e.to_string()))?;
        decode_content(path, content)
    }
}

fn decode_content(path: &str, content: ApiContent) -> Result<Vec<u8>> {
    if content.kind != "file" {
        return Err(GitHubError::NotAFile(path.to_string()));
    }

    match content.encoding.as_deref() {
        Some("base64") => {
            let encoded: String = content
                .content
                .unwrap_or_default()
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| GitHubError::Decode(e.to_string()))
        }
        // Files over 1 MB are returned without inline content.
        Some("none") => Err(GitHubError::TooLarge(path.to_string())),
        other => Err(GitHubError::Decode(format!(
            "unsupported content encoding {:?}",
            other
        ))),
    }
}

/// Extracts the `message` field from a GitHub error body.
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
