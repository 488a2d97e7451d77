//! GitHub REST pull request listing.

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName};
use serde::Deserialize;
use url::Url;

use super::{PullRequestLookup, PullRequestSummary, RepoCoordinates, get_json};
use crate::SqiError;
use crate::http::{Timeouts, api_base, build_client, header_value};
use crate::models::ProviderKind;

/// Public GitHub REST API root.
pub const GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct GitHubPull {
    number: u64,
    #[serde(default)]
    title: Option<String>,
}

impl From<GitHubPull> for PullRequestSummary {
    fn from(pull: GitHubPull) -> Self {
        Self {
            id: pull.number,
            title: pull.title,
        }
    }
}

/// Build an authenticated client with GitHub headers.
fn github_client(token: &str, timeouts: Timeouts) -> Result<reqwest::Client, SqiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        header_value(&format!("Bearer {token}"), "build authorization header", true)?,
    );
    headers.insert(
        ACCEPT,
        header_value("application/vnd.github+json", "build accept header", false)?,
    );
    headers.insert(
        HeaderName::from_static("x-github-api-version"),
        header_value("2022-11-28", "build x-github-api-version header value", false)?,
    );
    build_client(headers, timeouts, "build GitHub client")
}

/// Lists pull requests through `GET /repos/{owner}/{repo}/pulls`.
pub struct GitHubClient {
    api: Url,
    repo: RepoCoordinates,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a client for `repo`, targeting `api` or [`GITHUB_API_URL`].
    ///
    /// # Errors
    ///
    /// Returns a [`SqiError`] when the API URL is invalid or the client
    /// cannot be built.
    pub fn new(
        token: &str,
        repo: RepoCoordinates,
        api: Option<&str>,
        timeouts: Timeouts,
    ) -> Result<Self, SqiError> {
        Ok(Self {
            api: api_base(api.unwrap_or(GITHUB_API_URL))?,
            repo,
            client: github_client(token, timeouts)?,
        })
    }

    fn pulls_url(&self) -> Result<Url, SqiError> {
        let path = format!("repos/{}/{}/pulls", self.repo.owner, self.repo.name);
        self.api.join(&path).map_err(|e| SqiError::TransientNetwork {
            provider: ProviderKind::GitHub,
            message: format!("build pulls URL for {}: {e}", self.repo).into_boxed_str(),
        })
    }

    async fn list(&self, branch: &str, state: &str) -> Result<Vec<PullRequestSummary>, SqiError> {
        let head = format!("{}:{branch}", self.repo.owner);
        let request = self
            .client
            .get(self.pulls_url()?)
            .query(&[("head", head.as_str()), ("state", state)]);
        let pulls: Vec<GitHubPull> = get_json(ProviderKind::GitHub, request).await?;
        Ok(pulls.into_iter().map(Into::into).collect())
    }
}

impl PullRequestLookup for GitHubClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    async fn list_open_pull_requests_for_branch(
        &self,
        branch: &str,
    ) -> Result<Vec<PullRequestSummary>, SqiError> {
        self.list(branch, "open").await
    }

    async fn list_all_pull_requests_for_branch(
        &self,
        branch: &str,
    ) -> Result<Vec<PullRequestSummary>, SqiError> {
        self.list(branch, "all").await
    }
}
