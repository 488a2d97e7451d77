//! Pull request lookups against the hosting providers' REST APIs.
//!
//! Each provider implements [`PullRequestLookup`]; [`ProviderClient`] picks
//! the implementation for the configured [`ProviderKind`]. Lookups are
//! best-effort: a missing token or repository disables them instead of
//! failing the command.

mod bitbucket;
mod github;

use std::fmt;
use std::future::Future;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::SqiError;
use crate::http::Timeouts;
use crate::models::ProviderKind;

pub use self::bitbucket::{BITBUCKET_API_URL, BitbucketClient};
pub use self::github::{GITHUB_API_URL, GitHubClient};

/// Repository owner (or workspace) and name (or slug).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub name: String,
}

impl RepoCoordinates {
    /// Parse an `owner/name` pair, tolerating a trailing `.git`.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let (owner, name) = input.trim().trim_matches('/').split_once('/')?;
        let name = name.strip_suffix(".git").unwrap_or(name);
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Everything needed to talk to one provider; any field may be missing.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub kind: Option<ProviderKind>,
    pub repo: Option<RepoCoordinates>,
    pub token: Option<String>,
    /// Account email, required for Bitbucket basic authentication.
    pub email: Option<String>,
    /// Override for the provider's API root.
    pub api_url: Option<String>,
}

/// A pull request returned by a provider listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestSummary {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
}

/// Capability to list pull requests whose source branch is `branch`.
pub trait PullRequestLookup {
    fn kind(&self) -> ProviderKind;

    /// Open pull requests for `branch`, in provider order.
    fn list_open_pull_requests_for_branch(
        &self,
        branch: &str,
    ) -> impl Future<Output = Result<Vec<PullRequestSummary>, SqiError>> + Send;

    /// Pull requests for `branch` in any state, in provider order.
    fn list_all_pull_requests_for_branch(
        &self,
        branch: &str,
    ) -> impl Future<Output = Result<Vec<PullRequestSummary>, SqiError>> + Send;
}

/// Lookup implementation selected at runtime.
pub enum ProviderClient {
    GitHub(GitHubClient),
    Bitbucket(BitbucketClient),
}

impl ProviderClient {
    /// Build the lookup for `settings`, or `None` when detection cannot run.
    ///
    /// Missing provider, repository or credentials, and client construction
    /// failures, all disable detection; the reason is logged.
    #[must_use]
    pub fn connect(settings: &ProviderSettings, timeouts: Timeouts) -> Option<Self> {
        let Some(kind) = settings.kind else {
            debug!("no provider configured; skipping pull request detection");
            return None;
        };
        let Some(repo) = settings.repo.clone() else {
            debug!("no {kind} repository known; skipping pull request detection");
            return None;
        };
        let Some(token) = settings.token.as_deref().filter(|t| !t.is_empty()) else {
            debug!("no {kind} token configured; skipping pull request detection");
            return None;
        };
        let api = settings.api_url.as_deref();
        let built = match kind {
            ProviderKind::GitHub => GitHubClient::new(token, repo, api, timeouts).map(Self::GitHub),
            ProviderKind::Bitbucket => {
                let Some(email) = settings.email.as_deref().filter(|e| !e.is_empty()) else {
                    debug!("no Bitbucket email configured; skipping pull request detection");
                    return None;
                };
                BitbucketClient::new(email, token, repo, api, timeouts).map(Self::Bitbucket)
            }
        };
        built
            .inspect_err(|e| warn!("cannot build {kind} client; skipping pull request detection: {e}"))
            .ok()
    }
}

impl PullRequestLookup for ProviderClient {
    fn kind(&self) -> ProviderKind {
        match self {
            Self::GitHub(c) => c.kind(),
            Self::Bitbucket(c) => c.kind(),
        }
    }

    async fn list_open_pull_requests_for_branch(
        &self,
        branch: &str,
    ) -> Result<Vec<PullRequestSummary>, SqiError> {
        match self {
            Self::GitHub(c) => c.list_open_pull_requests_for_branch(branch).await,
            Self::Bitbucket(c) => c.list_open_pull_requests_for_branch(branch).await,
        }
    }

    async fn list_all_pull_requests_for_branch(
        &self,
        branch: &str,
    ) -> Result<Vec<PullRequestSummary>, SqiError> {
        match self {
            Self::GitHub(c) => c.list_all_pull_requests_for_branch(branch).await,
            Self::Bitbucket(c) => c.list_all_pull_requests_for_branch(branch).await,
        }
    }
}

/// GET `url` and decode a JSON body, mapping every failure to
/// [`SqiError::TransientNetwork`].
async fn get_json<T>(
    provider: ProviderKind,
    request: reqwest::RequestBuilder,
) -> Result<T, SqiError>
where
    T: serde::de::DeserializeOwned,
{
    let transient = |message: String| SqiError::TransientNetwork {
        provider,
        message: message.into_boxed_str(),
    };
    let response = request
        .send()
        .await
        .map_err(|e| transient(format!("request failed: {e}")))?;
    let status = response.status();
    let url = response.url().clone();
    if !status.is_success() {
        return Err(transient(format!("HTTP status {} from {url}", status.as_u16())));
    }
    let body = response
        .text()
        .await
        .map_err(|e| transient(format!("reading body from {url}: {e}")))?;
    serde_json::from_str(&body).map_err(|e| transient(format!("malformed response from {url}: {e}")))
}
