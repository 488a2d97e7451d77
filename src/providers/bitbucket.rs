//! Bitbucket Cloud pull request search.

use reqwest::header::{ACCEPT, HeaderMap};
use serde::Deserialize;
use url::Url;

use super::{PullRequestLookup, PullRequestSummary, RepoCoordinates, get_json};
use crate::SqiError;
use crate::http::{Timeouts, api_base, build_client, header_value};
use crate::models::ProviderKind;

/// Bitbucket Cloud REST API root.
pub const BITBUCKET_API_URL: &str = "https://api.bitbucket.org/2.0";

#[derive(Debug, Deserialize)]
struct PullRequestPage {
    #[serde(default)]
    values: Vec<PullRequestSummary>,
}

/// Searches `GET /repositories/{workspace}/{slug}/pullrequests`.
///
/// Requests authenticate with the account email and an API token.
pub struct BitbucketClient {
    api: Url,
    repo: RepoCoordinates,
    email: String,
    token: String,
    client: reqwest::Client,
}

impl BitbucketClient {
    /// Create a client for `repo`, targeting `api` or [`BITBUCKET_API_URL`].
    ///
    /// # Errors
    ///
    /// Returns a [`SqiError`] when the API URL is invalid or the client
    /// cannot be built.
    pub fn new(
        email: &str,
        token: &str,
        repo: RepoCoordinates,
        api: Option<&str>,
        timeouts: Timeouts,
    ) -> Result<Self, SqiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value("application/json", "build accept header", false)?);
        Ok(Self {
            api: api_base(api.unwrap_or(BITBUCKET_API_URL))?,
            repo,
            email: email.to_owned(),
            token: token.to_owned(),
            client: build_client(headers, timeouts, "build Bitbucket client")?,
        })
    }

    fn pull_requests_url(&self) -> Result<Url, SqiError> {
        let path = format!(
            "repositories/{}/{}/pullrequests",
            self.repo.owner, self.repo.name
        );
        self.api.join(&path).map_err(|e| SqiError::TransientNetwork {
            provider: ProviderKind::Bitbucket,
            message: format!("build pull request URL for {}: {e}", self.repo).into_boxed_str(),
        })
    }

    async fn search(&self, branch: &str) -> Result<Vec<PullRequestSummary>, SqiError> {
        let request = self
            .client
            .get(self.pull_requests_url()?)
            .basic_auth(&self.email, Some(&self.token))
            .query(&[("q", source_branch_filter(branch))]);
        let page: PullRequestPage = get_json(ProviderKind::Bitbucket, request).await?;
        Ok(page.values)
    }
}

/// Bitbucket query language filter matching the source branch exactly.
fn source_branch_filter(branch: &str) -> String {
    let escaped = branch.replace('\\', "\\\\").replace('"', "\\\"");
    format!("source.branch.name=\"{escaped}\"")
}

impl PullRequestLookup for BitbucketClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bitbucket
    }

    async fn list_open_pull_requests_for_branch(
        &self,
        branch: &str,
    ) -> Result<Vec<PullRequestSummary>, SqiError> {
        self.search(branch).await
    }

    /// Same search as the open listing; the source-branch filter has no
    /// state restriction to lift.
    async fn list_all_pull_requests_for_branch(
        &self,
        branch: &str,
    ) -> Result<Vec<PullRequestSummary>, SqiError> {
        self.search(branch).await
    }
}
