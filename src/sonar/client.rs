//! HTTP client for the issues search endpoint.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use super::IssueSearch;
use super::validate::{BODY_SNIPPET_LEN, HttpResponse, snippet, validate_response};
use crate::SqiError;
use crate::http::{Timeouts, build_client, header_value};
use crate::models::IssuesPayload;

type Transcript = Mutex<std::io::BufWriter<std::fs::File>>;

/// Build Sonar request headers with an optional bearer token.
fn build_headers(token: Option<&str>) -> Result<HeaderMap, SqiError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {token}"), "parse Authorization header", true)?,
        );
    }
    Ok(headers)
}

/// Client for the code-quality service's issues search.
///
/// Each call performs a single GET; there is no retry.
pub struct SonarClient {
    client: reqwest::Client,
    transcript: Option<Transcript>,
}

impl SonarClient {
    /// Create a client authenticating with `token` when one is given.
    ///
    /// The optional `transcript` path records each request and response as a
    /// JSON line for troubleshooting.
    ///
    /// # Errors
    ///
    /// Returns a [`SqiError`] if the transcript file cannot be created or
    /// the HTTP client cannot be built.
    pub fn new(
        token: Option<&str>,
        timeouts: Timeouts,
        transcript: Option<PathBuf>,
    ) -> Result<Self, SqiError> {
        let transcript = transcript
            .map(|p| std::fs::File::create(p).map(|file| Mutex::new(std::io::BufWriter::new(file))))
            .transpose()?;
        let client = build_client(build_headers(token)?, timeouts, "build Sonar client")?;
        Ok(Self { client, transcript })
    }

    /// Perform the GET and collect status, content type and body.
    async fn get(&self, url: &Url) -> Result<HttpResponse, SqiError> {
        let make_ctx = |status: Option<u16>| {
            status
                .map_or_else(
                    || format!("issues search {url}"),
                    |s| format!("issues search {url}; status {s}"),
                )
                .into_boxed_str()
        };
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SqiError::RequestContext {
                context: make_ctx(None),
                source: Box::new(e),
            })?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response
            .text()
            .await
            .map_err(|e| SqiError::RequestContext {
                context: make_ctx(Some(status)),
                source: Box::new(e),
            })?;
        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }

    fn log_transcript(&self, url: &Url, resp: &HttpResponse) {
        let Some(t) = &self.transcript else {
            return;
        };
        let line = json!({
            "url": url.as_str(),
            "status": resp.status,
            "content_type": resp.content_type,
            "response": snippet(&resp.body, BODY_SNIPPET_LEN),
        });
        match t.lock() {
            Ok(mut f) => {
                if let Err(e) = writeln!(f, "{line}") {
                    warn!("failed to write transcript for {url}: {e}");
                    return;
                }
                if let Err(e) = f.flush() {
                    warn!("failed to flush transcript for {url}: {e}");
                }
            }
            Err(e) => warn!("failed to lock transcript for {url}: {e}"),
        }
    }
}

impl IssueSearch for SonarClient {
    async fn search_issues(&self, url: &Url) -> Result<IssuesPayload, SqiError> {
        debug!("querying issues: {url}");
        let resp = self.get(url).await?;
        self.log_transcript(url, &resp);
        validate_response(&resp)
    }
}
