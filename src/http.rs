//! Shared HTTP client construction.
//!
//! Every outbound client is built here so timeouts, the user agent and base
//! URL handling stay consistent across the Sonar and provider clients.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use url::Url;

use crate::SqiError;

/// Timeouts applied to every request made by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Duration,
    pub connect: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            connect: Duration::from_secs(10),
        }
    }
}

impl Timeouts {
    /// Override the defaults with optional second counts.
    #[must_use]
    pub fn from_secs(request: Option<u64>, connect: Option<u64>) -> Self {
        let defaults = Self::default();
        Self {
            request: request.map_or(defaults.request, Duration::from_secs),
            connect: connect.map_or(defaults.connect, Duration::from_secs),
        }
    }
}

/// Parse a header value, marking it sensitive when it carries credentials.
pub(crate) fn header_value(value: &str, context: &str, sensitive: bool) -> Result<HeaderValue, SqiError> {
    let mut header = HeaderValue::from_str(value).map_err(|e| SqiError::RequestContext {
        context: context.into(),
        source: Box::new(e),
    })?;
    header.set_sensitive(sensitive);
    Ok(header)
}

/// Build a client with `headers`, the `sqi` user agent and `timeouts`.
pub(crate) fn build_client(
    mut headers: HeaderMap,
    timeouts: Timeouts,
    context: &str,
) -> Result<reqwest::Client, SqiError> {
    headers.insert(USER_AGENT, HeaderValue::from_static("sqi"));
    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeouts.request)
        .connect_timeout(timeouts.connect)
        .build()
        .map_err(|e| SqiError::RequestContext {
            context: context.into(),
            source: Box::new(e),
        })
}

/// Parse an API base URL so that relative paths can be joined onto it.
///
/// Trailing slashes are collapsed to exactly one.
pub(crate) fn api_base(raw: &str) -> Result<Url, SqiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let mut api = Url::parse(trimmed)
        .map_err(|e| SqiError::configuration(format!("invalid API base URL '{trimmed}': {e}")))?;
    let normalised_path = match api.path().trim_end_matches('/') {
        "" => "/".to_owned(),
        path => format!("{path}/"),
    };
    api.set_path(&normalised_path);
    Ok(api)
}
