//! Error type shared by the library and the binary.
//!
//! Variants map onto the failure classes the fetch pipeline distinguishes:
//! configuration problems are raised before any request is made, provider
//! failures during pull request detection are recoverable, and every failure
//! of the issues query itself is fatal.

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use crate::models::ProviderKind;

/// Errors returned by library functions.
#[derive(Error, Debug)]
#[allow(
    clippy::module_name_repetitions,
    reason = "`SqiError` is the crate's public error type"
)]
pub enum SqiError {
    #[error("configuration error: {0}")]
    Configuration(Box<str>),
    #[error("configuration error: {0}")]
    LoadConfig(#[from] Arc<OrthoError>),
    #[error("{provider} pull request lookup failed: {message}")]
    TransientNetwork {
        provider: ProviderKind,
        message: Box<str>,
    },
    #[error("HTTP status {status} from issues search | body snippet: {snippet}")]
    Http { status: u16, snippet: Box<str> },
    #[error(
        "expected JSON from issues search but got '{content_type}' (HTTP status {status}) | body snippet: {snippet}"
    )]
    UnexpectedContentType {
        content_type: Box<str>,
        status: u16,
        snippet: Box<str>,
    },
    #[error("malformed response (HTTP status {status}): {message} | snippet: {snippet}")]
    BadResponseSerde {
        status: u16,
        message: Box<str>,
        snippet: Box<str>,
    },
    #[error("request failed when running {context}: {source}")]
    RequestContext {
        context: Box<str>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialise result: {0}")]
    Json(#[from] serde_json::Error),
}

impl SqiError {
    /// Build a [`SqiError::Configuration`] from any string-like message.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into().into_boxed_str())
    }

    /// Whether the error came from the issues query rather than from
    /// configuration or persistence.
    #[must_use]
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::Http { .. }
                | Self::UnexpectedContentType { .. }
                | Self::BadResponseSerde { .. }
                | Self::RequestContext { .. }
        )
    }
}

impl From<OrthoError> for SqiError {
    fn from(err: OrthoError) -> Self {
        Self::LoadConfig(Arc::new(err))
    }
}
