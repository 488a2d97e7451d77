//! Code-quality service access: URL construction, the HTTP client and
//! response validation.

mod client;
mod settings;
pub mod url;
pub mod validate;

use std::future::Future;

use crate::SqiError;
use crate::models::IssuesPayload;

pub use self::client::SonarClient;
pub use self::settings::{DEFAULT_TIMEZONE, SONARCLOUD_URL, SonarOptions, SonarSettings};
pub use self::url::{build_url, extract_pull_request_key, normalize_endpoint};
pub use self::validate::{HttpResponse, validate_response};

/// Something that can run an issues search URL.
///
/// [`SonarClient`] is the network implementation; the fetcher only depends on
/// this trait.
pub trait IssueSearch {
    /// Fetch and validate the issues found at `url`.
    fn search_issues(
        &self,
        url: &::url::Url,
    ) -> impl Future<Output = Result<IssuesPayload, SqiError>> + Send;
}
