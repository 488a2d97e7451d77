//! Endpoint normalisation and issues-search URL construction.
//!
//! Both service modes share one builder: the [`SonarMode`] picks the
//! parameter set and the [`ResolvedTarget`] adds exactly one of `branch` or
//! `pullRequest`.

use url::{Url, form_urlencoded};

use crate::SqiError;
use crate::models::{IssuesQuery, SonarMode};

/// Canonical route of the issues search API.
pub const SEARCH_PATH: &str = "/api/issues/search";

/// Records requested per page.
pub const PAGE_SIZE: &str = "100";

const PUBLIC_STATUSES: &str = "OPEN,CONFIRMED";
const PRIVATE_STATUSES: &str = "CONFIRMED,OPEN";
const PUBLIC_FACETS: &str = "impactSoftwareQualities";
const PRIVATE_FACETS: &str = "cleanCodeAttributeCategories,impactSoftwareQualities,severities,types,impactSeverities,codeVariants";

/// Path markers after which a human-authored link stops being an API root.
const NON_API_MARKERS: &[&str] = &["/project/issues", "/api/issues"];

const EXPECTED_LINK_SHAPE: &str =
    "https://<sonar-host>/project/issues?id=<project>&pullRequest=<key>";

/// Canonicalise a web UI link, API root or search link into the search route.
///
/// Query strings and fragments are dropped, the path is cut at the first
/// known non-API marker (or a trailing `/api`), and [`SEARCH_PATH`] is
/// appended. Applying the function to its own output is a no-op.
///
/// # Errors
///
/// Returns [`SqiError::Configuration`] when `raw` is not an absolute
/// `http(s)` URL.
///
/// # Examples
///
/// ```
/// use sqi::sonar::normalize_endpoint;
///
/// let url = normalize_endpoint("https://sonarcloud.io/project/issues?id=p").unwrap();
/// assert_eq!(url.as_str(), "https://sonarcloud.io/api/issues/search");
/// ```
pub fn normalize_endpoint(raw: &str) -> Result<Url, SqiError> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed).map_err(|e| {
        SqiError::configuration(format!("invalid Sonar endpoint '{trimmed}': {e}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SqiError::configuration(format!(
            "Sonar endpoint must use http or https, got '{}'",
            url.scheme()
        )));
    }
    url.set_query(None);
    url.set_fragment(None);

    let path = url.path();
    let marker = NON_API_MARKERS
        .iter()
        .filter_map(|marker| path.find(marker))
        .min();
    // A trailing `/api` is only an API root when no marker matched; after a
    // cut it belongs to the instance prefix.
    let prefix = match marker.and_then(|cut| path.get(..cut)) {
        Some(before) => before.trim_end_matches('/'),
        None => {
            let trimmed = path.trim_end_matches('/');
            trimmed
                .strip_suffix("/api")
                .unwrap_or(trimmed)
                .trim_end_matches('/')
        }
    }
    .to_owned();
    url.set_path(&format!("{prefix}{SEARCH_PATH}"));
    Ok(url)
}

/// Pull out the `pullRequest` key from a Sonar link.
///
/// The key is percent-decoded; [`build_url`] encodes it again.
///
/// # Errors
///
/// Returns [`SqiError::Configuration`] naming the expected link shape when
/// the link carries no `pullRequest=<key>` parameter.
pub fn extract_pull_request_key(link: &str) -> Result<String, SqiError> {
    let link = link.trim();
    let without_fragment = link.split_once('#').map_or(link, |(head, _)| head);
    without_fragment
        .split_once('?')
        .and_then(|(_, query)| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(name, _)| name == "pullRequest")
                .map(|(_, key)| key.into_owned())
        })
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            SqiError::configuration(format!(
                "pull request link '{link}' has no pullRequest key; expected a link like {EXPECTED_LINK_SHAPE}"
            ))
        })
}

/// Build the issues search URL for `query`.
#[must_use]
pub fn build_url(query: &IssuesQuery) -> Url {
    let mut url = query.base_endpoint.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .clear()
            .append_pair("ps", PAGE_SIZE)
            .append_pair("s", "FILE_LINE")
            .append_pair("additionalFields", "_all");
        match query.mode {
            SonarMode::PublicMultiTenant => {
                pairs
                    .append_pair("issueStatuses", PUBLIC_STATUSES)
                    .append_pair("facets", PUBLIC_FACETS)
                    .append_pair("componentKeys", &query.component_key);
                if let Some(org) = &query.organization {
                    pairs.append_pair("organization", org);
                }
            }
            SonarMode::PrivateSelfHosted => {
                let components = query.organization.as_ref().map_or_else(
                    || query.component_key.clone(),
                    |org| format!("{org}/{}", query.component_key),
                );
                pairs
                    .append_pair("issueStatuses", PRIVATE_STATUSES)
                    .append_pair("inNewCodePeriod", "true")
                    .append_pair("facets", PRIVATE_FACETS)
                    .append_pair("timeZone", &query.timezone)
                    .append_pair("components", &components);
            }
        }
        let (name, value) = query.target.query_pair();
        pairs.append_pair(name, value);
    }
    url
}
