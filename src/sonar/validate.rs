//! Validation of raw issues-search responses.

use crate::SqiError;
use crate::models::IssuesPayload;

/// Maximum number of characters kept from a non-JSON body.
pub const BODY_SNIPPET_LEN: usize = 500;
/// Maximum number of characters kept from an error-status body.
pub const STATUS_SNIPPET_LEN: usize = 200;

/// Status, declared content type and body of an HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Keep at most `max` characters of `text`.
///
/// Returns an empty string when `max` is zero.
#[must_use]
pub fn snippet(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Whether a `Content-Type` header value denotes JSON.
///
/// Accepts `application/json` and structured `+json` suffixes, ignoring
/// parameters such as `charset`.
#[must_use]
pub fn is_json_content_type(value: &str) -> bool {
    let media = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media == "application/json" || (media.starts_with("application/") && media.ends_with("+json"))
}

/// Turn a response into an issues payload or a typed failure.
///
/// The content type is checked before the status so an HTML login page is
/// reported as such whatever status accompanies it.
///
/// # Errors
///
/// Returns [`SqiError::UnexpectedContentType`] for non-JSON bodies,
/// [`SqiError::Http`] for statuses outside `200..300`, and
/// [`SqiError::BadResponseSerde`] when the body does not match the payload
/// shape.
pub fn validate_response(resp: &HttpResponse) -> Result<IssuesPayload, SqiError> {
    let declared = resp.content_type.as_deref().unwrap_or_default();
    if !is_json_content_type(declared) {
        let content_type = if declared.is_empty() {
            "<none>"
        } else {
            declared
        };
        return Err(SqiError::UnexpectedContentType {
            content_type: content_type.into(),
            status: resp.status,
            snippet: snippet(&resp.body, BODY_SNIPPET_LEN).into_boxed_str(),
        });
    }
    if !(200..300).contains(&resp.status) {
        return Err(SqiError::Http {
            status: resp.status,
            snippet: snippet(&resp.body, STATUS_SNIPPET_LEN).into_boxed_str(),
        });
    }
    let de = &mut serde_json::Deserializer::from_str(&resp.body);
    serde_path_to_error::deserialize(de).map_err(|e| {
        let path = e.path().to_string();
        let inner = e.into_inner();
        SqiError::BadResponseSerde {
            status: resp.status,
            message: format!("{inner} at {path}").into_boxed_str(),
            snippet: snippet(&resp.body, STATUS_SNIPPET_LEN).into_boxed_str(),
        }
    })
}
