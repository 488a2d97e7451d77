//! Core data types shared by the resolver, the URL builder and the fetcher.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::SqiError;

/// Git hosting provider used for pull request detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(name = "github")]
    GitHub,
    #[value(name = "bitbucket")]
    Bitbucket,
}

impl ProviderKind {
    /// Whether the provider is asked again for closed and merged pull
    /// requests when no open one matches.
    #[must_use]
    pub fn searches_closed_pull_requests(self) -> bool {
        matches!(self, Self::GitHub)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GitHub => "GitHub",
            Self::Bitbucket => "Bitbucket",
        })
    }
}

/// Deployment flavour of the code-quality service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SonarMode {
    /// Shared service addressed by organization and component key.
    PublicMultiTenant,
    /// Dedicated instance addressed by project key; requires a token.
    PrivateSelfHosted,
}

/// The single thing an issues query is narrowed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResolvedTarget {
    Branch(String),
    /// Key taken from an explicit pull request link.
    PullRequestKey(String),
    /// Identifier found by pull request detection.
    PullRequestId(String),
}

impl ResolvedTarget {
    /// Query parameter name and value selecting this target.
    #[must_use]
    pub fn query_pair(&self) -> (&'static str, &str) {
        match self {
            Self::Branch(name) => ("branch", name),
            Self::PullRequestKey(key) | Self::PullRequestId(key) => ("pullRequest", key),
        }
    }

    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(self, Self::Branch(_))
    }
}

/// A fully specified issues search.
///
/// Construct via [`IssuesQuery::new`], which enforces the per-mode
/// identifier requirements.
#[derive(Debug, Clone)]
pub struct IssuesQuery {
    pub base_endpoint: Url,
    pub mode: SonarMode,
    pub target: ResolvedTarget,
    pub component_key: String,
    pub organization: Option<String>,
    pub timezone: String,
}

impl IssuesQuery {
    /// Validate identifiers for `mode` and assemble the query.
    ///
    /// # Errors
    ///
    /// Returns [`SqiError::Configuration`] when the component key is empty,
    /// or when the public mode lacks an organization.
    pub fn new(
        base_endpoint: Url,
        mode: SonarMode,
        target: ResolvedTarget,
        component_key: impl Into<String>,
        organization: Option<String>,
        timezone: impl Into<String>,
    ) -> Result<Self, SqiError> {
        let component_key = component_key.into();
        if component_key.trim().is_empty() {
            return Err(SqiError::configuration(
                "a Sonar project/component key is required",
            ));
        }
        let organization = organization.filter(|org| !org.trim().is_empty());
        if mode == SonarMode::PublicMultiTenant && organization.is_none() {
            return Err(SqiError::configuration(
                "public Sonar mode requires an organization",
            ));
        }
        Ok(Self {
            base_endpoint,
            mode,
            target,
            component_key,
            organization,
            timezone: timezone.into(),
        })
    }
}

/// Severities reported by the service; anything else is `UNKNOWN`.
pub const KNOWN_SEVERITIES: &[&str] = &["BLOCKER", "CRITICAL", "MAJOR", "MINOR", "INFO"];

/// Label used for missing or unrecognised severities.
pub const UNKNOWN_SEVERITY: &str = "UNKNOWN";

/// A single static-analysis finding.
///
/// Only the severity is interpreted; every other field is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Issue {
    /// Normalised severity label.
    #[must_use]
    pub fn severity_label(&self) -> &str {
        self.severity
            .as_deref()
            .filter(|s| KNOWN_SEVERITIES.contains(s))
            .unwrap_or(UNKNOWN_SEVERITY)
    }
}

/// Body of an issues search response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IssuesPayload {
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Result of a fetch together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchOutcome {
    pub issues: Vec<Issue>,
    /// Human-readable provenance: which link, pull request or branch was
    /// queried.
    pub source_description: String,
    pub target: ResolvedTarget,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn endpoint() -> Url {
        Url::parse("https://sonar.example.com/api/issues/search").expect("url")
    }

    #[rstest]
    #[case(Some("MAJOR"), "MAJOR")]
    #[case(Some("BLOCKER"), "BLOCKER")]
    #[case(Some("UNSPECIFIED"), "UNKNOWN")]
    #[case(Some("major"), "UNKNOWN")]
    #[case(None, "UNKNOWN")]
    fn severity_labels(#[case] severity: Option<&str>, #[case] expected: &str) {
        let issue = Issue {
            severity: severity.map(str::to_owned),
            ..Issue::default()
        };
        assert_eq!(issue.severity_label(), expected);
    }

    #[test]
    fn issue_keeps_unknown_fields() {
        let value = json!({"key": "AX1", "severity": "MINOR", "line": 12});
        let issue: Issue = serde_json::from_value(value.clone()).expect("deserialize");
        assert_eq!(issue.fields.get("line"), Some(&json!(12)));
        assert_eq!(serde_json::to_value(&issue).expect("serialize"), value);
    }

    #[test]
    fn payload_without_issues_is_empty() {
        let payload: IssuesPayload =
            serde_json::from_value(json!({"paging": {"total": 0}})).expect("deserialize");
        assert!(payload.issues.is_empty());
    }

    #[rstest]
    #[case(ResolvedTarget::Branch("main".into()), ("branch", "main"))]
    #[case(ResolvedTarget::PullRequestKey("AB-12".into()), ("pullRequest", "AB-12"))]
    #[case(ResolvedTarget::PullRequestId("42".into()), ("pullRequest", "42"))]
    fn target_query_pairs(#[case] target: ResolvedTarget, #[case] expected: (&str, &str)) {
        assert_eq!(target.query_pair(), expected);
    }

    #[test]
    fn public_query_requires_organization() {
        let err = IssuesQuery::new(
            endpoint(),
            SonarMode::PublicMultiTenant,
            ResolvedTarget::Branch("main".into()),
            "proj",
            None,
            "UTC",
        )
        .expect_err("missing organization");
        assert!(matches!(err, SqiError::Configuration(_)));
    }

    #[test]
    fn private_query_needs_only_component() {
        let query = IssuesQuery::new(
            endpoint(),
            SonarMode::PrivateSelfHosted,
            ResolvedTarget::Branch("main".into()),
            "proj",
            Some(String::new()),
            "UTC",
        )
        .expect("private query");
        assert!(query.organization.is_none());
    }

    #[test]
    fn blank_component_key_is_rejected() {
        let err = IssuesQuery::new(
            endpoint(),
            SonarMode::PrivateSelfHosted,
            ResolvedTarget::Branch("main".into()),
            "  ",
            None,
            "UTC",
        )
        .expect_err("blank key");
        assert!(err.to_string().contains("project/component key"));
    }

    #[test]
    fn target_serialises_with_kind_tag() {
        let value = serde_json::to_value(ResolvedTarget::PullRequestId("7".into()))
            .expect("serialize");
        assert_eq!(value, json!({"kind": "pull_request_id", "value": "7"}));
    }
}
