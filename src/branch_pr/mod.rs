//! Resolve the pull request associated with a Git branch.
//!
//! The provider's REST API is asked first (open pull requests, then any state
//! for providers that support it). When the API has nothing to offer, a PR
//! number embedded in the branch name is used instead. Detection is
//! best-effort: provider failures are logged and treated as "not found".

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::SqiError;
use crate::models::ProviderKind;
use crate::providers::{PullRequestLookup, PullRequestSummary};

static PR_BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:pr|pull)/(\d+)").expect("valid regex"));

static TOPIC_BRANCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:feat|feature|fix|bugfix)/\D*?(\d+)").expect("valid regex")
});

/// Where a detected pull request identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// Matched by the provider's pull request listing.
    Api(ProviderKind),
    /// Inferred from digits in the branch name; lower confidence.
    BranchName,
}

/// A pull request identifier found for a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedPullRequest {
    pub id: String,
    pub source: DetectionSource,
    pub title: Option<String>,
}

impl fmt::Display for DetectedPullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)?;
        if let Some(title) = &self.title {
            write!(f, " {title}")?;
        }
        match self.source {
            DetectionSource::Api(kind) => write!(f, " (via {kind})"),
            DetectionSource::BranchName => f.write_str(" (inferred from branch name)"),
        }
    }
}

/// Extract a pull request number embedded in `branch`.
///
/// Recognises `pr/<n>` and `pull/<n>`, and topic branches such as
/// `feature/1234-thing` or `bugfix/JIRA-77`, case-insensitively. The
/// prefixes are not anchored, so `hotfix/12` matches through `fix/`.
///
/// # Examples
///
/// ```
/// use sqi::branch_pr::pr_number_from_branch;
///
/// assert_eq!(pr_number_from_branch("PR/1234").as_deref(), Some("1234"));
/// assert_eq!(pr_number_from_branch("feature/1234-x").as_deref(), Some("1234"));
/// assert_eq!(pr_number_from_branch("main"), None);
/// ```
#[must_use]
pub fn pr_number_from_branch(branch: &str) -> Option<String> {
    [&*PR_BRANCH_RE, &*TOPIC_BRANCH_RE]
        .into_iter()
        .find_map(|re| re.captures(branch)?.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Take the first listed pull request, logging when the choice was ambiguous.
fn first_match(
    kind: ProviderKind,
    branch: &str,
    listed: Result<Vec<PullRequestSummary>, SqiError>,
) -> Option<PullRequestSummary> {
    let prs = listed
        .inspect_err(|e| warn!("{e}; continuing without {kind} pull request detection"))
        .ok()?;
    if prs.len() > 1 {
        debug!(
            "{} pull requests match branch '{branch}' on {kind}; using the first",
            prs.len()
        );
    }
    prs.into_iter().next()
}

/// Ask the provider for a pull request whose source branch is `branch`.
async fn lookup_via_api<L: PullRequestLookup>(lookup: &L, branch: &str) -> Option<PullRequestSummary> {
    let kind = lookup.kind();
    debug!("looking up open {kind} pull requests for branch '{branch}'");
    let open = lookup.list_open_pull_requests_for_branch(branch).await;
    if let Some(pr) = first_match(kind, branch, open) {
        return Some(pr);
    }
    if !kind.searches_closed_pull_requests() {
        return None;
    }
    debug!("no open {kind} pull request for '{branch}'; including closed and merged ones");
    let all = lookup.list_all_pull_requests_for_branch(branch).await;
    first_match(kind, branch, all)
}

/// Resolve the pull request for `branch`, or `None` when there is none.
///
/// `lookup` is `None` when provider credentials or coordinates are missing;
/// detection is skipped entirely in that case. The branch-name heuristic only
/// applies after the provider was asked and found nothing (or failed), so an
/// API match always takes precedence.
pub async fn resolve_pull_request<L: PullRequestLookup>(
    lookup: Option<&L>,
    branch: &str,
) -> Option<DetectedPullRequest> {
    let Some(lookup) = lookup else {
        debug!("no provider lookup available; not detecting a pull request for '{branch}'");
        return None;
    };
    let kind = lookup.kind();
    if let Some(pr) = lookup_via_api(lookup, branch).await {
        info!("detected {kind} pull request #{} for branch '{branch}'", pr.id);
        return Some(DetectedPullRequest {
            id: pr.id.to_string(),
            source: DetectionSource::Api(kind),
            title: pr.title,
        });
    }
    let id = pr_number_from_branch(branch)?;
    info!("no pull request found via {kind}; using #{id} inferred from branch name '{branch}'");
    Some(DetectedPullRequest {
        id,
        source: DetectionSource::BranchName,
        title: None,
    })
}
