//! Decide what to query and fetch the matching issues.
//!
//! Precedence is: an explicit pull request link, then a pull request
//! detected for the branch, then the branch itself. A branch query that
//! comes back empty is retried once against [`DEVELOP_BRANCH`].

use tracing::{debug, info};

use crate::SqiError;
use crate::branch_pr::{DetectionSource, resolve_pull_request};
use crate::models::{FetchOutcome, Issue, ResolvedTarget};
use crate::providers::PullRequestLookup;
use crate::sonar::{IssueSearch, SonarSettings, build_url, extract_pull_request_key};

/// Branch queried when the requested branch has no issues.
pub const DEVELOP_BRANCH: &str = "develop";

/// What the caller asked for.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchRequest<'a> {
    /// Branch to analyse; usually the current Git branch.
    pub branch: Option<&'a str>,
    /// Link to a pull request page in the code-quality service.
    pub pr_link: Option<&'a str>,
}

async fn run_query<S: IssueSearch>(
    search: &S,
    sonar: &SonarSettings,
    target: ResolvedTarget,
) -> Result<(Vec<Issue>, ResolvedTarget), SqiError> {
    let query = sonar.query_for(target)?;
    let url = build_url(&query);
    debug!("querying issues for {:?}", query.target);
    let payload = search.search_issues(&url).await?;
    Ok((payload.issues, query.target))
}

/// Pick the target for `branch` and describe where it came from.
async fn target_for_branch<L: PullRequestLookup>(
    lookup: Option<&L>,
    branch: &str,
) -> (ResolvedTarget, String) {
    let Some(pr) = resolve_pull_request(lookup, branch).await else {
        return (ResolvedTarget::Branch(branch.to_owned()), branch.to_owned());
    };
    let description = match pr.source {
        DetectionSource::Api(kind) => format!(
            "pull request #{} (detected via {kind} for branch '{branch}')",
            pr.id
        ),
        DetectionSource::BranchName => {
            format!("pull request #{} (inferred from branch name '{branch}')", pr.id)
        }
    };
    (ResolvedTarget::PullRequestId(pr.id), description)
}

/// Fetch issues for the pull request link or branch in `request`.
///
/// A malformed link or a missing branch is rejected before any request is
/// sent. Pull request detection failures are not errors; failures of the
/// issues query itself are.
///
/// # Errors
///
/// Returns [`SqiError::Configuration`] for unusable input and propagates
/// any error from `search`.
pub async fn fetch_issues<S, L>(
    search: &S,
    lookup: Option<&L>,
    sonar: &SonarSettings,
    request: FetchRequest<'_>,
) -> Result<FetchOutcome, SqiError>
where
    S: IssueSearch,
    L: PullRequestLookup,
{
    if let Some(link) = request.pr_link.filter(|l| !l.trim().is_empty()) {
        let key = extract_pull_request_key(link)?;
        info!("using pull request {key} from link");
        let description = format!("pull request {key} (from link)");
        let (issues, target) =
            run_query(search, sonar, ResolvedTarget::PullRequestKey(key)).await?;
        return Ok(FetchOutcome {
            issues,
            source_description: description,
            target,
        });
    }

    let branch = request
        .branch
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| {
            SqiError::configuration(
                "no branch to analyse: pass --branch or --pr-link, or run inside a Git checkout",
            )
        })?;
    // Surface identifier problems before contacting the provider.
    sonar.query_for(ResolvedTarget::Branch(branch.to_owned()))?;

    let (target, description) = target_for_branch(lookup, branch).await;
    let (issues, target) = run_query(search, sonar, target).await?;
    if issues.is_empty() && target.is_branch() && branch != DEVELOP_BRANCH {
        info!("no issues on branch '{branch}'; falling back to '{DEVELOP_BRANCH}'");
        let (issues, target) = run_query(
            search,
            sonar,
            ResolvedTarget::Branch(DEVELOP_BRANCH.to_owned()),
        )
        .await?;
        return Ok(FetchOutcome {
            issues,
            source_description: DEVELOP_BRANCH.to_owned(),
            target,
        });
    }
    Ok(FetchOutcome {
        issues,
        source_description: description,
        target,
    })
}
