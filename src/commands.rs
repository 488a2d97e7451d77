//! Command execution helpers for `sqi`.
//!
//! This module owns the runtime flow for each subcommand: settings
//! validation, branch discovery, client setup, persisting the result file
//! and rendering output to the terminal.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::SqiError;
use crate::auth::EnvLookup;
use crate::branch_pr::{DetectedPullRequest, resolve_pull_request};
use crate::cli_args::{GlobalArgs, IssuesArgs, PrArgs};
use crate::config::{provider_settings, sonar_settings, timeouts};
use crate::fetcher::{FetchRequest, fetch_issues};
use crate::git;
use crate::http::Timeouts;
use crate::models::{FetchOutcome, Issue, ResolvedTarget};
use crate::providers::ProviderClient;
use crate::sonar::SonarClient;
use crate::summary::{print_summary, summarize_severities};

/// Result file written when `--output` is not given.
pub const DEFAULT_OUTPUT: &str = "sonar-issues.json";

/// On-disk shape of a fetch result.
#[derive(Debug, Serialize)]
pub struct ResultFile<'a> {
    pub source: &'a str,
    pub target: &'a ResolvedTarget,
    pub fetched_at: DateTime<Utc>,
    pub total: usize,
    pub issues: &'a [Issue],
}

impl<'a> ResultFile<'a> {
    #[must_use]
    pub fn new(outcome: &'a FetchOutcome, fetched_at: DateTime<Utc>) -> Self {
        Self {
            source: &outcome.source_description,
            target: &outcome.target,
            fetched_at,
            total: outcome.issues.len(),
            issues: &outcome.issues,
        }
    }
}

/// Write `outcome` as pretty JSON to `path`.
///
/// # Errors
///
/// Returns [`SqiError::Json`] or [`SqiError::Io`] when serialisation or the
/// write fails.
pub fn write_result_file(
    path: &Path,
    outcome: &FetchOutcome,
    fetched_at: DateTime<Utc>,
) -> Result<(), SqiError> {
    let mut json = serde_json::to_string_pretty(&ResultFile::new(outcome, fetched_at))?;
    json.push('\n');
    std::fs::write(path, json)?;
    Ok(())
}

/// Create a [`SonarClient`], falling back to no transcript on failure.
fn build_sonar_client(
    token: Option<&str>,
    timeouts: Timeouts,
    transcript: Option<&PathBuf>,
) -> Result<SonarClient, SqiError> {
    match SonarClient::new(token, timeouts, transcript.cloned()) {
        Ok(c) => Ok(c),
        Err(e) if transcript.is_some() => {
            warn!("failed to create transcript: {e}");
            SonarClient::new(token, timeouts, None)
        }
        Err(e) => Err(e),
    }
}

/// Provider lookup for the configured or `origin`-inferred repository.
fn connect_provider(
    global: &GlobalArgs,
    env: EnvLookup<'_>,
    timeouts: Timeouts,
) -> Result<Option<ProviderClient>, SqiError> {
    let settings = provider_settings(global, env, git::repo_from_origin())?;
    Ok(ProviderClient::connect(&settings, timeouts))
}

fn current_or_given_branch(given: Option<String>) -> Option<String> {
    given
        .filter(|b| !b.trim().is_empty())
        .or_else(git::current_branch)
}

/// Fetch issues, persist them and print a severity summary.
///
/// # Errors
///
/// Returns configuration errors before any request, and any fetch or
/// persistence failure.
pub async fn run_issues(
    args: IssuesArgs,
    global: &GlobalArgs,
    env: EnvLookup<'_>,
) -> Result<(), SqiError> {
    let sonar = sonar_settings(global, env)?;
    let timeouts = timeouts(global);
    let link = args.pr_link.as_deref().filter(|l| !l.trim().is_empty());
    let branch = current_or_given_branch(args.branch);
    // A link decides the target on its own; skip provider setup.
    let lookup = if link.is_some() {
        None
    } else {
        connect_provider(global, env, timeouts)?
    };
    let search = build_sonar_client(sonar.token(), timeouts, global.transcript.as_ref())?;
    let outcome = fetch_issues(
        &search,
        lookup.as_ref(),
        &sonar,
        FetchRequest {
            branch: branch.as_deref(),
            pr_link: link,
        },
    )
    .await?;

    let output = args.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    write_result_file(&output, &outcome, Utc::now())?;
    info!(
        "wrote {} issues to {}",
        outcome.issues.len(),
        output.display()
    );
    print_summary(
        &outcome.source_description,
        &summarize_severities(&outcome.issues),
    );
    Ok(())
}

/// Write the resolver's answer for `branch`.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_pr_result<W: Write>(
    mut out: W,
    branch: &str,
    detected: Option<&DetectedPullRequest>,
) -> std::io::Result<()> {
    let line = detected.map_or_else(
        || format!("no pull request found for branch '{branch}'"),
        |pr| format!("pull request {pr} for branch '{branch}'"),
    );
    writeln!(out, "{line}")
}

/// Detect and print the pull request for a branch.
///
/// Finding nothing is not an error.
///
/// # Errors
///
/// Returns [`SqiError::Configuration`] when no branch is known, or a
/// settings error from [`provider_settings`].
pub async fn run_pr(args: PrArgs, global: &GlobalArgs, env: EnvLookup<'_>) -> Result<(), SqiError> {
    let branch = current_or_given_branch(args.branch).ok_or_else(|| {
        SqiError::configuration("no branch to look up: pass --branch or run inside a Git checkout")
    })?;
    let lookup = connect_provider(global, env, timeouts(global))?;
    let detected = resolve_pull_request(lookup.as_ref(), &branch).await;
    if let Err(e) = write_pr_result(std::io::stdout().lock(), &branch, detected.as_ref()) {
        if e.kind() != ErrorKind::BrokenPipe {
            return Err(e.into());
        }
    }
    Ok(())
}
