//! Git working-copy detection helpers.
//!
//! Finds the current branch and the hosting provider and repository behind
//! the `origin` remote. Every helper returns `None` rather than failing when
//! Git is unavailable or the directory is not a repository.

use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::ProviderKind;
use crate::providers::RepoCoordinates;

static REMOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[@/])(?P<host>github\.com|bitbucket\.org)[/:](?P<owner>[^/]+)/(?P<repo>[^/]+?)(?:\.git)?/?$",
    )
    .expect("valid regex")
});

fn git_output(dir: Option<&Path>, args: &[&str]) -> Option<String> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(d) = dir {
        cmd.current_dir(d);
    }
    let output = cmd.output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Branch detection that runs Git in `dir`, or the working directory.
pub(crate) fn current_branch_impl(dir: Option<&Path>) -> Option<String> {
    // Prints nothing on a detached HEAD.
    git_output(dir, &["branch", "--show-current"])
}

/// Name of the checked-out branch, via `git branch --show-current`.
///
/// Returns `None` outside a repository or on a detached HEAD.
pub fn current_branch() -> Option<String> {
    current_branch_impl(None)
}

/// Recognise a GitHub or Bitbucket remote URL in HTTPS or SSH form.
///
/// # Examples
///
/// ```
/// use sqi::git::parse_remote_url;
/// use sqi::models::ProviderKind;
///
/// let (kind, repo) = parse_remote_url("git@bitbucket.org:acme/widget.git").expect("remote");
/// assert_eq!(kind, ProviderKind::Bitbucket);
/// assert_eq!(repo.to_string(), "acme/widget");
/// assert!(parse_remote_url("https://gitlab.com/acme/widget.git").is_none());
/// ```
#[must_use]
pub fn parse_remote_url(url: &str) -> Option<(ProviderKind, RepoCoordinates)> {
    let caps = REMOTE_RE.captures(url.trim())?;
    let kind = match caps.name("host")?.as_str() {
        "github.com" => ProviderKind::GitHub,
        _ => ProviderKind::Bitbucket,
    };
    let owner = caps.name("owner")?.as_str();
    let name = caps.name("repo")?.as_str();
    let repo = RepoCoordinates::parse(&format!("{owner}/{name}"))?;
    Some((kind, repo))
}

/// Origin lookup that runs Git in `dir`, or the working directory.
pub(crate) fn repo_from_origin_impl(dir: Option<&Path>) -> Option<(ProviderKind, RepoCoordinates)> {
    let url = git_output(dir, &["remote", "get-url", "origin"])?;
    parse_remote_url(&url)
}

/// Provider and repository behind the `origin` remote, when it points at
/// GitHub or Bitbucket.
pub fn repo_from_origin() -> Option<(ProviderKind, RepoCoordinates)> {
    repo_from_origin_impl(None)
}
