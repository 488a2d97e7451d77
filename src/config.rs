//! Configuration loading and validation.
//!
//! Layers defaults, configuration files, `SQI_*` environment variables and
//! CLI flags through `ortho_config`, then turns the merged arguments into the
//! validated settings the fetch pipeline consumes.

use std::ffi::OsString;

use ortho_config::{OrthoConfig, load_and_merge_subcommand_for};
use tracing::debug;

use crate::SqiError;
use crate::auth::{
    EnvLookup, resolve_bitbucket_email, resolve_bitbucket_token, resolve_github_token,
    resolve_sonar_token,
};
use crate::cli_args::GlobalArgs;
use crate::http::Timeouts;
use crate::models::ProviderKind;
use crate::providers::{ProviderSettings, RepoCoordinates};
use crate::sonar::{SonarOptions, SonarSettings};

/// Load global options from files and the environment, then apply `cli`.
///
/// # Errors
///
/// Returns [`SqiError::LoadConfig`] when a configuration source cannot be
/// read or parsed.
pub fn load_global(cli: GlobalArgs) -> Result<GlobalArgs, SqiError> {
    let mut global = GlobalArgs::load_from_iter([OsString::from("sqi")])?;
    global.merge(cli);
    Ok(global)
}

/// Merge a sub-command's CLI arguments over its `[cmds.<name>]` section and
/// `SQICMDS_<NAME>_*` variables.
///
/// # Errors
///
/// Returns [`SqiError::LoadConfig`] when configuration gathering fails.
pub fn load_subcommand<T>(cli_args: &T) -> Result<T, SqiError>
where
    T: OrthoConfig + serde::Serialize + Default + clap::CommandFactory,
{
    load_and_merge_subcommand_for::<T>(cli_args).map_err(SqiError::from)
}

/// Request and connect timeouts from the global options.
#[must_use]
pub fn timeouts(global: &GlobalArgs) -> Timeouts {
    Timeouts::from_secs(global.http_timeout, global.connect_timeout)
}

/// Validate the Sonar options.
///
/// # Errors
///
/// Returns [`SqiError::Configuration`] when the service mode cannot be
/// satisfied by the configured identifiers and credentials.
pub fn sonar_settings(global: &GlobalArgs, env: EnvLookup<'_>) -> Result<SonarSettings, SqiError> {
    SonarSettings::from_options(SonarOptions {
        url: global.sonar_url.clone(),
        token: resolve_sonar_token(global, env),
        public: global.sonar_public,
        organization: global.sonar_organization.clone(),
        project_key: global.sonar_project_key.clone(),
        timezone: global.sonar_timezone.clone(),
    })
}

/// Assemble provider settings, filling gaps from the `origin` remote.
///
/// The provider kind and repository come from configuration when given;
/// otherwise from `origin`. Coordinates from `origin` are only used when they
/// belong to the configured provider.
///
/// # Errors
///
/// Returns [`SqiError::Configuration`] when `--repo` is not `owner/name`.
pub fn provider_settings(
    global: &GlobalArgs,
    env: EnvLookup<'_>,
    origin: Option<(ProviderKind, RepoCoordinates)>,
) -> Result<ProviderSettings, SqiError> {
    let configured_repo = global
        .repo
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(|r| {
            RepoCoordinates::parse(r).ok_or_else(|| {
                SqiError::configuration(format!("repository '{r}' is not in owner/name form"))
            })
        })
        .transpose()?;
    let kind = global.provider.or(origin.as_ref().map(|(k, _)| *k));
    let repo = configured_repo.or_else(|| {
        origin
            .filter(|(origin_kind, _)| Some(*origin_kind) == kind)
            .map(|(_, repo)| repo)
    });
    if let (Some(kind), Some(repo)) = (kind, &repo) {
        debug!("pull request detection targets {kind} repository {repo}");
    }
    let (token, email, api_url) = match kind {
        Some(ProviderKind::GitHub) => (
            resolve_github_token(global, env),
            None,
            global.github_api_url.clone(),
        ),
        Some(ProviderKind::Bitbucket) => (
            resolve_bitbucket_token(global, env),
            resolve_bitbucket_email(global, env),
            global.bitbucket_api_url.clone(),
        ),
        None => (None, None, None),
    };
    Ok(ProviderSettings {
        kind,
        repo,
        token,
        email,
        api_url,
    })
}
