//! Command-line argument structures.
//!
//! Isolates clap derivations so lint expectations remain scoped, keeping
//! `main.rs` focused on runtime logic.

use std::path::PathBuf;

use clap::Parser;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::models::ProviderKind;

/// Global options that apply to every sub-command.
#[derive(Parser, Deserialize, Serialize, Default, Debug, OrthoConfig, Clone)]
#[ortho_config(prefix = "SQI")]
pub struct GlobalArgs {
    /// Hosting provider used for pull request detection
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,
    /// Repository as `owner/name` (Bitbucket: `workspace/slug`)
    #[arg(long)]
    pub repo: Option<String>,
    /// GitHub token for pull request detection
    #[arg(long, value_name = "TOKEN")]
    pub github_token: Option<String>,
    /// GitHub REST API root, for GitHub Enterprise
    #[arg(long, value_name = "URL")]
    pub github_api_url: Option<String>,
    /// Bitbucket account email used with the API token
    #[arg(long, value_name = "EMAIL")]
    pub bitbucket_email: Option<String>,
    /// Bitbucket API token
    #[arg(long, value_name = "TOKEN")]
    pub bitbucket_token: Option<String>,
    /// Bitbucket REST API root
    #[arg(long, value_name = "URL")]
    pub bitbucket_api_url: Option<String>,
    /// Sonar server URL; any project or issues link on the server works
    #[arg(long, value_name = "URL")]
    pub sonar_url: Option<String>,
    /// Sonar token; required for self-hosted servers
    #[arg(long, value_name = "TOKEN")]
    pub sonar_token: Option<String>,
    /// Query the public multi-tenant service by organization and project key
    #[arg(long)]
    // `crate::bool_predicates::not` keeps an unset CLI flag from masking config.
    #[serde(default, skip_serializing_if = "crate::bool_predicates::not")]
    pub sonar_public: bool,
    /// Sonar organization
    #[arg(long, value_name = "ORG")]
    pub sonar_organization: Option<String>,
    /// Sonar project (component) key
    #[arg(long, value_name = "KEY")]
    pub sonar_project_key: Option<String>,
    /// Time zone sent to self-hosted servers [default: UTC]
    #[arg(long, value_name = "TZ")]
    pub sonar_timezone: Option<String>,
    /// Write HTTP transcript to this file for debugging
    #[arg(long)]
    pub transcript: Option<PathBuf>,
    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub http_timeout: Option<u64>,
    /// HTTP connection timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,
}

impl GlobalArgs {
    /// Merge another instance into `self`, overwriting only fields that
    /// `other` sets.
    ///
    /// CLI flags have higher priority than configuration sources.
    pub fn merge(&mut self, other: Self) {
        self.provider = other.provider.or(self.provider);
        self.repo = other.repo.or_else(|| self.repo.take());
        self.github_token = other.github_token.or_else(|| self.github_token.take());
        self.github_api_url = other.github_api_url.or_else(|| self.github_api_url.take());
        self.bitbucket_email = other
            .bitbucket_email
            .or_else(|| self.bitbucket_email.take());
        self.bitbucket_token = other
            .bitbucket_token
            .or_else(|| self.bitbucket_token.take());
        self.bitbucket_api_url = other
            .bitbucket_api_url
            .or_else(|| self.bitbucket_api_url.take());
        self.sonar_url = other.sonar_url.or_else(|| self.sonar_url.take());
        self.sonar_token = other.sonar_token.or_else(|| self.sonar_token.take());
        self.sonar_public |= other.sonar_public;
        self.sonar_organization = other
            .sonar_organization
            .or_else(|| self.sonar_organization.take());
        self.sonar_project_key = other
            .sonar_project_key
            .or_else(|| self.sonar_project_key.take());
        self.sonar_timezone = other.sonar_timezone.or_else(|| self.sonar_timezone.take());
        self.transcript = other.transcript.or_else(|| self.transcript.take());
        self.http_timeout = other.http_timeout.or(self.http_timeout);
        self.connect_timeout = other.connect_timeout.or(self.connect_timeout);
    }
}

/// Parameters accepted by the `issues` sub-command.
#[derive(Parser, Deserialize, Serialize, Debug, OrthoConfig, Clone, Default)]
#[command(name = "issues")]
#[ortho_config(prefix = "SQI")]
pub struct IssuesArgs {
    /// Branch to analyse [default: the current Git branch]
    #[arg(long)]
    pub branch: Option<String>,
    /// Sonar pull request link, e.g. `https://host/project/issues?id=p&pullRequest=12`
    #[arg(long, value_name = "URL")]
    pub pr_link: Option<String>,
    /// Where to write the fetched issues [default: sonar-issues.json]
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Parameters accepted by the `pr` sub-command.
#[derive(Parser, Deserialize, Serialize, Debug, OrthoConfig, Clone, Default)]
#[command(name = "pr")]
#[ortho_config(prefix = "SQI")]
pub struct PrArgs {
    /// Branch to look up [default: the current Git branch]
    #[arg(long)]
    pub branch: Option<String>,
}
