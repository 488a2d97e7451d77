//! Fetch static-analysis issues for the pull request behind a Git branch.
//!
//! The pipeline resolves a query target (explicit Sonar link, detected pull
//! request, or branch), builds the issues search URL for either service mode
//! and validates the response. The binary adds layered configuration and the
//! result file on top.

pub mod auth;
pub mod bool_predicates;
pub mod branch_pr;
pub mod cli_args;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod git;
pub mod http;
pub mod models;
pub mod providers;
pub mod sonar;
pub mod summary;
#[path = "test_utils_env.rs"]
pub mod test_utils;

pub use cli_args::{GlobalArgs, IssuesArgs, PrArgs};
pub use error::SqiError;
pub use fetcher::{FetchRequest, fetch_issues};
