//! `sqi` CLI entrypoint.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sqi::auth::process_env;
use sqi::cli_args::{GlobalArgs, IssuesArgs, PrArgs};
use sqi::{SqiError, commands, config};
use tracing::error;

#[derive(Parser)]
#[command(
    name = "sqi",
    about = "Fetch Sonar issues for the pull request of the current branch",
    version
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch issues for a pull request or branch and write them to a file
    Issues(IssuesArgs),
    /// Show the pull request detected for a branch
    Pr(PrArgs),
}

async fn run(cli: Cli) -> Result<(), SqiError> {
    let global = config::load_global(cli.global)?;
    match cli.command {
        Commands::Issues(args) => {
            let args = config::load_subcommand(&args)?;
            commands::run_issues(args, &global, &process_env).await
        }
        Commands::Pr(args) => {
            let args = config::load_subcommand(&args)?;
            commands::run_pr(args, &global, &process_env).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("sqi=info"))
        .init();
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_fetch_failure() {
                error!("issues query failed: {e}");
            } else {
                error!("{e}");
            }
            // Nothing more can be reported if stderr is gone.
            let _ = writeln!(io::stderr().lock(), "error: {e}");
            ExitCode::FAILURE
        }
    }
}
