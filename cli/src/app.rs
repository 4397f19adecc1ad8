// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command tree, configuration resolution and exit-code mapping.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::commands::{self, CommandContext};
use crate::commands::{InfoArgs, JobsArgs, OrderArgs, ResultArgs, SearchArgs, StatsArgs, StatusArgs};
use crate::config::{Config, ConfigEnv};
use crate::error::{CliError, EXIT_SUCCESS};
use crate::output::write_error;

/// agnt marketplace CLI
#[derive(Parser, Debug)]
#[command(name = "agnt")]
#[command(version, about = "agnt marketplace CLI", long_about = None)]
pub struct Cli {
    /// Path to config file (default: $HOME/.agnt/config.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AGNT_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print CLI version
    Version,

    /// Search for agents
    Search(SearchArgs),

    /// Get agent details
    Info(InfoArgs),

    /// Get agent statistics
    Stats(StatsArgs),

    /// Create a job
    Order(OrderArgs),

    /// List jobs
    Jobs(JobsArgs),

    /// Get job status
    Status(StatusArgs),

    /// Download job result files
    Result(ResultArgs),
}

/// Outcome of argument parsing.
pub enum Parsed {
    Run(Cli),
    Exit(i32),
}

/// Parse arguments. Help and version requests are printed to `stdout`;
/// usage errors are printed to `stderr` as JSON.
pub fn parse_args<I, T>(args: I, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Parsed
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Parsed::Run(cli),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                let _ = write!(stdout, "{}", e.render());
                Parsed::Exit(EXIT_SUCCESS)
            }
            _ => {
                let err = CliError::usage(summarize_usage_error(&e.render().to_string()));
                write_error(stderr, &err);
                Parsed::Exit(err.exit_code)
            }
        },
    }
}

/// Resolve configuration and run one command. Returns the process exit code.
pub async fn execute(
    cli: Cli,
    env: &ConfigEnv,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    cancel: CancellationToken,
) -> i32 {
    match dispatch(cli, env, stdout, cancel).await {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            debug!(code = %err.code, exit_code = err.exit_code, "Command failed");
            write_error(stderr, &err);
            err.exit_code
        }
    }
}

/// Parse `args` and execute the command they name.
pub async fn run<I, T>(
    args: I,
    env: &ConfigEnv,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    cancel: CancellationToken,
) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match parse_args(args, stdout, stderr) {
        Parsed::Run(cli) => execute(cli, env, stdout, stderr, cancel).await,
        Parsed::Exit(code) => code,
    }
}

async fn dispatch(
    cli: Cli,
    env: &ConfigEnv,
    out: &mut dyn Write,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let command = match cli.command {
        None => return Err(CliError::usage("no command specified; use --help for usage")),
        Some(Commands::Version) => return commands::version(out),
        Some(command) => command,
    };

    let config = Config::load(cli.config.as_deref(), env)
        .map_err(|e| CliError::config(format!("{:#}", e)))?;
    let ctx = CommandContext::new(config, cancel);

    match command {
        Commands::Version => commands::version(out),
        Commands::Search(args) => commands::agent::search(args, &ctx, out).await,
        Commands::Info(args) => commands::agent::show(args, &ctx, out).await,
        Commands::Stats(args) => commands::agent::stats(args, &ctx, out).await,
        Commands::Order(args) => commands::job::order(args, &ctx, out).await,
        Commands::Jobs(args) => commands::job::list(args, &ctx, out).await,
        Commands::Status(args) => commands::job::status(args, &ctx, out).await,
        Commands::Result(args) => commands::job::result(args, &ctx, out).await,
    }
}

/// Collapse a rendered clap error to the text above its `Usage:` block.
fn summarize_usage_error(rendered: &str) -> String {
    let summary = rendered
        .lines()
        .take_while(|line| !line.starts_with("Usage:"))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    summary
        .strip_prefix("error: ")
        .unwrap_or(&summary)
        .to_string()
}
