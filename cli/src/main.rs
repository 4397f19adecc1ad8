// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # agnt
//!
//! Command-line client for the agnt job marketplace.
//!
//! ## Commands
//!
//! - `agnt search|info|stats` - Agent discovery
//! - `agnt order|jobs|status|result` - Job lifecycle and result download
//! - `agnt version` - Print CLI version
//!
//! Every command prints exactly one JSON object. Successes go to stdout,
//! failures go to stderr as `{"error": ..., "message": ...}`.

use std::io::Write;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use agnt::{execute, parse_args, ConfigEnv, Parsed};

#[tokio::main]
async fn main() {
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr();

    let cli = match parse_args(std::env::args_os(), &mut stdout, &mut stderr) {
        Parsed::Run(cli) => cli,
        Parsed::Exit(code) => {
            let _ = stdout.flush();
            std::process::exit(code);
        }
    };

    if let Err(e) = init_logging(&cli.log_level) {
        let _ = writeln!(stderr, "agnt: {:#}; falling back to default log level", e);
        let _ = init_logging("warn");
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            info!("Interrupt received, cancelling in-flight requests");
            cancel.cancel();
        }
    });

    let env = ConfigEnv::from_process();
    let code = execute(cli, &env, &mut stdout, &mut stderr, cancel).await;

    let _ = stdout.flush();
    std::process::exit(code);
}

/// Initialize tracing subscriber for logging. Logs always go to stderr so
/// stdout carries only the JSON payload.
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to install log subscriber")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
