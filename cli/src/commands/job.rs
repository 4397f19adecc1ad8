// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Job operations commands
//!
//! Commands: order, jobs, status, result

use std::io::Write;
use std::path::Path;

use agnt_sdk::{JobStatus, JsonObject, ListJobsOptions};
use clap::Args;
use serde_json::Value;
use tracing::info;

use super::{print, validate_pagination, CommandContext, DEFAULT_PAGE_LIMIT};
use crate::download::ResultDownloader;
use crate::error::CliError;

#[derive(Args, Debug)]
pub struct OrderArgs {
    /// Agent ID
    #[arg(value_name = "AGENT_ID")]
    pub agent_id: String,

    /// Prompt text for the job
    #[arg(long, default_value = "")]
    pub prompt: String,

    /// Agent-specific parameter in key=value format (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,
}

#[derive(Args, Debug)]
pub struct JobsArgs {
    /// Filter by agent ID
    #[arg(long)]
    pub agent_id: Option<String>,

    /// Filter by status
    #[arg(long)]
    pub status: Option<String>,

    /// Results per page (1-100)
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT, allow_negative_numbers = true)]
    pub limit: i64,

    /// Pagination offset
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub offset: i64,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Job ID
    #[arg(value_name = "JOB_ID")]
    pub job_id: String,
}

#[derive(Args, Debug)]
pub struct ResultArgs {
    /// Job ID
    #[arg(value_name = "JOB_ID")]
    pub job_id: String,

    /// Output directory for downloaded files
    #[arg(long, default_value = ".")]
    pub output: String,
}

pub async fn order(args: OrderArgs, ctx: &CommandContext, out: &mut dyn Write) -> Result<(), CliError> {
    if args.prompt.trim().is_empty() {
        return Err(CliError::validation("prompt must not be empty"));
    }
    let params = parse_params(&args.params)?;
    let client = ctx.client()?;

    info!(agent_id = %args.agent_id, params = params.len(), "Submitting job");
    let created = client
        .create_job(&args.agent_id, &args.prompt, Some(&params))
        .await?;

    print(out, &created)
}

pub async fn list(args: JobsArgs, ctx: &CommandContext, out: &mut dyn Write) -> Result<(), CliError> {
    let status = match args.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<JobStatus>().map_err(|_| {
            CliError::validation(format!(
                "status must be one of: {}",
                JobStatus::ALL.map(|s| s.as_str()).join(", ")
            ))
        })?),
        None => None,
    };
    let (limit, offset) = validate_pagination(args.limit, args.offset)?;
    let client = ctx.client()?;

    let resp = client
        .list_jobs(&ListJobsOptions {
            agent_id: args.agent_id,
            status,
            limit,
            offset,
        })
        .await?;

    print(out, &resp)
}

pub async fn status(args: StatusArgs, ctx: &CommandContext, out: &mut dyn Write) -> Result<(), CliError> {
    let client = ctx.client()?;
    let job = client.get_job(&args.job_id).await?;
    print(out, &job)
}

/// Fetch the result manifest and download every file into `--output`.
pub async fn result(args: ResultArgs, ctx: &CommandContext, out: &mut dyn Write) -> Result<(), CliError> {
    if args.output.trim().is_empty() {
        return Err(CliError::validation("output must not be empty"));
    }
    let client = ctx.client()?;
    let manifest = client.get_job_result(&args.job_id).await?;

    info!(
        job_id = %manifest.job_id,
        status = %manifest.status,
        files = manifest.files.len(),
        "Fetched job result manifest"
    );

    let downloader = ResultDownloader::new(ctx.cancel.clone())?;
    let summary = downloader
        .download_all(&manifest, Path::new(&args.output))
        .await?;

    print(out, &summary)
}

/// Parse repeated `--param key=value` flags. Values stay strings; later
/// duplicates win.
pub fn parse_params(raw_params: &[String]) -> Result<JsonObject, CliError> {
    let mut params = JsonObject::new();
    for raw in raw_params {
        match raw.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                params.insert(key.to_string(), Value::String(value.to_string()));
            }
            _ => {
                return Err(CliError::validation(format!(
                    "invalid --param value {:?}: expected key=value",
                    raw
                )));
            }
        }
    }
    Ok(params)
}
