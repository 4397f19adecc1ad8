// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent discovery commands
//!
//! Commands: search, info, stats

use std::io::Write;

use agnt_sdk::SearchAgentsOptions;
use clap::Args;
use tracing::info;

use super::{print, validate_pagination, CommandContext, DEFAULT_PAGE_LIMIT};
use crate::error::CliError;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text search query
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Filter by exact tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Results per page (1-100)
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT, allow_negative_numbers = true)]
    pub limit: i64,

    /// Pagination offset
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub offset: i64,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Agent ID
    #[arg(value_name = "AGENT_ID")]
    pub agent_id: String,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Agent ID
    #[arg(value_name = "AGENT_ID")]
    pub agent_id: String,
}

pub async fn search(
    args: SearchArgs,
    ctx: &CommandContext,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let (limit, offset) = validate_pagination(args.limit, args.offset)?;
    let client = ctx.client()?;

    info!(query = %args.query, limit, offset, "Searching agents");
    let resp = client
        .search_agents(
            &args.query,
            &SearchAgentsOptions {
                tag: args.tag,
                limit,
                offset,
            },
        )
        .await?;

    print(out, &resp)
}

pub async fn show(args: InfoArgs, ctx: &CommandContext, out: &mut dyn Write) -> Result<(), CliError> {
    let client = ctx.client()?;
    let agent = client.get_agent(&args.agent_id).await?;
    print(out, &agent)
}

pub async fn stats(args: StatsArgs, ctx: &CommandContext, out: &mut dyn Write) -> Result<(), CliError> {
    let client = ctx.client()?;
    let stats = client.get_agent_stats(&args.agent_id).await?;
    print(out, &stats)
}
