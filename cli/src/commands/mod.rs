// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for agnt CLI

use std::io::Write;

use agnt_sdk::AgntClient;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::CliError;
use crate::output::write_json;

pub mod agent;
pub mod job;

pub use self::agent::{InfoArgs, SearchArgs, StatsArgs};
pub use self::job::{JobsArgs, OrderArgs, ResultArgs, StatusArgs};

/// Pagination bounds shared by `search` and `jobs`.
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Resolved state handed to every command.
pub struct CommandContext {
    pub config: Config,
    pub cancel: CancellationToken,
}

impl CommandContext {
    pub fn new(config: Config, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    /// Build an API client from the resolved configuration.
    pub fn client(&self) -> Result<AgntClient, CliError> {
        let mut client = AgntClient::new(&self.config.api_base_url, self.config.request_timeout())
            .map_err(CliError::from)?
            .with_cancellation(self.cancel.clone());
        if let Some(token) = self.config.auth_token() {
            client = client.with_auth_token(token);
        }
        Ok(client)
    }
}

/// Validate `--limit`/`--offset` and convert them for the client.
pub(crate) fn validate_pagination(limit: i64, offset: i64) -> Result<(u32, u32), CliError> {
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(CliError::validation("limit must be between 1 and 100"));
    }
    if offset < 0 {
        return Err(CliError::validation("offset must be non-negative"));
    }
    let offset = u32::try_from(offset)
        .map_err(|_| CliError::validation("offset is too large"))?;
    Ok((limit as u32, offset))
}

pub(crate) fn print<T: Serialize>(out: &mut dyn Write, payload: &T) -> Result<(), CliError> {
    write_json(out, payload).map_err(|e| CliError::internal(format!("write output: {}", e)))
}

/// `agnt version`
pub fn version(out: &mut dyn Write) -> Result<(), CliError> {
    print(
        out,
        &serde_json::json!({
            "name": "agnt",
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}
