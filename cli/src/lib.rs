// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! agnt CLI library - exposes testable components
//!
//! The binary in `main.rs` is a thin wrapper around [`app::parse_args`] and
//! [`app::execute`]; everything else lives here so it can be driven from
//! integration tests with captured output streams.

pub mod app;
pub mod commands;
pub mod config;
pub mod download;
pub mod error;
pub mod output;

pub use app::{execute, parse_args, run, Cli, Parsed};
pub use config::{Config, ConfigEnv};
pub use error::CliError;
