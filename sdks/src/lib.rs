// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! agnt Rust SDK
//!
//! Typed client for the agnt job marketplace API: agent search and
//! metadata, job submission, job status and result manifests.

pub mod client;
pub mod error;
pub mod identifier;
pub mod types;

pub use client::AgntClient;
pub use error::{ApiError, HttpError};
pub use identifier::{is_valid_identifier, IdentifierKind};
pub use types::*;
