// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Identifier validation for agent and job ids.
//!
//! Ids are interpolated into request paths, so anything that is not the
//! canonical 8-4-4-4-12 hexadecimal UUID text is rejected before a request
//! is built.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .expect("uuid pattern is a valid regex")
});

/// Which kind of resource an identifier addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Agent,
    Job,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Agent => f.write_str("agent"),
            IdentifierKind::Job => f.write_str("job"),
        }
    }
}

/// Returns true iff `id` is a canonical, case-insensitive UUID string.
pub fn is_valid_identifier(id: &str) -> bool {
    UUID_PATTERN.is_match(id)
}
