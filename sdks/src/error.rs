// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! API error taxonomy and non-2xx response normalization.

use std::fmt;

use reqwest::Response;
use serde_json::Value;
use thiserror::Error;

use crate::identifier::IdentifierKind;

/// Upper bound on how much of an error body is buffered.
pub const MAX_ERROR_BODY_BYTES: usize = 1 << 20;

/// Errors returned by [`crate::AgntClient`] operations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid {0} id: must be a valid UUID")]
    InvalidIdentifier(IdentifierKind),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Config(String),

    #[error("send request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("send request: request cancelled")]
    Cancelled,

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("encode request: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A non-2xx response from the marketplace API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    pub status: u16,
    /// Short machine code from the `error` field, empty when absent.
    pub code: String,
    pub message: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            f.write_str(&self.message)
        } else if !self.code.is_empty() {
            f.write_str(&self.code)
        } else {
            write!(f, "http status {}", self.status)
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Build an error from a status code and a raw response body.
    ///
    /// Message resolution: non-blank `message`, then `detail` re-serialized
    /// as JSON, then a status-only fallback. Each field is read on its own,
    /// so a mistyped `message` does not discard a valid `error`. Bodies that
    /// are not JSON objects degrade to the fallback.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let parsed: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let text_field = |name: &str| {
            parsed
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        let mut message = text_field("message");

        if message.is_empty() {
            if let Some(detail) = parsed.get("detail").filter(|d| !d.is_null()) {
                message = serde_json::to_string(detail).unwrap_or_default();
            }
        }

        if message.is_empty() {
            message = format!("request failed with status {}", status);
        }

        Self {
            status,
            code: text_field("error"),
            message,
        }
    }

    /// Drain at most [`MAX_ERROR_BODY_BYTES`] of a failed response and
    /// normalize it. Read failures keep whatever was received.
    pub async fn from_response(response: Response) -> Self {
        let status = response.status().as_u16();
        let body = read_capped(response, MAX_ERROR_BODY_BYTES).await;
        Self::from_body(status, &body)
    }
}

async fn read_capped(mut response: Response, limit: usize) -> Vec<u8> {
    let mut body = Vec::new();
    while body.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read error response body");
                break;
            }
        }
    }
    body
}
