// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Structured command errors and process exit codes

use agnt_sdk::ApiError;
use thiserror::Error;

use crate::download::DownloadError;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_GENERIC_FAILURE: i32 = 1;
pub const EXIT_AUTH_FAILURE: i32 = 2;
pub const EXIT_NOT_FOUND: i32 = 3;
pub const EXIT_VALIDATION_FAILURE: i32 = 4;

/// The single error shape the presentation layer prints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CliError {
    pub code: String,
    pub message: String,
    pub exit_code: i32,
}

impl CliError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, exit_code: i32) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            exit_code,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message, EXIT_VALIDATION_FAILURE)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new("config_error", message, EXIT_VALIDATION_FAILURE)
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new("usage_error", message, EXIT_VALIDATION_FAILURE)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message, EXIT_GENERIC_FAILURE)
    }
}

/// Map an HTTP status to an exit code.
pub fn exit_code_for_status(status: u16) -> i32 {
    match status {
        400 | 422 => EXIT_VALIDATION_FAILURE,
        401 | 403 => EXIT_AUTH_FAILURE,
        404 => EXIT_NOT_FOUND,
        _ => EXIT_GENERIC_FAILURE,
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidIdentifier(_) | ApiError::Validation(_) => {
                CliError::validation(err.to_string())
            }
            ApiError::Config(message) => CliError::config(message),
            ApiError::Http(http) => {
                let code = if http.code.is_empty() {
                    "api_error".to_string()
                } else {
                    http.code
                };
                CliError::new(code, http.message, exit_code_for_status(http.status))
            }
            other => CliError::new("api_error", other.to_string(), EXIT_GENERIC_FAILURE),
        }
    }
}

impl From<DownloadError> for CliError {
    fn from(err: DownloadError) -> Self {
        let code = match &err {
            DownloadError::JobNotCompleted { .. } => "job_not_completed",
            DownloadError::InvalidManifest { .. } => "invalid_job_result_manifest",
            DownloadError::Failed { .. } => "download_failed",
            DownloadError::Client(_) => return CliError::internal(err.to_string()),
        };
        CliError::new(code, err.to_string(), EXIT_GENERIC_FAILURE)
    }
}
