// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Job result downloads
//!
//! Files are fetched one at a time in manifest order. The first failure
//! aborts the batch and files already written stay on disk.

use std::path::Path;
use std::time::Duration;

use agnt_sdk::{JobResultFile, JobResultResponse, JobStatus};
use reqwest::{Client, Url};
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub mod path_resolver;

pub use path_resolver::{resolve, PathResolveError};

/// Per-file ceiling on bytes written to disk.
pub const MAX_DOWNLOAD_BYTES: u64 = 1 << 30;

/// Result artifacts can be large, so downloads get their own timeout.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("job status is {status:?}, must be completed to download results")]
    JobNotCompleted { status: String },

    #[error("invalid result file path {path:?}: {reason}")]
    InvalidManifest { path: String, reason: String },

    #[error("download {path:?} failed: {reason}")]
    Failed { path: String, reason: String },

    #[error("build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl DownloadError {
    fn failed(file: &JobResultFile, reason: impl ToString) -> Self {
        DownloadError::Failed {
            path: file.path.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Summary printed after a successful `result` command.
#[derive(Debug, Clone, Serialize)]
pub struct ResultOutput {
    pub job_id: String,
    pub status: JobStatus,
    pub files: Vec<DownloadedFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadedFile {
    /// Local destination that was written.
    pub path: String,
    /// As reported by the server, not re-measured.
    pub size_bytes: Option<u64>,
    pub mime_type: Option<String>,
}

pub struct ResultDownloader {
    client: Client,
    cancel: CancellationToken,
    max_bytes: u64,
}

impl ResultDownloader {
    pub fn new(cancel: CancellationToken) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(DownloadError::Client)?;

        Ok(Self {
            client,
            cancel,
            max_bytes: MAX_DOWNLOAD_BYTES,
        })
    }

    /// Override the per-file byte ceiling.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Download every file of a completed manifest into `output_dir`.
    pub async fn download_all(
        &self,
        manifest: &JobResultResponse,
        output_dir: &Path,
    ) -> Result<ResultOutput, DownloadError> {
        if manifest.status != JobStatus::Completed {
            return Err(DownloadError::JobNotCompleted {
                status: manifest.status.to_string(),
            });
        }

        let mut files = Vec::with_capacity(manifest.files.len());
        for file in &manifest.files {
            let destination =
                resolve(output_dir, &file.path).map_err(|e| DownloadError::InvalidManifest {
                    path: file.path.clone(),
                    reason: e.to_string(),
                })?;

            self.download_file(file, &destination).await?;

            files.push(DownloadedFile {
                path: destination.display().to_string(),
                size_bytes: file.size_bytes,
                mime_type: file.mime_type.clone(),
            });
        }

        info!(
            job_id = %manifest.job_id,
            files = files.len(),
            "Downloaded job result files"
        );

        Ok(ResultOutput {
            job_id: manifest.job_id.clone(),
            status: manifest.status,
            files,
        })
    }

    async fn download_file(
        &self,
        file: &JobResultFile,
        destination: &Path,
    ) -> Result<u64, DownloadError> {
        let url = validate_download_url(&file.download_url)
            .map_err(|reason| DownloadError::failed(file, reason))?;

        debug!(url = %url, destination = %destination.display(), "Downloading result file");

        let mut response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(DownloadError::failed(file, "request cancelled")),
            res = self.client.get(url).send() => res
                .map_err(|e| DownloadError::failed(file, format!("send request: {}", e)))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::failed(
                file,
                format!("unexpected status {}", status.as_u16()),
            ));
        }

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DownloadError::failed(file, format!("create destination directory: {}", e))
            })?;
        }

        let mut out = tokio::fs::File::create(destination).await.map_err(|e| {
            DownloadError::failed(file, format!("create destination file: {}", e))
        })?;

        let mut written: u64 = 0;
        while written < self.max_bytes {
            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(DownloadError::failed(file, "request cancelled")),
                chunk = response.chunk() => chunk
                    .map_err(|e| DownloadError::failed(file, format!("write destination file: {}", e)))?,
            };
            let Some(chunk) = chunk else { break };

            let remaining = self.max_bytes - written;
            let take = chunk.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
            out.write_all(&chunk[..take]).await.map_err(|e| {
                DownloadError::failed(file, format!("write destination file: {}", e))
            })?;
            written += take as u64;
        }

        if written >= self.max_bytes {
            warn!(
                path = %file.path,
                max_bytes = self.max_bytes,
                "Result file reached the download size ceiling"
            );
        }

        out.flush().await.map_err(|e| {
            DownloadError::failed(file, format!("close destination file: {}", e))
        })?;

        Ok(written)
    }
}

/// Accept only absolute `http`/`https` URLs.
fn validate_download_url(raw: &str) -> Result<Url, String> {
    if raw.trim().is_empty() {
        return Err("download_url must not be empty".to_string());
    }
    let url = Url::parse(raw).map_err(|e| format!("parse download url: {}", e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => {
            warn!(scheme = %scheme, "Rejected result download url scheme");
            Err(format!("unsupported download url scheme {:?}", scheme))
        }
    }
}
