// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Wire types for the marketplace API.
//!
//! Pricing, schemas and job params are agent-defined, so they stay untyped
//! JSON. Nullable server fields are `Option` so `null` round-trips.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form JSON object.
pub type JsonObject = Map<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct SearchAgentsOptions {
    pub tag: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchAgentsResponse {
    pub agents: Vec<AgentSummary>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
    pub agent_id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pricing: JsonObject,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDetailResponse {
    pub agent_id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pricing: JsonObject,
    #[serde(default)]
    pub input_schema: JsonObject,
    #[serde(default)]
    pub output_schema: JsonObject,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate job statistics for one agent. Fields the client does not know
/// about are kept in `extra` and printed back out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatsResponse {
    pub total_jobs: i64,
    pub completed_jobs: i64,
    pub failed_jobs: i64,
    pub avg_duration_seconds: Option<f64>,
    pub success_rate: Option<f64>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Accepted,
    Rejected,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Pending,
        JobStatus::Accepted,
        JobStatus::Rejected,
        JobStatus::Running,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Accepted => "accepted",
            JobStatus::Rejected => "rejected",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job status: {0}")]
pub struct UnknownJobStatus(pub String);

impl FromStr for JobStatus {
    type Err = UnknownJobStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownJobStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateJobRequest<'a> {
    pub agent_id: &'a str,
    pub prompt: &'a str,
    pub params: &'a JsonObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: String,
    pub agent_id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ListJobsOptions {
    pub agent_id: Option<String>,
    pub status: Option<JobStatus>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobListItem>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListItem {
    pub job_id: String,
    pub agent_id: String,
    pub prompt: String,
    pub status: JobStatus,
    pub progress: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDetailResponse {
    pub job_id: String,
    pub agent_id: String,
    pub prompt: String,
    #[serde(default)]
    pub params: JsonObject,
    pub status: JobStatus,
    pub progress: i64,
    pub decision_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Result manifest for a job. Only a `completed` manifest is downloadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResultResponse {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub files: Vec<JobResultFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResultFile {
    /// Server-declared relative path. Never used as a filesystem path directly.
    pub path: String,
    pub download_url: String,
    pub size_bytes: Option<u64>,
    pub mime_type: Option<String>,
}
