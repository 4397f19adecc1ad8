// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, HttpError};
use crate::identifier::{is_valid_identifier, IdentifierKind};
use crate::types::*;

const AGENTS_SEARCH_PATH: &str = "/v1/agents/search";
const AGENTS_PATH: &str = "/v1/agents";
const JOBS_PATH: &str = "/v1/jobs";

/// Client for the marketplace API.
///
/// Every call makes exactly one attempt and races the configured
/// cancellation token.
#[derive(Debug, Clone)]
pub struct AgntClient {
    base_url: Url,
    client: Client,
    auth_token: Option<String>,
    cancel: CancellationToken,
}

impl AgntClient {
    /// Create a client for `base_url`, which must be absolute with a host.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("build http client: {}", e)))?;
        Self::with_http_client(base_url, client)
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_http_client(base_url: &str, client: Client) -> Result<Self, ApiError> {
        if base_url.trim().is_empty() {
            return Err(ApiError::Config("api base url must not be empty".to_string()));
        }
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("parse api base url: {}", e)))?;
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(ApiError::Config(
                "api base url must include scheme and host".to_string(),
            ));
        }

        Ok(Self {
            base_url: parsed,
            client,
            auth_token: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Set the bearer token. Blank tokens are ignored.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    /// Abort in-flight requests when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Search agents by free-text query.
    pub async fn search_agents(
        &self,
        query: &str,
        opts: &SearchAgentsOptions,
    ) -> Result<SearchAgentsResponse, ApiError> {
        let mut params = vec![("q", query.to_string())];
        if let Some(tag) = opts.tag.as_deref().filter(|t| !t.is_empty()) {
            params.push(("tag", tag.to_string()));
        }
        push_pagination(&mut params, opts.limit, opts.offset);

        self.get_json(AGENTS_SEARCH_PATH, &params).await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<AgentDetailResponse, ApiError> {
        ensure_identifier(agent_id, IdentifierKind::Agent)?;
        self.get_json(&format!("{}/{}", AGENTS_PATH, agent_id), &[])
            .await
    }

    pub async fn get_agent_stats(&self, agent_id: &str) -> Result<AgentStatsResponse, ApiError> {
        ensure_identifier(agent_id, IdentifierKind::Agent)?;
        self.get_json(&format!("{}/{}/stats", AGENTS_PATH, agent_id), &[])
            .await
    }

    /// Submit a job. `params` defaults to an empty object.
    pub async fn create_job(
        &self,
        agent_id: &str,
        prompt: &str,
        params: Option<&JsonObject>,
    ) -> Result<CreateJobResponse, ApiError> {
        ensure_identifier(agent_id, IdentifierKind::Agent)?;
        if prompt.trim().is_empty() {
            return Err(ApiError::Validation("prompt must not be empty".to_string()));
        }

        let empty = JsonObject::new();
        let request = CreateJobRequest {
            agent_id,
            prompt,
            params: params.unwrap_or(&empty),
        };

        self.send_json(Method::POST, JOBS_PATH, &[], Some(&request))
            .await
    }

    pub async fn list_jobs(&self, opts: &ListJobsOptions) -> Result<ListJobsResponse, ApiError> {
        let mut params = Vec::new();
        if let Some(agent_id) = opts.agent_id.as_deref().filter(|a| !a.is_empty()) {
            ensure_identifier(agent_id, IdentifierKind::Agent)?;
            params.push(("agent_id", agent_id.to_string()));
        }
        if let Some(status) = opts.status {
            params.push(("status", status.to_string()));
        }
        push_pagination(&mut params, opts.limit, opts.offset);

        self.get_json(JOBS_PATH, &params).await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<JobDetailResponse, ApiError> {
        ensure_identifier(job_id, IdentifierKind::Job)?;
        self.get_json(&format!("{}/{}", JOBS_PATH, job_id), &[]).await
    }

    /// Fetch the result manifest for a job.
    pub async fn get_job_result(&self, job_id: &str) -> Result<JobResultResponse, ApiError> {
        ensure_identifier(job_id, IdentifierKind::Job)?;
        self.get_json(&format!("{}/{}/result", JOBS_PATH, job_id), &[])
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.send_json::<(), T>(Method::GET, path, query, None).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        payload: Option<&B>,
    ) -> Result<T, ApiError> {
        let endpoint = self.endpoint(path, query);
        debug!(method = %method, url = %endpoint, "Sending API request");

        let mut request = self.client.request(method, endpoint);
        if let Some(payload) = payload {
            let body = serde_json::to_vec(payload).map_err(ApiError::Encode)?;
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }
        if let Some(token) = &self.auth_token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response: Response = self
            .cancellable(request.send())
            .await?
            .map_err(ApiError::Transport)?;

        let status = response.status();
        debug!(status = status.as_u16(), "Received API response");

        if !status.is_success() {
            let err = self.cancellable(HttpError::from_response(response)).await?;
            return Err(ApiError::Http(err));
        }

        let body = self
            .cancellable(response.bytes())
            .await?
            .map_err(ApiError::Transport)?;
        serde_json::from_slice(&body).map_err(ApiError::Decode)
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Url {
        let mut endpoint = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            self.base_url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        endpoint.set_path(&joined);
        endpoint.set_query(None);
        if !query.is_empty() {
            endpoint
                .query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        endpoint
    }

    async fn cancellable<F: Future>(&self, fut: F) -> Result<F::Output, ApiError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ApiError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

fn ensure_identifier(id: &str, kind: IdentifierKind) -> Result<(), ApiError> {
    if is_valid_identifier(id) {
        Ok(())
    } else {
        Err(ApiError::InvalidIdentifier(kind))
    }
}

fn push_pagination(params: &mut Vec<(&'static str, String)>, limit: u32, offset: u32) {
    if limit > 0 {
        params.push(("limit", limit.to_string()));
    }
    if offset > 0 {
        params.push(("offset", offset.to_string()));
    }
}
