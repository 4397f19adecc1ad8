// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use agnt::{run, ConfigEnv};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const AGENT_ID: &str = "550e8400-e29b-41d4-a716-446655440000";
const JOB_ID: &str = "9f1c2d3e-4b5a-4c6d-8e7f-0a1b2c3d4e5f";

struct Outcome {
    code: i32,
    stdout: String,
    stderr: String,
}

impl Outcome {
    fn stdout_json(&self) -> Value {
        serde_json::from_str(&self.stdout).expect("stdout is a JSON object")
    }

    fn stderr_json(&self) -> Value {
        serde_json::from_str(&self.stderr).expect("stderr is a JSON object")
    }
}

/// Home directory without a config file, pointed at `base_url`.
fn env_for(home: &TempDir, base_url: &str) -> ConfigEnv {
    ConfigEnv::new(Some(home.path().to_path_buf())).with_var("AGNT_API_BASE_URL", base_url)
}

async fn agnt(args: &[&str], env: &ConfigEnv) -> Outcome {
    let mut argv = vec!["agnt"];
    argv.extend_from_slice(args);

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(argv, env, &mut stdout, &mut stderr, CancellationToken::new()).await;

    Outcome {
        code,
        stdout: String::from_utf8(stdout).unwrap(),
        stderr: String::from_utf8(stderr).unwrap(),
    }
}

fn agent_detail() -> Value {
    json!({
        "agent_id": AGENT_ID,
        "name": "Summarizer",
        "description": "Summarizes documents",
        "tags": ["nlp", "summaries"],
        "pricing": {"model": "per_job", "amount": 5},
        "input_schema": {"type": "object"},
        "output_schema": {"type": "object"},
        "created_at": "2026-02-20T10:00:00Z",
        "updated_at": "2026-02-21T08:30:00Z"
    })
}

fn job_detail(status: &str) -> Value {
    json!({
        "job_id": JOB_ID,
        "agent_id": AGENT_ID,
        "prompt": "summarize the quarterly report",
        "params": {"language": "en"},
        "status": status,
        "progress": 40,
        "decision_reason": null,
        "created_at": "2026-02-20T10:00:00Z",
        "started_at": "2026-02-20T10:01:00Z",
        "updated_at": "2026-02-20T10:05:00Z",
        "completed_at": null
    })
}

#[tokio::test]
async fn test_version_prints_name_and_version() {
    let home = TempDir::new().unwrap();
    let out = agnt(&["version"], &ConfigEnv::new(Some(home.path().to_path_buf()))).await;

    assert_eq!(out.code, 0);
    assert!(out.stderr.is_empty());
    let payload = out.stdout_json();
    assert_eq!(payload["name"], "agnt");
    assert_eq!(payload["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_missing_explicit_config_is_config_error() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("nope.yaml");
    let env = ConfigEnv::new(Some(home.path().to_path_buf()));

    let out = agnt(&["--config", missing.to_str().unwrap(), "info", AGENT_ID], &env).await;

    assert_eq!(out.code, 4);
    assert!(out.stdout.is_empty());
    assert_eq!(out.stderr_json()["error"], "config_error");
}

#[tokio::test]
async fn test_config_file_sets_base_url_and_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", format!("/v1/agents/{}", AGENT_ID).as_str())
        .match_header("authorization", "Bearer file-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(agent_detail().to_string())
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let config_path = home.path().join("agnt.yaml");
    std::fs::write(
        &config_path,
        format!(
            "api_base_url: {}\nrequest_timeout_seconds: 5\nauth_token: file-token\n",
            server.url()
        ),
    )
    .unwrap();
    let env = ConfigEnv::new(Some(home.path().to_path_buf()));

    let out = agnt(&["--config", config_path.to_str().unwrap(), "info", AGENT_ID], &env).await;

    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    assert_eq!(out.stdout_json()["name"], "Summarizer");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_search_forwards_query_and_prints_response() {
    let mut server = Server::new_async().await;
    let body = json!({
        "agents": [{
            "agent_id": AGENT_ID,
            "name": "Summarizer",
            "description": "Summarizes documents",
            "tags": ["nlp"],
            "pricing": {"model": "per_job"},
            "created_at": "2026-02-20T10:00:00Z"
        }],
        "total": 1
    });
    let mock = server
        .mock("GET", "/v1/agents/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "pdf summaries".into()),
            Matcher::UrlEncoded("tag".into(), "nlp".into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
            Matcher::UrlEncoded("offset".into(), "10".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let out = agnt(
        &["search", "pdf summaries", "--tag", "nlp", "--limit", "5", "--offset", "10"],
        &env_for(&home, &server.url()),
    )
    .await;

    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    let payload = out.stdout_json();
    assert_eq!(payload["total"], 1);
    assert_eq!(payload["agents"][0]["agent_id"], AGENT_ID);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_search_rejects_out_of_range_limit() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let env = env_for(&home, &server.url());

    let out = agnt(&["search", "pdf", "--limit", "0"], &env).await;
    assert_eq!(out.code, 4);
    assert_eq!(out.stderr_json()["error"], "validation_error");
    assert_eq!(out.stderr_json()["message"], "limit must be between 1 and 100");

    let out = agnt(&["search", "pdf", "--offset", "-1"], &env).await;
    assert_eq!(out.code, 4);
    assert_eq!(out.stderr_json()["message"], "offset must be non-negative");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_info_not_found_uses_server_code() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v1/agents/{}", AGENT_ID).as_str())
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"agent_not_found","message":"Agent does not exist."}"#)
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let out = agnt(&["info", AGENT_ID], &env_for(&home, &server.url())).await;

    assert_eq!(out.code, 3);
    assert!(out.stdout.is_empty());
    let payload = out.stderr_json();
    assert_eq!(payload["error"], "agent_not_found");
    assert_eq!(payload["message"], "Agent does not exist.");
}

#[tokio::test]
async fn test_info_rejects_malformed_id_without_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let out = agnt(&["info", "not-a-uuid"], &env_for(&home, &server.url())).await;

    assert_eq!(out.code, 4);
    let payload = out.stderr_json();
    assert_eq!(payload["error"], "validation_error");
    assert_eq!(payload["message"], "invalid agent id: must be a valid UUID");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_stats_passes_through_unknown_fields() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v1/agents/{}/stats", AGENT_ID).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "total_jobs": 12,
                "completed_jobs": 10,
                "failed_jobs": 2,
                "avg_duration_seconds": 42.5,
                "success_rate": 0.83,
                "rating": 4.7
            })
            .to_string(),
        )
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let out = agnt(&["stats", AGENT_ID], &env_for(&home, &server.url())).await;

    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    let payload = out.stdout_json();
    assert_eq!(payload["total_jobs"], 12);
    assert_eq!(payload["rating"], 4.7);
}

#[tokio::test]
async fn test_order_sends_prompt_and_params() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/jobs")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "agent_id": AGENT_ID,
            "prompt": "summarize the quarterly report",
            "params": {"language": "en", "depth": "2"}
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "job_id": JOB_ID,
                "agent_id": AGENT_ID,
                "status": "pending",
                "created_at": "2026-02-20T10:00:00Z"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let out = agnt(
        &[
            "order",
            AGENT_ID,
            "--prompt",
            "summarize the quarterly report",
            "--param",
            "language=en",
            "--param",
            "depth=2",
        ],
        &env_for(&home, &server.url()),
    )
    .await;

    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    let payload = out.stdout_json();
    assert_eq!(payload["job_id"], JOB_ID);
    assert_eq!(payload["status"], "pending");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_order_validation_sends_nothing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let env = env_for(&home, &server.url());

    let out = agnt(&["order", AGENT_ID, "--prompt", "   "], &env).await;
    assert_eq!(out.code, 4);
    assert_eq!(out.stderr_json()["message"], "prompt must not be empty");

    let out = agnt(&["order", AGENT_ID, "--prompt", "go", "--param", "novalue"], &env).await;
    assert_eq!(out.code, 4);
    assert_eq!(
        out.stderr_json()["message"],
        "invalid --param value \"novalue\": expected key=value"
    );

    mock.assert_async().await;
}

#[tokio::test]
async fn test_order_unprocessable_uses_detail() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/jobs")
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":[{"loc":["body","prompt"],"msg":"too long"}]}"#)
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let out = agnt(&["order", AGENT_ID, "--prompt", "go"], &env_for(&home, &server.url())).await;

    assert_eq!(out.code, 4);
    let payload = out.stderr_json();
    assert_eq!(payload["error"], "api_error");
    assert_eq!(
        payload["message"],
        r#"[{"loc":["body","prompt"],"msg":"too long"}]"#
    );
}

#[tokio::test]
async fn test_jobs_filters_by_status_and_agent() {
    let mut server = Server::new_async().await;
    let mut item = job_detail("running");
    if let Some(obj) = item.as_object_mut() {
        obj.remove("params");
        obj.remove("decision_reason");
        obj.remove("started_at");
    }
    let mock = server
        .mock("GET", "/v1/jobs")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("agent_id".into(), AGENT_ID.into()),
            Matcher::UrlEncoded("status".into(), "running".into()),
            Matcher::UrlEncoded("limit".into(), "20".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"jobs": [item], "total": 1}).to_string())
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let out = agnt(
        &["jobs", "--agent-id", AGENT_ID, "--status", "running"],
        &env_for(&home, &server.url()),
    )
    .await;

    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    let payload = out.stdout_json();
    assert_eq!(payload["total"], 1);
    assert_eq!(payload["jobs"][0]["status"], "running");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_jobs_rejects_unknown_status() {
    let home = TempDir::new().unwrap();
    let out = agnt(&["jobs", "--status", "done"], &env_for(&home, "http://127.0.0.1:9")).await;

    assert_eq!(out.code, 4);
    assert_eq!(
        out.stderr_json()["message"],
        "status must be one of: pending, accepted, rejected, running, completed, failed"
    );
}

#[tokio::test]
async fn test_status_prints_job_detail() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v1/jobs/{}", JOB_ID).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(job_detail("running").to_string())
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let out = agnt(&["status", JOB_ID], &env_for(&home, &server.url())).await;

    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    let payload = out.stdout_json();
    assert_eq!(payload["status"], "running");
    assert_eq!(payload["progress"], 40);
    assert_eq!(payload["decision_reason"], Value::Null);
}

#[tokio::test]
async fn test_unauthorized_exits_two() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v1/jobs/{}", JOB_ID).as_str())
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"unauthorized","message":"Missing bearer token."}"#)
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let out = agnt(&["status", JOB_ID], &env_for(&home, &server.url())).await;

    assert_eq!(out.code, 2);
    assert_eq!(out.stderr_json()["error"], "unauthorized");
}

#[tokio::test]
async fn test_result_downloads_files_into_output_dir() {
    let mut server = Server::new_async().await;
    let manifest = json!({
        "job_id": JOB_ID,
        "status": "completed",
        "files": [
            {
                "path": "summary.txt",
                "download_url": format!("{}/files/summary.txt", server.url()),
                "size_bytes": 5,
                "mime_type": "text/plain"
            },
            {
                "path": "charts/q3.csv",
                "download_url": format!("{}/files/q3.csv", server.url()),
                "size_bytes": 7,
                "mime_type": "text/csv"
            }
        ]
    });
    server
        .mock("GET", format!("/v1/jobs/{}/result", JOB_ID).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(manifest.to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/files/summary.txt")
        .with_status(200)
        .with_body("hello")
        .create_async()
        .await;
    server
        .mock("GET", "/files/q3.csv")
        .with_status(200)
        .with_body("a,b\n1,2")
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = agnt(
        &["result", JOB_ID, "--output", output.path().to_str().unwrap()],
        &env_for(&home, &server.url()),
    )
    .await;

    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    assert_eq!(
        std::fs::read_to_string(output.path().join("summary.txt")).unwrap(),
        "hello"
    );
    assert_eq!(
        std::fs::read_to_string(output.path().join("charts").join("q3.csv")).unwrap(),
        "a,b\n1,2"
    );

    let payload = out.stdout_json();
    assert_eq!(payload["job_id"], JOB_ID);
    assert_eq!(payload["status"], "completed");
    let files = payload["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0]["path"].as_str().unwrap().ends_with("summary.txt"));
    assert_eq!(files[1]["mime_type"], "text/csv");
}

#[tokio::test]
async fn test_result_requires_completed_job() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v1/jobs/{}/result", JOB_ID).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "job_id": JOB_ID,
                "status": "running",
                "files": [{
                    "path": "summary.txt",
                    "download_url": format!("{}/files/summary.txt", server.url()),
                    "size_bytes": 5,
                    "mime_type": "text/plain"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let download = server
        .mock("GET", "/files/summary.txt")
        .expect(0)
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = agnt(
        &["result", JOB_ID, "--output", output.path().to_str().unwrap()],
        &env_for(&home, &server.url()),
    )
    .await;

    assert_eq!(out.code, 1);
    let payload = out.stderr_json();
    assert_eq!(payload["error"], "job_not_completed");
    assert_eq!(
        payload["message"],
        "job status is \"running\", must be completed to download results"
    );
    assert!(!output.path().join("summary.txt").exists());
    download.assert_async().await;
}

#[tokio::test]
async fn test_result_rejects_non_http_download_url() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v1/jobs/{}/result", JOB_ID).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "job_id": JOB_ID,
                "status": "completed",
                "files": [{
                    "path": "secrets.txt",
                    "download_url": "file:///etc/passwd",
                    "size_bytes": null,
                    "mime_type": null
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out = agnt(
        &["result", JOB_ID, "--output", output.path().to_str().unwrap()],
        &env_for(&home, &server.url()),
    )
    .await;

    assert_eq!(out.code, 1);
    let payload = out.stderr_json();
    assert_eq!(payload["error"], "download_failed");
    assert!(payload["message"]
        .as_str()
        .unwrap()
        .contains("unsupported download url scheme \"file\""));
    assert!(!output.path().join("secrets.txt").exists());
}

#[tokio::test]
async fn test_result_rejects_traversal_after_earlier_files() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v1/jobs/{}/result", JOB_ID).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "job_id": JOB_ID,
                "status": "completed",
                "files": [
                    {
                        "path": "ok.txt",
                        "download_url": format!("{}/files/ok.txt", server.url()),
                        "size_bytes": 2,
                        "mime_type": "text/plain"
                    },
                    {
                        "path": "../escape.txt",
                        "download_url": format!("{}/files/escape.txt", server.url()),
                        "size_bytes": 6,
                        "mime_type": "text/plain"
                    }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/files/ok.txt")
        .with_status(200)
        .with_body("ok")
        .create_async()
        .await;
    let escape = server
        .mock("GET", "/files/escape.txt")
        .expect(0)
        .create_async()
        .await;

    let home = TempDir::new().unwrap();
    let parent = TempDir::new().unwrap();
    let output = parent.path().join("out");
    let out = agnt(
        &["result", JOB_ID, "--output", output.to_str().unwrap()],
        &env_for(&home, &server.url()),
    )
    .await;

    assert_eq!(out.code, 1);
    assert!(out.stdout.is_empty());
    let payload = out.stderr_json();
    assert_eq!(payload["error"], "invalid_job_result_manifest");
    assert_eq!(
        payload["message"],
        "invalid result file path \"../escape.txt\": path must not escape output directory"
    );
    assert_eq!(std::fs::read_to_string(output.join("ok.txt")).unwrap(), "ok");
    assert!(!parent.path().join("escape.txt").exists());
    escape.assert_async().await;
}

#[tokio::test]
async fn test_result_rejects_empty_output() {
    let home = TempDir::new().unwrap();
    let out = agnt(
        &["result", JOB_ID, "--output", ""],
        &env_for(&home, "http://127.0.0.1:9"),
    )
    .await;

    assert_eq!(out.code, 4);
    assert_eq!(out.stderr_json()["message"], "output must not be empty");
}

#[tokio::test]
async fn test_no_command_is_usage_error() {
    let home = TempDir::new().unwrap();
    let out = agnt(&[], &ConfigEnv::new(Some(home.path().to_path_buf()))).await;

    assert_eq!(out.code, 4);
    assert_eq!(out.stderr_json()["error"], "usage_error");
}
