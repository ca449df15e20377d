//! HTTP client for the Gelato relay service.
//!
//! Endpoints:
//! - GET /tasks/status/<task_id>
//! - POST /relays/v2/sponsored-call

use std::time::Duration;

use async_trait::async_trait;
use payflow_types::{RelayError, RelayTaskStatus, Result, TaskId};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{RelayClient, SponsoredCallRequest};

/// Task status response wrapper.
#[derive(Debug, Clone, Deserialize)]
struct TaskStatusResponse {
    task: Option<RelayTaskStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SponsoredCallBody<'a> {
    #[serde(flatten)]
    request: &'a SponsoredCallRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    sponsor_api_key: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SponsoredCallResponse {
    task_id: TaskId,
}

/// Gelato relay client for one network tier.
pub struct GelatoRelayClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GelatoRelayClient {
    /// Build a client whose requests time out after `timeout_ms` (30s by default).
    pub fn new(base_url: &str, api_key: Option<String>, timeout_ms: Option<u64>) -> Result<Self> {
        let timeout = Duration::from_millis(timeout_ms.unwrap_or(30_000));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Transport(format!("failed to build http client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn status_url(&self, task_id: &str) -> String {
        format!("{}/tasks/status/{}", self.base_url, task_id)
    }

    fn sponsored_call_url(&self) -> String {
        format!("{}/relays/v2/sponsored-call", self.base_url)
    }
}

fn unexpected_status(status: StatusCode, body: &[u8]) -> RelayError {
    RelayError::Transport(format!(
        "relay returned status {}: {}",
        status,
        String::from_utf8_lossy(body)
    ))
}

/// Map a status response. 404 and a missing `task` both mean the relay
/// knows nothing about the task.
fn status_outcome(status: StatusCode, body: &[u8]) -> Result<Option<RelayTaskStatus>> {
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(unexpected_status(status, body));
    }
    let parsed: TaskStatusResponse =
        serde_json::from_slice(body).map_err(|e| RelayError::Decode(e.to_string()))?;
    Ok(parsed.task)
}

fn sponsored_call_outcome(status: StatusCode, body: &[u8]) -> Result<TaskId> {
    if !status.is_success() {
        return Err(unexpected_status(status, body));
    }
    let parsed: SponsoredCallResponse =
        serde_json::from_slice(body).map_err(|e| RelayError::Decode(e.to_string()))?;
    Ok(parsed.task_id)
}

async fn read_response(resp: reqwest::Response) -> Result<(StatusCode, Vec<u8>)> {
    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|e| RelayError::Transport(e.to_string()))?;
    Ok((status, body.to_vec()))
}

#[async_trait]
impl RelayClient for GelatoRelayClient {
    /// GET /tasks/status/<task_id>
    async fn get_task_status(&self, task_id: &str) -> Result<Option<RelayTaskStatus>> {
        let resp = self
            .client
            .get(self.status_url(task_id))
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        let (status, body) = read_response(resp).await?;
        status_outcome(status, &body)
    }

    /// POST /relays/v2/sponsored-call
    async fn sponsored_call(&self, request: &SponsoredCallRequest) -> Result<TaskId> {
        let body = SponsoredCallBody {
            request,
            sponsor_api_key: self.api_key.as_deref(),
        };

        let resp = self
            .client
            .post(self.sponsored_call_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        let (status, body) = read_response(resp).await?;
        sponsored_call_outcome(status, &body)
    }
}
