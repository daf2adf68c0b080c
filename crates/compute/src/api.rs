//! REST client for the remote compute service.
//!
//! Wraps the three HTTP endpoints the pipeline uses (job submission per
//! job kind, and task status) using [`reqwest`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;

use lumterior_core::job::{JobKind, JobRequest};
use lumterior_core::task::{SubmitResponse, TaskId, TaskSnapshot, TaskStatusResponse};

use crate::config::ComputeConfig;
use crate::error::ComputeError;
use crate::service::ComputeService;

/// HTTP client for a single compute service.
#[derive(Debug)]
pub struct ComputeApi {
    client: reqwest::Client,
    config: ComputeConfig,
    headers: HeaderMap,
}

/// Error body shapes the service returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ComputeApi {
    /// Create a new API client from a validated configuration.
    pub fn new(config: ComputeConfig) -> Result<Self, ComputeError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ComputeError::Config(format!("Failed to build HTTP client: {e}")))?;

        Self::with_client(client, config)
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across several services).
    pub fn with_client(
        client: reqwest::Client,
        config: ComputeConfig,
    ) -> Result<Self, ComputeError> {
        config.validate()?;
        let headers = build_headers(&config.headers)?;
        Ok(Self {
            client,
            config,
            headers,
        })
    }

    // ---- private helpers ----

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.post(self.config.endpoint(path)))
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.get(self.config.endpoint(path)))
    }

    /// Attach the configured headers. Done per request so a shared client
    /// can serve services with different header sets.
    fn with_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.headers(self.headers.clone())
    }

    /// Read a non-2xx body and pull out the service's error text if the
    /// body is JSON, otherwise return the raw text.
    async fn error_message(response: reqwest::Response) -> Option<String> {
        let body = response.text().await.ok()?;
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => parsed.error.or(parsed.message),
            Err(_) if body.trim().is_empty() => None,
            Err(_) => Some(body),
        }
    }

    /// Reject a submission that came back with a non-2xx status.
    async fn ensure_submitted(
        kind: JobKind,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ComputeError> {
        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            return Err(ComputeError::Submission {
                kind,
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ComputeService for ComputeApi {
    /// Submit a job.
    ///
    /// Sends `POST {base}/{kind endpoint}` with the request's JSON body and
    /// returns the server-assigned task id.
    async fn submit(&self, request: &JobRequest) -> Result<TaskId, ComputeError> {
        let kind = request.kind();
        let body = request.body().map_err(|e| {
            ComputeError::Transport(format!("Failed to encode {kind} request: {e}"))
        })?;

        let response = self.post(kind.endpoint()).json(&body).send().await?;
        let response = Self::ensure_submitted(kind, response).await?;
        let submitted: SubmitResponse = response.json().await?;

        let task_id = TaskId::new(submitted.task_id).ok_or_else(|| {
            ComputeError::Transport(format!("{kind} submission returned an empty task_id"))
        })?;

        tracing::debug!(
            kind = %kind,
            task_id = %task_id,
            message = submitted.message.as_deref().unwrap_or(""),
            "Job accepted by compute service",
        );

        Ok(task_id)
    }

    /// Query a task.
    ///
    /// Sends `GET {base}/task_status/{task_id}`. Any non-2xx status or
    /// non-JSON body is a transport failure.
    async fn task_status(&self, task_id: &TaskId) -> Result<TaskSnapshot, ComputeError> {
        let response = self
            .get(&format!("task_status/{}", task_id.as_str()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response)
                .await
                .unwrap_or_else(|| "<empty body>".to_string());
            return Err(ComputeError::Transport(format!(
                "Status query for task {task_id} returned HTTP {}: {message}",
                status.as_u16()
            )));
        }

        let wire: TaskStatusResponse = response.json().await?;
        Ok(TaskSnapshot::from(wire))
    }
}

fn build_headers(pairs: &[(String, String)]) -> Result<HeaderMap, ComputeError> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ComputeError::Config(format!("Invalid header name '{name}'")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ComputeError::Config(format!("Invalid value for header '{name}'")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn invalid_header_rejected() {
        let mut config = ComputeConfig::new("http://localhost:8080");
        config.headers.push(("bad header".into(), "x".into()));
        assert_matches!(ComputeApi::new(config), Err(ComputeError::Config(_)));
    }

    #[test]
    fn default_headers_are_valid() {
        let config = ComputeConfig::new("http://localhost:8080");
        let headers = build_headers(&config.headers).unwrap();
        assert_eq!(headers["ngrok-skip-browser-warning"], "69420");
    }
}
