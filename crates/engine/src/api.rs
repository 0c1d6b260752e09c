//! HTTP client for the generation engine's submit and status endpoints.

use std::time::Duration;

use serde::Deserialize;

/// HTTP request timeout for a single engine call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP client for the image-generation engine.
pub struct EngineApi {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

/// Response returned by the engine after queuing a generation.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned handle for the queued generation.
    pub task_id: String,
}

/// Raw status payload from the engine's status endpoint.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    result_url: Option<String>,
    error: Option<String>,
}

/// Resolved view of an engine task's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationStatus {
    /// Still queued or generating.
    Pending,
    /// Finished; the image is available at the given URL.
    Completed { url: String },
    /// The engine gave up on this task.
    Failed { reason: String },
}

/// Errors from the engine REST layer.
#[derive(Debug, thiserror::Error)]
pub enum EngineApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine returned a non-2xx status code.
    #[error("Engine API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The engine reported a completed task without a result URL.
    #[error("Engine reported completion without a result URL for task {task_id}")]
    MissingResult {
        /// The engine task handle.
        task_id: String,
    },
}

impl EngineApi {
    /// Create a new client for the engine at `api_url`.
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    /// Submit one generation: a prompt plus the avatar's reference
    /// images. Returns the engine's task handle.
    pub async fn submit(
        &self,
        prompt: &str,
        reference_urls: &[String],
    ) -> Result<SubmitResponse, EngineApiError> {
        let body = serde_json::json!({
            "prompt": prompt,
            "reference_images": reference_urls,
        });

        let response = self
            .client
            .post(format!("{}/v1/generations", self.api_url))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Check the status of a previously submitted task.
    pub async fn check_status(&self, task_id: &str) -> Result<GenerationStatus, EngineApiError> {
        let response = self
            .client
            .get(format!("{}/v1/generations/{}", self.api_url, task_id))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let raw: StatusResponse = Self::parse_response(response).await?;
        match raw.status.as_str() {
            "completed" => match raw.result_url {
                Some(url) => Ok(GenerationStatus::Completed { url }),
                None => Err(EngineApiError::MissingResult {
                    task_id: task_id.to_string(),
                }),
            },
            "failed" => Ok(GenerationStatus::Failed {
                reason: raw
                    .error
                    .unwrap_or_else(|| "engine reported failure without a reason".to_string()),
            }),
            // Anything else ("queued", "processing", vendor-specific
            // intermediate states) counts as still pending.
            _ => Ok(GenerationStatus::Pending),
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, or produce an
    /// [`EngineApiError::ApiError`] carrying status and body.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, EngineApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(EngineApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, EngineApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
