//! Client for the durable object-storage service.
//!
//! Storage re-hosts engine-produced images at stable public URLs via
//! upload-by-URL. Re-hosting is best effort: callers fall back to the
//! engine-provided URL when an upload fails.

use std::time::Duration;

use serde::Deserialize;

/// HTTP request timeout for a single upload call. Uploads pull the
/// source image server-side, so this is generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the storage REST layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The storage service returned a non-2xx status code.
    #[error("Storage API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Response from a successful upload-by-URL call.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_url: String,
}

/// HTTP client for the object-storage service.
pub struct ImageStore {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl ImageStore {
    /// Create a new client for the storage service at `api_url`.
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    /// Ask the storage service to fetch `source_url` and persist it
    /// under `key`. Returns the stable public URL.
    pub async fn upload_from_url(
        &self,
        source_url: &str,
        key: &str,
    ) -> Result<String, StorageError> {
        let body = serde_json::json!({
            "source_url": source_url,
            "key": key,
        });

        let response = self
            .client
            .post(format!("{}/v1/objects", self.api_url))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StorageError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response.json().await?;
        Ok(parsed.public_url)
    }
}

/// Storage key for a generated photo: stable per (avatar, style,
/// ordinal), so re-ingesting the same task result overwrites rather
/// than duplicates, and output ordering survives in the key.
pub fn photo_key(avatar_id: i64, style_id: i64, ordinal: i32) -> String {
    format!("avatars/{avatar_id}/styles/{style_id}/{ordinal:03}.jpg")
}
