//! Client for the durable work queue.
//!
//! The queue stores a message durably and later POSTs it to the
//! pipeline's chunk-callback endpoint with at-least-once delivery.
//! Redelivered chunks are neutralized downstream by existence-checked
//! task inserts, so no retry bookkeeping is needed here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use pixora_core::types::DbId;

use crate::config::QueueConfig;

/// HTTP request timeout for a single publish.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the work-queue layer.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The HTTP request itself failed (network, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The queue service returned a non-2xx status code.
    #[error("Queue returned HTTP {0}")]
    HttpStatus(u16),
}

/// One dispatch chunk: a contiguous range of unit ordinals to submit
/// for a job. Serialized as the queue message body and handed back to
/// the callback endpoint verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMessage {
    pub job_id: DbId,
    /// First ordinal in the chunk (0-based).
    pub start: i32,
    /// Number of ordinals in the chunk.
    pub count: i32,
}

/// Publishes dispatch chunks to the durable queue.
pub struct QueueClient {
    client: reqwest::Client,
    config: QueueConfig,
}

impl QueueClient {
    /// Create a client from queue configuration.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Publish one chunk. The queue will POST `chunk` to
    /// `{callback_base_url}/internal/dispatch` once it is persisted.
    pub async fn enqueue_chunk(&self, chunk: &ChunkMessage) -> Result<(), QueueError> {
        let body = serde_json::json!({
            "target": format!("{}/internal/dispatch", self.config.callback_base_url),
            "body": chunk,
        });

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.token)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QueueError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Split `total` units into chunk ranges of at most `chunk_size`.
pub fn chunk_ranges(total: u32, chunk_size: u32) -> Vec<(i32, i32)> {
    if chunk_size == 0 {
        return vec![(0, total as i32)];
    }
    let mut ranges = Vec::new();
    let mut start = 0u32;
    while start < total {
        let count = chunk_size.min(total - start);
        ranges.push((start as i32, count as i32));
        start += count;
    }
    ranges
}
